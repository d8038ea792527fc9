//! The six catalog screens as plain functions. `load` produces what a screen
//! shows from the current database contents; `submit` applies one form
//! submission and returns the notice to display. Neither knows about the
//! terminal, so every rule here is testable without drawing anything.

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::config::LendingPolicy;
use crate::db::{
    create_book, create_member, fetch_books, fetch_issuable_books, fetch_members,
    fetch_open_loans, fetch_overdue_loans, find_book, find_member, issue_book, return_book,
    Database,
};
use crate::error::CatalogError;
use crate::models::{Book, Member, NewBook, NewMember, OpenLoan, OverdueLoan, DATE_FORMAT};

/// Accepted range for a book's published year.
pub const YEAR_RANGE: std::ops::RangeInclusive<i64> = 1000..=9999;

/// Entries of the sidebar menu, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Menu {
    ViewBooks,
    AddBook,
    IssueBook,
    ReturnBook,
    ManageMembers,
    OverdueBooks,
}

impl Menu {
    pub const ALL: [Menu; 6] = [
        Menu::ViewBooks,
        Menu::AddBook,
        Menu::IssueBook,
        Menu::ReturnBook,
        Menu::ManageMembers,
        Menu::OverdueBooks,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Menu::ViewBooks => "View Books",
            Menu::AddBook => "Add Book",
            Menu::IssueBook => "Issue Book",
            Menu::ReturnBook => "Return Book",
            Menu::ManageMembers => "Manage Members",
            Menu::OverdueBooks => "Overdue Books",
        }
    }

    /// Heading drawn above the screen body.
    pub fn heading(self) -> &'static str {
        match self {
            Menu::ViewBooks => "Available Books",
            Menu::AddBook => "Add New Book",
            Menu::IssueBook => "Issue Book to a Member",
            Menu::ReturnBook => "Return Book",
            Menu::ManageMembers => "Add Library Member",
            Menu::OverdueBooks => "Overdue Books",
        }
    }

    pub fn index(self) -> usize {
        Menu::ALL
            .iter()
            .position(|entry| *entry == self)
            .unwrap_or(0)
    }
}

/// Feedback shown after loading or submitting a screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Warning(String),
    Info(String),
}

impl Notice {
    pub fn text(&self) -> &str {
        match self {
            Notice::Success(text) | Notice::Warning(text) | Notice::Info(text) => text,
        }
    }
}

/// What a screen displays, read fresh from the database on every load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenView {
    Books(Vec<Book>),
    AddBook,
    IssueBook {
        books: Vec<Book>,
        members: Vec<Member>,
    },
    ReturnBook(Vec<OpenLoan>),
    ManageMembers(Vec<Member>),
    OverdueBooks(Vec<OverdueLoan>),
}

impl ScreenView {
    /// The message a screen shows in place of its empty table or picker.
    pub fn empty_notice(&self) -> Option<Notice> {
        match self {
            ScreenView::Books(books) if books.is_empty() => {
                Some(Notice::Warning("No books available.".into()))
            }
            ScreenView::IssueBook { books, members } if books.is_empty() || members.is_empty() => {
                Some(Notice::Warning("No books or members available.".into()))
            }
            ScreenView::ReturnBook(loans) if loans.is_empty() => {
                Some(Notice::Info("No books to return.".into()))
            }
            ScreenView::ManageMembers(members) if members.is_empty() => {
                Some(Notice::Info("No members found.".into()))
            }
            ScreenView::OverdueBooks(loans) if loans.is_empty() => {
                Some(Notice::Info("No overdue books.".into()))
            }
            _ => None,
        }
    }
}

/// A completed form, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    AddBook(NewBook),
    IssueBook { book_id: i64, member_id: i64 },
    ReturnBook { transaction_id: i64 },
    AddMember(NewMember),
}

/// Read everything `menu` needs to render.
pub fn load(db: &Database, menu: Menu, today: NaiveDate, policy: &LendingPolicy) -> Result<ScreenView> {
    let view = match menu {
        Menu::ViewBooks => ScreenView::Books(db.with_connection(fetch_books)?),
        Menu::AddBook => ScreenView::AddBook,
        Menu::IssueBook => db.with_connection(|conn| {
            Ok(ScreenView::IssueBook {
                books: fetch_issuable_books(conn)?,
                members: fetch_members(conn)?,
            })
        })?,
        Menu::ReturnBook => ScreenView::ReturnBook(db.with_connection(fetch_open_loans)?),
        Menu::ManageMembers => ScreenView::ManageMembers(db.with_connection(fetch_members)?),
        Menu::OverdueBooks => ScreenView::OverdueBooks(
            db.with_connection(|conn| fetch_overdue_loans(conn, today, policy.fine_per_day))?,
        ),
    };
    Ok(view)
}

/// Apply one submission. Issue and return each run as a single unit of work,
/// so a failure leaves the copy count and the transaction log untouched.
pub fn submit(
    db: &Database,
    submission: &Submission,
    today: NaiveDate,
    policy: &LendingPolicy,
) -> Result<Notice> {
    match submission {
        Submission::AddBook(book) => {
            validate_book(book)?;
            let created = db.with_connection(|conn| create_book(conn, book))?;
            Ok(Notice::Success(format!(
                "Book '{}' added successfully!",
                created.title
            )))
        }
        Submission::IssueBook { book_id, member_id } => {
            let (title, name, due) = db.unit_of_work(|tx| {
                let loan = issue_book(tx, *book_id, *member_id, today, policy.loan_days)?;
                let book = find_book(tx, *book_id)?.ok_or(CatalogError::BookNotFound(*book_id))?;
                let member =
                    find_member(tx, *member_id)?.ok_or(CatalogError::MemberNotFound(*member_id))?;
                let due = loan
                    .due_date
                    .map(|date| date.format(DATE_FORMAT).to_string())
                    .context("issued transaction has no due date")?;
                Ok((book.title, member.name, due))
            })?;
            Ok(Notice::Success(format!(
                "Book '{title}' issued to {name}. Due Date: {due}"
            )))
        }
        Submission::ReturnBook { transaction_id } => {
            db.unit_of_work(|tx| return_book(tx, *transaction_id, today))?;
            Ok(Notice::Success("Book returned successfully!".into()))
        }
        Submission::AddMember(member) => {
            let created = db.with_connection(|conn| create_member(conn, member))?;
            Ok(Notice::Success(format!(
                "Member '{}' added successfully!",
                created.name
            )))
        }
    }
}

/// The only checks applied to a new book are the numeric bounds of the form.
fn validate_book(book: &NewBook) -> Result<(), CatalogError> {
    if !YEAR_RANGE.contains(&book.published_year) {
        return Err(CatalogError::InvalidInput(format!(
            "Published year must be between {} and {}.",
            YEAR_RANGE.start(),
            YEAR_RANGE.end()
        )));
    }
    if book.copies < 1 {
        return Err(CatalogError::InvalidInput(
            "Available copies must be at least 1.".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("library.db")).unwrap();
        db.bootstrap().unwrap();
        (dir, db)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn book(year: i64, copies: i64) -> NewBook {
        NewBook {
            title: "Dune".into(),
            author: "Frank Herbert".into(),
            genre: "Science Fiction".into(),
            published_year: year,
            copies,
        }
    }

    #[test]
    fn menu_lists_six_screens_in_order() {
        let labels: Vec<_> = Menu::ALL.iter().map(|menu| menu.label()).collect();
        assert_eq!(
            labels,
            [
                "View Books",
                "Add Book",
                "Issue Book",
                "Return Book",
                "Manage Members",
                "Overdue Books"
            ]
        );
        assert_eq!(Menu::OverdueBooks.index(), 5);
    }

    #[test]
    fn add_book_reports_success_and_adds_row() {
        let (_dir, db) = setup();
        let policy = LendingPolicy::default();
        let notice = submit(&db, &Submission::AddBook(book(1965, 2)), today(), &policy).unwrap();
        assert_eq!(notice, Notice::Success("Book 'Dune' added successfully!".into()));

        let ScreenView::Books(books) = load(&db, Menu::ViewBooks, today(), &policy).unwrap() else {
            panic!("expected the book table");
        };
        assert_eq!(books.len(), 4);
        assert_eq!(books[3].available_copies, 2);
    }

    #[test]
    fn add_book_enforces_numeric_bounds() {
        let (_dir, db) = setup();
        let policy = LendingPolicy::default();
        for bad in [book(999, 1), book(10_000, 1), book(1965, 0)] {
            let err = submit(&db, &Submission::AddBook(bad), today(), &policy).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<CatalogError>(),
                Some(CatalogError::InvalidInput(_))
            ));
        }
        assert_eq!(db.count_rows("Books").unwrap(), 3);
    }

    #[test]
    fn issue_message_names_book_member_and_due_date() {
        let (_dir, db) = setup();
        let policy = LendingPolicy::default();
        let ScreenView::IssueBook { books, members } =
            load(&db, Menu::IssueBook, today(), &policy).unwrap()
        else {
            panic!("expected the issue pickers");
        };
        let orwell = books.iter().find(|b| b.title == "1984").unwrap();
        let alice = members.iter().find(|m| m.name == "Alice Johnson").unwrap();

        let notice = submit(
            &db,
            &Submission::IssueBook {
                book_id: orwell.id,
                member_id: alice.id,
            },
            today(),
            &policy,
        )
        .unwrap();
        assert_eq!(
            notice,
            Notice::Success(
                "Book '1984' issued to Alice Johnson. Due Date: 2024-06-15".into()
            )
        );
    }

    #[test]
    fn failed_issue_leaves_both_tables_untouched() {
        let (_dir, db) = setup();
        let policy = LendingPolicy::default();
        let before = load(&db, Menu::ViewBooks, today(), &policy).unwrap();

        let result = submit(
            &db,
            &Submission::IssueBook {
                book_id: 1,
                member_id: 404,
            },
            today(),
            &policy,
        );
        assert!(result.is_err());
        assert_eq!(load(&db, Menu::ViewBooks, today(), &policy).unwrap(), before);
        assert_eq!(db.count_rows("Transactions").unwrap(), 0);
    }

    #[test]
    fn issue_rolls_back_when_a_later_step_fails() {
        let (_dir, db) = setup();
        let policy = LendingPolicy::default();

        let result: Result<()> = db.unit_of_work(|tx| {
            issue_book(tx, 2, 1, today(), policy.loan_days)?;
            Err(anyhow::anyhow!("notice could not be built"))
        });
        assert!(result.is_err());

        let book = db.with_connection(|conn| find_book(conn, 2)).unwrap().unwrap();
        assert_eq!(book.available_copies, 3);
        assert_eq!(db.count_rows("Transactions").unwrap(), 0);
    }

    #[test]
    fn return_rolls_back_when_the_copy_count_cannot_be_restored() {
        let (_dir, db) = setup();
        let policy = LendingPolicy::default();
        let issue = Submission::IssueBook {
            book_id: 2,
            member_id: 1,
        };
        submit(&db, &issue, today(), &policy).unwrap();

        // Remove the book without cascading so the loan row survives.
        db.with_connection(|conn| {
            conn.execute_batch("PRAGMA foreign_keys = OFF; DELETE FROM Books WHERE BookID = 2;")?;
            Ok(())
        })
        .unwrap();

        let err = submit(
            &db,
            &Submission::ReturnBook { transaction_id: 1 },
            today(),
            &policy,
        )
        .unwrap_err();
        assert_eq!(
            err.downcast_ref::<CatalogError>(),
            Some(&CatalogError::BookNotFound(2))
        );

        let loan = db
            .with_connection(|conn| crate::db::find_loan(conn, 1))
            .unwrap()
            .unwrap();
        assert_eq!(loan.status, crate::models::LoanStatus::Borrowed);
        assert_eq!(loan.return_date, None);
    }

    #[test]
    fn empty_screens_explain_themselves() {
        let (_dir, db) = setup();
        let policy = LendingPolicy::default();

        let returns = load(&db, Menu::ReturnBook, today(), &policy).unwrap();
        assert_eq!(
            returns.empty_notice(),
            Some(Notice::Info("No books to return.".into()))
        );
        let overdue = load(&db, Menu::OverdueBooks, today(), &policy).unwrap();
        assert_eq!(
            overdue.empty_notice(),
            Some(Notice::Info("No overdue books.".into()))
        );
        assert_eq!(load(&db, Menu::ViewBooks, today(), &policy).unwrap().empty_notice(), None);
        assert_eq!(
            ScreenView::Books(Vec::new()).empty_notice(),
            Some(Notice::Warning("No books available.".into()))
        );
        assert_eq!(
            ScreenView::IssueBook {
                books: Vec::new(),
                members: Vec::new()
            }
            .empty_notice(),
            Some(Notice::Warning("No books or members available.".into()))
        );
    }

    #[test]
    fn duplicate_member_email_is_surfaced() {
        let (_dir, db) = setup();
        let policy = LendingPolicy::default();
        let err = submit(
            &db,
            &Submission::AddMember(NewMember {
                name: "Alice Again".into(),
                email: "alice@example.com".into(),
                phone: String::new(),
            }),
            today(),
            &policy,
        )
        .unwrap_err();
        assert_eq!(
            err.downcast_ref::<CatalogError>(),
            Some(&CatalogError::DuplicateEmail("alice@example.com".into()))
        );
        assert_eq!(db.count_rows("Members").unwrap(), 2);
    }
}
