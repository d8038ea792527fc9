use anyhow::{anyhow, Context, Result};
use chrono::{Duration, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use super::books::{adjust_copies, find_book};
use super::members::find_member;
use crate::error::CatalogError;
use crate::models::{
    overdue_fine, parse_stored_date, Loan, LoanStatus, OpenLoan, OverdueLoan, DATE_FORMAT,
};

/// Lend one copy of a book to a member: record a `Borrowed` transaction due
/// `loan_days` after `issued_on` and take a copy off the shelf. Both writes
/// belong together, so call this inside `Database::unit_of_work`.
pub fn issue_book(
    conn: &Connection,
    book_id: i64,
    member_id: i64,
    issued_on: NaiveDate,
    loan_days: i64,
) -> Result<Loan> {
    let book = find_book(conn, book_id)?.ok_or(CatalogError::BookNotFound(book_id))?;
    if book.available_copies <= 0 {
        return Err(CatalogError::NoCopiesAvailable(book.title).into());
    }
    if find_member(conn, member_id)?.is_none() {
        return Err(CatalogError::MemberNotFound(member_id).into());
    }

    let due_date = issued_on + Duration::days(loan_days);
    conn.execute(
        "INSERT INTO Transactions (BookID, MemberID, DueDate, Status)
         VALUES (?1, ?2, ?3, 'Borrowed')",
        params![book_id, member_id, due_date.format(DATE_FORMAT).to_string()],
    )
    .context("failed to record transaction")?;
    let id = conn.last_insert_rowid();

    adjust_copies(conn, book_id, -1)?;

    info!(id, book_id, member_id, due = %due_date, "book issued");
    find_loan(conn, id)?.ok_or_else(|| anyhow!("transaction #{id} vanished after insert"))
}

/// Close an open transaction on `returned_on` and put the copy back on the
/// shelf. Like [`issue_book`], run it inside a unit of work.
pub fn return_book(conn: &Connection, transaction_id: i64, returned_on: NaiveDate) -> Result<Loan> {
    let loan = find_loan(conn, transaction_id)?
        .ok_or(CatalogError::TransactionNotFound(transaction_id))?;
    if loan.status != LoanStatus::Borrowed {
        return Err(CatalogError::LoanNotOpen(transaction_id).into());
    }

    conn.execute(
        "UPDATE Transactions SET ReturnDate = ?1, Status = 'Returned' WHERE TransactionID = ?2",
        params![returned_on.format(DATE_FORMAT).to_string(), transaction_id],
    )
    .context("failed to close transaction")?;

    if adjust_copies(conn, loan.book_id, 1)? == 0 {
        return Err(CatalogError::BookNotFound(loan.book_id).into());
    }

    info!(id = transaction_id, book_id = loan.book_id, "book returned");
    find_loan(conn, transaction_id)?
        .ok_or_else(|| anyhow!("transaction #{transaction_id} vanished after update"))
}

pub fn find_loan(conn: &Connection, id: i64) -> Result<Option<Loan>> {
    let raw = conn
        .query_row(
            "SELECT TransactionID, BookID, MemberID, BorrowDate, ReturnDate, DueDate, Status
             FROM Transactions WHERE TransactionID = ?1",
            [id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, String>(6)?,
                ))
            },
        )
        .optional()
        .context("failed to look up transaction")?;

    let Some((id, book_id, member_id, borrow_date, return_date, due_date, status)) = raw else {
        return Ok(None);
    };

    Ok(Some(Loan {
        id,
        book_id,
        member_id,
        borrow_date: borrow_date.unwrap_or_default(),
        return_date,
        due_date: due_date.as_deref().and_then(parse_stored_date),
        status: status.parse()?,
    }))
}

/// Every `Borrowed` transaction with the book title and member name, oldest
/// first.
pub fn fetch_open_loans(conn: &Connection) -> Result<Vec<OpenLoan>> {
    let mut stmt = conn
        .prepare(
            "SELECT t.TransactionID, b.Title, m.Name
             FROM Transactions t
             JOIN Books b ON t.BookID = b.BookID
             JOIN Members m ON t.MemberID = m.MemberID
             WHERE t.Status = 'Borrowed'
             ORDER BY t.TransactionID",
        )
        .context("failed to prepare open transaction query")?;

    let loans = stmt
        .query_map([], |row| {
            Ok(OpenLoan {
                transaction_id: row.get(0)?,
                book_title: row.get(1)?,
                member_name: row.get(2)?,
            })
        })
        .context("failed to load open transactions")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect open transactions")?;

    Ok(loans)
}

/// Borrowed transactions whose due date is before `today`, with the fine each
/// one has accrued.
pub fn fetch_overdue_loans(
    conn: &Connection,
    today: NaiveDate,
    fine_per_day: i64,
) -> Result<Vec<OverdueLoan>> {
    let mut stmt = conn
        .prepare(
            "SELECT m.Name, b.Title, t.DueDate
             FROM Transactions t
             JOIN Members m ON t.MemberID = m.MemberID
             JOIN Books b ON t.BookID = b.BookID
             WHERE DATE(t.DueDate) < DATE(?1) AND t.Status = 'Borrowed'
             ORDER BY DATE(t.DueDate), t.TransactionID",
        )
        .context("failed to prepare overdue query")?;

    let rows = stmt
        .query_map([today.format(DATE_FORMAT).to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })
        .context("failed to load overdue transactions")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect overdue transactions")?;

    Ok(rows
        .into_iter()
        .map(|(member_name, book_title, due_date)| {
            let fine = parse_stored_date(&due_date)
                .map(|due| overdue_fine(due, today, fine_per_day))
                .unwrap_or(0);
            OverdueLoan {
                member_name,
                book_title,
                due_date,
                fine,
            }
        })
        .collect())
}
