//! Domain models mirroring the three catalog tables. They stay plain data
//! holders; persistence lives in `db` and presentation in `ui`.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::error::CatalogError;

/// Date format used for every date the application writes.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq)]
/// A catalog entry from the `Books` table.
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub genre: Option<String>,
    pub published_year: Option<i64>,
    /// Copies currently on the shelf. Issue decrements, return increments.
    pub available_copies: i64,
}

/// Field values for a book that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub published_year: i64,
    pub copies: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A library member from the `Members` table.
pub struct Member {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    /// Raw SQLite timestamp, filled by the column default.
    pub join_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMember {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Lifecycle of a row in `Transactions`. The only transition is
/// `Borrowed -> Returned`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanStatus {
    Borrowed,
    Returned,
}

impl LoanStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LoanStatus::Borrowed => "Borrowed",
            LoanStatus::Returned => "Returned",
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoanStatus {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Borrowed" => Ok(LoanStatus::Borrowed),
            "Returned" => Ok(LoanStatus::Returned),
            other => Err(CatalogError::InvalidInput(format!(
                "unknown transaction status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A row of the `Transactions` table. Named `Loan` so it does not collide with
/// `rusqlite::Transaction`.
pub struct Loan {
    pub id: i64,
    pub book_id: i64,
    pub member_id: i64,
    pub borrow_date: String,
    pub return_date: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub status: LoanStatus,
}

/// An open loan joined with the names needed to pick it on the return screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenLoan {
    pub transaction_id: i64,
    pub book_title: String,
    pub member_name: String,
}

impl OpenLoan {
    /// Label shown in the return picker, e.g. `1984 (Issued to Alice Johnson)`.
    pub fn label(&self) -> String {
        format!("{} (Issued to {})", self.book_title, self.member_name)
    }
}

/// One line of the overdue report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverdueLoan {
    pub member_name: String,
    pub book_title: String,
    /// The stored due date text, kept verbatim for display.
    pub due_date: String,
    pub fine: i64,
}

/// Fine owed for a loan due on `due` as of `today`. Never negative.
pub fn overdue_fine(due: NaiveDate, today: NaiveDate, fine_per_day: i64) -> i64 {
    (today.signed_duration_since(due).num_days() * fine_per_day).max(0)
}

/// Parse a stored date. Accepts plain dates and SQLite timestamps, reading
/// only the leading `YYYY-MM-DD`.
pub fn parse_stored_date(raw: &str) -> Option<NaiveDate> {
    let head = raw.get(..10)?;
    NaiveDate::parse_from_str(head, DATE_FORMAT).ok()
}
