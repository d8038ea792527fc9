//! Persistence module split across logical submodules.

mod books;
mod gateway;
mod loans;
mod members;
mod schema;
mod seed;

pub use books::{create_book, fetch_books, fetch_issuable_books, find_book};
pub use gateway::{Database, Fetch, Rows};
pub use loans::{fetch_open_loans, fetch_overdue_loans, find_loan, issue_book, return_book};
pub use members::{create_member, fetch_members, find_member};
pub use schema::{ensure_schema, migrate_due_date};
pub use seed::{seed, SeedReport};
