//! Domain failures raised by the catalog. Database errors travel as
//! `anyhow::Error` with context attached; the variants here cover the cases the
//! UI wants to recognise and phrase for the librarian.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Book #{0} does not exist.")]
    BookNotFound(i64),

    #[error("Member #{0} does not exist.")]
    MemberNotFound(i64),

    #[error("Transaction #{0} does not exist.")]
    TransactionNotFound(i64),

    #[error("Transaction #{0} is already returned.")]
    LoanNotOpen(i64),

    #[error("No copies of '{0}' are available.")]
    NoCopiesAvailable(String),

    #[error("A member with email {0} already exists.")]
    DuplicateEmail(String),

    #[error("{0}")]
    InvalidInput(String),
}
