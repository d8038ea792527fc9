//! Library catalog: books, members and lending transactions in SQLite, driven
//! from a Ratatui front end. The binary only wires these modules together, so
//! the same pieces can be exercised from tests.
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod screens;
pub mod ui;

pub use config::{AppConfig, LendingPolicy};
pub use db::{Database, SeedReport};
pub use error::CatalogError;
pub use models::{Book, Loan, LoanStatus, Member, NewBook, NewMember, OpenLoan, OverdueLoan};
pub use screens::{load, submit, Menu, Notice, ScreenView, Submission};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
