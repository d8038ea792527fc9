//! Terminal front end: a sidebar menu beside the selected screen, with a
//! footer for status messages and key hints.
mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
