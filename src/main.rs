//! Binary entry point: resolve the data directory, start file logging, prepare
//! the catalog and hand control to the terminal UI.
use anyhow::Context;
use library_catalog::{logging, run_app, App, AppConfig, Database};
use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    let config = AppConfig::resolve()?;
    logging::init(&config.log_path())?;
    info!(data_dir = %config.data_dir.display(), "starting library catalog");

    let db = Database::open(config.db_path())?;
    let report = db.bootstrap().context("failed to prepare the catalog database")?;
    info!(
        books_inserted = report.books_inserted,
        members_inserted = report.members_inserted,
        "seed data checked"
    );

    let mut app = App::new(db, config.policy)?;
    let result = run_app(&mut app);
    if let Err(err) = &result {
        error!("exiting after error: {err:#}");
    }
    result
}
