//! Binary entry point: read the config, start file logging, make sure the
//! database exists and hand control to the Ratatui event loop.
use anyhow::Context;
use songbook::{logging, run_app, App, AppConfig, Database};
use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    logging::init(&config.log_path, config.level()?)?;
    info!(database = %config.database_path.display(), "starting songbook");

    let db = Database::new(config.database_path);
    if let Err(err) = db.ensure_schema() {
        error!(error = %err, "database unavailable");
        return Err(err).with_context(|| format!("failed to prepare {}", db.path().display()));
    }

    let mut app = App::new(db);
    run_app(&mut app)
}
