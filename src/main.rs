mod budget;
mod config;
mod csv_io;
mod db;
mod error;
mod feed;
mod models;
mod run;
mod ui;

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config = config::Config::load()?;
    init_logging(&config)?;

    let mut db = db::Database::open(&config.db_path)?;
    let session = db.ensure_default_session(config.default_plan)?;
    tracing::debug!(
        data_dir = %config.data_dir.display(),
        db = %config.db_path.display(),
        "database ready"
    );

    match args.len() {
        1 => match session {
            Some(session) => run::as_tui(&mut db, session, &config),
            None => {
                eprintln!("Not logged in. Run `housebudget login <email>` first.");
                Ok(())
            }
        },
        2.. => run::as_cli(&args, &mut db, &config),
        _ => {
            eprintln!("Usage: housebudget [command]");
            Ok(())
        }
    }
}

/// Log to a file in the data directory; stdout belongs to the TUI.
fn init_logging(config: &config::Config) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)
        .with_context(|| format!("Failed to open log file: {}", config.log_path.display()))?;

    let filter = EnvFilter::try_new(&config.log_filter)
        .with_context(|| format!("Invalid log filter '{}'", config.log_filter))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .try_init()
        .context("Failed to initialise logging")?;
    Ok(())
}
