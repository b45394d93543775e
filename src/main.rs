use std::process;
use std::sync::Arc;

use krishi::advisory::AdvisoryStore;
use krishi::analytics::Aggregator;
use krishi::cli;
use krishi::config::{AdvisoryBackend, Config};
use krishi::gateway::Gateway;
use krishi::ledger::Ledger;
use krishi::storage::{AdvisoryBacking, Storage};

fn main() {
    let app = match init() {
        Ok(app) => app,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    if let Err(e) = cli::run(&app) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Builds the process-wide components: config → storage → stores → gateway.
fn init() -> Result<cli::App, String> {
    let config = Config::load()?;

    let root = config
        .data_dir
        .clone()
        .or_else(Storage::default_root)
        .ok_or("could not determine home directory")?;
    let storage = Storage::new(root).map_err(|e| format!("failed to initialize storage: {e}"))?;

    let ledger = Ledger::open(Box::new(storage.ledger()))
        .map_err(|e| format!("failed to open ledger: {e}"))?;
    let ledger = Arc::new(ledger);

    let backing: Box<dyn AdvisoryBacking> = match config.advisory_backend {
        AdvisoryBackend::Json => Box::new(
            storage
                .advisories()
                .map_err(|e| format!("failed to open advisory storage: {e}"))?,
        ),
        AdvisoryBackend::Sqlite => Box::new(
            storage
                .advisories_sqlite()
                .map_err(|e| format!("failed to open advisory database: {e}"))?,
        ),
    };
    let advisories = Arc::new(
        AdvisoryStore::open(backing).map_err(|e| format!("failed to open advisory store: {e}"))?,
    );

    Ok(cli::App {
        gateway: Gateway::new(Arc::clone(&ledger), Arc::clone(&advisories)),
        aggregator: Aggregator::new(Arc::clone(&advisories)),
        ledger,
        advisories,
    })
}
