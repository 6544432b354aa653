//! Maintenance binary: open (or create) the ledger database, apply
//! migrations and seed the starter emission-factor library.
//!
//! Usage: `seed_factors [path/to/ledger.db]` — defaults to the standard
//! location under the home directory.

use std::path::PathBuf;
use std::process::ExitCode;

use carbonledger::db::EmissionDb;
use carbonledger::seed;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let db = match std::env::args().nth(1) {
        Some(path) => EmissionDb::open_at(PathBuf::from(path)),
        None => EmissionDb::open(),
    };
    let db = match db {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("failed to open database: {e}");
            return ExitCode::FAILURE;
        }
    };

    match seed::seed_factors(&db) {
        Ok(created) => {
            tracing::info!(created, "seeding complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("seeding failed: {e}");
            ExitCode::FAILURE
        }
    }
}
