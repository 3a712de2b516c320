mod analytics;
mod config;
mod db;
mod models;
mod run;
mod store;

use anyhow::Result;
use tracing::debug;

fn main() -> Result<()> {
    let config = config::Config::from_env()?;
    config::init_logging(&config.log_filter);
    debug!(path = %config.db_path.display(), "opening store");

    let backend = db::SqliteBackend::open(&config.db_path)?;
    let store = store::RecordStore::new(backend);
    if config.strict {
        store.try_initialize()?;
    } else {
        store.initialize();
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let session = run::Session::new(&store, config.strict, chrono::Utc::now());
    run::as_cli(&args, &session)
}
