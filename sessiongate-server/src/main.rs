//! sessiongate server binary

use anyhow::Context;
use sessiongate_core::auth::SessionTokens;
use sessiongate_core::DEFAULT_NAMES;
use sessiongate_engine::StorageEngine;
use sessiongate_server::config::{self, GlobalConfig, Invocation, SeedConfig, ServeConfig};
use sessiongate_server::observability::init_tracing;
use sessiongate_server::{AppState, SessionGateServer};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; a broken one is worth a warning.
    let dotenv = dotenvy::dotenv();

    let matches = config::command().get_matches();
    let global = GlobalConfig::from_matches(&matches)?;
    init_tracing(global.log_format, &global.log_level);

    if let Err(e) = dotenv {
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound) {
            warn!("Failed to load .env file: {}", e);
        }
    }

    match Invocation::from_matches(&matches)? {
        Invocation::Serve(serve_config) => serve(serve_config).await,
        Invocation::Seed(seed_config) => seed(seed_config),
    }
}

async fn serve(config: ServeConfig) -> anyhow::Result<()> {
    info!("Starting sessiongate server");
    info!("Data directory: {}", config.data_dir.display());
    info!("Bind address: {}", config.bind);

    let engine = open_engine(&config.data_dir)?;
    let names = engine.names().context("Failed to open names collection")?;
    let tokens = Arc::new(SessionTokens::from_env());

    let server = SessionGateServer::new(AppState::new(names, tokens, config.cookie_name));
    server.serve(config.bind).await
}

fn seed(config: SeedConfig) -> anyhow::Result<()> {
    let engine = open_engine(&config.data_dir)?;
    let names = engine.names().context("Failed to open names collection")?;

    let removed = names.count()?;
    let inserted = names.seed(&DEFAULT_NAMES)?;
    info!(removed, inserted = inserted.len(), "Names collection seeded");

    for record in inserted {
        info!(id = %record.id, name = %record.name, "Inserted");
    }
    Ok(())
}

fn open_engine(data_dir: &Path) -> anyhow::Result<StorageEngine> {
    if !data_dir.exists() {
        std::fs::create_dir_all(data_dir)?;
        info!("Created data directory: {}", data_dir.display());
    }

    StorageEngine::new(data_dir).context("Failed to initialize storage engine")
}
