use std::sync::Arc;
use std::time::Duration;

use appwatch::{
    api::{ApiConfig, ApiState, spawn_api_server},
    config::{Config, StorageConfig, read_config_file},
    scheduler::SchedulerHandle,
    storage::{StorageBackend, memory::MemoryBackend, sqlite::SqliteBackend},
};
use clap::Parser;
use tracing::{info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file
    #[arg(short)]
    file: Option<String>,
}

fn init() {
    let filter = filter::Targets::new().with_targets(vec![
        ("appwatch", LevelFilter::DEBUG),
        ("server", LevelFilter::DEBUG),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init();

    let args = Args::parse();
    trace!("started with args: {args:?}");

    let config = match &args.file {
        Some(path) => read_config_file(path)?,
        None => Config::default(),
    }
    .with_env_overrides();

    let storage = build_storage(&config).await?;

    let scheduler = SchedulerHandle::spawn(
        storage.clone(),
        Duration::from_secs(config.interval_secs),
        Duration::from_secs(config.timeout_secs),
        config.max_concurrent_probes,
    )?;

    let api_config = ApiConfig {
        bind_addr: config.bind_addr,
        enable_cors: true,
    };
    let state = ApiState::new(storage.clone(), scheduler.clone());
    spawn_api_server(api_config, state).await?;

    info!(
        "probing every {}s with a {}s timeout",
        config.interval_secs, config.timeout_secs
    );

    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    scheduler.shutdown().await;
    storage.close().await?;

    Ok(())
}

async fn build_storage(config: &Config) -> anyhow::Result<Arc<dyn StorageBackend>> {
    let storage: Arc<dyn StorageBackend> = match config.storage.clone().unwrap_or_default() {
        StorageConfig::None => {
            info!("using in-memory storage (no persistence)");
            Arc::new(MemoryBackend::new())
        }
        StorageConfig::Sqlite { path } => {
            info!("using SQLite storage at {}", path.display());
            Arc::new(SqliteBackend::new(path).await?)
        }
    };

    Ok(storage)
}
