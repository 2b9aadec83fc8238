use std::net::SocketAddr;
use std::path::PathBuf;

use tracing::trace;

const INTERVAL_ENV: &str = "APPWATCH_INTERVAL_SECS";
const TIMEOUT_ENV: &str = "APPWATCH_TIMEOUT_SECS";

/// Storage backend configuration
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// In-memory storage (no persistence)
    #[serde(rename = "none")]
    None,

    /// SQLite database (default for most deployments)
    Sqlite {
        /// Path to the SQLite database file
        #[serde(default = "default_sqlite_path")]
        path: PathBuf,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Sqlite {
            path: default_sqlite_path(),
        }
    }
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("./appwatch.db")
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    /// Seconds between probe cycles
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Per-probe timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Optional cap on concurrent probes per cycle. Unset means one
    /// in-flight probe per target, which is fine for small registries.
    pub max_concurrent_probes: Option<usize>,

    /// Storage configuration (optional - defaults to SQLite)
    pub storage: Option<StorageConfig>,

    /// API bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            timeout_secs: default_timeout_secs(),
            max_concurrent_probes: None,
            storage: None,
            bind_addr: default_bind_addr(),
        }
    }
}

impl Config {
    /// Apply environment overrides on top of the loaded file.
    ///
    /// Timing knobs must be adjustable without touching the config file,
    /// so `APPWATCH_INTERVAL_SECS` and `APPWATCH_TIMEOUT_SECS` win over
    /// whatever the file says. Unparsable values are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(interval) = env_u64(INTERVAL_ENV) {
            self.interval_secs = interval;
        }
        if let Some(timeout) = env_u64(TIMEOUT_ENV) {
            self.timeout_secs = timeout;
        }
        self
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

fn default_interval_secs() -> u64 {
    60
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_bind_addr() -> SocketAddr {
    "127.0.0.1:8080".parse().expect("valid literal address")
}

pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)?;
    serde_json::from_str(&file_content)
        .map_err(|_| anyhow::anyhow!("Invalid configuration file provided!"))
        .inspect(|config| trace!("loaded config: {config:?}"))
}
