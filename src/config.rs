//! Configuration for both binaries.
//!
//! Values come from an optional TOML file, then environment variables, then
//! command-line flags, each layer overriding the previous one.

use crate::batcher::{BatcherConfig, FLUSH_DELAY, FLUSH_THRESHOLD};
use crate::error::ConfigError;
use crate::transport::TransportConfig;
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_ENDPOINT: &str = "http://localhost:3001/api/log";
pub const DEFAULT_CONFIG_PATH: &str = "./guide-log.toml";

/// `APP_ENV` value that turns client logging off.
const DISABLED_APP_ENV: &str = "test";

#[derive(Parser, Debug)]
#[command(name = "guide-log-server", version, about = "Appends client log batches to a text file")]
pub struct ServerCli {
    /// Path to configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Override listening port
    #[arg(long)]
    pub port: Option<u16>,

    /// Override log file location
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Serve static files from this directory for unmatched paths
    #[arg(long)]
    pub static_dir: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(
    name = "guide-log-relay",
    version,
    about = "Forwards stdin lines to a log server in batches"
)]
pub struct RelayCli {
    /// Path to configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Override log endpoint URL
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Capture lines locally but never send them
    #[arg(long)]
    pub disabled: bool,

    /// Only forward lines containing this text
    #[arg(long)]
    pub filter: Option<String>,

    /// Override idle flush delay in milliseconds
    #[arg(long)]
    pub flush_delay_ms: Option<u64>,

    /// Override number of queued lines that forces a flush
    #[arg(long)]
    pub max_queue_size: Option<usize>,
}

/// On-disk layout; both sections are optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub server: ServerSection,
    pub relay: RelaySection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub port: Option<u16>,
    pub log_file: Option<PathBuf>,
    pub static_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RelaySection {
    pub endpoint: Option<String>,
    pub enabled: Option<bool>,
    pub filter: Option<String>,
    pub flush_delay_ms: Option<u64>,
    pub max_queue_size: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub log_file: PathBuf,
    pub static_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub endpoint: String,
    pub enabled: bool,
    pub filter: String,
    pub flush_delay: Duration,
    pub max_queue_size: usize,
}

impl RelayConfig {
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            endpoint: self.endpoint.clone(),
            enabled: self.enabled,
        }
    }

    pub fn batcher(&self) -> BatcherConfig {
        BatcherConfig {
            threshold: self.max_queue_size,
            delay: self.flush_delay,
        }
    }
}

/// Reads the config file; a missing file yields defaults.
pub fn read_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    if !path.exists() {
        return Ok(ConfigFile::default());
    }

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;

    Ok(toml::from_str(&content)?)
}

pub fn load_server_config(cli: &ServerCli) -> Result<ServerConfig, ConfigError> {
    let file = read_config_file(&cli.config)?;
    resolve_server_config(cli, file.server, |key| std::env::var(key).ok())
}

pub fn load_relay_config(cli: &RelayCli) -> Result<RelayConfig, ConfigError> {
    let file = read_config_file(&cli.config)?;
    resolve_relay_config(cli, file.relay, |key| std::env::var(key).ok())
}

/// Layers file, environment (`PORT`) and CLI values for the server.
pub fn resolve_server_config(
    cli: &ServerCli,
    file: ServerSection,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ServerConfig, ConfigError> {
    let mut port = file.port.unwrap_or(DEFAULT_PORT);
    if let Some(value) = env("PORT").filter(|v| !v.is_empty()) {
        port = value
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("PORT is not a valid port: {value}")))?;
    }
    if let Some(p) = cli.port {
        port = p;
    }

    let log_file = cli
        .log_file
        .clone()
        .or(file.log_file)
        .unwrap_or_else(default_log_file);

    let static_dir = cli.static_dir.clone().or(file.static_dir);

    Ok(ServerConfig {
        port,
        log_file,
        static_dir,
    })
}

/// Layers file, environment (`LOG_ENDPOINT`, `APP_ENV`) and CLI values for the relay.
pub fn resolve_relay_config(
    cli: &RelayCli,
    file: RelaySection,
    env: impl Fn(&str) -> Option<String>,
) -> Result<RelayConfig, ConfigError> {
    let endpoint = cli
        .endpoint
        .clone()
        .or_else(|| env("LOG_ENDPOINT").filter(|v| !v.is_empty()))
        .or(file.endpoint)
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

    let disabled_by_env = env("APP_ENV").is_some_and(|v| v == DISABLED_APP_ENV);
    let enabled = file.enabled.unwrap_or(true) && !disabled_by_env && !cli.disabled;

    let max_queue_size = cli
        .max_queue_size
        .or(file.max_queue_size)
        .unwrap_or(FLUSH_THRESHOLD);
    if max_queue_size == 0 {
        return Err(ConfigError::Invalid("max_queue_size must be at least 1".into()));
    }

    let flush_delay = cli
        .flush_delay_ms
        .or(file.flush_delay_ms)
        .map_or(FLUSH_DELAY, Duration::from_millis);

    let filter = cli.filter.clone().or(file.filter).unwrap_or_default();

    Ok(RelayConfig {
        endpoint,
        enabled,
        filter,
        flush_delay,
        max_queue_size,
    })
}

/// `logs/logs.txt` next to the running executable.
pub fn default_log_file() -> PathBuf {
    let base = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    base.join("logs").join("logs.txt")
}
