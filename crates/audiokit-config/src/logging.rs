//! Logging configuration and subscriber setup.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::ConfigError;

/// Where and how verbosely the engine logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Maximum level when `RUST_LOG` is unset: `off`, `error`, `warn`,
    /// `info`, `debug` or `trace`.
    pub level: String,
    /// Append log lines to this file instead of stderr.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Parses [`level`](Self::level).
    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        LevelFilter::from_str(self.level.trim())
            .map_err(|_| ConfigError::invalid("logging.level", format!("unknown level '{}'", self.level)))
    }
}

/// Installs the global `tracing` subscriber.
///
/// A `RUST_LOG` directive takes precedence over `config.level`. Fails if a
/// subscriber is already installed or the log file cannot be opened.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), ConfigError> {
    let level = config.level_filter()?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let installed = match &config.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| ConfigError::write_file(path, e))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => tracing_subscriber::fmt().with_env_filter(filter).try_init(),
    };
    installed.map_err(|e| ConfigError::Logging(e.to_string()))?;

    tracing::debug!(level = %level, file = ?config.file, "logging initialized");
    Ok(())
}
