//! Engine configuration file.
//!
//! ```toml
//! sample_rate = 48000
//! block_size = 256
//! channels = 2
//!
//! [logging]
//! level = "debug"
//! ```
//!
//! Missing keys take their defaults, so an empty file is a valid config.

use std::path::{Path, PathBuf};

use audiokit_core::BlockFormat;
use serde::{Deserialize, Serialize};

use crate::{ConfigError, LoggingConfig, paths};

/// Overrides [`LoggingConfig::level`].
pub const ENV_LOG_LEVEL: &str = "AUDIOKIT_LOG_LEVEL";
/// Overrides [`LoggingConfig::file`]; an empty value logs to stderr.
pub const ENV_LOG_FILE: &str = "AUDIOKIT_LOG_FILE";

/// Stream shape and logging settings for one engine instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Frames per processing block.
    pub block_size: usize,
    /// Interleaved channels per frame.
    pub channels: u16,
    /// Logging settings.
    pub logging: LoggingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            block_size: 1024,
            channels: 2,
            logging: LoggingConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let config = Self::from_toml(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the configuration to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reads the user's config file if it exists, falling back to defaults,
    /// then applies environment overrides.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        let path = paths::user_config_file();
        let mut config = if path.exists() {
            tracing::info!(path = %path.display(), "loading engine config");
            Self::load(&path)?
        } else {
            tracing::debug!(path = %path.display(), "no engine config, using defaults");
            Self::default()
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Applies `AUDIOKIT_LOG_LEVEL` and `AUDIOKIT_LOG_FILE` from the process
    /// environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from `lookup`, keyed by environment variable name.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.logging.level = level;
        }
        if let Some(file) = lookup(ENV_LOG_FILE) {
            self.logging.file = (!file.is_empty()).then(|| PathBuf::from(file));
        }
    }

    /// Rejects settings no stream can run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::invalid("sample_rate", "must be positive"));
        }
        if self.block_size == 0 {
            return Err(ConfigError::invalid("block_size", "must be at least 1"));
        }
        if self.channels == 0 {
            return Err(ConfigError::invalid("channels", "must be at least 1"));
        }
        self.logging.level_filter()?;
        Ok(())
    }

    /// Block shape the engine runs with.
    pub fn block_format(&self) -> BlockFormat {
        BlockFormat::new(
            self.sample_rate as f32,
            self.block_size,
            usize::from(self.channels),
        )
    }
}
