//! Configuration for the audiokit engine.
//!
//! [`EngineConfig`] describes the stream shape an engine is built with and how
//! it logs. It is stored as TOML in the user's config directory (see
//! [`paths`]) and can be overridden per process through the
//! `AUDIOKIT_LOG_LEVEL` and `AUDIOKIT_LOG_FILE` environment variables.
//!
//! # Example
//!
//! ```rust,no_run
//! use audiokit_config::{EngineConfig, init_tracing};
//!
//! let config = EngineConfig::load_or_default()?;
//! init_tracing(&config.logging)?;
//! let format = config.block_format();
//! println!("{} frames at {} Hz", format.frames, format.sample_rate);
//! # Ok::<(), audiokit_config::ConfigError>(())
//! ```

mod engine;
mod error;
mod logging;
pub mod paths;

pub use engine::{ENV_LOG_FILE, ENV_LOG_LEVEL, EngineConfig};
pub use error::ConfigError;
pub use logging::{LoggingConfig, init_tracing};
