//! Platform-specific configuration paths.
//!
//! - Linux: `~/.config/audiokit/engine.toml`
//! - macOS: `~/Library/Application Support/audiokit/engine.toml`
//! - Windows: `%APPDATA%\audiokit\engine.toml`

use std::path::PathBuf;

/// Application name used for directory paths.
const APP_NAME: &str = "audiokit";

/// File name of the engine configuration.
const CONFIG_FILE: &str = "engine.toml";

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Returns the path of the user's engine configuration file.
pub fn user_config_file() -> PathBuf {
    user_config_dir().join(CONFIG_FILE)
}
