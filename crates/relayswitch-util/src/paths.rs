//! Default paths for relayswitch components
//!
//! The configuration file is user-writable by default (no root required):
//! `$XDG_CONFIG_HOME/relayswitch/config.toml` or `~/.config/relayswitch/config.toml`

use std::path::PathBuf;

/// Environment variable for overriding the configuration file path
pub const RELAYSWITCH_CONFIG_ENV: &str = "RELAYSWITCH_CONFIG";

/// Configuration filename within the config directory
const CONFIG_FILENAME: &str = "config.toml";

/// Application subdirectory name
const APP_DIR: &str = "relayswitch";

/// Get the default configuration file path.
///
/// Order of precedence:
/// 1. `$RELAYSWITCH_CONFIG` environment variable (if set)
/// 2. `$XDG_CONFIG_HOME/relayswitch/config.toml` (if XDG_CONFIG_HOME is set)
/// 3. `~/.config/relayswitch/config.toml` (fallback)
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(RELAYSWITCH_CONFIG_ENV) {
        return PathBuf::from(path);
    }

    config_path_without_env()
}

/// Get the config path without checking RELAYSWITCH_CONFIG.
pub fn config_path_without_env() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join(CONFIG_FILENAME);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILENAME);
    }

    // Last resort
    PathBuf::from("/etc").join(APP_DIR).join(CONFIG_FILENAME)
}
