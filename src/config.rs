//! Configuration loading
//!
//! Reads `~/.config/smart-suggest/config.toml`. A missing file is not an
//! error; an unreadable or malformed one falls back to defaults and reports a
//! warning for the UI to show.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

mod types;

pub use types::{
    Config, ConvertConfig, DEFAULT_CONVERT_URL, DEFAULT_SUGGEST_URL, ExportConfig, ImportConfig,
    SuggestConfig,
};

const CONFIG_DIR: &str = "smart-suggest";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Loaded configuration plus a warning when the file could not be used
#[derive(Debug)]
pub struct ConfigResult {
    pub config: Config,
    pub warning: Option<String>,
}

pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|p| p.join(".config").join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Load the default config file, never failing
pub fn load_config() -> ConfigResult {
    match config_path() {
        Some(path) => load_config_lenient(&path),
        None => ConfigResult {
            config: Config::default(),
            warning: None,
        },
    }
}

/// Load a config file, falling back to defaults with a warning on failure
pub fn load_config_lenient(path: &Path) -> ConfigResult {
    if !path.exists() {
        return ConfigResult {
            config: Config::default(),
            warning: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigResult {
            config,
            warning: None,
        },
        Err(e) => {
            log::warn!("{}", e);
            ConfigResult {
                config: Config::default(),
                warning: Some(format!("{} (using defaults)", e)),
            }
        }
    }
}

/// Load a config file strictly; used for an explicit `--config` path
pub fn load_config_from_path(path: &Path) -> Result<Config, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    parse_config(&contents).map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

pub fn parse_config(content: &str) -> Result<Config, String> {
    toml::from_str::<Config>(content).map_err(|e| e.message().to_string())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
