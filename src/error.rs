use thiserror::Error;

use crate::config::ConfigError;

/// Startup errors for smart-suggest
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid suggestion service URL '{url}': {reason}")]
    InvalidSuggestUrl { url: String, reason: String },

    #[error("Could not open log file: {0}")]
    LogFile(std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
