//! Error types for effort-timer.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration loading and mutation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write configuration to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}

/// Errors from parsing a duration string such as `25m` or `1:30`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DurationError {
    #[error("Duration is empty")]
    Empty,

    #[error("Invalid duration format '{0}'. Use formats like: 25, 25m, 30s, 1h30m, 1:30")]
    Format(String),

    #[error("Duration must be greater than 0")]
    Zero,
}

/// Failure of the external alert command. Recovered by the fallback display.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Alert command is empty")]
    NoCommand,

    #[error("Failed to run alert command '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Alert command '{program}' exited with {status}")]
    Exit { program: String, status: std::process::ExitStatus },

    #[error("Failed to draw fallback display: {0}")]
    Display(#[from] std::io::Error),
}
