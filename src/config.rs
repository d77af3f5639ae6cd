//! Configuration module for rest timer and effort settings
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ConfigError;

/// Environment variable overriding the configuration file location.
pub const CONFIG_ENV: &str = "EFFORT_TIMER_CONFIG";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    /// Minutes used by `start` when no duration is given.
    #[serde(default = "default_duration")]
    pub default_duration: u32,
    /// Efforts strictly above this many minutes arm a rest timer.
    #[serde(default = "default_threshold")]
    pub threshold: u32,
    #[serde(default = "default_message")]
    pub message: String,
    /// Choices offered when an entry has no effort yet.
    #[serde(default = "default_presets")]
    pub presets: Vec<String>,
    #[serde(default = "default_effort_property")]
    pub effort_property: String,
    #[serde(default)]
    pub notifier: NotifierConfig,
    #[serde(default)]
    pub hooks: Hooks,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotifierMode {
    #[default]
    External,
    Fallback,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NotifierConfig {
    #[serde(default)]
    pub mode: NotifierMode,
    /// Program and leading arguments; the message is appended last.
    /// `None` picks the platform notifier.
    #[serde(default)]
    pub command: Option<Vec<String>>,
    /// Milliseconds between fallback animation frames.
    #[serde(default = "default_frame_delay_ms")]
    pub frame_delay_ms: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Hooks {
    pub timer_start: Option<String>,
    pub timer_end: Option<String>,
}

fn default_duration() -> u32 {
    50
}
fn default_threshold() -> u32 {
    49
}
fn default_message() -> String {
    "Time to take a break.".to_string()
}
fn default_presets() -> Vec<String> {
    ["5", "10", "15", "25", "30", "45", "60", "90"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_effort_property() -> String {
    "Effort".to_string()
}
fn default_frame_delay_ms() -> u64 {
    60
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            mode: NotifierMode::default(),
            command: None,
            frame_delay_ms: default_frame_delay_ms(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_duration: default_duration(),
            threshold: default_threshold(),
            message: default_message(),
            presets: default_presets(),
            effort_property: default_effort_property(),
            notifier: NotifierConfig::default(),
            hooks: Hooks::default(),
        }
    }
}

impl Config {
    /// Read and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the configuration, creating a default file when none exists.
    ///
    /// Never fails: unreadable or invalid files fall back to defaults.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            let config = Config::default();
            if let Err(err) = config.save(path) {
                warn!("Could not write default config: {}", err);
            }
            return config;
        }

        match Config::load(path) {
            Ok(config) => {
                debug!(path = %path.display(), "loaded config");
                config
            }
            Err(err) => {
                warn!("{}, using defaults", err);
                Config::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_duration == 0 {
            return Err(invalid("default_duration", "must be greater than 0"));
        }
        if self.effort_property.trim().is_empty() {
            return Err(invalid("effort_property", "must not be empty"));
        }
        if let Some(command) = &self.notifier.command {
            if command.first().is_none_or(|program| program.trim().is_empty()) {
                return Err(invalid("notifier.command", "must name a program"));
            }
        }
        Ok(())
    }

    /// Change one preference by key. The config is left untouched on error.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut updated = self.clone();
        let value = value.trim();
        match key {
            "default_duration" => updated.default_duration = parse_minutes(key, value)?,
            "threshold" => updated.threshold = parse_minutes(key, value)?,
            "message" => updated.message = value.to_string(),
            "presets" => {
                updated.presets = value
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            }
            "effort_property" => updated.effort_property = value.to_string(),
            "notifier.mode" => {
                updated.notifier.mode = match value {
                    "external" => NotifierMode::External,
                    "fallback" => NotifierMode::Fallback,
                    _ => return Err(invalid(key, "expected 'external' or 'fallback'")),
                }
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}

fn parse_minutes(key: &str, value: &str) -> Result<u32, ConfigError> {
    value
        .parse::<u32>()
        .map_err(|_| invalid(key, "expected a whole number of minutes"))
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}

pub fn get_config_path() -> PathBuf {
    if let Some(path) = env::var_os(CONFIG_ENV) {
        PathBuf::from(path)
    } else if let Some(home) = env::var_os("HOME") {
        PathBuf::from(home)
            .join(".config")
            .join("effort-timer")
            .join("config.json")
    } else {
        PathBuf::from("effort-timer-config.json")
    }
}
