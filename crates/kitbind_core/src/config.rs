//! Host harness configuration.
//!
//! # Responsibility
//! - Load harness settings from TOML with build-mode defaults.
//! - Apply the `KITBIND_LOG_DIR` environment override.

use crate::logging::{default_log_level, normalize_level, LoggingError};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Environment variable overriding `log_dir`.
pub const LOG_DIR_ENV: &str = "KITBIND_LOG_DIR";
/// Update ticks pumped by the harness when nothing else is configured.
pub const DEFAULT_UPDATE_TICKS: u64 = 250;

/// Harness settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub log_level: String,
    /// Absolute directory for rolling log files; `None` disables file logging.
    pub log_dir: Option<PathBuf>,
    pub update_ticks: u64,
    /// Seconds reported per synthetic update tick.
    pub tick_seconds: f64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level().to_string(),
            log_dir: None,
            update_ticks: DEFAULT_UPDATE_TICKS,
            tick_seconds: 1.0 / 60.0,
        }
    }
}

impl HostConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|err| ConfigError::Read {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Self::from_toml_str(&raw)
    }

    /// Replaces `log_dir` with a non-blank `KITBIND_LOG_DIR`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(raw) = std::env::var(LOG_DIR_ENV) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                self.log_dir = Some(PathBuf::from(trimmed));
            }
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        normalize_level(&self.log_level).map_err(ConfigError::InvalidLogLevel)?;
        if !self.tick_seconds.is_finite() || self.tick_seconds < 0.0 {
            return Err(ConfigError::InvalidTickSeconds(self.tick_seconds));
        }
        Ok(())
    }
}

/// Configuration load errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Read { path: PathBuf, message: String },
    Parse(String),
    InvalidLogLevel(LoggingError),
    InvalidTickSeconds(f64),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, message } => {
                write!(f, "failed to read config `{}`: {message}", path.display())
            }
            Self::Parse(message) => write!(f, "config is not valid toml: {message}"),
            Self::InvalidLogLevel(err) => write!(f, "invalid log_level: {err}"),
            Self::InvalidTickSeconds(value) => {
                write!(f, "tick_seconds must be a finite, non-negative number, got {value}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidLogLevel(err) => Some(err),
            _ => None,
        }
    }
}
