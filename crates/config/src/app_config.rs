//! Application-level configuration section

use crate::validation::{ConfigSection, ValidationError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Default log filter; `RUST_LOG` takes precedence
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Directive understood by `env_logger` filters
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(ValidationError::with_value(
                "app.log_level",
                "must be one of: error, warn, info, debug, trace",
                s,
            )),
        }
    }
}

/// Application-level settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Reading data file (relative to the data dir if not absolute)
    pub data_file: PathBuf,

    /// Log level for application output
    pub log_level: LogLevel,

    /// Ask before removing a book or resetting its reading time
    pub confirm_destructive: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("books.json"),
            log_level: LogLevel::Warn,
            confirm_destructive: true,
        }
    }
}

impl ConfigSection for AppConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        if self.data_file.as_os_str().is_empty() {
            return Err(vec![ValidationError::new(
                "app.data_file",
                "must not be empty",
            )]);
        }
        Ok(())
    }

    fn merge(&mut self, other: Self) {
        self.data_file = other.data_file;
        self.log_level = other.log_level;
        self.confirm_destructive = other.confirm_destructive;
    }

    fn restore_default(&mut self, field: &str) {
        if field == "app.data_file" {
            self.data_file = Self::default().data_file;
        }
    }

    fn section_name(&self) -> &'static str {
        "app"
    }
}
