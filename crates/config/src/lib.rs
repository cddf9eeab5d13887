//! Pagemark Configuration System
//!
//! Settings live in a single TOML file split into sections. Each section is a
//! type implementing `ConfigSection`, so it validates and merges itself.
//!
//! Saving refuses out-of-range values. Loading keeps them, and
//! `ConfigManager::load_with_env_overrides` swaps them for defaults.
//! Writes go through a temp file and a rename, so `config.toml` is either
//! the old file or the new one.
//!
//! # Example
//!
//! ```rust,no_run
//! use pagemark_config::ConfigManager;
//!
//! let manager = ConfigManager::new()?;
//! let config = manager.load().unwrap_or_default();
//!
//! println!("Lookup provider: {}", config.catalog.provider);
//! # Ok::<(), pagemark_config::ConfigError>(())
//! ```

mod error;
mod manager;
mod persistence;
mod validation;

// Config sections
pub mod app_config;
pub mod catalog_config;
pub mod timer_config;

pub use error::{ConfigError, ConfigResult, ValidationError};
pub use manager::{apply_env_overrides, ConfigManager};
pub use validation::{ConfigSection, Validator};

pub use app_config::{AppConfig, LogLevel};
pub use catalog_config::{CatalogConfig, CatalogProvider};
pub use timer_config::TimerConfig;

use serde::{Deserialize, Serialize};

/// Current config file format version
pub const CONFIG_VERSION: u32 = 1;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Config file format version
    pub version: u32,

    /// Application-level settings
    pub app: AppConfig,

    /// Metadata lookup settings
    pub catalog: CatalogConfig,

    /// Reading timer settings
    pub timer: TimerConfig,
}

impl Config {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks every section, reporting all bad fields at once
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let errors: Vec<ValidationError> = [
            self.app.validate(),
            self.catalog.validate(),
            self.timer.validate(),
        ]
        .into_iter()
        .filter_map(Result::err)
        .flatten()
        .collect();

        match errors.is_empty() {
            true => Ok(()),
            false => Err(errors),
        }
    }

    /// Swaps out-of-range values for their defaults and reports each one
    pub fn replace_invalid(&mut self) -> Vec<ValidationError> {
        let mut replaced = self.app.replace_invalid();
        replaced.extend(self.catalog.replace_invalid());
        replaced.extend(self.timer.replace_invalid());
        replaced
    }

    /// Takes every section from `other`; env overrides are applied on top
    pub fn merge(&mut self, other: Config) {
        self.app.merge(other.app);
        self.catalog.merge(other.catalog);
        self.timer.merge(other.timer);
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            app: AppConfig::default(),
            catalog: CatalogConfig::default(),
            timer: TimerConfig::default(),
        }
    }
}
