//! Catalog lookup configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which lookup service to query for book metadata
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CatalogProvider {
    /// Pagemark backend exposing `GET /api/book/{isbn}`
    Backend,
    /// OpenBD public API queried directly
    OpenBd,
}

impl CatalogProvider {
    /// Base URL used when none is configured
    pub fn default_base_url(&self) -> &'static str {
        match self {
            CatalogProvider::Backend => "http://localhost:5000",
            CatalogProvider::OpenBd => "https://api.openbd.jp",
        }
    }
}

impl std::fmt::Display for CatalogProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogProvider::Backend => write!(f, "backend"),
            CatalogProvider::OpenBd => write!(f, "openbd"),
        }
    }
}

impl FromStr for CatalogProvider {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "backend" => Ok(CatalogProvider::Backend),
            "openbd" => Ok(CatalogProvider::OpenBd),
            _ => Err(ValidationError::with_value(
                "catalog.provider",
                "must be one of: backend, openbd",
                s,
            )),
        }
    }
}

/// Lookup service settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    /// Lookup service to use
    pub provider: CatalogProvider,

    /// Overrides the provider's default base URL
    pub base_url: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// User-Agent header sent with lookups
    pub user_agent: String,
}

impl CatalogConfig {
    /// Returns the configured base URL or the provider default, without a trailing slash
    pub fn effective_base_url(&self) -> String {
        self.base_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| self.provider.default_base_url())
            .trim_end_matches('/')
            .to_string()
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            provider: CatalogProvider::Backend,
            base_url: None,
            timeout_secs: 10,
            user_agent: format!("pagemark/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ConfigSection for CatalogConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut results = vec![
            Validator::in_range(self.timeout_secs, 1, 120, "catalog.timeout_secs"),
            Validator::not_empty(&self.user_agent, "catalog.user_agent"),
        ];

        if let Some(ref url) = self.base_url {
            results.push(Validator::http_url(url, "catalog.base_url"));
        }

        Validator::collect_errors(results)
    }

    fn merge(&mut self, other: Self) {
        self.provider = other.provider;
        self.base_url = other.base_url;
        self.timeout_secs = other.timeout_secs;
        self.user_agent = other.user_agent;
    }

    fn restore_default(&mut self, field: &str) {
        let defaults = Self::default();
        match field {
            "catalog.base_url" => self.base_url = defaults.base_url,
            "catalog.timeout_secs" => self.timeout_secs = defaults.timeout_secs,
            "catalog.user_agent" => self.user_agent = defaults.user_agent,
            _ => {}
        }
    }

    fn section_name(&self) -> &'static str {
        "catalog"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(CatalogConfig::default().validate().is_ok());
    }

    #[test]
    fn test_effective_base_url_defaults_per_provider() {
        let mut config = CatalogConfig::default();
        assert_eq!(config.effective_base_url(), "http://localhost:5000");

        config.provider = CatalogProvider::OpenBd;
        assert_eq!(config.effective_base_url(), "https://api.openbd.jp");
    }

    #[test]
    fn test_effective_base_url_strips_trailing_slash() {
        let mut config = CatalogConfig::default();
        config.base_url = Some("https://books.example.com/".to_string());
        assert_eq!(config.effective_base_url(), "https://books.example.com");
    }

    #[test]
    fn test_invalid_timeout() {
        let mut config = CatalogConfig::default();
        config.timeout_secs = 0;
        assert!(config.validate().is_err());

        config.timeout_secs = 500;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_replace_invalid_keeps_valid_fields() {
        let mut config = CatalogConfig {
            provider: CatalogProvider::OpenBd,
            base_url: Some("https://books.example.com".to_string()),
            timeout_secs: 0,
            user_agent: " ".to_string(),
        };

        let replaced = config.replace_invalid();
        assert_eq!(replaced.len(), 2);
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.user_agent, CatalogConfig::default().user_agent);
        assert_eq!(config.provider, CatalogProvider::OpenBd);
        assert_eq!(config.base_url.as_deref(), Some("https://books.example.com"));
    }

    #[test]
    fn test_invalid_base_url() {
        let mut config = CatalogConfig::default();
        config.base_url = Some("not a url".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!("OpenBD".parse::<CatalogProvider>().unwrap(), CatalogProvider::OpenBd);
        assert_eq!("backend".parse::<CatalogProvider>().unwrap(), CatalogProvider::Backend);
        assert!("ndl".parse::<CatalogProvider>().is_err());
    }

    #[test]
    fn test_merge() {
        let mut base = CatalogConfig::default();
        let mut other = CatalogConfig::default();
        other.provider = CatalogProvider::OpenBd;
        other.timeout_secs = 30;

        base.merge(other);
        assert_eq!(base.provider, CatalogProvider::OpenBd);
        assert_eq!(base.timeout_secs, 30);
    }
}
