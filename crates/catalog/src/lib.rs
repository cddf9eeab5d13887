//! Book metadata lookup clients
//!
//! A `CatalogSource` turns an ISBN into a `CatalogBook`. Two providers exist:
//! the Pagemark backend (`GET /api/book/{isbn}`) and the public OpenBD API.

mod backend;
mod http;
mod openbd;
mod traits;

pub use backend::BackendSource;
pub use openbd::{extract_pages, OpenBdSource};
pub use traits::{CatalogBook, CatalogSource, SourceMetadata};

use pagemark_config::{CatalogConfig, CatalogProvider};
use std::fmt;
use std::sync::Arc;

/// Result type for catalog operations
pub type SourceResult<T> = Result<T, SourceError>;

/// Errors from catalog sources
#[derive(Debug, Clone, PartialEq)]
pub enum SourceError {
    /// Request could not be sent or the connection failed
    NetworkError(String),
    /// Response body was not usable
    ParseError(String),
    /// The service has no record for the identifier
    NotFound(String),
    /// Identifier rejected before or by the service
    InvalidQuery(String),
    /// Service asked us to slow down
    RateLimited,
    /// Request exceeded the configured timeout
    Timeout,
    /// Service answered with a server error
    Unavailable(String),
}

impl SourceError {
    /// Message suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            SourceError::NetworkError(_) => {
                "Could not reach the book lookup service. Check your connection.".to_string()
            }
            SourceError::ParseError(_) => {
                "The lookup service returned data that could not be read.".to_string()
            }
            SourceError::NotFound(message) => message.clone(),
            SourceError::InvalidQuery(message) => message.clone(),
            SourceError::RateLimited => {
                "The lookup service is busy. Try again in a moment.".to_string()
            }
            SourceError::Timeout => "The book lookup timed out.".to_string(),
            SourceError::Unavailable(_) => {
                "The book lookup service is unavailable right now.".to_string()
            }
        }
    }

    /// Whether repeating the same request later could succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SourceError::NetworkError(_)
                | SourceError::RateLimited
                | SourceError::Timeout
                | SourceError::Unavailable(_)
        )
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::NetworkError(e) => write!(f, "Network error: {}", e),
            SourceError::ParseError(e) => write!(f, "Parse error: {}", e),
            SourceError::NotFound(e) => write!(f, "Not found: {}", e),
            SourceError::InvalidQuery(e) => write!(f, "Invalid query: {}", e),
            SourceError::RateLimited => write!(f, "Rate limited"),
            SourceError::Timeout => write!(f, "Request timed out"),
            SourceError::Unavailable(e) => write!(f, "Source unavailable: {}", e),
        }
    }
}

impl std::error::Error for SourceError {}

/// Builds the configured lookup source
pub fn source_from_config(config: &CatalogConfig) -> SourceResult<Arc<dyn CatalogSource>> {
    let base_url = config.effective_base_url();
    let timeout = std::time::Duration::from_secs(config.timeout_secs);
    let client = http::build_client(timeout, &config.user_agent)?;

    log::debug!("Using {} catalog at {}", config.provider, base_url);

    let source: Arc<dyn CatalogSource> = match config.provider {
        CatalogProvider::Backend => Arc::new(BackendSource::with_client(client, base_url)),
        CatalogProvider::OpenBd => Arc::new(OpenBdSource::with_client(client, base_url)),
    };
    Ok(source)
}
