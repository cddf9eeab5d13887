//! Client for the Pagemark lookup backend

use crate::http;
use crate::traits::non_empty;
use crate::{CatalogBook, CatalogSource, SourceError, SourceMetadata, SourceResult};
use async_trait::async_trait;
use pagemark_core::Isbn;
use reqwest::{Client, Url};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Lookup through a backend exposing `GET {base_url}/api/book/{isbn}`
pub struct BackendSource {
    base_url: String,
    client: Option<Client>,
}

impl BackendSource {
    /// Creates a source with a default HTTP client
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = match http::default_client() {
            Ok(client) => Some(client),
            Err(e) => {
                log::warn!("{}", e);
                None
            }
        };

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Creates a source around a configured HTTP client
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Some(client),
        }
    }

    fn book_url(&self, isbn: &Isbn) -> SourceResult<Url> {
        http::endpoint(&self.base_url, &["api", "book", isbn.as_str()])
    }
}

#[async_trait]
impl CatalogSource for BackendSource {
    async fn lookup(&self, isbn: &Isbn) -> SourceResult<CatalogBook> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| SourceError::NetworkError("HTTP client not available".to_string()))?;

        let response = http::get(client, self.book_url(isbn)?).await?;
        let response = http::check_status(response).await?;
        let body: BackendBook = http::json_body(response).await?;

        body.into_catalog_book()
    }

    fn metadata(&self) -> SourceMetadata {
        SourceMetadata {
            name: "backend".to_string(),
            description: "Pagemark lookup backend".to_string(),
            base_url: self.base_url.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BackendBook {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    publisher: Option<String>,
    #[serde(default)]
    pubdate: Option<String>,
    #[serde(default, deserialize_with = "lenient_pages")]
    total_pages: u32,
    #[serde(default)]
    cover_image: Option<String>,
}

impl BackendBook {
    fn into_catalog_book(self) -> SourceResult<CatalogBook> {
        let title = non_empty(self.title)
            .ok_or_else(|| SourceError::ParseError("Response has no title".to_string()))?;

        Ok(CatalogBook {
            title,
            author: non_empty(self.author).unwrap_or_default(),
            publisher: non_empty(self.publisher),
            published: non_empty(self.pubdate),
            total_pages: self.total_pages,
            cover_image: non_empty(self.cover_image),
        })
    }
}

/// Accepts a page count given as a number, a numeric string or null
fn lenient_pages<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as u64))
            .map(|v| v.min(u32::MAX as u64) as u32)
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse::<u32>().unwrap_or(0),
        _ => 0,
    })
}
