//! Client for the OpenBD public bibliographic API

use crate::http;
use crate::traits::non_empty;
use crate::{CatalogBook, CatalogSource, SourceError, SourceMetadata, SourceResult};
use async_trait::async_trait;
use pagemark_core::Isbn;
use regex_lite::Regex;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::sync::LazyLock;

static PAGE_COUNT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(\d+)[pページ頁]").ok());
static FIRST_NUMBER: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(\d+)").ok());

/// Lookup against `GET {base_url}/v1/get?isbn={isbn}`
pub struct OpenBdSource {
    base_url: String,
    client: Option<Client>,
}

impl OpenBdSource {
    pub const API_BASE: &'static str = "https://api.openbd.jp";

    /// Creates a source against the public OpenBD endpoint
    pub fn new() -> Self {
        Self::with_base_url(Self::API_BASE)
    }

    /// Creates a source against another OpenBD-compatible endpoint
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
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
}

impl Default for OpenBdSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogSource for OpenBdSource {
    async fn lookup(&self, isbn: &Isbn) -> SourceResult<CatalogBook> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| SourceError::NetworkError("HTTP client not available".to_string()))?;

        let mut url = http::endpoint(&self.base_url, &["v1", "get"])?;
        url.query_pairs_mut().append_pair("isbn", isbn.as_str());

        let response = http::get(client, url).await?;
        let response = http::check_status(response).await?;
        let records: Vec<Option<OpenBdRecord>> = http::json_body(response).await?;

        let record = records
            .into_iter()
            .next()
            .flatten()
            .ok_or_else(|| SourceError::NotFound(http::NOT_FOUND_MESSAGE.to_string()))?;

        record.into_catalog_book()
    }

    fn metadata(&self) -> SourceMetadata {
        SourceMetadata {
            name: "openbd".to_string(),
            description: "OpenBD bibliographic database".to_string(),
            base_url: self.base_url.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenBdRecord {
    #[serde(default)]
    summary: Summary,
    #[serde(default)]
    onix: Value,
}

#[derive(Debug, Default, Deserialize)]
struct Summary {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    publisher: Option<String>,
    #[serde(default)]
    pubdate: Option<String>,
    #[serde(default)]
    cover: Option<String>,
    #[serde(default)]
    extent: Option<String>,
}

impl OpenBdRecord {
    fn into_catalog_book(self) -> SourceResult<CatalogBook> {
        let title = non_empty(self.summary.title)
            .or_else(|| onix_title(&self.onix))
            .ok_or_else(|| SourceError::ParseError("Record has no title".to_string()))?;

        let author = non_empty(self.summary.author)
            .or_else(|| onix_author(&self.onix))
            .unwrap_or_default();

        Ok(CatalogBook {
            title,
            author,
            publisher: non_empty(self.summary.publisher),
            published: non_empty(self.summary.pubdate),
            total_pages: self.summary.extent.as_deref().map(extract_pages).unwrap_or(0),
            cover_image: non_empty(self.summary.cover),
        })
    }
}

fn onix_title(onix: &Value) -> Option<String> {
    let element = onix.pointer("/DescriptiveDetail/TitleDetail/TitleElement")?;
    let element = match element {
        Value::Array(items) => items.first()?,
        other => other,
    };
    let title = element.pointer("/TitleText/content")?.as_str()?;
    non_empty(Some(title.to_string()))
}

fn onix_author(onix: &Value) -> Option<String> {
    let person = onix.pointer("/DescriptiveDetail/Contributor/0/PersonName")?;
    let name = match person {
        Value::String(s) => s.as_str(),
        other => other.get("content")?.as_str()?,
    };
    non_empty(Some(name.to_string()))
}

/// Parses a page count out of an OpenBD `extent` string
///
/// Takes the first number followed by `p`, `ページ` or `頁`, else the first
/// number at all, else 0.
pub fn extract_pages(extent: &str) -> u32 {
    let capture = |pattern: &LazyLock<Option<Regex>>| -> Option<u32> {
        let regex = pattern.as_ref()?;
        regex.captures(extent)?.get(1)?.as_str().parse().ok()
    };

    capture(&PAGE_COUNT)
        .or_else(|| capture(&FIRST_NUMBER))
        .unwrap_or(0)
}
