use crate::SourceResult;
use async_trait::async_trait;
use pagemark_core::Isbn;

/// A service that resolves an ISBN to bibliographic data
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Looks up one book
    async fn lookup(&self, isbn: &Isbn) -> SourceResult<CatalogBook>;

    /// Describes the source
    fn metadata(&self) -> SourceMetadata;
}

/// Bibliographic data returned by a lookup
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CatalogBook {
    pub title: String,
    pub author: String,
    pub publisher: Option<String>,
    pub published: Option<String>,
    pub total_pages: u32,
    pub cover_image: Option<String>,
}

impl CatalogBook {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_total_pages(mut self, pages: u32) -> Self {
        self.total_pages = pages;
        self
    }

    pub fn with_cover_image(mut self, cover: impl Into<String>) -> Self {
        self.cover_image = Some(cover.into());
        self
    }
}

/// Source metadata
#[derive(Debug, Clone)]
pub struct SourceMetadata {
    pub name: String,
    pub description: String,
    pub base_url: String,
}

/// Drops empty strings returned for missing optional fields
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
