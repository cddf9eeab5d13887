//! Book domain model

use crate::error::{AppError, Result};
use crate::types::{Clock, Isbn, Stopwatch, Timestamp, Validator};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Unique identifier for a book
///
/// Opaque: freshly generated ids are UUIDs, but ids read back from storage
/// are kept verbatim whatever their format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(String);

impl BookId {
    /// Creates a new random BookId
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wraps an existing id string
    pub fn from_string(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(AppError::InvalidArgument {
                argument: "book id".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the BookId as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the first `len` characters, for compact display
    pub fn short(&self, len: usize) -> &str {
        match self.0.char_indices().nth(len) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl Default for BookId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Partial update applied to a book through [`Book::apply_patch`]
///
/// `current_page` is signed so out-of-range requests can be clamped rather
/// than rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub total_pages: Option<u32>,
    pub current_page: Option<i64>,
    pub cover_image: Option<Option<String>>,
    pub reading_time: Option<u64>,
}

impl BookPatch {
    /// Creates an empty patch
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn total_pages(mut self, pages: u32) -> Self {
        self.total_pages = Some(pages);
        self
    }

    pub fn current_page(mut self, page: i64) -> Self {
        self.current_page = Some(page);
        self
    }

    pub fn cover_image(mut self, cover: Option<String>) -> Self {
        self.cover_image = Some(cover);
        self
    }

    pub fn reading_time(mut self, seconds: u64) -> Self {
        self.reading_time = Some(seconds);
        self
    }

    /// Returns true if the patch changes nothing
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A tracked book: bibliographic data, reading position and reading time
///
/// Fields are read through accessors; all mutation goes through
/// [`Book::apply_patch`] so `current_page <= total_pages` always holds.
#[derive(Debug)]
pub struct Book {
    id: BookId,
    isbn: Isbn,
    title: String,
    author: String,
    publisher: Option<String>,
    published: Option<String>,
    total_pages: u32,
    current_page: u32,
    cover_image: Option<String>,
    reading_time: u64,
    added_at: Timestamp,
    stopwatch: Stopwatch,
}

impl Book {
    /// Creates a new book with a fresh id
    pub fn new(isbn: Isbn, title: impl Into<String>) -> Self {
        let id = BookId::new();
        Self {
            stopwatch: Stopwatch::new(id.clone(), 0),
            id,
            isbn,
            title: title.into(),
            author: String::new(),
            publisher: None,
            published: None,
            total_pages: 0,
            current_page: 0,
            cover_image: None,
            reading_time: 0,
            added_at: Timestamp::now(),
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_total_pages(mut self, pages: u32) -> Self {
        self.total_pages = pages;
        self.current_page = self.current_page.min(pages);
        self
    }

    pub fn with_cover_image(mut self, cover: Option<String>) -> Self {
        self.cover_image = cover.filter(|c| !c.trim().is_empty());
        self
    }

    pub fn with_publisher(mut self, publisher: Option<String>) -> Self {
        self.publisher = publisher.filter(|p| !p.trim().is_empty());
        self
    }

    pub fn with_published(mut self, published: Option<String>) -> Self {
        self.published = published.filter(|p| !p.trim().is_empty());
        self
    }

    /// Swaps in a stopwatch driven by the given clock, keeping the total
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        let interval = self.stopwatch.tick_interval();
        self.stopwatch = Stopwatch::with_clock(self.id.clone(), self.reading_time, clock)
            .with_tick_interval(interval);
        self
    }

    /// Reconstructs a book from its persisted form
    ///
    /// The id is preserved, the stopwatch starts idle and seeded with the
    /// stored reading time, and an out-of-range page is clamped.
    pub fn from_stored(stored: StoredBook) -> Result<Self> {
        let id = BookId::from_string(&stored.id)
            .map_err(|_| AppError::invalid_record(&stored.id, "id", "must not be empty"))?;

        let isbn = Isbn::parse(&stored.isbn).map_err(|e| {
            AppError::invalid_record(id.as_str(), "isbn", e.to_string())
        })?;

        let total_pages = stored.total_pages;
        let current_page = clamp_page(stored.current_page, total_pages);
        if i64::from(current_page) != stored.current_page {
            log::warn!(
                "Stored page {} for book {} is outside 0..={}, clamped to {}",
                stored.current_page,
                id,
                total_pages,
                current_page
            );
        }

        Ok(Self {
            stopwatch: Stopwatch::new(id.clone(), stored.reading_time),
            id,
            isbn,
            title: stored.title,
            author: stored.author,
            publisher: stored.publisher.filter(|p| !p.trim().is_empty()),
            published: stored.published.filter(|p| !p.trim().is_empty()),
            total_pages,
            current_page,
            cover_image: stored.cover_image,
            reading_time: stored.reading_time,
            added_at: stored
                .added_at
                .map(Timestamp::from_millis)
                .unwrap_or_else(Timestamp::now),
        })
    }

    /// Returns the persisted form of this book
    pub fn to_stored(&self) -> StoredBook {
        StoredBook {
            id: self.id.as_str().to_string(),
            isbn: self.isbn.as_str().to_string(),
            title: self.title.clone(),
            author: self.author.clone(),
            publisher: self.publisher.clone(),
            published: self.published.clone(),
            total_pages: self.total_pages,
            current_page: i64::from(self.current_page),
            cover_image: self.cover_image.clone(),
            reading_time: self.reading_time,
            added_at: Some(self.added_at.as_millis()),
        }
    }

    pub fn id(&self) -> &BookId {
        &self.id
    }

    pub fn isbn(&self) -> &Isbn {
        &self.isbn
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn publisher(&self) -> Option<&str> {
        self.publisher.as_deref()
    }

    pub fn published(&self) -> Option<&str> {
        self.published.as_deref()
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn cover_image(&self) -> Option<&str> {
        self.cover_image.as_deref()
    }

    pub fn added_at(&self) -> Timestamp {
        self.added_at
    }

    /// Reading time as last synced from the stopwatch (what gets persisted)
    pub fn reading_time(&self) -> u64 {
        self.reading_time
    }

    /// Reading time including a running session
    pub fn live_reading_time(&self) -> u64 {
        self.stopwatch.total_time()
    }

    pub fn stopwatch(&self) -> &Stopwatch {
        &self.stopwatch
    }

    pub fn stopwatch_mut(&mut self) -> &mut Stopwatch {
        &mut self.stopwatch
    }

    /// Copies the stopwatch total into `reading_time` and returns it
    pub fn sync_reading_time(&mut self) -> u64 {
        self.reading_time = self.stopwatch.total_time();
        self.reading_time
    }

    /// Percentage of pages read, rounded half up; 0 when the page count is unknown
    pub fn progress_percent(&self) -> u8 {
        progress_percent(self.current_page, self.total_pages)
    }

    /// Returns true once the last page has been reached
    pub fn is_completed(&self) -> bool {
        self.total_pages > 0 && self.current_page >= self.total_pages
    }

    /// Merges a patch, clamping the reading position into `0..=total_pages`
    pub fn apply_patch(&mut self, patch: &BookPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(author) = &patch.author {
            self.author = author.clone();
        }
        if let Some(cover) = &patch.cover_image {
            self.cover_image = cover.clone().filter(|c| !c.trim().is_empty());
        }
        if let Some(total) = patch.total_pages {
            self.total_pages = total;
        }

        let requested = patch
            .current_page
            .unwrap_or_else(|| i64::from(self.current_page));
        self.current_page = clamp_page(requested, self.total_pages);

        if let Some(seconds) = patch.reading_time {
            self.reading_time = seconds;
            self.stopwatch.set_total(seconds);
        }
    }

    /// Patch that puts back whatever `patch` would change
    ///
    /// Page bounds are always included since a smaller `total_pages` moves
    /// the reading position too.
    pub fn undo_patch(&self, patch: &BookPatch) -> BookPatch {
        BookPatch {
            title: patch.title.as_ref().map(|_| self.title.clone()),
            author: patch.author.as_ref().map(|_| self.author.clone()),
            total_pages: Some(self.total_pages),
            current_page: Some(i64::from(self.current_page)),
            cover_image: patch.cover_image.as_ref().map(|_| self.cover_image.clone()),
            reading_time: patch.reading_time.map(|_| self.reading_time),
        }
    }
}

impl Validator for Book {
    fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.title.trim().is_empty() {
            errors.push("Title cannot be empty".to_string());
        }

        if self.current_page > self.total_pages {
            errors.push("Current page cannot exceed total pages".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Clamps a requested page into `0..=total_pages`
pub fn clamp_page(requested: i64, total_pages: u32) -> u32 {
    requested.clamp(0, i64::from(total_pages)) as u32
}

/// `round(current / total * 100)`, or 0 when `total` is 0
pub fn progress_percent(current_page: u32, total_pages: u32) -> u8 {
    if total_pages == 0 {
        return 0;
    }
    let current = u64::from(current_page.min(total_pages));
    let total = u64::from(total_pages);
    ((current * 200 + total) / (total * 2)) as u8
}

/// Serialized shape of a book in the persistent store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredBook {
    pub id: String,
    pub isbn: String,
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, rename = "pubdate", skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub current_page: i64,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub reading_time: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<i64>,
}

fn empty_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ManualClock;
    use std::time::Duration;

    fn sample_book(total_pages: u32) -> Book {
        Book::new(Isbn::parse("0306406152").unwrap(), "Test Book")
            .with_author("Author")
            .with_total_pages(total_pages)
    }

    #[test]
    fn test_undo_patch_restores_book() {
        let mut book = sample_book(300);
        book.apply_patch(&BookPatch::new().current_page(250).reading_time(40));
        let before = book.to_stored();

        let patch = BookPatch::new().title("Renamed").total_pages(100).reading_time(0);
        let undo = book.undo_patch(&patch);
        book.apply_patch(&patch);
        assert_eq!(book.current_page(), 100);

        book.apply_patch(&undo);
        assert_eq!(book.to_stored(), before);
        assert_eq!(book.live_reading_time(), 40);
        assert_eq!(undo.author, None);
    }

    #[test]
    fn test_book_id_creation() {
        let id1 = BookId::new();
        let id2 = BookId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_book_id_from_string_keeps_legacy_format() {
        let id = BookId::from_string("lq2k1z8abc").unwrap();
        assert_eq!(id.as_str(), "lq2k1z8abc");
        assert!(BookId::from_string("   ").is_err());
    }

    #[test]
    fn test_book_id_short() {
        let id = BookId::from_string("abcdef123456").unwrap();
        assert_eq!(id.short(8), "abcdef12");
        assert_eq!(id.short(50), "abcdef123456");
    }

    #[test]
    fn test_book_new_defaults() {
        let book = Book::new(Isbn::parse("0306406152").unwrap(), "Title");
        assert_eq!(book.author(), "");
        assert_eq!(book.total_pages(), 0);
        assert_eq!(book.current_page(), 0);
        assert_eq!(book.reading_time(), 0);
        assert!(book.cover_image().is_none());
        assert!(!book.stopwatch().is_active());
        assert_eq!(book.stopwatch().book_id(), book.id());
    }

    #[test]
    fn test_current_page_clamped_above_total() {
        let mut book = sample_book(300);
        book.apply_patch(&BookPatch::new().current_page(500));
        assert_eq!(book.current_page(), 300);
    }

    #[test]
    fn test_current_page_clamped_below_zero() {
        let mut book = sample_book(300);
        book.apply_patch(&BookPatch::new().current_page(-12));
        assert_eq!(book.current_page(), 0);
    }

    #[test]
    fn test_shrinking_total_reclamps_current_page() {
        let mut book = sample_book(300);
        book.apply_patch(&BookPatch::new().current_page(250));
        book.apply_patch(&BookPatch::new().total_pages(200));
        assert_eq!(book.current_page(), 200);
        assert!(book.is_valid());
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(0, 0), 0);
        assert_eq!(progress_percent(0, 200), 0);
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 67);
        assert_eq!(progress_percent(1, 200), 1); // 0.5 rounds up
        assert_eq!(progress_percent(150, 300), 50);
        assert_eq!(progress_percent(300, 300), 100);
    }

    #[test]
    fn test_progress_zero_total_any_page() {
        let mut book = sample_book(0);
        book.apply_patch(&BookPatch::new().current_page(42));
        assert_eq!(book.current_page(), 0);
        assert_eq!(book.progress_percent(), 0);
    }

    #[test]
    fn test_is_completed() {
        let mut book = sample_book(10);
        assert!(!book.is_completed());
        book.apply_patch(&BookPatch::new().current_page(10));
        assert!(book.is_completed());
        assert!(!sample_book(0).is_completed());
    }

    #[test]
    fn test_reading_time_patch_reseeds_stopwatch() {
        let mut book = sample_book(10);
        book.apply_patch(&BookPatch::new().reading_time(90));
        assert_eq!(book.reading_time(), 90);
        assert_eq!(book.stopwatch().total_time(), 90);
    }

    #[test]
    fn test_sync_reading_time_after_session() {
        let clock = ManualClock::default();
        let mut book = sample_book(10).with_clock(Arc::new(clock.clone()));

        book.stopwatch_mut().start();
        clock.advance(Duration::from_secs(42));
        assert_eq!(book.live_reading_time(), 42);
        assert_eq!(book.reading_time(), 0);

        book.stopwatch_mut().stop();
        assert_eq!(book.sync_reading_time(), 42);
        assert_eq!(book.reading_time(), 42);
    }

    #[test]
    fn test_stored_round_trip() {
        let mut book = sample_book(320)
            .with_cover_image(Some("https://example.com/cover.jpg".to_string()))
            .with_publisher(Some("Publisher".to_string()));
        book.apply_patch(&BookPatch::new().current_page(120).reading_time(3600));

        let restored = Book::from_stored(book.to_stored()).unwrap();
        assert_eq!(restored.id(), book.id());
        assert_eq!(restored.isbn(), book.isbn());
        assert_eq!(restored.title(), book.title());
        assert_eq!(restored.author(), book.author());
        assert_eq!(restored.total_pages(), 320);
        assert_eq!(restored.current_page(), 120);
        assert_eq!(restored.reading_time(), 3600);
        assert_eq!(restored.cover_image(), book.cover_image());
        assert_eq!(restored.publisher(), Some("Publisher"));
        assert!(!restored.stopwatch().is_active());
        assert_eq!(restored.stopwatch().total_time(), 3600);
    }

    #[test]
    fn test_stored_json_shape() {
        let book = sample_book(100);
        let json = serde_json::to_value(book.to_stored()).unwrap();
        for key in [
            "id",
            "isbn",
            "title",
            "author",
            "totalPages",
            "currentPage",
            "coverImage",
            "readingTime",
        ] {
            assert!(json.get(key).is_some(), "missing key {}", key);
        }
    }

    #[test]
    fn test_stored_accepts_legacy_record() {
        let json = r#"{
            "id": "lq2k1z8abc",
            "isbn": "9780306406157",
            "title": "Legacy",
            "author": "",
            "totalPages": 100,
            "currentPage": 250,
            "coverImage": "",
            "readingTime": 75
        }"#;
        let stored: StoredBook = serde_json::from_str(json).unwrap();
        assert!(stored.cover_image.is_none());

        let book = Book::from_stored(stored).unwrap();
        assert_eq!(book.id().as_str(), "lq2k1z8abc");
        assert_eq!(book.current_page(), 100);
        assert_eq!(book.reading_time(), 75);
    }

    #[test]
    fn test_stored_with_bad_isbn_is_rejected() {
        let stored = StoredBook {
            id: "abc".to_string(),
            isbn: "123".to_string(),
            title: "Bad".to_string(),
            author: String::new(),
            publisher: None,
            published: None,
            total_pages: 0,
            current_page: 0,
            cover_image: None,
            reading_time: 0,
            added_at: None,
        };
        let err = Book::from_stored(stored).unwrap_err();
        assert!(matches!(err, AppError::InvalidRecord { .. }));
    }

    #[test]
    fn test_book_validation_empty_title() {
        let book = Book::new(Isbn::parse("0306406152").unwrap(), "   ");
        assert!(!book.is_valid());
    }
}
