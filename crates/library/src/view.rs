//! Read-only snapshots handed to the presentation layer

use pagemark_core::{format_clock, Book};
use serde::Serialize;

/// Shown in place of a missing cover image
pub const COVER_PLACEHOLDER: &str = "[no cover]";

/// Display-ready state of one book
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookView {
    pub id: String,
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub publisher: Option<String>,
    pub published: Option<String>,
    pub current_page: u32,
    pub total_pages: u32,
    pub progress_percent: u8,
    /// Seconds, including a running session
    pub reading_time: u64,
    /// `HH:MM:SS`
    pub reading_time_display: String,
    pub cover_image: Option<String>,
    pub is_reading: bool,
    pub is_completed: bool,
}

impl BookView {
    /// Cover reference, or the placeholder when there is none
    pub fn cover_display(&self) -> &str {
        self.cover_image.as_deref().unwrap_or(COVER_PLACEHOLDER)
    }

    /// First `len` characters of the id
    pub fn short_id(&self, len: usize) -> &str {
        match self.id.char_indices().nth(len) {
            Some((idx, _)) => &self.id[..idx],
            None => &self.id,
        }
    }
}

impl From<&Book> for BookView {
    fn from(book: &Book) -> Self {
        let reading_time = book.live_reading_time();
        Self {
            id: book.id().as_str().to_string(),
            isbn: book.isbn().as_str().to_string(),
            title: book.title().to_string(),
            author: book.author().to_string(),
            publisher: book.publisher().map(str::to_string),
            published: book.published().map(str::to_string),
            current_page: book.current_page(),
            total_pages: book.total_pages(),
            progress_percent: book.progress_percent(),
            reading_time,
            reading_time_display: format_clock(reading_time),
            cover_image: book.cover_image().map(str::to_string),
            is_reading: book.stopwatch().is_active(),
            is_completed: book.is_completed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagemark_core::{BookPatch, Isbn};

    #[test]
    fn test_view_from_book() {
        let mut book = Book::new(Isbn::parse("0306406152").unwrap(), "Sample")
            .with_author("Writer")
            .with_total_pages(3);
        book.apply_patch(&BookPatch::new().current_page(1).reading_time(3725));

        let view = BookView::from(&book);
        assert_eq!(view.progress_percent, 33);
        assert_eq!(view.reading_time, 3725);
        assert_eq!(view.reading_time_display, "01:02:05");
        assert_eq!(view.cover_display(), COVER_PLACEHOLDER);
        assert!(!view.is_reading);
        assert!(!view.is_completed);
    }

    #[test]
    fn test_view_completed_with_cover() {
        let mut book = Book::new(Isbn::parse("0306406152").unwrap(), "Done")
            .with_total_pages(10)
            .with_cover_image(Some("https://cover.example/x.jpg".to_string()));
        book.apply_patch(&BookPatch::new().current_page(10));

        let view = BookView::from(&book);
        assert!(view.is_completed);
        assert_eq!(view.progress_percent, 100);
        assert_eq!(view.cover_display(), "https://cover.example/x.jpg");
    }

    #[test]
    fn test_short_id() {
        let book = Book::new(Isbn::parse("0306406152").unwrap(), "Any");
        let view = BookView::from(&book);
        assert_eq!(view.short_id(8).chars().count(), 8);
        assert_eq!(view.short_id(100), view.id);
    }
}
