//! Library statistics

use crate::types::format_clock;
use serde::{Deserialize, Serialize};

/// Library-wide reading statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryStats {
    pub total_books: usize,
    pub completed_books: usize,
    pub pages_read: u64,
    pub total_pages: u64,
    /// Seconds, including sessions still running
    pub total_reading_time: u64,
}

impl LibraryStats {
    /// Creates empty statistics
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the number of books not yet finished
    pub fn in_progress_books(&self) -> usize {
        self.total_books - self.completed_books
    }

    /// Returns the average reading time per book in seconds
    pub fn average_reading_time(&self) -> u64 {
        if self.total_books == 0 {
            return 0;
        }
        self.total_reading_time / self.total_books as u64
    }

    /// Returns the total reading time as HH:MM:SS
    pub fn total_reading_time_display(&self) -> String {
        format_clock(self.total_reading_time)
    }
}
