//! Pagemark core domain
//!
//! Books, their identifiers and the reading-time stopwatch. This crate has no
//! I/O beyond reading the system clock.

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, ErrorSeverity, RecoveryAction, Result};
pub use types::{
    format_clock, Book, BookId, BookPatch, Clock, Isbn, LibraryStats, ManualClock, Stopwatch,
    StoredBook, SystemClock, TickObserver, Timestamp, Validator, DEFAULT_TICK_INTERVAL,
};
