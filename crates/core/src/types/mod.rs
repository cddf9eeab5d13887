//! Domain types for Pagemark
//!
//! This module contains the domain models organized by responsibility:
//! - `book`: Book, its id, partial updates and persisted shape
//! - `isbn`: Catalog lookup key and its validation
//! - `stopwatch`: Reading-time accumulator
//! - `clock`: Wall-clock sources for the stopwatch
//! - `stats`: Library statistics
//! - `common`: Shared traits and utilities

mod book;
mod clock;
mod common;
mod isbn;
mod stats;
mod stopwatch;

// Re-export all public types
pub use book::{clamp_page, progress_percent, Book, BookId, BookPatch, StoredBook};
pub use clock::{Clock, ManualClock, SystemClock};
pub use common::{format_clock, Timestamp, Validator};
pub use isbn::Isbn;
pub use stats::LibraryStats;
pub use stopwatch::{Stopwatch, TickObserver, DEFAULT_TICK_INTERVAL};
