//! The ordered book collection and its operations
//!
//! Every mutation follows the same pattern: change the in-memory entries,
//! write the whole collection to the store, then notify the change listener.

use crate::error::{LibraryError, LibraryResult};
use crate::store::BookStore;
use crate::view::BookView;
use log::{debug, info, warn};
use pagemark_catalog::{CatalogBook, CatalogSource, SourceResult};
use pagemark_core::{
    Book, BookId, BookPatch, Clock, Isbn, LibraryStats, SystemClock, DEFAULT_TICK_INTERVAL,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Receives the current entries after every persisted mutation
pub type ChangeListener = Box<dyn Fn(&[BookView]) + Send>;

/// Settings applied to every book the library holds
#[derive(Debug, Clone)]
pub struct LibraryOptions {
    pub clock: Arc<dyn Clock>,
    pub tick_interval: Duration,
}

impl Default for LibraryOptions {
    fn default() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

/// A validated add waiting for its lookup result
///
/// Only the most recently issued ticket can complete; older ones are
/// rejected as superseded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAdd {
    isbn: Isbn,
    generation: u64,
}

impl PendingAdd {
    pub fn isbn(&self) -> &Isbn {
        &self.isbn
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Reading library backed by a store and a lookup service
pub struct Library<S: BookStore> {
    store: S,
    catalog: Arc<dyn CatalogSource>,
    books: Vec<Book>,
    options: LibraryOptions,
    generation: u64,
    on_change: Option<ChangeListener>,
}

impl<S: BookStore> Library<S> {
    /// Creates an empty library; call `load_books` to read the store
    pub fn new(store: S, catalog: Arc<dyn CatalogSource>) -> Self {
        Self::with_options(store, catalog, LibraryOptions::default())
    }

    pub fn with_options(store: S, catalog: Arc<dyn CatalogSource>, options: LibraryOptions) -> Self {
        Self {
            store,
            catalog,
            books: Vec::new(),
            options,
            generation: 0,
            on_change: None,
        }
    }

    /// Replaces the in-memory entries with the stored collection
    ///
    /// Returns the number of books loaded. Duplicate ids keep their first
    /// occurrence; records that fail validation are skipped with a warning.
    pub fn load_books(&mut self) -> LibraryResult<usize> {
        let stored = self.store.load()?.unwrap_or_default();

        let mut seen = HashSet::new();
        let mut books = Vec::with_capacity(stored.len());
        for record in stored {
            if !seen.insert(record.id.clone()) {
                warn!("Skipping duplicate book id {} in {}", record.id, self.store.location());
                continue;
            }
            let id = record.id.clone();
            match Book::from_stored(record) {
                Ok(book) => books.push(self.prepare(book)),
                Err(e) => warn!(
                    "Skipping unreadable record '{}' in {}: {}",
                    id,
                    self.store.location(),
                    e
                ),
            }
        }

        self.books = books;
        info!(
            "Loaded {} books from {}",
            self.books.len(),
            self.store.location()
        );
        Ok(self.books.len())
    }

    /// Writes the whole collection to the store
    pub fn save_books(&self) -> LibraryResult<()> {
        let stored: Vec<_> = self.books.iter().map(Book::to_stored).collect();
        self.store.save(&stored)?;
        debug!("Saved {} books to {}", stored.len(), self.store.location());
        Ok(())
    }

    /// Validates an identifier and issues the ticket for its lookup
    ///
    /// Any ticket issued earlier becomes stale.
    pub fn begin_add(&mut self, identifier: &str) -> LibraryResult<PendingAdd> {
        let isbn = Isbn::parse(identifier)?;
        self.generation += 1;
        debug!("Lookup {} started for {}", self.generation, isbn);
        Ok(PendingAdd {
            isbn,
            generation: self.generation,
        })
    }

    /// Completes an add with its lookup result
    ///
    /// Stale tickets, failed lookups and failed writes leave the collection
    /// unchanged.
    pub fn finish_add(
        &mut self,
        ticket: PendingAdd,
        result: SourceResult<CatalogBook>,
    ) -> LibraryResult<&Book> {
        if ticket.generation != self.generation {
            debug!(
                "Discarding lookup {} for {}; latest is {}",
                ticket.generation, ticket.isbn, self.generation
            );
            return Err(LibraryError::Superseded {
                isbn: ticket.isbn.to_string(),
            });
        }

        let found = result?;

        if self.books.iter().any(|b| b.isbn() == &ticket.isbn) {
            warn!("{} is already in the library; adding another copy", ticket.isbn);
        }

        let book = Book::new(ticket.isbn, found.title)
            .with_author(found.author)
            .with_publisher(found.publisher)
            .with_published(found.published)
            .with_total_pages(found.total_pages)
            .with_cover_image(found.cover_image);
        let book = self.prepare(book);

        self.books.push(book);
        if let Err(e) = self.persist_and_notify() {
            self.books.pop();
            return Err(e);
        }

        let index = self.books.len() - 1;
        let added = &self.books[index];
        info!("Added '{}' ({}) as {}", added.title(), added.isbn(), added.id());
        Ok(added)
    }

    /// Invalidates any outstanding add ticket
    pub fn cancel_pending(&mut self) {
        self.generation += 1;
        debug!("Pending lookups cancelled");
    }

    /// Looks up an identifier and appends the resulting book
    pub async fn add_book(&mut self, identifier: &str) -> LibraryResult<&Book> {
        let ticket = self.begin_add(identifier)?;
        let catalog = Arc::clone(&self.catalog);
        let result = catalog.lookup(ticket.isbn()).await;
        if let Err(ref e) = result {
            info!("Lookup for {} failed: {}", ticket.isbn(), e);
        }
        self.finish_add(ticket, result)
    }

    /// Removes a book; returns false when no book has that id
    pub fn remove_book(&mut self, id: &BookId) -> LibraryResult<bool> {
        let Some(index) = self.index_of(id) else {
            debug!("Remove ignored, no book {}", id);
            return Ok(false);
        };

        let removed = self.books.remove(index);
        if let Err(e) = self.persist_and_notify() {
            self.books.insert(index, removed);
            return Err(e);
        }
        info!("Removed '{}' ({})", removed.title(), removed.id());
        Ok(true)
    }

    /// Merges a patch into one book in memory without persisting
    ///
    /// The reading position is clamped into `0..=total_pages`. Returns false
    /// when no book has that id.
    pub fn apply_update(&mut self, id: &BookId, patch: &BookPatch) -> bool {
        match self.books.iter_mut().find(|b| b.id() == id) {
            Some(book) => {
                book.apply_patch(patch);
                true
            }
            None => false,
        }
    }

    /// Applies a patch, persists and notifies; returns false for an unknown id
    ///
    /// A failed write reverts the patch.
    pub fn update_book(&mut self, id: &BookId, patch: &BookPatch) -> LibraryResult<bool> {
        if patch.is_empty() {
            return Ok(self.index_of(id).is_some());
        }

        let Some(undo) = self.get(id).map(|book| book.undo_patch(patch)) else {
            debug!("Update ignored, no book {}", id);
            return Ok(false);
        };

        self.apply_update(id, patch);
        if let Err(e) = self.persist_and_notify() {
            self.apply_update(id, &undo);
            return Err(e);
        }
        info!("Updated book {}", id);
        Ok(true)
    }

    /// Sets the reading position, clamped into range
    pub fn set_current_page(&mut self, id: &BookId, page: i64) -> LibraryResult<u32> {
        if !self.update_book(id, &BookPatch::new().current_page(page))? {
            return Err(LibraryError::BookNotFound(id.to_string()));
        }
        Ok(self.book_or_err(id)?.current_page())
    }

    /// Starts the book's stopwatch; running stopwatches are left alone
    pub fn start_timer(&mut self, id: &BookId) -> LibraryResult<()> {
        let book = self.book_mut_or_err(id)?;
        book.stopwatch_mut().start();
        info!("Reading session started for {}", id);
        Ok(())
    }

    /// Stops the book's stopwatch and persists its total
    ///
    /// Returns the reading time in seconds. The elapsed time is kept in
    /// memory when the write fails and goes out with the next save.
    pub fn stop_timer(&mut self, id: &BookId) -> LibraryResult<u64> {
        let book = self.book_mut_or_err(id)?;
        if !book.stopwatch().is_active() {
            return Ok(book.reading_time());
        }

        book.stopwatch_mut().stop();
        let total = book.sync_reading_time();
        info!("Reading session stopped for {}, total {}s", id, total);

        self.persist_and_notify()?;
        Ok(total)
    }

    /// Zeroes the book's reading time and persists it
    pub fn reset_timer(&mut self, id: &BookId) -> LibraryResult<()> {
        let book = self.book_mut_or_err(id)?;
        book.stopwatch_mut().reset();
        book.sync_reading_time();
        info!("Reading time reset for {}", id);

        self.persist_and_notify()
    }

    /// Stops every running stopwatch and persists once if any were running
    pub fn stop_all_timers(&mut self) -> LibraryResult<usize> {
        let mut stopped = 0;
        for book in self.books.iter_mut().filter(|b| b.stopwatch().is_active()) {
            book.stopwatch_mut().stop();
            book.sync_reading_time();
            stopped += 1;
        }

        if stopped > 0 {
            info!("Stopped {} running timers", stopped);
            self.persist_and_notify()?;
        }
        Ok(stopped)
    }

    /// Registers the per-tick observer of a book's stopwatch
    pub fn set_timer_observer<F>(&mut self, id: &BookId, observer: F) -> LibraryResult<()>
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.book_mut_or_err(id)?.stopwatch_mut().set_observer(observer);
        Ok(())
    }

    /// Detaches the per-tick observer of a book's stopwatch
    pub fn clear_timer_observer(&mut self, id: &BookId) -> LibraryResult<()> {
        self.book_mut_or_err(id)?.stopwatch_mut().clear_observer();
        Ok(())
    }

    /// Reading time including a running session
    pub fn live_reading_time(&self, id: &BookId) -> LibraryResult<u64> {
        Ok(self.book_or_err(id)?.live_reading_time())
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn get(&self, id: &BookId) -> Option<&Book> {
        self.books.iter().find(|b| b.id() == id)
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn catalog(&self) -> &Arc<dyn CatalogSource> {
        &self.catalog
    }

    /// Resolves a full id or a unique id prefix
    pub fn find_by_prefix(&self, prefix: &str) -> LibraryResult<&Book> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Err(LibraryError::BookNotFound(prefix.to_string()));
        }

        if let Some(book) = self.books.iter().find(|b| b.id().as_str() == prefix) {
            return Ok(book);
        }

        let mut matches = self
            .books
            .iter()
            .filter(|b| b.id().as_str().starts_with(prefix));

        match (matches.next(), matches.count()) {
            (Some(book), 0) => Ok(book),
            (Some(_), rest) => Err(LibraryError::AmbiguousId {
                prefix: prefix.to_string(),
                count: rest + 1,
            }),
            (None, _) => Err(LibraryError::BookNotFound(prefix.to_string())),
        }
    }

    /// Totals across the collection; running sessions count toward reading time
    pub fn stats(&self) -> LibraryStats {
        self.books
            .iter()
            .fold(LibraryStats::empty(), |mut stats, book| {
                stats.total_books += 1;
                if book.is_completed() {
                    stats.completed_books += 1;
                }
                stats.pages_read += u64::from(book.current_page());
                stats.total_pages += u64::from(book.total_pages());
                stats.total_reading_time += book.live_reading_time();
                stats
            })
    }

    /// Display snapshots of every entry, in order
    pub fn snapshot(&self) -> Vec<BookView> {
        self.books.iter().map(BookView::from).collect()
    }

    pub fn set_on_change<F>(&mut self, listener: F)
    where
        F: Fn(&[BookView]) + Send + 'static,
    {
        self.on_change = Some(Box::new(listener));
    }

    pub fn clear_on_change(&mut self) {
        self.on_change = None;
    }

    fn prepare(&self, book: Book) -> Book {
        let mut book = book.with_clock(Arc::clone(&self.options.clock));
        book.stopwatch_mut()
            .set_tick_interval(self.options.tick_interval);
        book
    }

    fn persist_and_notify(&mut self) -> LibraryResult<()> {
        self.save_books()?;
        if let Some(listener) = &self.on_change {
            listener(&self.snapshot());
        }
        Ok(())
    }

    fn index_of(&self, id: &BookId) -> Option<usize> {
        self.books.iter().position(|b| b.id() == id)
    }

    fn book_or_err(&self, id: &BookId) -> LibraryResult<&Book> {
        self.get(id)
            .ok_or_else(|| LibraryError::BookNotFound(id.to_string()))
    }

    fn book_mut_or_err(&mut self, id: &BookId) -> LibraryResult<&mut Book> {
        self.books
            .iter_mut()
            .find(|b| b.id() == id)
            .ok_or_else(|| LibraryError::BookNotFound(id.to_string()))
    }
}

impl<S: BookStore> Drop for Library<S> {
    fn drop(&mut self) {
        if self.books.iter().any(|b| b.stopwatch().is_active()) {
            if let Err(e) = self.stop_all_timers() {
                warn!("Failed to save running timers on shutdown: {}", e);
            }
        }
    }
}
