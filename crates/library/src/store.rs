//! Persistent storage for the book collection
//!
//! The whole collection is one unit: `load` returns every stored record and
//! `save` overwrites all of them.

use crate::error::{StoreError, StoreResult};
use pagemark_core::StoredBook;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// Backing storage for a library
pub trait BookStore: Send {
    /// Reads all records; `None` when nothing has been stored yet
    fn load(&self) -> StoreResult<Option<Vec<StoredBook>>>;

    /// Replaces the stored collection
    fn save(&self, books: &[StoredBook]) -> StoreResult<()>;

    /// Human-readable location for messages
    fn location(&self) -> String;
}

/// Stores the collection as a JSON array in a single file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn write_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Write {
            location: self.location(),
            source,
        }
    }
}

impl BookStore for JsonFileStore {
    fn load(&self) -> StoreResult<Option<Vec<StoredBook>>> {
        if !self.path.exists() {
            log::debug!("No library file at {}", self.path.display());
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path).map_err(|e| StoreError::Read {
            location: self.location(),
            source: e,
        })?;

        if contents.trim().is_empty() {
            log::warn!("Library file {} is empty", self.path.display());
            return Ok(None);
        }

        let books: Vec<StoredBook> =
            serde_json::from_str(&contents).map_err(|e| StoreError::Corrupted {
                location: self.location(),
                reason: e.to_string(),
            })?;

        log::debug!("Read {} books from {}", books.len(), self.path.display());
        Ok(Some(books))
    }

    fn save(&self, books: &[StoredBook]) -> StoreResult<()> {
        let dir = self.parent_dir();
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| self.write_error(e))?;
            log::info!("Created data directory: {}", dir.display());
        }

        let json = serde_json::to_string_pretty(books)?;

        let mut temp_file = NamedTempFile::new_in(&dir).map_err(|e| self.write_error(e))?;
        temp_file
            .write_all(json.as_bytes())
            .map_err(|e| self.write_error(e))?;
        temp_file.flush().map_err(|e| self.write_error(e))?;
        temp_file
            .persist(&self.path)
            .map_err(|e| self.write_error(e.error))?;

        log::debug!("Wrote {} books to {}", books.len(), self.path.display());
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    books: Option<Vec<StoredBook>>,
    saves: usize,
    fail_writes: bool,
}

/// In-process store; clones share the same contents
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds the given records
    pub fn with_books(books: Vec<StoredBook>) -> Self {
        let store = Self::new();
        if let Ok(mut state) = store.state.lock() {
            state.books = Some(books);
        }
        store
    }

    /// Currently stored records
    pub fn books(&self) -> Option<Vec<StoredBook>> {
        self.state.lock().ok().and_then(|s| s.books.clone())
    }

    /// Number of successful saves
    pub fn save_count(&self) -> usize {
        self.state.lock().map(|s| s.saves).unwrap_or(0)
    }

    /// Makes subsequent saves fail
    pub fn set_fail_writes(&self, fail: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_writes = fail;
        }
    }

    fn poisoned(&self) -> StoreError {
        StoreError::Corrupted {
            location: self.location(),
            reason: "store lock poisoned".to_string(),
        }
    }
}

impl BookStore for MemoryStore {
    fn load(&self) -> StoreResult<Option<Vec<StoredBook>>> {
        let state = self.state.lock().map_err(|_| self.poisoned())?;
        Ok(state.books.clone())
    }

    fn save(&self, books: &[StoredBook]) -> StoreResult<()> {
        let mut state = self.state.lock().map_err(|_| self.poisoned())?;
        if state.fail_writes {
            return Err(StoreError::Write {
                location: self.location(),
                source: std::io::Error::other("writes disabled"),
            });
        }
        state.books = Some(books.to_vec());
        state.saves += 1;
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
