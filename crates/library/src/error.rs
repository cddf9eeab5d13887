use pagemark_catalog::SourceError;
use pagemark_core::error::AppError;
use thiserror::Error;

/// Failures of the persistent store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read {location}: {source}")]
    Read {
        location: String,
        source: std::io::Error,
    },

    #[error("Failed to write {location}: {source}")]
    Write {
        location: String,
        source: std::io::Error,
    },

    #[error("Stored library at {location} is corrupted: {reason}")]
    Corrupted { location: String, reason: String },

    #[error("Failed to serialize library: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Invalid input: {0}")]
    Validation(#[from] AppError),

    #[error("Lookup failed: {0}")]
    Lookup(#[from] SourceError),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Book not found: {0}")]
    BookNotFound(String),

    #[error("Id prefix '{prefix}' matches {count} books")]
    AmbiguousId { prefix: String, count: usize },

    #[error("Lookup for {isbn} was superseded by a newer request")]
    Superseded { isbn: String },
}

/// Coarse classification used by callers deciding how to react
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input, nothing changed
    Validation,
    /// Remote lookup failed, collection unchanged
    Lookup,
    /// Reading or writing the store failed
    Storage,
    /// No book with that id
    NotFound,
    /// A newer add replaced this one
    Superseded,
}

impl LibraryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LibraryError::Validation(_) | LibraryError::AmbiguousId { .. } => {
                ErrorKind::Validation
            }
            LibraryError::Lookup(_) => ErrorKind::Lookup,
            LibraryError::Storage(_) => ErrorKind::Storage,
            LibraryError::BookNotFound(_) => ErrorKind::NotFound,
            LibraryError::Superseded { .. } => ErrorKind::Superseded,
        }
    }

    /// Message suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            LibraryError::Validation(e) => e.user_message(),
            LibraryError::Lookup(e) => e.user_message(),
            LibraryError::Storage(e) => format!("Could not save or load your books: {}", e),
            LibraryError::BookNotFound(id) => format!("No book matches '{}'", id),
            LibraryError::AmbiguousId { prefix, count } => format!(
                "'{}' matches {} books; use more characters of the id",
                prefix, count
            ),
            LibraryError::Superseded { .. } => {
                "A newer lookup replaced this one".to_string()
            }
        }
    }
}

pub type LibraryResult<T> = std::result::Result<T, LibraryError>;
