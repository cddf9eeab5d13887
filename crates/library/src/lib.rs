//! Pagemark library management
//!
//! Holds the ordered book collection, persists it through a `BookStore`
//! and resolves new ISBNs through a `CatalogSource`.

pub mod error;
pub mod library;
pub mod store;
pub mod view;

pub use error::{ErrorKind, LibraryError, LibraryResult, StoreError, StoreResult};
pub use library::{ChangeListener, Library, LibraryOptions, PendingAdd};
pub use store::{BookStore, JsonFileStore, MemoryStore};
pub use view::{BookView, COVER_PLACEHOLDER};
