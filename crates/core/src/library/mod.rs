//! The local book library.
//!
//! The resolver only reads from it through [`LocalBookLookup`]. Writing a
//! resolved book back is a separate caller decision made through
//! [`BookLibrary::save`].

mod sqlite;
mod types;

pub use sqlite::SqliteLibrary;
pub use types::*;

use thiserror::Error;

/// Errors for library operations.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Book not found: {0}")]
    NotFound(String),

    #[error("Invalid book: {0}")]
    InvalidBook(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// Read access used during resolution.
pub trait LocalBookLookup: Send + Sync {
    /// Find a book whose ISBN-10 or ISBN-13 equals `isbn`.
    fn find_by_isbn(&self, isbn: &str) -> Result<Option<LocalBook>, LibraryError>;
}

/// Full library access.
pub trait BookLibrary: LocalBookLookup {
    fn get(&self, id: &str) -> Result<LocalBook, LibraryError>;

    /// Insert or update a book matched by ISBN or ISBN-13.
    ///
    /// Authors and categories are created by unique name on first use.
    /// Existing links are replaced, and author order follows `book.authors`.
    fn save(&self, book: &NewBook) -> Result<LocalBook, LibraryError>;
}
