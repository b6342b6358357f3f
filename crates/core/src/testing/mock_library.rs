//! In-memory library lookup for testing.

use std::sync::RwLock;

use crate::library::{LibraryError, LocalBook, LocalBookLookup};

/// Mock implementation of the LocalBookLookup trait.
///
/// Holds books in memory and matches on ISBN or ISBN-13. Lookups are
/// recorded, and `fail_lookups` turns every lookup into a database error.
#[derive(Debug, Default)]
pub struct MockLibrary {
    books: RwLock<Vec<LocalBook>>,
    lookups: RwLock<Vec<String>>,
    failure: RwLock<Option<String>>,
}

impl MockLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_book(&self, book: LocalBook) {
        self.books.write().unwrap().push(book);
    }

    pub fn fail_lookups(&self, message: &str) {
        *self.failure.write().unwrap() = Some(message.to_string());
    }

    pub fn recorded_lookups(&self) -> Vec<String> {
        self.lookups.read().unwrap().clone()
    }
}

impl LocalBookLookup for MockLibrary {
    fn find_by_isbn(&self, isbn: &str) -> Result<Option<LocalBook>, LibraryError> {
        self.lookups.write().unwrap().push(isbn.to_string());

        if let Some(message) = self.failure.read().unwrap().clone() {
            return Err(LibraryError::Database(message));
        }

        Ok(self
            .books
            .read()
            .unwrap()
            .iter()
            .find(|book| {
                book.isbn.as_deref() == Some(isbn) || book.isbn13.as_deref() == Some(isbn)
            })
            .cloned())
    }
}
