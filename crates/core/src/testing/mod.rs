//! Testing utilities and mock implementations.
//!
//! The mocks stand in for the network-facing sources and the local library
//! so resolution can be exercised without HTTP or a database.
//!
//! # Example
//!
//! ```rust,ignore
//! use bookshelf_core::testing::{fixtures, MockBookSource, MockLibrary};
//!
//! let primary = MockBookSource::new("Standaard Boekhandel");
//! let fallback = MockBookSource::with_fragment(
//!     "Google Books",
//!     fixtures::fragment("Google Books", "Mort"),
//! );
//! let library = MockLibrary::new();
//! library.add_book(fixtures::local_book("9780552131063", "Mort"));
//! ```

mod mock_library;
mod mock_source;

pub use mock_library::MockLibrary;
pub use mock_source::MockBookSource;

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::Utc;

    use crate::book::{BookFragment, SeriesRef};
    use crate::classifier::ContentType;
    use crate::library::{Author, AuthorLink, Category, CategoryLink, LocalBook};

    /// A fragment with a title and one author.
    pub fn fragment(source: &str, title: &str) -> BookFragment {
        let mut fragment = BookFragment::new(source);
        fragment.title = Some(title.to_string());
        fragment.authors = vec!["Test Author".to_string()];
        fragment
    }

    /// A fragment carrying the given category labels.
    pub fn fragment_with_categories(source: &str, title: &str, categories: &[&str]) -> BookFragment {
        let mut fragment = fragment(source, title);
        for category in categories {
            fragment.push_category(category);
        }
        fragment
    }

    /// A local book with no links and no pinned type.
    pub fn local_book(isbn: &str, title: &str) -> LocalBook {
        let now = Utc::now();
        LocalBook {
            id: format!("local-{}", isbn),
            isbn: Some(isbn.to_string()),
            isbn13: None,
            title: title.to_string(),
            subtitle: None,
            description: None,
            publisher: None,
            published_date: None,
            page_count: None,
            language: None,
            cover_url: None,
            thumbnail_url: None,
            authors: Vec::new(),
            categories: Vec::new(),
            series: None,
            series_number: None,
            book_type: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// A local book with authors, categories and optionally a pinned type.
    pub fn local_book_with(
        isbn: &str,
        title: &str,
        authors: &[&str],
        categories: &[&str],
        book_type: Option<ContentType>,
    ) -> LocalBook {
        let mut book = local_book(isbn, title);
        book.authors = authors
            .iter()
            .enumerate()
            .map(|(i, name)| AuthorLink {
                position: i as u32,
                author: Author {
                    id: format!("author-{}", i),
                    name: name.to_string(),
                },
            })
            .collect();
        book.categories = categories
            .iter()
            .enumerate()
            .map(|(i, name)| CategoryLink {
                category: Category {
                    id: format!("category-{}", i),
                    name: name.to_string(),
                },
            })
            .collect();
        book.book_type = book_type;
        book
    }

    pub fn series_ref(id: &str, name: &str) -> SeriesRef {
        SeriesRef {
            id: id.to_string(),
            name: name.to_string(),
        }
    }
}
