use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::book::{ResolvedBook, SeriesRef};
use crate::classifier::ContentType;

/// An author row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Author {
    pub id: String,
    pub name: String,
}

/// An author credited on a book, in listing order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthorLink {
    pub position: u32,
    pub author: Author,
}

/// A category row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub name: String,
}

/// A category attached to a book.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryLink {
    pub category: Category,
}

/// A book stored in the local library.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocalBook {
    pub id: String,
    pub isbn: Option<String>,
    pub isbn13: Option<String>,
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub publisher: Option<String>,
    pub published_date: Option<String>,
    pub page_count: Option<u32>,
    pub language: Option<String>,
    pub cover_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub authors: Vec<AuthorLink>,
    pub categories: Vec<CategoryLink>,
    pub series: Option<SeriesRef>,
    pub series_number: Option<String>,
    /// Pinned content type; `None` means not yet decided.
    #[serde(rename = "type")]
    pub book_type: Option<ContentType>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LocalBook {
    /// Author names ordered by position.
    pub fn author_names(&self) -> Vec<String> {
        let mut links: Vec<&AuthorLink> = self.authors.iter().collect();
        links.sort_by_key(|link| link.position);
        links.into_iter().map(|link| link.author.name.clone()).collect()
    }

    pub fn category_names(&self) -> Vec<String> {
        self.categories
            .iter()
            .map(|link| link.category.name.clone())
            .collect()
    }
}

/// Input for saving a book, as sent by clients after a lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub isbn13: Option<String>,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Author names in credit order.
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub page_count: Option<u32>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub series_id: Option<String>,
    #[serde(default)]
    pub series_number: Option<String>,
    #[serde(default, rename = "type")]
    pub book_type: Option<ContentType>,
}

impl From<ResolvedBook> for NewBook {
    fn from(book: ResolvedBook) -> Self {
        Self {
            isbn: book.isbn,
            isbn13: book.isbn13,
            title: book.title,
            subtitle: book.subtitle,
            description: book.description,
            authors: book.authors,
            categories: book.categories,
            publisher: book.publisher,
            published_date: book.published_date,
            page_count: book.page_count,
            language: book.language,
            cover_url: book.cover_url,
            thumbnail_url: book.thumbnail_url,
            series_id: book.series.map(|s| s.id),
            series_number: book.series_number,
            book_type: Some(book.book_type),
        }
    }
}
