//! Open Library ISBN API client.
//!
//! Edition records reference authors by key only, so when `resolve_authors`
//! is on each reference costs one extra request. A failed author request is
//! skipped rather than replaced with a placeholder name.

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::http::{self, HttpSettings};
use super::{BookSource, SourceError};
use crate::book::BookFragment;
use crate::config::OpenLibraryConfig;

const DEFAULT_BASE_URL: &str = "https://openlibrary.org";
const COVERS_URL: &str = "https://covers.openlibrary.org/b/isbn";
const SOURCE_NAME: &str = "openlibrary.org";

pub struct OpenLibrarySource {
    client: Client,
    base_url: String,
    resolve_authors: bool,
}

impl OpenLibrarySource {
    pub fn new(settings: &HttpSettings, config: &OpenLibraryConfig) -> Result<Self, SourceError> {
        Ok(Self {
            client: settings.client(false)?,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            resolve_authors: config.resolve_authors,
        })
    }

    /// Resolve author references concurrently, keeping reference order.
    async fn author_names(&self, refs: &[OlKeyRef], isbn: &str) -> Vec<String> {
        let base_url = self.base_url.trim_end_matches('/');
        let lookups = refs.iter().map(|author_ref| async move {
            let url = format!("{}{}.json", base_url, author_ref.key);
            match http::get_json::<OlAuthor>(&self.client, &url, &[], isbn).await {
                Ok(author) => author.name,
                Err(e) => {
                    warn!("Skipping Open Library author {}: {}", author_ref.key, e);
                    None
                }
            }
        });

        join_all(lookups).await.into_iter().flatten().collect()
    }
}

#[async_trait]
impl BookSource for OpenLibrarySource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn fetch(&self, isbn: &str) -> Result<BookFragment, SourceError> {
        let url = format!(
            "{}/isbn/{}.json",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(isbn)
        );
        let edition: OlEdition = http::get_json(&self.client, &url, &[], isbn).await?;

        let authors = if self.resolve_authors {
            self.author_names(&edition.authors, isbn).await
        } else {
            Vec::new()
        };
        debug!(
            "Open Library edition for {} has {} resolved authors",
            isbn,
            authors.len()
        );

        Ok(map_edition(isbn, edition, authors))
    }
}

// Open Library API response types (internal)

#[derive(Debug, Deserialize)]
struct OlEdition {
    title: Option<String>,
    subtitle: Option<String>,
    publish_date: Option<String>,
    number_of_pages: Option<u32>,
    description: Option<OlText>,
    #[serde(default)]
    publishers: Vec<String>,
    #[serde(default)]
    isbn_13: Vec<String>,
    #[serde(default)]
    languages: Vec<OlKeyRef>,
    #[serde(default)]
    subjects: Vec<String>,
    #[serde(default)]
    authors: Vec<OlKeyRef>,
}

#[derive(Debug, Deserialize)]
struct OlKeyRef {
    key: String,
}

#[derive(Debug, Deserialize)]
struct OlAuthor {
    name: Option<String>,
}

/// Descriptions are either a bare string or a typed text object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OlText {
    Plain(String),
    Typed { value: String },
}

impl From<OlText> for String {
    fn from(text: OlText) -> Self {
        match text {
            OlText::Plain(value) | OlText::Typed { value } => value,
        }
    }
}

fn map_edition(isbn: &str, edition: OlEdition, authors: Vec<String>) -> BookFragment {
    let mut fragment = BookFragment::new(SOURCE_NAME);
    fragment.isbn = Some(isbn.to_string());
    fragment.isbn13 = edition.isbn_13.into_iter().next();
    fragment.title = edition.title;
    fragment.subtitle = edition.subtitle;
    fragment.description = edition.description.map(String::from);
    fragment.published_date = edition.publish_date;
    fragment.page_count = edition.number_of_pages;
    fragment.publisher = edition.publishers.into_iter().next();
    // "/languages/dut" -> "dut"
    fragment.language = edition
        .languages
        .first()
        .and_then(|lang| lang.key.rsplit('/').next())
        .map(str::to_string);
    fragment.cover_url = Some(format!("{}/{}-L.jpg", COVERS_URL, isbn));
    fragment.thumbnail_url = Some(format!("{}/{}-M.jpg", COVERS_URL, isbn));
    for author in &authors {
        fragment.push_author(author);
    }
    for subject in &edition.subjects {
        fragment.push_category(subject);
    }
    fragment
}
