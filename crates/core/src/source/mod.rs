//! External book sources.
//!
//! Each source fetches whatever one external catalog knows about an ISBN and
//! maps it into a [`BookFragment`]. Some sources scrape retailer pages, others
//! call JSON APIs; callers only see the [`BookSource`] trait.

mod boekenplatform;
mod books_in_belgium;
mod google_books;
mod http;
mod open_library;
mod standaard;

pub use boekenplatform::BoekenplatformSource;
pub use books_in_belgium::BooksInBelgiumSource;
pub use google_books::GoogleBooksSource;
pub use http::{absolutize, force_https, HttpSettings};
pub use open_library::OpenLibrarySource;
pub use standaard::StandaardSource;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::book::BookFragment;
use crate::config::{LookupConfig, SourceKind};

/// Errors a source can report for a single lookup.
///
/// `NotFound` means the upstream answered and has no record. Every other
/// variant is an upstream failure. The resolver treats both the same way and
/// moves on to the next source; the split only matters for logs and metrics.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Upstream has no record for this ISBN.
    #[error("No record found for ISBN {0}")]
    NotFound(String),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Upstream returned a non-success status.
    #[error("Upstream error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse the page or response body.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// The request did not finish in time.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

impl SourceError {
    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            SourceError::NotFound(_) => "not_found",
            SourceError::Timeout(_) => "timeout",
            SourceError::HttpError(e) if e.is_timeout() => "timeout",
            _ => "upstream",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SourceError::NotFound(_))
    }
}

/// A catalog that can be asked about one ISBN.
#[async_trait]
pub trait BookSource: Send + Sync {
    /// Identifier stamped on every fragment this source returns.
    fn name(&self) -> &str;

    /// Fetch and normalize what this source knows about `isbn`.
    async fn fetch(&self, isbn: &str) -> Result<BookFragment, SourceError>;
}

/// Build the configured sources in priority order.
pub fn build_sources(config: &LookupConfig) -> Result<Vec<Arc<dyn BookSource>>, SourceError> {
    let settings = HttpSettings::from(config);

    config
        .priority
        .iter()
        .map(|kind| -> Result<Arc<dyn BookSource>, SourceError> {
            info!("Initializing book source: {}", kind.as_str());
            let source: Arc<dyn BookSource> = match kind {
                SourceKind::Standaard => {
                    Arc::new(StandaardSource::new(&settings, &config.standaard)?)
                }
                SourceKind::BooksInBelgium => {
                    Arc::new(BooksInBelgiumSource::new(&settings, &config.books_in_belgium)?)
                }
                SourceKind::Boekenplatform => {
                    Arc::new(BoekenplatformSource::new(&settings, &config.boekenplatform)?)
                }
                SourceKind::GoogleBooks => {
                    Arc::new(GoogleBooksSource::new(&settings, &config.google_books)?)
                }
                SourceKind::OpenLibrary => {
                    Arc::new(OpenLibrarySource::new(&settings, &config.open_library)?)
                }
            };
            Ok(source)
        })
        .collect()
}
