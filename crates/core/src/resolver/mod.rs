//! ISBN resolution across the configured sources.
//!
//! Sources are tried strictly in priority order and the first one that
//! returns a fragment with a title wins; later sources are never consulted
//! to fill gaps. Every source failure is logged and skipped. The only error
//! a caller sees for a missing book is [`ResolveError::BookNotFound`], and
//! only when no source answered and there is no local record either.

mod merge;

pub use merge::{from_local, merge, union_categories, LOCAL_SOURCE};

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::book::{normalize_isbn, BookFragment, ResolvedBook};
use crate::library::{LibraryError, LocalBookLookup};
use crate::metrics;
use crate::series::{SeriesError, SeriesResolver};
use crate::source::{BookSource, SourceError};

/// Errors surfaced by [`BookResolver::resolve`].
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Invalid ISBN: '{0}'")]
    InvalidIsbn(String),

    /// No source answered and there is no local record.
    #[error("Book not found in any database: {0}")]
    BookNotFound(String),

    #[error("Library lookup failed: {0}")]
    Library(#[from] LibraryError),

    #[error("Series resolution failed: {0}")]
    Series(#[from] SeriesError),
}

/// Resolves an ISBN into one merged book record.
pub struct BookResolver {
    sources: Vec<Arc<dyn BookSource>>,
    library: Arc<dyn LocalBookLookup>,
    series: Arc<SeriesResolver>,
    source_timeout: Duration,
}

impl BookResolver {
    /// `sources` must already be in priority order.
    pub fn new(
        sources: Vec<Arc<dyn BookSource>>,
        library: Arc<dyn LocalBookLookup>,
        series: Arc<SeriesResolver>,
        source_timeout: Duration,
    ) -> Self {
        Self {
            sources,
            library,
            series,
            source_timeout,
        }
    }

    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name().to_string()).collect()
    }

    pub async fn resolve(&self, raw_isbn: &str) -> Result<ResolvedBook, ResolveError> {
        let result = self.resolve_inner(raw_isbn).await;

        let outcome = match &result {
            Ok(book) if book.source == LOCAL_SOURCE => "local",
            Ok(_) => "external",
            Err(ResolveError::InvalidIsbn(_)) => "invalid",
            Err(ResolveError::BookNotFound(_)) => "not_found",
            Err(_) => "error",
        };
        metrics::RESOLUTIONS.with_label_values(&[outcome]).inc();

        result
    }

    async fn resolve_inner(&self, raw_isbn: &str) -> Result<ResolvedBook, ResolveError> {
        let isbn =
            normalize_isbn(raw_isbn).ok_or_else(|| ResolveError::InvalidIsbn(raw_isbn.to_string()))?;

        let local = self.library.find_by_isbn(&isbn)?;
        if let Some(book) = &local {
            debug!("Found local record {} for ISBN {}", book.id, isbn);
        }

        let Some(fragment) = self.first_fragment(&isbn).await else {
            return match local {
                Some(book) => {
                    info!("No source answered for {}, using local record", isbn);
                    Ok(from_local(&book))
                }
                None => {
                    warn!("Book not found in any database: {}", isbn);
                    Err(ResolveError::BookNotFound(isbn))
                }
            };
        };

        let series = match fragment.series_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Some(self.series.find_or_create_by_name(name)?),
            _ => None,
        };

        info!("Resolved {} from {}", isbn, fragment.source);
        Ok(merge(fragment, local.as_ref(), series))
    }

    /// Try each source in order and return the first usable fragment.
    async fn first_fragment(&self, isbn: &str) -> Option<BookFragment> {
        for source in &self.sources {
            let name = source.name();
            match self.fetch_one(source.as_ref(), isbn).await {
                Ok(fragment) if fragment.has_title() => {
                    metrics::SOURCE_LOOKUPS
                        .with_label_values(&[name, "success"])
                        .inc();
                    debug!(source = name, isbn, "Source returned a fragment");
                    return Some(fragment);
                }
                Ok(_) => {
                    metrics::SOURCE_LOOKUPS
                        .with_label_values(&[name, "incomplete"])
                        .inc();
                    warn!(source = name, isbn, "Source returned a fragment without a title");
                }
                Err(e) => {
                    let kind = e.kind();
                    metrics::SOURCE_LOOKUPS.with_label_values(&[name, kind]).inc();
                    if e.is_not_found() {
                        debug!(source = name, isbn, kind, "Source has no record");
                    } else {
                        warn!(source = name, isbn, kind, error = %e, "Source lookup failed");
                    }
                }
            }
        }
        None
    }

    async fn fetch_one(&self, source: &dyn BookSource, isbn: &str) -> Result<BookFragment, SourceError> {
        let timer = metrics::SOURCE_LOOKUP_DURATION
            .with_label_values(&[source.name()])
            .start_timer();

        let result = match tokio::time::timeout(self.source_timeout, source.fetch(isbn)).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout(self.source_timeout)),
        };

        timer.observe_duration();
        result
    }
}
