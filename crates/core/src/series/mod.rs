//! Book series and their find-or-create resolution.
//!
//! Series names coming from sources vary in case and surrounding whitespace.
//! Two names identify the same series when their trimmed, lower-cased forms
//! are equal; the store enforces that with a unique key so concurrent
//! resolutions cannot create duplicates.

mod sqlite;

pub use sqlite::SqliteSeriesStore;
pub(crate) use sqlite::SERIES_SCHEMA;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::book::SeriesRef;
use crate::metrics;

/// A persisted series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Series {
    pub id: String,
    /// Display name as first created.
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<Series> for SeriesRef {
    fn from(series: Series) -> Self {
        SeriesRef {
            id: series.id,
            name: series.name,
        }
    }
}

/// Errors for series operations.
#[derive(Debug, Error)]
pub enum SeriesError {
    /// A series with the same normalized name already exists.
    #[error("Series already exists: {0}")]
    Conflict(String),

    #[error("Series name must not be empty")]
    InvalidName,

    #[error("Series not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// Normalized uniqueness key for a series name.
pub fn series_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Trait for series storage.
pub trait SeriesStore: Send + Sync {
    /// Find a series whose normalized name matches `name`.
    fn find_by_name(&self, name: &str) -> Result<Option<Series>, SeriesError>;

    /// Insert a new series. Returns `Conflict` if the normalized name is taken.
    fn insert(&self, name: &str) -> Result<Series, SeriesError>;

    fn get(&self, id: &str) -> Result<Series, SeriesError>;

    /// All series ordered by name.
    fn list(&self) -> Result<Vec<Series>, SeriesError>;
}

/// Maps free-text series names to canonical series identities.
pub struct SeriesResolver {
    store: Arc<dyn SeriesStore>,
}

impl SeriesResolver {
    pub fn new(store: Arc<dyn SeriesStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn SeriesStore> {
        &self.store
    }

    /// Return the series matching `name`, creating it on first sight.
    ///
    /// Idempotent: repeated calls with names that differ only in case or
    /// surrounding whitespace return the same identity. A concurrent insert
    /// of the same name surfaces as `Conflict` and is resolved by reading
    /// back the winner.
    pub fn find_or_create_by_name(&self, name: &str) -> Result<SeriesRef, SeriesError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SeriesError::InvalidName);
        }

        if let Some(existing) = self.store.find_by_name(name)? {
            debug!("Found existing series '{}' ({})", existing.name, existing.id);
            return Ok(existing.into());
        }

        match self.store.insert(name) {
            Ok(created) => {
                metrics::SERIES_CREATED.inc();
                info!("Created series '{}' ({})", created.name, created.id);
                Ok(created.into())
            }
            Err(SeriesError::Conflict(_)) => {
                debug!("Series '{}' was created concurrently, re-reading", name);
                self.store
                    .find_by_name(name)?
                    .map(SeriesRef::from)
                    .ok_or_else(|| SeriesError::NotFound(name.to_string()))
            }
            Err(e) => Err(e),
        }
    }
}
