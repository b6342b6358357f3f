//! SQLite-backed series store.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};

use super::{series_key, Series, SeriesError, SeriesStore};

/// Series table, also created by the library so its joins work on a fresh file.
/// `name_key` is computed in Rust; SQLite's lower() only folds ASCII.
pub(crate) const SERIES_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS series (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        name_key TEXT NOT NULL UNIQUE,
        created_at TEXT NOT NULL
    );
"#;

/// SQLite-backed series store.
pub struct SqliteSeriesStore {
    conn: Mutex<Connection>,
}

impl SqliteSeriesStore {
    /// Open (or create) the database file and its `series` table.
    pub fn new(path: &Path) -> Result<Self, SeriesError> {
        let conn = Connection::open(path).map_err(|e| SeriesError::Database(e.to_string()))?;
        // The library holds its own connection to the same file.
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(|e| SeriesError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, SeriesError> {
        let conn =
            Connection::open_in_memory().map_err(|e| SeriesError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), SeriesError> {
        conn.execute_batch(SERIES_SCHEMA)
            .map_err(|e| SeriesError::Database(e.to_string()))?;

        Ok(())
    }

    fn row_to_series(row: &rusqlite::Row) -> rusqlite::Result<Series> {
        let created_at: String = row.get(2)?;
        Ok(Series {
            id: row.get(0)?,
            name: row.get(1)?,
            created_at: DateTime::parse_from_rfc3339(&created_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }
}

impl SeriesStore for SqliteSeriesStore {
    fn find_by_name(&self, name: &str) -> Result<Option<Series>, SeriesError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, name, created_at FROM series WHERE name_key = ?",
            params![series_key(name)],
            Self::row_to_series,
        )
        .optional()
        .map_err(|e| SeriesError::Database(e.to_string()))
    }

    fn insert(&self, name: &str) -> Result<Series, SeriesError> {
        let conn = self.conn.lock().unwrap();
        let series = Series {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            created_at: Utc::now(),
        };

        conn.execute(
            "INSERT INTO series (id, name, name_key, created_at) VALUES (?, ?, ?, ?)",
            params![
                &series.id,
                &series.name,
                series_key(&series.name),
                series.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation => {
                SeriesError::Conflict(series.name.clone())
            }
            _ => SeriesError::Database(e.to_string()),
        })?;

        Ok(series)
    }

    fn get(&self, id: &str) -> Result<Series, SeriesError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, name, created_at FROM series WHERE id = ?",
            params![id],
            Self::row_to_series,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => SeriesError::NotFound(id.to_string()),
            _ => SeriesError::Database(e.to_string()),
        })
    }

    fn list(&self) -> Result<Vec<Series>, SeriesError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT id, name, created_at FROM series ORDER BY name_key")
            .map_err(|e| SeriesError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], Self::row_to_series)
            .map_err(|e| SeriesError::Database(e.to_string()))?;

        let mut series = Vec::new();
        for row in rows {
            series.push(row.map_err(|e| SeriesError::Database(e.to_string()))?);
        }
        Ok(series)
    }
}
