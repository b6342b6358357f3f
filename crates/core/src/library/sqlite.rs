//! SQLite-backed library.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use tracing::{debug, info};

use super::{
    Author, AuthorLink, BookLibrary, Category, CategoryLink, LibraryError, LocalBook,
    LocalBookLookup, NewBook,
};
use crate::book::{normalize_isbn, SeriesRef};
use crate::classifier::ContentType;
use crate::series::SERIES_SCHEMA;

fn db_err(e: rusqlite::Error) -> LibraryError {
    LibraryError::Database(e.to_string())
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// SQLite-backed library. Shares its database file with the series store.
pub struct SqliteLibrary {
    conn: Mutex<Connection>,
}

impl SqliteLibrary {
    pub fn new(path: &Path) -> Result<Self, LibraryError> {
        let conn = Connection::open(path).map_err(db_err)?;
        conn.busy_timeout(Duration::from_secs(5)).map_err(db_err)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory library (useful for testing).
    pub fn in_memory() -> Result<Self, LibraryError> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), LibraryError> {
        conn.execute_batch(SERIES_SCHEMA).map_err(db_err)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS books (
                id TEXT PRIMARY KEY,
                isbn TEXT,
                isbn13 TEXT,
                title TEXT NOT NULL,
                subtitle TEXT,
                description TEXT,
                publisher TEXT,
                published_date TEXT,
                page_count INTEGER,
                language TEXT,
                cover_url TEXT,
                thumbnail_url TEXT,
                series_id TEXT REFERENCES series(id),
                series_number TEXT,
                book_type TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_books_isbn ON books(isbn);
            CREATE INDEX IF NOT EXISTS idx_books_isbn13 ON books(isbn13);

            CREATE TABLE IF NOT EXISTS authors (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE
            );

            -- Credit order is kept in position
            CREATE TABLE IF NOT EXISTS book_authors (
                book_id TEXT NOT NULL REFERENCES books(id) ON DELETE CASCADE,
                author_id TEXT NOT NULL REFERENCES authors(id),
                position INTEGER NOT NULL,
                PRIMARY KEY (book_id, author_id)
            );

            CREATE TABLE IF NOT EXISTS categories (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS book_categories (
                book_id TEXT NOT NULL REFERENCES books(id) ON DELETE CASCADE,
                category_id TEXT NOT NULL REFERENCES categories(id),
                PRIMARY KEY (book_id, category_id)
            );
            "#,
        )
        .map_err(db_err)?;

        Ok(())
    }

    fn load_book(conn: &Connection, id: &str) -> Result<LocalBook, LibraryError> {
        let mut book = conn
            .query_row(
                "SELECT b.id, b.isbn, b.isbn13, b.title, b.subtitle, b.description, b.publisher,
                        b.published_date, b.page_count, b.language, b.cover_url, b.thumbnail_url,
                        b.series_number, b.book_type, b.created_at, b.updated_at, s.id, s.name
                 FROM books b LEFT JOIN series s ON s.id = b.series_id
                 WHERE b.id = ?",
                params![id],
                Self::row_to_book,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => LibraryError::NotFound(id.to_string()),
                _ => db_err(e),
            })?;

        book.authors = Self::load_authors(conn, id)?;
        book.categories = Self::load_categories(conn, id)?;
        Ok(book)
    }

    fn row_to_book(row: &rusqlite::Row) -> rusqlite::Result<LocalBook> {
        let book_type: Option<String> = row.get(13)?;
        let created_at: String = row.get(14)?;
        let updated_at: String = row.get(15)?;
        let series_id: Option<String> = row.get(16)?;
        let series_name: Option<String> = row.get(17)?;

        Ok(LocalBook {
            id: row.get(0)?,
            isbn: row.get(1)?,
            isbn13: row.get(2)?,
            title: row.get(3)?,
            subtitle: row.get(4)?,
            description: row.get(5)?,
            publisher: row.get(6)?,
            published_date: row.get(7)?,
            page_count: row.get(8)?,
            language: row.get(9)?,
            cover_url: row.get(10)?,
            thumbnail_url: row.get(11)?,
            authors: Vec::new(),
            categories: Vec::new(),
            series: series_id
                .zip(series_name)
                .map(|(id, name)| SeriesRef { id, name }),
            series_number: row.get(12)?,
            book_type: book_type.as_deref().and_then(ContentType::parse),
            created_at: parse_timestamp(&created_at),
            updated_at: parse_timestamp(&updated_at),
        })
    }

    fn load_authors(conn: &Connection, book_id: &str) -> Result<Vec<AuthorLink>, LibraryError> {
        let mut stmt = conn
            .prepare(
                "SELECT ba.position, a.id, a.name
                 FROM book_authors ba JOIN authors a ON a.id = ba.author_id
                 WHERE ba.book_id = ? ORDER BY ba.position",
            )
            .map_err(db_err)?;

        let rows = stmt
            .query_map(params![book_id], |row| {
                Ok(AuthorLink {
                    position: row.get(0)?,
                    author: Author {
                        id: row.get(1)?,
                        name: row.get(2)?,
                    },
                })
            })
            .map_err(db_err)?;

        let mut authors = Vec::new();
        for row in rows {
            authors.push(row.map_err(db_err)?);
        }
        Ok(authors)
    }

    fn load_categories(
        conn: &Connection,
        book_id: &str,
    ) -> Result<Vec<CategoryLink>, LibraryError> {
        let mut stmt = conn
            .prepare(
                "SELECT c.id, c.name
                 FROM book_categories bc JOIN categories c ON c.id = bc.category_id
                 WHERE bc.book_id = ? ORDER BY bc.rowid",
            )
            .map_err(db_err)?;

        let rows = stmt
            .query_map(params![book_id], |row| {
                Ok(CategoryLink {
                    category: Category {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    },
                })
            })
            .map_err(db_err)?;

        let mut categories = Vec::new();
        for row in rows {
            categories.push(row.map_err(db_err)?);
        }
        Ok(categories)
    }

    fn find_id_by_isbn(conn: &Connection, isbn: &str) -> Result<Option<String>, LibraryError> {
        conn.query_row(
            "SELECT id FROM books WHERE isbn = ?1 OR isbn13 = ?1 ORDER BY created_at LIMIT 1",
            params![isbn],
            |row| row.get(0),
        )
        .optional()
        .map_err(db_err)
    }

    /// Id of the row with `name` in a unique-name table, inserting it if needed.
    fn named_row_id(tx: &Transaction, table: &str, name: &str) -> Result<String, LibraryError> {
        tx.execute(
            &format!("INSERT OR IGNORE INTO {} (id, name) VALUES (?, ?)", table),
            params![uuid::Uuid::new_v4().to_string(), name],
        )
        .map_err(db_err)?;

        tx.query_row(
            &format!("SELECT id FROM {} WHERE name = ?", table),
            params![name],
            |row| row.get(0),
        )
        .map_err(db_err)
    }
}

impl LocalBookLookup for SqliteLibrary {
    fn find_by_isbn(&self, isbn: &str) -> Result<Option<LocalBook>, LibraryError> {
        let Some(isbn) = normalize_isbn(isbn) else {
            return Ok(None);
        };
        let conn = self.conn.lock().unwrap();
        match Self::find_id_by_isbn(&conn, &isbn)? {
            Some(id) => Ok(Some(Self::load_book(&conn, &id)?)),
            None => Ok(None),
        }
    }
}

impl BookLibrary for SqliteLibrary {
    fn get(&self, id: &str) -> Result<LocalBook, LibraryError> {
        let conn = self.conn.lock().unwrap();
        Self::load_book(&conn, id)
    }

    fn save(&self, book: &NewBook) -> Result<LocalBook, LibraryError> {
        if book.title.trim().is_empty() {
            return Err(LibraryError::InvalidBook("title is required".to_string()));
        }

        // Stored in the same form the resolver looks up.
        let isbn = book.isbn.as_deref().and_then(normalize_isbn);
        let isbn13 = book.isbn13.as_deref().and_then(normalize_isbn);

        let mut conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        let existing = match &isbn {
            Some(isbn) => Self::find_id_by_isbn(&conn, isbn)?,
            None => None,
        };
        let existing = match (existing, &isbn13) {
            (None, Some(isbn13)) => Self::find_id_by_isbn(&conn, isbn13)?,
            (found, _) => found,
        };

        let tx = conn.transaction().map_err(db_err)?;
        let book_type = book.book_type.map(|t| t.as_str());

        let id = match existing {
            Some(id) => {
                tx.execute(
                    "UPDATE books SET isbn = ?, isbn13 = ?, title = ?, subtitle = ?, description = ?,
                         publisher = ?, published_date = ?, page_count = ?, language = ?,
                         cover_url = ?, thumbnail_url = ?, series_id = ?, series_number = ?,
                         book_type = ?, updated_at = ?
                     WHERE id = ?",
                    params![
                        &isbn,
                        &isbn13,
                        book.title.trim(),
                        &book.subtitle,
                        &book.description,
                        &book.publisher,
                        &book.published_date,
                        book.page_count,
                        &book.language,
                        &book.cover_url,
                        &book.thumbnail_url,
                        &book.series_id,
                        &book.series_number,
                        book_type,
                        &now,
                        &id,
                    ],
                )
                .map_err(db_err)?;
                tx.execute("DELETE FROM book_authors WHERE book_id = ?", params![&id])
                    .map_err(db_err)?;
                tx.execute("DELETE FROM book_categories WHERE book_id = ?", params![&id])
                    .map_err(db_err)?;
                debug!("Updated book {} ({})", id, book.title);
                id
            }
            None => {
                let id = uuid::Uuid::new_v4().to_string();
                tx.execute(
                    "INSERT INTO books (id, isbn, isbn13, title, subtitle, description, publisher,
                         published_date, page_count, language, cover_url, thumbnail_url,
                         series_id, series_number, book_type, created_at, updated_at)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    params![
                        &id,
                        &isbn,
                        &isbn13,
                        book.title.trim(),
                        &book.subtitle,
                        &book.description,
                        &book.publisher,
                        &book.published_date,
                        book.page_count,
                        &book.language,
                        &book.cover_url,
                        &book.thumbnail_url,
                        &book.series_id,
                        &book.series_number,
                        book_type,
                        &now,
                        &now,
                    ],
                )
                .map_err(db_err)?;
                info!("Added book {} ({})", id, book.title);
                id
            }
        };

        let mut position = 0u32;
        for name in &book.authors {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let author_id = Self::named_row_id(&tx, "authors", name)?;
            let inserted = tx
                .execute(
                    "INSERT OR IGNORE INTO book_authors (book_id, author_id, position) VALUES (?, ?, ?)",
                    params![&id, &author_id, position],
                )
                .map_err(db_err)?;
            if inserted > 0 {
                position += 1;
            }
        }

        for name in &book.categories {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let category_id = Self::named_row_id(&tx, "categories", name)?;
            tx.execute(
                "INSERT OR IGNORE INTO book_categories (book_id, category_id) VALUES (?, ?)",
                params![&id, &category_id],
            )
            .map_err(db_err)?;
        }

        tx.commit().map_err(db_err)?;
        Self::load_book(&conn, &id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::{SeriesStore, SqliteSeriesStore};
    use tempfile::TempDir;

    fn new_book(isbn: &str, title: &str) -> NewBook {
        NewBook {
            isbn: Some(isbn.to_string()),
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_save_and_find_by_isbn() {
        let library = SqliteLibrary::in_memory().unwrap();
        let mut book = new_book("0552131067", "Mort");
        book.isbn13 = Some("9780552131063".to_string());
        book.authors = vec!["Terry Pratchett".to_string()];
        book.categories = vec!["Fantasy".to_string(), "Humor".to_string()];
        book.book_type = Some(ContentType::Book);

        let saved = library.save(&book).unwrap();
        assert_eq!(saved.author_names(), vec!["Terry Pratchett"]);
        assert_eq!(saved.category_names(), vec!["Fantasy", "Humor"]);
        assert_eq!(saved.book_type, Some(ContentType::Book));

        let by_isbn10 = library.find_by_isbn("0552131067").unwrap().unwrap();
        let by_isbn13 = library.find_by_isbn("9780552131063").unwrap().unwrap();
        assert_eq!(by_isbn10.id, saved.id);
        assert_eq!(by_isbn13.id, saved.id);
        assert!(library.find_by_isbn("0000000000").unwrap().is_none());
    }

    #[test]
    fn test_save_upserts_by_isbn() {
        let library = SqliteLibrary::in_memory().unwrap();
        let first = library.save(&new_book("123", "Draft title")).unwrap();

        let mut update = new_book("123", "Final title");
        update.authors = vec!["B".to_string(), "A".to_string()];
        let second = library.save(&update).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.title, "Final title");
        assert_eq!(second.author_names(), vec!["B", "A"]);
        assert_eq!(second.authors[0].position, 0);
    }

    #[test]
    fn test_isbns_are_stored_normalized() {
        let library = SqliteLibrary::in_memory().unwrap();
        let mut book = new_book("978-0-552-13106-3", "Mort");
        book.isbn13 = Some(" 978 0552131063 ".to_string());
        let first = library.save(&book).unwrap();

        assert_eq!(first.isbn.as_deref(), Some("9780552131063"));
        assert_eq!(first.isbn13.as_deref(), Some("9780552131063"));

        // Same book in plain form updates the existing row.
        let second = library.save(&new_book("9780552131063", "Mort")).unwrap();
        assert_eq!(first.id, second.id);

        let found = library.find_by_isbn("978-0552-131063").unwrap().unwrap();
        assert_eq!(found.id, first.id);
    }

    #[test]
    fn test_blank_isbn_is_stored_as_none() {
        let library = SqliteLibrary::in_memory().unwrap();
        let saved = library.save(&new_book(" - ", "Untitled")).unwrap();
        assert!(saved.isbn.is_none());
        assert!(library.find_by_isbn(" - ").unwrap().is_none());
    }

    #[test]
    fn test_authors_are_shared_by_name() {
        let library = SqliteLibrary::in_memory().unwrap();
        let mut a = new_book("1", "Mort");
        a.authors = vec!["Terry Pratchett".to_string()];
        let mut b = new_book("2", "Guards! Guards!");
        b.authors = vec!["Terry Pratchett".to_string()];

        let a = library.save(&a).unwrap();
        let b = library.save(&b).unwrap();
        assert_eq!(a.authors[0].author.id, b.authors[0].author.id);
    }

    #[test]
    fn test_duplicate_author_names_are_linked_once() {
        let library = SqliteLibrary::in_memory().unwrap();
        let mut book = new_book("1", "Mort");
        book.authors = vec![
            "Terry Pratchett".to_string(),
            "Terry Pratchett".to_string(),
            "Paul Kidby".to_string(),
        ];
        let saved = library.save(&book).unwrap();
        assert_eq!(saved.author_names(), vec!["Terry Pratchett", "Paul Kidby"]);
        assert_eq!(saved.authors[1].position, 1);
    }

    #[test]
    fn test_blank_title_is_rejected() {
        let library = SqliteLibrary::in_memory().unwrap();
        let result = library.save(&new_book("1", "  "));
        assert!(matches!(result, Err(LibraryError::InvalidBook(_))));
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let library = SqliteLibrary::in_memory().unwrap();
        assert!(matches!(library.get("nope"), Err(LibraryError::NotFound(_))));
    }

    #[test]
    fn test_series_link_shares_database_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bookshelf.db");

        let series_store = SqliteSeriesStore::new(&path).unwrap();
        let library = SqliteLibrary::new(&path).unwrap();
        let series = series_store.insert("Discworld").unwrap();

        let mut book = new_book("1", "Mort");
        book.series_id = Some(series.id.clone());
        book.series_number = Some("4".to_string());
        let saved = library.save(&book).unwrap();

        assert_eq!(
            saved.series,
            Some(SeriesRef {
                id: series.id,
                name: "Discworld".to_string()
            })
        );
        assert_eq!(saved.series_number.as_deref(), Some("4"));
    }
}
