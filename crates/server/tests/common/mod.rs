//! Common test utilities for in-process API testing with mocks.
//!
//! The fixture builds the real router over a temp-dir SQLite library and
//! series store, with mock book sources standing in for the external sites.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use bookshelf_core::{
    testing::MockBookSource, BookLibrary, BookResolver, BookSource, Config, DatabaseConfig,
    SeriesResolver, SeriesStore, SqliteLibrary, SqliteSeriesStore,
};
use bookshelf_server::state::AppState;

/// Re-export fixtures for test convenience
pub use bookshelf_core::testing::fixtures;

/// Test fixture for API tests.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_lookup() {
///     let fixture = TestFixture::new().await;
///     fixture.primary.set_fragment(fixtures::fragment("primary", "Mort")).await;
///
///     let response = fixture.get("/api/v1/books/lookup/9780552131063").await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    pub router: Router,
    /// First source in priority order
    pub primary: Arc<MockBookSource>,
    /// Fallback source
    pub fallback: Arc<MockBookSource>,
    pub library: Arc<SqliteLibrary>,
    pub series_store: Arc<SqliteSeriesStore>,
    /// Keeps the database alive for the fixture's lifetime
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let primary = Arc::new(MockBookSource::new("primary"));
        let fallback = Arc::new(MockBookSource::new("fallback"));

        let config = Config {
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            ..Default::default()
        };

        let library = Arc::new(SqliteLibrary::new(&db_path).expect("Failed to create library"));
        let series_store =
            Arc::new(SqliteSeriesStore::new(&db_path).expect("Failed to create series store"));
        let series = Arc::new(SeriesResolver::new(
            Arc::clone(&series_store) as Arc<dyn SeriesStore>
        ));

        let sources: Vec<Arc<dyn BookSource>> = vec![
            Arc::clone(&primary) as Arc<dyn BookSource>,
            Arc::clone(&fallback) as Arc<dyn BookSource>,
        ];
        let resolver = Arc::new(BookResolver::new(
            sources,
            library.clone(),
            series.clone(),
            Duration::from_secs(2),
        ));

        let state = Arc::new(AppState::new(
            config,
            resolver,
            Arc::clone(&library) as Arc<dyn BookLibrary>,
            series,
        ));
        let router = bookshelf_server::api::create_router(state);

        Self {
            router,
            primary,
            fallback,
            library,
            series_store,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a GET request and return the raw body text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder().uri(path).body(Body::empty()).unwrap();
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}
