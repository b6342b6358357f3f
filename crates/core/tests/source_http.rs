//! Source adapters against a local stub server.
//!
//! Each test starts an axum router on an ephemeral port and points one
//! adapter at it through its `base_url` override, so the full fetch path
//! runs: request building, status mapping, body decoding and parsing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use bookshelf_core::config::{GoogleBooksConfig, OpenLibraryConfig, ScraperSourceConfig};
use bookshelf_core::source::{
    BoekenplatformSource, GoogleBooksSource, HttpSettings, OpenLibrarySource, StandaardSource,
};
use bookshelf_core::{BookSource, SourceError};

const ISBN: &str = "9780552131063";

/// Serve `router` on 127.0.0.1 and return its base URL.
async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub server");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    format!("http://{}", addr)
}

fn settings() -> HttpSettings {
    HttpSettings {
        user_agent: "bookshelf-test/1.0".to_string(),
        accept_language: "nl-BE,nl;q=0.9".to_string(),
        timeout: Duration::from_secs(5),
    }
}

fn google_books(base_url: String, api_key: Option<&str>) -> GoogleBooksSource {
    let config = GoogleBooksConfig {
        api_key: api_key.map(str::to_string),
        base_url: Some(base_url),
    };
    GoogleBooksSource::new(&settings(), &config).unwrap()
}

fn open_library(base_url: String) -> OpenLibrarySource {
    let config = OpenLibraryConfig {
        base_url: Some(base_url),
        resolve_authors: true,
    };
    OpenLibrarySource::new(&settings(), &config).unwrap()
}

fn scraper_config(base_url: String) -> ScraperSourceConfig {
    ScraperSourceConfig {
        base_url: Some(base_url),
    }
}

// =============================================================================
// Google Books
// =============================================================================

#[tokio::test]
async fn test_google_books_maps_first_volume() {
    let router = Router::new().route(
        "/volumes",
        get(|Query(params): Query<HashMap<String, String>>| async move {
            if params.get("q").map(String::as_str) != Some("isbn:9780552131063")
                || params.get("key").map(String::as_str) != Some("test-key")
            {
                return StatusCode::BAD_REQUEST.into_response();
            }
            Json(json!({
                "totalItems": 1,
                "items": [{
                    "volumeInfo": {
                        "title": "Mort",
                        "authors": ["Terry Pratchett"],
                        "categories": ["Fiction"],
                        "industryIdentifiers": [
                            { "type": "ISBN_10", "identifier": "0552131067" },
                            { "type": "ISBN_13", "identifier": "9780552131063" }
                        ],
                        "imageLinks": { "thumbnail": "http://books.google.com/t.jpg" }
                    }
                }]
            }))
            .into_response()
        }),
    );
    let source = google_books(serve(router).await, Some("test-key"));

    let fragment = source.fetch(ISBN).await.unwrap();

    assert_eq!(fragment.source, "Google Books");
    assert_eq!(fragment.title.as_deref(), Some("Mort"));
    assert_eq!(fragment.authors, vec!["Terry Pratchett"]);
    assert_eq!(fragment.isbn13.as_deref(), Some(ISBN));
    assert_eq!(
        fragment.cover_url.as_deref(),
        Some("https://books.google.com/t.jpg")
    );
}

#[tokio::test]
async fn test_google_books_zero_items_is_not_found() {
    let router = Router::new().route(
        "/volumes",
        get(|| async { Json(json!({ "kind": "books#volumes", "totalItems": 0 })) }),
    );
    let source = google_books(serve(router).await, None);

    let result = source.fetch(ISBN).await;
    assert!(matches!(result, Err(SourceError::NotFound(ref isbn)) if isbn == ISBN));
}

#[tokio::test]
async fn test_google_books_error_status_is_api_error() {
    let router = Router::new().route(
        "/volumes",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "x".repeat(500)) }),
    );
    let source = google_books(serve(router).await, None);

    match source.fetch(ISBN).await {
        Err(SourceError::ApiError { status, message }) => {
            assert_eq!(status, 503);
            assert_eq!(message.len(), 200);
        }
        other => panic!("expected ApiError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_google_books_undecodable_body_is_parse_error() {
    let router = Router::new().route("/volumes", get(|| async { "<html>not json</html>" }));
    let source = google_books(serve(router).await, None);

    let result = source.fetch(ISBN).await;
    assert!(matches!(result, Err(SourceError::ParseError(_))));
    assert_eq!(result.unwrap_err().kind(), "upstream");
}

// =============================================================================
// Open Library
// =============================================================================

async fn edition(Path(file): Path<String>) -> Response {
    if file != format!("{}.json", ISBN) {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(json!({
        "title": "Mort",
        "publishers": ["Corgi"],
        "isbn_13": [ISBN],
        "languages": [{ "key": "/languages/eng" }],
        "subjects": ["Discworld (Imaginary place)"],
        "authors": [
            { "key": "/authors/OL1A" },
            { "key": "/authors/OL2A" },
            { "key": "/authors/OL3A" }
        ]
    }))
    .into_response()
}

async fn author(Path(file): Path<String>) -> Response {
    match file.as_str() {
        "OL1A.json" => Json(json!({ "name": "Terry Pratchett" })).into_response(),
        "OL3A.json" => Json(json!({ "name": "Paul Kidby" })).into_response(),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "author lookup failed").into_response(),
    }
}

fn open_library_router() -> Router {
    Router::new()
        .route("/isbn/{file}", get(edition))
        .route("/authors/{file}", get(author))
}

#[tokio::test]
async fn test_open_library_skips_failed_author() {
    let source = open_library(serve(open_library_router()).await);

    let fragment = source.fetch(ISBN).await.unwrap();

    assert_eq!(fragment.source, "openlibrary.org");
    assert_eq!(fragment.title.as_deref(), Some("Mort"));
    assert_eq!(fragment.publisher.as_deref(), Some("Corgi"));
    assert_eq!(fragment.language.as_deref(), Some("eng"));
    // Reference order is kept; the failing one is dropped, not replaced.
    assert_eq!(fragment.authors, vec!["Terry Pratchett", "Paul Kidby"]);
}

#[tokio::test]
async fn test_open_library_missing_edition_is_not_found() {
    let source = open_library(serve(open_library_router()).await);

    let result = source.fetch("9789002123456").await;
    assert!(matches!(result, Err(SourceError::NotFound(_))));
}

// =============================================================================
// HTML sources
// =============================================================================

#[tokio::test]
async fn test_scraper_sends_browser_headers_and_maps_404() {
    let seen: Arc<Mutex<Option<HeaderMap>>> = Arc::new(Mutex::new(None));
    let recorder = Arc::clone(&seen);
    let router = Router::new().route(
        "/p/{isbn}",
        get(move |headers: HeaderMap| {
            let recorder = Arc::clone(&recorder);
            async move {
                *recorder.lock().unwrap() = Some(headers);
                StatusCode::NOT_FOUND
            }
        }),
    );
    let source = StandaardSource::new(&settings(), &scraper_config(serve(router).await)).unwrap();

    let result = source.fetch(ISBN).await;
    assert!(matches!(result, Err(SourceError::NotFound(_))));

    let headers = seen.lock().unwrap().clone().expect("no request reached the stub");
    assert_eq!(headers["user-agent"], "bookshelf-test/1.0");
    assert_eq!(headers["accept-language"], "nl-BE,nl;q=0.9");
}

#[tokio::test]
async fn test_scraper_parses_served_page() {
    let router = Router::new().route(
        "/isbn/{isbn}",
        get(|| async {
            Html(
                r#"<div class="view-header"><h4>De Avonden</h4><table>
                   <tr><td><strong>Auteur(s)</strong></td><td>Gerard Reve</td></tr>
                   </table></div>
                   <div class="productafbeeldingen"><img src="/covers/avonden.jpg"></div>"#,
            )
        }),
    );
    let base_url = serve(router).await;
    let source = BoekenplatformSource::new(&settings(), &scraper_config(base_url.clone())).unwrap();

    let fragment = source.fetch("9789023411345").await.unwrap();

    assert_eq!(fragment.title.as_deref(), Some("De Avonden"));
    assert_eq!(fragment.authors, vec!["Gerard Reve"]);
    assert_eq!(
        fragment.cover_url,
        Some(format!("{}/covers/avonden.jpg", base_url))
    );
}

#[tokio::test]
async fn test_scraper_server_error_is_api_error() {
    let router = Router::new().route(
        "/isbn/{isbn}",
        get(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
    );
    let source =
        BoekenplatformSource::new(&settings(), &scraper_config(serve(router).await)).unwrap();

    match source.fetch(ISBN).await {
        Err(SourceError::ApiError { status, message }) => {
            assert_eq!(status, 502);
            assert_eq!(message, "upstream down");
        }
        other => panic!("expected ApiError, got {:?}", other),
    }
}
