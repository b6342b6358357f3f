//! Book lookup and library API handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

use bookshelf_core::{LibraryError, LocalBook, NewBook, ResolveError, ResolvedBook};

use crate::state::AppState;

/// Error response
#[derive(Debug, Serialize)]
pub struct BookErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<BookErrorResponse>);

fn api_error(status: StatusCode, error: impl ToString) -> ApiError {
    (
        status,
        Json(BookErrorResponse {
            error: error.to_string(),
        }),
    )
}

fn library_error(e: LibraryError) -> ApiError {
    match e {
        LibraryError::NotFound(_) => api_error(StatusCode::NOT_FOUND, e),
        LibraryError::InvalidBook(_) => api_error(StatusCode::BAD_REQUEST, e),
        LibraryError::Database(_) => {
            error!("Library error: {}", e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, e)
        }
    }
}

/// Resolve an ISBN against the local library and the external sources.
pub async fn lookup_book(
    State(state): State<Arc<AppState>>,
    Path(isbn): Path<String>,
) -> Result<Json<ResolvedBook>, ApiError> {
    match state.resolver().resolve(&isbn).await {
        Ok(book) => Ok(Json(book)),
        Err(e @ ResolveError::InvalidIsbn(_)) => Err(api_error(StatusCode::BAD_REQUEST, e)),
        Err(e @ ResolveError::BookNotFound(_)) => Err(api_error(StatusCode::NOT_FOUND, e)),
        Err(e) => {
            error!("Lookup for {} failed: {}", isbn, e);
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e))
        }
    }
}

/// Save a book to the library, updating the record with the same ISBN.
pub async fn save_book(
    State(state): State<Arc<AppState>>,
    body: Result<Json<NewBook>, JsonRejection>,
) -> Result<(StatusCode, Json<LocalBook>), ApiError> {
    let Json(book) = body.map_err(|e| api_error(StatusCode::BAD_REQUEST, e.body_text()))?;

    let saved = state.library().save(&book).map_err(library_error)?;
    info!("Saved book {} ({})", saved.id, saved.title);
    Ok((StatusCode::CREATED, Json(saved)))
}

/// Get a library book by id
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<LocalBook>, ApiError> {
    state
        .library()
        .get(&id)
        .map(Json)
        .map_err(library_error)
}
