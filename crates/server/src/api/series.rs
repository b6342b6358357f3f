//! Series API handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use bookshelf_core::{Series, SeriesError, SeriesRef};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateSeriesBody {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct ListSeriesResponse {
    pub series: Vec<Series>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct SeriesErrorResponse {
    pub error: String,
}

fn series_error(e: SeriesError) -> (StatusCode, Json<SeriesErrorResponse>) {
    let status = match e {
        SeriesError::InvalidName => StatusCode::BAD_REQUEST,
        SeriesError::NotFound(_) => StatusCode::NOT_FOUND,
        SeriesError::Conflict(_) => StatusCode::CONFLICT,
        SeriesError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(SeriesErrorResponse {
            error: e.to_string(),
        }),
    )
}

pub async fn list_series(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ListSeriesResponse>, (StatusCode, Json<SeriesErrorResponse>)> {
    let series = state.series().store().list().map_err(series_error)?;
    Ok(Json(ListSeriesResponse { series }))
}

/// Find the series with this name, creating it on first use.
pub async fn create_series(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateSeriesBody>,
) -> Result<(StatusCode, Json<SeriesRef>), (StatusCode, Json<SeriesErrorResponse>)> {
    let series = state
        .series()
        .find_or_create_by_name(&body.name)
        .map_err(series_error)?;
    Ok((StatusCode::CREATED, Json(series)))
}
