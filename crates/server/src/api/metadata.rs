use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use shelfline_core::metadata::{MovieDetails, SearchPage};

use super::{api_error, ApiError};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: String,
    #[serde(default = "default_page")]
    pub page: u32,
}

fn default_page() -> u32 {
    1
}

/// Free-text movie search against the metadata index. Fails soft: an
/// unreachable index is an empty page, not an error.
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<SearchPage> {
    Json(state.metadata.search(&query.q, query.page).await)
}

pub async fn movie_details(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
) -> Result<Json<MovieDetails>, ApiError> {
    state
        .metadata
        .details(movie_id)
        .await
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("movie {movie_id} not found")))
}
