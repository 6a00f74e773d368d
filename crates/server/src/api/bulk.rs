use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use shelfline_core::bulk::{
    BatchDefaults, CommitReport, DuplicateAdvisory, StagedBatch,
};
use shelfline_core::metadata::MovieSummary;

use super::{api_error, bulk_error, ApiError};
use crate::state::AppState;

/// A staged batch plus per-item duplicate advisories, index-aligned with
/// `batch.matches`.
#[derive(Serialize)]
pub struct BatchView {
    #[serde(flatten)]
    pub batch: StagedBatch,
    pub advisories: Vec<Option<DuplicateAdvisory>>,
}

fn batch_view(state: &AppState, batch: StagedBatch) -> Result<BatchView, ApiError> {
    let advisories = state.workflow.advisories(&batch).map_err(bulk_error)?;
    Ok(BatchView { batch, advisories })
}

#[derive(Deserialize)]
pub struct IntakeRequest {
    pub titles: String,
    #[serde(default)]
    pub defaults: BatchDefaults,
}

/// Stage a new batch from pasted titles, replacing any existing one.
pub async fn intake(
    State(state): State<AppState>,
    Json(request): Json<IntakeRequest>,
) -> Result<Json<BatchView>, ApiError> {
    let batch = state
        .workflow
        .intake(&request.titles, request.defaults)
        .await;
    batch_view(&state, batch).map(Json)
}

/// The staged batch for review, or 404 when none is active.
pub async fn current(State(state): State<AppState>) -> Result<Json<BatchView>, ApiError> {
    let batch = state
        .workflow
        .current_batch()
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "no staged batch"))?;
    batch_view(&state, batch).map(Json)
}

pub async fn abandon(State(state): State<AppState>) -> StatusCode {
    state.workflow.abandon();
    StatusCode::NO_CONTENT
}

#[derive(Deserialize)]
pub struct ResearchQuery {
    pub q: String,
}

/// Candidate list for correcting an item; does not touch the staged batch.
pub async fn research(
    State(state): State<AppState>,
    Query(query): Query<ResearchQuery>,
) -> Result<Json<Vec<MovieSummary>>, ApiError> {
    state
        .workflow
        .research(&query.q)
        .await
        .map(Json)
        .map_err(bulk_error)
}

#[derive(Deserialize)]
pub struct AcceptRequest {
    pub tmdb_id: i64,
}

pub async fn accept(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    Json(request): Json<AcceptRequest>,
) -> Result<Json<BatchView>, ApiError> {
    let batch = state
        .workflow
        .accept_candidate(index, request.tmdb_id)
        .await
        .map_err(bulk_error)?;
    batch_view(&state, batch).map(Json)
}

pub async fn remove(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<BatchView>, ApiError> {
    let batch = state.workflow.remove_item(index).map_err(bulk_error)?;
    batch_view(&state, batch).map(Json)
}

pub async fn restore(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<BatchView>, ApiError> {
    let batch = state.workflow.restore_item(index).map_err(bulk_error)?;
    batch_view(&state, batch).map(Json)
}

/// One-shot commit of the staged batch.
pub async fn commit(State(state): State<AppState>) -> Result<Json<CommitReport>, ApiError> {
    state.workflow.commit().await.map(Json).map_err(bulk_error)
}
