use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use shelfline_core::refresh::RefreshProgress;

use super::{api_error, record_error, ApiError};
use crate::state::AppState;

/// Start a full-catalog metadata refresh; returns a task id for polling.
pub async fn start(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let task_id = state.refresher.start_full_refresh();
    (StatusCode::ACCEPTED, Json(json!({ "task_id": task_id })))
}

pub async fn progress(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<RefreshProgress>, ApiError> {
    state
        .refresher
        .progress(&task_id)
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("unknown task {task_id}")))
}

pub async fn cancel(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.refresher.cancel(&task_id) {
        Ok(StatusCode::ACCEPTED)
    } else {
        Err(api_error(
            StatusCode::NOT_FOUND,
            format!("no running task {task_id}"),
        ))
    }
}

/// Lowercase every stored certification that predates write-time
/// normalization.
pub async fn normalize_certifications(
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let fixed = state
        .refresher
        .normalize_certifications()
        .map_err(record_error)?;
    Ok(Json(json!({ "fixed": fixed })))
}

/// Recompute `has_torrents` flags from the stored availability lists.
pub async fn rebuild_torrent_flags(
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let fixed = state
        .refresher
        .rebuild_torrent_flags()
        .map_err(record_error)?;
    Ok(Json(json!({ "fixed": fixed })))
}
