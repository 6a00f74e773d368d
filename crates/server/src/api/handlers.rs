use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use shelfline_core::config::SanitizedConfig;

use crate::state::AppState;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Running configuration with secrets redacted.
pub async fn config(State(state): State<AppState>) -> Json<SanitizedConfig> {
    Json(SanitizedConfig::from(state.config.as_ref()))
}
