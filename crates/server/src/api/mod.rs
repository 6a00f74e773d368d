//! JSON API. Errors are `{ "error": ... }` with a status code that matches
//! the failure class.

pub mod bulk;
pub mod handlers;
pub mod metadata;
pub mod records;
pub mod refresh;
pub mod routes;

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use shelfline_core::bulk::BulkError;
use shelfline_core::record::RecordError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

pub fn record_error(e: RecordError) -> ApiError {
    let status = match &e {
        RecordError::NotFound(_) => StatusCode::NOT_FOUND,
        RecordError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        RecordError::External(_) => StatusCode::BAD_GATEWAY,
        RecordError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    api_error(status, e.to_string())
}

pub fn bulk_error(e: BulkError) -> ApiError {
    match e {
        BulkError::NoBatch => api_error(StatusCode::CONFLICT, e.to_string()),
        BulkError::IndexOutOfRange(_) => api_error(StatusCode::NOT_FOUND, e.to_string()),
        BulkError::Unresolvable(_) => api_error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
        BulkError::Record(inner) => record_error(inner),
    }
}
