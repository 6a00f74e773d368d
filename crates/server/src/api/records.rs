use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use shelfline_core::locations::{validate_slot, LocationAllocator};
use shelfline_core::metadata::PosterImage;
use shelfline_core::record::{
    CatalogRecord, Disposition, NewRecord, RecordFilter, RecordPatch,
};
use shelfline_core::torrents::{Quality, TorrentDescriptor};

use super::{api_error, record_error, ApiError};
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<RecordFilter>,
) -> Result<Json<Vec<CatalogRecord>>, ApiError> {
    state.store.list(&filter).map(Json).map_err(record_error)
}

pub async fn create(
    State(state): State<AppState>,
    Json(record): Json<NewRecord>,
) -> Result<(StatusCode, Json<CatalogRecord>), ApiError> {
    if record.disposition == Disposition::InTransit {
        if let Some(slot) = record.slot.as_deref() {
            check_slot(&state, slot, None)?;
        }
    }
    let created = state.store.create(record).map_err(record_error)?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CatalogRecord>, ApiError> {
    state.store.get(id).map(Json).map_err(record_error)
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<RecordPatch>,
) -> Result<Json<CatalogRecord>, ApiError> {
    // a slot only needs vetting when the record will be in transit
    if let Some(slot) = patch.slot.as_deref() {
        let disposition = match patch.disposition {
            Some(d) => d,
            None => state.store.get(id).map_err(record_error)?.disposition,
        };
        if disposition == Disposition::InTransit {
            check_slot(&state, slot, Some(id))?;
        }
    }
    state.store.update(id, &patch).map(Json).map_err(record_error)
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.store.delete(id).map_err(record_error)?;
    Ok(StatusCode::NO_CONTENT)
}

fn check_slot(state: &AppState, slot: &str, exclude: Option<i64>) -> Result<(), ApiError> {
    validate_slot(slot).map_err(record_error)?;
    let taken = LocationAllocator::new(state.store.as_ref())
        .is_taken(slot, exclude)
        .map_err(record_error)?;
    if taken {
        return Err(api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("slot {slot} is already taken"),
        ));
    }
    Ok(())
}

/// Next free box slot, for manual entry forms.
pub async fn next_location(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let next = LocationAllocator::new(state.store.as_ref())
        .next_location()
        .map_err(record_error)?;
    Ok(Json(json!({ "next": next.to_string() })))
}

/// Sparse metadata refresh for one record.
pub async fn refresh(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CatalogRecord>, ApiError> {
    state.refresher.refresh_record(id).await.map_err(record_error)?;
    state.store.get(id).map(Json).map_err(record_error)
}

#[derive(Deserialize)]
pub struct RematchRequest {
    pub tmdb_id: i64,
}

/// Re-point a record at a different movie (full metadata overwrite).
pub async fn rematch(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<RematchRequest>,
) -> Result<Json<CatalogRecord>, ApiError> {
    state
        .refresher
        .rematch_record(id, request.tmdb_id)
        .await
        .map_err(record_error)?;
    state.store.get(id).map(Json).map_err(record_error)
}

pub async fn fetch_imdb(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let imdb_id = state.refresher.fetch_imdb(id).await.map_err(record_error)?;
    Ok(Json(json!({ "imdb_id": imdb_id })))
}

#[derive(Deserialize)]
pub struct TorrentQuery {
    pub quality: Option<Quality>,
}

/// Live torrent availability for one record, optionally quality-filtered.
pub async fn torrents(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<TorrentQuery>,
) -> Result<Json<Vec<TorrentDescriptor>>, ApiError> {
    let record = state.store.get(id).map_err(record_error)?;
    let Some(imdb_id) = record.imdb_id.filter(|v| !v.is_empty()) else {
        return Ok(Json(Vec::new()));
    };
    let torrents = match query.quality {
        Some(quality) => {
            state
                .torrents
                .torrents_by_quality(&imdb_id, &[quality])
                .await
        }
        None => state.torrents.torrents(&imdb_id).await,
    };
    Ok(Json(torrents))
}

/// Re-pull torrent availability from the live index and store it.
pub async fn refresh_torrents(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CatalogRecord>, ApiError> {
    state
        .refresher
        .refresh_torrents(id)
        .await
        .map_err(record_error)?;
    state.store.get(id).map(Json).map_err(record_error)
}

/// Candidate posters for a record, best first.
pub async fn posters(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<PosterImage>>, ApiError> {
    let record = state.store.get(id).map_err(record_error)?;
    let Some(tmdb_id) = record.tmdb_id else {
        return Ok(Json(Vec::new()));
    };
    Ok(Json(state.metadata.poster_images(tmdb_id).await))
}

#[derive(Deserialize)]
pub struct ChangePosterRequest {
    pub poster_path: String,
}

#[derive(Serialize)]
pub struct ChangePosterResponse {
    pub poster_ref: String,
}

pub async fn change_poster(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<ChangePosterRequest>,
) -> Result<Json<ChangePosterResponse>, ApiError> {
    let poster_ref = state
        .refresher
        .change_poster(id, &request.poster_path)
        .await
        .map_err(record_error)?;
    Ok(Json(ChangePosterResponse { poster_ref }))
}
