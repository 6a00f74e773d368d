//! Catalog record storage.

mod sqlite;
mod types;

pub use sqlite::SqliteRecordStore;
pub use types::*;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::torrents::TorrentDescriptor;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Record not found: {0}")]
    NotFound(i64),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("External lookup failed: {0}")]
    External(String),
}

impl RecordError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        RecordError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Persistent catalog store. Certifications are normalized to lowercase on
/// every write path, so lookups never need case folding.
pub trait RecordStore: Send + Sync {
    fn create(&self, record: NewRecord) -> Result<CatalogRecord, RecordError>;

    fn get(&self, id: i64) -> Result<CatalogRecord, RecordError>;

    /// Applies a sparse patch and bumps `updated_at`.
    fn update(&self, id: i64, patch: &RecordPatch) -> Result<CatalogRecord, RecordError>;

    fn delete(&self, id: i64) -> Result<(), RecordError>;

    /// Lists records matching the filter, newest first.
    fn list(&self, filter: &RecordFilter) -> Result<Vec<CatalogRecord>, RecordError>;

    /// All copies of a movie by external id, ordered by copy number.
    fn find_by_tmdb_id(&self, tmdb_id: i64) -> Result<Vec<CatalogRecord>, RecordError>;

    /// Copies matched by exact case-insensitive title plus exact release
    /// year. A `None` year matches records with no year.
    fn find_by_title_year(
        &self,
        title: &str,
        year: Option<i32>,
    ) -> Result<Vec<CatalogRecord>, RecordError>;

    /// `(id, slot)` for every record currently in transit with a slot.
    fn in_transit_slots(&self) -> Result<Vec<(i64, String)>, RecordError>;

    /// Replaces the denormalized torrent availability for a record and keeps
    /// `has_torrents` consistent with it.
    fn set_torrent_cache(
        &self,
        id: i64,
        torrents: &[TorrentDescriptor],
        refreshed_at: DateTime<Utc>,
    ) -> Result<(), RecordError>;

    /// Ids of all records that carry a metadata source id.
    fn ids_with_tmdb_id(&self) -> Result<Vec<i64>, RecordError>;

    fn count(&self) -> Result<u64, RecordError>;
}
