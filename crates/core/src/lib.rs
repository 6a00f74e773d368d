//! Core library for shelfline, a personal media collection tracker.
//!
//! The catalog is a set of owned-copy records enriched from an external
//! movie metadata index and a torrent availability index. Modules:
//!
//! - [`record`]: catalog records and their SQLite store
//! - [`metadata`] / [`torrents`]: external index clients plus caching,
//!   fail-soft service facades
//! - [`normalize`]: mapping from metadata payloads to record fields
//! - [`duplicates`] / [`locations`]: copy numbering and box slot assignment
//! - [`bulk`]: staged many-titles-at-once intake
//! - [`refresh`]: per-record and full-catalog refresh
//! - [`cache`], [`config`], [`files`]: supporting infrastructure

pub mod bulk;
pub mod cache;
pub mod config;
pub mod duplicates;
pub mod files;
pub mod locations;
pub mod metadata;
pub mod normalize;
pub mod record;
pub mod refresh;
pub mod testing;
pub mod torrents;

pub use bulk::{
    BatchDefaults, BatchSession, BulkError, BulkWorkflow, CommitReport, DuplicateAdvisory,
    ItemOutcome, MemoryBatchSession, StagedBatch, StagedMatch,
};
pub use cache::{Cache, MemoryCache};
pub use config::{load_config, validate_config, Config, ConfigError, SanitizedConfig};
pub use duplicates::DuplicateResolver;
pub use files::{FileStore, FileStoreError, FsFileStore};
pub use locations::LocationAllocator;
pub use metadata::{
    MetadataError, MetadataProvider, MetadataService, MovieDetails, MovieSummary, TmdbClient,
};
pub use record::{
    CatalogRecord, Disposition, MediumType, NewRecord, RecordError, RecordFilter, RecordPatch,
    RecordStore, SqliteRecordStore,
};
pub use refresh::{CatalogRefresher, RefreshProgress};
pub use torrents::{
    Quality, TorrentDescriptor, TorrentIndex, TorrentIndexError, TorrentService, YtsClient,
};
