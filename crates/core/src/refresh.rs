//! Metadata and torrent refresh for existing records.
//!
//! Two refresh shapes exist on purpose. A plain refresh is sparse: it only
//! overwrites a field when the source has something real, so curated data
//! survives gaps in the upstream payload. A rematch is a full overwrite:
//! the old match was wrong, nothing derived from it is worth keeping.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cache::{self, Cache};
use crate::files::FileStore;
use crate::metadata::MetadataService;
use crate::normalize;
use crate::record::{RecordError, RecordPatch, RecordStore};
use crate::torrents::TorrentService;

/// Progress entries outlive their task by this long; pollers that show up
/// late still get a final state instead of a 404.
const PROGRESS_TTL: Duration = Duration::from_secs(60 * 60);

/// Snapshot of a running or finished full-catalog refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshProgress {
    /// 0.0 to 1.0
    pub progress: f64,
    pub status: String,
    pub completed: bool,
    pub cancelled: bool,
    pub updated: u32,
    pub failed: u32,
}

impl RefreshProgress {
    fn running(progress: f64, status: String, updated: u32, failed: u32) -> Self {
        Self {
            progress,
            status,
            completed: false,
            cancelled: false,
            updated,
            failed,
        }
    }
}

pub struct CatalogRefresher {
    store: Arc<dyn RecordStore>,
    metadata: Arc<MetadataService>,
    torrents: Arc<TorrentService>,
    files: Arc<dyn FileStore>,
    cache: Arc<dyn Cache>,
    /// Cancellation flags for running tasks, keyed by task id.
    tasks: Mutex<HashMap<String, Arc<AtomicBool>>>,
}

impl CatalogRefresher {
    pub fn new(
        store: Arc<dyn RecordStore>,
        metadata: Arc<MetadataService>,
        torrents: Arc<TorrentService>,
        files: Arc<dyn FileStore>,
        cache: Arc<dyn Cache>,
    ) -> Self {
        Self {
            store,
            metadata,
            torrents,
            files,
            cache,
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Fetches and stores the cross-reference id for a record that is
    /// matched to the metadata index but missing one.
    pub async fn fetch_imdb(&self, id: i64) -> Result<Option<String>, RecordError> {
        let record = self.store.get(id)?;
        let Some(tmdb_id) = record.tmdb_id else {
            return Err(RecordError::validation(
                "tmdb_id",
                "record is not matched to the metadata index",
            ));
        };
        let Some(imdb_id) = self.metadata.cross_reference(tmdb_id).await else {
            return Ok(None);
        };
        let patch = RecordPatch {
            imdb_id: Some(imdb_id.clone()),
            ..RecordPatch::default()
        };
        self.store.update(id, &patch)?;
        Ok(Some(imdb_id))
    }

    /// Downloads a chosen poster and points the record at the stored copy.
    pub async fn change_poster(&self, id: i64, poster_path: &str) -> Result<String, RecordError> {
        let record = self.store.get(id)?;
        let url = self.metadata.poster_url(poster_path);
        let bytes = self
            .metadata
            .download_poster(&url)
            .await
            .ok_or_else(|| RecordError::External(format!("poster download failed: {url}")))?;

        let name = format!(
            "{}_{}",
            record.tmdb_id.unwrap_or(record.id),
            poster_path.trim_start_matches('/')
        );
        let reference = self
            .files
            .store(&bytes, &name)
            .map_err(|e| RecordError::External(e.to_string()))?;

        let patch = RecordPatch {
            poster_ref: Some(reference.clone()),
            ..RecordPatch::default()
        };
        self.store.update(id, &patch)?;
        Ok(reference)
    }

    /// Re-pulls metadata for one record and applies it sparsely.
    pub async fn refresh_record(&self, id: i64) -> Result<(), RecordError> {
        let record = self.store.get(id)?;
        let Some(tmdb_id) = record.tmdb_id else {
            return Err(RecordError::validation(
                "tmdb_id",
                "record is not matched to the metadata index",
            ));
        };
        let details = self
            .metadata
            .details(tmdb_id)
            .await
            .ok_or_else(|| RecordError::External(format!("no metadata for movie {tmdb_id}")))?;

        let patch = normalize::refresh_fields(&details).into_patch();
        self.store.update(id, &patch)?;
        Ok(())
    }

    /// Re-points a record at a different movie and overwrites every metadata
    /// field from the new match, including fields the new payload leaves
    /// empty. Curation fields (disposition, slot, copy number, notes) are
    /// untouched.
    pub async fn rematch_record(&self, id: i64, tmdb_id: i64) -> Result<(), RecordError> {
        self.store.get(id)?;
        let details = self
            .metadata
            .details(tmdb_id)
            .await
            .ok_or_else(|| RecordError::External(format!("no metadata for movie {tmdb_id}")))?;

        let fields = normalize::new_record_fields(&details);
        let patch = RecordPatch {
            tmdb_id: fields.tmdb_id,
            imdb_id: Some(fields.imdb_id.unwrap_or_default()),
            title: Some(fields.title),
            overview: Some(fields.overview),
            release_year: fields.release_year,
            genres: Some(fields.genres),
            runtime_minutes: fields.runtime_minutes,
            rating: fields.rating,
            certification: Some(fields.certification),
            original_language: Some(fields.original_language),
            budget: fields.budget,
            revenue: fields.revenue,
            production_companies: Some(fields.production_companies),
            tagline: Some(fields.tagline),
            director: Some(fields.director),
            ..RecordPatch::default()
        };
        self.store.update(id, &patch)?;
        info!(record_id = id, tmdb_id, "record rematched");
        Ok(())
    }

    /// Re-pulls torrent availability for one record from the live index.
    pub async fn refresh_torrents(&self, id: i64) -> Result<(), RecordError> {
        let record = self.store.get(id)?;
        let Some(imdb_id) = record.imdb_id.filter(|v| !v.is_empty()) else {
            return Err(RecordError::validation(
                "imdb_id",
                "record has no cross-reference id",
            ));
        };
        let torrents = self.torrents.torrents(&imdb_id).await;
        self.store.set_torrent_cache(id, &torrents, Utc::now())
    }

    /// Recomputes `has_torrents` from the stored availability lists.
    /// Maintenance pass for rows written before the flag existed.
    pub fn rebuild_torrent_flags(&self) -> Result<u32, RecordError> {
        let records = self.store.list(&Default::default())?;
        let mut fixed = 0;
        for record in records {
            if record.has_torrents != !record.torrents.is_empty() {
                let refreshed_at = record.torrents_refreshed_at.unwrap_or_else(Utc::now);
                self.store
                    .set_torrent_cache(record.id, &record.torrents, refreshed_at)?;
                fixed += 1;
            }
        }
        Ok(fixed)
    }

    /// Rewrites any certification not already in canonical lowercase form.
    /// Maintenance pass for rows that predate write-time normalization.
    pub fn normalize_certifications(&self) -> Result<u32, RecordError> {
        let records = self.store.list(&Default::default())?;
        let mut fixed = 0;
        for record in records {
            let canonical = normalize::normalize_certification(&record.certification);
            if record.certification != canonical {
                let patch = RecordPatch {
                    certification: Some(canonical),
                    ..RecordPatch::default()
                };
                self.store.update(record.id, &patch)?;
                fixed += 1;
            }
        }
        Ok(fixed)
    }

    /// Kicks off a full-catalog metadata refresh in the background and
    /// returns a task id for progress polling.
    pub fn start_full_refresh(self: &Arc<Self>) -> String {
        let task_id = Uuid::new_v4().to_string();
        let cancel = Arc::new(AtomicBool::new(false));
        self.tasks
            .lock()
            .unwrap()
            .insert(task_id.clone(), cancel.clone());

        self.write_progress(
            &task_id,
            &RefreshProgress::running(0.0, "Starting".to_string(), 0, 0),
        );

        let refresher = Arc::clone(self);
        let spawned_task_id = task_id.clone();
        tokio::spawn(async move {
            refresher.run_full_refresh(&spawned_task_id, cancel).await;
        });

        task_id
    }

    async fn run_full_refresh(&self, task_id: &str, cancel: Arc<AtomicBool>) {
        let ids = match self.store.ids_with_tmdb_id() {
            Ok(ids) => ids,
            Err(e) => {
                warn!(task_id, error = %e, "full refresh could not list records");
                self.write_progress(
                    task_id,
                    &RefreshProgress {
                        progress: 0.0,
                        status: format!("Failed: {e}"),
                        completed: true,
                        cancelled: false,
                        updated: 0,
                        failed: 0,
                    },
                );
                self.tasks.lock().unwrap().remove(task_id);
                return;
            }
        };

        let total = ids.len();
        let mut updated = 0u32;
        let mut failed = 0u32;

        for (done, id) in ids.into_iter().enumerate() {
            if cancel.load(Ordering::Relaxed) {
                info!(task_id, updated, failed, "full refresh cancelled");
                self.write_progress(
                    task_id,
                    &RefreshProgress {
                        progress: done as f64 / total.max(1) as f64,
                        status: "Cancelled".to_string(),
                        completed: true,
                        cancelled: true,
                        updated,
                        failed,
                    },
                );
                self.tasks.lock().unwrap().remove(task_id);
                return;
            }

            self.write_progress(
                task_id,
                &RefreshProgress::running(
                    done as f64 / total.max(1) as f64,
                    format!("Updating record {id}"),
                    updated,
                    failed,
                ),
            );

            match self.refresh_record(id).await {
                Ok(()) => updated += 1,
                Err(e) => {
                    warn!(task_id, record_id = id, error = %e, "record refresh failed");
                    failed += 1;
                }
            }
        }

        info!(task_id, updated, failed, "full refresh finished");
        self.write_progress(
            task_id,
            &RefreshProgress {
                progress: 1.0,
                status: "Done".to_string(),
                completed: true,
                cancelled: false,
                updated,
                failed,
            },
        );
        self.tasks.lock().unwrap().remove(task_id);
    }

    /// Latest progress for a task, None once the entry has expired or the
    /// task id was never real.
    pub fn progress(&self, task_id: &str) -> Option<RefreshProgress> {
        cache::get_json(self.cache.as_ref(), &progress_key(task_id))
    }

    /// Requests cancellation. Best effort: the task stops before its next
    /// record, not mid-request. Returns false for unknown or finished tasks.
    pub fn cancel(&self, task_id: &str) -> bool {
        match self.tasks.lock().unwrap().get(task_id) {
            Some(flag) => {
                flag.store(true, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    fn write_progress(&self, task_id: &str, progress: &RefreshProgress) {
        cache::put_json(
            self.cache.as_ref(),
            &progress_key(task_id),
            progress,
            PROGRESS_TTL,
        );
    }
}

fn progress_key(task_id: &str) -> String {
    format!("refresh_{task_id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::config::MetadataConfig;
    use crate::files::FsFileStore;
    use crate::record::{NewRecord, SqliteRecordStore};
    use crate::testing::{fixtures, MockMetadataProvider, MockTorrentIndex};
    use tempfile::TempDir;

    struct Harness {
        refresher: Arc<CatalogRefresher>,
        store: Arc<SqliteRecordStore>,
        provider: Arc<MockMetadataProvider>,
        _poster_dir: TempDir,
    }

    fn harness() -> Harness {
        let store = Arc::new(SqliteRecordStore::in_memory().unwrap());
        let cache = Arc::new(MemoryCache::new());
        let provider = Arc::new(MockMetadataProvider::new());
        let poster_dir = TempDir::new().unwrap();
        let metadata = Arc::new(MetadataService::new(
            provider.clone(),
            cache.clone(),
            &MetadataConfig::default(),
        ));
        let torrents = Arc::new(TorrentService::new(
            Arc::new(MockTorrentIndex::new()),
            cache.clone(),
        ));
        let files = Arc::new(FsFileStore::new(poster_dir.path()).unwrap());
        let refresher = Arc::new(CatalogRefresher::new(
            store.clone(),
            metadata,
            torrents,
            files,
            cache,
        ));
        Harness {
            refresher,
            store,
            provider,
            _poster_dir: poster_dir,
        }
    }

    #[tokio::test]
    async fn test_refresh_record_applies_sparse_fields() {
        let h = harness();
        let record = h
            .store
            .create(NewRecord {
                tmdb_id: Some(603),
                title: "Wrong Title".to_string(),
                overview: "curated overview".to_string(),
                ..NewRecord::default()
            })
            .unwrap();

        let mut details = fixtures::movie_details(603, "The Matrix", 1999);
        details.overview = None;
        h.provider.add_movie(details);

        h.refresher.refresh_record(record.id).await.unwrap();
        let refreshed = h.store.get(record.id).unwrap();
        assert_eq!(refreshed.title, "The Matrix");
        // absent upstream value never erases curated data
        assert_eq!(refreshed.overview, "curated overview");
    }

    #[tokio::test]
    async fn test_refresh_unmatched_record_is_a_validation_error() {
        let h = harness();
        let record = h
            .store
            .create(NewRecord {
                title: "Unmatched".to_string(),
                ..NewRecord::default()
            })
            .unwrap();

        let result = h.refresher.refresh_record(record.id).await;
        assert!(matches!(result, Err(RecordError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_rematch_overwrites_even_with_empty_fields() {
        let h = harness();
        let record = h
            .store
            .create(NewRecord {
                tmdb_id: Some(999),
                title: "Bad Match".to_string(),
                tagline: "old tagline".to_string(),
                copy_notes: "my notes".to_string(),
                ..NewRecord::default()
            })
            .unwrap();

        let mut details = fixtures::movie_details(603, "The Matrix", 1999);
        details.tagline = None;
        h.provider.add_movie(details);

        h.refresher.rematch_record(record.id, 603).await.unwrap();
        let rematched = h.store.get(record.id).unwrap();
        assert_eq!(rematched.tmdb_id, Some(603));
        assert_eq!(rematched.title, "The Matrix");
        // full overwrite clears stale metadata
        assert_eq!(rematched.tagline, "");
        // curation survives
        assert_eq!(rematched.copy_notes, "my notes");
    }

    #[tokio::test]
    async fn test_full_refresh_reports_progress_and_counts() {
        let h = harness();
        for tmdb_id in [603, 604] {
            h.store
                .create(NewRecord {
                    tmdb_id: Some(tmdb_id),
                    title: format!("Movie {tmdb_id}"),
                    ..NewRecord::default()
                })
                .unwrap();
        }
        // only 603 resolves; 604 fails
        h.provider
            .add_movie(fixtures::movie_details(603, "The Matrix", 1999));

        let task_id = h.refresher.start_full_refresh();
        // spawned on the current-thread test runtime, so awaiting a yield
        // loop lets it run to completion
        for _ in 0..100 {
            tokio::task::yield_now().await;
            if h.refresher.progress(&task_id).map(|p| p.completed) == Some(true) {
                break;
            }
        }

        let progress = h.refresher.progress(&task_id).unwrap();
        assert!(progress.completed);
        assert!(!progress.cancelled);
        assert_eq!(progress.updated, 1);
        assert_eq!(progress.failed, 1);
        assert_eq!(progress.progress, 1.0);
    }

    #[tokio::test]
    async fn test_fetch_imdb_stores_cross_reference() {
        let h = harness();
        let record = h
            .store
            .create(NewRecord {
                tmdb_id: Some(603),
                title: "The Matrix".to_string(),
                ..NewRecord::default()
            })
            .unwrap();
        h.provider.set_imdb_id(603, "tt0133093");

        let imdb = h.refresher.fetch_imdb(record.id).await.unwrap();
        assert_eq!(imdb.as_deref(), Some("tt0133093"));
        assert_eq!(
            h.store.get(record.id).unwrap().imdb_id.as_deref(),
            Some("tt0133093")
        );
    }

    #[tokio::test]
    async fn test_fetch_imdb_absent_upstream_leaves_record_alone() {
        let h = harness();
        let record = h
            .store
            .create(NewRecord {
                tmdb_id: Some(603),
                title: "The Matrix".to_string(),
                ..NewRecord::default()
            })
            .unwrap();

        assert_eq!(h.refresher.fetch_imdb(record.id).await.unwrap(), None);
        assert_eq!(h.store.get(record.id).unwrap().imdb_id, None);
    }

    #[tokio::test]
    async fn test_change_poster_stores_file_and_reference() {
        let h = harness();
        let record = h
            .store
            .create(NewRecord {
                tmdb_id: Some(603),
                title: "The Matrix".to_string(),
                ..NewRecord::default()
            })
            .unwrap();

        let reference = h
            .refresher
            .change_poster(record.id, "/alt_poster.jpg")
            .await
            .unwrap();
        assert_eq!(reference, "603_alt_poster.jpg");
        assert_eq!(
            h.store.get(record.id).unwrap().poster_ref.as_deref(),
            Some("603_alt_poster.jpg")
        );
    }

    #[tokio::test]
    async fn test_cancel_unknown_task() {
        let h = harness();
        assert!(!h.refresher.cancel("not-a-task"));
    }

    #[tokio::test]
    async fn test_normalize_certifications_backfill_noop_on_clean_data() {
        let h = harness();
        h.store
            .create(NewRecord {
                title: "A".to_string(),
                certification: "PG".to_string(),
                ..NewRecord::default()
            })
            .unwrap();
        // the store already normalized on write, nothing left to fix
        assert_eq!(h.refresher.normalize_certifications().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_rebuild_torrent_flags_noop_when_consistent() {
        let h = harness();
        h.store
            .create(NewRecord {
                title: "A".to_string(),
                ..NewRecord::default()
            })
            .unwrap();
        assert_eq!(h.refresher.rebuild_torrent_flags().unwrap(), 0);
    }
}
