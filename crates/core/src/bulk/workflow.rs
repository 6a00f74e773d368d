use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use super::{
    BatchDefaults, BatchSession, BulkError, CommitReport, DuplicateAdvisory, ItemOutcome,
    StagedBatch, StagedMatch,
};
use crate::duplicates::{next_copy_number, DuplicateResolver};
use crate::files::FileStore;
use crate::locations::LocationAllocator;
use crate::metadata::{MetadataService, MovieDetails, MovieSummary};
use crate::normalize;
use crate::record::{Disposition, NewRecord, RecordStore};
use crate::torrents::TorrentService;

/// Drives a staged batch from intake to commit.
pub struct BulkWorkflow {
    store: Arc<dyn RecordStore>,
    metadata: Arc<MetadataService>,
    torrents: Arc<TorrentService>,
    files: Arc<dyn FileStore>,
    session: Arc<dyn BatchSession>,
}

impl BulkWorkflow {
    pub fn new(
        store: Arc<dyn RecordStore>,
        metadata: Arc<MetadataService>,
        torrents: Arc<TorrentService>,
        files: Arc<dyn FileStore>,
        session: Arc<dyn BatchSession>,
    ) -> Self {
        Self {
            store,
            metadata,
            torrents,
            files,
            session,
        }
    }

    /// Resolves one title per non-blank line and stages the result,
    /// replacing any previous batch. Top search hit wins; lines with no hit
    /// are staged unresolved so the user sees them rather than losing them.
    pub async fn intake(&self, titles: &str, defaults: BatchDefaults) -> StagedBatch {
        let mut matches = Vec::new();
        for line in titles.lines().map(str::trim).filter(|l| !l.is_empty()) {
            matches.push(self.resolve_line(line).await);
        }
        info!(
            lines = matches.len(),
            resolved = matches.iter().filter(|m| m.details.is_some()).count(),
            "staged bulk intake"
        );

        let batch = StagedBatch {
            defaults,
            matches,
            created_at: Utc::now(),
        };
        self.save_batch(&batch);
        batch
    }

    async fn resolve_line(&self, line: &str) -> StagedMatch {
        let page = self.metadata.search(line, 1).await;
        let Some(top) = page.results.first() else {
            return StagedMatch::unresolved(line, "no match found");
        };
        match self.metadata.details(top.id).await {
            Some(details) => self.resolved_match(line, details),
            None => StagedMatch::unresolved(line, "could not fetch details"),
        }
    }

    fn resolved_match(&self, line: &str, details: MovieDetails) -> StagedMatch {
        let poster_url = details
            .poster_path
            .as_deref()
            .map(|path| self.metadata.poster_url(path));
        StagedMatch {
            original_title: line.to_string(),
            details: Some(details),
            confirmed: true,
            removed: false,
            poster_url,
            error: None,
        }
    }

    /// The staged batch, if one exists and has not expired. An expired or
    /// unreadable batch is discarded on sight.
    pub fn current_batch(&self) -> Option<StagedBatch> {
        let value = self.session.load()?;
        let batch: StagedBatch = match serde_json::from_value(value) {
            Ok(batch) => batch,
            Err(e) => {
                warn!(error = %e, "discarding unreadable staged batch");
                self.session.clear();
                return None;
            }
        };
        if batch.is_expired(Utc::now()) {
            info!("discarding expired staged batch");
            self.session.clear();
            return None;
        }
        Some(batch)
    }

    pub fn abandon(&self) {
        self.session.clear();
    }

    /// Candidate list for correcting a mismatched item. Read-only: the
    /// staged payload changes only when a candidate is accepted.
    pub async fn research(&self, query: &str) -> Result<Vec<MovieSummary>, BulkError> {
        if self.current_batch().is_none() {
            return Err(BulkError::NoBatch);
        }
        Ok(self.metadata.search(query, 1).await.results)
    }

    /// Replaces a staged item's match with a chosen candidate. The item
    /// comes back confirmed with any previous error cleared.
    pub async fn accept_candidate(&self, index: usize, movie_id: i64) -> Result<StagedBatch, BulkError> {
        let mut batch = self.current_batch().ok_or(BulkError::NoBatch)?;
        let staged = batch
            .matches
            .get_mut(index)
            .ok_or(BulkError::IndexOutOfRange(index))?;

        let details = self
            .metadata
            .details(movie_id)
            .await
            .ok_or_else(|| BulkError::Unresolvable(format!("movie {movie_id} not found")))?;

        staged.poster_url = details
            .poster_path
            .as_deref()
            .map(|path| self.metadata.poster_url(path));
        staged.details = Some(details);
        staged.confirmed = true;
        staged.error = None;

        self.save_batch(&batch);
        Ok(batch)
    }

    pub fn remove_item(&self, index: usize) -> Result<StagedBatch, BulkError> {
        self.set_removed(index, true)
    }

    pub fn restore_item(&self, index: usize) -> Result<StagedBatch, BulkError> {
        self.set_removed(index, false)
    }

    fn set_removed(&self, index: usize, removed: bool) -> Result<StagedBatch, BulkError> {
        let mut batch = self.current_batch().ok_or(BulkError::NoBatch)?;
        let staged = batch
            .matches
            .get_mut(index)
            .ok_or(BulkError::IndexOutOfRange(index))?;
        staged.removed = removed;
        self.save_batch(&batch);
        Ok(batch)
    }

    /// Per-item duplicate information, recomputed fresh against the store on
    /// every call so the advisory never goes stale while a batch sits staged.
    pub fn advisories(
        &self,
        batch: &StagedBatch,
    ) -> Result<Vec<Option<DuplicateAdvisory>>, BulkError> {
        let resolver = DuplicateResolver::new(self.store.as_ref());
        batch
            .matches
            .iter()
            .map(|staged| {
                let Some(details) = staged.details.as_ref().filter(|_| staged.committable())
                else {
                    return Ok(None);
                };
                let copies =
                    resolver.find_copies(Some(details.id), &details.title, details.year())?;
                if copies.is_empty() {
                    return Ok(None);
                }
                Ok(Some(DuplicateAdvisory {
                    existing_copies: copies.len() as u32,
                    next_copy_number: next_copy_number(&copies),
                }))
            })
            .collect()
    }

    /// Commits every confirmed, non-removed item in batch order. Items fail
    /// individually; one bad row never aborts the rest. The staged batch is
    /// cleared whatever the outcomes were, a re-commit of the same batch is
    /// always a bug.
    pub async fn commit(&self) -> Result<CommitReport, BulkError> {
        let batch = self.current_batch().ok_or(BulkError::NoBatch)?;

        // One reservation pass for the whole batch. Slots are consumed only
        // as records are actually created, so a skipped or failed item does
        // not leave a hole in the sequence.
        let mut slots = if batch.defaults.disposition == Disposition::InTransit {
            LocationAllocator::new(self.store.as_ref())
                .next_sequential_batch(batch.committable_count())?
        } else {
            Vec::new()
        }
        .into_iter();

        let mut report = CommitReport::default();
        for staged in batch.matches.iter().filter(|m| m.committable()) {
            let details = staged
                .details
                .as_ref()
                .ok_or_else(|| BulkError::Unresolvable(staged.original_title.clone()))?;
            let outcome = self
                .commit_item(details, &batch.defaults, &mut slots)
                .await;
            report.outcomes.push(outcome);
        }

        info!(
            added = report.added(),
            skipped = report.skipped(),
            failed = report.failed(),
            "bulk commit finished"
        );
        self.session.clear();
        Ok(report)
    }

    async fn commit_item(
        &self,
        details: &MovieDetails,
        defaults: &BatchDefaults,
        slots: &mut std::vec::IntoIter<String>,
    ) -> ItemOutcome {
        if defaults.skip_existing {
            match self.store.find_by_tmdb_id(details.id) {
                Ok(existing) if !existing.is_empty() => {
                    return ItemOutcome::Skipped {
                        title: details.title.clone(),
                        reason: "already in catalog".to_string(),
                    };
                }
                Ok(_) => {}
                Err(e) => {
                    return ItemOutcome::Failed {
                        title: details.title.clone(),
                        message: e.to_string(),
                    };
                }
            }
        }

        let fields = normalize::new_record_fields(details);
        let resolver = DuplicateResolver::new(self.store.as_ref());
        let copies =
            match resolver.find_copies(fields.tmdb_id, &fields.title, fields.release_year) {
                Ok(copies) => copies,
                Err(e) => {
                    return ItemOutcome::Failed {
                        title: details.title.clone(),
                        message: e.to_string(),
                    };
                }
            };
        let copy_number = next_copy_number(&copies);

        let slot = if defaults.disposition == Disposition::InTransit {
            slots.next()
        } else {
            None
        };

        let record = NewRecord {
            tmdb_id: fields.tmdb_id,
            imdb_id: fields.imdb_id,
            title: fields.title,
            overview: fields.overview,
            release_year: fields.release_year,
            genres: fields.genres,
            runtime_minutes: fields.runtime_minutes,
            rating: fields.rating,
            certification: fields.certification,
            original_language: fields.original_language,
            budget: fields.budget,
            revenue: fields.revenue,
            production_companies: fields.production_companies,
            tagline: fields.tagline,
            director: fields.director,
            disposition: defaults.disposition,
            medium: defaults.medium,
            special_edition: defaults.special_edition,
            box_set: defaults.box_set,
            box_set_name: if defaults.box_set {
                defaults.box_set_name.clone()
            } else {
                String::new()
            },
            unopened: defaults.unopened,
            unwatched: defaults.unwatched,
            storage_label: if defaults.disposition == Disposition::Kept {
                defaults.storage_label.clone()
            } else {
                String::new()
            },
            slot,
            copy_number,
            copy_notes: String::new(),
            poster_ref: self.fetch_poster(details).await,
        };

        match self.store.create(record) {
            Ok(created) => {
                self.refresh_torrent_cache(&created.id, created.imdb_id.as_deref())
                    .await;
                ItemOutcome::Added {
                    id: created.id,
                    title: created.title,
                    copy_number: created.copy_number,
                }
            }
            Err(e) => ItemOutcome::Failed {
                title: details.title.clone(),
                message: e.to_string(),
            },
        }
    }

    /// Best effort: a record without a poster is still a record.
    async fn fetch_poster(&self, details: &MovieDetails) -> Option<String> {
        let path = details.poster_path.as_deref()?;
        let name = format!("{}_{}", details.id, path.trim_start_matches('/'));
        let url = self.metadata.poster_url(path);
        let bytes = self.metadata.download_poster(&url).await?;
        match self.files.store(&bytes, &name) {
            Ok(stored) => Some(stored),
            Err(e) => {
                warn!(movie_id = details.id, error = %e, "poster store failed");
                None
            }
        }
    }

    /// Best effort: failure leaves the record without availability data,
    /// which the next torrent refresh repairs.
    async fn refresh_torrent_cache(&self, id: &i64, imdb_id: Option<&str>) {
        let Some(imdb_id) = imdb_id.filter(|v| !v.is_empty()) else {
            return;
        };
        let torrents = self.torrents.torrents(imdb_id).await;
        if let Err(e) = self.store.set_torrent_cache(*id, &torrents, Utc::now()) {
            warn!(record_id = id, error = %e, "torrent cache write failed");
        }
    }

    fn save_batch(&self, batch: &StagedBatch) {
        match serde_json::to_value(batch) {
            Ok(value) => self.session.save(value),
            Err(e) => warn!(error = %e, "failed to serialize staged batch"),
        }
    }
}
