use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::metadata::MovieDetails;
use crate::record::{Disposition, MediumType};

/// A staged batch older than this is expired and silently discarded.
pub const BATCH_EXPIRY_HOURS: i64 = 24;

/// Copy-level attributes applied to every record a batch creates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchDefaults {
    pub disposition: Disposition,
    pub medium: MediumType,
    pub special_edition: bool,
    pub box_set: bool,
    pub box_set_name: String,
    pub unopened: bool,
    pub unwatched: bool,
    pub storage_label: String,
    /// Skip titles that already exist (matched by metadata id) instead of
    /// adding another copy.
    pub skip_existing: bool,
}

impl Default for BatchDefaults {
    fn default() -> Self {
        Self {
            disposition: Disposition::Kept,
            medium: MediumType::Physical,
            special_edition: false,
            box_set: false,
            box_set_name: String::new(),
            unopened: false,
            unwatched: true,
            storage_label: String::new(),
            skip_existing: false,
        }
    }
}

/// One intake line and what it resolved to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagedMatch {
    /// The line as the user typed it.
    pub original_title: String,
    pub details: Option<MovieDetails>,
    /// Confirmed matches are committed; unconfirmed ones are held for review.
    pub confirmed: bool,
    /// Soft-removed by the user; kept in place so it can be restored.
    pub removed: bool,
    pub poster_url: Option<String>,
    pub error: Option<String>,
}

impl StagedMatch {
    pub fn unresolved(original_title: &str, error: &str) -> Self {
        Self {
            original_title: original_title.to_string(),
            details: None,
            confirmed: false,
            removed: false,
            poster_url: None,
            error: Some(error.to_string()),
        }
    }

    /// Whether this item would be persisted by a commit right now.
    pub fn committable(&self) -> bool {
        self.confirmed && !self.removed && self.details.is_some()
    }
}

/// The staged state of a bulk intake, held between intake and commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagedBatch {
    pub defaults: BatchDefaults,
    pub matches: Vec<StagedMatch>,
    pub created_at: DateTime<Utc>,
}

impl StagedBatch {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at > Duration::hours(BATCH_EXPIRY_HOURS)
    }

    pub fn committable_count(&self) -> usize {
        self.matches.iter().filter(|m| m.committable()).count()
    }
}

/// Existing-copy information shown next to a staged item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateAdvisory {
    pub existing_copies: u32,
    pub next_copy_number: u32,
}

/// What happened to one committed item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ItemOutcome {
    Added {
        id: i64,
        title: String,
        copy_number: u32,
    },
    Skipped {
        title: String,
        reason: String,
    },
    Failed {
        title: String,
        message: String,
    },
}

impl ItemOutcome {
    pub fn title(&self) -> &str {
        match self {
            ItemOutcome::Added { title, .. } => title,
            ItemOutcome::Skipped { title, .. } => title,
            ItemOutcome::Failed { title, .. } => title,
        }
    }
}

/// Per-item results of a commit, in batch order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitReport {
    pub outcomes: Vec<ItemOutcome>,
}

impl CommitReport {
    pub fn added(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ItemOutcome::Added { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ItemOutcome::Skipped { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ItemOutcome::Failed { .. }))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch_created_at(hours_ago: i64) -> StagedBatch {
        StagedBatch {
            defaults: BatchDefaults::default(),
            matches: Vec::new(),
            created_at: Utc::now() - Duration::hours(hours_ago),
        }
    }

    #[test]
    fn test_batch_expiry_boundary() {
        let now = Utc::now();
        assert!(!batch_created_at(23).is_expired(now));
        assert!(batch_created_at(25).is_expired(now));
    }

    #[test]
    fn test_unresolved_match_is_not_committable() {
        let staged = StagedMatch::unresolved("Unknown Movie", "no match found");
        assert!(!staged.committable());
        assert_eq!(staged.error.as_deref(), Some("no match found"));
    }
}
