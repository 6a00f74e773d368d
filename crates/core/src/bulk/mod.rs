//! Bulk intake of many titles at once.
//!
//! A pasted list of titles becomes a staged batch: every line is resolved
//! against the metadata index, the user reviews and corrects the matches,
//! and a commit turns the surviving ones into catalog records. The staged
//! state lives in a [`BatchSession`] and expires after a day.

mod session;
mod types;
mod workflow;

pub use session::{BatchSession, MemoryBatchSession};
pub use types::{
    BatchDefaults, CommitReport, DuplicateAdvisory, ItemOutcome, StagedBatch, StagedMatch,
    BATCH_EXPIRY_HOURS,
};
pub use workflow::BulkWorkflow;

use thiserror::Error;

use crate::record::RecordError;

#[derive(Debug, Error)]
pub enum BulkError {
    #[error("No staged batch")]
    NoBatch,

    #[error("No staged item at index {0}")]
    IndexOutOfRange(usize),

    #[error("Could not resolve item: {0}")]
    Unresolvable(String),

    #[error(transparent)]
    Record(#[from] RecordError),
}
