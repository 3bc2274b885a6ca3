//! Domain-level error taxonomy for the scoring engine.

use palmares_state::StorageError;

use super::entry::EntryId;
use super::judge::JudgeId;

/// Errors produced by scoring, submission, and catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum ScoreError {
    #[error("invalid star value: {value} (must be 1..=5)")]
    InvalidValue { value: u8 },

    #[error("unknown criterion: {key}")]
    UnknownCriterion { key: String },

    #[error("unknown entry: {0}")]
    UnknownEntry(EntryId),

    #[error("unknown judge: {0}")]
    UnknownJudge(JudgeId),

    #[error("criterion '{key}' already submitted by judge {judge} for entry {entry}")]
    AlreadySubmitted {
        judge: JudgeId,
        entry: EntryId,
        key: String,
    },

    #[error("invalid criteria registry: {0}")]
    InvalidRegistry(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for scoring engine operations.
pub type ScoreResult<T> = std::result::Result<T, ScoreError>;
