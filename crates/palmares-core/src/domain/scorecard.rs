//! Per-(judge, entry) scorecards and the incremental submission rules.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::criterion::{CriteriaRegistry, Stars};
use super::entry::EntryId;
use super::error::{ScoreError, ScoreResult};
use super::judge::JudgeId;

/// A judge's mark for one criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mark {
    pub stars: Stars,
    pub submitted_at: DateTime<Utc>,
}

/// One judge's rating record for one entry.
///
/// Criteria are filled in one at a time; a mark, once set, never changes.
/// Completeness is derived from the registry, never stored, so the record
/// cannot drift out of sync with the criteria set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scorecard {
    pub judge_id: JudgeId,
    pub entry_id: EntryId,
    /// Marks keyed by criterion key. Only keys known to the registry can
    /// ever appear here.
    pub marks: BTreeMap<String, Mark>,
    pub created_at: DateTime<Utc>,
}

impl Scorecard {
    /// Empty scorecard for a (judge, entry) pair.
    pub fn new(judge_id: JudgeId, entry_id: EntryId, now: DateTime<Utc>) -> Self {
        Self {
            judge_id,
            entry_id,
            marks: BTreeMap::new(),
            created_at: now,
        }
    }

    /// Deterministic storage id for the pair, so upserts stay idempotent.
    pub fn storage_id(judge_id: &JudgeId, entry_id: &EntryId) -> String {
        format!("{}:{}", judge_id, entry_id)
    }

    /// This record's storage id.
    pub fn record_id(&self) -> String {
        Self::storage_id(&self.judge_id, &self.entry_id)
    }

    /// The mark for a criterion, if submitted.
    pub fn mark(&self, key: &str) -> Option<&Mark> {
        self.marks.get(key)
    }

    /// Record a mark for one criterion.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::UnknownCriterion` when the key is not in the
    /// registry, and `ScoreError::AlreadySubmitted` when the criterion
    /// already carries a mark. The stored mark is never overwritten.
    pub fn submit(
        &mut self,
        registry: &CriteriaRegistry,
        key: &str,
        stars: Stars,
        now: DateTime<Utc>,
    ) -> ScoreResult<()> {
        if !registry.contains(key) {
            return Err(ScoreError::UnknownCriterion {
                key: key.to_string(),
            });
        }
        if self.marks.contains_key(key) {
            return Err(ScoreError::AlreadySubmitted {
                judge: self.judge_id.clone(),
                entry: self.entry_id.clone(),
                key: key.to_string(),
            });
        }
        self.marks.insert(
            key.to_string(),
            Mark {
                stars,
                submitted_at: now,
            },
        );
        Ok(())
    }

    /// Number of criteria submitted so far.
    pub fn submitted_count(&self) -> usize {
        self.marks.len()
    }

    /// Whether every criterion in the registry carries a mark.
    pub fn is_complete(&self, registry: &CriteriaRegistry) -> bool {
        registry.criteria().iter().all(|c| self.marks.contains_key(&c.key))
    }
}
