//! Leaderboard computation.
//!
//! Pull-based: every call recomputes from the catalog and scorecards it is
//! handed, so a board is always consistent with the state at call time and
//! there is no cache to invalidate.

use serde::Serialize;

use crate::domain::{CriteriaRegistry, Entry, JudgeId, Scorecard};
use crate::scoring::{self, EntryAggregate};

/// One row of the global leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    pub entry: Entry,
    pub aggregate: EntryAggregate,
    /// Dense rank; `None` for entries with no complete votes yet.
    pub rank: Option<u32>,
}

impl RankedEntry {
    pub fn is_unranked(&self) -> bool {
        self.rank.is_none()
    }
}

/// Compute the global leaderboard.
///
/// Entries with at least one complete scorecard are sorted by mean score
/// descending and given dense ranks: tied entries share a rank, and the next
/// distinct score takes the following rank (1, 2, 2, 3). Entries nobody has
/// finished rating sort after every ranked entry and carry no rank. Within
/// equal standing the entry id breaks ties, so repeated calls over unchanged
/// state return the identical board.
pub fn rank_global(
    entries: &[Entry],
    scorecards: &[Scorecard],
    registry: &CriteriaRegistry,
) -> Vec<RankedEntry> {
    let mut rated: Vec<RankedEntry> = Vec::new();
    let mut unrated: Vec<RankedEntry> = Vec::new();

    for entry in entries {
        let aggregate = scoring::aggregate_for_entry(&entry.id, scorecards, registry);
        let row = RankedEntry {
            entry: entry.clone(),
            aggregate,
            rank: None,
        };
        if row.aggregate.vote_count > 0 {
            rated.push(row);
        } else {
            unrated.push(row);
        }
    }

    rated.sort_by(|a, b| {
        b.aggregate
            .mean_score
            .total_cmp(&a.aggregate.mean_score)
            .then_with(|| a.entry.id.cmp(&b.entry.id))
    });
    unrated.sort_by(|a, b| a.entry.id.cmp(&b.entry.id));

    let mut current_rank = 0u32;
    let mut previous_score: Option<f64> = None;
    for row in &mut rated {
        let score = row.aggregate.mean_score;
        if previous_score != Some(score) {
            current_rank += 1;
            previous_score = Some(score);
        }
        row.rank = Some(current_rank);
    }

    rated.extend(unrated);
    rated
}

/// One row of a judge's personal board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JudgeBoardRow {
    pub entry: Entry,
    /// Composite score from this judge's card; 0 until the card is complete.
    pub score: u32,
    pub percentage: f64,
    /// Whether this judge has fully rated the entry.
    pub evaluated: bool,
}

/// Compute one judge's personal board over the whole catalog.
///
/// Uses only that judge's scorecards. Entries the judge has not completed
/// show a zero score, are flagged `evaluated = false`, and sort after every
/// evaluated entry; a partial card never leaks its intermediate composite
/// into the board.
pub fn rank_for_judge(
    judge_id: &JudgeId,
    entries: &[Entry],
    scorecards: &[Scorecard],
    registry: &CriteriaRegistry,
) -> Vec<JudgeBoardRow> {
    let mut rows: Vec<JudgeBoardRow> = entries
        .iter()
        .map(|entry| {
            let card = scorecards
                .iter()
                .find(|card| card.judge_id == *judge_id && card.entry_id == entry.id);
            match card {
                Some(card) if card.is_complete(registry) => JudgeBoardRow {
                    entry: entry.clone(),
                    score: scoring::composite_score(card, registry),
                    percentage: scoring::percentage(card, registry),
                    evaluated: true,
                },
                _ => JudgeBoardRow {
                    entry: entry.clone(),
                    score: 0,
                    percentage: 0.0,
                    evaluated: false,
                },
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.evaluated
            .cmp(&a.evaluated)
            .then_with(|| b.score.cmp(&a.score))
            .then_with(|| a.entry.id.cmp(&b.entry.id))
    });
    rows
}
