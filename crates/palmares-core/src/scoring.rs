//! Weighted scoring over scorecards.
//!
//! One set of formulas, used everywhere a score is shown:
//! - composite score: sum of stars x weight over submitted marks
//! - percentage: composite / best achievable x 100
//! - running average: mean of submitted star values (partial cards)
//! - entry aggregate: mean composite over complete scorecards only

use serde::Serialize;

use crate::domain::{CriteriaRegistry, EntryId, JudgeId, Scorecard};

/// Weighted composite score of a scorecard.
///
/// Unsubmitted criteria contribute zero, so the value is well-defined for
/// partial cards. A complete card against the standard registry tops out at
/// 65 (total weight 13 x 5 stars).
pub fn composite_score(scorecard: &Scorecard, registry: &CriteriaRegistry) -> u32 {
    registry
        .criteria()
        .iter()
        .filter_map(|criterion| {
            scorecard
                .mark(&criterion.key)
                .map(|mark| u32::from(mark.stars.value()) * criterion.weight)
        })
        .sum()
}

/// Composite score as a percentage of the best achievable score.
pub fn percentage(scorecard: &Scorecard, registry: &CriteriaRegistry) -> f64 {
    let max = registry.max_possible_score();
    if max == 0 {
        return 0.0;
    }
    f64::from(composite_score(scorecard, registry)) / f64::from(max) * 100.0
}

/// Unweighted mean of the star values submitted so far.
///
/// The divisor is the number of submitted marks, not the registry size, so
/// an in-progress card shows its true running level instead of being
/// dragged down by unanswered criteria. Returns 0.0 for an empty card.
pub fn running_average(scorecard: &Scorecard) -> f64 {
    if scorecard.marks.is_empty() {
        return 0.0;
    }
    let sum: u32 = scorecard
        .marks
        .values()
        .map(|mark| u32::from(mark.stars.value()))
        .sum();
    f64::from(sum) / scorecard.marks.len() as f64
}

/// One judge's contribution to an entry aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JudgeScore {
    pub judge_id: JudgeId,
    pub score: u32,
    pub percentage: f64,
}

/// Aggregate standing of one entry across the panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryAggregate {
    /// Mean composite score over complete scorecards; 0.0 with no votes.
    pub mean_score: f64,
    /// Number of complete scorecards counted.
    pub vote_count: usize,
    /// The counted scorecards, one per judge, ordered by judge id.
    pub per_judge: Vec<JudgeScore>,
}

impl EntryAggregate {
    /// An entry nobody has finished rating yet.
    pub fn empty() -> Self {
        Self {
            mean_score: 0.0,
            vote_count: 0,
            per_judge: Vec::new(),
        }
    }
}

/// Aggregate an entry's standing from the full scorecard set.
///
/// Only complete scorecards count: a partial card never leaks a low
/// composite into the mean. Scorecards for other entries are ignored, so
/// callers can pass the whole collection.
pub fn aggregate_for_entry(
    entry_id: &EntryId,
    scorecards: &[Scorecard],
    registry: &CriteriaRegistry,
) -> EntryAggregate {
    let mut per_judge: Vec<JudgeScore> = scorecards
        .iter()
        .filter(|card| card.entry_id == *entry_id && card.is_complete(registry))
        .map(|card| JudgeScore {
            judge_id: card.judge_id.clone(),
            score: composite_score(card, registry),
            percentage: percentage(card, registry),
        })
        .collect();
    per_judge.sort_by(|a, b| a.judge_id.cmp(&b.judge_id));

    if per_judge.is_empty() {
        return EntryAggregate::empty();
    }

    let total: u32 = per_judge.iter().map(|j| j.score).sum();
    EntryAggregate {
        mean_score: f64::from(total) / per_judge.len() as f64,
        vote_count: per_judge.len(),
        per_judge,
    }
}
