//! Flat export of the final standings.
//!
//! One row per (entry, judge) pair with a complete scorecard, in leaderboard
//! order. The core builds the rows and the header line; serializing them to
//! CSV or anything else is the caller's concern.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{CriteriaRegistry, Entry, Judge, Scorecard};
use crate::ranking;
use crate::scoring;

/// One export row: an entry's standing as seen through one judge's card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    /// Dense rank of the entry on the global board.
    pub position: u32,
    pub entry_name: String,
    pub kitchen: String,
    pub judge_name: String,
    /// Weighted points per criterion, in registry order.
    pub criterion_points: Vec<u32>,
    pub composite_score: u32,
    pub percentage: f64,
    /// When the card became complete (last criterion submitted).
    pub rated_at: DateTime<Utc>,
}

/// Header line matching [`export_rows`] output, criteria labels in registry
/// order between the fixed columns.
pub fn export_headers(registry: &CriteriaRegistry) -> Vec<String> {
    let mut headers = vec![
        "Posição".to_string(),
        "Prato".to_string(),
        "Cozinha".to_string(),
        "Jurado".to_string(),
    ];
    headers.extend(registry.criteria().iter().map(|c| c.label.clone()));
    headers.push("Pontuação Final".to_string());
    headers.push("Percentual".to_string());
    headers.push("Data Avaliação".to_string());
    headers
}

/// Flatten the ranked board into rows, one per complete scorecard.
///
/// Unranked entries and partial cards produce no rows. Within an entry the
/// rows follow judge id order, so the export is stable across calls.
pub fn export_rows(
    entries: &[Entry],
    judges: &[Judge],
    scorecards: &[Scorecard],
    registry: &CriteriaRegistry,
) -> Vec<ExportRow> {
    let board = ranking::rank_global(entries, scorecards, registry);
    let mut rows = Vec::new();

    for ranked in board {
        let Some(position) = ranked.rank else {
            continue;
        };
        let mut cards: Vec<&Scorecard> = scorecards
            .iter()
            .filter(|card| card.entry_id == ranked.entry.id && card.is_complete(registry))
            .collect();
        cards.sort_by(|a, b| a.judge_id.cmp(&b.judge_id));

        for card in cards {
            let judge_name = judges
                .iter()
                .find(|judge| judge.id == card.judge_id)
                .map(|judge| judge.name.clone())
                .unwrap_or_else(|| card.judge_id.to_string());
            let criterion_points = registry
                .criteria()
                .iter()
                .map(|criterion| match card.mark(&criterion.key) {
                    Some(mark) => u32::from(mark.stars.value()) * criterion.weight,
                    None => 0,
                })
                .collect();
            let rated_at = card
                .marks
                .values()
                .map(|mark| mark.submitted_at)
                .max()
                .unwrap_or(card.created_at);

            rows.push(ExportRow {
                position,
                entry_name: ranked.entry.name.clone(),
                kitchen: ranked.entry.details.kitchen.clone(),
                judge_name,
                criterion_points,
                composite_score: scoring::composite_score(card, registry),
                percentage: scoring::percentage(card, registry),
                rated_at,
            });
        }
    }
    rows
}
