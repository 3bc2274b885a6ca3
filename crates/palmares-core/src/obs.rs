//! Structured observability hooks for scoring lifecycle events.
//!
//! This module provides:
//! - Judge-scoped tracing spans via `JudgeSpan` RAII guard
//! - Emission functions for key lifecycle events: criterion submitted, card
//!   completed, board recomputed, seed/reset
//!
//! Events are emitted at `info!` level; filtering follows `RUST_LOG` (see
//! [`crate::telemetry::init_tracing`]).

use tracing::{info, warn};

/// RAII guard that enters a judge-scoped tracing span.
///
/// # Example
///
/// ```ignore
/// let _span = JudgeSpan::enter("judge-12345");
/// // All tracing calls now carry judge_id = "judge-12345"
/// ```
pub struct JudgeSpan {
    _span: tracing::span::EnteredSpan,
}

impl JudgeSpan {
    /// Create and enter a span tagged with the judge id.
    pub fn enter(judge_id: &str) -> Self {
        let span = tracing::info_span!("palmares.judge", judge_id = %judge_id);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: one criterion submitted on a scorecard.
pub fn emit_score_submitted(judge_id: &str, entry_id: &str, criterion: &str, stars: u8) {
    info!(
        event = "score.submitted",
        judge_id = %judge_id,
        entry_id = %entry_id,
        criterion = %criterion,
        stars = stars,
    );
}

/// Emit event: a scorecard reached completion.
pub fn emit_score_completed(judge_id: &str, entry_id: &str, score: u32, percentage: f64) {
    info!(
        event = "score.completed",
        judge_id = %judge_id,
        entry_id = %entry_id,
        score = score,
        percentage = percentage,
    );
}

/// Emit event: a leaderboard was recomputed.
pub fn emit_board_computed(total_entries: usize, ranked_entries: usize) {
    info!(
        event = "board.computed",
        total_entries = total_entries,
        ranked_entries = ranked_entries,
    );
}

/// Emit event: demo fixtures loaded into an empty catalog.
pub fn emit_catalog_seeded(entries: usize) {
    info!(event = "catalog.seeded", entries = entries);
}

/// Emit event: all collections cleared.
pub fn emit_data_reset() {
    info!(event = "data.reset");
}

/// Emit event: a store write failed (warning level).
pub fn emit_persist_failed(collection: &str, error: &dyn std::fmt::Display) {
    warn!(event = "store.persist_failed", collection = %collection, error = %error);
}
