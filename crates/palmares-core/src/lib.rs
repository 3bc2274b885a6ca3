//! Palmares Core Library
//!
//! Scoring, ranking, and completion tracking for a judged cook-off: judges
//! rate a catalog of dishes against weighted criteria, one criterion at a
//! time, and leaderboards are recomputed live from the submitted scorecards.

pub mod domain;
pub mod export;
pub mod obs;
pub mod progress;
pub mod ranking;
pub mod scoring;
pub mod service;
pub mod telemetry;

pub use domain::{
    CriteriaRegistry, Criterion, Entry, EntryDetails, EntryId, Judge, JudgeId, Mark, ScoreError,
    ScoreResult, Scorecard, Stars, MAX_STARS,
};

pub use export::{export_headers, export_rows, ExportRow};
pub use progress::{
    can_view_final_leaderboard, competition_stats, judge_progress, CompetitionStats, JudgeProgress,
};
pub use ranking::{rank_for_judge, rank_global, JudgeBoardRow, RankedEntry};
pub use scoring::{
    aggregate_for_entry, composite_score, percentage, running_average, EntryAggregate, JudgeScore,
};
pub use service::Competition;

pub use obs::{
    emit_board_computed, emit_catalog_seeded, emit_data_reset, emit_persist_failed,
    emit_score_completed, emit_score_submitted, JudgeSpan,
};
pub use telemetry::init_tracing;

/// Palmares version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
