//! Domain models for Palmares.
//!
//! Canonical definitions for the core entities:
//! - `CriteriaRegistry`: the weighted criteria a competition scores against
//! - `Entry`: a dish in the catalog
//! - `Judge`: a juror on the panel
//! - `Scorecard`: one judge's incremental rating of one entry

pub mod criterion;
pub mod entry;
pub mod error;
pub mod judge;
pub mod scorecard;

// Re-export main types and errors
pub use criterion::{CriteriaRegistry, Criterion, Stars, MAX_STARS};
pub use entry::{Entry, EntryDetails, EntryId};
pub use error::{ScoreError, ScoreResult};
pub use judge::{Judge, JudgeId};
pub use scorecard::{Mark, Scorecard};
