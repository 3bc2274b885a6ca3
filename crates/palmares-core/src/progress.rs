//! Completion tracking and the final-leaderboard gate.

use serde::Serialize;

use crate::domain::{CriteriaRegistry, Entry, Judge, JudgeId, Scorecard};

/// How far one judge has worked through the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JudgeProgress {
    pub total_entries: usize,
    pub rated_entries: usize,
    pub all_complete: bool,
}

/// Competition-wide coverage, for admin dashboards.
///
/// Only active judges count toward coverage; cards on entries that have left
/// the catalog count toward nothing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompetitionStats {
    pub total_entries: usize,
    pub active_judges: usize,
    pub total_scorecards: usize,
    pub complete_scorecards: usize,
    pub overall_progress_pct: f64,
}

/// Count how many catalog entries this judge has fully rated.
///
/// With an empty catalog `all_complete` is trivially true; the service layer
/// keeps the gate meaningful by rejecting unknown judges before calling in.
pub fn judge_progress(
    judge_id: &JudgeId,
    entries: &[Entry],
    scorecards: &[Scorecard],
    registry: &CriteriaRegistry,
) -> JudgeProgress {
    let rated_entries = entries
        .iter()
        .filter(|entry| {
            scorecards.iter().any(|card| {
                card.judge_id == *judge_id
                    && card.entry_id == entry.id
                    && card.is_complete(registry)
            })
        })
        .count();
    JudgeProgress {
        total_entries: entries.len(),
        rated_entries,
        all_complete: rated_entries == entries.len(),
    }
}

/// Policy gate for the final leaderboard: open once the judge has rated
/// every entry. A boolean query, not an error path.
pub fn can_view_final_leaderboard(
    judge_id: &JudgeId,
    entries: &[Entry],
    scorecards: &[Scorecard],
    registry: &CriteriaRegistry,
) -> bool {
    judge_progress(judge_id, entries, scorecards, registry).all_complete
}

/// Overall coverage across the competition.
///
/// Progress is complete cards over the `entries x active judges` grid, as a
/// percentage; 0 when either side of the grid is empty. Inactive judges keep
/// their historical cards but stop counting toward coverage.
pub fn competition_stats(
    entries: &[Entry],
    judges: &[Judge],
    scorecards: &[Scorecard],
    registry: &CriteriaRegistry,
) -> CompetitionStats {
    let active_judges = judges.iter().filter(|judge| judge.active).count();
    let cataloged: Vec<&Scorecard> = scorecards
        .iter()
        .filter(|card| entries.iter().any(|entry| entry.id == card.entry_id))
        .collect();
    let complete_scorecards = cataloged
        .iter()
        .filter(|card| {
            card.is_complete(registry)
                && judges
                    .iter()
                    .any(|judge| judge.active && judge.id == card.judge_id)
        })
        .count();

    let cells = entries.len() * active_judges;
    let overall_progress_pct = if cells == 0 {
        0.0
    } else {
        complete_scorecards as f64 / cells as f64 * 100.0
    };

    CompetitionStats {
        total_entries: entries.len(),
        active_judges,
        total_scorecards: cataloged.len(),
        complete_scorecards,
        overall_progress_pct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EntryDetails, EntryId, Stars};
    use chrono::Utc;

    fn entry(id: &str) -> Entry {
        Entry {
            id: EntryId(id.to_string()),
            name: format!("Prato {id}"),
            details: EntryDetails::new("Cozinha Teste"),
            created_at: Utc::now(),
        }
    }

    fn judge(id: &str, active: bool) -> Judge {
        let mut judge = Judge::new(format!("Jurado {id}"), Utc::now());
        judge.id = JudgeId(id.to_string());
        judge.active = active;
        judge
    }

    fn complete_card(judge: &str, entry_id: &str) -> Scorecard {
        let registry = CriteriaRegistry::standard();
        let mut card = Scorecard::new(
            JudgeId(judge.to_string()),
            EntryId(entry_id.to_string()),
            Utc::now(),
        );
        for criterion in registry.criteria() {
            card.submit(&registry, &criterion.key, Stars::new(3).unwrap(), Utc::now())
                .unwrap();
        }
        card
    }

    #[test]
    fn five_of_six_keeps_the_gate_closed() {
        let registry = CriteriaRegistry::standard();
        let entries: Vec<Entry> = (1..=6).map(|i| entry(&format!("e-{i}"))).collect();
        let cards: Vec<Scorecard> = (1..=5)
            .map(|i| complete_card("j-1", &format!("e-{i}")))
            .collect();
        let judge_id = JudgeId("j-1".to_string());

        let progress = judge_progress(&judge_id, &entries, &cards, &registry);
        assert_eq!(progress.rated_entries, 5);
        assert_eq!(progress.total_entries, 6);
        assert!(!progress.all_complete);
        assert!(!can_view_final_leaderboard(
            &judge_id, &entries, &cards, &registry
        ));
    }

    #[test]
    fn gate_opens_on_the_last_entry() {
        let registry = CriteriaRegistry::standard();
        let entries = vec![entry("e-1"), entry("e-2")];
        let cards = vec![complete_card("j-1", "e-1"), complete_card("j-1", "e-2")];
        let judge_id = JudgeId("j-1".to_string());

        assert!(can_view_final_leaderboard(
            &judge_id, &entries, &cards, &registry
        ));
    }

    #[test]
    fn partial_cards_do_not_count_as_rated() {
        let registry = CriteriaRegistry::standard();
        let entries = vec![entry("e-1")];
        let judge_id = JudgeId("j-1".to_string());
        let mut partial = Scorecard::new(judge_id.clone(), EntryId("e-1".to_string()), Utc::now());
        partial
            .submit(&registry, "sabor", Stars::new(4).unwrap(), Utc::now())
            .unwrap();

        let progress = judge_progress(&judge_id, &entries, &[partial], &registry);
        assert_eq!(progress.rated_entries, 0);
    }

    #[test]
    fn stats_cover_the_judge_entry_grid() {
        let registry = CriteriaRegistry::standard();
        let entries = vec![entry("e-1"), entry("e-2")];
        let judges = vec![judge("j-1", true), judge("j-2", true)];
        let cards = vec![complete_card("j-1", "e-1"), complete_card("j-1", "e-2")];

        let stats = competition_stats(&entries, &judges, &cards, &registry);
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.active_judges, 2);
        assert_eq!(stats.complete_scorecards, 2);
        assert_eq!(stats.overall_progress_pct, 50.0);
    }

    #[test]
    fn inactive_judges_leave_the_grid() {
        let registry = CriteriaRegistry::standard();
        let entries = vec![entry("e-1")];
        let judges = vec![judge("j-1", true), judge("j-2", false)];
        let cards = vec![complete_card("j-1", "e-1"), complete_card("j-2", "e-1")];

        let stats = competition_stats(&entries, &judges, &cards, &registry);
        assert_eq!(stats.active_judges, 1);
        // The inactive judge's card is kept but no longer counts.
        assert_eq!(stats.total_scorecards, 2);
        assert_eq!(stats.complete_scorecards, 1);
        assert_eq!(stats.overall_progress_pct, 100.0);
    }

    #[test]
    fn empty_grid_reports_zero_progress() {
        let registry = CriteriaRegistry::standard();
        let stats = competition_stats(&[], &[judge("j-1", true)], &[], &registry);
        assert_eq!(stats.overall_progress_pct, 0.0);
    }
}
