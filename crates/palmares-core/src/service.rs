//! The competition service: one handle over the catalog, the judges, and
//! every scorecard, backed by a pluggable store.
//!
//! `Competition` keeps a full in-memory image of the three collections and
//! writes through to the injected [`CollectionStore`] before committing any
//! change to that image. A failed store write therefore leaves memory exactly
//! as it was; callers see the error and nothing else changes.
//!
//! Reads are lock-cheap snapshots; writes are serialized through a single
//! async mutex so the completion flag of a scorecard becomes visible in the
//! same step as its final mark.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use palmares_state::{Collection, CollectionStore, StoredRecord};
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::{
    CriteriaRegistry, Entry, EntryDetails, EntryId, Judge, JudgeId, ScoreError, ScoreResult,
    Scorecard, Stars,
};
use crate::export::{self, ExportRow};
use crate::obs;
use crate::progress::{self, CompetitionStats, JudgeProgress};
use crate::ranking::{self, JudgeBoardRow, RankedEntry};
use crate::scoring::{self, EntryAggregate};

/// Long-lived competition state over a persistence backend.
pub struct Competition<S> {
    store: S,
    registry: CriteriaRegistry,
    entries: RwLock<HashMap<EntryId, Entry>>,
    judges: RwLock<HashMap<JudgeId, Judge>>,
    /// Keyed by [`Scorecard::storage_id`].
    scorecards: RwLock<HashMap<String, Scorecard>>,
    /// Serializes every write-through with its in-memory commit.
    write_serial: Mutex<()>,
}

impl<S> Competition<S>
where
    S: CollectionStore,
{
    /// Load all three collections from the store and build the service.
    pub async fn open(store: S, registry: CriteriaRegistry) -> ScoreResult<Self> {
        let (entry_records, judge_records, card_records) = tokio::try_join!(
            store.load_all(Collection::Entries),
            store.load_all(Collection::Judges),
            store.load_all(Collection::Scorecards),
        )?;

        let entries = decode_entries(entry_records)?;
        let judges = decode_judges(judge_records)?;
        let scorecards = decode_scorecards(card_records)?;
        debug!(
            entries = entries.len(),
            judges = judges.len(),
            scorecards = scorecards.len(),
            "competition state loaded"
        );

        Ok(Self {
            store,
            registry,
            entries: RwLock::new(entries),
            judges: RwLock::new(judges),
            scorecards: RwLock::new(scorecards),
            write_serial: Mutex::new(()),
        })
    }

    /// Re-read all collections from the store, replacing the in-memory image.
    pub async fn reload(&self) -> ScoreResult<()> {
        let _serial = self.write_serial.lock().await;
        let (entry_records, judge_records, card_records) = tokio::try_join!(
            self.store.load_all(Collection::Entries),
            self.store.load_all(Collection::Judges),
            self.store.load_all(Collection::Scorecards),
        )?;

        *self.entries.write().unwrap() = decode_entries(entry_records)?;
        *self.judges.write().unwrap() = decode_judges(judge_records)?;
        *self.scorecards.write().unwrap() = decode_scorecards(card_records)?;
        Ok(())
    }

    pub fn registry(&self) -> &CriteriaRegistry {
        &self.registry
    }

    // -----------------------------------------------------------------------
    // Submission
    // -----------------------------------------------------------------------

    /// Record one criterion's stars on a (judge, entry) scorecard.
    ///
    /// The card is created lazily on its first criterion. Each criterion can
    /// be set exactly once; a second submission fails with
    /// [`ScoreError::AlreadySubmitted`] and leaves the first value in place.
    /// The updated card is persisted before the in-memory image moves, so a
    /// storage failure changes nothing.
    pub async fn submit_criterion(
        &self,
        judge_id: &JudgeId,
        entry_id: &EntryId,
        criterion: &str,
        stars: u8,
        now: DateTime<Utc>,
    ) -> ScoreResult<Scorecard> {
        let stars = Stars::new(stars)?;
        let _serial = self.write_serial.lock().await;

        if !self.judges.read().unwrap().contains_key(judge_id) {
            return Err(ScoreError::UnknownJudge(judge_id.clone()));
        }
        if !self.entries.read().unwrap().contains_key(entry_id) {
            return Err(ScoreError::UnknownEntry(entry_id.clone()));
        }

        let key = Scorecard::storage_id(judge_id, entry_id);
        let mut card = self
            .scorecards
            .read()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Scorecard::new(judge_id.clone(), entry_id.clone(), now));
        card.submit(&self.registry, criterion, stars, now)?;

        let record = StoredRecord::encode(card.record_id(), &card)?;
        if let Err(err) = self.store.upsert(Collection::Scorecards, record).await {
            obs::emit_persist_failed(Collection::Scorecards.name(), &err);
            return Err(err.into());
        }
        self.scorecards.write().unwrap().insert(key, card.clone());

        obs::emit_score_submitted(&judge_id.0, &entry_id.0, criterion, stars.value());
        if card.is_complete(&self.registry) {
            obs::emit_score_completed(
                &judge_id.0,
                &entry_id.0,
                scoring::composite_score(&card, &self.registry),
                scoring::percentage(&card, &self.registry),
            );
        }
        Ok(card)
    }

    // -----------------------------------------------------------------------
    // Rating queries
    // -----------------------------------------------------------------------

    /// Stars a judge gave one criterion, if submitted.
    pub fn get_rating(
        &self,
        judge_id: &JudgeId,
        entry_id: &EntryId,
        criterion: &str,
    ) -> Option<Stars> {
        self.scorecards
            .read()
            .unwrap()
            .get(&Scorecard::storage_id(judge_id, entry_id))
            .and_then(|card| card.mark(criterion).map(|mark| mark.stars))
    }

    /// The full scorecard for a (judge, entry) pair, if it exists.
    pub fn scorecard(&self, judge_id: &JudgeId, entry_id: &EntryId) -> Option<Scorecard> {
        self.scorecards
            .read()
            .unwrap()
            .get(&Scorecard::storage_id(judge_id, entry_id))
            .cloned()
    }

    /// Whether every criterion is set on the (judge, entry) card.
    pub fn is_complete(&self, judge_id: &JudgeId, entry_id: &EntryId) -> bool {
        self.scorecards
            .read()
            .unwrap()
            .get(&Scorecard::storage_id(judge_id, entry_id))
            .map(|card| card.is_complete(&self.registry))
            .unwrap_or(false)
    }

    /// How many criteria are set on the (judge, entry) card.
    pub fn count_submitted(&self, judge_id: &JudgeId, entry_id: &EntryId) -> usize {
        self.scorecards
            .read()
            .unwrap()
            .get(&Scorecard::storage_id(judge_id, entry_id))
            .map(|card| card.submitted_count())
            .unwrap_or(0)
    }

    /// Mean stars over the criteria a judge has set so far; 0 with none.
    pub fn running_average(&self, judge_id: &JudgeId, entry_id: &EntryId) -> f64 {
        self.scorecards
            .read()
            .unwrap()
            .get(&Scorecard::storage_id(judge_id, entry_id))
            .map(scoring::running_average)
            .unwrap_or(0.0)
    }

    /// All scorecards on one entry, complete or not, ordered by judge id.
    pub fn ratings_for_entry(&self, entry_id: &EntryId) -> Vec<Scorecard> {
        let mut cards: Vec<Scorecard> = self
            .scorecards
            .read()
            .unwrap()
            .values()
            .filter(|card| card.entry_id == *entry_id)
            .cloned()
            .collect();
        cards.sort_by(|a, b| a.judge_id.cmp(&b.judge_id));
        cards
    }

    /// All scorecards by one judge, complete or not, ordered by entry id.
    pub fn ratings_for_judge(&self, judge_id: &JudgeId) -> Vec<Scorecard> {
        let mut cards: Vec<Scorecard> = self
            .scorecards
            .read()
            .unwrap()
            .values()
            .filter(|card| card.judge_id == *judge_id)
            .cloned()
            .collect();
        cards.sort_by(|a, b| a.entry_id.cmp(&b.entry_id));
        cards
    }

    // -----------------------------------------------------------------------
    // Boards and progress
    // -----------------------------------------------------------------------

    /// Cross-judge aggregate for one catalog entry.
    pub fn aggregate_for_entry(&self, entry_id: &EntryId) -> ScoreResult<EntryAggregate> {
        if !self.entries.read().unwrap().contains_key(entry_id) {
            return Err(ScoreError::UnknownEntry(entry_id.clone()));
        }
        Ok(scoring::aggregate_for_entry(
            entry_id,
            &self.snapshot_cards(),
            &self.registry,
        ))
    }

    /// The global leaderboard over the current state.
    pub fn rank_global(&self) -> Vec<RankedEntry> {
        let board = ranking::rank_global(
            &self.snapshot_entries(),
            &self.snapshot_cards(),
            &self.registry,
        );
        let ranked = board.iter().filter(|row| row.rank.is_some()).count();
        obs::emit_board_computed(board.len(), ranked);
        board
    }

    /// One judge's personal board over the whole catalog.
    pub fn rank_for_judge(&self, judge_id: &JudgeId) -> ScoreResult<Vec<JudgeBoardRow>> {
        if !self.judges.read().unwrap().contains_key(judge_id) {
            return Err(ScoreError::UnknownJudge(judge_id.clone()));
        }
        Ok(ranking::rank_for_judge(
            judge_id,
            &self.snapshot_entries(),
            &self.snapshot_cards(),
            &self.registry,
        ))
    }

    /// How far one judge has worked through the catalog.
    pub fn judge_progress(&self, judge_id: &JudgeId) -> ScoreResult<JudgeProgress> {
        if !self.judges.read().unwrap().contains_key(judge_id) {
            return Err(ScoreError::UnknownJudge(judge_id.clone()));
        }
        Ok(progress::judge_progress(
            judge_id,
            &self.snapshot_entries(),
            &self.snapshot_cards(),
            &self.registry,
        ))
    }

    /// Final-leaderboard gate: open once the judge has rated every entry.
    pub fn can_view_final_leaderboard(&self, judge_id: &JudgeId) -> ScoreResult<bool> {
        Ok(self.judge_progress(judge_id)?.all_complete)
    }

    /// Competition-wide coverage numbers.
    pub fn competition_stats(&self) -> CompetitionStats {
        progress::competition_stats(
            &self.snapshot_entries(),
            &self.snapshot_judges(),
            &self.snapshot_cards(),
            &self.registry,
        )
    }

    // -----------------------------------------------------------------------
    // Export
    // -----------------------------------------------------------------------

    /// Flat standings rows, one per complete scorecard, in board order.
    pub fn export_rows(&self) -> Vec<ExportRow> {
        export::export_rows(
            &self.snapshot_entries(),
            &self.snapshot_judges(),
            &self.snapshot_cards(),
            &self.registry,
        )
    }

    /// Header line matching [`Competition::export_rows`].
    pub fn export_headers(&self) -> Vec<String> {
        export::export_headers(&self.registry)
    }

    // -----------------------------------------------------------------------
    // Catalog administration
    // -----------------------------------------------------------------------

    pub fn entries(&self) -> Vec<Entry> {
        let mut entries = self.snapshot_entries();
        entries.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        entries
    }

    pub fn judges(&self) -> Vec<Judge> {
        let mut judges = self.snapshot_judges();
        judges.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        judges
    }

    pub fn entry(&self, id: &EntryId) -> Option<Entry> {
        self.entries.read().unwrap().get(id).cloned()
    }

    pub fn judge(&self, id: &JudgeId) -> Option<Judge> {
        self.judges.read().unwrap().get(id).cloned()
    }

    /// Add a dish to the catalog.
    pub async fn add_entry(
        &self,
        name: impl Into<String>,
        details: EntryDetails,
        now: DateTime<Utc>,
    ) -> ScoreResult<Entry> {
        let entry = Entry::new(name, details, now);
        let _serial = self.write_serial.lock().await;

        let record = StoredRecord::encode(entry.id.0.clone(), &entry)?;
        self.store.upsert(Collection::Entries, record).await?;
        self.entries
            .write()
            .unwrap()
            .insert(entry.id.clone(), entry.clone());
        Ok(entry)
    }

    /// Rename or re-describe an entry, keeping its id and creation time.
    pub async fn update_entry(
        &self,
        id: &EntryId,
        name: impl Into<String>,
        details: EntryDetails,
    ) -> ScoreResult<Entry> {
        let _serial = self.write_serial.lock().await;
        let mut entry = self
            .entries
            .read()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| ScoreError::UnknownEntry(id.clone()))?;
        entry.name = name.into();
        entry.details = details;

        let record = StoredRecord::encode(entry.id.0.clone(), &entry)?;
        self.store.upsert(Collection::Entries, record).await?;
        self.entries
            .write()
            .unwrap()
            .insert(id.clone(), entry.clone());
        Ok(entry)
    }

    /// Remove an entry from the catalog.
    ///
    /// Scorecards on the entry are left in the store; boards and stats skip
    /// them because they only walk the catalog.
    pub async fn remove_entry(&self, id: &EntryId) -> ScoreResult<()> {
        let _serial = self.write_serial.lock().await;
        if !self.entries.read().unwrap().contains_key(id) {
            return Err(ScoreError::UnknownEntry(id.clone()));
        }
        self.store.delete(Collection::Entries, &id.0).await?;
        self.entries.write().unwrap().remove(id);
        Ok(())
    }

    /// Register a judge. New judges start active.
    pub async fn add_judge(
        &self,
        name: impl Into<String>,
        city: Option<String>,
        panel: Option<String>,
        now: DateTime<Utc>,
    ) -> ScoreResult<Judge> {
        let mut judge = Judge::new(name, now);
        if let Some(city) = city {
            judge = judge.with_city(city);
        }
        if let Some(panel) = panel {
            judge = judge.with_panel(panel);
        }
        let _serial = self.write_serial.lock().await;

        let record = StoredRecord::encode(judge.id.0.clone(), &judge)?;
        self.store.upsert(Collection::Judges, record).await?;
        self.judges
            .write()
            .unwrap()
            .insert(judge.id.clone(), judge.clone());
        Ok(judge)
    }

    /// Activate or deactivate a judge.
    ///
    /// Deactivation removes the judge from coverage and gating but keeps
    /// every scorecard they submitted.
    pub async fn set_judge_active(&self, id: &JudgeId, active: bool) -> ScoreResult<Judge> {
        let _serial = self.write_serial.lock().await;
        let mut judge = self
            .judges
            .read()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| ScoreError::UnknownJudge(id.clone()))?;
        judge.active = active;

        let record = StoredRecord::encode(judge.id.0.clone(), &judge)?;
        self.store.upsert(Collection::Judges, record).await?;
        self.judges
            .write()
            .unwrap()
            .insert(id.clone(), judge.clone());
        Ok(judge)
    }

    /// Remove a judge and every scorecard they submitted.
    pub async fn remove_judge(&self, id: &JudgeId) -> ScoreResult<()> {
        let _serial = self.write_serial.lock().await;
        if !self.judges.read().unwrap().contains_key(id) {
            return Err(ScoreError::UnknownJudge(id.clone()));
        }
        let card_ids: Vec<String> = self
            .scorecards
            .read()
            .unwrap()
            .values()
            .filter(|card| card.judge_id == *id)
            .map(|card| card.record_id())
            .collect();

        for card_id in &card_ids {
            self.store.delete(Collection::Scorecards, card_id).await?;
        }
        self.store.delete(Collection::Judges, &id.0).await?;

        {
            let mut cards = self.scorecards.write().unwrap();
            for card_id in &card_ids {
                cards.remove(card_id);
            }
        }
        self.judges.write().unwrap().remove(id);
        Ok(())
    }

    /// Clear every collection, store and memory both.
    pub async fn reset_all(&self) -> ScoreResult<()> {
        let _serial = self.write_serial.lock().await;
        self.store.clear(Collection::Scorecards).await?;
        self.store.clear(Collection::Judges).await?;
        self.store.clear(Collection::Entries).await?;

        self.scorecards.write().unwrap().clear();
        self.judges.write().unwrap().clear();
        self.entries.write().unwrap().clear();
        obs::emit_data_reset();
        Ok(())
    }

    /// Load the demo dish catalog into an empty competition.
    ///
    /// Returns how many entries were added; 0 (and no writes) when the
    /// catalog already has entries.
    pub async fn seed_demo(&self, now: DateTime<Utc>) -> ScoreResult<usize> {
        let _serial = self.write_serial.lock().await;
        if !self.entries.read().unwrap().is_empty() {
            return Ok(0);
        }

        let fixtures = demo_entries(now);
        for entry in &fixtures {
            let record = StoredRecord::encode(entry.id.0.clone(), entry)?;
            self.store.upsert(Collection::Entries, record).await?;
        }
        {
            let mut entries = self.entries.write().unwrap();
            for entry in &fixtures {
                entries.insert(entry.id.clone(), entry.clone());
            }
        }
        obs::emit_catalog_seeded(fixtures.len());
        Ok(fixtures.len())
    }

    // -----------------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------------

    fn snapshot_entries(&self) -> Vec<Entry> {
        self.entries.read().unwrap().values().cloned().collect()
    }

    fn snapshot_judges(&self) -> Vec<Judge> {
        self.judges.read().unwrap().values().cloned().collect()
    }

    fn snapshot_cards(&self) -> Vec<Scorecard> {
        self.scorecards.read().unwrap().values().cloned().collect()
    }
}

fn decode_entries(records: Vec<StoredRecord>) -> ScoreResult<HashMap<EntryId, Entry>> {
    let mut map = HashMap::with_capacity(records.len());
    for record in records {
        let entry: Entry = record.decode(Collection::Entries)?;
        map.insert(entry.id.clone(), entry);
    }
    Ok(map)
}

fn decode_judges(records: Vec<StoredRecord>) -> ScoreResult<HashMap<JudgeId, Judge>> {
    let mut map = HashMap::with_capacity(records.len());
    for record in records {
        let judge: Judge = record.decode(Collection::Judges)?;
        map.insert(judge.id.clone(), judge);
    }
    Ok(map)
}

fn decode_scorecards(records: Vec<StoredRecord>) -> ScoreResult<HashMap<String, Scorecard>> {
    let mut map = HashMap::with_capacity(records.len());
    for record in records {
        let card: Scorecard = record.decode(Collection::Scorecards)?;
        map.insert(card.record_id(), card);
    }
    Ok(map)
}

/// The six demo dishes from the launch event.
fn demo_entries(now: DateTime<Utc>) -> Vec<Entry> {
    vec![
        Entry::new(
            "Frango Assado com Batatas",
            EntryDetails::new("Casa da Feijoada")
                .with_category("Prato Principal")
                .with_description(
                    "Frango assado dourado com batatas e cebolas caramelizadas, \
                     temperado com ervas finas",
                ),
            now,
        ),
        Entry::new(
            "Café da Manhã Inglês Completo",
            EntryDetails::new("Sabores Internacionais")
                .with_category("Café da Manhã")
                .with_description(
                    "Café da manhã tradicional inglês com ovos, bacon, linguiça, \
                     feijão e cogumelos",
                ),
            now,
        ),
        Entry::new(
            "Salada Caesar com Camarão",
            EntryDetails::new("Tempero da Bahia")
                .with_category("Salada")
                .with_description(
                    "Salada caesar clássica com camarões grelhados, parmesão e \
                     croutons artesanais",
                ),
            now,
        ),
        Entry::new(
            "Sopa Oriental de Ervilha",
            EntryDetails::new("Pantanal Gourmet")
                .with_category("Sopa")
                .with_description(
                    "Sopa oriental cremosa de ervilha com carne e vegetais frescos \
                     da estação",
                ),
            now,
        ),
        Entry::new(
            "Penne com Molho de Tomate",
            EntryDetails::new("Cozinha do Sertão")
                .with_category("Massa")
                .with_description(
                    "Macarrão penne al dente com molho de tomate artesanal, carne \
                     e queijo parmesão",
                ),
            now,
        ),
        Entry::new(
            "Salada Caesar Gourmet",
            EntryDetails::new("Amazônia Autêntica")
                .with_category("Salada")
                .with_description(
                    "Salada caesar premium com frango grelhado, tomates frescos e \
                     molho especial",
                ),
            now,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use palmares_state::MemoryStore;

    async fn fresh() -> Competition<MemoryStore> {
        Competition::open(MemoryStore::new(), CriteriaRegistry::standard())
            .await
            .expect("open")
    }

    #[tokio::test]
    async fn open_on_empty_store_starts_blank() {
        let competition = fresh().await;
        assert!(competition.entries().is_empty());
        assert!(competition.judges().is_empty());
        assert_eq!(competition.competition_stats().total_scorecards, 0);
    }

    #[tokio::test]
    async fn submit_requires_known_judge_and_entry() {
        let competition = fresh().await;
        let entry = competition
            .add_entry("Feijoada", EntryDetails::new("Casa da Feijoada"), Utc::now())
            .await
            .expect("add entry");

        let ghost = JudgeId("ghost".to_string());
        let err = competition
            .submit_criterion(&ghost, &entry.id, "sabor", 5, Utc::now())
            .await
            .expect_err("unknown judge");
        assert!(matches!(err, ScoreError::UnknownJudge(_)));

        let judge = competition
            .add_judge("Maria", None, None, Utc::now())
            .await
            .expect("add judge");
        let missing = EntryId("missing".to_string());
        let err = competition
            .submit_criterion(&judge.id, &missing, "sabor", 5, Utc::now())
            .await
            .expect_err("unknown entry");
        assert!(matches!(err, ScoreError::UnknownEntry(_)));
    }

    #[tokio::test]
    async fn submissions_survive_a_reopen() {
        let store = MemoryStore::new();
        let judge_id;
        let entry_id;
        {
            let competition = Competition::open(store.clone(), CriteriaRegistry::standard())
                .await
                .expect("open");
            let entry = competition
                .add_entry("Penne", EntryDetails::new("Cozinha do Sertão"), Utc::now())
                .await
                .expect("add entry");
            let judge = competition
                .add_judge("João", None, None, Utc::now())
                .await
                .expect("add judge");
            competition
                .submit_criterion(&judge.id, &entry.id, "sabor", 4, Utc::now())
                .await
                .expect("submit");
            judge_id = judge.id;
            entry_id = entry.id;
        }

        let reopened = Competition::open(store, CriteriaRegistry::standard())
            .await
            .expect("reopen");
        let stars = reopened
            .get_rating(&judge_id, &entry_id, "sabor")
            .expect("rating survives");
        assert_eq!(stars.value(), 4);
        assert_eq!(reopened.count_submitted(&judge_id, &entry_id), 1);
    }

    #[tokio::test]
    async fn seed_demo_is_a_no_op_on_a_populated_catalog() {
        let competition = fresh().await;
        let seeded = competition.seed_demo(Utc::now()).await.expect("seed");
        assert_eq!(seeded, 6);
        let again = competition.seed_demo(Utc::now()).await.expect("seed again");
        assert_eq!(again, 0);
        assert_eq!(competition.entries().len(), 6);
    }

    #[tokio::test]
    async fn remove_judge_cascades_to_their_cards() {
        let competition = fresh().await;
        let entry = competition
            .add_entry("Sopa", EntryDetails::new("Pantanal Gourmet"), Utc::now())
            .await
            .expect("add entry");
        let judge = competition
            .add_judge("Ana", None, None, Utc::now())
            .await
            .expect("add judge");
        competition
            .submit_criterion(&judge.id, &entry.id, "sabor", 3, Utc::now())
            .await
            .expect("submit");

        competition.remove_judge(&judge.id).await.expect("remove");
        assert!(competition.judge(&judge.id).is_none());
        assert!(competition.ratings_for_entry(&entry.id).is_empty());
    }
}
