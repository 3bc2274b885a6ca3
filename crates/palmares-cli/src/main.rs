//! Palmares - cook-off scoring CLI
//!
//! The `palmares` command runs a judged cooking competition: the dish
//! catalog, the judge panel, criterion-by-criterion score submission, and
//! live leaderboards recomputed from the submitted scorecards.
//!
//! ## Commands
//!
//! - `entry`: manage the dish catalog
//! - `judge`: manage the judge panel
//! - `submit`: record one criterion's stars for a (judge, entry) pair
//! - `scorecard`: show one judge's card for an entry
//! - `board`: leaderboards (global, per judge, gated final)
//! - `progress` / `stats`: completion tracking
//! - `export`: CSV of the final standings
//! - `seed` / `reset`: demo fixtures and full data reset

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::Level;

use palmares_core::{
    composite_score, percentage, running_average, Competition, CriteriaRegistry, EntryDetails,
    EntryId, ExportRow, JudgeId, JudgeSpan,
};
use palmares_state::{
    CollectionStore, HttpStore, HybridStore, JsonFileStore, MemoryStore, RemoteConfig,
};

#[derive(Parser)]
#[command(name = "palmares")]
#[command(author = "Palmares Maintainers")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Scoring and live ranking for judged cook-offs", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Directory for the on-disk JSON store
    #[arg(long, global = true, env = "PALMARES_DATA_DIR", default_value = ".palmares")]
    data_dir: PathBuf,

    /// Remote scoring API base URL; enables the remote-first hybrid store
    #[arg(long, global = true, env = "PALMARES_REMOTE_URL")]
    remote: Option<String>,

    /// Bearer token for the remote API
    #[arg(long, global = true, env = "PALMARES_REMOTE_TOKEN")]
    token: Option<String>,

    /// Talk to the remote only, skipping the on-disk cache
    #[arg(long, global = true)]
    no_cache: bool,

    /// Keep all state in memory (discarded on exit)
    #[arg(long, global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the dish catalog
    Entry {
        #[command(subcommand)]
        action: EntryAction,
    },

    /// Manage the judge panel
    Judge {
        #[command(subcommand)]
        action: JudgeAction,
    },

    /// List the scoring criteria and their weights
    Criteria,

    /// Record one criterion's stars for a (judge, entry) pair
    Submit {
        /// Judge id
        #[arg(long)]
        judge: String,

        /// Entry id
        #[arg(long)]
        entry: String,

        /// Criterion key (e.g. "sabor")
        #[arg(long)]
        criterion: String,

        /// Stars, 1 to 5
        #[arg(long)]
        stars: u8,
    },

    /// Show one judge's scorecard for an entry
    Scorecard {
        /// Judge id
        #[arg(long)]
        judge: String,

        /// Entry id
        #[arg(long)]
        entry: String,
    },

    /// Leaderboards
    Board {
        #[command(subcommand)]
        action: BoardAction,
    },

    /// Show how far a judge has worked through the catalog
    Progress {
        /// Judge id
        judge: String,
    },

    /// Competition-wide coverage numbers
    Stats {
        /// Emit JSON instead of terminal text
        #[arg(long)]
        json: bool,
    },

    /// Export the final standings as CSV
    Export {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Load the demo dish catalog into an empty competition
    Seed,

    /// Delete every entry, judge, and scorecard
    Reset {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum EntryAction {
    /// Add a dish
    Add {
        /// Dish name
        name: String,

        /// Kitchen or restaurant presenting the dish
        #[arg(long)]
        kitchen: String,

        /// Category (e.g. "Prato Principal")
        #[arg(long)]
        category: Option<String>,

        /// Free-form description
        #[arg(long)]
        description: Option<String>,
    },

    /// Rename or re-describe a dish, keeping its id and scorecards
    Update {
        /// Entry id
        id: String,

        /// New dish name
        #[arg(long)]
        name: String,

        /// New kitchen
        #[arg(long)]
        kitchen: String,

        /// New category
        #[arg(long)]
        category: Option<String>,

        /// New description
        #[arg(long)]
        description: Option<String>,
    },

    /// Remove a dish from the catalog
    Remove {
        /// Entry id
        id: String,
    },

    /// List the catalog
    List,
}

#[derive(Subcommand)]
enum JudgeAction {
    /// Register a judge (starts active)
    Add {
        /// Judge name
        name: String,

        /// Home city
        #[arg(long)]
        city: Option<String>,

        /// Panel (e.g. "Júri Técnico Local")
        #[arg(long)]
        panel: Option<String>,
    },

    /// List the panel
    List,

    /// Re-activate a judge
    Activate {
        /// Judge id
        id: String,
    },

    /// Deactivate a judge, keeping their scorecards
    Deactivate {
        /// Judge id
        id: String,
    },

    /// Remove a judge and every scorecard they submitted
    Remove {
        /// Judge id
        id: String,
    },
}

#[derive(Subcommand)]
enum BoardAction {
    /// Global leaderboard over all complete scorecards
    Global {
        /// Emit JSON instead of terminal text
        #[arg(long)]
        json: bool,
    },

    /// One judge's personal board
    Judge {
        /// Judge id
        id: String,
    },

    /// Final leaderboard, gated on the judge having rated every entry
    Final {
        /// Judge requesting the final board
        #[arg(long)]
        judge: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    palmares_core::init_tracing(cli.json, level);

    let store = build_store(&cli)?;
    let competition = Competition::open(store, CriteriaRegistry::standard())
        .await
        .context("Failed to load competition state")?;

    match cli.command {
        Commands::Entry { action } => match action {
            EntryAction::Add {
                name,
                kitchen,
                category,
                description,
            } => cmd_entry_add(&competition, &name, kitchen, category, description).await,
            EntryAction::Update {
                id,
                name,
                kitchen,
                category,
                description,
            } => cmd_entry_update(&competition, &id, &name, kitchen, category, description).await,
            EntryAction::Remove { id } => cmd_entry_remove(&competition, &id).await,
            EntryAction::List => cmd_entry_list(&competition),
        },
        Commands::Judge { action } => match action {
            JudgeAction::Add { name, city, panel } => {
                cmd_judge_add(&competition, &name, city, panel).await
            }
            JudgeAction::List => cmd_judge_list(&competition),
            JudgeAction::Activate { id } => cmd_judge_set_active(&competition, &id, true).await,
            JudgeAction::Deactivate { id } => cmd_judge_set_active(&competition, &id, false).await,
            JudgeAction::Remove { id } => cmd_judge_remove(&competition, &id).await,
        },
        Commands::Criteria => cmd_criteria(&competition),
        Commands::Submit {
            judge,
            entry,
            criterion,
            stars,
        } => cmd_submit(&competition, &judge, &entry, &criterion, stars).await,
        Commands::Scorecard { judge, entry } => cmd_scorecard(&competition, &judge, &entry),
        Commands::Board { action } => match action {
            BoardAction::Global { json } => cmd_board_global(&competition, json),
            BoardAction::Judge { id } => cmd_board_judge(&competition, &id),
            BoardAction::Final { judge } => cmd_board_final(&competition, &judge),
        },
        Commands::Progress { judge } => cmd_progress(&competition, &judge),
        Commands::Stats { json } => cmd_stats(&competition, json),
        Commands::Export { output } => cmd_export(&competition, output.as_deref()),
        Commands::Seed => cmd_seed(&competition).await,
        Commands::Reset { yes } => cmd_reset(&competition, yes).await,
    }
}

/// Pick the store backend from the CLI flags.
///
/// Default is the on-disk JSON store; a configured remote switches to the
/// remote-first hybrid (remote primary, disk cache) unless `--no-cache`
/// drops the cache.
fn build_store(cli: &Cli) -> Result<Box<dyn CollectionStore>> {
    if cli.memory {
        return Ok(Box::new(MemoryStore::new()));
    }

    match &cli.remote {
        Some(url) => {
            let mut config = RemoteConfig::new(url);
            if let Some(token) = &cli.token {
                config = config.with_token(token);
            }
            let remote = HttpStore::new(config).context("Failed to build the remote store")?;
            if cli.no_cache {
                Ok(Box::new(remote))
            } else {
                Ok(Box::new(HybridStore::new(remote, open_file_store(&cli.data_dir)?)))
            }
        }
        None => Ok(Box::new(open_file_store(&cli.data_dir)?)),
    }
}

fn open_file_store(dir: &Path) -> Result<JsonFileStore> {
    JsonFileStore::open(dir).with_context(|| format!("Failed to open data dir {}", dir.display()))
}

// ---------------------------------------------------------------------------
// Catalog commands
// ---------------------------------------------------------------------------

fn entry_details(
    kitchen: String,
    category: Option<String>,
    description: Option<String>,
) -> EntryDetails {
    let mut details = EntryDetails::new(kitchen);
    if let Some(category) = category {
        details = details.with_category(category);
    }
    if let Some(description) = description {
        details = details.with_description(description);
    }
    details
}

async fn cmd_entry_add<S: CollectionStore>(
    competition: &Competition<S>,
    name: &str,
    kitchen: String,
    category: Option<String>,
    description: Option<String>,
) -> Result<()> {
    let entry = competition
        .add_entry(name, entry_details(kitchen, category, description), Utc::now())
        .await?;
    println!("Added entry '{}' ({})", entry.name, entry.id);
    Ok(())
}

async fn cmd_entry_update<S: CollectionStore>(
    competition: &Competition<S>,
    id: &str,
    name: &str,
    kitchen: String,
    category: Option<String>,
    description: Option<String>,
) -> Result<()> {
    let entry = competition
        .update_entry(
            &EntryId(id.to_string()),
            name,
            entry_details(kitchen, category, description),
        )
        .await?;
    println!("Updated entry '{}' ({})", entry.name, entry.id);
    Ok(())
}

async fn cmd_entry_remove<S: CollectionStore>(
    competition: &Competition<S>,
    id: &str,
) -> Result<()> {
    competition.remove_entry(&EntryId(id.to_string())).await?;
    println!("Removed entry {}", id);
    Ok(())
}

fn cmd_entry_list<S: CollectionStore>(competition: &Competition<S>) -> Result<()> {
    let entries = competition.entries();
    if entries.is_empty() {
        println!("No entries yet. Run 'palmares seed' or 'palmares entry add'.");
        return Ok(());
    }

    for entry in entries {
        println!(
            "{}  {:<32} {:<24} {}",
            entry.id,
            entry.name,
            entry.details.kitchen,
            entry.details.category.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

async fn cmd_judge_add<S: CollectionStore>(
    competition: &Competition<S>,
    name: &str,
    city: Option<String>,
    panel: Option<String>,
) -> Result<()> {
    let judge = competition.add_judge(name, city, panel, Utc::now()).await?;
    println!("Registered judge '{}' ({})", judge.name, judge.id);
    Ok(())
}

fn cmd_judge_list<S: CollectionStore>(competition: &Competition<S>) -> Result<()> {
    let judges = competition.judges();
    if judges.is_empty() {
        println!("No judges registered yet.");
        return Ok(());
    }

    for judge in judges {
        println!(
            "{}  {:<24} {:<18} {}",
            judge.id,
            judge.name,
            judge.city.as_deref().unwrap_or("-"),
            if judge.active { "active" } else { "inactive" }
        );
    }
    Ok(())
}

async fn cmd_judge_set_active<S: CollectionStore>(
    competition: &Competition<S>,
    id: &str,
    active: bool,
) -> Result<()> {
    let judge = competition
        .set_judge_active(&JudgeId(id.to_string()), active)
        .await?;
    if active {
        println!("Activated judge '{}'", judge.name);
    } else {
        println!("Deactivated judge '{}' (scorecards kept)", judge.name);
    }
    Ok(())
}

async fn cmd_judge_remove<S: CollectionStore>(
    competition: &Competition<S>,
    id: &str,
) -> Result<()> {
    competition.remove_judge(&JudgeId(id.to_string())).await?;
    println!("Removed judge {} and their scorecards", id);
    Ok(())
}

fn cmd_criteria<S: CollectionStore>(competition: &Competition<S>) -> Result<()> {
    let registry = competition.registry();
    for criterion in registry.criteria() {
        println!(
            "{:<16} {:<16} weight {}",
            criterion.key, criterion.label, criterion.weight
        );
    }
    println!(
        "Total weight {} -> max score {}",
        registry.total_weight(),
        registry.max_possible_score()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Scoring commands
// ---------------------------------------------------------------------------

async fn cmd_submit<S: CollectionStore>(
    competition: &Competition<S>,
    judge: &str,
    entry: &str,
    criterion: &str,
    stars: u8,
) -> Result<()> {
    let _span = JudgeSpan::enter(judge);
    let judge_id = JudgeId(judge.to_string());
    let entry_id = EntryId(entry.to_string());

    let card = competition
        .submit_criterion(&judge_id, &entry_id, criterion, stars, Utc::now())
        .await?;

    let registry = competition.registry();
    println!(
        "Recorded {} = {} star(s)  [{}/{} criteria]",
        criterion,
        stars,
        card.submitted_count(),
        registry.len()
    );
    if card.is_complete(registry) {
        println!(
            "Scorecard complete: {} points ({:.1}%)",
            composite_score(&card, registry),
            percentage(&card, registry)
        );
    } else {
        println!("Running average so far: {:.1} star(s)", running_average(&card));
    }
    Ok(())
}

fn cmd_scorecard<S: CollectionStore>(
    competition: &Competition<S>,
    judge: &str,
    entry: &str,
) -> Result<()> {
    let _span = JudgeSpan::enter(judge);
    let judge_id = JudgeId(judge.to_string());
    let entry_id = EntryId(entry.to_string());

    let Some(card) = competition.scorecard(&judge_id, &entry_id) else {
        println!("No scorecard yet for judge {} on entry {}", judge, entry);
        return Ok(());
    };

    let registry = competition.registry();
    for criterion in registry.criteria() {
        match card.mark(&criterion.key) {
            Some(mark) => println!(
                "  {:<16} {} star(s)  ({})",
                criterion.key,
                mark.stars.value(),
                mark.submitted_at.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            None => println!("  {:<16} -", criterion.key),
        }
    }

    if card.is_complete(registry) {
        println!(
            "Complete: {} points ({:.1}%)",
            composite_score(&card, registry),
            percentage(&card, registry)
        );
    } else {
        println!(
            "In progress: {}/{} criteria, running average {:.1} star(s)",
            card.submitted_count(),
            registry.len(),
            running_average(&card)
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Boards, progress, export
// ---------------------------------------------------------------------------

fn cmd_board_global<S: CollectionStore>(competition: &Competition<S>, json: bool) -> Result<()> {
    let board = competition.rank_global();
    if json {
        println!("{}", serde_json::to_string_pretty(&board)?);
        return Ok(());
    }
    if board.is_empty() {
        println!("No entries yet.");
        return Ok(());
    }

    for row in board {
        match row.rank {
            Some(rank) => println!(
                "{:>3}  {:<32} {:<24} {:>6.1}  {} vote(s)",
                rank,
                row.entry.name,
                row.entry.details.kitchen,
                row.aggregate.mean_score,
                row.aggregate.vote_count
            ),
            None => println!(
                "  -  {:<32} {:<24} (no complete votes)",
                row.entry.name, row.entry.details.kitchen
            ),
        }
    }
    Ok(())
}

fn cmd_board_judge<S: CollectionStore>(competition: &Competition<S>, id: &str) -> Result<()> {
    let _span = JudgeSpan::enter(id);
    let rows = competition.rank_for_judge(&JudgeId(id.to_string()))?;
    if rows.is_empty() {
        println!("No entries yet.");
        return Ok(());
    }

    for (position, row) in rows.iter().enumerate() {
        if row.evaluated {
            println!(
                "{:>3}  {:<32} {:>4} points ({:.1}%)",
                position + 1,
                row.entry.name,
                row.score,
                row.percentage
            );
        } else {
            println!("  -  {:<32} not yet rated", row.entry.name);
        }
    }
    Ok(())
}

fn cmd_board_final<S: CollectionStore>(competition: &Competition<S>, judge: &str) -> Result<()> {
    let judge_id = JudgeId(judge.to_string());
    if !competition.can_view_final_leaderboard(&judge_id)? {
        let progress = competition.judge_progress(&judge_id)?;
        anyhow::bail!(
            "final leaderboard is locked: {} of {} entries rated",
            progress.rated_entries,
            progress.total_entries
        );
    }
    cmd_board_global(competition, false)
}

fn cmd_progress<S: CollectionStore>(competition: &Competition<S>, judge: &str) -> Result<()> {
    let judge_id = JudgeId(judge.to_string());
    let progress = competition.judge_progress(&judge_id)?;
    println!(
        "Rated {} of {} entries",
        progress.rated_entries, progress.total_entries
    );
    println!(
        "Final leaderboard: {}",
        if progress.all_complete {
            "available"
        } else {
            "locked"
        }
    );
    Ok(())
}

fn cmd_stats<S: CollectionStore>(competition: &Competition<S>, json: bool) -> Result<()> {
    let stats = competition.competition_stats();
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("Entries:          {}", stats.total_entries);
    println!("Active judges:    {}", stats.active_judges);
    println!(
        "Scorecards:       {} ({} complete)",
        stats.total_scorecards, stats.complete_scorecards
    );
    println!("Overall progress: {:.1}%", stats.overall_progress_pct);
    Ok(())
}

fn cmd_export<S: CollectionStore>(
    competition: &Competition<S>,
    output: Option<&Path>,
) -> Result<()> {
    let headers = competition.export_headers();
    let rows = competition.export_rows();
    let csv = render_csv(&headers, &rows);

    match output {
        Some(path) => {
            std::fs::write(path, &csv)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Exported {} row(s) to {}", rows.len(), path.display());
        }
        None => print!("{}", csv),
    }
    Ok(())
}

async fn cmd_seed<S: CollectionStore>(competition: &Competition<S>) -> Result<()> {
    let seeded = competition.seed_demo(Utc::now()).await?;
    if seeded == 0 {
        println!("Catalog already has entries; nothing seeded.");
    } else {
        println!("Seeded {} demo entries", seeded);
    }
    Ok(())
}

async fn cmd_reset<S: CollectionStore>(competition: &Competition<S>, yes: bool) -> Result<()> {
    if !yes {
        anyhow::bail!("refusing to delete all data without --yes");
    }
    competition.reset_all().await?;
    println!("All entries, judges, and scorecards deleted");
    Ok(())
}

// ---------------------------------------------------------------------------
// CSV rendering
// ---------------------------------------------------------------------------

/// Quote one CSV field, doubling any embedded quotes.
fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Render export rows as CSV, every field quoted, one trailing newline.
fn render_csv(headers: &[String], rows: &[ExportRow]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(
        headers
            .iter()
            .map(|header| csv_field(header))
            .collect::<Vec<_>>()
            .join(","),
    );

    for row in rows {
        let mut fields = vec![
            csv_field(&row.position.to_string()),
            csv_field(&row.entry_name),
            csv_field(&row.kitchen),
            csv_field(&row.judge_name),
        ];
        fields.extend(
            row.criterion_points
                .iter()
                .map(|points| csv_field(&points.to_string())),
        );
        fields.push(csv_field(&row.composite_score.to_string()));
        fields.push(csv_field(&format!("{:.1}", row.percentage)));
        fields.push(csv_field(
            &row.rated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        ));
        lines.push(fields.join(","));
    }

    lines.join("\n") + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn csv_field_quotes_and_escapes() {
        assert_eq!(csv_field("plain"), "\"plain\"");
        assert_eq!(csv_field("com \"aspas\""), "\"com \"\"aspas\"\"\"");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
    }

    #[test]
    fn csv_output_stability() {
        let registry = CriteriaRegistry::standard();
        let headers = palmares_core::export_headers(&registry);
        let rows = vec![ExportRow {
            position: 1,
            entry_name: "Feijoada".to_string(),
            kitchen: "Casa da Feijoada".to_string(),
            judge_name: "Maria".to_string(),
            criterion_points: vec![10, 10, 5, 10, 15, 15],
            composite_score: 65,
            percentage: 100.0,
            rated_at: Utc.with_ymd_and_hms(2025, 10, 9, 12, 30, 0).unwrap(),
        }];

        let csv = render_csv(&headers, &rows);
        let expected = "\"Posição\",\"Prato\",\"Cozinha\",\"Jurado\",\"Originalidade\",\"Receita\",\"Apresentação\",\"Harmonia\",\"Sabor\",\"Adequação\",\"Pontuação Final\",\"Percentual\",\"Data Avaliação\"\n\"1\",\"Feijoada\",\"Casa da Feijoada\",\"Maria\",\"10\",\"10\",\"5\",\"10\",\"15\",\"15\",\"65\",\"100.0\",\"2025-10-09 12:30:00 UTC\"\n";
        assert_eq!(csv, expected);
    }

    #[tokio::test]
    async fn export_writes_a_csv_file() {
        let competition = Competition::open(MemoryStore::new(), CriteriaRegistry::standard())
            .await
            .unwrap();
        let entry = competition
            .add_entry("Sopa Oriental", EntryDetails::new("Pantanal Gourmet"), Utc::now())
            .await
            .unwrap();
        let judge = competition
            .add_judge("Ana", None, None, Utc::now())
            .await
            .unwrap();
        let keys: Vec<String> = competition
            .registry()
            .criteria()
            .iter()
            .map(|c| c.key.clone())
            .collect();
        for key in &keys {
            competition
                .submit_criterion(&judge.id, &entry.id, key, 5, Utc::now())
                .await
                .unwrap();
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ranking.csv");
        cmd_export(&competition, Some(path.as_path())).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("\"Posição\""));
        assert_eq!(written.lines().count(), 2);
        assert!(written.contains("\"Sopa Oriental\""));
        assert!(written.contains("\"65\""));
    }
}
