// Draftroom simulation entry point.
//
// Startup sequence:
// 1. Initialize tracing
// 2. Load config (built-in defaults when the file is missing)
// 3. Open the SQLite store
// 4. Build a seeded sample catalog and a shuffled draft order
// 5. Create and start the draft
// 6. Drive every turn with the recommender until the draft completes
// 7. Print the final board and verify the persisted pick log

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use draftroom::catalog::sample_catalog;
use draftroom::config;
use draftroom::draft::state::DraftSettings;
use draftroom::draft::turn::shuffle_team_order;
use draftroom::engine::DraftEngine;
use draftroom::store::SqliteStore;

const TEAM_NAMES: &[&str] = &[
    "alpha", "bravo", "charlie", "delta", "echo", "foxtrot", "golf", "hotel", "india", "juliett",
    "kilo", "lima",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("Draftroom simulation starting up");

    // 2. Load config
    let config = match config::load_config() {
        Ok(config) => config,
        Err(config::ConfigError::FileNotFound { path }) => {
            warn!(
                "No config file at {}; using built-in defaults",
                path.display()
            );
            config::Config::default()
        }
        Err(e) => return Err(e).context("failed to load configuration"),
    };
    info!(
        "Config loaded: {} teams, {} rounds, {}s per pick",
        config.simulation.num_teams, config.draft.rounds, config.draft.pick_time_limit_secs
    );

    // 3. Open the SQLite store
    let store = Arc::new(SqliteStore::open(&config.db_path).context("failed to open database")?);
    info!("Database opened at {}", config.db_path);

    // 4. Build a seeded sample catalog and a shuffled draft order
    let catalog = Arc::new(sample_catalog(
        config.simulation.seed,
        config.simulation.catalog_size,
    ));
    info!("Sample catalog built with {} players", catalog.len());

    let team_order = shuffle_team_order(
        &team_ids(config.simulation.num_teams),
        config.simulation.seed,
    );
    info!("Draft order: {}", team_order.join(", "));

    // 5. Create and start the draft
    let engine = DraftEngine::new(store.clone(), config.recommender.clone());
    let settings = DraftSettings {
        rounds: config.draft.rounds,
        pick_time_limit_secs: config.draft.pick_time_limit_secs,
        snake: config.draft.snake,
        team_order: team_order.clone(),
    };
    let draft_id = engine
        .create_draft("sim-league", settings, catalog.clone())
        .await
        .context("failed to create draft")?;
    engine
        .start_draft(&draft_id)
        .await
        .context("failed to start draft")?;

    // 6. Drive every turn with the recommender until the draft completes
    loop {
        let snapshot = engine.snapshot(&draft_id).await?;
        let turn = match snapshot.current_turn {
            Some(turn) => turn,
            None => break,
        };
        let choice = engine
            .recommendation(&draft_id, &turn.team_id)
            .await?
            .context("player pool exhausted before the draft finished")?;
        engine
            .submit_pick(&draft_id, &turn.team_id, &choice.player_id, turn.overall)
            .await?;
    }

    // 7. Print the final board and verify the persisted pick log
    let snapshot = engine.snapshot(&draft_id).await?;
    println!("\nFinal board for draft {draft_id}:");
    for team in &team_order {
        let roster: Vec<String> = snapshot
            .picks
            .iter()
            .filter(|p| &p.team_id == team)
            .map(|p| {
                let name = catalog
                    .get(&p.player_id)
                    .map(|c| c.name.as_str())
                    .unwrap_or(p.player_id.as_str());
                format!("{} ({})", name, p.position)
            })
            .collect();
        println!("  {team}: {}", roster.join(", "));
    }

    let persisted = store
        .pick_count(&draft_id)
        .context("failed to count persisted picks")?;
    info!(
        "Simulation complete: {} picks made, {} persisted",
        snapshot.picks.len(),
        persisted
    );

    Ok(())
}

fn team_ids(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| match TEAM_NAMES.get(i) {
            Some(name) => (*name).to_string(),
            None => format!("team{:02}", i + 1),
        })
        .collect()
}

/// Initialize tracing to stderr, filtered by RUST_LOG when set.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("draftroom=info,warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
