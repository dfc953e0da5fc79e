// Draft engine simulation entry point.
//
// Runs one all-computer draft end to end against the real store, catalog,
// and event pipeline. Useful for exercising the engine locally and for
// eyeballing autopick behavior with or without an API key configured.
//
// Startup sequence:
// 1. Initialize tracing (log to stdout)
// 2. Load config
// 3. Open the draft store, resolve any prior session
// 4. Load the player catalog
// 5. Build the ranking client from config
// 6. Spawn WebSocket event broadcaster
// 7. Initialize and run the draft to completion
// 8. Print roster summary

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};

use draft_engine::catalog::CsvCatalog;
use draft_engine::config;
use draft_engine::draft::autopick::NeedWeighted;
use draft_engine::draft::state::DraftStatus;
use draft_engine::engine::{DraftEngine, DraftSettings, TeamSeed};
use draft_engine::events::BroadcastSink;
use draft_engine::llm::RankingClient;
use draft_engine::store::{DraftStore, SqliteDraftStore};
use draft_engine::ws_server;

const SIM_LEAGUE_ID: &str = "sim-league";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing (log to stdout)
    init_tracing()?;
    info!("Draft engine simulation starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: {} teams, {} rounds, {:?} order, pool of {}",
        config.draft.teams, config.draft.rounds, config.draft.mode, config.draft.pool_size
    );

    // 3. Open the draft store
    let store = Arc::new(
        SqliteDraftStore::open(&config.db_path).context("failed to open draft store")?,
    );
    info!("Draft store opened at {}", config.db_path);
    match store.load(SIM_LEAGUE_ID) {
        Ok(Some(prior)) => info!(
            "Found prior session {} at pick {} ({:?}); re-initializing",
            prior.session_id, prior.current_pick, prior.status
        ),
        Ok(None) => info!("No prior draft session"),
        Err(e) => error!("Failed to inspect prior session: {e}"),
    }

    // 4. Load the player catalog
    let catalog = Arc::new(
        CsvCatalog::load(&config.players_csv).context("failed to load player catalog")?,
    );
    info!("Loaded {} players from {}", catalog.len(), config.players_csv);

    // 5. Build the ranking client from config
    let ranker = RankingClient::from_config(&config);
    match &ranker {
        RankingClient::Active(_) => info!("Need ranker initialized (API key configured)"),
        RankingClient::Disabled => info!("Need ranker disabled (no API key); using local policy"),
    }

    // 6. Spawn WebSocket event broadcaster
    let events = Arc::new(BroadcastSink::new(256));
    let ws_port = config.ws_port;
    let event_tx = events.sender();
    let ws_handle = tokio::spawn(async move {
        if let Err(e) = ws_server::run(ws_port, event_tx).await {
            error!("WebSocket server error: {e}");
        }
    });

    let engine = DraftEngine::new(
        store.clone(),
        catalog,
        store.clone(),
        events,
        Arc::new(ranker),
    )
    .with_candidate_pool(config.draft.autopick_candidates)
    .with_fallback(Box::new(NeedWeighted::default()));

    // 7. Initialize and run the draft to completion
    let teams: Vec<TeamSeed> = (1..=config.draft.teams)
        .map(|i| TeamSeed::new(format!("team_{i:02}"), true))
        .collect();
    let settings = DraftSettings {
        rounds: config.draft.rounds,
        mode: config.draft.mode,
        pool_size: config.draft.pool_size,
        reset: true,
    };

    let draft = engine
        .initialize_draft(SIM_LEAGUE_ID, teams, settings)
        .await
        .context("failed to initialize draft")?;
    info!("Draft session {} initialized", draft.session_id);

    engine
        .start_draft(SIM_LEAGUE_ID)
        .await
        .context("failed to start draft")?;

    let outcomes = engine
        .advance_computer_turns(SIM_LEAGUE_ID)
        .await
        .context("draft simulation failed")?;
    info!("Simulation applied {} picks", outcomes.len());

    let final_state = engine
        .get_draft_state(SIM_LEAGUE_ID)
        .context("failed to load final draft state")?;
    if final_state.status != DraftStatus::Completed {
        error!(
            "Draft did not complete: {:?} at pick {}",
            final_state.status, final_state.current_pick
        );
    }

    // 8. Print roster summary
    for team in &final_state.teams {
        info!("--- {} ---", team.team_id);
        for pick in &team.picks {
            info!(
                "  R{} #{:<3} {} ({}, rating {})",
                pick.round, pick.pick_number, pick.player_name, pick.position, pick.rating
            );
        }
    }
    let assignments = store
        .assignments(SIM_LEAGUE_ID)
        .context("failed to load roster assignments")?;
    let payroll: u32 = assignments.iter().map(|a| a.terms.salary).sum();
    info!(
        "{} roster assignments recorded, total payroll {}",
        assignments.len(),
        payroll
    );

    ws_handle.abort();
    info!("Draft engine simulation finished");
    Ok(())
}

/// Initialize tracing to stdout with an env-filter override.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("draft_engine=info,warn")),
        )
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
