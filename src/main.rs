use fairway_sim::args::{self, CleanArgs};
use fairway_sim::model::{TournamentId, TournamentStatus};
use fairway_sim::sim::scoring::RngUniform;
use fairway_sim::{Engine, EngineError, SqliteStorage, StepOutcome, Storage};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = args::args_checks()?;

    let storage = SqliteStorage::open(&args.db_name).await?;
    run_startup_tasks(&args, &storage).await?;

    let storage: Arc<dyn Storage> = Arc::new(storage);
    let config = args.engine_config();
    let engine = match args.seed {
        Some(seed) => Engine::new(Arc::clone(&storage), config, RngUniform::seeded(seed)),
        None => Engine::new(Arc::clone(&storage), config, RngUniform::from_entropy()),
    };

    if let Some(id) = args.start {
        match engine.start_tournament(TournamentId(id)).await {
            Ok(groups) => info!(tournament = id, groups = groups.len(), "started from command line"),
            // Resuming a run that was interrupted mid-tournament.
            Err(EngineError::NotPending {
                status: TournamentStatus::Active,
                ..
            }) => info!(tournament = id, "resuming active tournament"),
            Err(e) => return Err(e.into()),
        }
    }

    run_ticks(&engine, &args).await
}

async fn run_startup_tasks(
    args: &CleanArgs,
    storage: &SqliteStorage,
) -> Result<(), Box<dyn std::error::Error>> {
    if args.db_reset {
        storage.reset().await?;
        warn!(db = %args.db_name, "database reset");
    }

    if args.db_startup_script.is_some() && !args.combined_sql_script.is_empty() {
        storage.execute_batch(&args.combined_sql_script).await?;
        info!("startup script applied");
    }

    if let Some(catalog) = &args.db_populate_json {
        let counts = storage.prefill(catalog.clone()).await?;
        info!(
            players = counts.players,
            courses = counts.courses,
            tournaments = counts.tournaments,
            "catalog loaded"
        );
    }

    Ok(())
}

async fn run_ticks(engine: &Engine, args: &CleanArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut interval = tokio::time::interval(Duration::from_millis(args.tick_ms));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = &mut shutdown => {
                info!("shutting down");
                return Ok(());
            }
        }

        match engine.advance_active().await {
            Ok(None) => {
                if args.exit_when_idle {
                    info!("no active tournament");
                    return Ok(());
                }
            }
            Ok(Some((id, StepOutcome::Completed))) => {
                let standings = engine.leaderboard(id).await?;
                println!("{}", serde_json::to_string_pretty(&standings)?);
            }
            Ok(Some((id, outcome @ StepOutcome::Played { .. }))) => {
                debug!(tournament = %id, ?outcome, "tick");
            }
            Ok(Some((id, outcome))) => {
                info!(tournament = %id, ?outcome, "tick");
            }
            Err(e) => {
                error!(error = %e, "tick failed");
            }
        }
    }
}
