//! schedule-worker — polling loop driving the recurring-schedule engine.
//!
//! Each tick it asks the manager for due schedules, performs the external
//! action (here: logging the payload), and reports the outcome back so the
//! engine can append to the ledger and advance `next_run_at`.
//!
//! The engine itself never performs the business action; this binary is the
//! caller the engine is designed around.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use cadence_core::ExecutionStatus;
use cadence_scheduler::{EngineConfig, FileBackend, ScheduleManager};

// ── CLI ─────────────────────────────────────────────────────────────

/// Recurring-schedule worker — polls for due schedules and records outcomes.
#[derive(Parser, Debug)]
#[command(name = "schedule-worker", version, about)]
struct Cli {
    /// Path to an engine TOML config file.
    #[arg(long, env = "CADENCE_CONFIG", default_value = "config/cadence.toml")]
    config: String,

    /// Directory holding the engine's JSON state files.
    #[arg(long, env = "CADENCE_DATA_DIR", default_value = "data/cadence")]
    data_dir: String,

    /// Poll interval in seconds.
    #[arg(long, env = "CADENCE_POLL_INTERVAL", default_value_t = 30)]
    poll_interval: u64,
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match EngineConfig::from_file(&cli.config) {
        Ok(cfg) => {
            info!(path = %cli.config, "loaded engine config");
            cfg
        }
        Err(e) => {
            warn!(
                error = %e,
                path = %cli.config,
                "failed to load config, using defaults"
            );
            EngineConfig::default()
        }
    };

    let backend = Arc::new(FileBackend::new(&cli.data_dir));
    let manager = ScheduleManager::new(backend, config);

    let stats = manager.stats();
    info!(
        data_dir = %cli.data_dir,
        schedules = stats.total,
        enabled = stats.enabled,
        poll_interval = cli.poll_interval,
        "schedule-worker starting"
    );

    let mut ticker = tokio::time::interval(Duration::from_secs(cli.poll_interval.max(1)));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                run_tick(&manager);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("schedule-worker shutting down");
                break;
            }
        }
    }
    Ok(())
}

/// One poll: fetch due schedules, act on each, report the outcome.
fn run_tick(manager: &ScheduleManager) {
    let due = manager.pending_schedules();
    for schedule in due {
        info!(
            schedule_id = %schedule.id,
            name = %schedule.name,
            items = schedule.payload.len(),
            "schedule due, executing"
        );

        // The external action goes here. This worker only demonstrates the
        // contract: act on the payload, then report the outcome.
        let outcome = ExecutionStatus::Success;

        match manager.record_execution(schedule.id, outcome, None) {
            Ok(Some(updated)) => {
                info!(
                    schedule_id = %updated.id,
                    next_run_at = ?updated.next_run_at,
                    "recorded execution"
                );
            }
            Ok(None) => {
                warn!(schedule_id = %schedule.id, "schedule vanished before outcome was recorded");
            }
            Err(e) => {
                warn!(schedule_id = %schedule.id, error = %e, "failed to record execution");
            }
        }
    }
}
