//! `yardwatch run`

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use tokio_util::sync::CancellationToken;
use yardwatch::detection::{DetectionSource, ScriptedDetectionSource, SimulatedDetectionSource};
use yardwatch::model::Alert;
use yardwatch::service::{ServiceConfig, TrackingService};
use yardwatch::telemetry::TelemetrySnapshot;

use crate::error::CliError;
use crate::runner::CliRunner;

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Stop after this many seconds instead of waiting for Ctrl+C
    #[arg(long, value_name = "SECS")]
    pub duration: Option<u64>,

    /// Fixed seed for the simulator and misplaced flagging
    #[arg(long)]
    pub seed: Option<u64>,

    /// Replay recorded detections from a JSON file instead of simulating
    #[arg(long, value_name = "FILE")]
    pub replay: Option<PathBuf>,

    /// How often to print status and new alerts, in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 2000)]
    pub poll_ms: u64,
}

pub fn run(mut runner: CliRunner, args: RunArgs, verbose: bool) -> Result<(), CliError> {
    if args.poll_ms == 0 {
        return Err(CliError::InvalidArgument(
            "--poll-ms must be greater than zero".to_string(),
        ));
    }
    if let Some(seed) = args.seed {
        runner.config_mut().tracking.seed = Some(seed);
    }

    let _guard = runner.init_logging(verbose)?;
    runner.log_startup("run");

    let config = runner.config();
    let source: Arc<dyn DetectionSource> = match &args.replay {
        Some(path) => {
            let scripted = ScriptedDetectionSource::from_json_file(path).map_err(CliError::Replay)?;
            println!("Source: replay of {} ({} batches)", path.display(), scripted.pending());
            Arc::new(scripted)
        }
        None => {
            println!("Source: simulated detector");
            Arc::new(SimulatedDetectionSource::new(config.simulation_config()))
        }
    };
    let service_config = ServiceConfig::from_config_file(config)?;

    println!("Database: {}", config.storage.database.display());
    println!(
        "Yard: {}m x {}m, {} zones, {} sensors",
        config.yard.width,
        config.yard.height,
        service_config.layout.zones().len(),
        service_config.sensors.len()
    );
    println!(
        "Cycle: every {}ms, missing after {}s",
        config.tracking.interval_ms, config.tracking.staleness_secs
    );
    println!();
    match args.duration {
        Some(secs) => println!("Running for {}s (Ctrl+C to stop early)", secs),
        None => println!("Press Ctrl+C to stop"),
    }
    println!();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    ctrlc::set_handler(move || {
        println!();
        println!("Received shutdown signal, stopping...");
        signal.cancel();
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    runtime.block_on(async move {
        let service = TrackingService::start(service_config, source)?;
        watch(&service, &shutdown, args.duration, Duration::from_millis(args.poll_ms)).await;
        service.shutdown().await?;

        for alert in service.drain_alerts() {
            print_alert(&alert);
        }
        print_summary(&service.telemetry_snapshot());
        Ok::<(), CliError>(())
    })?;

    println!();
    println!("Tracking stopped.");
    Ok(())
}

/// Print status and alerts until cancelled or the duration elapses.
async fn watch(
    service: &TrackingService,
    shutdown: &CancellationToken,
    duration: Option<u64>,
    poll: Duration,
) {
    let deadline = duration.map(|secs| tokio::time::Instant::now() + Duration::from_secs(secs));
    let expired = async {
        match deadline {
            Some(at) => tokio::time::sleep_until(at).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(expired);

    let mut ticker = tokio::time::interval(poll);
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            _ = &mut expired => {
                tracing::info!("Run duration elapsed");
                break;
            }
            _ = ticker.tick() => {
                for alert in service.drain_alerts() {
                    print_alert(&alert);
                }
                let snapshot = service.telemetry_snapshot();
                println!(
                    "[{}] active: {} | cycles: {} | detections: {} | alerts: {} missing, {} misplaced",
                    snapshot.uptime_human(),
                    snapshot.active_entities,
                    snapshot.cycles,
                    snapshot.detections_ingested,
                    snapshot.missing_alerts,
                    snapshot.misplaced_alerts
                );
            }
        }
    }
}

fn print_alert(alert: &Alert) {
    println!(
        "  ALERT {:<9} {} ({})",
        alert.kind.as_str().to_uppercase(),
        alert.description,
        alert.id
    );
}

fn print_summary(snapshot: &TelemetrySnapshot) {
    println!();
    println!("Session Summary");
    println!("───────────────");
    println!(
        "  Cycles:      {} ({} with errors)",
        snapshot.cycles, snapshot.cycles_with_errors
    );
    println!(
        "  Detections:  {} ingested, {} malformed",
        snapshot.detections_ingested, snapshot.malformed_skipped
    );
    println!(
        "  Alerts:      {} missing, {} misplaced",
        snapshot.missing_alerts, snapshot.misplaced_alerts
    );
    if snapshot.storage_failures > 0 || snapshot.source_failures > 0 {
        println!(
            "  Failures:    {} storage, {} source ({} writes retried)",
            snapshot.storage_failures, snapshot.source_failures, snapshot.writes_retried
        );
    }
    println!("  Active:      {} entities", snapshot.active_entities);
    println!("  Uptime:      {}", snapshot.uptime_human());
}
