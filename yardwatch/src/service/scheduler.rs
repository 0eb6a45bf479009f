//! Background task that runs tracking cycles on a fixed interval.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::tracking::TrackingEngine;

/// Drives [`TrackingEngine::run_cycle`] until cancelled.
///
/// Each tick runs the cycle on the blocking pool and waits for it to finish
/// before looking at the shutdown token again, so a cycle is never cut
/// short. A failed or panicking cycle is logged and the next tick runs as
/// usual.
#[derive(Debug)]
pub struct TrackingScheduler {
    engine: Arc<TrackingEngine>,
    interval: Duration,
}

impl TrackingScheduler {
    pub fn new(engine: Arc<TrackingEngine>) -> Self {
        let interval = engine.config().interval;
        Self { engine, interval }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!(interval_ms = self.interval.as_millis() as u64, "Tracking scheduler started");

        // interval() rejects a zero period
        let mut ticker = tokio::time::interval(self.interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,

                _ = ticker.tick() => {}
            }

            let engine = Arc::clone(&self.engine);
            match tokio::task::spawn_blocking(move || engine.run_cycle(Utc::now())).await {
                Ok(report) if !report.is_clean() => {
                    tracing::warn!(
                        errors = report.errors.len(),
                        first = %report.errors[0],
                        "Tracking cycle completed with errors"
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(error = %e, "Tracking cycle aborted");
                }
            }
        }

        tracing::info!("Tracking scheduler stopped");
    }
}
