//! Point-in-time telemetry view.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Copy of the tracking counters plus live gauges.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    /// Time since the metrics were created.
    #[serde(serialize_with = "serialize_secs")]
    pub uptime: Duration,
    pub cycles: u64,
    pub cycles_with_errors: u64,
    pub detections_ingested: u64,
    pub malformed_skipped: u64,
    pub sensors_skipped_offline: u64,
    pub source_failures: u64,
    pub storage_failures: u64,
    pub writes_retried: u64,
    pub missing_alerts: u64,
    pub misplaced_alerts: u64,
    /// Entities in the engine's active set.
    pub active_entities: usize,
    /// Alerts published but not yet taken.
    pub alert_queue_depth: usize,
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

impl TelemetrySnapshot {
    /// Fill in gauges owned outside the metrics.
    pub fn with_gauges(mut self, active_entities: usize, alert_queue_depth: usize) -> Self {
        self.active_entities = active_entities;
        self.alert_queue_depth = alert_queue_depth;
        self
    }

    /// Total alerts raised since start.
    pub fn alerts_raised(&self) -> u64 {
        self.missing_alerts + self.misplaced_alerts
    }

    /// Average cycles per second over the uptime.
    pub fn cycles_per_second(&self) -> f64 {
        let secs = self.uptime.as_secs_f64();
        if secs > 0.0 {
            self.cycles as f64 / secs
        } else {
            0.0
        }
    }

    /// Uptime as `1h 02m 03s`, `2m 03s` or `3s`.
    pub fn uptime_human(&self) -> String {
        let total = self.uptime.as_secs();
        let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
        if h > 0 {
            format!("{}h {:02}m {:02}s", h, m, s)
        } else if m > 0 {
            format!("{}m {:02}s", m, s)
        } else {
            format!("{}s", s)
        }
    }
}

impl fmt::Display for TelemetrySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cycles={} active={} queued={} ingested={} malformed={} missing={} misplaced={} storage_failures={}",
            self.cycles,
            self.active_entities,
            self.alert_queue_depth,
            self.detections_ingested,
            self.malformed_skipped,
            self.missing_alerts,
            self.misplaced_alerts,
            self.storage_failures,
        )
    }
}
