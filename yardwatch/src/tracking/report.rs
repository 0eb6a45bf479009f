//! Results of engine operations.

use crate::model::{Alert, TrackedEntity};

use super::error::TrackingError;

/// Outcome of ingesting one sensor's batch.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// Entities created or refreshed, in batch order.
    pub entities: Vec<TrackedEntity>,
    /// Skipped detections and failed writes.
    pub errors: Vec<TrackingError>,
}

/// Outcome of an operation that raises alerts.
#[derive(Debug, Default)]
pub struct AlertReport {
    /// Alerts raised, whether or not they were persisted.
    pub alerts: Vec<Alert>,
    /// Failed writes (queued for retry).
    pub errors: Vec<TrackingError>,
}

/// Outcome of a full cycle.
#[derive(Debug, Default)]
pub struct CycleReport {
    pub sensors_polled: usize,
    pub sensors_skipped: usize,
    /// Queued writes that succeeded this cycle.
    pub writes_retried: usize,
    pub entities: Vec<TrackedEntity>,
    pub alerts: Vec<Alert>,
    pub errors: Vec<TrackingError>,
}

impl CycleReport {
    /// True when nothing failed.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub(super) fn absorb_ingest(&mut self, report: IngestReport) {
        self.entities.extend(report.entities);
        self.errors.extend(report.errors);
    }

    pub(super) fn absorb_alerts(&mut self, report: AlertReport) {
        self.alerts.extend(report.alerts);
        self.errors.extend(report.errors);
    }
}
