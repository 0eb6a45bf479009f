//! Tracking telemetry for observability and operator feedback.
//!
//! Lock-free atomic counters are bumped by the tracking engine as it works;
//! consumers take a point-in-time [`TelemetrySnapshot`] for display.
//!
//! # Architecture
//!
//! ```text
//! TrackingEngine ─────► TrackingMetrics ─────► TelemetrySnapshot ─────► Views
//!                       (atomic counters)     (point-in-time copy)      (CLI, etc.)
//! ```
//!
//! # Example
//!
//! ```
//! use yardwatch::telemetry::TrackingMetrics;
//!
//! let metrics = TrackingMetrics::new();
//! metrics.cycle_completed();
//! metrics.detections_ingested(3);
//!
//! let snapshot = metrics.snapshot();
//! assert_eq!(snapshot.cycles, 1);
//! assert_eq!(snapshot.detections_ingested, 3);
//! ```

mod metrics;
mod snapshot;

pub use metrics::TrackingMetrics;
pub use snapshot::TelemetrySnapshot;
