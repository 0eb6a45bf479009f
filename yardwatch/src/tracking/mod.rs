//! The tracking engine.
//!
//! Turns per-sensor detection batches into tracked entities, expires
//! entities that stop being seen, and raises alerts.
//!
//! # Cycle
//!
//! ```text
//! run_cycle(now)
//!   1. flush writes that failed last cycle
//!   2. for each online sensor: detect ──► ingest_cycle
//!   3. sweep_staleness(now, threshold)      (always after ingestion)
//!   4. maybe_flag_misplaced(now, probability)
//! ```
//!
//! # Entity lifecycle
//!
//! ```text
//! (none) ──detection──► active ──detection──► active (refresh)
//!                          │
//!                          └──no detection for > threshold──► removed + `missing` alert
//! ```
//!
//! A removed id that is detected again starts over as a fresh entity.
//!
//! # Failures
//!
//! Nothing here aborts a cycle. Malformed detections are skipped, sensor
//! and source problems skip that sensor, and failed writes are queued for
//! the next cycle. Each is reported as a [`TrackingError`] in the cycle's
//! report.

mod anomaly;
mod config;
mod engine;
mod error;
mod report;

pub use anomaly::{AlwaysFlagFirst, MisplacedPicker, NeverFlag, RandomPicker};
pub use config::TrackingConfig;
pub use engine::TrackingEngine;
pub use error::TrackingError;
pub use report::{AlertReport, CycleReport, IngestReport};
