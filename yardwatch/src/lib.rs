//! YardWatch - asset tracking for partitioned vehicle yards
//!
//! This library tracks vehicles across a yard from periodic sensor detections,
//! classifies every sighting into a spatial zone, keeps a durable record of
//! what was seen, and raises alerts when a vehicle goes missing or looks
//! misplaced.
//!
//! # Architecture
//!
//! ```text
//! DetectionSource ──► TrackingEngine ──┬──► ZoneClassifier
//!  (per sensor)        (run_cycle)     ├──► EntityStore  ◄── consumers (list_*)
//!                                      └──► AlertChannel ◄── consumers (drain/take)
//! ```
//!
//! The [`service::TrackingService`] owns the engine and runs it on a fixed
//! interval in a background task; presentation layers only ever read through
//! the service's consumer API.

pub mod alerts;
pub mod config;
pub mod detection;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;
pub mod telemetry;
pub mod tracking;
pub mod zone;

/// Library version, taken from the package manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
