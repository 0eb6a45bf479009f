//! The tracking service: process-wide context around the engine.
//!
//! [`TrackingService`] owns everything with a lifetime: the entity store,
//! the alert channel, the tracking engine and the background scheduler
//! task. Presentation layers hold a service and only use its read API.
//!
//! # Lifecycle
//!
//! ```text
//! start()  ── open store (schema) ── load roster ── spawn scheduler
//!                                                        │
//!                                   every interval: spawn_blocking(run_cycle)
//!                                                        │
//! shutdown() ── cancel token ── current cycle finishes ──┘── task joined
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use yardwatch::detection::SimulatedDetectionSource;
//! use yardwatch::service::{ServiceConfig, TrackingService};
//!
//! # async fn demo() -> Result<(), yardwatch::service::ServiceError> {
//! let config = ServiceConfig::builder().database("/tmp/yard.db").build();
//! let source = Arc::new(SimulatedDetectionSource::with_defaults());
//! let service = TrackingService::start(config, source)?;
//!
//! println!("{} entities", service.list_entities()?.len());
//! service.shutdown().await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod scheduler;
mod tracking_service;

pub use config::{ServiceConfig, ServiceConfigBuilder};
pub use error::ServiceError;
pub use scheduler::TrackingScheduler;
pub use tracking_service::TrackingService;
