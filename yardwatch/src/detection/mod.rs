//! Detection sources and the sensor roster.
//!
//! A [`DetectionSource`] turns one polling of one sensor into a batch of raw
//! detections. The tracking engine treats the source as a black box: it may
//! return zero, one or many detections per call, and each detection is
//! validated individually so one bad record never spoils the batch.
//!
//! # Available Sources
//!
//! - [`SimulatedDetectionSource`]: randomized camera simulation for demos
//!   and soak runs (seedable).
//! - [`ScriptedDetectionSource`]: replays pre-recorded batches per sensor;
//!   used by tests and for deterministic replays.
//!
//! Any other feed (a real camera pipeline, a remote fleet API) plugs in by
//! implementing the trait; the engine does not change.

mod scripted;
mod sensor;
mod simulated;
mod source;

pub use scripted::ScriptedDetectionSource;
pub use sensor::{Sensor, SensorStatus};
pub use simulated::{SimulatedDetectionSource, SimulationConfig};
pub use source::{
    BoundingBox, DetectionError, DetectionSource, MalformedDetection, RawDetection,
    ValidDetection,
};
