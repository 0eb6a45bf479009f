//! Per-item failures reported by a tracking cycle.

use thiserror::Error;

use crate::detection::{DetectionError, MalformedDetection};
use crate::store::StoreError;

/// A failure inside a cycle.
///
/// None of these stop the cycle; they are collected into its report.
#[derive(Debug, Error)]
pub enum TrackingError {
    /// A detection was skipped.
    #[error("malformed detection from sensor '{sensor}': {source}")]
    Malformed {
        sensor: String,
        #[source]
        source: MalformedDetection,
    },

    /// A sensor's source produced nothing this cycle.
    #[error(transparent)]
    Source(#[from] DetectionError),

    /// A write failed and was queued for the next cycle.
    #[error("failed to persist {record}: {source}")]
    Storage {
        record: String,
        #[source]
        source: StoreError,
    },

    /// No sensor with the given id is in the roster.
    #[error("unknown sensor '{0}'")]
    UnknownSensor(String),
}

impl TrackingError {
    /// Whether this is a storage failure.
    pub fn is_storage(&self) -> bool {
        matches!(self, TrackingError::Storage { .. })
    }
}
