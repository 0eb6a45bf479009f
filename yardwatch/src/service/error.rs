//! Service lifecycle errors.

use thiserror::Error;

use crate::config::ConfigError;
use crate::store::StoreError;
use crate::tracking::TrackingError;

/// Errors surfaced by [`TrackingService`](super::TrackingService).
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Tracking(#[from] TrackingError),

    #[error("no tokio runtime available to run the scheduler")]
    NoRuntime,

    #[error("scheduler task failed: {0}")]
    TaskFailed(String),
}
