//! CLI error type.

use thiserror::Error;
use yardwatch::config::ConfigError;
use yardwatch::logging::LoggingError;
use yardwatch::service::ServiceError;
use yardwatch::store::StoreError;

/// Errors reported to the user; any of these exits with status 1.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Config(String),

    #[error(transparent)]
    ConfigFile(#[from] ConfigError),

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Service(#[from] ServiceError),

    #[error("failed to initialize logging: {0}")]
    Logging(#[from] LoggingError),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("failed to read replay file: {0}")]
    Replay(std::io::Error),

    #[error("failed to start runtime: {0}")]
    Runtime(std::io::Error),

    #[error("failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
}
