//! Shared command setup: configuration and logging.

use std::path::PathBuf;

use yardwatch::config::{config_file_path, ConfigFile};
use yardwatch::logging::{init_logging, LogConfig, LoggingGuard};
use yardwatch::store::SqliteEntityStore;

use crate::error::CliError;

/// Loaded configuration plus the path it came from.
pub struct CliRunner {
    config: ConfigFile,
    config_path: PathBuf,
}

impl CliRunner {
    /// Load the config file at `path`, or the default location.
    pub fn new(path: Option<PathBuf>) -> Result<Self, CliError> {
        let config_path = path.unwrap_or_else(config_file_path);
        let config = ConfigFile::load_from(&config_path)?;
        Ok(Self {
            config,
            config_path,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ConfigFile {
        &mut self.config
    }

    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Install file and console logging.
    pub fn init_logging(&self, verbose: bool) -> Result<LoggingGuard, CliError> {
        let log_config = LogConfig::new(&self.config.logging.directory).with_verbose(verbose);
        Ok(init_logging(&log_config)?)
    }

    /// Open the configured database.
    pub fn open_store(&self) -> Result<SqliteEntityStore, CliError> {
        Ok(SqliteEntityStore::open(&self.config.storage.database)?)
    }

    pub fn log_startup(&self, command: &str) {
        tracing::info!(
            version = yardwatch::VERSION,
            command,
            config = %self.config_path.display(),
            database = %self.config.storage.database.display(),
            "YardWatch starting"
        );
    }
}
