//! Service configuration.

use std::path::PathBuf;

use crate::config::{ConfigError, ConfigFile};
use crate::detection::Sensor;
use crate::tracking::TrackingConfig;
use crate::zone::YardLayout;

/// Everything needed to start a [`TrackingService`](super::TrackingService).
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub layout: YardLayout,
    pub sensors: Vec<Sensor>,
    pub tracking: TrackingConfig,
    /// SQLite database file; `None` keeps state in memory only.
    pub database: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            layout: YardLayout::default(),
            sensors: Sensor::default_roster(),
            tracking: TrackingConfig::default(),
            database: None,
        }
    }
}

impl ServiceConfig {
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }

    /// Build from a loaded configuration file.
    pub fn from_config_file(file: &ConfigFile) -> Result<Self, ConfigError> {
        Ok(Self {
            layout: file.yard_layout()?,
            sensors: file.sensors.clone(),
            tracking: file.tracking_config(),
            database: Some(file.storage.database.clone()),
        })
    }
}

/// Builder for [`ServiceConfig`].
#[derive(Debug, Default)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    pub fn layout(mut self, layout: YardLayout) -> Self {
        self.config.layout = layout;
        self
    }

    pub fn sensors(mut self, sensors: Vec<Sensor>) -> Self {
        self.config.sensors = sensors;
        self
    }

    pub fn tracking(mut self, tracking: TrackingConfig) -> Self {
        self.config.tracking = tracking;
        self
    }

    pub fn database(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.database = Some(path.into());
        self
    }

    pub fn in_memory(mut self) -> Self {
        self.config.database = None;
        self
    }

    pub fn build(self) -> ServiceConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_builder() {
        let config = ServiceConfig::builder()
            .tracking(TrackingConfig::default().with_interval(Duration::from_millis(10)))
            .database("/tmp/yard.db")
            .build();
        assert_eq!(config.tracking.interval, Duration::from_millis(10));
        assert_eq!(config.database, Some(PathBuf::from("/tmp/yard.db")));
        assert_eq!(config.sensors.len(), 4);

        assert!(ServiceConfig::builder()
            .database("x.db")
            .in_memory()
            .build()
            .database
            .is_none());
    }

    #[test]
    fn test_from_config_file() {
        let mut file = ConfigFile::default();
        file.tracking.staleness_secs = 30;
        let config = ServiceConfig::from_config_file(&file).unwrap();
        assert_eq!(config.tracking.staleness_threshold, Duration::from_secs(30));
        assert_eq!(config.database, Some(file.storage.database.clone()));
        assert_eq!(config.layout.zones().len(), 4);
    }
}
