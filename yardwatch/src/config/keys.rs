//! Scalar configuration keys addressable as `section.key`.
//!
//! Zones and sensors are whole sections and are edited in the file itself;
//! everything else is reachable through [`ConfigKey`].

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::error::ConfigError;
use super::file::ConfigFile;

/// A single scalar setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    YardWidth,
    YardHeight,
    TrackingIntervalMs,
    TrackingStalenessSecs,
    TrackingMisplacedProbability,
    TrackingSeed,
    SimulationMinDetections,
    SimulationMaxDetections,
    SimulationConfidenceThreshold,
    SimulationIdPool,
    StorageDatabase,
    LoggingDirectory,
}

impl ConfigKey {
    /// Every key, grouped by section in file order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::YardWidth,
            ConfigKey::YardHeight,
            ConfigKey::TrackingIntervalMs,
            ConfigKey::TrackingStalenessSecs,
            ConfigKey::TrackingMisplacedProbability,
            ConfigKey::TrackingSeed,
            ConfigKey::SimulationMinDetections,
            ConfigKey::SimulationMaxDetections,
            ConfigKey::SimulationConfidenceThreshold,
            ConfigKey::SimulationIdPool,
            ConfigKey::StorageDatabase,
            ConfigKey::LoggingDirectory,
        ]
    }

    /// INI section the key lives in.
    pub fn section(&self) -> &'static str {
        match self {
            ConfigKey::YardWidth | ConfigKey::YardHeight => "yard",
            ConfigKey::TrackingIntervalMs
            | ConfigKey::TrackingStalenessSecs
            | ConfigKey::TrackingMisplacedProbability
            | ConfigKey::TrackingSeed => "tracking",
            ConfigKey::SimulationMinDetections
            | ConfigKey::SimulationMaxDetections
            | ConfigKey::SimulationConfidenceThreshold
            | ConfigKey::SimulationIdPool => "simulation",
            ConfigKey::StorageDatabase => "storage",
            ConfigKey::LoggingDirectory => "logging",
        }
    }

    /// Key name within its section.
    pub fn key_name(&self) -> &'static str {
        match self {
            ConfigKey::YardWidth => "width",
            ConfigKey::YardHeight => "height",
            ConfigKey::TrackingIntervalMs => "interval_ms",
            ConfigKey::TrackingStalenessSecs => "staleness_secs",
            ConfigKey::TrackingMisplacedProbability => "misplaced_probability",
            ConfigKey::TrackingSeed => "seed",
            ConfigKey::SimulationMinDetections => "min_detections",
            ConfigKey::SimulationMaxDetections => "max_detections",
            ConfigKey::SimulationConfidenceThreshold => "confidence_threshold",
            ConfigKey::SimulationIdPool => "id_pool",
            ConfigKey::StorageDatabase => "database",
            ConfigKey::LoggingDirectory => "directory",
        }
    }

    /// Full `section.key` name.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value as a string; empty when unset.
    pub fn get(&self, config: &ConfigFile) -> String {
        fn opt<T: ToString>(value: Option<T>) -> String {
            value.map(|v| v.to_string()).unwrap_or_default()
        }
        match self {
            ConfigKey::YardWidth => config.yard.width.to_string(),
            ConfigKey::YardHeight => config.yard.height.to_string(),
            ConfigKey::TrackingIntervalMs => config.tracking.interval_ms.to_string(),
            ConfigKey::TrackingStalenessSecs => config.tracking.staleness_secs.to_string(),
            ConfigKey::TrackingMisplacedProbability => {
                config.tracking.misplaced_probability.to_string()
            }
            ConfigKey::TrackingSeed => opt(config.tracking.seed),
            ConfigKey::SimulationMinDetections => config.simulation.min_detections.to_string(),
            ConfigKey::SimulationMaxDetections => config.simulation.max_detections.to_string(),
            ConfigKey::SimulationConfidenceThreshold => {
                config.simulation.confidence_threshold.to_string()
            }
            ConfigKey::SimulationIdPool => opt(config.simulation.id_pool),
            ConfigKey::StorageDatabase => config.storage.database.display().to_string(),
            ConfigKey::LoggingDirectory => config.logging.directory.display().to_string(),
        }
    }

    /// Parse and store a value. An empty value clears optional keys.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match self {
            ConfigKey::YardWidth => config.yard.width = self.parse_positive(value)?,
            ConfigKey::YardHeight => config.yard.height = self.parse_positive(value)?,
            ConfigKey::TrackingIntervalMs => {
                config.tracking.interval_ms = self.parse_nonzero(value)?
            }
            ConfigKey::TrackingStalenessSecs => {
                config.tracking.staleness_secs = self.parse_nonzero(value)?
            }
            ConfigKey::TrackingMisplacedProbability => {
                config.tracking.misplaced_probability = self.parse_unit(value)?
            }
            ConfigKey::TrackingSeed => config.tracking.seed = self.parse_optional(value)?,
            ConfigKey::SimulationMinDetections => {
                config.simulation.min_detections = self.parse(value)?
            }
            ConfigKey::SimulationMaxDetections => {
                config.simulation.max_detections = self.parse(value)?
            }
            ConfigKey::SimulationConfidenceThreshold => {
                config.simulation.confidence_threshold = self.parse_unit(value)?
            }
            ConfigKey::SimulationIdPool => config.simulation.id_pool = self.parse_optional(value)?,
            ConfigKey::StorageDatabase => config.storage.database = self.parse_path(value)?,
            ConfigKey::LoggingDirectory => config.logging.directory = self.parse_path(value)?,
        }
        Ok(())
    }

    fn invalid(&self, value: &str, reason: impl Into<String>) -> ConfigError {
        ConfigError::invalid(self.section(), self.key_name(), value, reason)
    }

    fn parse<T>(&self, value: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        value.parse().map_err(|e: T::Err| self.invalid(value, e.to_string()))
    }

    fn parse_optional<T>(&self, value: &str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        if value.is_empty() {
            Ok(None)
        } else {
            self.parse(value).map(Some)
        }
    }

    fn parse_nonzero(&self, value: &str) -> Result<u64, ConfigError> {
        match self.parse::<u64>(value)? {
            0 => Err(self.invalid(value, "must be greater than zero")),
            n => Ok(n),
        }
    }

    fn parse_positive(&self, value: &str) -> Result<f64, ConfigError> {
        let n: f64 = self.parse(value)?;
        if n.is_finite() && n > 0.0 {
            Ok(n)
        } else {
            Err(self.invalid(value, "must be a positive number"))
        }
    }

    fn parse_unit(&self, value: &str) -> Result<f64, ConfigError> {
        let n: f64 = self.parse(value)?;
        if (0.0..=1.0).contains(&n) {
            Ok(n)
        } else {
            Err(self.invalid(value, "must be between 0 and 1"))
        }
    }

    fn parse_path(&self, value: &str) -> Result<PathBuf, ConfigError> {
        if value.is_empty() {
            return Err(self.invalid(value, "path must not be empty"));
        }
        Ok(expand_tilde(value))
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section(), self.key_name())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

/// Expand a leading `~` to the home directory.
fn expand_tilde(value: &str) -> PathBuf {
    match value.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(value)),
        None => PathBuf::from(value),
    }
}
