//! The on-disk configuration file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::{Ini, Properties};

use super::error::ConfigError;
use super::keys::ConfigKey;
use crate::detection::{Sensor, SensorStatus, SimulationConfig};
use crate::tracking::TrackingConfig;
use crate::zone::{YardBounds, YardLayout, Zone};

const ZONE_PREFIX: &str = "zone.";
const SENSOR_PREFIX: &str = "sensor.";

/// Directory holding `config.ini`.
pub fn config_directory() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("yardwatch")
}

/// Path of the default configuration file.
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

/// Directory for the database and logs.
pub fn data_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("yardwatch")
}

// =============================================================================
// Sections
// =============================================================================

/// `[yard]`
#[derive(Debug, Clone, PartialEq)]
pub struct YardSettings {
    pub width: f64,
    pub height: f64,
}

impl Default for YardSettings {
    fn default() -> Self {
        let bounds = YardBounds::default();
        Self {
            width: bounds.width,
            height: bounds.height,
        }
    }
}

/// `[tracking]`
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingSettings {
    pub interval_ms: u64,
    pub staleness_secs: u64,
    pub misplaced_probability: f64,
    pub seed: Option<u64>,
}

impl Default for TrackingSettings {
    fn default() -> Self {
        let defaults = TrackingConfig::default();
        Self {
            interval_ms: defaults.interval.as_millis() as u64,
            staleness_secs: defaults.staleness_threshold.as_secs(),
            misplaced_probability: defaults.misplaced_probability,
            seed: None,
        }
    }
}

/// `[simulation]`
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSettings {
    pub min_detections: usize,
    pub max_detections: usize,
    pub confidence_threshold: f64,
    pub id_pool: Option<u32>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        let defaults = SimulationConfig::default();
        Self {
            min_detections: defaults.min_detections,
            max_detections: defaults.max_detections,
            confidence_threshold: defaults.confidence_threshold,
            id_pool: defaults.id_pool,
        }
    }
}

/// `[storage]`
#[derive(Debug, Clone, PartialEq)]
pub struct StorageSettings {
    pub database: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            database: data_directory().join("yardwatch.db"),
        }
    }
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: data_directory().join("logs"),
        }
    }
}

// =============================================================================
// ConfigFile
// =============================================================================

/// Parsed `config.ini`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub yard: YardSettings,
    /// Zones in declaration (priority) order.
    pub zones: Vec<Zone>,
    pub sensors: Vec<Sensor>,
    pub tracking: TrackingSettings,
    pub simulation: SimulationSettings,
    pub storage: StorageSettings,
    pub logging: LoggingSettings,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            yard: YardSettings::default(),
            zones: YardLayout::default_zones(),
            sensors: Sensor::default_roster(),
            tracking: TrackingSettings::default(),
            simulation: SimulationSettings::default(),
            storage: StorageSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl ConfigFile {
    /// Load from the default path. A missing file yields defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    /// Parse INI text.
    pub fn from_ini_str(content: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(content).map_err(|e| ConfigError::Read {
            path: PathBuf::from("<string>"),
            reason: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for key in ConfigKey::all() {
            if let Some(value) = ini.get_from(Some(key.section()), key.key_name()) {
                key.set(&mut config, value)?;
            }
        }

        let mut zones = Vec::new();
        let mut sensors = Vec::new();
        for (section, props) in ini.iter() {
            let Some(section) = section else { continue };
            if let Some(id) = section.strip_prefix(ZONE_PREFIX) {
                zones.push(parse_zone(section, id, props)?);
            } else if let Some(id) = section.strip_prefix(SENSOR_PREFIX) {
                sensors.push(parse_sensor(section, id, props)?);
            }
        }
        if !zones.is_empty() {
            config.zones = zones;
        }
        if !sensors.is_empty() {
            config.sensors = sensors;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.simulation.min_detections > self.simulation.max_detections {
            return Err(ConfigError::invalid(
                "simulation",
                "min_detections",
                self.simulation.min_detections.to_string(),
                "must not exceed max_detections",
            ));
        }
        let mut ids = std::collections::HashSet::new();
        for sensor in &self.sensors {
            if !ids.insert(sensor.id.as_str()) {
                return Err(ConfigError::invalid(
                    format!("{}{}", SENSOR_PREFIX, sensor.id),
                    "id",
                    sensor.id.clone(),
                    "duplicate sensor id",
                ));
            }
        }
        self.yard_layout()?;
        Ok(())
    }

    /// Save to the default path, creating the directory if needed.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Save to `path`, creating parent directories if needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        self.to_ini().write_to_file(path).map_err(write_err)?;
        tracing::info!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    /// Render the configuration as INI text.
    pub fn to_ini_string(&self) -> String {
        let mut buf = Vec::new();
        // writing into a Vec cannot fail
        let _ = self.to_ini().write_to(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();

        let mut sections = ConfigKey::all().iter().peekable();
        while let Some(key) = sections.next() {
            let value = key.get(self);
            if !value.is_empty() {
                ini.with_section(Some(key.section()))
                    .set(key.key_name(), value);
            }
            // zones and sensors follow [yard] so the file reads top-down
            let end_of_yard = key.section() == "yard"
                && sections.peek().map(|next| next.section()) != Some("yard");
            if end_of_yard {
                self.write_layout(&mut ini);
            }
        }
        ini
    }

    fn write_layout(&self, ini: &mut Ini) {
        for zone in &self.zones {
            ini.with_section(Some(format!("{}{}", ZONE_PREFIX, zone.id)))
                .set("x_min", zone.x_min.to_string())
                .set("x_max", zone.x_max.to_string())
                .set("y_min", zone.y_min.to_string())
                .set("y_max", zone.y_max.to_string());
        }
        for sensor in &self.sensors {
            ini.with_section(Some(format!("{}{}", SENSOR_PREFIX, sensor.id)))
                .set("name", sensor.name.clone())
                .set("x", sensor.position.x.to_string())
                .set("y", sensor.position.y.to_string())
                .set("coverage", sensor.coverage.to_string())
                .set("status", sensor.status.as_str())
                .set("fps", sensor.fps.to_string());
        }
    }

    // =========================================================================
    // Typed views
    // =========================================================================

    /// Validated yard geometry.
    pub fn yard_layout(&self) -> Result<YardLayout, ConfigError> {
        Ok(YardLayout::new(
            YardBounds::new(self.yard.width, self.yard.height),
            self.zones.clone(),
        )?)
    }

    pub fn tracking_config(&self) -> TrackingConfig {
        let mut config = TrackingConfig::default()
            .with_interval(Duration::from_millis(self.tracking.interval_ms))
            .with_staleness_threshold(Duration::from_secs(self.tracking.staleness_secs))
            .with_misplaced_probability(self.tracking.misplaced_probability);
        config.seed = self.tracking.seed;
        config
    }

    pub fn simulation_config(&self) -> SimulationConfig {
        let mut config = SimulationConfig::default()
            .with_detections(self.simulation.min_detections, self.simulation.max_detections)
            .with_confidence_threshold(self.simulation.confidence_threshold);
        config.id_pool = self.simulation.id_pool;
        // derive the detector seed from the tracking seed so one knob
        // reproduces a whole run
        config.seed = self.tracking.seed.map(|s| s.wrapping_add(1));
        config
    }
}

// =============================================================================
// Section parsers
// =============================================================================

fn required_f64(section: &str, props: &Properties, key: &str) -> Result<f64, ConfigError> {
    let raw = props.get(key).ok_or_else(|| ConfigError::MissingKey {
        section: section.to_string(),
        key: key.to_string(),
    })?;
    parse_f64(section, key, raw)
}

fn parse_f64(section: &str, key: &str, raw: &str) -> Result<f64, ConfigError> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid(section, key, raw, "not a number"))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::invalid(section, key, raw, "must be finite"))
    }
}

fn parse_zone(section: &str, id: &str, props: &Properties) -> Result<Zone, ConfigError> {
    Ok(Zone::new(
        id.trim(),
        required_f64(section, props, "x_min")?,
        required_f64(section, props, "x_max")?,
        required_f64(section, props, "y_min")?,
        required_f64(section, props, "y_max")?,
    ))
}

fn parse_sensor(section: &str, id: &str, props: &Properties) -> Result<Sensor, ConfigError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ConfigError::invalid(section, "id", id, "sensor id must not be empty"));
    }
    let name = props.get("name").map(str::trim).unwrap_or(id);
    let mut sensor = Sensor::new(
        id,
        name,
        required_f64(section, props, "x")?,
        required_f64(section, props, "y")?,
    );
    if let Some(raw) = props.get("coverage") {
        sensor = sensor.with_coverage(parse_f64(section, "coverage", raw)?);
    }
    if let Some(raw) = props.get("status") {
        let status: SensorStatus = raw
            .parse()
            .map_err(|reason: String| ConfigError::invalid(section, "status", raw, reason))?;
        sensor = sensor.with_status(status);
    }
    if let Some(raw) = props.get("fps") {
        let fps = raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::invalid(section, "fps", raw, "not a whole number"))?;
        sensor = sensor.with_fps(fps);
    }
    Ok(sensor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::ZoneId;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = ConfigFile::load_from(&dir.path().join("absent.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
        assert_eq!(config.zones.len(), 4);
        assert_eq!(config.sensors.len(), 4);
        assert_eq!(config.tracking.staleness_secs, 120);
        assert_eq!(config.tracking.interval_ms, 1000);
    }

    #[test]
    fn test_partial_file_overrides_only_given_keys() {
        let config = ConfigFile::from_ini_str(
            "[tracking]\nstaleness_secs = 30\n\n[simulation]\nid_pool = 12\n",
        )
        .unwrap();
        assert_eq!(config.tracking.staleness_secs, 30);
        assert_eq!(config.tracking.misplaced_probability, 0.05);
        assert_eq!(config.simulation.id_pool, Some(12));
        assert_eq!(config.sensors, Sensor::default_roster());
    }

    #[test]
    fn test_zone_sections_keep_declaration_order() {
        let config = ConfigFile::from_ini_str(
            "[yard]\nwidth = 60\nheight = 20\n\n\
             [zone.WEST]\nx_min = 0\nx_max = 30\ny_min = 0\ny_max = 20\n\n\
             [zone.EAST]\nx_min = 30\nx_max = 60\ny_min = 0\ny_max = 20\n",
        )
        .unwrap();
        let ids: Vec<_> = config.zones.iter().map(|z| z.id.as_str()).collect();
        assert_eq!(ids, vec!["WEST", "EAST"]);

        let layout = config.yard_layout().unwrap();
        assert_eq!(layout.classifier().classify(30.0, 5.0), ZoneId::new("WEST"));
    }

    #[test]
    fn test_sensor_sections() {
        let config = ConfigFile::from_ini_str(
            "[sensor.GATE]\nname = Gate\nx = 5\ny = 5\nstatus = offline\nfps = 10\n",
        )
        .unwrap();
        assert_eq!(config.sensors.len(), 1);
        let gate = &config.sensors[0];
        assert_eq!(gate.name, "Gate");
        assert_eq!(gate.status, SensorStatus::Offline);
        assert_eq!(gate.fps, 10);
        assert_eq!(gate.coverage, 30.0);
    }

    #[test]
    fn test_invalid_values_name_section_and_key() {
        let err = ConfigFile::from_ini_str("[zone.A]\nx_min = 0\nx_max = 10\ny_min = 0\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey { ref key, .. } if key == "y_max"));

        let err = ConfigFile::from_ini_str("[sensor.C1]\nx = 1\ny = 1\nstatus = broken\n")
            .unwrap_err();
        assert!(err.to_string().contains("sensor.C1.status"));

        let err = ConfigFile::from_ini_str("[simulation]\nmin_detections = 6\n").unwrap_err();
        assert!(err.to_string().contains("min_detections"));

        let err = ConfigFile::from_ini_str("[zone.A]\nx_min = 9\nx_max = 1\ny_min = 0\ny_max = 1\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Layout(_)));
    }

    #[test]
    fn test_save_then_load_preserves_everything() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.ini");

        let mut config = ConfigFile::default();
        config.tracking.seed = Some(9);
        config.sensors[1].status = SensorStatus::Offline;
        config.storage.database = dir.path().join("yard.db");
        config.save_to(&path).unwrap();

        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_rendered_text_lists_yard_before_tracking() {
        let text = ConfigFile::default().to_ini_string();
        let yard = text.find("[yard]").unwrap();
        let zone = text.find("[zone.A]").unwrap();
        let sensor = text.find("[sensor.CAM4]").unwrap();
        let tracking = text.find("[tracking]").unwrap();
        assert!(yard < zone && zone < sensor && sensor < tracking);
        assert!(!text.contains("seed"));
    }

    #[test]
    fn test_typed_views() {
        let mut config = ConfigFile::default();
        config.tracking.seed = Some(7);
        config.tracking.interval_ms = 250;

        let tracking = config.tracking_config();
        assert_eq!(tracking.interval, Duration::from_millis(250));
        assert_eq!(tracking.seed, Some(7));

        let simulation = config.simulation_config();
        assert_eq!(simulation.seed, Some(8));
        assert_eq!(simulation.min_detections, 2);
    }
}
