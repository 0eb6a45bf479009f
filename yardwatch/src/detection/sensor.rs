//! Sensors (yard cameras) and their operational status.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::zone::Position;

/// Operational status of a sensor.
///
/// An offline sensor is a normal state, not an error: the engine simply
/// skips it for the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorStatus {
    Online,
    Offline,
}

impl SensorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorStatus::Online => "online",
            SensorStatus::Offline => "offline",
        }
    }

    /// Whether the sensor should be polled.
    pub fn is_operational(&self) -> bool {
        matches!(self, SensorStatus::Online)
    }
}

impl fmt::Display for SensorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "online" => Ok(SensorStatus::Online),
            "offline" => Ok(SensorStatus::Offline),
            other => Err(format!("unknown sensor status '{}'", other)),
        }
    }
}

/// A fixed sensor covering part of the yard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    pub id: String,
    /// Display name ("Entrance", "Area A", ...).
    pub name: String,
    /// Mounting point in yard coordinates.
    pub position: Position,
    /// Nominal coverage radius in metres.
    pub coverage: f64,
    pub status: SensorStatus,
    /// Frame rate of the feed.
    pub fps: u32,
}

impl Sensor {
    /// An online sensor with default coverage (30 m) and frame rate (30 fps).
    pub fn new(id: impl Into<String>, name: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            position: Position::new(x, y),
            coverage: 30.0,
            status: SensorStatus::Online,
            fps: 30,
        }
    }

    pub fn with_status(mut self, status: SensorStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_coverage(mut self, coverage: f64) -> Self {
        self.coverage = coverage;
        self
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    pub fn is_operational(&self) -> bool {
        self.status.is_operational()
    }

    /// The four-camera roster of the original yard deployment.
    pub fn default_roster() -> Vec<Sensor> {
        vec![
            Sensor::new("CAM1", "Entrance", 25.0, 20.0),
            Sensor::new("CAM2", "Area A", 75.0, 20.0),
            Sensor::new("CAM3", "Area B", 25.0, 60.0),
            Sensor::new("CAM4", "Area C", 75.0, 60.0),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing() {
        assert_eq!("Online".parse::<SensorStatus>().unwrap(), SensorStatus::Online);
        assert_eq!(" offline ".parse::<SensorStatus>().unwrap(), SensorStatus::Offline);
        assert!("broken".parse::<SensorStatus>().is_err());
    }

    #[test]
    fn test_default_roster() {
        let roster = Sensor::default_roster();
        assert_eq!(roster.len(), 4);
        assert!(roster.iter().all(Sensor::is_operational));
        assert_eq!(roster[3].position, Position::new(75.0, 60.0));
    }

    #[test]
    fn test_builder() {
        let sensor = Sensor::new("CAM9", "Back gate", 1.0, 2.0)
            .with_status(SensorStatus::Offline)
            .with_coverage(12.0)
            .with_fps(15);
        assert!(!sensor.is_operational());
        assert_eq!(sensor.coverage, 12.0);
        assert_eq!(sensor.fps, 15);
    }
}
