//! Replays pre-recorded detection batches.

use std::collections::{HashMap, VecDeque};
use std::path::Path;

use parking_lot::Mutex;

use super::sensor::Sensor;
use super::source::{DetectionError, DetectionSource, RawDetection};

type Batch = Result<Vec<RawDetection>, DetectionError>;

/// Detection source that returns queued batches, one per poll, per sensor.
///
/// A sensor with nothing queued yields an empty batch. Recordings can be
/// loaded from JSON shaped as `{"CAM1": [[{...}, {...}], []], "CAM2": [...]}`.
#[derive(Debug, Default)]
pub struct ScriptedDetectionSource {
    queues: Mutex<HashMap<String, VecDeque<Batch>>>,
}

impl ScriptedDetectionSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a batch for the sensor's next poll.
    pub fn push_batch(&self, sensor_id: impl Into<String>, batch: Vec<RawDetection>) {
        self.queues
            .lock()
            .entry(sensor_id.into())
            .or_default()
            .push_back(Ok(batch));
    }

    /// Queue a source failure for the sensor's next poll.
    pub fn push_failure(&self, sensor_id: impl Into<String>, reason: impl Into<String>) {
        let sensor = sensor_id.into();
        let error = DetectionError::Failed {
            sensor: sensor.clone(),
            reason: reason.into(),
        };
        self.queues
            .lock()
            .entry(sensor)
            .or_default()
            .push_back(Err(error));
    }

    /// Number of batches still queued across all sensors.
    pub fn pending(&self) -> usize {
        self.queues.lock().values().map(VecDeque::len).sum()
    }

    /// Parse a JSON recording.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        let recording: HashMap<String, Vec<Vec<RawDetection>>> = serde_json::from_str(json)?;
        let source = Self::new();
        for (sensor_id, batches) in recording {
            for batch in batches {
                source.push_batch(sensor_id.clone(), batch);
            }
        }
        Ok(source)
    }

    /// Load a JSON recording from disk.
    pub fn from_json_file(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

impl DetectionSource for ScriptedDetectionSource {
    fn detect(&self, sensor: &Sensor) -> Result<Vec<RawDetection>, DetectionError> {
        self.queues
            .lock()
            .get_mut(&sensor.id)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batches_replay_in_order_then_empty() {
        let source = ScriptedDetectionSource::new();
        let cam = Sensor::new("CAM1", "Entrance", 0.0, 0.0);
        source.push_batch("CAM1", vec![RawDetection::new("X1", 1.0, 1.0, 0.9)]);
        source.push_batch("CAM1", vec![]);
        assert_eq!(source.pending(), 2);

        assert_eq!(source.detect(&cam).unwrap().len(), 1);
        assert!(source.detect(&cam).unwrap().is_empty());
        assert!(source.detect(&cam).unwrap().is_empty());
        assert_eq!(source.pending(), 0);
    }

    #[test]
    fn test_failure_is_returned_once() {
        let source = ScriptedDetectionSource::new();
        let cam = Sensor::new("CAM2", "Area A", 0.0, 0.0);
        source.push_failure("CAM2", "lens fogged");
        assert!(matches!(source.detect(&cam), Err(DetectionError::Failed { .. })));
        assert!(source.detect(&cam).is_ok());
    }

    #[test]
    fn test_from_json_recording() {
        let json = r#"{
            "CAM1": [[{"proposed_id": "X1", "position": {"x": 25.0, "y": 20.0}, "confidence": 0.8}]],
            "CAM2": [[], [{"proposed_id": "X2"}]]
        }"#;
        let source = ScriptedDetectionSource::from_json_str(json).unwrap();
        assert_eq!(source.pending(), 3);

        let cam2 = Sensor::new("CAM2", "Area A", 0.0, 0.0);
        assert!(source.detect(&cam2).unwrap().is_empty());
        let second = source.detect(&cam2).unwrap();
        assert!(second[0].validate().is_err());
    }
}
