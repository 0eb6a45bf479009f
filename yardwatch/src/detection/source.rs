//! The detection source trait and raw detection records.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::sensor::Sensor;
use crate::zone::Position;

/// A detection box in normalized frame coordinates (`0..1`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One detection as produced by a source, before validation.
///
/// Every field is optional on the wire so that partially populated records
/// from external feeds can be represented and rejected individually.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    /// Entity id proposed by the source.
    #[serde(default)]
    pub proposed_id: Option<String>,
    /// World position in yard coordinates (not yet clamped).
    #[serde(default)]
    pub position: Option<Position>,
    /// Detector confidence in `[0, 1]`.
    #[serde(default)]
    pub confidence: Option<f64>,
    /// Licence plate, if the source read one.
    #[serde(default)]
    pub label: Option<String>,
    /// Vehicle model, if the source classified one.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub bbox: Option<BoundingBox>,
}

impl RawDetection {
    /// A fully populated detection.
    pub fn new(proposed_id: impl Into<String>, x: f64, y: f64, confidence: f64) -> Self {
        Self {
            proposed_id: Some(proposed_id.into()),
            position: Some(Position::new(x, y)),
            confidence: Some(confidence),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    /// Check required fields and value ranges.
    pub fn validate(&self) -> Result<ValidDetection, MalformedDetection> {
        let proposed_id = match self.proposed_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => return Err(MalformedDetection::MissingId),
        };
        let position = self.position.ok_or(MalformedDetection::MissingPosition {
            id: proposed_id.clone(),
        })?;
        if !position.is_finite() {
            return Err(MalformedDetection::NonFinitePosition {
                id: proposed_id,
                x: position.x,
                y: position.y,
            });
        }
        let confidence = self.confidence.ok_or(MalformedDetection::MissingConfidence {
            id: proposed_id.clone(),
        })?;
        if !(0.0..=1.0).contains(&confidence) {
            return Err(MalformedDetection::ConfidenceOutOfRange {
                id: proposed_id,
                confidence,
            });
        }

        Ok(ValidDetection {
            proposed_id,
            position,
            confidence,
            label: self.label.clone().filter(|l| !l.trim().is_empty()),
            model: self.model.clone().filter(|m| !m.trim().is_empty()),
        })
    }
}

/// A detection that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidDetection {
    pub proposed_id: String,
    pub position: Position,
    pub confidence: f64,
    pub label: Option<String>,
    pub model: Option<String>,
}

/// Why a raw detection was rejected.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MalformedDetection {
    #[error("detection has no entity id")]
    MissingId,

    #[error("detection for '{id}' has no position")]
    MissingPosition { id: String },

    #[error("detection for '{id}' has non-finite position ({x}, {y})")]
    NonFinitePosition { id: String, x: f64, y: f64 },

    #[error("detection for '{id}' has no confidence")]
    MissingConfidence { id: String },

    #[error("detection for '{id}' has confidence {confidence} outside [0, 1]")]
    ConfidenceOutOfRange { id: String, confidence: f64 },
}

/// A source failed to produce a batch for a sensor.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DetectionError {
    #[error("sensor '{0}' is not known to this source")]
    UnknownSensor(String),

    #[error("detection source failed for sensor '{sensor}': {reason}")]
    Failed { sensor: String, reason: String },
}

/// Produces raw detections for a sensor, once per polling cycle.
///
/// Implementations must be shareable across the scheduler thread and the
/// rest of the service; use interior mutability for any per-call state.
///
/// # Implementors
///
/// - `SimulatedDetectionSource` - randomized camera simulation
/// - `ScriptedDetectionSource` - replays recorded batches
pub trait DetectionSource: Send + Sync {
    /// Poll one sensor. An empty batch is a normal result.
    fn detect(&self, sensor: &Sensor) -> Result<Vec<RawDetection>, DetectionError>;

    /// Short name for logs and startup output.
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_detection_is_valid() {
        let valid = RawDetection::new("X1", 25.0, 20.0, 0.7)
            .with_label("ABC-1000")
            .validate()
            .unwrap();
        assert_eq!(valid.proposed_id, "X1");
        assert_eq!(valid.position, Position::new(25.0, 20.0));
        assert_eq!(valid.label.as_deref(), Some("ABC-1000"));
        assert!(valid.model.is_none());
    }

    #[test]
    fn test_confidence_bounds_are_inclusive() {
        assert!(RawDetection::new("X1", 0.0, 0.0, 0.0).validate().is_ok());
        assert!(RawDetection::new("X1", 0.0, 0.0, 1.0).validate().is_ok());
        assert!(matches!(
            RawDetection::new("X1", 0.0, 0.0, 1.01).validate(),
            Err(MalformedDetection::ConfidenceOutOfRange { .. })
        ));
        assert!(matches!(
            RawDetection::new("X1", 0.0, 0.0, f64::NAN).validate(),
            Err(MalformedDetection::ConfidenceOutOfRange { .. })
        ));
    }

    #[test]
    fn test_missing_fields_are_malformed() {
        let mut raw = RawDetection::new("X1", 1.0, 1.0, 0.5);
        raw.proposed_id = Some("   ".to_string());
        assert_eq!(raw.validate(), Err(MalformedDetection::MissingId));

        let mut raw = RawDetection::new("X1", 1.0, 1.0, 0.5);
        raw.position = None;
        assert!(matches!(raw.validate(), Err(MalformedDetection::MissingPosition { .. })));

        let mut raw = RawDetection::new("X1", 1.0, 1.0, 0.5);
        raw.confidence = None;
        assert!(matches!(raw.validate(), Err(MalformedDetection::MissingConfidence { .. })));
    }

    #[test]
    fn test_out_of_yard_position_is_still_valid() {
        // clamping happens in the engine, not here
        assert!(RawDetection::new("X1", -40.0, 500.0, 0.5).validate().is_ok());
        assert!(matches!(
            RawDetection::new("X1", f64::INFINITY, 0.0, 0.5).validate(),
            Err(MalformedDetection::NonFinitePosition { .. })
        ));
    }

    #[test]
    fn test_deserialize_partial_record() {
        let raw: RawDetection =
            serde_json::from_str(r#"{"proposed_id": "X9", "confidence": 0.4}"#).unwrap();
        assert!(raw.position.is_none());
        assert!(raw.validate().is_err());
    }
}
