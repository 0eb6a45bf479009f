//! Zone classification.
//!
//! Maps a coordinate to the first declared zone containing it. Priority is
//! declaration order, so points on a shared edge belong to the earlier zone.

use std::collections::HashSet;

use thiserror::Error;

use super::model::{Position, Zone, ZoneId};

/// Errors raised while building a zone table.
#[derive(Debug, Error, PartialEq)]
pub enum ZoneError {
    /// A zone has an empty id.
    #[error("zone id must not be empty")]
    EmptyId,

    /// A zone uses the reserved `OUTSIDE` id.
    #[error("zone id '{0}' is reserved")]
    ReservedId(String),

    /// Two zones share an id.
    #[error("duplicate zone id '{0}'")]
    DuplicateId(String),

    /// A bound is NaN or infinite, or min exceeds max.
    #[error("zone '{id}' has invalid bounds: x [{x_min}, {x_max}], y [{y_min}, {y_max}]")]
    InvalidBounds {
        id: String,
        x_min: f64,
        x_max: f64,
        y_min: f64,
        y_max: f64,
    },

    /// The yard dimensions are not positive finite numbers.
    #[error("yard dimensions must be positive, got {width} x {height}")]
    InvalidYard { width: f64, height: f64 },
}

/// Deterministic point-to-zone classifier over a static zone table.
#[derive(Debug, Clone)]
pub struct ZoneClassifier {
    zones: Vec<Zone>,
}

impl ZoneClassifier {
    /// Build a classifier, validating the zone table.
    ///
    /// Zones keep the order they are given in; that order is the tie-break
    /// priority for overlapping or touching zones.
    pub fn new(zones: Vec<Zone>) -> Result<Self, ZoneError> {
        let mut seen = HashSet::new();
        for zone in &zones {
            let id = zone.id.as_str();
            if id.is_empty() {
                return Err(ZoneError::EmptyId);
            }
            if zone.id.is_outside() {
                return Err(ZoneError::ReservedId(id.to_string()));
            }
            if !seen.insert(id.to_string()) {
                return Err(ZoneError::DuplicateId(id.to_string()));
            }
            let finite = [zone.x_min, zone.x_max, zone.y_min, zone.y_max]
                .iter()
                .all(|v| v.is_finite());
            if !finite || zone.x_min > zone.x_max || zone.y_min > zone.y_max {
                return Err(ZoneError::InvalidBounds {
                    id: id.to_string(),
                    x_min: zone.x_min,
                    x_max: zone.x_max,
                    y_min: zone.y_min,
                    y_max: zone.y_max,
                });
            }
        }
        Ok(Self { zones })
    }

    /// A classifier with no zones; everything is `OUTSIDE`.
    pub fn empty() -> Self {
        Self { zones: Vec::new() }
    }

    /// Classify a coordinate. Never fails.
    pub fn classify(&self, x: f64, y: f64) -> ZoneId {
        self.zones
            .iter()
            .find(|zone| zone.contains(x, y))
            .map(|zone| zone.id.clone())
            .unwrap_or_else(ZoneId::outside)
    }

    /// Classify a [`Position`].
    pub fn classify_position(&self, position: Position) -> ZoneId {
        self.classify(position.x, position.y)
    }

    /// Zones in priority order.
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Look up a zone by id.
    pub fn zone(&self, id: &ZoneId) -> Option<&Zone> {
        self.zones.iter().find(|zone| &zone.id == id)
    }
}
