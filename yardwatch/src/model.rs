//! Tracked entities and alerts.
//!
//! These are the records shared between the tracking engine, the entity
//! store and consumers. Timestamps are UTC wall-clock times so they survive
//! persistence and can be compared across restarts.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::zone::{Position, ZoneId};

/// Lifecycle status of a tracked entity.
///
/// Only `Active` exists: an entity that goes stale is dropped from the
/// active set and a terminal alert is recorded instead of a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityStatus {
    Active,
}

impl EntityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityStatus::Active => "active",
        }
    }
}

impl fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(EntityStatus::Active),
            other => Err(format!("unknown entity status '{}'", other)),
        }
    }
}

/// A vehicle currently or previously seen in the yard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedEntity {
    /// Unique id proposed by the detection source.
    pub id: String,
    /// Human-facing label (licence plate).
    pub label: String,
    /// Vehicle model.
    pub model: String,
    /// Last known position, always inside the yard bounds.
    pub position: Position,
    /// Zone of the last known position.
    pub zone: ZoneId,
    pub status: EntityStatus,
    /// When the entity was last detected.
    pub last_seen: DateTime<Utc>,
    /// Sensor that produced the last detection.
    pub source_sensor_id: String,
    /// Detection confidence in `[0, 1]`.
    pub confidence: f64,
}

impl TrackedEntity {
    /// Time elapsed since the entity was last seen.
    ///
    /// Negative when `now` precedes `last_seen` (clock skew between callers).
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.last_seen
    }
}

/// Kind of alert raised by the tracking engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    /// No detection within the staleness threshold; terminal for the entity.
    Missing,
    /// Heuristic signal that an entity may be in the wrong place.
    Misplaced,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Missing => "missing",
            AlertKind::Misplaced => "misplaced",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "missing" => Ok(AlertKind::Missing),
            "misplaced" => Ok(AlertKind::Misplaced),
            other => Err(format!("unknown alert kind '{}'", other)),
        }
    }
}

/// An alert about a tracked entity.
///
/// `id` never changes once created. `resolved` starts false and is only
/// flipped by an external resolution action through the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub kind: AlertKind,
    /// Id of the entity the alert refers to (reference, not ownership).
    pub entity_id: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub resolved: bool,
}

impl Alert {
    /// Create a new unresolved alert with a fresh id.
    pub fn new(
        kind: AlertKind,
        entity_id: impl Into<String>,
        description: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            entity_id: entity_id.into(),
            description: description.into(),
            timestamp,
            resolved: false,
        }
    }

    /// Alert for an entity that has not been seen within the threshold.
    pub fn missing(entity: &TrackedEntity, threshold: std::time::Duration, now: DateTime<Utc>) -> Self {
        Self::new(
            AlertKind::Missing,
            entity.id.clone(),
            format!(
                "Vehicle {} not seen for {}s (last in zone {} at {})",
                entity.label,
                threshold.as_secs(),
                entity.zone,
                entity.position
            ),
            now,
        )
    }

    /// Alert for an entity that may be parked in the wrong zone.
    pub fn misplaced(entity: &TrackedEntity, now: DateTime<Utc>) -> Self {
        Self::new(
            AlertKind::Misplaced,
            entity.id.clone(),
            format!(
                "Vehicle {} may be in the wrong place (zone {})",
                entity.label, entity.zone
            ),
            now,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn entity() -> TrackedEntity {
        TrackedEntity {
            id: "MOTO_1234".to_string(),
            label: "ABC-1234".to_string(),
            model: "Yamaha".to_string(),
            position: Position::new(25.0, 20.0),
            zone: ZoneId::new("A"),
            status: EntityStatus::Active,
            last_seen: Utc::now(),
            source_sensor_id: "CAM1".to_string(),
            confidence: 0.8,
        }
    }

    #[test]
    fn test_kind_and_status_round_trip_through_str() {
        for kind in [AlertKind::Missing, AlertKind::Misplaced] {
            assert_eq!(kind.as_str().parse::<AlertKind>().unwrap(), kind);
        }
        assert_eq!("active".parse::<EntityStatus>().unwrap(), EntityStatus::Active);
        assert!("gone".parse::<EntityStatus>().is_err());
        assert!("stolen".parse::<AlertKind>().is_err());
    }

    #[test]
    fn test_missing_alert_references_entity() {
        let e = entity();
        let alert = Alert::missing(&e, Duration::from_secs(120), Utc::now());
        assert_eq!(alert.kind, AlertKind::Missing);
        assert_eq!(alert.entity_id, "MOTO_1234");
        assert!(!alert.resolved);
        assert!(alert.description.contains("ABC-1234"));
        assert!(alert.description.contains("120s"));
    }

    #[test]
    fn test_alert_ids_are_unique() {
        let e = entity();
        let now = Utc::now();
        assert_ne!(Alert::misplaced(&e, now).id, Alert::misplaced(&e, now).id);
    }

    #[test]
    fn test_age() {
        let mut e = entity();
        let now = Utc::now();
        e.last_seen = now - chrono::Duration::seconds(30);
        assert_eq!(e.age(now), chrono::Duration::seconds(30));
    }

    #[test]
    fn test_alert_serializes_kind_lowercase() {
        let alert = Alert::misplaced(&entity(), Utc::now());
        let json = serde_json::to_string(&alert).unwrap();
        assert!(json.contains("\"kind\":\"misplaced\""));
    }
}
