//! Core spatial types: positions, yard bounds and zones.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a yard zone.
///
/// Zone ids are free-form strings taken from configuration (`"A"`, `"B"`, ...).
/// The reserved id [`ZoneId::OUTSIDE`] marks a position that falls into no
/// configured zone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(String);

impl ZoneId {
    /// Reserved id for positions outside every configured zone.
    pub const OUTSIDE: &'static str = "OUTSIDE";

    /// Create a zone id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The sentinel zone for unclassified positions.
    pub fn outside() -> Self {
        Self(Self::OUTSIDE.to_string())
    }

    /// Whether this is the `OUTSIDE` sentinel.
    pub fn is_outside(&self) -> bool {
        self.0 == Self::OUTSIDE
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ZoneId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A point in yard coordinates (metres from the yard origin).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Whether both coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// The bounded yard rectangle `[0, width] × [0, height]`.
///
/// Every tracked position is clamped into these bounds; out-of-range
/// sightings are pulled onto the nearest edge rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YardBounds {
    pub width: f64,
    pub height: f64,
}

impl Default for YardBounds {
    fn default() -> Self {
        Self {
            width: 100.0,
            height: 80.0,
        }
    }
}

impl YardBounds {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Clamp a position into the yard rectangle.
    ///
    /// The caller must have checked that the position is finite; NaN inputs
    /// are passed through by `f64::clamp`.
    pub fn clamp(&self, position: Position) -> Position {
        Position {
            x: position.x.clamp(0.0, self.width),
            y: position.y.clamp(0.0, self.height),
        }
    }

    /// Whether the position lies inside the yard (edges included).
    pub fn contains(&self, position: Position) -> bool {
        (0.0..=self.width).contains(&position.x) && (0.0..=self.height).contains(&position.y)
    }
}

/// A static, axis-aligned yard zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Zone {
    /// Create a zone from its id and bounds.
    pub fn new(id: impl Into<String>, x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            id: ZoneId::new(id),
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// Whether the point lies inside the zone, inclusive on all four bounds.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.x_min <= x && x <= self.x_max && self.y_min <= y && y <= self.y_max
    }

    /// Centre of the zone.
    pub fn center(&self) -> Position {
        Position::new(
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }
}
