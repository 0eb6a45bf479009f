//! The yard layout: bounds plus zone table.

use super::classifier::{ZoneClassifier, ZoneError};
use super::model::{Position, YardBounds, Zone, ZoneId};

/// Validated yard geometry used by the tracking engine.
#[derive(Debug, Clone)]
pub struct YardLayout {
    bounds: YardBounds,
    classifier: ZoneClassifier,
}

impl Default for YardLayout {
    /// A 100 x 80 yard split into four quadrants A-D.
    fn default() -> Self {
        Self {
            bounds: YardBounds::default(),
            classifier: ZoneClassifier::new(Self::default_zones())
                .unwrap_or_else(|_| ZoneClassifier::empty()),
        }
    }
}

impl YardLayout {
    /// Validate and build a layout.
    pub fn new(bounds: YardBounds, zones: Vec<Zone>) -> Result<Self, ZoneError> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(bounds.width) || !valid(bounds.height) {
            return Err(ZoneError::InvalidYard {
                width: bounds.width,
                height: bounds.height,
            });
        }
        Ok(Self {
            bounds,
            classifier: ZoneClassifier::new(zones)?,
        })
    }

    /// Quadrant zones of the default 100 x 80 yard.
    pub fn default_zones() -> Vec<Zone> {
        vec![
            Zone::new("A", 0.0, 50.0, 0.0, 40.0),
            Zone::new("B", 50.0, 100.0, 0.0, 40.0),
            Zone::new("C", 0.0, 50.0, 40.0, 80.0),
            Zone::new("D", 50.0, 100.0, 40.0, 80.0),
        ]
    }

    pub fn bounds(&self) -> YardBounds {
        self.bounds
    }

    pub fn classifier(&self) -> &ZoneClassifier {
        &self.classifier
    }

    pub fn zones(&self) -> &[Zone] {
        self.classifier.zones()
    }

    /// Clamp a finite position into the yard and classify it.
    pub fn locate(&self, position: Position) -> (Position, ZoneId) {
        let clamped = self.bounds.clamp(position);
        (clamped, self.classifier.classify_position(clamped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_layout() {
        let layout = YardLayout::default();
        assert_eq!(layout.bounds(), YardBounds::new(100.0, 80.0));
        let ids: Vec<_> = layout.zones().iter().map(|z| z.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_rejects_degenerate_yard() {
        assert!(matches!(
            YardLayout::new(YardBounds::new(0.0, 80.0), vec![]),
            Err(ZoneError::InvalidYard { .. })
        ));
        assert!(YardLayout::new(YardBounds::new(f64::INFINITY, 80.0), vec![]).is_err());
    }

    #[test]
    fn test_locate_clamps_before_classifying() {
        let layout = YardLayout::default();
        let (pos, zone) = layout.locate(Position::new(-12.0, 95.0));
        assert_eq!(pos, Position::new(0.0, 80.0));
        assert_eq!(zone, ZoneId::new("C"));
    }

    proptest! {
        #[test]
        fn test_located_positions_stay_in_bounds(x in -500.0f64..500.0, y in -500.0f64..500.0) {
            let layout = YardLayout::default();
            let (pos, zone) = layout.locate(Position::new(x, y));
            prop_assert!(layout.bounds().contains(pos));
            // quadrants cover the whole yard
            prop_assert!(!zone.is_outside());
        }
    }
}
