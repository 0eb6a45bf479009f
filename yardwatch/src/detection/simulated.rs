//! Randomized camera simulation.
//!
//! Emulates an object detector looking at the yard from each sensor: every
//! poll yields a handful of boxes in normalized frame coordinates, which are
//! projected onto the yard around the sensor's mounting point. Boxes below
//! the confidence threshold are dropped here, at the source.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::sensor::Sensor;
use super::source::{BoundingBox, DetectionError, DetectionSource, RawDetection};

/// Vehicle models the simulator draws from.
const MODELS: &[&str] = &["Honda CG", "Yamaha", "Suzuki"];

/// Configuration for the simulated source.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Fewest candidate boxes per poll.
    pub min_detections: usize,
    /// Most candidate boxes per poll.
    pub max_detections: usize,
    /// Boxes at or below this confidence are discarded.
    pub confidence_threshold: f64,
    /// Range the simulated detector draws confidences from.
    pub confidence_range: (f64, f64),
    /// Width of the yard strip a camera frame covers, in metres.
    pub field_width: f64,
    /// Depth of the yard strip a camera frame covers, in metres.
    pub field_depth: f64,
    /// Restrict ids to a fleet of this many vehicles so they get re-seen.
    ///
    /// `None` draws ids from the full `MOTO_1000..=MOTO_9999` space.
    pub id_pool: Option<u32>,
    /// Fixed RNG seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            min_detections: 2,
            max_detections: 5,
            confidence_threshold: 0.3,
            confidence_range: (0.5, 0.95),
            field_width: 30.0,
            field_depth: 25.0,
            id_pool: None,
            seed: None,
        }
    }
}

impl SimulationConfig {
    pub fn with_detections(mut self, min: usize, max: usize) -> Self {
        self.min_detections = min;
        self.max_detections = max;
        self
    }

    pub fn with_confidence_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    pub fn with_id_pool(mut self, pool: u32) -> Self {
        self.id_pool = Some(pool);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Detection source producing random vehicle sightings.
pub struct SimulatedDetectionSource {
    config: SimulationConfig,
    rng: Mutex<StdRng>,
}

impl std::fmt::Debug for SimulatedDetectionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedDetectionSource")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SimulatedDetectionSource {
    pub fn new(config: SimulationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            config,
            rng: Mutex::new(rng),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(SimulationConfig::default())
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    fn draw_vehicle_number(&self, rng: &mut StdRng) -> u32 {
        match self.config.id_pool {
            Some(pool) if pool > 0 => 1000 + rng.random_range(0..pool),
            _ => rng.random_range(1000..=9999),
        }
    }
}

impl DetectionSource for SimulatedDetectionSource {
    fn detect(&self, sensor: &Sensor) -> Result<Vec<RawDetection>, DetectionError> {
        let mut rng = self.rng.lock();
        let cfg = &self.config;

        let max = cfg.max_detections.max(cfg.min_detections);
        let count = rng.random_range(cfg.min_detections..=max);
        let (conf_lo, conf_hi) = cfg.confidence_range;

        let mut detections = Vec::with_capacity(count);
        for _ in 0..count {
            let u = rng.random_range(0.1..0.9);
            let v = rng.random_range(0.1..0.9);
            let bbox = BoundingBox {
                x: u,
                y: v,
                width: rng.random_range(0.1..0.15),
                height: rng.random_range(0.1..0.2),
            };
            let confidence = if conf_hi > conf_lo {
                rng.random_range(conf_lo..conf_hi)
            } else {
                conf_lo
            };
            if confidence <= cfg.confidence_threshold {
                continue;
            }

            let number = self.draw_vehicle_number(&mut rng);
            let model = MODELS[rng.random_range(0..MODELS.len())];
            let world_x = sensor.position.x + (u - 0.5) * cfg.field_width;
            let world_y = sensor.position.y + (v - 0.5) * cfg.field_depth;

            detections.push(
                RawDetection::new(format!("MOTO_{}", number), world_x, world_y, confidence)
                    .with_label(format!("ABC-{}", number))
                    .with_model(model)
                    .with_bbox(bbox),
            );
        }

        Ok(detections)
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sensor() -> Sensor {
        Sensor::new("CAM1", "Entrance", 25.0, 20.0)
    }

    #[test]
    fn test_batch_size_within_configured_range() {
        let source = SimulatedDetectionSource::new(SimulationConfig::default().with_seed(7));
        for _ in 0..50 {
            let batch = source.detect(&sensor()).unwrap();
            assert!((2..=5).contains(&batch.len()), "got {}", batch.len());
        }
    }

    #[test]
    fn test_detections_are_valid_and_near_sensor() {
        let source = SimulatedDetectionSource::new(SimulationConfig::default().with_seed(11));
        for raw in source.detect(&sensor()).unwrap() {
            let valid = raw.validate().unwrap();
            assert!(valid.proposed_id.starts_with("MOTO_"));
            assert!((0.5..0.95).contains(&valid.confidence));
            // frame spans ±15 x ±12.5 around the sensor, minus the 0.1 margins
            assert!((valid.position.x - 25.0).abs() <= 12.0);
            assert!((valid.position.y - 20.0).abs() <= 10.0);
            assert!(valid.label.unwrap().starts_with("ABC-"));
            assert!(MODELS.contains(&valid.model.unwrap().as_str()));
        }
    }

    #[test]
    fn test_threshold_filters_everything() {
        let config = SimulationConfig::default()
            .with_seed(3)
            .with_confidence_threshold(0.99);
        let source = SimulatedDetectionSource::new(config);
        assert!(source.detect(&sensor()).unwrap().is_empty());
    }

    #[test]
    fn test_id_pool_limits_fleet() {
        let config = SimulationConfig::default().with_seed(5).with_id_pool(3);
        let source = SimulatedDetectionSource::new(config);
        for _ in 0..20 {
            for raw in source.detect(&sensor()).unwrap() {
                let id = raw.proposed_id.unwrap();
                assert!(["MOTO_1000", "MOTO_1001", "MOTO_1002"].contains(&id.as_str()));
            }
        }
    }

    #[test]
    fn test_seed_is_reproducible() {
        let a = SimulatedDetectionSource::new(SimulationConfig::default().with_seed(42));
        let b = SimulatedDetectionSource::new(SimulationConfig::default().with_seed(42));
        assert_eq!(a.detect(&sensor()).unwrap(), b.detect(&sensor()).unwrap());
    }
}
