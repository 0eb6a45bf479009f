//! Tracking engine configuration.

use std::time::Duration;

/// Default cycle interval.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Default time without a detection before an entity is declared missing.
pub const DEFAULT_STALENESS_THRESHOLD: Duration = Duration::from_secs(120);

/// Default per-cycle chance of raising a `misplaced` alert.
pub const DEFAULT_MISPLACED_PROBABILITY: f64 = 0.05;

/// Configuration for the tracking engine and its scheduler.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingConfig {
    /// Time between cycles.
    pub interval: Duration,
    /// An entity unseen for longer than this is swept.
    pub staleness_threshold: Duration,
    /// Chance per cycle of flagging one active entity as misplaced.
    pub misplaced_probability: f64,
    /// Seed for the misplaced picker; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            staleness_threshold: DEFAULT_STALENESS_THRESHOLD,
            misplaced_probability: DEFAULT_MISPLACED_PROBABILITY,
            seed: None,
        }
    }
}

impl TrackingConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_staleness_threshold(mut self, threshold: Duration) -> Self {
        self.staleness_threshold = threshold;
        self
    }

    /// Set the misplaced probability, clamped to `[0, 1]`.
    pub fn with_misplaced_probability(mut self, probability: f64) -> Self {
        self.misplaced_probability = if probability.is_nan() {
            0.0
        } else {
            probability.clamp(0.0, 1.0)
        };
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrackingConfig::default();
        assert_eq!(config.interval, Duration::from_secs(1));
        assert_eq!(config.staleness_threshold, Duration::from_secs(120));
        assert_eq!(config.misplaced_probability, 0.05);
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_probability_is_clamped() {
        assert_eq!(
            TrackingConfig::default()
                .with_misplaced_probability(1.7)
                .misplaced_probability,
            1.0
        );
        assert_eq!(
            TrackingConfig::default()
                .with_misplaced_probability(f64::NAN)
                .misplaced_probability,
            0.0
        );
    }
}
