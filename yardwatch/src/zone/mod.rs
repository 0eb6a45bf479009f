//! Spatial model of the yard and zone classification.
//!
//! The yard is a bounded rectangle with its origin at `(0, 0)`. Zones are
//! static axis-aligned rectangles declared in configuration; together they
//! partition the yard, possibly leaving gaps. A point that falls into no zone
//! classifies as [`ZoneId::OUTSIDE`].
//!
//! # Example
//!
//! ```
//! use yardwatch::zone::{Zone, ZoneClassifier, ZoneId};
//!
//! let classifier = ZoneClassifier::new(vec![
//!     Zone::new("A", 0.0, 50.0, 0.0, 40.0),
//!     Zone::new("B", 50.0, 100.0, 0.0, 40.0),
//! ]).unwrap();
//!
//! assert_eq!(classifier.classify(25.0, 20.0), ZoneId::new("A"));
//! assert_eq!(classifier.classify(50.0, 10.0), ZoneId::new("A")); // shared edge, first wins
//! assert!(classifier.classify(25.0, 60.0).is_outside());
//! ```

mod classifier;
mod layout;
mod model;

pub use classifier::{ZoneClassifier, ZoneError};
pub use layout::YardLayout;
pub use model::{Position, YardBounds, Zone, ZoneId};
