//! Configuration file handling.
//!
//! Settings live in an INI file at `~/.config/yardwatch/config.ini` (the
//! platform config directory). A missing file is not an error: every
//! setting has a default matching a stock four-camera, four-zone yard.
//!
//! # Layout
//!
//! ```ini
//! [yard]
//! width = 100
//! height = 80
//!
//! [zone.A]            ; one section per zone, declaration order is priority
//! x_min = 0
//! x_max = 50
//! y_min = 0
//! y_max = 40
//!
//! [sensor.CAM1]       ; one section per sensor
//! name = Entrance
//! x = 25
//! y = 20
//! status = online
//!
//! [tracking]
//! interval_ms = 1000
//! staleness_secs = 120
//! misplaced_probability = 0.05
//!
//! [simulation]
//! min_detections = 2
//! max_detections = 5
//! confidence_threshold = 0.3
//!
//! [storage]
//! database = /home/user/.local/share/yardwatch/yardwatch.db
//!
//! [logging]
//! directory = /home/user/.local/share/yardwatch/logs
//! ```

mod error;
mod file;
mod keys;

pub use error::ConfigError;
pub use file::{
    config_directory, config_file_path, data_directory, ConfigFile, LoggingSettings,
    SimulationSettings, StorageSettings, TrackingSettings, YardSettings,
};
pub use keys::ConfigKey;
