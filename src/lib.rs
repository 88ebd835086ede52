pub mod bridge;
pub mod config;
pub mod console;
pub mod debug;
pub mod detection;
pub mod error;
pub mod models;

pub use config::{CalibrationConfig, GroupingStrategy};
pub use detection::{CardDetector, FrameReport, RegionReport};
pub use error::{ConfigError, FrameError};
pub use models::{
    BoundingBox, CardRecord, Classification, Contour, ContourTree, Frame, Player, Region, Suit,
};
