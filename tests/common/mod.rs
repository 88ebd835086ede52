mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from cardtable for tests
pub use cardtable::{CalibrationConfig, CardDetector, CardRecord, Frame, GroupingStrategy, Player};
