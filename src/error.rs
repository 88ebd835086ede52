use std::path::PathBuf;

/// Raised by the caller-side frame constructors when raw input does not
/// match the configured geometry. The recognition pipeline itself never
/// fails.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame shape mismatch: expected {expected_width}x{expected_height} pixels, got {actual_len} bytes")]
    InputShape {
        expected_width: u32,
        expected_height: u32,
        actual_len: usize,
    },
    #[error("image is {actual_width}x{actual_height}, calibration expects {expected_width}x{expected_height}")]
    ImageDimensions {
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },
}

/// Errors from loading or validating a calibration profile.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read calibration file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse calibration file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("frame dimensions must be non-zero (got {width}x{height})")]
    EmptyFrame { width: u32, height: u32 },
    #[error("slots per player must be between 1 and the frame height {height} (got {slots})")]
    SlotCount { slots: u32, height: u32 },
    #[error("{band} area band is inverted: min {min} > max {max}")]
    InvertedBand {
        band: &'static str,
        min: u32,
        max: u32,
    },
    #[error("median window must be odd and non-zero (got {0})")]
    MedianWindow(u32),
    #[error("{op} structuring element must be 1..=511 pixels (got {size})")]
    StructuringElement { op: &'static str, size: u32 },
    #[error("region width {region_width} must be between 1 and half the frame width {half_width}")]
    RegionWidth { region_width: u32, half_width: u32 },
}
