use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Largest structuring element side accepted by the morphology masks.
pub const MAX_STRUCTURING_ELEMENT: u32 = 511;

/// Physical card aspect ratio (height / width) used to derive a strip
/// exactly one card footprint wide.
const CARD_ASPECT: f64 = 8.8 / 5.8;

/// How suit-marker contours are attributed to the card they belong to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingStrategy {
    /// Markers count toward their nearest enclosing card in the contour
    /// hierarchy.
    #[default]
    Containment,
    /// Markers count toward the card contour they immediately follow in
    /// discovery order. Mis-groups markers whenever the extraction order
    /// diverges from physical containment.
    DiscoveryOrder,
}

/// Per-deployment calibration for one physical table and camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Label of the deployment this calibration was measured on.
    #[serde(default)]
    pub deployment: String,
    pub width: u32,
    pub height: u32,
    pub slots_per_player: u32,
    pub card_area_min: u32,
    pub card_area_max: u32,
    pub suit_area_min: u32,
    pub suit_area_max: u32,
    /// Pixels at or above this value are foreground.
    pub threshold: u8,
    pub median_window: u32,
    pub dilate_size: u32,
    pub erode_size: u32,
    /// Width of each player's strip; `None` splits the frame in halves.
    #[serde(default)]
    pub region_width: Option<u32>,
    #[serde(default)]
    pub grouping: GroupingStrategy,
    #[serde(default)]
    pub max_rank: Option<u32>,
}

impl CalibrationConfig {
    /// Calibration of the original SUR40 table capture (960x540, five
    /// slots per player).
    pub fn sur40() -> Self {
        Self {
            deployment: "sur40".to_string(),
            width: 960,
            height: 540,
            slots_per_player: 5,
            card_area_min: 3500,
            card_area_max: 6000,
            suit_area_min: 50,
            suit_area_max: 500,
            threshold: 100,
            median_window: 5,
            dilate_size: 4,
            erode_size: 9,
            region_width: None,
            grouping: GroupingStrategy::Containment,
            max_rank: None,
        }
    }

    /// Load a calibration profile from a JSON file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyFrame {
                width: self.width,
                height: self.height,
            });
        }
        if self.slots_per_player == 0 || self.slots_per_player > self.height {
            return Err(ConfigError::SlotCount {
                slots: self.slots_per_player,
                height: self.height,
            });
        }
        if self.card_area_min > self.card_area_max {
            return Err(ConfigError::InvertedBand {
                band: "card",
                min: self.card_area_min,
                max: self.card_area_max,
            });
        }
        if self.suit_area_min > self.suit_area_max {
            return Err(ConfigError::InvertedBand {
                band: "suit marker",
                min: self.suit_area_min,
                max: self.suit_area_max,
            });
        }
        if self.median_window == 0 || self.median_window % 2 == 0 {
            return Err(ConfigError::MedianWindow(self.median_window));
        }
        for (op, size) in [("dilation", self.dilate_size), ("erosion", self.erode_size)] {
            if size == 0 || size > MAX_STRUCTURING_ELEMENT {
                return Err(ConfigError::StructuringElement { op, size });
            }
        }
        let half_width = self.width / 2;
        let region_width = self.region_width();
        if region_width == 0 || region_width > half_width {
            return Err(ConfigError::RegionWidth {
                region_width,
                half_width,
            });
        }
        Ok(())
    }

    /// Effective width of each player's strip.
    pub fn region_width(&self) -> u32 {
        self.region_width.unwrap_or(self.width / 2)
    }

    /// Strip width covering exactly one card footprint, given the slot
    /// height. This is the narrow layout the SUR40 table was run with.
    pub fn card_strip_width(&self) -> u32 {
        let slot_height = f64::from(self.height) / f64::from(self.slots_per_player.max(1));
        (slot_height * CARD_ASPECT) as u32
    }

    /// Number of bytes in one raw frame.
    pub fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self::sur40()
    }
}
