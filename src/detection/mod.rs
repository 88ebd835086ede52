pub mod assemble;
pub mod contours;
pub mod encode;
pub mod preprocessing;
pub mod segment;

use image::GrayImage;

use crate::config::CalibrationConfig;
use crate::error::FrameError;
use crate::models::{CardRecord, Frame, Player};
use assemble::{AssembleParams, RegionCards, RegionSummary, SlotLayout};
use contours::AreaBands;
use preprocessing::NormalizeParams;

/// Intermediate images a [`StageObserver`] gets to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Region,
    Normalized,
    Binary,
}

impl Stage {
    pub fn dir_name(self) -> &'static str {
        match self {
            Stage::Region => "01_region",
            Stage::Normalized => "02_normalized",
            Stage::Binary => "03_binary",
        }
    }
}

/// Receives intermediate images while a frame is analyzed.
pub trait StageObserver {
    fn observe(&mut self, stage: Stage, player: Player, image: &GrayImage);
}

/// Observer that ignores everything.
pub struct NoopObserver;

impl StageObserver for NoopObserver {
    fn observe(&mut self, _stage: Stage, _player: Player, _image: &GrayImage) {}
}

/// Records for one player's strip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionReport {
    pub player: Player,
    pub records: Vec<CardRecord>,
    pub summary: RegionSummary,
}

/// Everything recognized in one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameReport {
    pub regions: [RegionReport; 2],
}

impl FrameReport {
    pub fn records(&self) -> impl Iterator<Item = &CardRecord> {
        self.regions.iter().flat_map(|r| r.records.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.regions.iter().all(|r| r.records.is_empty())
    }

    /// Encoded records, player one first, trailing comma kept. Empty when
    /// nothing was found.
    pub fn line(&self) -> String {
        let [one, two] = &self.regions;
        encode::encode_frame(&one.records, &two.records)
    }

    /// [`line`](Self::line), with the sentinel substituted when empty.
    pub fn wire_line(&self) -> String {
        if self.is_empty() {
            encode::EMPTY_SENTINEL.to_string()
        } else {
            self.line()
        }
    }
}

/// Frame-to-records recognizer for one calibration.
///
/// Analysis does no I/O and keeps no state between frames; the same frame
/// bytes always give the same report.
#[derive(Debug, Clone)]
pub struct CardDetector {
    config: CalibrationConfig,
}

impl CardDetector {
    pub fn new(config: CalibrationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    /// Bytes per raw frame.
    pub fn frame_len(&self) -> usize {
        self.config.frame_len()
    }

    /// Shape-check raw bytes against the calibration.
    pub fn frame_from_bytes(&self, bytes: Vec<u8>) -> Result<Frame, FrameError> {
        Frame::from_raw(self.config.width, self.config.height, bytes)
    }

    /// Shape-check and analyze raw bytes in one step.
    pub fn analyze_bytes(&self, bytes: Vec<u8>) -> Result<FrameReport, FrameError> {
        let frame = self.frame_from_bytes(bytes)?;
        Ok(self.analyze(&frame))
    }

    /// Run the full pipeline on a frame.
    pub fn analyze(&self, frame: &Frame) -> FrameReport {
        self.analyze_observed(frame, &mut NoopObserver)
    }

    /// Run the full pipeline, handing intermediate images to `observer`.
    pub fn analyze_observed(&self, frame: &Frame, observer: &mut dyn StageObserver) -> FrameReport {
        let normalize_params = NormalizeParams::from(&self.config);
        let bands = AreaBands::from(&self.config);

        let regions = segment::split_regions(frame, self.config.region_width());
        let reports = regions.map(|region| {
            let player = region.player;
            log::trace!(
                "player {player}: region {}x{} at x={}",
                region.image.width(),
                region.image.height(),
                region.x_offset
            );
            observer.observe(Stage::Region, player, &region.image);

            let normalized = preprocessing::normalize(&region.image, normalize_params);
            observer.observe(Stage::Normalized, player, &normalized);
            let binary = contours::binarize(&normalized, self.config.threshold);
            observer.observe(Stage::Binary, player, &binary);

            let tree = contours::extract_classified(&binary, &bands);
            let params = AssembleParams {
                layout: SlotLayout {
                    slots: self.config.slots_per_player,
                    region_height: region.height(),
                },
                grouping: self.config.grouping,
                max_rank: self.config.max_rank,
            };
            let RegionCards { records, summary } = assemble::assemble(&tree, player, &params);
            log::debug!(
                "player {player}: {} cards recognized ({} card contours, {} skipped, {} dropped)",
                records.len(),
                summary.cards_seen,
                summary.cards_skipped,
                summary.cards_dropped
            );

            RegionReport {
                player,
                records,
                summary,
            }
        });

        FrameReport { regions: reports }
    }
}
