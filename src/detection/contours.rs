use image::{GrayImage, Luma};
use imageproc::contours::{BorderType, find_contours};
use imageproc::contrast::{ThresholdType, threshold};
use imageproc::geometry::contour_area;

use crate::config::CalibrationConfig;
use crate::models::{BorderKind, BoundingBox, Classification, Contour, ContourTree};

/// Inclusive area bands separating cards from suit markers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaBands {
    pub card_min: f64,
    pub card_max: f64,
    pub suit_min: f64,
    pub suit_max: f64,
}

impl From<&CalibrationConfig> for AreaBands {
    fn from(config: &CalibrationConfig) -> Self {
        Self {
            card_min: f64::from(config.card_area_min),
            card_max: f64::from(config.card_area_max),
            suit_min: f64::from(config.suit_area_min),
            suit_max: f64::from(config.suit_area_max),
        }
    }
}

impl AreaBands {
    pub fn classify(&self, area: f64) -> Classification {
        if (self.card_min..=self.card_max).contains(&area) {
            Classification::Card
        } else if (self.suit_min..=self.suit_max).contains(&area) {
            Classification::SuitMarker
        } else {
            Classification::Noise
        }
    }
}

/// Foreground is every pixel at or above `level`.
pub fn binarize(img: &GrayImage, level: u8) -> GrayImage {
    match level.checked_sub(1) {
        Some(below) => threshold(img, below, ThresholdType::Binary),
        None => GrayImage::from_pixel(img.width(), img.height(), Luma([255u8])),
    }
}

/// Trace every border in a binary image, outer borders and holes alike,
/// in discovery order with parent links preserved.
pub fn find_borders(binary: &GrayImage) -> Vec<Contour> {
    find_contours::<i32>(binary)
        .into_iter()
        .filter_map(|traced| {
            let min_x = traced.points.iter().map(|p| p.x).min()?;
            let min_y = traced.points.iter().map(|p| p.y).min()?;
            let max_x = traced.points.iter().map(|p| p.x).max()?;
            let max_y = traced.points.iter().map(|p| p.y).max()?;
            let border = match traced.border_type {
                BorderType::Outer => BorderKind::Outer,
                BorderType::Hole => BorderKind::Hole,
            };
            Some(Contour {
                bbox: BoundingBox::new(
                    min_x as u32,
                    min_y as u32,
                    (max_x - min_x + 1) as u32,
                    (max_y - min_y + 1) as u32,
                ),
                area: contour_area(&traced.points),
                border,
                parent: traced.parent,
            })
        })
        .collect()
}

/// Classify each contour by area, keeping discovery order and hierarchy.
pub fn classify(contours: Vec<Contour>, bands: &AreaBands) -> ContourTree {
    let mut tree = ContourTree::new();
    for contour in contours {
        let class = bands.classify(contour.area);
        tree.push(contour, class);
    }
    tree
}

/// Trace and classify every border of a binarized region.
pub fn extract_classified(binary: &GrayImage, bands: &AreaBands) -> ContourTree {
    let tree = classify(find_borders(binary), bands);
    log::trace!(
        "{} contours: {} card, {} suit marker",
        tree.len(),
        tree.indices_of(Classification::Card).count(),
        tree.indices_of(Classification::SuitMarker).count()
    );
    tree
}
