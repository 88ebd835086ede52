use image::{GrayImage, Luma};
use imageproc::filter::{Kernel, median_filter};
use imageproc::morphology::{Mask, grayscale_dilate, grayscale_erode};

use crate::config::CalibrationConfig;

/// 5x5 high-boost kernel. Weights sum to one, so flat areas keep their
/// intensity while thin ink strokes gain contrast.
#[rustfmt::skip]
const SHARPEN_KERNEL: [i32; 25] = [
    -1, -1, -1, -1, -1,
    -1, -1, -1, -1, -1,
    -1, -1, 25, -1, -1,
    -1, -1, -1, -1, -1,
    -1, -1, -1, -1, -1,
];

/// Filter sizes for [`normalize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeParams {
    /// Odd median window side.
    pub median_window: u32,
    pub dilate_size: u32,
    pub erode_size: u32,
}

impl From<&CalibrationConfig> for NormalizeParams {
    fn from(config: &CalibrationConfig) -> Self {
        Self {
            median_window: config.median_window,
            dilate_size: config.dilate_size,
            erode_size: config.erode_size,
        }
    }
}

/// Sharpen, despeckle and close a region so each suit mark collapses into
/// one compact blob while the card border survives.
pub fn normalize(region: &GrayImage, params: NormalizeParams) -> GrayImage {
    let sharpened = sharpen(region);
    let radius = params.median_window / 2;
    let despeckled = median_filter(&sharpened, radius, radius);
    let dilated = grayscale_dilate(&despeckled, &rect_mask(params.dilate_size));
    grayscale_erode(&dilated, &rect_mask(params.erode_size))
}

/// Apply the high-boost kernel, saturating to the u8 range.
pub fn sharpen(img: &GrayImage) -> GrayImage {
    Kernel::new(&SHARPEN_KERNEL, 5, 5)
        .filter::<Luma<u8>, _, Luma<u8>>(img, |out, acc: i32| *out = acc.clamp(0, 255) as u8)
}

/// Rectangular structuring element of side `size`, anchored at its center
/// (rounded down for even sizes).
fn rect_mask(size: u32) -> Mask {
    let side = size.clamp(1, crate::config::MAX_STRUCTURING_ELEMENT);
    let block = GrayImage::from_pixel(side, side, Luma([255u8]));
    let anchor = (side / 2) as u8;
    Mask::from_image(&block, anchor, anchor)
}
