use cardtable::{CalibrationConfig, Frame, GroupingStrategy, Player};
use image::{GrayImage, Luma};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

pub const WIDTH: u32 = 400;
pub const HEIGHT: u32 = 500;
pub const SLOTS: u32 = 5;
pub const SLOT_HEIGHT: u32 = HEIGHT / SLOTS;

const TABLE: Luma<u8> = Luma([15]);
const CARD: Luma<u8> = Luma([235]);
const INK: Luma<u8> = Luma([25]);
const MARKER_SIZE: u32 = 10;

/// Marker offsets inside an 80x90 upright card.
const PORTRAIT_MARKERS: [(i32, i32); 4] = [(18, 15), (52, 15), (18, 60), (52, 60)];
/// Marker offsets inside a 120x80 card lying sideways.
const LANDSCAPE_MARKERS: [(i32, i32); 6] = [(20, 15), (55, 15), (90, 15), (20, 55), (55, 55), (90, 55)];

/// Calibration for the synthetic 400x500 table: two 200 px strips with
/// five 100 px slots each.
pub fn test_config() -> CalibrationConfig {
    CalibrationConfig {
        deployment: "synthetic".to_string(),
        width: WIDTH,
        height: HEIGHT,
        slots_per_player: SLOTS,
        card_area_min: 3000,
        card_area_max: 12000,
        suit_area_min: 60,
        suit_area_max: 1500,
        threshold: 100,
        median_window: 5,
        dilate_size: 4,
        erode_size: 9,
        region_width: None,
        grouping: GroupingStrategy::Containment,
        max_rank: None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// 80x90, taller than wide.
    Portrait,
    /// 120x80, wider than tall.
    Landscape,
}

/// Draws bright cards with dark suit marks onto a dark table.
pub struct TableBuilder {
    image: GrayImage,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self {
            image: GrayImage::from_pixel(WIDTH, HEIGHT, TABLE),
        }
    }

    fn strip_x(player: Player) -> i32 {
        match player {
            Player::One => 0,
            Player::Two => (WIDTH / 2) as i32,
        }
    }

    /// Place a card in `slot` of `player`'s strip with `markers` suit marks.
    pub fn card(mut self, player: Player, slot: u32, orientation: Orientation, markers: usize) -> Self {
        let band_y = (slot * SLOT_HEIGHT) as i32;
        let (x, y, w, h, offsets): (i32, i32, u32, u32, &[(i32, i32)]) = match orientation {
            Orientation::Portrait => (50, band_y + 5, 80, 90, &PORTRAIT_MARKERS[..]),
            Orientation::Landscape => (30, band_y + 10, 120, 80, &LANDSCAPE_MARKERS[..]),
        };
        assert!(markers <= offsets.len(), "at most {} markers fit", offsets.len());

        let x = Self::strip_x(player) + x;
        draw_filled_rect_mut(&mut self.image, Rect::at(x, y).of_size(w, h), CARD);
        for (dx, dy) in offsets.iter().take(markers) {
            draw_filled_rect_mut(
                &mut self.image,
                Rect::at(x + dx, y + dy).of_size(MARKER_SIZE, MARKER_SIZE),
                INK,
            );
        }
        self
    }

    /// Place a plain bright rectangle in region coordinates.
    pub fn blob(mut self, player: Player, x: i32, y: i32, w: u32, h: u32) -> Self {
        let x = Self::strip_x(player) + x;
        draw_filled_rect_mut(&mut self.image, Rect::at(x, y).of_size(w, h), CARD);
        self
    }

    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.image.into_raw()
    }

    pub fn build(self) -> Frame {
        Frame::from_raw(WIDTH, HEIGHT, self.into_bytes()).expect("fixture frame has the configured shape")
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}
