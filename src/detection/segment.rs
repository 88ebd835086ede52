use image::imageops;

use crate::models::{Frame, Player, Region};

/// Cut the two player strips out of a frame: player one on the left edge,
/// player two on the right edge, both `region_width` wide and full height.
///
/// The width is clamped to half the frame so the strips never overlap.
pub fn split_regions(frame: &Frame, region_width: u32) -> [Region; 2] {
    let (width, height) = (frame.width(), frame.height());
    let strip = region_width.min(width / 2);

    Player::ALL.map(|player| {
        let x_offset = match player {
            Player::One => 0,
            Player::Two => width - strip,
        };
        let image = imageops::crop_imm(frame.image(), x_offset, 0, strip, height).to_image();
        Region {
            player,
            x_offset,
            image,
        }
    })
}
