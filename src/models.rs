use std::fmt;

use image::{DynamicImage, GrayImage};

use crate::config::CalibrationConfig;
use crate::error::FrameError;

/// One full overhead capture, single channel, row-major.
#[derive(Debug, Clone)]
pub struct Frame {
    image: GrayImage,
}

impl Frame {
    /// Wrap raw capture bytes, rejecting buffers that don't match the
    /// configured geometry.
    pub fn from_raw(width: u32, height: u32, bytes: Vec<u8>) -> Result<Self, FrameError> {
        let actual_len = bytes.len();
        let shape_error = FrameError::InputShape {
            expected_width: width,
            expected_height: height,
            actual_len,
        };
        if actual_len != width as usize * height as usize {
            return Err(shape_error);
        }
        GrayImage::from_raw(width, height, bytes)
            .map(|image| Self { image })
            .ok_or(shape_error)
    }

    /// Convert a decoded image to luma and check it against the calibration.
    pub fn from_image(img: &DynamicImage, config: &CalibrationConfig) -> Result<Self, FrameError> {
        let image = img.to_luma8();
        if image.dimensions() != (config.width, config.height) {
            return Err(FrameError::ImageDimensions {
                expected_width: config.width,
                expected_height: config.height,
                actual_width: image.width(),
                actual_height: image.height(),
            });
        }
        Ok(Self { image })
    }

    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Seat at the table. The left strip belongs to player one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Player {
    One,
    Two,
}

impl Player {
    pub const ALL: [Player; 2] = [Player::One, Player::Two];

    pub fn number(self) -> u8 {
        match self {
            Player::One => 1,
            Player::Two => 2,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Player::One),
            2 => Some(Player::Two),
            _ => None,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// A player's strip of the frame.
#[derive(Debug, Clone)]
pub struct Region {
    pub player: Player,
    /// Horizontal offset of the strip inside the frame.
    pub x_offset: u32,
    pub image: GrayImage,
}

impl Region {
    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Axis-aligned bounding box in region coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Vertical center, in pixels.
    pub fn center_y(&self) -> f64 {
        f64::from(self.y) + f64::from(self.height) / 2.0
    }

    /// A card lying across the camera's vertical axis.
    pub fn is_rotated(&self) -> bool {
        self.width < self.height
    }
}

/// Whether a border encloses a foreground blob or a hole inside one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderKind {
    Outer,
    Hole,
}

/// A closed border extracted from a binarized region.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub bbox: BoundingBox,
    /// Enclosed area of the border polygon.
    pub area: f64,
    pub border: BorderKind,
    /// Index of the enclosing contour in the same extraction.
    pub parent: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Card,
    SuitMarker,
    Noise,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedContour {
    pub contour: Contour,
    pub class: Classification,
}

/// Arena of classified contours in discovery order. Parent links point
/// at earlier entries, so the hierarchy can be walked without recursion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContourTree {
    nodes: Vec<ClassifiedContour>,
}

impl ContourTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node and return its index. A parent that does not precede
    /// the new node is discarded.
    pub fn push(&mut self, mut contour: Contour, class: Classification) -> usize {
        let index = self.nodes.len();
        if contour.parent.is_some_and(|p| p >= index) {
            contour.parent = None;
        }
        self.nodes.push(ClassifiedContour { contour, class });
        index
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ClassifiedContour> {
        self.nodes.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassifiedContour> {
        self.nodes.iter()
    }

    /// Indices of all nodes with the given class, in discovery order.
    pub fn indices_of(&self, class: Classification) -> impl Iterator<Item = usize> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(move |(_, node)| node.class == class)
            .map(|(i, _)| i)
    }

    /// Nearest strict ancestor of `index` with the given class.
    pub fn nearest_ancestor(&self, index: usize, class: Classification) -> Option<usize> {
        let mut current = self.nodes.get(index)?.contour.parent;
        while let Some(i) = current {
            let node = self.nodes.get(i)?;
            if node.class == class {
                return Some(i);
            }
            current = node.contour.parent;
        }
        None
    }
}

/// Placeholder for suit identity. Recognition never fills it in; only
/// the marker count is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suit {
    Hearts,
    Diamonds,
    Clubs,
    Spades,
}

/// One recognized card in a player's slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardRecord {
    pub player: Player,
    /// Zero-based slot index, top of the strip first.
    pub position: u32,
    /// Suit-marker count, never zero.
    pub rank: u32,
    pub rotated: bool,
    pub suit: Option<Suit>,
}

impl CardRecord {
    pub fn new(player: Player, position: u32, rank: u32, rotated: bool) -> Self {
        Self {
            player,
            position,
            rank: rank.max(1),
            rotated,
            suit: None,
        }
    }
}
