use std::ops::Neg;

use crate::utils::prelude::*;

/// The largest board either dimension may take.
pub const MAX_WIDTH: usize = 11;
pub const MAX_HEIGHT: usize = 11;

/// Every identifier (specials, edges, interior cells) fits in 7 bits,
/// so any set of them packs into a single 128-bit word.
pub const BITSET_SIZE: usize = 128;

/// How far out patterns may extend from their centre cell. Changing this
/// invalidates every stored pattern encoding.
pub const MAX_EXTENSION: usize = 3;

/// Cells covered by one pattern slice at MAX_EXTENSION (1 + 2 + 3).
pub const SLICE_CELLS: usize = MAX_EXTENSION * (MAX_EXTENSION + 1) / 2;

// A stone colour. Empty cells are `None` in an `Option<Color>`.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Color {
    Black = 0,
    White = 1,
}

/// Black moves first and owns the vertical (north/south) edges.
pub const FIRST_TO_PLAY: Color = Color::Black;

/// The colour dead cells are filled in as. Either choice is sound, the
/// classification itself is colour-independent.
pub const DEAD_COLOR: Color = Color::Black;

impl Color {
    /// Both colours, Black first.
    pub fn both() -> [Color; 2] {
        [Color::Black, Color::White]
    }

    /// Notates the colour.
    pub fn notate(&self) -> String {
        match self {
            Color::Black => "black",
            Color::White => "white",
        }
        .into()
    }

    /// Parses into a colour; `_`, `-` and `.` mean empty.
    pub fn parse(s: &str) -> Result<Option<Color>> {
        match s {
            "b" | "B" | "black" => Ok(Some(Color::Black)),
            "w" | "W" | "white" => Ok(Some(Color::White)),
            "_" | "-" | "." | "empty" => Ok(None),
            _ => Err(anyhow!("invalid notation {s} for colour")),
        }
    }
}

impl Neg for Color {
    type Output = Color;
    fn neg(self) -> Self::Output {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }
}

impl From<u8> for Color {
    fn from(value: u8) -> Self {
        match value {
            0 => Color::Black,
            1 => Color::White,
            _ => panic!("expected colour value of 0-1, received {value}"),
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.notate())
    }
}

/// A predicate over cell occupancy, standing in for the colour-set
/// enumeration the group caches are keyed by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorFilter {
    Only(Color),
    OnlyEmpty,
    ColorOrEmpty(Color),
    NotColor(Color),
    Any,
}

impl ColorFilter {
    pub fn matches(&self, occ: Option<Color>) -> bool {
        match *self {
            ColorFilter::Only(c) => occ == Some(c),
            ColorFilter::OnlyEmpty => occ.is_none(),
            ColorFilter::ColorOrEmpty(c) => occ.is_none() || occ == Some(c),
            ColorFilter::NotColor(c) => occ != Some(c),
            ColorFilter::Any => true,
        }
    }

    /// Canonical cache slot for this filter. `ColorOrEmpty(c)` and
    /// `NotColor(-c)` share a slot since they match the same cells.
    pub(crate) fn slot(&self) -> usize {
        match *self {
            ColorFilter::Only(Color::Black) => 0,
            ColorFilter::Only(Color::White) => 1,
            ColorFilter::OnlyEmpty => 2,
            ColorFilter::NotColor(Color::Black) => 3,
            ColorFilter::NotColor(Color::White) => 4,
            ColorFilter::ColorOrEmpty(c) => ColorFilter::NotColor(-c).slot(),
            ColorFilter::Any => 5,
        }
    }
}

pub(crate) const NUM_FILTER_SLOTS: usize = 6;

/// Occupancy slot used by per-colour neighbour tables.
pub(crate) fn occupancy_slot(occ: Option<Color>) -> usize {
    match occ {
        Some(Color::Black) => 0,
        Some(Color::White) => 1,
        None => 2,
    }
}

/// The six travel directions on a hex board, in the order the pattern
/// slices fan out.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HexDirection {
    East = 0,
    NorthEast = 1,
    North = 2,
    West = 3,
    SouthWest = 4,
    South = 5,
}

pub const NUM_DIRECTIONS: usize = 6;

impl HexDirection {
    pub fn all() -> [HexDirection; NUM_DIRECTIONS] {
        [
            HexDirection::East,
            HexDirection::NorthEast,
            HexDirection::North,
            HexDirection::West,
            HexDirection::SouthWest,
            HexDirection::South,
        ]
    }

    pub fn from_index(i: usize) -> HexDirection {
        match i {
            0 => HexDirection::East,
            1 => HexDirection::NorthEast,
            2 => HexDirection::North,
            3 => HexDirection::West,
            4 => HexDirection::SouthWest,
            5 => HexDirection::South,
            _ => panic!("expected direction index of 0-5, received {i}"),
        }
    }

    pub fn delta_x(&self) -> i32 {
        [1, 1, 0, -1, -1, 0][*self as usize]
    }

    pub fn delta_y(&self) -> i32 {
        [0, -1, -1, 0, 1, 1][*self as usize]
    }
}
