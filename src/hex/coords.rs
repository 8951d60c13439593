use crate::hex::consts::*;
use crate::utils::prelude::*;

/// A location identifier on a Hex board.
///
/// The identifier space is laid out as: the invalid point, two special
/// moves (resign, swap), the four edges (N, E, S, W), then the interior
/// cells of the largest supported board in row-major order (a1, b1, ...).
/// The layout is load-bearing: board-id packing and the databases keyed
/// on it depend on this exact order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HexPoint(pub(crate) u8);

pub const INVALID: HexPoint = HexPoint(0);
pub const RESIGN: HexPoint = HexPoint(1);
pub const SWAP_PIECES: HexPoint = HexPoint(2);
pub const NORTH: HexPoint = HexPoint(3);
pub const EAST: HexPoint = HexPoint(4);
pub const SOUTH: HexPoint = HexPoint(5);
pub const WEST: HexPoint = HexPoint(6);

pub const FIRST_SPECIAL: u8 = 1;
pub const FIRST_EDGE: u8 = 3;
pub const FIRST_CELL: u8 = 7;
pub const FIRST_INVALID: u8 = FIRST_CELL + (MAX_WIDTH * MAX_HEIGHT) as u8;

impl HexPoint {
    /// The raw index of this point, usable for direct table lookups.
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn from_index(i: usize) -> HexPoint {
        debug_assert!(i < BITSET_SIZE);
        HexPoint(i as u8)
    }

    /// The interior cell at column x, row y (both zero-based).
    #[inline]
    pub fn from_coords(x: usize, y: usize) -> HexPoint {
        debug_assert!(x < MAX_WIDTH && y < MAX_HEIGHT);
        HexPoint(FIRST_CELL + (y * MAX_WIDTH + x) as u8)
    }

    /// The (column, row) of an interior cell.
    #[inline]
    pub fn to_coords(&self) -> (usize, usize) {
        debug_assert!(self.is_interior());
        let i = (self.0 - FIRST_CELL) as usize;
        (i % MAX_WIDTH, i / MAX_WIDTH)
    }

    pub fn is_edge(&self) -> bool {
        (FIRST_EDGE..FIRST_CELL).contains(&self.0)
    }

    pub fn is_interior(&self) -> bool {
        self.0 >= FIRST_CELL && self.0 < FIRST_INVALID
    }

    pub fn is_swap(&self) -> bool {
        *self == SWAP_PIECES
    }

    pub fn opposite_edge(&self) -> HexPoint {
        match *self {
            NORTH => SOUTH,
            SOUTH => NORTH,
            EAST => WEST,
            WEST => EAST,
            _ => panic!("opposite_edge of non-edge {self}"),
        }
    }

    pub fn left_edge(&self) -> HexPoint {
        match *self {
            NORTH => EAST,
            SOUTH => WEST,
            EAST => SOUTH,
            WEST => NORTH,
            _ => panic!("left_edge of non-edge {self}"),
        }
    }

    pub fn right_edge(&self) -> HexPoint {
        match *self {
            NORTH => WEST,
            SOUTH => EAST,
            EAST => NORTH,
            WEST => SOUTH,
            _ => panic!("right_edge of non-edge {self}"),
        }
    }

    /// The colour an edge is permanently assigned.
    pub fn edge_color(&self) -> Color {
        match *self {
            NORTH | SOUTH => Color::Black,
            EAST | WEST => Color::White,
            _ => panic!("edge_color of non-edge {self}"),
        }
    }
}

impl Color {
    /// This colour's first edge: north for Black, east for White.
    pub fn edge1(&self) -> HexPoint {
        match self {
            Color::Black => NORTH,
            Color::White => EAST,
        }
    }

    /// This colour's second edge: south for Black, west for White.
    pub fn edge2(&self) -> HexPoint {
        match self {
            Color::Black => SOUTH,
            Color::White => WEST,
        }
    }

    pub fn is_color_edge(&self, p: HexPoint) -> bool {
        p == self.edge1() || p == self.edge2()
    }
}

impl std::fmt::Display for HexPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            INVALID => write!(f, "invalid"),
            RESIGN => write!(f, "resign"),
            SWAP_PIECES => write!(f, "swap-pieces"),
            NORTH => write!(f, "north"),
            EAST => write!(f, "east"),
            SOUTH => write!(f, "south"),
            WEST => write!(f, "west"),
            _ => {
                let (x, y) = self.to_coords();
                write!(f, "{}{}", (b'a' + x as u8) as char, y + 1)
            }
        }
    }
}

impl std::str::FromStr for HexPoint {
    type Err = Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "resign" => return Ok(RESIGN),
            "swap-pieces" | "swap" => return Ok(SWAP_PIECES),
            "north" => return Ok(NORTH),
            "east" => return Ok(EAST),
            "south" => return Ok(SOUTH),
            "west" => return Ok(WEST),
            _ => {}
        }
        let mut chars = s.chars();
        let col = chars
            .next()
            .ok_or_else(|| anyhow!("empty cell name"))?
            .to_ascii_lowercase();
        if !col.is_ascii_lowercase() {
            return Err(anyhow!("invalid cell name {s}"));
        }
        let x = (col as u8 - b'a') as usize;
        let row: usize = chars.as_str().parse().context("invalid row number")?;
        if x >= MAX_WIDTH || row == 0 || row > MAX_HEIGHT {
            return Err(anyhow!("cell {s} out of range"));
        }
        Ok(HexPoint::from_coords(x, row - 1))
    }
}

/// Renders a list of points as a space separated string.
pub fn point_list_string<I: IntoIterator<Item = HexPoint>>(points: I) -> String {
    use itertools::Itertools;
    points.into_iter().map(|p| p.to_string()).join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_names() {
        for name in ["a1", "k11", "f6", "north", "west", "swap-pieces", "resign"] {
            let p: HexPoint = name.parse().unwrap();
            assert_eq!(p.to_string(), name);
        }
        assert!("l1".parse::<HexPoint>().is_err());
        assert!("a12".parse::<HexPoint>().is_err());
        assert!("a0".parse::<HexPoint>().is_err());
    }

    #[test]
    fn layout() {
        assert_eq!(HexPoint::from_coords(0, 0).index(), FIRST_CELL as usize);
        assert_eq!(
            HexPoint::from_coords(MAX_WIDTH - 1, MAX_HEIGHT - 1).index(),
            FIRST_INVALID as usize - 1
        );
        assert!(NORTH.is_edge() && !NORTH.is_interior());
        assert_eq!(NORTH.opposite_edge(), SOUTH);
        assert_eq!(Color::White.edge1(), EAST);
    }
}
