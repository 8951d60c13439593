use crate::hex::consts::*;
use crate::hex::coords::{self, HexPoint};
use crate::hex::geometry::Geometry;
use crate::hex::sets::PointSet;
use crate::hex::zobrist;
use crate::utils::prelude::*;

/// Packed representation of a position, used as a database key.
/// Interior cells are read in canonical order, four to a byte.
pub type BoardId = Vec<u8>;

/// The mutable stone state of a board.
///
/// Every cell is empty, black or white, and additionally marked played or
/// unplayed. Fill-in stones are coloured but unplayed; only played stones
/// contribute to the hash and the board id. `start_new_game` must be
/// called before any moves are played: it places the four edge stones.
#[derive(Clone, Debug)]
pub struct StoneBoard<'a> {
    geom: &'a Geometry,
    stones: [PointSet; 2],
    played: PointSet,
    hash: u64,
}

impl<'a> PartialEq for StoneBoard<'a> {
    fn eq(&self, other: &Self) -> bool {
        self.geom.width() == other.geom.width()
            && self.geom.height() == other.geom.height()
            && self.stones == other.stones
            && self.played == other.played
    }
}

impl<'a> StoneBoard<'a> {
    pub fn new(geom: &'a Geometry) -> StoneBoard<'a> {
        StoneBoard {
            geom,
            stones: [PointSet::EMPTY; 2],
            played: PointSet::EMPTY,
            hash: 0,
        }
    }

    pub fn geometry(&self) -> &'a Geometry {
        self.geom
    }

    pub fn width(&self) -> usize {
        self.geom.width()
    }

    pub fn height(&self) -> usize {
        self.geom.height()
    }

    /// Position hash over played stones only.
    pub fn hash(&self) -> u64 {
        self.hash
    }

    // queries on cells and edges

    pub fn black(&self) -> PointSet {
        self.stones[Color::Black as usize] & self.geom.locations_set()
    }

    pub fn white(&self) -> PointSet {
        self.stones[Color::White as usize] & self.geom.locations_set()
    }

    pub fn stones(&self, color: Color) -> PointSet {
        self.stones[color as usize] & self.geom.locations_set()
    }

    pub fn occupied(&self) -> PointSet {
        (self.black() | self.white()) & self.geom.locations_set()
    }

    pub fn empty_set(&self) -> PointSet {
        self.geom.locations_set() - self.occupied()
    }

    /// Empty interior cells.
    pub fn empty_cells(&self) -> PointSet {
        self.geom.cells() - self.occupied()
    }

    pub fn color_of(&self, p: HexPoint) -> Option<Color> {
        debug_assert!(self.geom.is_valid(p));
        if self.stones[Color::Black as usize].contains(p) {
            Some(Color::Black)
        } else if self.stones[Color::White as usize].contains(p) {
            Some(Color::White)
        } else {
            None
        }
    }

    pub fn is_color(&self, p: HexPoint, color: Color) -> bool {
        self.stones[color as usize].contains(p)
    }

    pub fn is_empty(&self, p: HexPoint) -> bool {
        self.color_of(p).is_none()
    }

    pub fn is_occupied(&self, p: HexPoint) -> bool {
        self.color_of(p).is_some()
    }

    pub fn played(&self) -> PointSet {
        self.played
    }

    pub fn is_played(&self, p: HexPoint) -> bool {
        self.played.contains(p)
    }

    /// Played stones on the interior.
    pub fn num_stones(&self) -> usize {
        (self.occupied() & self.played & self.geom.cells()).len()
    }

    /// Black plays first; the colour with fewer played interior stones
    /// is to move.
    pub fn whose_turn(&self) -> Color {
        let mask = self.played & self.geom.cells();
        let first = (self.stones(FIRST_TO_PLAY) & mask).len();
        let second = (self.stones(-FIRST_TO_PLAY) & mask).len();
        if first > second { -FIRST_TO_PLAY } else { FIRST_TO_PLAY }
    }

    /// Moves playable from this state. Swap is available only directly
    /// after the first interior move.
    pub fn legal_moves(&self) -> PointSet {
        if self.is_played(coords::RESIGN) {
            return PointSet::EMPTY;
        }
        let mut legal = (self.geom.cells() - self.played).with(coords::RESIGN);
        if self.played.len() == 5 {
            legal.insert(coords::SWAP_PIECES);
        }
        legal
    }

    pub fn is_legal(&self, p: HexPoint) -> bool {
        self.legal_moves().contains(p)
    }

    // mutations that leave the hash alone

    /// Adds unplayed stones of colour. The hash is unchanged.
    pub fn add_color(&mut self, color: Color, b: PointSet) {
        self.stones[color as usize] |= b;
        debug_assert!(self.black_white_disjoint());
    }

    /// Removes stones of colour. The hash is unchanged.
    pub fn remove_color(&mut self, color: Color, b: PointSet) {
        self.stones[color as usize] -= b;
    }

    pub fn set_color(&mut self, occ: Option<Color>, p: HexPoint) {
        debug_assert!(self.geom.is_valid(p));
        match occ {
            None => {
                for c in Color::both() {
                    self.stones[c as usize].remove(p);
                }
            }
            Some(c) => {
                self.stones[c as usize].insert(p);
                debug_assert!(self.black_white_disjoint());
            }
        }
    }

    /// Replaces a colour's entire stone set. The hash is unchanged.
    pub fn set_color_set(&mut self, color: Color, bs: PointSet) {
        debug_assert!(self.geom.is_valid_set(&bs));
        self.stones[color as usize] = bs;
        debug_assert!(self.black_white_disjoint());
    }

    // mutations that maintain the hash

    /// Replaces the played set and recomputes the hash.
    pub fn set_played(&mut self, played: PointSet) {
        self.played = played;
        self.recompute_hash();
    }

    /// Clears the board and plays the four edge stones.
    pub fn start_new_game(&mut self) {
        self.clear();
        for c in Color::both() {
            self.play_move(c, c.edge1());
            self.play_move(c, c.edge2());
        }
    }

    pub fn play_move(&mut self, color: Color, cell: HexPoint) {
        debug_assert!(self.geom.is_valid(cell));
        self.played.insert(cell);
        self.hash ^= zobrist::key(color, cell);
        self.set_color(Some(color), cell);
    }

    pub fn undo_move(&mut self, cell: HexPoint) {
        let color = self.color_of(cell);
        assert!(color.is_some(), "undoing an empty cell {cell}");
        self.played.remove(cell);
        self.hash ^= zobrist::key(color.unwrap(), cell);
        self.set_color(None, cell);
    }

    pub fn rotate_board(&mut self) {
        self.played = self.geom.rotate_set(&self.played);
        for c in Color::both() {
            self.stones[c as usize] = self.geom.rotate_set(&self.stones[c as usize]);
        }
        self.recompute_hash();
    }

    pub fn mirror_board(&mut self) {
        self.played = self.geom.mirror_set(&self.played);
        for c in Color::both() {
            self.stones[c as usize] = self.geom.mirror_set(&self.stones[c as usize]);
        }
        self.recompute_hash();
    }

    pub fn clear(&mut self) {
        self.played.clear();
        self.stones = [PointSet::EMPTY; 2];
        self.hash = 0;
    }

    // board ids

    /// Packs the played interior cells two bits apiece, four cells to a
    /// byte, in canonical interior order.
    pub fn board_id(&self) -> BoardId {
        let n = (self.width() * self.height()).div_ceil(4) * 4;
        let mut val = vec![0u8; n];
        for (i, p) in self.geom.interior().iter().enumerate() {
            val[i] = if self.played.contains(*p) {
                match self.color_of(*p) {
                    Some(Color::Black) => 1,
                    Some(Color::White) => 2,
                    None => 0,
                }
            } else {
                0
            };
        }
        let mut id = BoardId::with_capacity(n / 4);
        for i in (0..n).step_by(4) {
            id.push(val[i] | (val[i + 1] << 2) | (val[i + 2] << 4) | (val[i + 3] << 6));
        }
        id
    }

    pub fn board_id_string(&self) -> String {
        self.board_id().iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Restores the position a board id encodes. Any unplayed fill-in
    /// stones are lost.
    pub fn set_state(&mut self, id: &BoardId) -> Result<()> {
        let n = (self.width() * self.height()).div_ceil(4) * 4;
        if id.len() != n / 4 {
            return Err(anyhow!(
                "board id holds {} bytes, expected {}",
                id.len(),
                n / 4
            ));
        }
        self.start_new_game();
        for (i, p) in self.geom.interior().iter().enumerate() {
            let packed = id[i / 4];
            match (packed >> ((i % 4) * 2)) & 0x3 {
                1 => self.play_move(Color::Black, *p),
                2 => self.play_move(Color::White, *p),
                _ => {}
            }
        }
        Ok(())
    }

    // printing

    pub fn print(&self) -> String {
        self.print_bitset(&PointSet::EMPTY)
    }

    /// Renders the board with cells of b marked by '*'. Lowercase marks
    /// unplayed fill-in.
    pub fn print_bitset(&self, b: &PointSet) -> String {
        let mut out = String::new();
        out.push_str(&format!("\n  {:016x}\n  ", self.hash));
        for i in 0..self.width() {
            out.push((b'a' + i as u8) as char);
            out.push_str("  ");
        }
        out.push('\n');
        for y in 0..self.height() {
            out.push_str(&" ".repeat(y));
            out.push_str(&format!("{:>2}\\", y + 1));
            for x in 0..self.width() {
                let p = HexPoint::from_coords(x, y);
                if x > 0 {
                    out.push_str("  ");
                }
                out.push(if b.contains(p) {
                    '*'
                } else {
                    match (self.color_of(p), self.is_played(p)) {
                        (Some(Color::Black), true) => 'B',
                        (Some(Color::Black), false) => 'b',
                        (Some(Color::White), true) => 'W',
                        (Some(Color::White), false) => 'w',
                        (None, _) => '.',
                    }
                });
            }
            out.push_str(&format!("\\{}\n", y + 1));
        }
        out
    }

    fn recompute_hash(&mut self) {
        self.hash = zobrist::hash_of(
            self.stones[Color::Black as usize] & self.played,
            self.stones[Color::White as usize] & self.played,
        );
    }

    fn black_white_disjoint(&self) -> bool {
        !self.stones[Color::Black as usize].intersects(&self.stones[Color::White as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::coords::{EAST, NORTH, SOUTH, WEST};

    fn p(name: &str) -> HexPoint {
        name.parse().unwrap()
    }

    #[test]
    fn new_game_has_four_played_edges() {
        let g = Geometry::new(5, 5).unwrap();
        let mut brd = StoneBoard::new(&g);
        brd.start_new_game();
        assert_eq!(brd.played().len(), 4);
        for e in [NORTH, SOUTH] {
            assert_eq!(brd.color_of(e), Some(Color::Black));
        }
        for e in [EAST, WEST] {
            assert_eq!(brd.color_of(e), Some(Color::White));
        }
        assert_eq!(brd.num_stones(), 0);
        assert_eq!(brd.whose_turn(), Color::Black);
    }

    #[test]
    fn incremental_hash_matches_batch() {
        let g = Geometry::new(5, 5).unwrap();
        let mut brd = StoneBoard::new(&g);
        brd.start_new_game();
        for (c, cell) in [
            (Color::Black, "a1"),
            (Color::White, "c3"),
            (Color::Black, "a2"),
        ] {
            brd.play_move(c, p(cell));
        }

        let mut batch = brd.clone();
        batch.set_played(brd.played());
        assert_eq!(brd.hash(), batch.hash());
    }

    #[test]
    fn play_undo_restores_hash() {
        let g = Geometry::new(5, 5).unwrap();
        let mut brd = StoneBoard::new(&g);
        brd.start_new_game();
        let before = brd.hash();
        brd.play_move(Color::Black, p("c3"));
        assert_ne!(brd.hash(), before);
        brd.undo_move(p("c3"));
        assert_eq!(brd.hash(), before);
    }

    #[test]
    fn fillin_does_not_hash() {
        let g = Geometry::new(5, 5).unwrap();
        let mut brd = StoneBoard::new(&g);
        brd.start_new_game();
        let before = brd.hash();
        brd.add_color(Color::White, PointSet::singleton(p("d4")));
        assert_eq!(brd.hash(), before);
        assert_eq!(brd.num_stones(), 0);
    }

    #[test]
    fn board_id_roundtrip() {
        let g = Geometry::new(5, 5).unwrap();
        let mut brd = StoneBoard::new(&g);
        brd.start_new_game();
        brd.play_move(Color::Black, p("a1"));
        brd.play_move(Color::White, p("e5"));
        brd.play_move(Color::Black, p("c2"));

        let id = brd.board_id();
        let mut other = StoneBoard::new(&g);
        other.set_state(&id).unwrap();
        assert_eq!(brd, other);
        assert_eq!(brd.hash(), other.hash());
    }

    #[test]
    fn swap_is_legal_after_first_move_only() {
        let g = Geometry::new(5, 5).unwrap();
        let mut brd = StoneBoard::new(&g);
        brd.start_new_game();
        assert!(!brd.is_legal(crate::hex::coords::SWAP_PIECES));
        brd.play_move(Color::Black, p("c3"));
        assert!(brd.is_legal(crate::hex::coords::SWAP_PIECES));
        brd.play_move(Color::White, p("d3"));
        assert!(!brd.is_legal(crate::hex::coords::SWAP_PIECES));
    }
}
