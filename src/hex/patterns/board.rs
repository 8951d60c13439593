use crate::hex::consts::*;
use crate::hex::coords::{self, HexPoint};
use crate::hex::geometry::Geometry;
use crate::hex::groupboard::GroupBoard;
use crate::hex::patterns::godel::RingGodel;
use crate::hex::patterns::hashed::HashedPatternSet;
use crate::hex::patterns::pattern::*;
use crate::hex::sets::PointSet;
use crate::hex::stoneboard::StoneBoard;

/// One pattern matching at one cell, with its decoded annotation moves.
pub struct PatternHit<'p> {
    pub pattern: &'p Pattern,
    pub moves1: Vec<HexPoint>,
    pub moves2: Vec<HexPoint>,
}

/// Whether matching stops at the first hit on a cell or records all.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    StopAtFirstHit,
    MatchAll,
}

/// Board-size lookup tables for godel maintenance.
///
/// For a centre p1 and a played cell p2 nearby, the tables give the
/// slice of p1 that p2 sits in and the bit to flip in that slice's
/// godel. Edges occupy a whole line of positions, recorded separately
/// per slice; the two obtuse corners belong to both adjoining edges.
struct SliceTables {
    played_in_slice: Box<[[u8; BITSET_SIZE]; BITSET_SIZE]>,
    played_in_godel: Box<[[u32; BITSET_SIZE]; BITSET_SIZE]>,
    played_in_edge: Box<[[[u32; NUM_SLICES]; 4]; BITSET_SIZE]>,
    inverse_slice_godel: Box<[[[HexPoint; SLICE_CELLS]; NUM_SLICES]; BITSET_SIZE]>,
}

impl SliceTables {
    fn new(geom: &Geometry) -> SliceTables {
        let mut t = SliceTables {
            played_in_slice: Box::new([[0; BITSET_SIZE]; BITSET_SIZE]),
            played_in_godel: Box::new([[0; BITSET_SIZE]; BITSET_SIZE]),
            played_in_edge: Box::new([[[0; NUM_SLICES]; 4]; BITSET_SIZE]),
            inverse_slice_godel: Box::new(
                [[[coords::INVALID; SLICE_CELLS]; NUM_SLICES]; BITSET_SIZE],
            ),
        };
        let offsets = spiral_offsets();
        let (w, h) = (geom.width() as i32, geom.height() as i32);

        for &p1 in geom.interior() {
            let (x, y) = p1.to_coords();
            for s in 0..NUM_SLICES {
                for (g, (dx, dy)) in offsets.offsets[s].iter().enumerate() {
                    let (x2, y2) = (x as i32 + dx, y as i32 + dy);

                    if x2 == -1 && y2 == h {
                        // southwest obtuse corner: both edges own it
                        t.played_in_edge[p1.index()][edge_slot(coords::SOUTH)][s] |= 1 << g;
                        t.played_in_edge[p1.index()][edge_slot(coords::WEST)][s] |= 1 << g;
                        continue;
                    }
                    if x2 == w && y2 == -1 {
                        // northeast obtuse corner
                        t.played_in_edge[p1.index()][edge_slot(coords::NORTH)][s] |= 1 << g;
                        t.played_in_edge[p1.index()][edge_slot(coords::EAST)][s] |= 1 << g;
                        continue;
                    }

                    let Some(p2) = geom.coords_to_point(x2, y2) else {
                        continue;
                    };
                    if p2.is_edge() {
                        t.played_in_edge[p1.index()][edge_slot(p2)][s] |= 1 << g;
                    } else {
                        t.played_in_slice[p1.index()][p2.index()] = s as u8;
                        t.played_in_godel[p1.index()][p2.index()] = 1 << g;
                        t.inverse_slice_godel[p1.index()][s][g] = p2;
                    }
                }
            }
        }
        t
    }
}

fn edge_slot(edge: HexPoint) -> usize {
    (edge.index() as u8 - coords::FIRST_EDGE) as usize
}

/// Incrementally maintained pattern-matching state: per-cell ring godels
/// and per-cell slice godels for each colour.
///
/// Any change of a cell's colour invalidates this state until
/// `update_cell` (or `update_all`) has been called for that change.
pub struct PatternState {
    tables: SliceTables,
    slice_godel: Box<[[[u32; NUM_SLICES]; 2]; BITSET_SIZE]>,
    ring_godel: Box<[RingGodel; BITSET_SIZE]>,
    update_radius: usize,
}

impl PatternState {
    pub fn new(geom: &Geometry) -> PatternState {
        PatternState {
            tables: SliceTables::new(geom),
            slice_godel: Box::new([[[0; NUM_SLICES]; 2]; BITSET_SIZE]),
            ring_godel: Box::new([RingGodel::new(); BITSET_SIZE]),
            update_radius: MAX_EXTENSION,
        }
    }

    pub fn update_radius(&self) -> usize {
        self.update_radius
    }

    /// Limits how far out godels are refreshed by `update_cell`.
    pub fn set_update_radius(&mut self, radius: usize) {
        assert!(radius >= 1 && radius <= MAX_EXTENSION);
        self.update_radius = radius;
    }

    /// Folds the stone at cell into the godels of everything around it.
    pub fn update_cell(&mut self, brd: &StoneBoard<'_>, cell: HexPoint) {
        if cell.is_swap() {
            return;
        }
        let geom = brd.geometry();
        let color = brd
            .color_of(cell)
            .expect("updating pattern state for an empty cell");

        if cell.is_edge() {
            let e = edge_slot(cell);
            for &p in geom.nbs_radius(cell, self.update_radius) {
                if !p.is_interior() {
                    continue;
                }
                for slice in 0..NUM_SLICES {
                    let godel = self.tables.played_in_edge[p.index()][e][slice];
                    self.slice_godel[p.index()][color as usize][slice] |= godel;
                    if godel & 1 == 1 {
                        self.ring_godel[p.index()].add_color_to_slice(slice, color);
                    }
                }
            }
            return;
        }

        for &p in geom.nbs_radius(cell, self.update_radius) {
            if !p.is_interior() {
                continue;
            }
            let slice = self.tables.played_in_slice[p.index()][cell.index()] as usize;
            let godel = self.tables.played_in_godel[p.index()][cell.index()];
            self.slice_godel[p.index()][color as usize][slice] |= godel;
            if godel == 1 {
                self.ring_godel[p.index()].add_color_to_slice(slice, color);
            }
        }
    }

    /// Rebuilds every godel from scratch for the given position.
    pub fn update_all(&mut self, brd: &StoneBoard<'_>) {
        self.clear_godels();
        for cell in (brd.black() | brd.white()).iter() {
            self.update_cell(brd, cell);
        }
    }

    pub fn update_set(&mut self, brd: &StoneBoard<'_>, changed: PointSet) {
        for cell in changed.iter() {
            debug_assert!(brd.is_occupied(cell));
            self.update_cell(brd, cell);
        }
    }

    fn clear_godels(&mut self) {
        self.slice_godel = Box::new([[[0; NUM_SLICES]; 2]; BITSET_SIZE]);
        self.ring_godel = Box::new([RingGodel::new(); BITSET_SIZE]);
    }

    // matching

    /// Matches a hashed pattern set at one interior cell.
    pub fn match_on_cell<'p>(
        &self,
        patset: &'p HashedPatternSet,
        cell: HexPoint,
        mode: MatchMode,
    ) -> Vec<PatternHit<'p>> {
        let mut hits = vec![];
        let godel = self.ring_godel[cell.index()];
        for rot in patset.list_for_godel(godel) {
            let pattern = patset.pattern(rot);
            if let Some(hit) = self.check_rotated(pattern, cell, rot.angle) {
                hits.push(hit);
                if mode == MatchMode::StopAtFirstHit {
                    break;
                }
            }
        }
        hits
    }

    /// Matches over every considered cell; returns the hit cells and
    /// their hits.
    pub fn match_on_board<'p>(
        &self,
        geom: &Geometry,
        consider: PointSet,
        patset: &'p HashedPatternSet,
        mode: MatchMode,
    ) -> Vec<(HexPoint, Vec<PatternHit<'p>>)> {
        let mut out = vec![];
        for p in (consider & geom.cells()).iter() {
            let hits = self.match_on_cell(patset, p, mode);
            if !hits.is_empty() {
                out.push((p, hits));
            }
        }
        out
    }

    /// The cell encoded at the rotated (slice, position) of a pattern
    /// centred on cell.
    pub fn rotated_move(&self, cell: HexPoint, slice: usize, bit: usize, angle: usize) -> HexPoint {
        let board_slice = (slice + NUM_SLICES - angle) % NUM_SLICES;
        self.tables.inverse_slice_godel[cell.index()][board_slice][bit]
    }

    fn check_rotated<'p>(
        &self,
        pattern: &'p Pattern,
        cell: HexPoint,
        angle: usize,
    ) -> Option<PatternHit<'p>> {
        // the ring godel already matched via the hashed lookup; deeper
        // patterns still need their outer slices compared
        if pattern.extension() > 1 && !self.check_rotated_slices(pattern, cell, angle) {
            return None;
        }

        let decode = |pairs: &[(usize, usize)]| {
            pairs
                .iter()
                .map(|&(s, g)| self.rotated_move(cell, s, g, angle))
                .collect::<Vec<_>>()
        };
        Some(PatternHit {
            pattern,
            moves1: decode(pattern.moves1()),
            moves2: decode(pattern.moves2()),
        })
    }

    fn check_rotated_slices(&self, pattern: &Pattern, cell: HexPoint, angle: usize) -> bool {
        let gb = &self.slice_godel[cell.index()][Color::Black as usize];
        let gw = &self.slice_godel[cell.index()][Color::White as usize];
        let pat = pattern.slices();

        for i in 0..NUM_SLICES {
            let j = (angle + i) % NUM_SLICES;
            let black_b = gb[i] & pat[j][FEATURE_CELLS];
            let white_b = gw[i] & pat[j][FEATURE_CELLS];
            let occupied_b = black_b | white_b;

            let black_p = pat[j][FEATURE_BLACK];
            let white_p = pat[j][FEATURE_WHITE];
            let empty_p = pat[j][FEATURE_CELLS] & !black_p & !white_p;

            // board stones must cover the pattern's stones and avoid its
            // empties; extra board stones on pattern stones are fine
            // because the obtuse corner carries both colours
            if occupied_b & empty_p != 0 {
                return false;
            }
            if black_b & black_p != black_p {
                return false;
            }
            if white_b & white_p != white_p {
                return false;
            }
        }
        true
    }
}

/// A group board and its pattern state, kept in lock step.
pub struct PatternBoard<'a> {
    groups: GroupBoard<'a>,
    state: PatternState,
}

impl<'a> PatternBoard<'a> {
    pub fn new(geom: &'a Geometry) -> PatternBoard<'a> {
        PatternBoard {
            groups: GroupBoard::new(geom),
            state: PatternState::new(geom),
        }
    }

    pub fn geometry(&self) -> &'a Geometry {
        self.groups.geometry()
    }

    pub fn board(&self) -> &StoneBoard<'a> {
        self.groups.board()
    }

    pub fn groups(&self) -> &GroupBoard<'a> {
        &self.groups
    }

    /// Mutable group access for callers that restore the stone state
    /// themselves (the incremental VC builder). Pattern godels are NOT
    /// tracked through this; the position must be bit-identical again
    /// before matching resumes.
    pub fn groups_mut(&mut self) -> &mut GroupBoard<'a> {
        &mut self.groups
    }

    pub fn state(&self) -> &PatternState {
        &self.state
    }

    pub fn start_new_game(&mut self) {
        self.groups.start_new_game();
        self.state.update_all(self.groups.board());
    }

    pub fn play_move(&mut self, color: Color, cell: HexPoint) {
        self.groups.play_move(color, cell);
        self.state.update_cell(self.groups.board(), cell);
    }

    /// Adds unplayed fill-in stones and refreshes groups and godels.
    pub fn add_fillin(&mut self, color: Color, cells: PointSet) {
        if cells.is_empty() {
            return;
        }
        self.groups.add_color(color, cells);
        self.state.update_set(self.groups.board(), cells);
        self.groups.absorb_set(cells);
    }

    /// Replaces the whole position and rebuilds all derived state.
    pub fn restore(&mut self, board: StoneBoard<'a>) {
        self.groups.restore(board);
        self.state.update_all(self.groups.board());
    }

    pub fn match_on_cell<'p>(
        &self,
        patset: &'p HashedPatternSet,
        cell: HexPoint,
        mode: MatchMode,
    ) -> Vec<PatternHit<'p>> {
        self.state.match_on_cell(patset, cell, mode)
    }

    pub fn match_on_board<'p>(
        &self,
        consider: PointSet,
        patset: &'p HashedPatternSet,
        mode: MatchMode,
    ) -> Vec<(HexPoint, Vec<PatternHit<'p>>)> {
        self.state
            .match_on_board(self.geometry(), consider, patset, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::geometry::Geometry;

    fn p(name: &str) -> HexPoint {
        name.parse().unwrap()
    }

    #[test]
    fn ring_godel_tracks_moves() {
        let g = Geometry::new(5, 5).unwrap();
        let mut brd = PatternBoard::new(&g);
        brd.start_new_game();

        // a black stone at the east neighbour of c3 must set slice 0
        brd.play_move(Color::Black, p("d3"));
        let mut incremental = PatternState::new(&g);
        incremental.update_all(brd.board());
        assert_eq!(
            incremental.ring_godel[p("c3").index()],
            brd.state().ring_godel[p("c3").index()]
        );

        let mut expect = RingGodel::new();
        expect.add_color_to_slice(0, Color::Black);
        assert_eq!(brd.state().ring_godel[p("c3").index()], expect);
    }

    #[test]
    fn incremental_equals_batch() {
        let g = Geometry::new(5, 5).unwrap();
        let mut brd = PatternBoard::new(&g);
        brd.start_new_game();
        for (c, cell) in [
            (Color::Black, "a1"),
            (Color::White, "b2"),
            (Color::Black, "e5"),
            (Color::White, "c3"),
        ] {
            brd.play_move(c, p(cell));
        }

        let mut batch = PatternState::new(&g);
        batch.update_all(brd.board());
        for cell in g.interior() {
            assert_eq!(
                batch.ring_godel[cell.index()],
                brd.state().ring_godel[cell.index()],
                "ring godel differs at {cell}"
            );
            assert_eq!(
                batch.slice_godel[cell.index()],
                brd.state().slice_godel[cell.index()],
                "slice godel differs at {cell}"
            );
        }
    }

    #[test]
    fn edge_stones_look_like_lines() {
        let g = Geometry::new(5, 5).unwrap();
        let mut brd = PatternBoard::new(&g);
        brd.start_new_game();

        // a1 touches north and west; both edge colours must show up
        let godel = brd.state().ring_godel[p("a1").index()];
        let mut expect = RingGodel::new();
        // north occupies slices 1 and 2, west slices 3 and 4
        expect.add_color_to_slice(1, Color::Black);
        expect.add_color_to_slice(2, Color::Black);
        expect.add_color_to_slice(3, Color::White);
        expect.add_color_to_slice(4, Color::White);
        assert_eq!(godel, expect);
    }
}
