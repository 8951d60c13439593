use std::cell::RefCell;

use crate::hex::consts::*;
use crate::hex::coords::HexPoint;
use crate::hex::geometry::Geometry;
use crate::hex::sets::PointSet;
use crate::hex::stoneboard::StoneBoard;

/// Union-find over the played stones and the four edges.
///
/// The captain of a group is its smallest point. Edges sort before
/// interior cells, so any group containing an edge is captained by that
/// edge; two opposite-colour edges can never share a group because only
/// same-colour adjacencies are ever unioned.
#[derive(Clone)]
struct UnionFind {
    parent: [u8; BITSET_SIZE],
}

impl UnionFind {
    fn new() -> UnionFind {
        let mut parent = [0u8; BITSET_SIZE];
        for (i, v) in parent.iter_mut().enumerate() {
            *v = i as u8;
        }
        UnionFind { parent }
    }

    fn clear(&mut self) {
        for (i, v) in self.parent.iter_mut().enumerate() {
            *v = i as u8;
        }
    }

    fn root(&self, p: HexPoint) -> HexPoint {
        let mut i = p.index();
        while self.parent[i] as usize != i {
            i = self.parent[i] as usize;
        }
        HexPoint::from_index(i)
    }

    fn union(&mut self, a: HexPoint, b: HexPoint) {
        let ra = self.root(a);
        let rb = self.root(b);
        if ra == rb {
            return;
        }
        let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
        self.parent[hi.index()] = lo.index() as u8;
        // shorten the original chains
        self.parent[a.index()] = lo.index() as u8;
        self.parent[b.index()] = lo.index() as u8;
    }
}

/// Derived data rebuilt lazily after any mutation.
struct GroupCaches {
    /// Captain lists per colour-filter slot, in location order.
    captains: [Vec<HexPoint>; NUM_FILTER_SLOTS],
    /// Members of each group, indexed by any member's captain.
    members: Box<[PointSet; BITSET_SIZE]>,
    /// Neighbouring captains of each group, split by occupancy.
    nbs: Box<[[PointSet; 3]; BITSET_SIZE]>,
}

/// A stone board plus its connected-component structure.
pub struct GroupBoard<'a> {
    board: StoneBoard<'a>,
    uf: UnionFind,
    caches: RefCell<Option<Box<GroupCaches>>>,
}

impl<'a> GroupBoard<'a> {
    pub fn new(geom: &'a Geometry) -> GroupBoard<'a> {
        GroupBoard {
            board: StoneBoard::new(geom),
            uf: UnionFind::new(),
            caches: RefCell::new(None),
        }
    }

    pub fn board(&self) -> &StoneBoard<'a> {
        &self.board
    }

    pub fn geometry(&self) -> &'a Geometry {
        self.board.geometry()
    }

    // forwarded mutations; each invalidates the caches

    pub fn start_new_game(&mut self) {
        self.board.start_new_game();
        self.absorb_all();
    }

    pub fn play_move(&mut self, color: Color, cell: HexPoint) {
        self.board.play_move(color, cell);
        self.absorb(cell);
    }

    pub fn undo_move(&mut self, cell: HexPoint) {
        self.board.undo_move(cell);
        self.absorb_all();
    }

    pub fn add_color(&mut self, color: Color, b: PointSet) {
        self.board.add_color(color, b);
        self.invalidate();
    }

    pub fn remove_color(&mut self, color: Color, b: PointSet) {
        self.board.remove_color(color, b);
        self.invalidate();
    }

    pub fn set_color_set(&mut self, color: Color, bs: PointSet) {
        self.board.set_color_set(color, bs);
        self.invalidate();
    }

    /// Replaces the whole stone state, e.g. when popping history.
    pub fn restore(&mut self, board: StoneBoard<'a>) {
        self.board = board;
        self.absorb_all();
    }

    // group structure

    /// Recomputes groups from scratch.
    pub fn absorb_all(&mut self) {
        self.uf.clear();
        let occupied = self.board.black() | self.board.white();
        for p in occupied.iter() {
            self.absorb_one(p);
        }
        self.invalidate();
    }

    /// Unions the given occupied cells with their same-colour neighbours.
    pub fn absorb_set(&mut self, changed: PointSet) {
        for p in changed.iter() {
            self.absorb_one(p);
        }
        self.invalidate();
    }

    pub fn absorb(&mut self, cell: HexPoint) {
        self.absorb_one(cell);
        self.invalidate();
    }

    fn absorb_one(&mut self, cell: HexPoint) {
        let color = self.board.color_of(cell);
        assert!(color.is_some(), "absorbing an empty cell {cell}");
        let geom = self.geometry();
        for &nb in geom.nbs(cell) {
            if self.board.color_of(nb) == color {
                self.uf.union(cell, nb);
            }
        }
        debug_assert!(self.captain(crate::hex::coords::NORTH).is_edge());
        debug_assert!(self.captain(crate::hex::coords::SOUTH).is_edge());
        debug_assert!(self.captain(crate::hex::coords::EAST).is_edge());
        debug_assert!(self.captain(crate::hex::coords::WEST).is_edge());
    }

    pub fn captain(&self, p: HexPoint) -> HexPoint {
        self.uf.root(p)
    }

    pub fn is_captain(&self, p: HexPoint) -> bool {
        self.captain(p) == p
    }

    /// Projects a set of locations onto their captains.
    pub fn captainize(&self, locations: PointSet) -> PointSet {
        debug_assert!(self.geometry().is_location_set(&locations));
        locations.iter().map(|p| self.captain(p)).collect()
    }

    /// The captains matching the filter, in location order.
    pub fn groups(&self, filter: ColorFilter) -> Vec<HexPoint> {
        self.ensure_caches();
        self.caches.borrow().as_ref().unwrap().captains[filter.slot()].clone()
    }

    pub fn num_groups(&self, filter: ColorFilter) -> usize {
        self.ensure_caches();
        self.caches.borrow().as_ref().unwrap().captains[filter.slot()].len()
    }

    /// All cells of the group containing cell.
    pub fn group_members(&self, cell: HexPoint) -> PointSet {
        self.ensure_caches();
        self.caches.borrow().as_ref().unwrap().members[self.captain(cell).index()]
    }

    /// Neighbouring captains of the group with the given occupancy.
    pub fn nbs_of(&self, group: HexPoint, occ: Option<Color>) -> PointSet {
        self.ensure_caches();
        self.caches.borrow().as_ref().unwrap().nbs[self.captain(group).index()]
            [occupancy_slot(occ)]
    }

    /// Neighbouring captains matching the filter.
    pub fn nbs_matching(&self, group: HexPoint, filter: ColorFilter) -> PointSet {
        let mut out = PointSet::EMPTY;
        for occ in [Some(Color::Black), Some(Color::White), None] {
            if filter.matches(occ) {
                out |= self.nbs_of(group, occ);
            }
        }
        out
    }

    /// Locations whose occupancy matches the filter, in location order.
    pub fn locations_matching(&self, filter: ColorFilter) -> Vec<HexPoint> {
        self.geometry()
            .locations()
            .iter()
            .copied()
            .filter(|&p| filter.matches(self.board.color_of(p)))
            .collect()
    }

    /// The empty-cell adjacency graph seen through colour's groups: each
    /// group or empty cell maps to the empty cells it touches, where
    /// touching a colour group extends reach to everything the group
    /// touches.
    pub fn compute_digraph(&self, color: Color) -> Box<[PointSet; BITSET_SIZE]> {
        let mut nbs: Box<[PointSet; BITSET_SIZE]> = Box::new([PointSet::EMPTY; BITSET_SIZE]);
        for g in self.groups(ColorFilter::ColorOrEmpty(color)) {
            nbs[g.index()] = self.nbs_of(g, None);
        }
        for p in self.board.empty_set().iter() {
            for &nb in self.geometry().nbs(p) {
                if self.board.color_of(nb) == Some(color) {
                    let reach = nbs[self.captain(nb).index()];
                    nbs[p.index()] |= reach;
                    nbs[p.index()].remove(p);
                }
            }
        }
        nbs
    }

    pub fn winner(&self) -> Option<Color> {
        for c in Color::both() {
            if self.captain(c.edge1()) == self.captain(c.edge2()) {
                return Some(c);
            }
        }
        None
    }

    pub fn is_game_over(&self) -> bool {
        self.winner().is_some()
    }

    fn invalidate(&mut self) {
        self.caches.replace(None);
    }

    fn ensure_caches(&self) {
        if self.caches.borrow().is_some() {
            return;
        }

        let mut captains: [Vec<HexPoint>; NUM_FILTER_SLOTS] = Default::default();
        let mut members = Box::new([PointSet::EMPTY; BITSET_SIZE]);
        let mut nbs = Box::new([[PointSet::EMPTY; 3]; BITSET_SIZE]);

        let filters = [
            ColorFilter::Only(Color::Black),
            ColorFilter::Only(Color::White),
            ColorFilter::OnlyEmpty,
            ColorFilter::NotColor(Color::Black),
            ColorFilter::NotColor(Color::White),
            ColorFilter::Any,
        ];
        for &p in self.geometry().locations() {
            members[self.captain(p).index()].insert(p);
            if !self.is_captain(p) {
                continue;
            }
            let occ = self.board.color_of(p);
            for f in filters {
                if f.matches(occ) {
                    captains[f.slot()].push(p);
                }
            }
        }

        for &p in self.geometry().locations() {
            let pcap = self.captain(p);
            let pocc = self.board.color_of(p);
            for &nb in self.geometry().nbs(p) {
                let ncap = self.captain(nb);
                if ncap != pcap {
                    let nocc = self.board.color_of(nb);
                    nbs[pcap.index()][occupancy_slot(nocc)].insert(ncap);
                    nbs[ncap.index()][occupancy_slot(pocc)].insert(pcap);
                }
            }
        }

        self.caches.replace(Some(Box::new(GroupCaches {
            captains,
            members,
            nbs,
        })));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::coords::{NORTH, SOUTH};

    fn p(name: &str) -> HexPoint {
        name.parse().unwrap()
    }

    #[test]
    fn edges_captain_their_groups() {
        let g = Geometry::new(5, 5).unwrap();
        let mut brd = GroupBoard::new(&g);
        brd.start_new_game();
        brd.play_move(Color::Black, p("a1"));
        assert_eq!(brd.captain(p("a1")), NORTH);
        assert!(!brd.is_game_over());
    }

    #[test]
    fn column_chain_wins_for_black() {
        let g = Geometry::new(5, 5).unwrap();
        let mut brd = GroupBoard::new(&g);
        brd.start_new_game();
        for cell in ["a1", "a2", "a3", "a4", "a5"] {
            brd.play_move(Color::Black, p(cell));
        }
        assert_eq!(brd.captain(NORTH), brd.captain(SOUTH));
        assert_eq!(brd.winner(), Some(Color::Black));
    }

    #[test]
    fn group_neighbours() {
        let g = Geometry::new(5, 5).unwrap();
        let mut brd = GroupBoard::new(&g);
        brd.start_new_game();
        brd.play_move(Color::Black, p("c3"));
        let empties = brd.nbs_of(p("c3"), None);
        assert_eq!(empties.len(), 6);
        assert!(empties.contains(p("c2")));
        assert!(brd.group_members(NORTH).contains(NORTH));
    }

    #[test]
    fn captainize_projects() {
        let g = Geometry::new(5, 5).unwrap();
        let mut brd = GroupBoard::new(&g);
        brd.start_new_game();
        brd.play_move(Color::White, p("a3"));
        let set = PointSet::singleton(p("a3"));
        // a3 touches the west edge, so the edge is its captain
        assert!(brd.captainize(set).contains(crate::hex::coords::WEST));
    }
}
