use crate::hex::consts::*;
use crate::hex::coords::{self, HexPoint};
use crate::hex::sets::PointSet;
use crate::utils::prelude::*;

/// Static data for one board size: the point ordering, the valid sets,
/// and the neighbour rings out to MAX_EXTENSION.
///
/// A `Geometry` is built once per size and passed by reference to
/// everything that needs it; there is no global cache behind it.
#[derive(Debug)]
pub struct Geometry {
    width: usize,
    height: usize,

    /// All valid identifiers in canonical order: specials, edges, then
    /// interior cells row by row. Board-id packing relies on this order.
    points: Vec<HexPoint>,

    /// Interior cells only, in row-major order.
    interior: Vec<HexPoint>,

    /// Edges followed by interior cells.
    locations: Vec<HexPoint>,

    valid: PointSet,
    locations_set: PointSet,
    cells: PointSet,

    /// nbs[p][r] lists every location within distance r of p, for
    /// r in 1..=MAX_EXTENSION. Index 0 is unused.
    nbs: Vec<[Vec<HexPoint>; MAX_EXTENSION + 1]>,
}

/// The spiral walk of one pattern slice: cells at distance 1, then 2,
/// then 3, each ring walked to the "left" of the slice direction.
///
/// This is the only place that knows the slice ordering; the godel
/// tables, pattern mirroring and the neighbour rings all derive from it.
pub(crate) fn spiral_walk(slice: usize) -> impl Iterator<Item = (i32, i32)> {
    let fwd = HexDirection::from_index(slice);
    let lft = HexDirection::from_index((slice + 2) % NUM_DIRECTIONS);
    (1..=MAX_EXTENSION).flat_map(move |r| {
        let (x1, y1) = (fwd.delta_x() * r as i32, fwd.delta_y() * r as i32);
        (0..r).map(move |j| (x1 + lft.delta_x() * j as i32, y1 + lft.delta_y() * j as i32))
    })
}

impl Geometry {
    pub fn new(width: usize, height: usize) -> Result<Geometry> {
        if width == 0 || width > MAX_WIDTH || height == 0 || height > MAX_HEIGHT {
            return Err(anyhow!("unsupported board size {width}x{height}"));
        }

        let mut g = Geometry {
            width,
            height,
            points: vec![],
            interior: vec![],
            locations: vec![],
            valid: PointSet::EMPTY,
            locations_set: PointSet::EMPTY,
            cells: PointSet::EMPTY,
            nbs: vec![Default::default(); BITSET_SIZE],
        };
        g.compute_point_list();
        g.compute_sets();
        g.compute_neighbours();
        log::debug!("built geometry for {width}x{height}");
        Ok(g)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// All valid identifiers, specials first.
    pub fn all_points(&self) -> &[HexPoint] {
        &self.points
    }

    /// Edges and interior cells.
    pub fn locations(&self) -> &[HexPoint] {
        &self.locations
    }

    /// Interior cells in row-major order.
    pub fn interior(&self) -> &[HexPoint] {
        &self.interior
    }

    pub fn valid_set(&self) -> PointSet {
        self.valid
    }

    pub fn locations_set(&self) -> PointSet {
        self.locations_set
    }

    /// The set of interior cells.
    pub fn cells(&self) -> PointSet {
        self.cells
    }

    pub fn is_valid(&self, p: HexPoint) -> bool {
        self.valid.contains(p)
    }

    pub fn is_location(&self, p: HexPoint) -> bool {
        self.locations_set.contains(p)
    }

    pub fn is_cell(&self, p: HexPoint) -> bool {
        self.cells.contains(p)
    }

    pub fn is_valid_set(&self, s: &PointSet) -> bool {
        s.is_subset_of(&self.valid)
    }

    pub fn is_location_set(&self, s: &PointSet) -> bool {
        s.is_subset_of(&self.locations_set)
    }

    /// The immediate neighbours of a location.
    pub fn nbs(&self, p: HexPoint) -> &[HexPoint] {
        &self.nbs[p.index()][1]
    }

    /// Every location within the given radius of p.
    pub fn nbs_radius(&self, p: HexPoint, radius: usize) -> &[HexPoint] {
        debug_assert!(radius >= 1 && radius <= MAX_EXTENSION);
        &self.nbs[p.index()][radius]
    }

    pub fn adjacent(&self, p1: HexPoint, p2: HexPoint) -> bool {
        self.nbs(p1).contains(&p2)
    }

    /// Converts coordinates that may lie one step off the board into the
    /// matching edge. Obtuse corners map to no point at all.
    pub fn coords_to_point(&self, x: i32, y: i32) -> Option<HexPoint> {
        let (w, h) = (self.width as i32, self.height as i32);
        if x <= -2 || x > w || y <= -2 || y > h {
            return None;
        }
        if (x == -1 || x == w) && (y == -1 || y == h) {
            return None;
        }
        if y == -1 {
            return Some(coords::NORTH);
        }
        if y == h {
            return Some(coords::SOUTH);
        }
        if x == -1 {
            return Some(coords::WEST);
        }
        if x == w {
            return Some(coords::EAST);
        }
        Some(HexPoint::from_coords(x as usize, y as usize))
    }

    /// The point one step from p in the given direction; edges map to
    /// themselves.
    pub fn point_in_dir(&self, p: HexPoint, dir: HexDirection) -> Option<HexPoint> {
        if p.is_edge() {
            return Some(p);
        }
        let (x, y) = p.to_coords();
        self.coords_to_point(x as i32 + dir.delta_x(), y as i32 + dir.delta_y())
    }

    /// Shifts every member one step in dir. Returns false if any interior
    /// member fell off the board.
    pub fn shift_set(&self, s: &PointSet, dir: HexDirection) -> (PointSet, bool) {
        let mut out = PointSet::EMPTY;
        let mut inside = true;
        for p in s.iter() {
            match self.point_in_dir(p, dir) {
                Some(q) => {
                    if !p.is_edge() && q.is_edge() {
                        inside = false;
                    }
                    out.insert(q);
                }
                None => inside = false,
            }
        }
        (out, inside)
    }

    pub fn distance(&self, x: HexPoint, y: HexPoint) -> usize {
        debug_assert!(self.is_location(x) && self.is_location(y));
        if y.is_edge() {
            return self.distance_to_edge(x, y);
        }
        if x.is_edge() {
            return self.distance_to_edge(y, x);
        }
        let (c1, r1) = x.to_coords();
        let (c2, r2) = y.to_coords();
        let dr = r1 as i32 - r2 as i32;
        let dc = c1 as i32 - c2 as i32;
        if dr * dc >= 0 {
            (dr.abs() + dc.abs()) as usize
        } else {
            dr.abs().max(dc.abs()) as usize
        }
    }

    fn distance_to_edge(&self, from: HexPoint, edge: HexPoint) -> usize {
        debug_assert!(edge.is_edge());
        if from.is_edge() {
            if from == edge {
                return 0;
            }
            if from.opposite_edge() != edge {
                return 1;
            }
            return if edge == coords::NORTH || edge == coords::SOUTH {
                self.height
            } else {
                self.width
            };
        }
        let (c, r) = from.to_coords();
        match edge {
            coords::NORTH => r + 1,
            coords::SOUTH => self.height - r,
            coords::EAST => self.width - c,
            _ => c + 1,
        }
    }

    /// 180 degree rotation about the centre. Edges map to their
    /// opposites.
    pub fn rotate(&self, p: HexPoint) -> HexPoint {
        if !self.is_location(p) {
            return p;
        }
        if p.is_edge() {
            return p.opposite_edge();
        }
        let (x, y) = p.to_coords();
        HexPoint::from_coords(self.width - 1 - x, self.height - 1 - y)
    }

    pub fn rotate_set(&self, s: &PointSet) -> PointSet {
        s.iter().map(|p| self.rotate(p)).collect()
    }

    /// Reflection about the acute diagonal; the board must be square.
    pub fn mirror(&self, p: HexPoint) -> HexPoint {
        debug_assert!(self.width == self.height);
        if !self.is_location(p) {
            return p;
        }
        if p.is_edge() {
            return if Color::Black.is_color_edge(p) {
                p.right_edge()
            } else {
                p.left_edge()
            };
        }
        let (x, y) = p.to_coords();
        HexPoint::from_coords(y, x)
    }

    pub fn mirror_set(&self, s: &PointSet) -> PointSet {
        s.iter().map(|p| self.mirror(p)).collect()
    }

    pub fn center_point(&self) -> HexPoint {
        debug_assert!(self.width % 2 == 1 && self.height % 2 == 1);
        self.center_point_right()
    }

    pub fn center_point_right(&self) -> HexPoint {
        let x = self.width / 2;
        let mut y = self.height / 2;
        if self.width % 2 == 0 && self.height % 2 == 0 {
            y -= 1;
        }
        HexPoint::from_coords(x, y)
    }

    pub fn center_point_left(&self) -> HexPoint {
        let mut x = self.width / 2;
        let mut y = self.height / 2;
        if self.width % 2 == 0 {
            x -= 1;
        }
        if self.width % 2 == 1 && self.height % 2 == 0 {
            y -= 1;
        }
        HexPoint::from_coords(x, y)
    }

    /// Re-indexes a set of interior cells into consecutive bits, in the
    /// canonical interior order.
    pub fn pack(&self, s: &PointSet) -> PointSet {
        let mut out = PointSet::EMPTY;
        for (j, p) in self.interior.iter().enumerate() {
            if s.contains(*p) {
                out.insert(HexPoint::from_index(j));
            }
        }
        out
    }

    pub fn unpack(&self, s: &PointSet) -> PointSet {
        let mut out = PointSet::EMPTY;
        for (j, p) in self.interior.iter().enumerate() {
            if s.contains(HexPoint::from_index(j)) {
                out.insert(*p);
            }
        }
        out
    }

    // construction

    fn compute_point_list(&mut self) {
        for i in coords::FIRST_SPECIAL..coords::FIRST_CELL {
            self.points.push(HexPoint(i));
        }
        for y in 0..self.height {
            for x in 0..self.width {
                self.points.push(HexPoint::from_coords(x, y));
            }
        }
        let edges_at = (coords::FIRST_EDGE - coords::FIRST_SPECIAL) as usize;
        let cells_at = (coords::FIRST_CELL - coords::FIRST_SPECIAL) as usize;
        self.locations = self.points[edges_at..].to_vec();
        self.interior = self.points[cells_at..].to_vec();
    }

    fn compute_sets(&mut self) {
        self.valid = self.points.iter().collect();
        self.locations_set = self.locations.iter().collect();
        self.cells = self.interior.iter().collect();
    }

    fn compute_neighbours(&mut self) {
        fn push_unique(v: &mut Vec<HexPoint>, p: HexPoint) {
            if !v.contains(&p) {
                v.push(p);
            }
        }

        // Walk every slice from every interior cell, adding each reached
        // point to both lists for every radius that covers it.
        for ci in 0..self.interior.len() {
            let cur = self.interior[ci];
            let (x, y) = cur.to_coords();
            for slice in 0..NUM_DIRECTIONS {
                for (g, (dx, dy)) in spiral_walk(slice).enumerate() {
                    let r = ring_of(g);
                    let Some(p) = self.coords_to_point(x as i32 + dx, y as i32 + dy) else {
                        continue;
                    };
                    for v in r..=MAX_EXTENSION {
                        push_unique(&mut self.nbs[cur.index()][v], p);
                        push_unique(&mut self.nbs[p.index()][v], cur);
                    }
                }
            }
        }

        // Edges sharing a corner are adjacent; the opposite edge is not.
        for e in [coords::NORTH, coords::EAST, coords::SOUTH, coords::WEST] {
            for r in 1..=MAX_EXTENSION {
                push_unique(&mut self.nbs[e.index()][r], e.left_edge());
                push_unique(&mut self.nbs[e.index()][r], e.right_edge());
            }
        }
    }
}

/// The ring (distance from centre) of a spiral position.
pub(crate) fn ring_of(g: usize) -> usize {
    let mut g = g;
    for r in 1..=MAX_EXTENSION {
        if g < r {
            return r;
        }
        g -= r;
    }
    panic!("spiral position {g} out of range");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::coords::{EAST, NORTH, SOUTH, WEST};

    fn p(name: &str) -> HexPoint {
        name.parse().unwrap()
    }

    #[test]
    fn corner_neighbours() {
        let g = Geometry::new(11, 11).unwrap();
        let nbs: Vec<_> = g.nbs(p("a1")).to_vec();
        assert_eq!(nbs.len(), 4);
        for q in [p("b1"), p("a2"), NORTH, WEST] {
            assert!(nbs.contains(&q), "missing {q}");
        }
    }

    #[test]
    fn edge_adjacency() {
        let g = Geometry::new(5, 5).unwrap();
        assert!(g.adjacent(NORTH, EAST));
        assert!(g.adjacent(NORTH, WEST));
        assert!(!g.adjacent(NORTH, SOUTH));
        assert!(g.adjacent(p("c1"), NORTH));
        assert!(!g.adjacent(p("c2"), NORTH));
    }

    #[test]
    fn rotation_and_mirror() {
        let g = Geometry::new(5, 5).unwrap();
        assert_eq!(g.rotate(p("a1")), p("e5"));
        assert_eq!(g.rotate(NORTH), SOUTH);
        assert_eq!(g.mirror(p("b1")), p("a2"));
        assert_eq!(g.mirror(NORTH), WEST);
        assert_eq!(g.rotate(g.rotate(p("c2"))), p("c2"));
    }

    #[test]
    fn distances() {
        let g = Geometry::new(11, 11).unwrap();
        assert_eq!(g.distance(p("a1"), NORTH), 1);
        assert_eq!(g.distance(p("a2"), NORTH), 2);
        assert_eq!(g.distance(p("a1"), p("b2")), 2);
        assert_eq!(g.distance(p("b1"), p("a2")), 1);
    }

    #[test]
    fn pack_roundtrip() {
        let g = Geometry::new(4, 3).unwrap();
        let s: PointSet = [p("a1"), p("d3"), p("b2")].iter().collect();
        assert_eq!(g.unpack(&g.pack(&s)), s);
    }
}
