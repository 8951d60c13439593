use crate::hex::consts::Color;
use crate::hex::coords::HexPoint;
use crate::hex::geometry::Geometry;
use crate::hex::sets::PointSet;
use crate::hex::stoneboard::StoneBoard;

/// A precomputed edge template: a full connection between a cell and an
/// edge whose carrier is known in advance.
#[derive(Clone, Debug)]
pub struct VcPattern {
    end1: HexPoint,
    end2: HexPoint,
    /// Cells the owner must already occupy.
    must_have: PointSet,
    /// Cells that must not be opponent stones (the carrier area plus
    /// the cell endpoint).
    not_opponent: PointSet,
}

impl VcPattern {
    pub fn endpoints(&self) -> (HexPoint, HexPoint) {
        (self.end1, self.end2)
    }

    pub fn not_opponent(&self) -> PointSet {
        self.not_opponent
    }

    pub fn matches(&self, color: Color, brd: &StoneBoard<'_>) -> bool {
        self.must_have.is_subset_of(&brd.stones(color))
            && !self.not_opponent.intersects(&brd.stones(-color))
    }
}

/// The generated templates for one colour on one board.
pub struct VcPatternSet {
    patterns: Vec<VcPattern>,
}

impl VcPatternSet {
    pub fn empty() -> VcPatternSet {
        VcPatternSet { patterns: vec![] }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VcPattern> {
        self.patterns.iter()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Generates the second and third row edge templates for colour:
    /// the two-cell bridge under a row-two cell and the five-cell
    /// ziggurat under a row-three cell, at every column where they fit.
    pub fn generate(geom: &Geometry, color: Color) -> VcPatternSet {
        let mut patterns = vec![];
        let (w, h) = (geom.width() as i32, geom.height() as i32);

        // the cell itself, then carrier offsets per template, relative
        // to the cell, oriented toward the north edge
        let bridge = [(0, -1), (1, -1)];
        let ziggurat = [(0, -1), (1, -1), (0, -2), (1, -2), (2, -2)];

        let mut push = |cell: (i32, i32), offs: &[(i32, i32)], edge: HexPoint| {
            let Some(end1) = geom.coords_to_point(cell.0, cell.1) else {
                return;
            };
            let mut carrier = PointSet::EMPTY;
            for (dx, dy) in offs {
                let Some(p) = geom.coords_to_point(cell.0 + dx, cell.1 + dy) else {
                    return;
                };
                if !p.is_interior() {
                    return;
                }
                carrier.insert(p);
            }
            patterns.push(VcPattern {
                end1,
                end2: edge,
                must_have: PointSet::EMPTY,
                not_opponent: carrier.with(end1),
            });
        };

        // Templates for the four edges are reflections of the same
        // shape; the offsets flip sign along the axis toward the edge.
        let flip = |offs: &[(i32, i32)], sx: i32, sy: i32, transpose: bool| -> Vec<(i32, i32)> {
            offs.iter()
                .map(|&(dx, dy)| {
                    let (dx, dy) = if transpose { (dy, dx) } else { (dx, dy) };
                    (dx * sx, dy * sy)
                })
                .collect()
        };

        match color {
            Color::Black => {
                for x in 0..w {
                    push((x, 1), &bridge, crate::hex::coords::NORTH);
                    push((x, 2), &ziggurat, crate::hex::coords::NORTH);
                    push((x, h - 2), &flip(&bridge, -1, -1, false), crate::hex::coords::SOUTH);
                    push((x, h - 3), &flip(&ziggurat, -1, -1, false), crate::hex::coords::SOUTH);
                }
            }
            Color::White => {
                for y in 0..h {
                    push((1, y), &flip(&bridge, 1, 1, true), crate::hex::coords::WEST);
                    push((2, y), &flip(&ziggurat, 1, 1, true), crate::hex::coords::WEST);
                    push((w - 2, y), &flip(&bridge, -1, -1, true), crate::hex::coords::EAST);
                    push((w - 3, y), &flip(&ziggurat, -1, -1, true), crate::hex::coords::EAST);
                }
            }
        }

        VcPatternSet { patterns }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(name: &str) -> HexPoint {
        name.parse().unwrap()
    }

    #[test]
    fn bridge_template_shape() {
        let geom = Geometry::new(5, 5).unwrap();
        let set = VcPatternSet::generate(&geom, Color::Black);
        let carrier: PointSet = [p("c1"), p("d1")].iter().collect();
        let found = set.iter().any(|t| {
            t.endpoints() == (p("c2"), crate::hex::coords::NORTH)
                && t.not_opponent() == carrier.with(p("c2"))
        });
        assert!(found);
    }

    #[test]
    fn ziggurat_template_shape() {
        let geom = Geometry::new(5, 5).unwrap();
        let set = VcPatternSet::generate(&geom, Color::Black);
        let carrier: PointSet = [p("b2"), p("c2"), p("b1"), p("c1"), p("d1")]
            .iter()
            .collect();
        let found = set.iter().any(|t| {
            t.endpoints() == (p("b3"), crate::hex::coords::NORTH)
                && t.not_opponent() == carrier.with(p("b3"))
        });
        assert!(found);
    }

    #[test]
    fn white_templates_reach_their_edges() {
        let geom = Geometry::new(5, 5).unwrap();
        let set = VcPatternSet::generate(&geom, Color::White);
        assert!(set.len() > 0);
        for t in set.iter() {
            let (_, edge) = t.endpoints();
            assert!(Color::White.is_color_edge(edge));
        }
    }
}
