use crate::hex::consts::*;
use crate::hex::coords::HexPoint;
use crate::hex::geometry::Geometry;
use crate::hex::patterns::board::{MatchMode, PatternBoard};
use crate::hex::patterns::hashed::HashedPatternSet;
use crate::hex::patterns::pattern::Pattern;
use crate::hex::sets::PointSet;
use crate::hex::vc::{VcKind, VcSet};

/// Miai between groups of opposite colour:
///
/// ```text
///      . W
///     * .
/// ```
///
/// Matched on the members of a group, the marked stone names the
/// opposite-colour groups a bridge away. Used only by decomposition
/// detection.
const OPPMIAI: &str = "m:5,0,4,4,0;1,0,0,0,0;0,0,0,0,0;0,0,0,0,0;0,0,0,0,0;0,0,0,0,0;1";

/// The hashed miai patterns, one per colour of the centre stone.
pub struct OppMiai {
    hashed: [HashedPatternSet; 2],
}

impl OppMiai {
    pub fn new() -> OppMiai {
        let black = Pattern::parse(OPPMIAI).expect("miai pattern must parse");
        let mut white = black.clone();
        white.flip_colors();
        OppMiai {
            hashed: [
                HashedPatternSet::new(vec![black]),
                HashedPatternSet::new(vec![white]),
            ],
        }
    }

    /// For each group captain, the opposite-colour captains reachable
    /// through a bridge.
    pub fn adjacent_by_miai(&self, brd: &PatternBoard<'_>) -> Box<[PointSet; BITSET_SIZE]> {
        let mut adj: Box<[PointSet; BITSET_SIZE]> = Box::new([PointSet::EMPTY; BITSET_SIZE]);
        let groups = brd.groups();
        for color in Color::both() {
            let stones = brd.board().stones(color) & brd.geometry().cells();
            for p in stones.iter() {
                let hits =
                    brd.match_on_cell(&self.hashed[color as usize], p, MatchMode::MatchAll);
                let cp = groups.captain(p);
                for hit in hits {
                    let cj = groups.captain(hit.moves1[0]);
                    adj[cj.index()].insert(cp);
                    adj[cp.index()].insert(cj);
                }
            }
        }
        adj
    }
}

impl Default for OppMiai {
    fn default() -> Self {
        OppMiai::new()
    }
}

/// BFS over a group digraph, not expanding past members of stopset.
pub fn bfs_over(
    nbs: &[PointSet; BITSET_SIZE],
    start: HexPoint,
    stopset: PointSet,
) -> PointSet {
    let mut seen = PointSet::singleton(start);
    let mut queue = vec![start];
    while let Some(p) = queue.pop() {
        if stopset.contains(p) {
            continue;
        }
        for t in nbs[p.index()].iter() {
            if !seen.contains(t) {
                seen.insert(t);
                queue.push(t);
            }
        }
    }
    seen
}

/// Locations reachable from start through members of the carrier.
pub fn reachable_on_carrier(geom: &Geometry, carrier: &PointSet, start: HexPoint) -> PointSet {
    debug_assert!(carrier.contains(start));
    let mut seen = PointSet::singleton(start);
    let mut queue = vec![start];
    while let Some(p) = queue.pop() {
        for &nb in geom.nbs(p) {
            if carrier.contains(nb) && !seen.contains(nb) {
                seen.insert(nb);
                queue.push(nb);
            }
        }
    }
    seen
}

/// True if p1 and p2 are joined through members of the carrier.
pub fn connected_on_carrier(
    geom: &Geometry,
    carrier: &PointSet,
    p1: HexPoint,
    p2: HexPoint,
) -> bool {
    carrier.contains(p1) && carrier.contains(p2)
        && reachable_on_carrier(geom, carrier, p1).contains(p2)
}

/// Looks for a combinatorial decomposition for colour: two of its
/// groups, fully connected to each other, sharing at least two
/// neighbouring opponent groups, whose connection has a carrier wholly
/// inside the empty region they bound. That carrier is as good as
/// captured.
pub fn find_combinatorial_decomposition(
    brd: &PatternBoard<'_>,
    cons: &VcSet,
    miai: &OppMiai,
    color: Color,
) -> Option<PointSet> {
    let groups = brd.groups();
    let edge1 = color.edge1();
    let edge2 = color.edge2();

    // a decided position has nothing useful to split
    if groups.is_game_over() || cons.exists(groups, edge1, edge2, VcKind::Full) {
        return None;
    }

    let adj_by_miai = miai.adjacent_by_miai(brd);
    let mut adj_to: Vec<(HexPoint, PointSet)> = vec![];
    for g in groups.groups(ColorFilter::Only(color)) {
        let oppt_nbs = adj_by_miai[g.index()] | groups.nbs_of(g, Some(-color));
        if oppt_nbs.len() >= 2 {
            adj_to.push((g, oppt_nbs));
        }
    }
    // the two colour edges always qualify; more are needed for a split
    assert!(adj_to.len() >= 2);
    if adj_to.len() == 2 {
        return None;
    }

    let graph = groups.compute_digraph(color);

    for (i, &(g1, nbs1)) in adj_to.iter().enumerate() {
        for &(g2, nbs2) in &adj_to[..i] {
            if (nbs1 & nbs2).len() < 2 {
                continue;
            }
            if !cons.exists(groups, g1, g2, VcKind::Full) {
                continue;
            }

            let edge1_free = g1 != edge1 && g2 != edge1;
            let edge2_free = g1 != edge2 && g2 != edge2;

            // everything outside the region the pair bounds
            let stop = graph[g1.index()] | graph[g2.index()];
            let mut outside = PointSet::EMPTY;
            if edge1_free {
                outside |= bfs_over(&graph, edge1, stop);
            }
            if edge2_free {
                outside |= bfs_over(&graph, edge2, stop);
            }
            let decomp_area = (PointSet::ALL - outside) & brd.board().empty_cells();

            for vc in cons.list(VcKind::Full, g1, g2).iter() {
                if vc.carrier().is_subset_of(&decomp_area) {
                    return Some(vc.carrier());
                }
            }
        }
    }
    None
}

/// Looks for a colour group that touches (or is a bridge away from)
/// both of the opponent's edges: such a group splits the opponent's
/// side into independent halves.
pub fn find_splitting_decomposition(
    brd: &PatternBoard<'_>,
    miai: &OppMiai,
    color: Color,
) -> Option<HexPoint> {
    let groups = brd.groups();
    let adj_by_miai = miai.adjacent_by_miai(brd);
    let edge1 = (-color).edge1();
    let edge2 = (-color).edge2();
    let adjto1 = adj_by_miai[edge1.index()] | groups.nbs_of(edge1, Some(color));
    let adjto2 = adj_by_miai[edge2.index()] | groups.nbs_of(edge2, Some(color));

    // interior groups only: the edges are always their own captains
    let both = adjto1 & adjto2 & brd.geometry().cells();
    both.first()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::geometry::Geometry;

    fn p(name: &str) -> HexPoint {
        name.parse().unwrap()
    }

    #[test]
    fn miai_finds_bridged_opponents() {
        let g = Geometry::new(5, 5).unwrap();
        let mut brd = PatternBoard::new(&g);
        brd.start_new_game();
        // black c3 and white d2 form the miai shape: the cells between
        // them (d3 is NOT part of it; c2 and d2... the bridge cells are
        // the two common neighbours) stay empty
        brd.play_move(Color::Black, p("c3"));
        brd.play_move(Color::White, p("e2"));

        let miai = OppMiai::new();
        let adj = miai.adjacent_by_miai(&brd);
        let c3 = brd.groups().captain(p("c3"));
        let e2 = brd.groups().captain(p("e2"));
        assert!(adj[c3.index()].contains(e2));
        assert!(adj[e2.index()].contains(c3));
    }

    #[test]
    fn splitting_group_touches_both_edges() {
        let g = Geometry::new(3, 3).unwrap();
        let mut brd = PatternBoard::new(&g);
        brd.start_new_game();
        // a white column from the top row to the bottom row touches
        // both black edges and splits black's side in two
        for cell in ["b1", "b2", "b3"] {
            brd.play_move(Color::White, p(cell));
        }
        let miai = OppMiai::new();
        let group = find_splitting_decomposition(&brd, &miai, Color::White);
        assert_eq!(group, Some(brd.groups().captain(p("b1"))));
        assert_eq!(find_splitting_decomposition(&brd, &miai, Color::Black), None);
    }

    #[test]
    fn carrier_connectivity() {
        let g = Geometry::new(5, 5).unwrap();
        let carrier: PointSet = [p("a1"), p("b1"), p("c1")].iter().collect();
        assert!(connected_on_carrier(&g, &carrier, p("a1"), p("c1")));
        let split: PointSet = [p("a1"), p("c1")].iter().collect();
        assert!(!connected_on_carrier(&g, &split, p("a1"), p("c1")));
    }
}
