use crate::hex::consts::*;
use crate::hex::coords::HexPoint;
use crate::hex::ice::cells::{InferiorCells, VulnerableKiller};
use crate::hex::ice::patterns::IcePatternSet;
use crate::hex::patterns::board::{MatchMode, PatternBoard};
use crate::hex::sets::PointSet;

/// Which colours may receive captured fill-in.
pub type CaptureColors = [bool; 2];

pub const ALL_COLORS: CaptureColors = [true, true];

pub fn only(color: Color) -> CaptureColors {
    let mut c = [false, false];
    c[color as usize] = true;
    c
}

#[derive(Clone, Debug)]
pub struct IceParams {
    /// Run the graph-based simplicial and mutual-kill passes.
    pub find_presimplicial: bool,
    /// Classify permanently inferior cells. The solver requires this
    /// off; its proofs cannot carry their carriers.
    pub find_permanently_inferior: bool,
    /// Run the vulnerable/dominated passes in compute_inferior_cells.
    pub find_vulnerable: bool,
    pub find_dominated: bool,
}

impl Default for IceParams {
    fn default() -> Self {
        IceParams {
            find_presimplicial: true,
            find_permanently_inferior: false,
            find_vulnerable: true,
            find_dominated: true,
        }
    }
}

/// The inferior cell engine: classifies empty cells and plays fill-in
/// to fixpoint.
pub struct IceEngine {
    patterns: IcePatternSet,
    params: IceParams,
}

impl IceEngine {
    pub fn new(patterns: IcePatternSet, params: IceParams) -> IceEngine {
        IceEngine { patterns, params }
    }

    pub fn with_builtin_patterns() -> IceEngine {
        IceEngine::new(IcePatternSet::builtin(), IceParams::default())
    }

    pub fn params(&self) -> &IceParams {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut IceParams {
        &mut self.params
    }

    /// Fills in everything it can: dead and captured cells via patterns,
    /// simplicial cells and mutually-killing vulnerable pairs, iterated
    /// to fixpoint, then regions sealed away from the edges.
    ///
    /// The board is modified: classified cells are played as unplayed
    /// fill-in stones.
    pub fn compute_fillin(
        &self,
        color: Color,
        brd: &mut PatternBoard<'_>,
        out: &mut InferiorCells,
        colors_to_capture: CaptureColors,
    ) {
        loop {
            let mut n = self.compute_dead_captured(brd, out, colors_to_capture);
            if self.params.find_presimplicial {
                n += self.fill_in_vulnerable(color, brd, out, colors_to_capture);
            }
            if self.params.find_permanently_inferior {
                n += self.fill_in_permanently_inferior(brd, out, colors_to_capture);
            }
            if n == 0 {
                break;
            }
        }
        self.fill_in_unreachable(brd, out, colors_to_capture);
    }

    /// Full classification for the colour to move: fill-in first, then
    /// vulnerability and domination among the remaining empties.
    pub fn compute_inferior_cells(
        &self,
        color: Color,
        brd: &mut PatternBoard<'_>,
        out: &mut InferiorCells,
    ) {
        self.compute_fillin(color, brd, out, ALL_COLORS);
        let consider = brd.board().empty_cells();
        if self.params.find_vulnerable {
            self.find_vulnerable(brd, color, consider, out);
        }
        if self.params.find_dominated {
            self.find_dominated(brd, color, consider, out);
        }
    }

    // pattern passes

    /// Dead cells found by pattern among the considered cells.
    pub fn find_dead(&self, brd: &PatternBoard<'_>, consider: PointSet) -> PointSet {
        brd.match_on_board(consider, self.patterns.dead(), MatchMode::StopAtFirstHit)
            .iter()
            .map(|(p, _)| *p)
            .collect()
    }

    /// Cells captured by colour, together with their capture partners.
    /// Overlapping captures are taken greedily and disjointly.
    pub fn find_captured(
        &self,
        brd: &PatternBoard<'_>,
        color: Color,
        consider: PointSet,
    ) -> PointSet {
        let mut taken = PointSet::EMPTY;
        for (p, hits) in
            brd.match_on_board(consider, self.patterns.captured(color), MatchMode::StopAtFirstHit)
        {
            let hit = &hits[0];
            let mut set = PointSet::singleton(p);
            for &m in &hit.moves1 {
                set.insert(m);
            }
            if set.intersects(&taken) {
                continue;
            }
            taken |= set;
        }
        taken
    }

    /// Vulnerable cells among the considered set, with their killers.
    pub fn find_vulnerable(
        &self,
        brd: &PatternBoard<'_>,
        color: Color,
        consider: PointSet,
        out: &mut InferiorCells,
    ) {
        for (p, hits) in
            brd.match_on_board(consider, self.patterns.vulnerable(color), MatchMode::MatchAll)
        {
            for hit in hits {
                let Some(&killer) = hit.moves1.first() else {
                    continue;
                };
                let carrier: PointSet = hit.moves2.iter().collect();
                out.add_vulnerable(p, VulnerableKiller { killer, carrier });
            }
        }

        // a lone empty neighbour kills a cell walled in by one group
        for (p, killer) in self.clique_vulnerable(brd, consider) {
            out.add_vulnerable(
                p,
                VulnerableKiller {
                    killer,
                    carrier: PointSet::EMPTY,
                },
            );
        }
    }

    /// Dominated cells among the considered set; arcs go to the killer.
    pub fn find_dominated(
        &self,
        brd: &PatternBoard<'_>,
        color: Color,
        consider: PointSet,
        out: &mut InferiorCells,
    ) {
        for (p, hits) in
            brd.match_on_board(consider, self.patterns.dominated(color), MatchMode::MatchAll)
        {
            for hit in hits {
                if let Some(&killer) = hit.moves1.first() {
                    out.add_dominated(p, killer);
                }
            }
        }
    }

    // graph passes

    fn compute_dead_captured(
        &self,
        brd: &mut PatternBoard<'_>,
        out: &mut InferiorCells,
        colors_to_capture: CaptureColors,
    ) -> usize {
        let mut count = 0;
        loop {
            let empty = brd.board().empty_cells();
            let mut round = 0;

            let dead = self.find_dead(brd, empty);
            if dead.any() {
                out.add_dead(dead);
                brd.add_fillin(DEAD_COLOR, dead);
                round += dead.len();
            }

            for c in Color::both() {
                if !colors_to_capture[c as usize] {
                    continue;
                }
                let captured = self.find_captured(brd, c, brd.board().empty_cells());
                if captured.any() {
                    out.add_captured(c, captured);
                    brd.add_fillin(c, captured);
                    round += captured.len();
                }
            }

            count += round;
            if round == 0 {
                return count;
            }
        }
    }

    /// Simplicial cells are dead; mutually-killing vulnerable pairs of
    /// the colour to move belong to the opponent.
    fn fill_in_vulnerable(
        &self,
        color: Color,
        brd: &mut PatternBoard<'_>,
        out: &mut InferiorCells,
        colors_to_capture: CaptureColors,
    ) -> usize {
        let mut count = 0;

        let dead = self.find_clique_dead(brd);
        if dead.any() {
            out.add_dead(dead);
            brd.add_fillin(DEAD_COLOR, dead);
            count += dead.len();
        }

        let opp = -color;
        if !colors_to_capture[opp as usize] {
            return count;
        }

        let mut local = InferiorCells::new();
        self.find_vulnerable(brd, color, brd.board().empty_cells(), &mut local);

        let vulnerable = local.vulnerable();
        let mut captured = PointSet::EMPTY;
        for x in vulnerable.iter() {
            if captured.contains(x) {
                continue;
            }
            for k in local.killers(x) {
                let y = k.killer;
                if captured.contains(y) || !vulnerable.contains(y) {
                    continue;
                }
                let pair = PointSet::singleton(x).with(y);
                if !k.carrier.is_subset_of(&pair) {
                    continue;
                }
                let mutual = local
                    .killers(y)
                    .iter()
                    .any(|k2| k2.killer == x && k2.carrier.is_subset_of(&pair));
                if mutual && brd.geometry().adjacent(x, y) {
                    captured |= pair;
                    break;
                }
            }
        }
        if captured.any() {
            out.add_captured(opp, captured);
            brd.add_fillin(opp, captured);
            count += captured.len();
        }
        count
    }

    fn fill_in_permanently_inferior(
        &self,
        brd: &mut PatternBoard<'_>,
        out: &mut InferiorCells,
        colors_to_capture: CaptureColors,
    ) -> usize {
        let mut count = 0;
        for c in Color::both() {
            if !colors_to_capture[c as usize] {
                continue;
            }
            let hits = brd.match_on_board(
                brd.board().empty_cells(),
                self.patterns.permanently_inferior(c),
                MatchMode::StopAtFirstHit,
            );
            let mut filled = PointSet::EMPTY;
            for (p, hit) in &hits {
                let carrier: PointSet = hit[0].moves1.iter().collect();
                out.add_permanently_inferior(c, *p, carrier);
                filled.insert(*p);
            }
            if filled.any() {
                brd.add_fillin(c, filled);
                count += filled.len();
            }
        }
        count
    }

    /// Empty cells whose entire neighbourhood is at most one black group
    /// and one white group: they can never join or separate anything.
    fn find_clique_dead(&self, brd: &PatternBoard<'_>) -> PointSet {
        let mut dead = PointSet::EMPTY;
        let groups = brd.groups();
        'cells: for x in brd.board().empty_cells().iter() {
            let mut captains = [None, None];
            for &nb in brd.geometry().nbs(x) {
                match brd.board().color_of(nb) {
                    None => continue 'cells,
                    Some(c) => {
                        let cap = groups.captain(nb);
                        match captains[c as usize] {
                            None => captains[c as usize] = Some(cap),
                            Some(prev) if prev == cap => {}
                            Some(_) => continue 'cells,
                        }
                    }
                }
            }
            dead.insert(x);
        }
        dead
    }

    /// Cells with exactly one empty neighbour whose occupied wall is a
    /// single group: once the lone neighbour is answered, the cell is
    /// walled in no matter who answered.
    fn clique_vulnerable(
        &self,
        brd: &PatternBoard<'_>,
        consider: PointSet,
    ) -> Vec<(HexPoint, HexPoint)> {
        let mut found = vec![];
        let groups = brd.groups();
        'cells: for x in consider.iter() {
            let mut lone_empty = None;
            let mut wall = None;
            for &nb in brd.geometry().nbs(x) {
                match brd.board().color_of(nb) {
                    None => {
                        if lone_empty.is_some() {
                            continue 'cells;
                        }
                        lone_empty = Some(nb);
                    }
                    Some(_) => {
                        let cap = groups.captain(nb);
                        match wall {
                            None => wall = Some(cap),
                            Some(prev) if prev == cap => {}
                            Some(_) => continue 'cells,
                        }
                    }
                }
            }
            if let (Some(k), Some(_)) = (lone_empty, wall) {
                found.push((x, k));
            }
        }
        found
    }

    /// Regions sealed off from the edges. A cell useless for one colour
    /// is the other's; a cell useless for both is dead.
    fn fill_in_unreachable(
        &self,
        brd: &mut PatternBoard<'_>,
        out: &mut InferiorCells,
        colors_to_capture: CaptureColors,
    ) -> usize {
        let empty = brd.board().empty_cells();
        if empty.is_empty() {
            return 0;
        }

        let mut useful = [PointSet::EMPTY; 2];
        for c in Color::both() {
            let r1 = self.reachable_from_edge(brd, c, c.edge1());
            let r2 = self.reachable_from_edge(brd, c, c.edge2());
            useful[c as usize] = r1 & r2 & empty;
        }

        let dead = empty - useful[0] - useful[1];
        let mut count = 0;
        if dead.any() {
            out.add_dead(dead);
            brd.add_fillin(DEAD_COLOR, dead);
            count += dead.len();
        }
        for c in Color::both() {
            let cap = (empty - useful[c as usize]) - dead;
            let taker = -c;
            if cap.any() && colors_to_capture[taker as usize] {
                out.add_captured(taker, cap);
                brd.add_fillin(taker, cap);
                count += cap.len();
            }
        }
        count
    }

    /// Locations reachable from an edge through empty cells and colour's
    /// own stones, without passing through the opposite edge.
    fn reachable_from_edge(
        &self,
        brd: &PatternBoard<'_>,
        color: Color,
        edge: HexPoint,
    ) -> PointSet {
        let passable =
            brd.board().empty_set() | brd.board().stones(color);
        let stop = edge.opposite_edge();
        let mut seen = PointSet::singleton(edge);
        let mut queue = vec![edge];
        while let Some(p) = queue.pop() {
            if p == stop {
                continue;
            }
            for &nb in brd.geometry().nbs(p) {
                if passable.contains(nb) && !seen.contains(nb) {
                    seen.insert(nb);
                    queue.push(nb);
                }
            }
        }
        seen
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
    fn walled_in_cell_is_dead() {
        let g = Geometry::new(5, 5).unwrap();
        let mut brd = PatternBoard::new(&g);
        brd.start_new_game();
        // wall c3 in with a single black chain on four consecutive
        // ring cells: d3 (E), d2 (NE), c2 (N), b3 (W)
        for cell in ["d3", "d2", "c2", "b3"] {
            brd.play_move(Color::Black, p(cell));
        }
        let ice = IceEngine::with_builtin_patterns();
        let dead = ice.find_dead(&brd, brd.board().empty_cells());
        assert!(dead.contains(p("c3")), "dead cells were: {dead}");
    }

    #[test]
    fn walled_pair_is_captured() {
        let g = Geometry::new(5, 5).unwrap();
        let mut brd = PatternBoard::new(&g);
        brd.start_new_game();
        // every neighbour of the adjacent empties {a2, a3} outside the
        // pair is white (a1, b1, b2, b3, a4 plus the west edge), so the
        // pair is a White capture
        for cell in ["a1", "b1", "b2", "b3", "a4"] {
            brd.play_move(Color::White, p(cell));
        }
        let ice = IceEngine::with_builtin_patterns();
        let mut inf = InferiorCells::new();
        ice.compute_fillin(Color::Black, &mut brd, &mut inf, ALL_COLORS);
        let white_side = inf.captured(Color::White) | inf.dead();
        assert!(white_side.contains(p("a2")), "classified: {}", inf.all());
        assert!(white_side.contains(p("a3")));
        assert!(brd.board().is_occupied(p("a2")));
        assert!(!brd.board().is_played(p("a2")));
    }

    #[test]
    fn sealed_region_goes_to_the_sealer() {
        let g = Geometry::new(5, 5).unwrap();
        let mut brd = PatternBoard::new(&g);
        brd.start_new_game();
        // a full black column on file b seals file a away from both
        // white edges
        for cell in ["b1", "b2", "b3", "b4", "b5"] {
            brd.play_move(Color::Black, p(cell));
        }
        let ice = IceEngine::with_builtin_patterns();
        let mut inf = InferiorCells::new();
        ice.compute_fillin(Color::White, &mut brd, &mut inf, ALL_COLORS);
        for cell in ["a1", "a2", "a3", "a4", "a5"] {
            assert!(
                (inf.captured(Color::Black) | inf.dead()).contains(p(cell)),
                "{cell} not filled; classified: {}",
                inf.all()
            );
        }
    }
}
