use crate::hex::consts::*;
use crate::hex::coords::{self, HexPoint};
use crate::hex::decomp::{self, OppMiai};
use crate::hex::geometry::Geometry;
use crate::hex::groupboard::GroupBoard;
use crate::hex::ice::{IceEngine, InferiorCells};
use crate::hex::patterns::board::PatternBoard;
use crate::hex::sets::PointSet;
use crate::hex::stoneboard::StoneBoard;
use crate::hex::vc::pattern::VcPatternSet;
use crate::hex::vc::set::{DEFAULT_FULL_SOFT_LIMIT, DEFAULT_SEMI_SOFT_LIMIT};
use crate::hex::vc::{Vc, VcBuilder, VcBuilderParam, VcKind, VcSet};

/// How fill-in that completes a winning chain is treated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndgameFillin {
    /// Undo the fill-in so the search can still find short wins.
    RemoveWinningFillin,
    /// Leave the winning fill-in on the board.
    DoNotRemoveWinningFillin,
}

/// Which subsystems a board keeps up to date.
#[derive(Clone, Copy, Debug)]
pub struct HexBoardSettings {
    pub use_vcs: bool,
    pub use_ice: bool,
    pub use_decompositions: bool,
}

impl Default for HexBoardSettings {
    fn default() -> Self {
        HexBoardSettings {
            use_vcs: true,
            use_ice: true,
            use_decompositions: true,
        }
    }
}

/// One stacked move: everything needed to restore the previous state.
/// The change logs of both colours carry a marker per frame.
struct History<'a> {
    board: StoneBoard<'a>,
    inf: InferiorCells,
    to_play: Color,
    last_played: HexPoint,
}

/// The full analysis board: stones, groups, pattern godels, inferior
/// cells and both colours' connection sets, kept consistent across
/// compute_all / play_move / undo_move.
pub struct HexBoard<'a> {
    brd: PatternBoard<'a>,
    ice: &'a IceEngine,
    cons: [VcSet; 2],
    builder: VcBuilder,
    vc_patterns: [VcPatternSet; 2],
    miai: OppMiai,
    settings: HexBoardSettings,
    inf: InferiorCells,
    history: Vec<History<'a>>,
}

impl<'a> HexBoard<'a> {
    pub fn new(geom: &'a Geometry, ice: &'a IceEngine) -> HexBoard<'a> {
        let mut board = HexBoard {
            brd: PatternBoard::new(geom),
            ice,
            cons: [
                VcSet::new(Color::Black, DEFAULT_FULL_SOFT_LIMIT, DEFAULT_SEMI_SOFT_LIMIT),
                VcSet::new(Color::White, DEFAULT_FULL_SOFT_LIMIT, DEFAULT_SEMI_SOFT_LIMIT),
            ],
            builder: VcBuilder::new(VcBuilderParam::default()),
            vc_patterns: [
                VcPatternSet::generate(geom, Color::Black),
                VcPatternSet::generate(geom, Color::White),
            ],
            miai: OppMiai::new(),
            settings: HexBoardSettings::default(),
            inf: InferiorCells::new(),
            history: vec![],
        };
        board.brd.start_new_game();
        board
    }

    // accessors

    pub fn geometry(&self) -> &'a Geometry {
        self.brd.geometry()
    }

    pub fn board(&self) -> &StoneBoard<'a> {
        self.brd.board()
    }

    pub fn groups(&self) -> &GroupBoard<'a> {
        self.brd.groups()
    }

    pub fn pattern_board(&self) -> &PatternBoard<'a> {
        &self.brd
    }

    pub fn ice(&self) -> &'a IceEngine {
        self.ice
    }

    pub fn cons(&self, color: Color) -> &VcSet {
        &self.cons[color as usize]
    }

    pub fn inferior_cells(&self) -> &InferiorCells {
        &self.inf
    }

    /// Cells found dead since the last compute_all.
    pub fn dead(&self) -> PointSet {
        self.inf.dead()
    }

    pub fn settings(&self) -> &HexBoardSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut HexBoardSettings {
        &mut self.settings
    }

    pub fn builder_param_mut(&mut self) -> &mut VcBuilderParam {
        self.builder.param_mut()
    }

    pub fn hash(&self) -> u64 {
        self.brd.board().hash()
    }

    pub fn is_game_over(&self) -> bool {
        self.brd.groups().is_game_over()
    }

    pub fn winner(&self) -> Option<Color> {
        self.brd.groups().winner()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Restarts from an empty board; no analysis is performed until
    /// compute_all.
    pub fn start_new_game(&mut self) {
        self.history.clear();
        self.inf.clear();
        for c in Color::both() {
            self.cons[c as usize].clear();
        }
        self.brd.start_new_game();
    }

    // the big three

    /// Clears history and computes everything for the current position:
    /// fill-in for the colour to play, both connection sets, and any
    /// decomposition fill.
    pub fn compute_all(&mut self, to_play: Color, endgame: EndgameFillin) {
        self.history.clear();
        self.inf.clear();

        if self.settings.use_ice {
            self.compute_fillin_for(to_play, endgame);
        }
        if self.settings.use_vcs {
            for c in Color::both() {
                self.builder.build(
                    &mut self.cons[c as usize],
                    self.brd.groups(),
                    &self.vc_patterns[c as usize],
                );
            }
            if self.settings.use_decompositions {
                self.handle_vc_decomposition(to_play);
            }
        }
    }

    /// Pushes a history frame, plays the stone, runs incremental
    /// fill-in and updates both connection sets.
    pub fn play_move(&mut self, color: Color, cell: HexPoint) {
        assert!(cell.is_interior(), "playing non-cell {cell}");
        assert!(self.brd.board().is_empty(cell), "playing occupied {cell}");

        self.push_history(color, cell);
        self.brd.play_move(color, cell);

        let mut added = [PointSet::EMPTY; 2];
        added[color as usize].insert(cell);

        if self.settings.use_ice {
            let mut inf = InferiorCells::new();
            self.ice
                .compute_inferior_cells(-color, &mut self.brd, &mut inf);
            for c in Color::both() {
                added[c as usize] |= inf.fillin(c);
            }
            added[DEAD_COLOR as usize] |= inf.dead();

            // dead and captured accumulate over the history since the
            // last full compute; the cells stay filled on the board, so
            // proofs must keep excluding them. Vulnerability and
            // domination are only valid for the current state.
            inf.add_dead(self.inf.dead());
            for c in Color::both() {
                inf.add_captured(c, self.inf.captured(c));
            }
            self.inf = inf;
        } else {
            self.inf.clear();
        }

        if self.settings.use_vcs {
            for c in Color::both() {
                self.builder.build_incremental(
                    &mut self.cons[c as usize],
                    self.brd.groups_mut(),
                    &self.vc_patterns[c as usize],
                    added,
                    false,
                );
            }
            if self.settings.use_decompositions {
                self.handle_vc_decomposition(-color);
            }
        }
    }

    /// Pushes a history frame and fills a set of stones for colour
    /// without touching the hash. One undo_move reverts the batch.
    pub fn play_stones(&mut self, color: Color, cells: PointSet, to_play: Color) {
        let cells = cells & self.brd.board().empty_cells();
        self.push_history(to_play, coords::INVALID);
        self.brd.add_fillin(color, cells);

        if self.settings.use_vcs {
            let mut added = [PointSet::EMPTY; 2];
            added[color as usize] = cells;
            for c in Color::both() {
                self.builder.build_incremental(
                    &mut self.cons[c as usize],
                    self.brd.groups_mut(),
                    &self.vc_patterns[c as usize],
                    added,
                    false,
                );
            }
        }
    }

    /// Fills stones without a history frame: the changes ride on the
    /// enclosing frame's log markers and revert with it.
    fn add_stones(&mut self, color: Color, cells: PointSet) {
        let cells = cells & self.brd.board().empty_cells();
        if cells.is_empty() {
            return;
        }
        self.brd.add_fillin(color, cells);

        if self.settings.use_vcs {
            let mut added = [PointSet::EMPTY; 2];
            added[color as usize] = cells;
            for c in Color::both() {
                self.builder.build_incremental(
                    &mut self.cons[c as usize],
                    self.brd.groups_mut(),
                    &self.vc_patterns[c as usize],
                    added,
                    false,
                );
            }
        }
    }

    /// Pops the last frame: replays both change logs backwards to their
    /// markers, restores the inferior cells and the stone state.
    pub fn undo_move(&mut self) {
        let frame = self.history.pop().expect("undo with no history");
        if self.settings.use_vcs {
            for c in Color::both() {
                self.cons[c as usize].revert_to_marker();
            }
        }
        self.inf = frame.inf;
        self.brd.restore(frame.board);
    }

    /// The cells colour must play on to prevent an immediate loss: the
    /// intersection of the opponent's winning semi carriers. Empty when
    /// the opponent owns a winning full.
    pub fn get_mustplay(&self, color: Color) -> PointSet {
        let other = -color;
        let groups = self.brd.groups();
        let e1 = groups.captain(other.edge1());
        let e2 = groups.captain(other.edge2());
        if self.cons[other as usize].exists(groups, e1, e2, VcKind::Full) {
            return PointSet::EMPTY;
        }
        self.cons[other as usize]
            .list(VcKind::Semi, e1, e2)
            .hard_intersection()
            & self.brd.board().empty_cells()
    }

    /// The union of the opponent's winning semi carriers: the region
    /// that proves a loss when the mustplay runs dry.
    pub fn mustplay_carrier(&self, color: Color) -> PointSet {
        let other = -color;
        let groups = self.brd.groups();
        let list = self.cons[other as usize].list(
            VcKind::Semi,
            groups.captain(other.edge1()),
            groups.captain(other.edge2()),
        );
        if self.builder.param().use_greedy_union {
            list.greedy_union()
        } else {
            list.union()
        }
    }

    /// The smallest winning semi for colour, if any.
    pub fn winning_semi(&self, color: Color) -> Option<Vc> {
        self.cons[color as usize].smallest(
            self.brd.groups(),
            color.edge1(),
            color.edge2(),
            VcKind::Semi,
        )
    }

    /// The smallest winning full for colour, if any.
    pub fn winning_full(&self, color: Color) -> Option<Vc> {
        self.cons[color as usize].smallest(
            self.brd.groups(),
            color.edge1(),
            color.edge2(),
            VcKind::Full,
        )
    }

    /// Finds a splitting group for colour, if any.
    pub fn splitting_decomposition(&self, color: Color) -> Option<HexPoint> {
        decomp::find_splitting_decomposition(&self.brd, &self.miai, color)
    }

    // internals

    fn push_history(&mut self, to_play: Color, last_played: HexPoint) {
        self.history.push(History {
            board: self.brd.board().clone(),
            inf: self.inf.clone(),
            to_play,
            last_played,
        });
        if self.settings.use_vcs {
            for c in Color::both() {
                self.cons[c as usize].mark_log();
            }
        }
    }

    fn compute_fillin_for(&mut self, to_play: Color, endgame: EndgameFillin) {
        let snapshot = self.brd.board().clone();
        let was_over = self.brd.groups().is_game_over();

        let mut inf = InferiorCells::new();
        self.ice
            .compute_inferior_cells(to_play, &mut self.brd, &mut inf);

        if endgame == EndgameFillin::RemoveWinningFillin
            && !was_over
            && self.brd.groups().is_game_over()
        {
            // fill-in completed a winning chain; back it all out so a
            // search from here can still measure distance to the win
            log::debug!("removing winning fill-in");
            self.brd.restore(snapshot);
            self.inf.clear();
            return;
        }
        self.inf = inf;
    }

    /// Finds decompositions for either colour and fills their captured
    /// carriers, rebuilding connections, until none remain.
    fn handle_vc_decomposition(&mut self, to_play: Color) {
        loop {
            let mut found = false;
            for color in [to_play, -to_play] {
                if let Some(captured) = decomp::find_combinatorial_decomposition(
                    &self.brd,
                    &self.cons[color as usize],
                    &self.miai,
                    color,
                ) {
                    log::debug!(
                        "filling decomposition carrier for {color}: {captured}"
                    );
                    self.add_stones(color, captured);
                    found = true;
                    break;
                }
            }
            if !found {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::coords::{NORTH, SOUTH};

    fn p(name: &str) -> HexPoint {
        name.parse().unwrap()
    }

    fn engine() -> IceEngine {
        IceEngine::with_builtin_patterns()
    }

    #[test]
    fn compute_all_finds_edge_threats() {
        let g = Geometry::new(2, 1).unwrap();
        let ice = engine();
        let mut board = HexBoard::new(&g, &ice);
        board.settings_mut().use_ice = false;
        board.compute_all(Color::White, EndgameFillin::DoNotRemoveWinningFillin);

        // black has the immediate double threat, so white has no
        // defence at all
        assert!(board.winning_full(Color::Black).is_some());
        assert!(board.get_mustplay(Color::White).is_empty());
        assert!(!board.is_game_over());
    }

    #[test]
    fn mustplay_is_the_threat_intersection() {
        let g = Geometry::new(1, 1).unwrap();
        let ice = engine();
        let mut board = HexBoard::new(&g, &ice);
        board.settings_mut().use_ice = false;
        board.compute_all(Color::White, EndgameFillin::DoNotRemoveWinningFillin);
        assert_eq!(board.get_mustplay(Color::White), PointSet::singleton(p("a1")));
    }

    #[test]
    fn play_then_undo_is_bit_exact() {
        let g = Geometry::new(3, 3).unwrap();
        let ice = engine();
        let mut board = HexBoard::new(&g, &ice);
        board.compute_all(Color::Black, EndgameFillin::DoNotRemoveWinningFillin);

        let hash = board.hash();
        let stones_black = board.board().black();
        let stones_white = board.board().white();
        let played = board.board().played();
        let cons_black = board.cons(Color::Black).clone();
        let cons_white = board.cons(Color::White).clone();
        let dead = board.dead();

        board.play_move(Color::Black, p("b2"));
        assert!(board.hash() != hash);
        board.undo_move();

        assert_eq!(board.hash(), hash);
        assert_eq!(board.board().black(), stones_black);
        assert_eq!(board.board().white(), stones_white);
        assert_eq!(board.board().played(), played);
        assert_eq!(board.dead(), dead);
        assert!(*board.cons(Color::Black) == cons_black);
        assert!(*board.cons(Color::White) == cons_white);
    }

    #[test]
    fn several_moves_then_undo_all() {
        let g = Geometry::new(3, 3).unwrap();
        let ice = engine();
        let mut board = HexBoard::new(&g, &ice);
        board.compute_all(Color::Black, EndgameFillin::DoNotRemoveWinningFillin);

        let hash = board.hash();
        let cons_black = board.cons(Color::Black).clone();

        board.play_move(Color::Black, p("a2"));
        board.play_move(Color::White, p("b2"));
        board.play_move(Color::Black, p("c1"));
        board.undo_move();
        board.undo_move();
        board.undo_move();

        assert_eq!(board.hash(), hash);
        assert!(*board.cons(Color::Black) == cons_black);
    }

    #[test]
    fn winning_chain_ends_the_game() {
        let g = Geometry::new(3, 3).unwrap();
        let ice = engine();
        let mut board = HexBoard::new(&g, &ice);
        board.compute_all(Color::Black, EndgameFillin::DoNotRemoveWinningFillin);
        board.play_move(Color::Black, p("b1"));
        board.play_move(Color::White, p("a2"));
        board.play_move(Color::Black, p("b2"));
        board.play_move(Color::White, p("a3"));
        board.play_move(Color::Black, p("b3"));
        assert!(board.is_game_over());
        assert_eq!(board.winner(), Some(Color::Black));
        assert_eq!(board.groups().captain(NORTH), board.groups().captain(SOUTH));
    }
}
