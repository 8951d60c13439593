pub mod db;
pub mod resistance;
pub mod state;
pub mod tt;

pub use db::SolverDb;
pub use resistance::Resistance;
pub use state::SolvedState;
pub use tt::TransTable;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::hex::board::{EndgameFillin, HexBoard};
use crate::hex::consts::*;
use crate::hex::coords::{self, HexPoint};
use crate::hex::decomp;
use crate::hex::geometry::Geometry;
use crate::hex::ice::{self, IceEngine, InferiorCells};
use crate::hex::patterns::board::PatternBoard;
use crate::hex::sets::PointSet;
use crate::hex::stoneboard::StoneBoard;

/// Outcome of a solver run, from the mover's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolveResult {
    Win,
    Loss,
    /// A depth or time limit fired; the board should be discarded.
    Unknown,
}

impl std::fmt::Display for SolveResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SolveResult::Win => "win",
            SolveResult::Loss => "loss",
            SolveResult::Unknown => "unknown",
        })
    }
}

/// Search-tree counters for one branch.
#[derive(Clone, Copy, Debug, Default)]
pub struct BranchStats {
    pub total_states: u64,
    pub explored_states: u64,
    pub expanded_states: u64,
    pub minimal_explored: u64,
    pub decompositions: u64,
    pub decompositions_won: u64,
    pub moves_to_consider: u64,
    pub winning_expanded: u64,
    pub branches_to_win: u64,
    pub pruned: u64,
    pub shrunk: u64,
    pub cells_removed: u64,
}

impl std::ops::AddAssign for BranchStats {
    fn add_assign(&mut self, o: BranchStats) {
        self.total_states += o.total_states;
        self.explored_states += o.explored_states;
        self.expanded_states += o.expanded_states;
        self.minimal_explored += o.minimal_explored;
        self.decompositions += o.decompositions;
        self.decompositions_won += o.decompositions_won;
        self.moves_to_consider += o.moves_to_consider;
        self.winning_expanded += o.winning_expanded;
        self.branches_to_win += o.branches_to_win;
        self.pruned += o.pruned;
        self.shrunk += o.shrunk;
        self.cells_removed += o.cells_removed;
    }
}

/// A solved branch: the proof region, the principal variation, and the
/// distance to the winning connection.
#[derive(Clone, Debug, Default)]
pub struct Solution {
    pub proof: PointSet,
    pub pv: Vec<HexPoint>,
    pub moves_to_connection: i32,
    pub stats: BranchStats,
}

/// User-controllable solver settings.
#[derive(Clone, Debug)]
pub struct SolverParam {
    pub use_decompositions: bool,
    pub use_tt: bool,
    pub tt_bits: usize,
    pub shrink_proofs: bool,
    pub use_move_ordering: bool,
    /// Play every candidate and measure the opponent's mustplay; very
    /// expensive and very strong.
    pub order_with_mustplay: bool,
    pub order_with_resist: bool,
    pub order_from_center: bool,
    /// Re-solve the root even when a transposition knows the answer.
    pub solve_root_again: bool,
    pub depth_limit: Option<usize>,
    pub time_limit: Option<Duration>,
}

impl Default for SolverParam {
    fn default() -> Self {
        SolverParam {
            use_decompositions: true,
            use_tt: true,
            tt_bits: 18,
            shrink_proofs: true,
            use_move_ordering: true,
            order_with_mustplay: true,
            order_with_resist: true,
            order_from_center: true,
            solve_root_again: false,
            depth_limit: None,
            time_limit: None,
        }
    }
}

/// Mustplay-driven depth-first proof search.
///
/// Proves win or loss for the colour to move. The opponent's winning
/// semi carriers both bound the moves worth trying and accumulate into
/// the loss proof; child proofs prune sibling moves. Solved states are
/// kept in a transposition table and, for shallow positions, in a
/// persistent database.
pub struct Solver {
    param: SolverParam,
    tt: Option<TransTable>,
    db: Option<SolverDb>,
    resistance: Resistance,
    abort_requested: Arc<AtomicBool>,
    aborted: bool,
    start: Instant,
    played: u64,
}

impl Solver {
    pub fn new(param: SolverParam) -> Solver {
        Solver {
            param,
            tt: None,
            db: None,
            resistance: Resistance::new(),
            abort_requested: Arc::new(AtomicBool::new(false)),
            aborted: false,
            start: Instant::now(),
            played: 0,
        }
    }

    pub fn param(&self) -> &SolverParam {
        &self.param
    }

    pub fn param_mut(&mut self) -> &mut SolverParam {
        &mut self.param
    }

    /// Attach a database of solved positions; used for lookups and
    /// stores while stones-on-board stays within its limit.
    pub fn set_db(&mut self, db: Option<SolverDb>) {
        self.db = db;
    }

    pub fn db(&self) -> Option<&SolverDb> {
        self.db.as_ref()
    }

    pub fn clear_tt(&mut self) {
        if let Some(tt) = &mut self.tt {
            tt.clear();
        }
    }

    /// A handle that cancels the search from outside; the caller sees
    /// Unknown.
    pub fn abort_handle(&self) -> Arc<AtomicBool> {
        self.abort_requested.clone()
    }

    pub fn moves_played(&self) -> u64 {
        self.played
    }

    /// Solves the current position for the colour to move.
    pub fn solve(&mut self, board: &mut HexBoard<'_>, to_play: Color) -> (SolveResult, Solution) {
        self.aborted = false;
        self.abort_requested.store(false, Ordering::Relaxed);
        self.start = Instant::now();
        self.played = 0;

        if self.param.use_tt && self.tt.is_none() {
            self.tt = Some(TransTable::new(self.param.tt_bits));
        }

        // the search's own record of real moves: no fill-in, so the
        // database keys stay canonical
        let mut stoneboard = played_only(board.board());

        // connection settings the proofs depend on
        board.builder_param_mut().and_over_edge = false;
        board.builder_param_mut().max_ors = 3;

        board.compute_all(to_play, EndgameFillin::DoNotRemoveWinningFillin);

        let mut solution = Solution::default();
        let mut variation = vec![];
        let win = self.solve_state(board, &mut stoneboard, to_play, &mut variation, &mut solution);

        // the working proof includes played stones; callers only see
        // the empty-cell carrier
        solution.proof &= board.board().empty_set();

        if self.aborted {
            return (SolveResult::Unknown, solution);
        }
        log::info!(
            "solver: {} in {} moves, {} states, {} played",
            if win { "win" } else { "loss" },
            solution.moves_to_connection,
            solution.stats.explored_states,
            self.played
        );
        let result = if win { SolveResult::Win } else { SolveResult::Loss };
        (result, solution)
    }

    // recursion

    fn solve_state(
        &mut self,
        board: &mut HexBoard<'_>,
        sb: &mut StoneBoard<'_>,
        color: Color,
        variation: &mut Vec<HexPoint>,
        solution: &mut Solution,
    ) -> bool {
        if let Some(limit) = self.param.time_limit
            && self.start.elapsed() > limit
        {
            self.aborted = true;
            return false;
        }
        if let Some(limit) = self.param.depth_limit
            && variation.len() >= limit
        {
            self.aborted = true;
            return false;
        }
        if self.abort_requested.load(Ordering::Relaxed) {
            self.aborted = true;
            return false;
        }

        if let Some(state) = self.handle_leaf_node(board, sb, color, variation.is_empty()) {
            solution.stats.explored_states = 1;
            solution.stats.minimal_explored = 1;
            solution.stats.total_states += state.num_states;
            solution.pv.clear();
            solution.moves_to_connection = state.num_moves as i32;
            solution.proof = state.proof;
            return state.win;
        }

        let winning_state = match self
            .param
            .use_decompositions
            .then(|| board.splitting_decomposition(-color))
            .flatten()
        {
            Some(group) => self.solve_decomposition(board, sb, color, variation, solution, group),
            None => self.solve_interior_state(board, sb, color, variation, solution),
        };

        self.handle_proof(board, sb, color, variation, winning_state, solution);
        winning_state
    }

    fn solve_decomposition(
        &mut self,
        board: &mut HexBoard<'_>,
        sb: &mut StoneBoard<'_>,
        color: Color,
        variation: &mut Vec<HexPoint>,
        solution: &mut Solution,
        group: HexPoint,
    ) -> bool {
        solution.stats.decompositions += 1;
        let other = -color;
        log::debug!("decomposition for {other} through {group}");

        // the two independent sides the splitting group leaves behind
        let nbs = board.groups().compute_digraph(other);
        let stop = nbs[group.index()];
        let carriers = [
            decomp::bfs_over(&nbs, other.edge1(), stop),
            decomp::bfs_over(&nbs, other.edge2(), stop),
        ];
        assert!(
            !carriers[0].intersects(&carriers[1]),
            "decomposition sides overlap"
        );

        let mut sides: [Solution; 2] = [Solution::default(), Solution::default()];
        for s in 0..2 {
            // give the opponent the far side; only this side remains
            let far = carriers[s ^ 1] & board.geometry().cells();
            board.play_stones(other, far, color);

            let win = match self.handle_terminal_node(board, sb, color) {
                Some(state) => {
                    sides[s].stats.explored_states = 1;
                    sides[s].stats.minimal_explored = 1;
                    sides[s].stats.total_states = 1;
                    sides[s].proof = state.proof;
                    sides[s].moves_to_connection = state.num_moves as i32;
                    state.win
                }
                None => {
                    let mut sub = Solution::default();
                    let win = self.solve_interior_state(board, sb, color, variation, &mut sub);
                    sides[s] = sub;
                    win
                }
            };
            board.undo_move();

            if self.aborted {
                return false;
            }
            if win {
                log::debug!("won side {s} of the decomposition");
                solution.pv = sides[s].pv.clone();
                solution.proof = sides[s].proof;
                solution.moves_to_connection = sides[s].moves_to_connection;
                solution.stats += sides[s].stats;
                solution.stats.decompositions_won += 1;
                return true;
            }
        }

        // both sides lost: each side's proof restricted to its own
        // carrier, plus the opponent's stones
        solution.pv = sides[0].pv.clone();
        solution.pv.extend(sides[1].pv.iter().copied());
        solution.moves_to_connection =
            sides[0].moves_to_connection + sides[1].moves_to_connection;
        solution.proof = (sides[0].proof & carriers[0])
            | (sides[1].proof & carriers[1])
            | board.board().stones(other);
        solution.proof -= board.dead();
        solution.stats += sides[0].stats;
        solution.stats += sides[1].stats;
        false
    }

    fn solve_interior_state(
        &mut self,
        board: &mut HexBoard<'_>,
        sb: &mut StoneBoard<'_>,
        color: Color,
        variation: &mut Vec<HexPoint>,
        solution: &mut Solution,
    ) -> bool {
        // assume the opponent wins: the union of their winning semis is
        // the loss proof we accumulate into
        solution.proof = self.initial_proof(board, color);
        let mut mustplay = self.moves_to_consider(board, color, &mut solution.proof);

        log::debug!(
            "depth {}: mustplay [{}]",
            variation.len(),
            coords::point_list_string(mustplay.iter())
        );

        if mustplay.is_empty() {
            solution.stats.total_states = 1;
            solution.stats.explored_states = 1;
            solution.stats.minimal_explored = 1;
            solution.pv.clear();
            solution.moves_to_connection = 0;
            return false;
        }

        solution.stats.total_states = 1;
        solution.stats.explored_states = 1;
        solution.stats.minimal_explored = 1;
        solution.stats.expanded_states = 1;
        solution.stats.moves_to_consider = mustplay.len() as u64;

        solution.moves_to_connection = -1;
        let mut moves = vec![];
        let mut winning_state =
            self.order_moves(board, sb, color, &mut mustplay, solution, &mut moves);

        for (index, &(cell, _)) in moves.iter().enumerate() {
            if winning_state {
                break;
            }
            // refuted by the proof of an earlier sibling
            if !mustplay.contains(cell) {
                solution.stats.pruned += 1;
                continue;
            }

            let mut child = Solution::default();
            self.play_move(board, sb, color, cell);
            variation.push(cell);
            let win = !self.solve_state(board, sb, -color, variation, &mut child);
            variation.pop();
            self.undo_move(board, sb, cell);

            solution.stats += child.stats;
            if self.aborted {
                return false;
            }

            if win {
                winning_state = true;
                solution.proof = child.proof;
                solution.pv.clear();
                solution.pv.push(cell);
                solution.pv.extend(child.pv.iter().copied());
                solution.moves_to_connection = child.moves_to_connection + 1;
                solution.stats.minimal_explored = child.stats.minimal_explored + 1;
                solution.stats.winning_expanded += 1;
                solution.stats.branches_to_win += index as u64 + 1;
            } else {
                // the child's proof refutes every one of our moves
                // outside it
                mustplay &= child.proof;
                solution.proof |= child.proof;

                if child.moves_to_connection + 1 > solution.moves_to_connection {
                    solution.moves_to_connection = child.moves_to_connection + 1;
                    solution.pv.clear();
                    solution.pv.push(cell);
                    solution.pv.extend(child.pv.iter().copied());
                }
            }
        }

        assert!(
            solution.moves_to_connection != -1,
            "no child produced a connection length"
        );
        winning_state
    }

    /// Orders candidate moves, folding leaf hits into the results: a
    /// move leading to an immediate loss for the opponent aborts the
    /// ordering, one leading to a win is dropped and its proof prunes
    /// the mustplay.
    fn order_moves(
        &mut self,
        board: &mut HexBoard<'_>,
        sb: &mut StoneBoard<'_>,
        color: Color,
        mustplay: &mut PointSet,
        solution: &mut Solution,
        moves: &mut Vec<(HexPoint, f64)>,
    ) -> bool {
        moves.clear();
        let with_ordering = self.param.use_move_ordering;
        let with_mustplay = with_ordering && self.param.order_with_mustplay;
        let with_resist = with_ordering && self.param.order_with_resist;
        let with_center = with_ordering && self.param.order_from_center;

        if with_resist {
            self.resistance.evaluate(board);
        }

        let mut proof_intersection = PointSet::ALL;
        let mut proof_union = PointSet::EMPTY;
        let mut found_win = false;

        for cell in mustplay.iter().collect::<Vec<_>>() {
            if found_win {
                break;
            }
            let mut skip_this_move = false;
            let mut score = 0.0;
            let mut exact = false;
            let mut winning_semi_exists = false;
            let mut mustplay_size = 0.0;

            if with_mustplay {
                self.play_move(board, sb, color, cell);

                if let Some(state) = self.handle_leaf_node(board, sb, -color, false) {
                    exact = true;
                    solution.stats.explored_states += 1;
                    solution.stats.minimal_explored += 1;
                    solution.stats.total_states += state.num_states;

                    if !state.win {
                        // we just played the winning move
                        found_win = true;
                        moves.clear();
                        solution.stats.minimal_explored = 2;
                        solution.proof = state.proof;
                        solution.moves_to_connection = state.num_moves as i32 + 1;
                        solution.pv.clear();
                        solution.pv.push(cell);
                    } else {
                        skip_this_move = true;
                        if state.num_moves as i32 + 1 > solution.moves_to_connection {
                            solution.moves_to_connection = state.num_moves as i32 + 1;
                            solution.pv.clear();
                            solution.pv.push(cell);
                        }
                        proof_intersection &= state.proof;
                        proof_union |= state.proof;
                    }
                } else {
                    winning_semi_exists = board.winning_semi(color).is_some();
                    mustplay_size = board.get_mustplay(-color).len() as f64;
                }

                self.undo_move(board, sb, cell);
            }

            if self.aborted {
                return false;
            }

            if !exact {
                let fromcenter = if with_center {
                    distance_from_center(board.geometry(), cell) as f64
                } else {
                    0.0
                };
                let rscore = if with_resist {
                    self.resistance.score(board, cell).min(99.0)
                } else {
                    0.0
                };
                let tiebreaker = if with_resist { 100.0 - rscore } else { fromcenter };
                score = if winning_semi_exists {
                    1000.0 * mustplay_size + tiebreaker
                } else {
                    1000000.0 * tiebreaker
                };
            }

            if !skip_this_move && !found_win {
                moves.push((cell, score));
            }
        }

        moves.sort_by(|a, b| a.1.total_cmp(&b.1));
        if found_win {
            log::debug!("found winning move during ordering");
            assert!(moves.is_empty());
        } else {
            *mustplay &= proof_intersection;
            solution.proof |= proof_union;
        }
        found_win
    }

    // leaves

    fn handle_leaf_node(
        &mut self,
        board: &HexBoard<'_>,
        sb: &StoneBoard<'_>,
        color: Color,
        root_node: bool,
    ) -> Option<SolvedState> {
        if let Some(state) = self.handle_terminal_node(board, sb, color) {
            return Some(state);
        }
        if root_node && self.param.solve_root_again {
            return None;
        }
        self.check_transposition(board, sb, color)
    }

    fn handle_terminal_node(
        &self,
        board: &HexBoard<'_>,
        sb: &StoneBoard<'_>,
        color: Color,
    ) -> Option<SolvedState> {
        if board.is_game_over() {
            // fill-in can finish a game outright
            let winner = board.winner().unwrap();
            let mut state = SolvedState::new(winner == color, sb.num_stones(), 1, 0);
            state.proof = board.board().stones(winner) - board.dead();
            state.hash = board.hash();
            return Some(state);
        }
        if let Some(semi) = board.winning_semi(color) {
            let mut state = SolvedState::new(true, sb.num_stones(), 1, 0);
            state.proof = (semi.carrier() | board.board().stones(color)) - board.dead();
            state.hash = board.hash();
            return Some(state);
        }
        if let Some(full) = board.winning_full(-color) {
            let mut state = SolvedState::new(false, sb.num_stones(), 1, 0);
            state.proof = (full.carrier() | board.board().stones(-color)) - board.dead();
            state.hash = board.hash();
            return Some(state);
        }
        None
    }

    fn check_transposition(
        &mut self,
        board: &HexBoard<'_>,
        sb: &StoneBoard<'_>,
        color: Color,
    ) -> Option<SolvedState> {
        let in_db_range = self
            .db
            .as_ref()
            .is_some_and(|db| sb.num_stones() <= db.max_stones());

        let mut state = if in_db_range {
            self.db.as_mut().unwrap().get(sb)?
        } else {
            self.tt.as_mut()?.get(board.hash())?
        };

        // stored proofs are only valid for the exact solved position;
        // transpositions fall back to the widest sound proof
        let winner = if state.win { color } else { -color };
        state.proof = default_proof(board, winner);
        Some(state)
    }

    fn store_state(&mut self, sb: &StoneBoard<'_>, state: SolvedState) {
        let in_db_range = self
            .db
            .as_ref()
            .is_some_and(|db| sb.num_stones() <= db.max_stones());
        if in_db_range {
            self.db.as_mut().unwrap().put(sb, &state);
        } else if let Some(tt) = &mut self.tt {
            tt.put(state);
        }
    }

    // proofs

    fn initial_proof(&self, board: &HexBoard<'_>, color: Color) -> PointSet {
        let proof =
            (board.mustplay_carrier(color) | board.board().stones(-color)) - board.dead();
        assert!(
            !proof.intersects(&board.board().stones(color)),
            "initial proof hits the mover's stones"
        );
        proof
    }

    fn moves_to_consider(
        &self,
        board: &HexBoard<'_>,
        color: Color,
        proof: &mut PointSet,
    ) -> PointSet {
        let mustplay = board.get_mustplay(color);
        let inf = board.inferior_cells();
        let ret = mustplay - inf.dead() - inf.dominated() - inf.vulnerable();

        // each removed vulnerable cell's refutation must sit in the
        // proof: one killer and its carrier
        for p in (mustplay & inf.vulnerable()).iter() {
            if let Some(killer) = inf.killers(p).iter().next() {
                proof.insert(killer.killer);
                *proof |= killer.carrier;
            }
        }
        ret
    }

    fn handle_proof(
        &mut self,
        board: &HexBoard<'_>,
        sb: &StoneBoard<'_>,
        color: Color,
        variation: &[HexPoint],
        winning_state: bool,
        solution: &mut Solution,
    ) {
        if self.aborted {
            return;
        }
        let winner = if winning_state { color } else { -color };
        let loser = -winner;
        let geom = board.geometry();

        assert!(
            !board.board().stones(loser).intersects(&solution.proof),
            "losing stones hit the proof at {}",
            coords::point_list_string(variation.iter().copied())
        );
        assert!(
            !board.dead().intersects(&solution.proof),
            "dead cells hit the proof"
        );

        if self.param.shrink_proofs {
            let before = solution.proof.len();
            shrink_proof(&mut solution.proof, sb, loser, board.ice(), geom);

            let reach1 =
                decomp::reachable_on_carrier(geom, &solution.proof, winner.edge1());
            let reach2 =
                decomp::reachable_on_carrier(geom, &solution.proof, winner.edge2());
            solution.proof = reach1 & reach2;

            if solution.proof.len() < before {
                solution.stats.shrunk += 1;
                solution.stats.cells_removed += (before - solution.proof.len()) as u64;
            }
        }

        assert!(
            decomp::connected_on_carrier(geom, &solution.proof, winner.edge1(), winner.edge2()),
            "proof does not join the winner's edges"
        );

        let mut state = SolvedState::new(
            winning_state,
            sb.num_stones(),
            solution.stats.total_states,
            solution.moves_to_connection.max(0) as u16,
        );
        state.proof = solution.proof;
        state.winners_stones = sb.stones(winner) & solution.proof;
        state.black = sb.black() & sb.played();
        state.white = sb.white() & sb.played();
        state.hash = board.hash();
        state.best_move = solution.pv.first().copied().unwrap_or(coords::INVALID);
        self.store_state(sb, state);
    }

    // moves

    fn play_move(
        &mut self,
        board: &mut HexBoard<'_>,
        sb: &mut StoneBoard<'_>,
        color: Color,
        cell: HexPoint,
    ) {
        self.played += 1;
        sb.play_move(color, cell);
        board.play_move(color, cell);
    }

    fn undo_move(&mut self, board: &mut HexBoard<'_>, sb: &mut StoneBoard<'_>, cell: HexPoint) {
        sb.undo_move(cell);
        board.undo_move();
    }
}

/// The widest sound proof for the winner: their stones plus every empty
/// cell, less the dead.
fn default_proof(board: &HexBoard<'_>, winner: Color) -> PointSet {
    (board.board().stones(winner) | board.board().empty_set()) - board.dead()
}

/// A copy of the board holding only played stones.
fn played_only<'a>(board: &StoneBoard<'a>) -> StoneBoard<'a> {
    let mut sb = board.clone();
    sb.set_color_set(Color::Black, board.black() & board.played());
    sb.set_color_set(Color::White, board.white() & board.played());
    sb.set_played(board.played());
    sb
}

/// Distance from the centre, spiralling outward cleanly on boards with
/// even dimensions.
fn distance_from_center(geom: &Geometry, cell: HexPoint) -> usize {
    if geom.width() % 2 == 1 && geom.height() % 2 == 1 {
        return geom.distance(geom.center_point(), cell);
    }
    geom.distance(geom.center_point_right(), cell)
        + geom.distance(geom.center_point_left(), cell)
}

/// Gives the loser everything outside the proof, runs fill-in for the
/// loser, and removes the filled cells from the proof.
fn shrink_proof(
    proof: &mut PointSet,
    sb: &StoneBoard<'_>,
    loser: Color,
    ice: &IceEngine,
    geom: &Geometry,
) {
    let mut scratch = PatternBoard::new(geom);
    scratch.start_new_game();

    let outside = geom.cells() - *proof;
    scratch.add_fillin(loser, outside);

    let winner = -loser;
    scratch.add_fillin(
        winner,
        sb.stones(winner) & sb.played() & *proof & geom.cells(),
    );

    let mut inf = InferiorCells::new();
    ice.compute_fillin(loser, &mut scratch, &mut inf, ice::only(loser));
    assert!(
        inf.captured(winner).is_empty(),
        "shrinking captured cells for the winner"
    );

    let filled = inf.dead() | inf.captured(loser);
    *proof -= filled;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::coords::{NORTH, SOUTH};

    fn p(name: &str) -> HexPoint {
        name.parse().unwrap()
    }

    fn solve_fresh(width: usize, height: usize, to_play: Color) -> (SolveResult, Solution) {
        solve_fresh_with(width, height, to_play, true)
    }

    fn solve_fresh_with(
        width: usize,
        height: usize,
        to_play: Color,
        use_ice: bool,
    ) -> (SolveResult, Solution) {
        let geom = Geometry::new(width, height).unwrap();
        let ice = IceEngine::with_builtin_patterns();
        let mut board = HexBoard::new(&geom, &ice);
        board.settings_mut().use_ice = use_ice;
        let mut solver = Solver::new(SolverParam::default());
        solver.solve(&mut board, to_play)
    }

    #[test]
    fn single_cell_is_a_first_player_win() {
        let (result, solution) = solve_fresh(1, 1, Color::Black);
        assert_eq!(result, SolveResult::Win);
        assert!(solution.proof.contains(p("a1")));
    }

    #[test]
    fn empty_mustplay_is_an_immediate_loss() {
        // on 2x1 black threatens through both cells at once; white to
        // move has no defence. Fill-in would collapse the position on
        // its own; turn it off so the connection path is what answers.
        let (result, solution) = solve_fresh_with(2, 1, Color::White, false);
        assert_eq!(result, SolveResult::Loss);
        assert!(solution.proof.contains(p("a1")));
        assert!(solution.proof.contains(p("b1")));
    }

    #[test]
    fn first_player_wins_small_boards() {
        for size in [2, 3] {
            let (result, _) = solve_fresh(size, size, Color::Black);
            assert_eq!(result, SolveResult::Win, "{size}x{size} must be a win");
            let (result, _) = solve_fresh(size, size, Color::White);
            assert_eq!(result, SolveResult::Win, "{size}x{size} must be a win");
        }
    }

    #[test]
    fn proof_connects_the_winners_edges() {
        let geom = Geometry::new(3, 3).unwrap();
        let ice = IceEngine::with_builtin_patterns();
        let mut board = HexBoard::new(&geom, &ice);
        let mut solver = Solver::new(SolverParam::default());
        let (result, solution) = solver.solve(&mut board, Color::Black);
        assert_eq!(result, SolveResult::Win);
        let with_stones = solution.proof | board.board().stones(Color::Black);
        assert!(decomp::connected_on_carrier(&geom, &with_stones, NORTH, SOUTH));
    }

    #[test]
    fn depth_limit_returns_unknown() {
        let geom = Geometry::new(5, 5).unwrap();
        let ice = IceEngine::with_builtin_patterns();
        let mut board = HexBoard::new(&geom, &ice);
        let mut param = SolverParam::default();
        param.depth_limit = Some(1);
        param.order_with_mustplay = false;
        let mut solver = Solver::new(param);
        let (result, _) = solver.solve(&mut board, Color::Black);
        assert_eq!(result, SolveResult::Unknown);
    }
}
