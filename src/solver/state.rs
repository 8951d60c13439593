use crate::hex::coords::{self, HexPoint};
use crate::hex::sets::PointSet;

/// Everything remembered about a solved position.
#[derive(Clone, Copy, Debug)]
pub struct SolvedState {
    /// Whether the player to move wins.
    pub win: bool,
    /// Interior stones on the board when this was solved.
    pub num_stones: usize,
    /// States in the subtree that proved it.
    pub num_states: u64,
    /// Moves until the winning connection is realised.
    pub num_moves: u16,
    /// The proof carrier plus the winner's stones.
    pub proof: PointSet,
    /// The winner's stones inside the proof.
    pub winners_stones: PointSet,
    /// Full position, for collision checks and transposition writes.
    pub black: PointSet,
    pub white: PointSet,
    /// Zobrist hash of the position.
    pub hash: u64,
    /// Move that proved the state, if any.
    pub best_move: HexPoint,
    /// Record was derived from a rotated sibling.
    pub is_transposition: bool,
    /// Record was derived from a mirrored sibling.
    pub is_mirror_transposition: bool,
}

impl SolvedState {
    pub fn new(win: bool, num_stones: usize, num_states: u64, num_moves: u16) -> SolvedState {
        SolvedState {
            win,
            num_stones,
            num_states,
            num_moves,
            proof: PointSet::EMPTY,
            winners_stones: PointSet::EMPTY,
            black: PointSet::EMPTY,
            white: PointSet::EMPTY,
            hash: 0,
            best_move: coords::INVALID,
            is_transposition: false,
            is_mirror_transposition: false,
        }
    }
}
