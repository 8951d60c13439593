/*
 *  The Hex engine core: board geometry, stone and group state, pattern
 *  matching, inferior-cell analysis and virtual connections.
 */

pub mod board;
pub mod consts;
pub mod coords;
pub mod decomp;
pub mod geometry;
pub mod groupboard;
pub mod ice;
pub mod patterns;
pub mod sets;
pub mod stoneboard;
pub mod swap;
pub mod vc;
pub(crate) mod zobrist;

pub mod prelude {
    pub(crate) use crate::utils::prelude::*;

    pub use super::{
        board::{EndgameFillin, HexBoard},
        consts::*,
        coords::{self, HexPoint},
        geometry::Geometry,
        groupboard::GroupBoard,
        ice::{IceEngine, IceParams, InferiorCells},
        patterns::{HashedPatternSet, Pattern, PatternBoard, PatternState},
        sets::PointSet,
        stoneboard::{BoardId, StoneBoard},
        swap::SwapMoves,
        vc::{Vc, VcBuilder, VcBuilderParam, VcKind, VcList, VcSet},
    };
}
