use crate::hex::board::HexBoard;
use crate::hex::consts::*;
use crate::hex::coords::HexPoint;
use crate::hex::vc::VcKind;

/// Conductance between classes of group pairs.
#[derive(Clone, Copy, Debug)]
pub struct ConductanceValues {
    pub no_connection: f64,
    pub empty_to_empty: f64,
    pub color_to_empty: f64,
    pub color_to_color: f64,
}

impl Default for ConductanceValues {
    fn default() -> Self {
        ConductanceValues {
            no_connection: 0.0,
            empty_to_empty: 1.0,
            color_to_empty: 2.0,
            color_to_color: 5.0,
        }
    }
}

const RELAXATION_SWEEPS: usize = 60;

/// Electrical-resistance evaluation of a position.
///
/// Each colour sees the board as a conductance network between its two
/// edges: adjacent or connected group pairs conduct according to their
/// occupancy class. Potentials are relaxed iteratively instead of
/// solved exactly; the solver only consumes the scores as a move
/// ordering tiebreak.
pub struct Resistance {
    values: ConductanceValues,
    score: [f64; BITSET_SIZE],
    resist: [f64; 2],
}

impl Resistance {
    pub fn new() -> Resistance {
        Resistance {
            values: ConductanceValues::default(),
            score: [0.0; BITSET_SIZE],
            resist: [1.0; 2],
        }
    }

    /// Evaluates the given position for both colours.
    pub fn evaluate(&mut self, board: &HexBoard<'_>) {
        self.score = [0.0; BITSET_SIZE];
        for color in Color::both() {
            self.evaluate_color(board, color);
        }
    }

    /// log(white resistance / black resistance); positive favours
    /// Black.
    pub fn overall(&self) -> f64 {
        (self.resist[Color::White as usize] / self.resist[Color::Black as usize]).ln()
    }

    pub fn resist(&self, color: Color) -> f64 {
        self.resist[color as usize]
    }

    /// Current flowing through the cell's group; larger means more
    /// central to both players' networks.
    pub fn score(&self, board: &HexBoard<'_>, cell: HexPoint) -> f64 {
        self.score[board.groups().captain(cell).index()]
    }

    fn evaluate_color(&mut self, board: &HexBoard<'_>, color: Color) {
        let groups = board.groups();
        let captains = groups.groups(ColorFilter::ColorOrEmpty(color));
        let cons = board.cons(color);
        let values = self.values;

        let class = |a: HexPoint, b: HexPoint| -> f64 {
            let occ_a = board.board().color_of(a);
            let occ_b = board.board().color_of(b);
            let adjacent = groups.nbs_of(a, occ_b).contains(groups.captain(b))
                || cons.exists(groups, a, b, VcKind::Full);
            if !adjacent {
                return values.no_connection;
            }
            match (occ_a, occ_b) {
                (Some(_), Some(_)) => values.color_to_color,
                (None, None) => values.empty_to_empty,
                _ => values.color_to_empty,
            }
        };

        // conductance matrix over the participating captains
        let n = captains.len();
        let mut g = vec![vec![0.0f64; n]; n];
        for i in 0..n {
            for j in 0..i {
                let c = class(captains[i], captains[j]);
                g[i][j] = c;
                g[j][i] = c;
            }
        }

        let e1 = groups.captain(color.edge1());
        let e2 = groups.captain(color.edge2());
        let idx = |p: HexPoint| captains.iter().position(|&c| c == p);
        let (Some(i1), Some(i2)) = (idx(e1), idx(e2)) else {
            return;
        };

        // fix the edges at 1 and 0 and relax everything between
        let mut v = vec![0.5f64; n];
        v[i1] = 1.0;
        v[i2] = 0.0;
        for _ in 0..RELAXATION_SWEEPS {
            for i in 0..n {
                if i == i1 || i == i2 {
                    continue;
                }
                let mut num = 0.0;
                let mut den = 0.0;
                for j in 0..n {
                    if j != i {
                        num += g[i][j] * v[j];
                        den += g[i][j];
                    }
                }
                if den > 0.0 {
                    v[i] = num / den;
                }
            }
        }

        // total current out of the source approximates 1/resistance
        let mut current = 0.0;
        for j in 0..n {
            if j != i1 {
                current += g[i1][j] * (v[i1] - v[j]).max(0.0);
            }
        }
        self.resist[color as usize] = if current > 0.0 {
            1.0 / current
        } else {
            f64::INFINITY
        };

        // a cell's score is the current it carries
        for i in 0..n {
            let mut through = 0.0;
            for j in 0..n {
                through += g[i][j] * (v[i] - v[j]).abs();
            }
            self.score[captains[i].index()] += through / 2.0;
        }
    }
}

impl Default for Resistance {
    fn default() -> Self {
        Resistance::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::board::EndgameFillin;
    use crate::hex::geometry::Geometry;
    use crate::hex::ice::IceEngine;

    fn p(name: &str) -> HexPoint {
        name.parse().unwrap()
    }

    #[test]
    fn centre_carries_more_current() {
        let g = Geometry::new(5, 5).unwrap();
        let ice = IceEngine::with_builtin_patterns();
        let mut board = HexBoard::new(&g, &ice);
        board.compute_all(Color::Black, EndgameFillin::DoNotRemoveWinningFillin);

        let mut resistance = Resistance::new();
        resistance.evaluate(&board);
        assert!(resistance.score(&board, p("c3")) > resistance.score(&board, p("a1")));
        assert!(resistance.resist(Color::Black).is_finite());
    }

    #[test]
    fn empty_board_is_balanced() {
        let g = Geometry::new(5, 5).unwrap();
        let ice = IceEngine::with_builtin_patterns();
        let mut board = HexBoard::new(&g, &ice);
        board.compute_all(Color::Black, EndgameFillin::DoNotRemoveWinningFillin);

        let mut resistance = Resistance::new();
        resistance.evaluate(&board);
        assert!(resistance.overall().abs() < 0.5);
    }
}
