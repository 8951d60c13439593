use regex::Regex;

use crate::hex::coords::HexPoint;
use crate::hex::geometry::Geometry;
use crate::utils::prelude::*;

/// The list of first moves the second player should answer with a swap,
/// per board size.
///
/// File lines read `WxH cell`; `#` starts a comment. On boards with
/// unequal dimensions the list is ignored: the second player always
/// swaps when the first player took the shorter distance.
pub struct SwapMoves {
    moves: HashMap<(usize, usize), HashSet<HexPoint>>,
}

impl SwapMoves {
    pub fn empty() -> SwapMoves {
        SwapMoves {
            moves: HashMap::new(),
        }
    }

    pub fn parse(text: &str) -> Result<SwapMoves> {
        let pattern = Regex::new("^(?<width>[0-9]+)x(?<height>[0-9]+)\\s+(?<cell>\\S+)")?;

        let mut moves: HashMap<(usize, usize), HashSet<HexPoint>> = HashMap::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some(matches) = pattern.captures(line) else {
                return Err(anyhow!("line {}: could not parse '{line}'", lineno + 1));
            };

            let key = (
                matches.name("width").unwrap().as_str().parse().context("bad width")?,
                matches.name("height").unwrap().as_str().parse().context("bad height")?,
            );
            let cell = matches.name("cell").unwrap().as_str();
            let point: HexPoint = cell
                .parse()
                .with_context(|| format!("line {}: bad cell '{cell}'", lineno + 1))?;
            moves.entry(key).or_default().insert(point);
        }
        Ok(SwapMoves { moves })
    }

    pub fn load(path: &std::path::Path) -> Result<SwapMoves> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading swap moves {}", path.display()))?;
        let swap = SwapMoves::parse(&text)?;
        log::info!(
            "loaded swap moves for {} board sizes from '{}'",
            swap.moves.len(),
            path.display()
        );
        Ok(swap)
    }

    /// Whether the second player should swap after the given first
    /// move.
    pub fn play_swap(&self, geom: &Geometry, first_move: HexPoint) -> bool {
        if geom.width() != geom.height() {
            // black crosses the height, white the width; swap whenever
            // white's crossing is the longer one
            return geom.width() > geom.height();
        }
        self.moves
            .get(&(geom.width(), geom.height()))
            .is_some_and(|cells| cells.contains(&first_move))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(name: &str) -> HexPoint {
        name.parse().unwrap()
    }

    #[test]
    fn listed_moves_swap() {
        let swap = SwapMoves::parse("# center is strong\n8x8 f3\n8x8 d4\n").unwrap();
        let g = Geometry::new(8, 8).unwrap();
        assert!(swap.play_swap(&g, p("f3")));
        assert!(swap.play_swap(&g, p("d4")));
        assert!(!swap.play_swap(&g, p("a1")));
    }

    #[test]
    fn malformed_lines_are_rejected() {
        assert!(SwapMoves::parse("8by8 f3\n").is_err());
        assert!(SwapMoves::parse("8x8\n").is_err());
        assert!(SwapMoves::parse("8x8 z9\n").is_err());
    }

    #[test]
    fn other_sizes_do_not_swap() {
        let swap = SwapMoves::parse("8x8 f3\n").unwrap();
        let g = Geometry::new(7, 7).unwrap();
        assert!(!swap.play_swap(&g, p("f3")));
    }

    #[test]
    fn unequal_boards_use_the_shorter_side() {
        let swap = SwapMoves::empty();
        // black crossed the short way on a wide board, so white swaps
        let wide = Geometry::new(9, 5).unwrap();
        assert!(swap.play_swap(&wide, p("a1")));
        let tall = Geometry::new(5, 9).unwrap();
        assert!(!swap.play_swap(&tall, p("a1")));
    }
}
