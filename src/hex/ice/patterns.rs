use crate::hex::consts::Color;
use crate::hex::patterns::hashed::HashedPatternSet;
use crate::hex::patterns::pattern::{Pattern, PatternType};
use crate::utils::prelude::*;

/// The inferior-cell patterns, sorted by type and hashed per colour.
///
/// File conventions follow the original database: captured and
/// permanently-inferior patterns are encoded from White's point of view
/// and colour-flipped to obtain Black's, vulnerable and dominated
/// patterns are encoded for Black and flipped to obtain White's. Dead
/// patterns are colour-independent and stored once.
pub struct IcePatternSet {
    hashed_dead: HashedPatternSet,
    hashed_captured: [HashedPatternSet; 2],
    hashed_permanently_inferior: [HashedPatternSet; 2],
    hashed_vulnerable: [HashedPatternSet; 2],
    hashed_dominated: [HashedPatternSet; 2],
}

/// Patterns compiled into the engine; a pattern file extends these.
///
/// The set is intentionally small and each entry carries a local
/// soundness argument:
/// - `ring4`: four consecutive occupied ring cells of one colour leave
///   the remaining two adjacent to each other, so the centre can never
///   carry a useful connection for either player.
/// - `ring33`: two opposing three-chains fill the whole ring; every
///   entry/exit pair of either colour is already adjacent.
/// - `pair-capture`: two adjacent empties whose every other neighbour is
///   White are a White capture: answering one with the other leaves any
///   intruder surrounded by a single white wall.
/// - `chain-kill`: with White on three consecutive ring cells, White's
///   reply at the far empty neighbour completes a four-chain around a
///   Black probe, killing it.
const BUILTIN: &str = "
          [ring4/]
d:1,1,0,0,0;1,1,0,0,0;1,1,0,0,0;1,1,0,0,0;0,0,0,0,0;0,0,0,0,0

          [ring4w/]
d:1,0,1,0,0;1,0,1,0,0;1,0,1,0,0;1,0,1,0,0;0,0,0,0,0;0,0,0,0,0

          [ring33/]
d:1,1,0,0,0;1,1,0,0,0;1,1,0,0,0;1,0,1,0,0;1,0,1,0,0;1,0,1,0,0

          [pair-capture/]
c:7,0,6,1,0;1,0,1,0,0;1,0,1,0,0;1,0,1,0,0;1,0,1,0,0;5,0,5,0,0

          [chain-kill/]
v:1,0,0,1,0;1,0,1,0,0;1,0,1,0,0;0,0,0,0,0;0,0,0,0,0;1,0,1,0,0
";

impl IcePatternSet {
    /// Builds the compiled-in set.
    pub fn builtin() -> IcePatternSet {
        IcePatternSet::from_patterns(
            Pattern::load_from_str(BUILTIN).expect("builtin ice patterns must parse"),
        )
    }

    /// Builds the compiled-in set extended by a pattern file.
    pub fn with_file(path: &std::path::Path) -> Result<IcePatternSet> {
        let mut patterns =
            Pattern::load_from_str(BUILTIN).expect("builtin ice patterns must parse");
        patterns.extend(Pattern::load_from_file(path)?);
        Ok(IcePatternSet::from_patterns(patterns))
    }

    pub fn from_patterns(patterns: Vec<Pattern>) -> IcePatternSet {
        let mut dead = vec![];
        let mut captured: [Vec<Pattern>; 2] = Default::default();
        let mut permanently_inferior: [Vec<Pattern>; 2] = Default::default();
        let mut vulnerable: [Vec<Pattern>; 2] = Default::default();
        let mut dominated: [Vec<Pattern>; 2] = Default::default();

        for mut p in patterns {
            match p.kind() {
                PatternType::Dead => dead.push(p),
                PatternType::Captured => {
                    captured[Color::White as usize].push(p.clone());
                    p.flip_colors();
                    captured[Color::Black as usize].push(p);
                }
                PatternType::PermanentlyInferior => {
                    permanently_inferior[Color::White as usize].push(p.clone());
                    p.flip_colors();
                    permanently_inferior[Color::Black as usize].push(p);
                }
                PatternType::Vulnerable => {
                    vulnerable[Color::Black as usize].push(p.clone());
                    p.flip_colors();
                    vulnerable[Color::White as usize].push(p);
                }
                PatternType::Dominated => {
                    dominated[Color::Black as usize].push(p.clone());
                    p.flip_colors();
                    dominated[Color::White as usize].push(p);
                }
                other => {
                    log::warn!("ignoring pattern '{}' of type {other:?}", p.name());
                }
            }
        }

        IcePatternSet {
            hashed_dead: HashedPatternSet::new(dead),
            hashed_captured: captured.map(HashedPatternSet::new),
            hashed_permanently_inferior: permanently_inferior.map(HashedPatternSet::new),
            hashed_vulnerable: vulnerable.map(HashedPatternSet::new),
            hashed_dominated: dominated.map(HashedPatternSet::new),
        }
    }

    pub fn dead(&self) -> &HashedPatternSet {
        &self.hashed_dead
    }

    pub fn captured(&self, color: Color) -> &HashedPatternSet {
        &self.hashed_captured[color as usize]
    }

    pub fn permanently_inferior(&self, color: Color) -> &HashedPatternSet {
        &self.hashed_permanently_inferior[color as usize]
    }

    pub fn vulnerable(&self, color: Color) -> &HashedPatternSet {
        &self.hashed_vulnerable[color as usize]
    }

    pub fn dominated(&self, color: Color) -> &HashedPatternSet {
        &self.hashed_dominated[color as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_parses_and_sorts() {
        let set = IcePatternSet::builtin();
        assert_eq!(set.dead().patterns().len(), 3);
        assert_eq!(set.captured(Color::Black).patterns().len(), 1);
        assert_eq!(set.captured(Color::White).patterns().len(), 1);
        assert_eq!(set.vulnerable(Color::Black).patterns().len(), 1);
        assert_eq!(set.dominated(Color::Black).patterns().len(), 0);
    }
}
