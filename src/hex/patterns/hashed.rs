use crate::hex::patterns::godel::{NUM_RING_GODELS, RingGodel};
use crate::hex::patterns::pattern::{NUM_SLICES, Pattern, RotatedPattern};

/// Patterns pre-hashed by ring godel.
///
/// For every possible godel code the set stores the rotated patterns
/// whose ring requirement is consistent with it. Looking up a cell's
/// godel therefore performs the ring check for every rotation of every
/// pattern at once; a pattern extending no further than the ring needs
/// no further checking at all.
pub struct HashedPatternSet {
    patterns: Vec<Pattern>,
    godel_lists: Vec<Vec<RotatedPattern>>,
}

impl HashedPatternSet {
    pub fn new(patterns: Vec<Pattern>) -> HashedPatternSet {
        let mut godel_lists = vec![vec![]; NUM_RING_GODELS];
        for (pi, pattern) in patterns.iter().enumerate() {
            for angle in 0..NUM_SLICES {
                for code in pattern.ring_godel(angle).consistent_codes() {
                    godel_lists[code].push(RotatedPattern {
                        pattern: pi,
                        angle,
                    });
                }
            }
        }
        HashedPatternSet {
            patterns,
            godel_lists,
        }
    }

    pub fn empty() -> HashedPatternSet {
        HashedPatternSet::new(vec![])
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn pattern(&self, rot: &RotatedPattern) -> &Pattern {
        &self.patterns[rot.pattern]
    }

    /// The rotated patterns whose ring requirement the godel satisfies.
    pub fn list_for_godel(&self, godel: RingGodel) -> &[RotatedPattern] {
        &self.godel_lists[godel.code()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::consts::Color;

    #[test]
    fn hashing_respects_ring() {
        // requires a black stone in the east slice, empties elsewhere
        let p = Pattern::parse(
            "d:1,1,0,0,0;1,0,0,0,0;1,0,0,0,0;1,0,0,0,0;1,0,0,0,0;1,0,0,0,0",
        )
        .unwrap();
        let set = HashedPatternSet::new(vec![p]);

        let empty = RingGodel::new();
        assert!(set.list_for_godel(empty).is_empty());

        let mut g = RingGodel::new();
        g.add_color_to_slice(0, Color::Black);
        let hits = set.list_for_godel(g);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].angle, 0);
    }
}
