use std::hash::{DefaultHasher, Hasher};
use std::sync::OnceLock;

use crate::hex::consts::{BITSET_SIZE, Color};
use crate::hex::coords::HexPoint;
use crate::hex::sets::PointSet;

const NUM_KEYS: usize = BITSET_SIZE * 2;

static KEY_TABLE: OnceLock<[u64; NUM_KEYS]> = OnceLock::new();

/// The zobrist key for a played stone of the given colour.
pub(crate) fn key(color: Color, p: HexPoint) -> u64 {
    let table = KEY_TABLE.get_or_init(|| {
        let mut table = [0u64; NUM_KEYS];
        let mut hasher = DefaultHasher::new();
        for (i, entry) in table.iter_mut().enumerate() {
            hasher.write_usize(i);
            *entry = hasher.finish();
        }
        table
    });
    table[color as usize * BITSET_SIZE + p.index()]
}

/// The hash of a full position: the xor over all played black and white
/// stones. Unplayed fill-in never contributes.
pub(crate) fn hash_of(black_played: PointSet, white_played: PointSet) -> u64 {
    let mut h = 0;
    for p in black_played.iter() {
        h ^= key(Color::Black, p);
    }
    for p in white_played.iter() {
        h ^= key(Color::White, p);
    }
    h
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_distinct() {
        let a = key(Color::Black, HexPoint::from_index(7));
        let b = key(Color::White, HexPoint::from_index(7));
        let c = key(Color::Black, HexPoint::from_index(8));
        assert!(a != b && a != c && b != c);
    }
}
