use crate::solver::state::SolvedState;

/// Fixed-capacity transposition table, open addressed on the low bits
/// of the hash with last-writer-wins replacement.
///
/// The stored key is the full 64-bit hash and is verified on every
/// read, so a torn or stale slot reads as a miss rather than a wrong
/// answer.
pub struct TransTable {
    entries: Vec<Option<SolvedState>>,
    mask: usize,
    hits: u64,
    misses: u64,
    writes: u64,
}

impl TransTable {
    /// A table holding 2^bits entries.
    pub fn new(bits: usize) -> TransTable {
        let capacity = 1usize << bits;
        TransTable {
            entries: vec![None; capacity],
            mask: capacity - 1,
            hits: 0,
            misses: 0,
            writes: 0,
        }
    }

    pub fn get(&mut self, hash: u64) -> Option<SolvedState> {
        let slot = &self.entries[(hash as usize) & self.mask];
        match slot {
            Some(state) if state.hash == hash => {
                self.hits += 1;
                Some(*state)
            }
            _ => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn put(&mut self, state: SolvedState) {
        self.writes += 1;
        self.entries[(state.hash as usize) & self.mask] = Some(state);
    }

    pub fn clear(&mut self) {
        self.entries.iter_mut().for_each(|e| *e = None);
        self.hits = 0;
        self.misses = 0;
        self.writes = 0;
    }

    pub fn stats(&self) -> String {
        format!(
            "tt: {} hits, {} misses, {} writes",
            self.hits, self.misses, self.writes
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_on_read() {
        let mut tt = TransTable::new(4);
        let mut state = SolvedState::new(true, 3, 10, 2);
        state.hash = 0x12345;
        tt.put(state);

        assert!(tt.get(0x12345).is_some());
        // same slot, different hash: must read as a miss
        assert!(tt.get(0x12345 + (1 << 4)).is_none());
    }

    #[test]
    fn last_writer_wins() {
        let mut tt = TransTable::new(2);
        let mut a = SolvedState::new(true, 1, 1, 0);
        a.hash = 4;
        let mut b = SolvedState::new(false, 2, 1, 0);
        b.hash = 8;
        tt.put(a);
        tt.put(b);
        assert!(tt.get(4).is_none());
        let got = tt.get(8).unwrap();
        assert!(!got.win);
    }
}
