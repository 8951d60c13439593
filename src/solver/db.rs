use std::io::Write;
use std::path::{Path, PathBuf};

use crate::hex::sets::PointSet;
use crate::hex::stoneboard::{BoardId, StoneBoard};
use crate::solver::state::SolvedState;
use crate::utils::prelude::*;

const MAGIC: &[u8; 8] = b"hexisdb1";

/// One fixed-size stored record: winner and flag bits, moves to
/// connection, the proof, the played stones, and the hash.
#[derive(Clone, Copy, Debug)]
struct Record {
    win: bool,
    is_transposition: bool,
    is_mirror_transposition: bool,
    num_moves: u16,
    proof: PointSet,
    black: PointSet,
    white: PointSet,
    hash: u64,
}

const RECORD_BYTES: usize = 1 + 2 + 16 + 16 + 16 + 8;

impl Record {
    fn encode(&self, out: &mut Vec<u8>) {
        let flags = (self.win as u8)
            | ((self.is_transposition as u8) << 1)
            | ((self.is_mirror_transposition as u8) << 2);
        out.push(flags);
        out.extend_from_slice(&self.num_moves.to_le_bytes());
        out.extend_from_slice(&self.proof.bits().to_le_bytes());
        out.extend_from_slice(&self.black.bits().to_le_bytes());
        out.extend_from_slice(&self.white.bits().to_le_bytes());
        out.extend_from_slice(&self.hash.to_le_bytes());
    }

    fn decode(buf: &[u8]) -> Result<Record> {
        if buf.len() < RECORD_BYTES {
            return Err(anyhow!("truncated record"));
        }
        let flags = buf[0];
        let take = |lo: usize, n: usize| -> &[u8] { &buf[lo..lo + n] };
        Ok(Record {
            win: flags & 1 != 0,
            is_transposition: flags & 2 != 0,
            is_mirror_transposition: flags & 4 != 0,
            num_moves: u16::from_le_bytes(take(1, 2).try_into().unwrap()),
            proof: PointSet::from_bits(u128::from_le_bytes(take(3, 16).try_into().unwrap())),
            black: PointSet::from_bits(u128::from_le_bytes(take(19, 16).try_into().unwrap())),
            white: PointSet::from_bits(u128::from_le_bytes(take(35, 16).try_into().unwrap())),
            hash: u64::from_le_bytes(take(51, 8).try_into().unwrap()),
        })
    }
}

/// Counters over one database session.
#[derive(Clone, Copy, Debug, Default)]
pub struct DbStats {
    pub gets: u64,
    pub hits: u64,
    pub puts: u64,
    pub writes: u64,
}

/// Disk-backed store of solved positions keyed by packed board id.
///
/// The whole store is loaded at open and rewritten by flush; records
/// are small and fixed-size, so even deep opening databases stay modest.
/// A record is only overwritten by one proving an equal or shorter win.
/// Writes happen while the number of played stones is at most
/// max_stones; beyond that the solver falls back to its transposition
/// table.
pub struct SolverDb {
    path: PathBuf,
    width: usize,
    height: usize,
    max_stones: usize,
    map: HashMap<BoardId, Record>,
    stats: DbStats,
    dirty: bool,
}

impl SolverDb {
    pub fn open(path: &Path, width: usize, height: usize, max_stones: usize) -> Result<SolverDb> {
        let mut db = SolverDb {
            path: path.to_owned(),
            width,
            height,
            max_stones,
            map: HashMap::new(),
            stats: DbStats::default(),
            dirty: false,
        };
        match std::fs::read(path) {
            Ok(bytes) => db.load(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("creating solver db '{}'", path.display());
            }
            Err(e) => return Err(e).context("opening solver db"),
        }
        Ok(db)
    }

    pub fn max_stones(&self) -> usize {
        self.max_stones
    }

    pub fn stats(&self) -> DbStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    fn id_bytes(&self) -> usize {
        (self.width * self.height).div_ceil(4)
    }

    fn load(&mut self, bytes: &[u8]) -> Result<()> {
        let header = 8 + 3;
        if bytes.len() < header || &bytes[..8] != MAGIC {
            return Err(anyhow!("'{}' is not a solver db", self.path.display()));
        }
        let (w, h, m) = (bytes[8] as usize, bytes[9] as usize, bytes[10] as usize);
        if w != self.width || h != self.height {
            return Err(anyhow!(
                "solver db is for {w}x{h}, wanted {}x{}",
                self.width,
                self.height
            ));
        }
        self.max_stones = m;

        let id_bytes = self.id_bytes();
        let entry = id_bytes + RECORD_BYTES;
        let mut at = header;
        while at + entry <= bytes.len() {
            let id = bytes[at..at + id_bytes].to_vec();
            let record = Record::decode(&bytes[at + id_bytes..at + entry])?;
            self.map.insert(id, record);
            at += entry;
        }
        log::info!(
            "loaded {} solved positions from '{}'",
            self.map.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Writes the store back to disk if anything changed.
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let mut out = Vec::with_capacity(11 + self.map.len() * (self.id_bytes() + RECORD_BYTES));
        out.extend_from_slice(MAGIC);
        out.push(self.width as u8);
        out.push(self.height as u8);
        out.push(self.max_stones as u8);
        for (id, record) in &self.map {
            out.extend_from_slice(id);
            record.encode(&mut out);
        }
        let mut file = std::fs::File::create(&self.path)
            .with_context(|| format!("writing solver db '{}'", self.path.display()))?;
        file.write_all(&out)?;
        self.dirty = false;
        Ok(())
    }

    /// Looks up the position of the given board.
    pub fn get(&mut self, brd: &StoneBoard<'_>) -> Option<SolvedState> {
        self.stats.gets += 1;
        let record = *self.map.get(&brd.board_id())?;
        self.stats.hits += 1;

        let mut state = SolvedState::new(
            record.win,
            brd.num_stones(),
            1,
            record.num_moves,
        );
        state.proof = record.proof;
        state.black = record.black;
        state.white = record.white;
        state.hash = record.hash;
        state.is_transposition = record.is_transposition;
        state.is_mirror_transposition = record.is_mirror_transposition;
        Some(state)
    }

    /// Stores a solved state under the board's id, and under its
    /// rotation (and mirrors, on square boards) flagged as
    /// transpositions. Returns how many records were written.
    pub fn put(&mut self, brd: &StoneBoard<'_>, state: &SolvedState) -> usize {
        self.stats.puts += 1;
        let geom = brd.geometry();

        let mut written = 0;
        let mut variants: Vec<(BoardId, Record)> = vec![];

        let base = Record {
            win: state.win,
            is_transposition: false,
            is_mirror_transposition: false,
            num_moves: state.num_moves,
            proof: state.proof,
            black: brd.black() & brd.played(),
            white: brd.white() & brd.played(),
            hash: state.hash,
        };
        variants.push((brd.board_id(), base));

        let mut rotated = brd.clone();
        rotated.rotate_board();
        variants.push((
            rotated.board_id(),
            Record {
                is_transposition: true,
                proof: geom.rotate_set(&state.proof),
                black: rotated.black() & rotated.played(),
                white: rotated.white() & rotated.played(),
                hash: rotated.hash(),
                ..base
            },
        ));

        if geom.width() == geom.height() {
            // the mirror image with colours swapped plays the same game
            // with the roles exchanged; the proof does not carry over,
            // readers fall back to the default proof
            for source in [brd, &rotated] {
                let cells = geom.cells();
                let mut mirrored = StoneBoard::new(geom);
                mirrored.start_new_game();
                for p in (source.white() & source.played() & cells).iter() {
                    mirrored.play_move(crate::hex::consts::Color::Black, geom.mirror(p));
                }
                for p in (source.black() & source.played() & cells).iter() {
                    mirrored.play_move(crate::hex::consts::Color::White, geom.mirror(p));
                }
                variants.push((
                    mirrored.board_id(),
                    Record {
                        is_transposition: true,
                        is_mirror_transposition: true,
                        proof: PointSet::EMPTY,
                        black: mirrored.black() & mirrored.played(),
                        white: mirrored.white() & mirrored.played(),
                        hash: mirrored.hash(),
                        ..base
                    },
                ));
            }
        }

        // a symmetric position can map onto itself; the first variant
        // (the original) wins
        let mut seen_ids = HashSet::new();
        for (id, record) in variants {
            if !seen_ids.insert(id.clone()) {
                continue;
            }
            let keep = match self.map.get(&id) {
                Some(existing) => record.num_moves <= existing.num_moves,
                None => true,
            };
            if keep {
                self.map.insert(id, record);
                self.stats.writes += 1;
                self.dirty = true;
                written += 1;
            }
        }
        written
    }
}

impl Drop for SolverDb {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            log::warn!("failed to flush solver db: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::consts::Color;
    use crate::hex::coords::HexPoint;
    use crate::hex::geometry::Geometry;

    fn p(name: &str) -> HexPoint {
        name.parse().unwrap()
    }

    fn temp_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("hexis-test-{name}-{}", std::process::id()));
        path
    }

    #[test]
    fn roundtrip_through_disk() {
        let path = temp_path("roundtrip");
        let _ = std::fs::remove_file(&path);
        let g = Geometry::new(3, 3).unwrap();
        let mut brd = StoneBoard::new(&g);
        brd.start_new_game();
        brd.play_move(Color::Black, p("a1"));

        {
            let mut db = SolverDb::open(&path, 3, 3, 5).unwrap();
            let mut state = SolvedState::new(true, 1, 42, 3);
            state.hash = brd.hash();
            state.proof = PointSet::singleton(p("b1"));
            assert!(db.put(&brd, &state) >= 2);
            db.flush().unwrap();
        }

        let mut db = SolverDb::open(&path, 3, 3, 5).unwrap();
        let got = db.get(&brd).unwrap();
        assert!(got.win);
        assert_eq!(got.num_moves, 3);
        assert_eq!(got.proof, PointSet::singleton(p("b1")));

        // the rotated sibling is present and flagged
        let mut rotated = brd.clone();
        rotated.rotate_board();
        let sibling = db.get(&rotated).unwrap();
        assert!(sibling.is_transposition);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn shorter_proofs_replace_longer() {
        let path = temp_path("replace");
        let _ = std::fs::remove_file(&path);
        let g = Geometry::new(3, 3).unwrap();
        let mut brd = StoneBoard::new(&g);
        brd.start_new_game();

        let mut db = SolverDb::open(&path, 3, 3, 5).unwrap();
        let mut long = SolvedState::new(true, 0, 1, 9);
        long.hash = brd.hash();
        db.put(&brd, &long);

        let mut worse = SolvedState::new(true, 0, 1, 11);
        worse.hash = brd.hash();
        db.put(&brd, &worse);
        assert_eq!(db.get(&brd).unwrap().num_moves, 9);

        let mut better = SolvedState::new(true, 0, 1, 5);
        better.hash = brd.hash();
        db.put(&brd, &better);
        assert_eq!(db.get(&brd).unwrap().num_moves, 5);

        let _ = std::fs::remove_file(&path);
    }
}
