use std::collections::HashMap;
use std::sync::OnceLock;

use crate::hex::consts::*;
use crate::hex::geometry::spiral_walk;
use crate::hex::patterns::godel::PatternRingGodel;
use crate::utils::prelude::*;

/// Feature indices within a slice.
pub const FEATURE_CELLS: usize = 0;
pub const FEATURE_BLACK: usize = 1;
pub const FEATURE_WHITE: usize = 2;
pub const FEATURE_MARKED1: usize = 3;
pub const FEATURE_MARKED2: usize = 4;
pub const NUM_FEATURES: usize = 5;

pub type Slice = [u32; NUM_FEATURES];

pub const NUM_SLICES: usize = NUM_DIRECTIONS;

/// What a pattern says about its centre cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatternType {
    /// Centre is dead.
    Dead,
    /// Centre plus the marked1 cells are captured.
    Captured,
    /// Centre is permanently inferior; marked1 holds its carrier.
    PermanentlyInferior,
    /// Centre is vulnerable; marked1 holds the killer, marked2 the
    /// carrier.
    Vulnerable,
    /// Centre is dominated; marked1 holds the killer.
    Dominated,
    /// Heuristic move suggestion.
    Mohex,
    Shift,
}

impl PatternType {
    pub fn from_char(c: char) -> Result<PatternType> {
        Ok(match c {
            'd' => PatternType::Dead,
            'c' => PatternType::Captured,
            'p' => PatternType::PermanentlyInferior,
            'v' => PatternType::Vulnerable,
            '!' => PatternType::Dominated,
            'm' => PatternType::Mohex,
            's' => PatternType::Shift,
            _ => return Err(anyhow!("unknown pattern type '{c}'")),
        })
    }

    pub fn to_char(&self) -> char {
        match self {
            PatternType::Dead => 'd',
            PatternType::Captured => 'c',
            PatternType::PermanentlyInferior => 'p',
            PatternType::Vulnerable => 'v',
            PatternType::Dominated => '!',
            PatternType::Mohex => 'm',
            PatternType::Shift => 's',
        }
    }
}

/// Spiral offsets shared by every godel table: the (dx, dy) of each
/// (slice, position), and the inverse lookup.
pub(crate) struct SpiralOffsets {
    pub offsets: [[(i32, i32); SLICE_CELLS]; NUM_SLICES],
    pub inverse: HashMap<(i32, i32), (usize, usize)>,
}

pub(crate) fn spiral_offsets() -> &'static SpiralOffsets {
    static OFFSETS: OnceLock<SpiralOffsets> = OnceLock::new();
    OFFSETS.get_or_init(|| {
        let mut offsets = [[(0, 0); SLICE_CELLS]; NUM_SLICES];
        let mut inverse = HashMap::new();
        for (s, row) in offsets.iter_mut().enumerate() {
            for (g, d) in spiral_walk(s).enumerate() {
                row[g] = d;
                inverse.insert(d, (s, g));
            }
        }
        SpiralOffsets { offsets, inverse }
    })
}

/// A pattern centred on a cell, encoded as six 60-degree slices.
///
/// Slices fan around the centre so that rotating the pattern by one
/// slice index rotates it 60 degrees on the board. Each slice is five
/// bitmasks over its spiral positions: cells used, black stones, white
/// stones and the two annotation sets.
#[derive(Clone, Debug)]
pub struct Pattern {
    kind: PatternType,
    name: String,
    slices: [Slice; NUM_SLICES],
    moves1: Vec<(usize, usize)>,
    moves2: Vec<(usize, usize)>,
    weight: i32,
    extension: usize,
    ring_godel: [PatternRingGodel; NUM_SLICES],
}

impl Pattern {
    /// Parses the encoded form
    /// `type:slice;slice;slice;slice;slice;slice;weight`, each slice
    /// being five comma separated integers.
    pub fn parse(code: &str) -> Result<Pattern> {
        let (kind_str, rest) = code
            .split_once(':')
            .ok_or_else(|| anyhow!("pattern '{code}' has no type"))?;
        let kind = PatternType::from_char(
            kind_str
                .chars()
                .next()
                .ok_or_else(|| anyhow!("empty pattern type"))?,
        )?;

        let fields: Vec<&str> = rest.split(';').collect();
        if fields.len() < NUM_SLICES {
            return Err(anyhow!("pattern '{code}' has fewer than six slices"));
        }

        let mut slices = [[0u32; NUM_FEATURES]; NUM_SLICES];
        for (s, field) in fields.iter().take(NUM_SLICES).enumerate() {
            let feats: Vec<&str> = field.split(',').collect();
            if feats.len() != NUM_FEATURES {
                return Err(anyhow!("slice '{field}' does not hold five features"));
            }
            for (f, feat) in feats.iter().enumerate() {
                slices[s][f] = feat.trim().parse().context("bad slice feature")?;
            }
            let cells = slices[s][FEATURE_CELLS];
            for f in 1..NUM_FEATURES {
                if slices[s][f] & !cells != 0 {
                    return Err(anyhow!("feature {f} of '{field}' outside its cells"));
                }
            }
            if slices[s][FEATURE_BLACK] & slices[s][FEATURE_WHITE] != 0 {
                return Err(anyhow!("slice '{field}' is both black and white"));
            }
        }

        let weight = fields
            .get(NUM_SLICES)
            .map(|w| w.trim())
            .filter(|w| !w.is_empty())
            .map(|w| w.parse::<i32>().context("bad pattern weight"))
            .transpose()?
            .unwrap_or(0);

        let mut p = Pattern {
            kind,
            name: String::new(),
            slices,
            moves1: vec![],
            moves2: vec![],
            weight,
            extension: 0,
            ring_godel: Default::default(),
        };
        p.recompute_derived();
        Ok(p)
    }

    pub fn serialize(&self) -> String {
        use itertools::Itertools;
        let body = self
            .slices
            .iter()
            .map(|s| s.iter().map(|f| f.to_string()).join(","))
            .join(";");
        format!("{}:{};{}", self.kind.to_char(), body, self.weight)
    }

    pub fn kind(&self) -> PatternType {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_owned();
    }

    pub fn weight(&self) -> i32 {
        self.weight
    }

    /// How far out the pattern reaches from its centre.
    pub fn extension(&self) -> usize {
        self.extension
    }

    pub fn slices(&self) -> &[Slice; NUM_SLICES] {
        &self.slices
    }

    /// The (slice, position) pairs of the marked1 cells.
    pub fn moves1(&self) -> &[(usize, usize)] {
        &self.moves1
    }

    pub fn moves2(&self) -> &[(usize, usize)] {
        &self.moves2
    }

    /// The ring requirement of this pattern rotated by angle slices.
    pub fn ring_godel(&self, angle: usize) -> &PatternRingGodel {
        &self.ring_godel[angle]
    }

    /// Swaps the black and white features of every slice.
    pub fn flip_colors(&mut self) {
        for s in self.slices.iter_mut() {
            s.swap(FEATURE_BLACK, FEATURE_WHITE);
        }
        self.recompute_derived();
    }

    /// Reflects the pattern about the acute diagonal. Positions do not
    /// stay within their slice, so each set bit is remapped through the
    /// spiral offsets.
    pub fn mirror(&mut self) {
        let table = spiral_offsets();
        let mut out = [[0u32; NUM_FEATURES]; NUM_SLICES];
        for s in 0..NUM_SLICES {
            for f in 0..NUM_FEATURES {
                let mut bits = self.slices[s][f];
                while bits != 0 {
                    let g = bits.trailing_zeros() as usize;
                    bits &= bits - 1;
                    let (dx, dy) = table.offsets[s][g];
                    let (s2, g2) = table.inverse[&(dy, dx)];
                    out[s2][f] |= 1 << g2;
                }
            }
        }
        self.slices = out;
        self.recompute_derived();
    }

    fn recompute_derived(&mut self) {
        self.moves1.clear();
        self.moves2.clear();
        self.extension = 0;
        for s in 0..NUM_SLICES {
            let mut bits = self.slices[s][FEATURE_CELLS];
            while bits != 0 {
                let g = bits.trailing_zeros() as usize;
                bits &= bits - 1;
                self.extension = self.extension.max(crate::hex::geometry::ring_of(g));
            }
            for g in 0..SLICE_CELLS {
                if self.slices[s][FEATURE_MARKED1] & (1 << g) != 0 {
                    self.moves1.push((s, g));
                }
                if self.slices[s][FEATURE_MARKED2] & (1 << g) != 0 {
                    self.moves2.push((s, g));
                }
            }
        }

        // One ring requirement per rotation: board slice i is checked
        // against pattern slice (i + angle) mod 6.
        for angle in 0..NUM_SLICES {
            let mut rg = PatternRingGodel::new();
            for i in 0..NUM_SLICES {
                let pat = &self.slices[(i + angle) % NUM_SLICES];
                if pat[FEATURE_CELLS] & 1 == 0 {
                    continue;
                }
                if pat[FEATURE_BLACK] & 1 != 0 {
                    rg.require_black(i);
                } else if pat[FEATURE_WHITE] & 1 != 0 {
                    rg.require_white(i);
                } else {
                    rg.require_empty(i);
                }
            }
            self.ring_godel[angle] = rg;
        }
    }

    /// Parses a pattern file: names sit between `[` and `/]` off the
    /// first column, encodings occupy the first column, and a second
    /// name before an encoding asks for the mirrored copy to be stored
    /// as well. Lines starting with `#` and indented text are comments.
    pub fn load_from_str(text: &str) -> Result<Vec<Pattern>> {
        let mut out = vec![];
        let mut names: Vec<String> = vec![];
        for line in text.lines() {
            let Some(first) = line.chars().next() else {
                names.clear();
                continue;
            };
            if first == '#' {
                continue;
            }
            if first == ' ' || first == '\t' {
                // comment area; may carry a pattern name
                if let Some(open) = line.find('[')
                    && let Some(close) = line[open..].find('/')
                {
                    names.push(line[open + 1..open + close].to_owned());
                }
                continue;
            }
            let mut pattern = Pattern::parse(line.trim_end())
                .with_context(|| format!("parsing pattern line '{line}'"))?;
            if let Some(name) = names.first() {
                pattern.set_name(name);
            }
            let mirror = names.len() >= 2;
            if mirror {
                let mut m = pattern.clone();
                m.mirror();
                m.set_name(&names[1]);
                out.push(pattern);
                out.push(m);
            } else {
                out.push(pattern);
            }
            names.clear();
        }
        Ok(out)
    }

    pub fn load_from_file(path: &std::path::Path) -> Result<Vec<Pattern>> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading pattern file {}", path.display()))?;
        let patterns = Pattern::load_from_str(&text)?;
        log::info!("read {} patterns from '{}'", patterns.len(), path.display());
        Ok(patterns)
    }
}

/// A pattern together with one of its six rotations.
#[derive(Clone, Copy, Debug)]
pub struct RotatedPattern {
    pub pattern: usize,
    pub angle: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    // the miai pattern used by decomposition detection
    const OPPMIAI: &str = "m:5,0,4,4,0;1,0,0,0,0;0,0,0,0,0;0,0,0,0,0;0,0,0,0,0;0,0,0,0,0;1";

    #[test]
    fn parse_roundtrip() {
        let p = Pattern::parse(OPPMIAI).unwrap();
        assert_eq!(p.kind(), PatternType::Mohex);
        assert_eq!(p.weight(), 1);
        assert_eq!(p.extension(), 2);
        assert_eq!(p.moves1(), &[(0, 2)]);
        assert_eq!(Pattern::parse(&p.serialize()).unwrap().serialize(), p.serialize());
    }

    #[test]
    fn rejects_malformed() {
        assert!(Pattern::parse("q:0,0,0,0,0").is_err());
        assert!(Pattern::parse("d:1,2,0,0,0;0,0,0,0,0;0,0,0,0,0;0,0,0,0,0;0,0,0,0,0;0,0,0,0,0").is_err());
    }

    #[test]
    fn mirror_involution() {
        let p = Pattern::parse(OPPMIAI).unwrap();
        let mut m = p.clone();
        m.mirror();
        m.mirror();
        assert_eq!(m.serialize(), p.serialize());
    }

    #[test]
    fn file_format_names_and_mirrors() {
        let text = "\
# a comment line
           [31/]
           [31m/]
!:1,0,0,1,0;1,1,0,0,0;1,1,0,0,0;1,1,0,0,0;0,0,0,0,0;0,0,0,0,0

           [solo/]
d:1,1,0,0,0;1,1,0,0,0;1,1,0,0,0;1,1,0,0,0;0,0,0,0,0;0,0,0,0,0
";
        let pats = Pattern::load_from_str(text).unwrap();
        assert_eq!(pats.len(), 3);
        assert_eq!(pats[0].name(), "31");
        assert_eq!(pats[1].name(), "31m");
        assert_eq!(pats[2].name(), "solo");
    }
}
