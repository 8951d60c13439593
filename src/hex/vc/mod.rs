pub mod builder;
pub mod list;
pub mod pattern;
pub mod set;

pub use builder::{VcBuilder, VcBuilderParam, VcBuilderStats};
pub use list::{AddResult, VcList};
pub use pattern::{VcPattern, VcPatternSet};
pub use set::{ChangeEntry, VcSet};

use crate::hex::coords::{self, HexPoint};
use crate::hex::sets::PointSet;

/// How a connection was produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VcRule {
    /// Empty connection between two adjacent locations.
    Base,
    /// Two connections with disjoint carriers sharing an endpoint.
    And,
    /// Two or more semi connections with an empty common intersection.
    Or,
    /// Built by the push rule.
    Push,
    /// The or over every semi in a list.
    All,
}

impl std::fmt::Display for VcRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            VcRule::Base => "base",
            VcRule::And => "and",
            VcRule::Or => "or",
            VcRule::Push => "push",
            VcRule::All => "all",
        })
    }
}

/// Full connections hold even when the opponent moves first; semi
/// connections additionally need their key to be played.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VcKind {
    Full = 0,
    Semi = 1,
}

pub const NUM_KINDS: usize = 2;

impl VcKind {
    pub fn both() -> [VcKind; NUM_KINDS] {
        [VcKind::Full, VcKind::Semi]
    }
}

impl std::fmt::Display for VcKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            VcKind::Full => "full",
            VcKind::Semi => "semi",
        })
    }
}

impl std::str::FromStr for VcKind {
    type Err = crate::utils::prelude::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" | "0" => Ok(VcKind::Full),
            "semi" | "1" => Ok(VcKind::Semi),
            _ => Err(anyhow::anyhow!("unknown connection kind {s}")),
        }
    }
}

/// Sentinel key marking a full connection.
pub const NO_KEY: HexPoint = coords::INVALID;

/// A virtual connection between two group captains.
///
/// The carrier is the set of empty cells the strategy needs; the stones
/// are cells that must already belong to the owner (used only by the
/// push rule). The key of a semi lies inside its carrier. The processed
/// flag records whether the builder has already combined this
/// connection with others; it is reverted through the change log like
/// any other mutation.
#[derive(Clone, Copy, Debug)]
pub struct Vc {
    x: HexPoint,
    y: HexPoint,
    key: HexPoint,
    carrier: PointSet,
    stones: PointSet,
    rule: VcRule,
    processed: bool,
    count: u8,
}

impl Vc {
    /// An empty full connection between two adjacent locations.
    pub fn base(x: HexPoint, y: HexPoint) -> Vc {
        Vc::full(x, y, PointSet::EMPTY, VcRule::Base)
    }

    pub fn full(x: HexPoint, y: HexPoint, carrier: PointSet, rule: VcRule) -> Vc {
        Vc::full_with_stones(x, y, carrier, PointSet::EMPTY, rule)
    }

    pub fn full_with_stones(
        x: HexPoint,
        y: HexPoint,
        carrier: PointSet,
        stones: PointSet,
        rule: VcRule,
    ) -> Vc {
        debug_assert!(!carrier.contains(x) && !carrier.contains(y));
        Vc {
            x: x.min(y),
            y: x.max(y),
            key: NO_KEY,
            carrier,
            stones,
            rule,
            processed: false,
            count: carrier.len() as u8,
        }
    }

    pub fn semi(
        x: HexPoint,
        y: HexPoint,
        key: HexPoint,
        carrier: PointSet,
        stones: PointSet,
        rule: VcRule,
    ) -> Vc {
        assert!(carrier.contains(key), "semi key {key} outside its carrier");
        debug_assert!(!carrier.contains(x) && !carrier.contains(y));
        Vc {
            x: x.min(y),
            y: x.max(y),
            key,
            carrier,
            stones,
            rule,
            processed: false,
            count: carrier.len() as u8,
        }
    }

    pub fn x(&self) -> HexPoint {
        self.x
    }

    pub fn y(&self) -> HexPoint {
        self.y
    }

    pub fn key(&self) -> HexPoint {
        self.key
    }

    pub fn carrier(&self) -> PointSet {
        self.carrier
    }

    pub fn stones(&self) -> PointSet {
        self.stones
    }

    pub fn rule(&self) -> VcRule {
        self.rule
    }

    pub fn kind(&self) -> VcKind {
        if self.key == NO_KEY {
            VcKind::Full
        } else {
            VcKind::Semi
        }
    }

    pub fn count(&self) -> usize {
        self.count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.carrier.is_empty()
    }

    pub fn processed(&self) -> bool {
        self.processed
    }

    /// Only the list owning this connection may flip this; every flip
    /// must be mirrored on the change log.
    pub(crate) fn set_processed(&mut self, flag: bool) {
        self.processed = flag;
    }

    /// Subset comparison is on carriers alone: supersets are never worth
    /// keeping, regardless of key.
    pub fn is_subset_of(&self, other: &Vc) -> bool {
        self.carrier.is_subset_of(&other.carrier)
    }

    /// A copy with new endpoints.
    pub fn translate(&self, x: HexPoint, y: HexPoint) -> Vc {
        let mut vc = *self;
        vc.x = x.min(y);
        vc.y = x.max(y);
        vc
    }

    // combination rules

    /// Ands two fulls sharing an occupied midpoint into a full.
    pub fn and_full(x: HexPoint, y: HexPoint, v1: &Vc, v2: &Vc, stones: PointSet) -> Vc {
        debug_assert!(!v1.carrier.intersects(&v2.carrier));
        Vc::full_with_stones(
            x,
            y,
            v1.carrier | v2.carrier,
            v1.stones | v2.stones | stones,
            VcRule::And,
        )
    }

    /// Ands two fulls sharing an empty midpoint into a semi keyed on it.
    pub fn and_semi(x: HexPoint, y: HexPoint, v1: &Vc, v2: &Vc, key: HexPoint) -> Vc {
        debug_assert!(!v1.carrier.intersects(&v2.carrier));
        Vc::semi(
            x,
            y,
            key,
            (v1.carrier | v2.carrier).with(key),
            v1.stones | v2.stones,
            VcRule::And,
        )
    }

    /// The full obtained when a semi's key was just played.
    pub fn upgrade_semi(v: &Vc, takeout: &PointSet, outx: HexPoint, outy: HexPoint) -> Vc {
        debug_assert!(v.key != NO_KEY);
        debug_assert!(takeout.contains(v.key));
        Vc::full_with_stones(
            outx,
            outy,
            v.carrier - *takeout,
            v.stones.with(v.key),
            VcRule::And,
        )
    }

    /// A full shrunk past newly played friendly stones.
    pub fn shrink_full(v: &Vc, takeout: &PointSet, outx: HexPoint, outy: HexPoint) -> Vc {
        debug_assert!(v.key == NO_KEY);
        debug_assert!(v.carrier.intersects(takeout));
        Vc::full_with_stones(outx, outy, v.carrier - *takeout, v.stones, v.rule)
    }

    /// A semi shrunk past newly played friendly stones; the key itself
    /// must not be among them.
    pub fn shrink_semi(v: &Vc, takeout: &PointSet, outx: HexPoint, outy: HexPoint) -> Vc {
        debug_assert!(v.key != NO_KEY);
        debug_assert!(!takeout.contains(v.key));
        debug_assert!(v.carrier.intersects(takeout));
        Vc::semi(outx, outy, v.key, v.carrier - *takeout, v.stones, v.rule)
    }
}

/// Equality ignores endpoints and bookkeeping: two connections are the
/// same if key, carrier and stones agree. Lists are already per
/// endpoint pair.
impl PartialEq for Vc {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.carrier == other.carrier && self.stones == other.stones
    }
}

impl Eq for Vc {}

/// Ordering is by carrier size, then key, then carrier bits.
impl Ord for Vc {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.count
            .cmp(&other.count)
            .then(self.key.cmp(&other.key))
            .then(self.carrier.cmp(&other.carrier))
    }
}

impl PartialOrd for Vc {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for Vc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} {} [{}] [{}]",
            self.x,
            self.y,
            self.kind(),
            self.rule,
            self.carrier,
            self.stones
        )?;
        if self.kind() == VcKind::Semi {
            write!(f, " {}", self.key)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(name: &str) -> HexPoint {
        name.parse().unwrap()
    }

    #[test]
    fn endpoints_are_ordered() {
        let vc = Vc::base(p("c3"), p("a1"));
        assert!(vc.x() < vc.y());
        assert_eq!(vc.kind(), VcKind::Full);
        assert!(vc.is_empty());
    }

    #[test]
    fn upgrade_consumes_the_key() {
        let carrier: PointSet = [p("b2"), p("c2")].iter().collect();
        let semi = Vc::semi(p("a1"), p("d2"), p("b2"), carrier, PointSet::EMPTY, VcRule::And);
        let takeout = PointSet::singleton(p("b2"));
        let full = Vc::upgrade_semi(&semi, &takeout, p("a1"), p("d2"));
        assert_eq!(full.kind(), VcKind::Full);
        assert!(!full.carrier().contains(p("b2")));
        assert!(full.stones().contains(p("b2")));
    }

    #[test]
    fn ordering_prefers_small_carriers() {
        let small = Vc::full(p("a1"), p("c3"), PointSet::singleton(p("b2")), VcRule::And);
        let big: PointSet = [p("b1"), p("b2"), p("b3")].iter().collect();
        let large = Vc::full(p("a1"), p("c3"), big, VcRule::Or);
        assert!(small < large);
    }
}
