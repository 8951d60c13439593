use crate::hex::consts::*;
use crate::hex::coords::HexPoint;
use crate::hex::groupboard::GroupBoard;
use crate::hex::sets::PointSet;
use crate::hex::vc::list::{AddResult, VcList};
use crate::hex::vc::{NUM_KINDS, Vc, VcKind};

/// One recorded mutation of a connection list. The stored connection's
/// endpoints identify the list it belongs to.
#[derive(Clone, Copy, Debug)]
pub enum ChangeEntry {
    /// Boundary between moves; revert stops here.
    Marker,
    Add(Vc),
    Remove(Vc),
    /// The processed flag of this connection was raised.
    Processed(Vc),
}

/// Default prefix sizes of the full and semi lists.
pub const DEFAULT_FULL_SOFT_LIMIT: usize = 25;
pub const DEFAULT_SEMI_SOFT_LIMIT: usize = 50;

/// All connections of one colour: a symmetric table of lists keyed by
/// (captain, captain, kind), paired with the change log that undoes any
/// sequence of mutations bit-exactly.
///
/// Lists between locations occupied by the opponent are implicitly
/// empty; `exists` and friends answer through the current group
/// captains.
#[derive(Clone)]
pub struct VcSet {
    color: Color,
    lists: Vec<VcList>,
    log: Vec<ChangeEntry>,
    logging: bool,
}

fn index(kind: VcKind, x: HexPoint, y: HexPoint) -> usize {
    let (a, b) = if x < y { (x, y) } else { (y, x) };
    (kind as usize) * BITSET_SIZE * BITSET_SIZE + a.index() * BITSET_SIZE + b.index()
}

impl VcSet {
    pub fn new(color: Color, full_soft_limit: usize, semi_soft_limit: usize) -> VcSet {
        let mut lists = Vec::with_capacity(NUM_KINDS * BITSET_SIZE * BITSET_SIZE);
        for kind in VcKind::both() {
            let soft = match kind {
                VcKind::Full => full_soft_limit,
                VcKind::Semi => semi_soft_limit,
            };
            for a in 0..BITSET_SIZE {
                for b in 0..BITSET_SIZE {
                    lists.push(VcList::new(
                        HexPoint::from_index(a.min(b)),
                        HexPoint::from_index(a.max(b)),
                        soft,
                    ));
                }
            }
        }
        VcSet {
            color,
            lists,
            log: vec![],
            logging: false,
        }
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn list(&self, kind: VcKind, x: HexPoint, y: HexPoint) -> &VcList {
        &self.lists[index(kind, x, y)]
    }

    fn list_mut(&mut self, kind: VcKind, x: HexPoint, y: HexPoint) -> &mut VcList {
        &mut self.lists[index(kind, x, y)]
    }

    // logging

    pub fn set_logging(&mut self, flag: bool) {
        self.logging = flag;
    }

    pub fn logging(&self) -> bool {
        self.logging
    }

    pub fn log_len(&self) -> usize {
        self.log.len()
    }

    /// Drops a marker separating one move's mutations from the next.
    pub fn mark_log(&mut self) {
        self.log.push(ChangeEntry::Marker);
    }

    fn log_push(&mut self, entry: ChangeEntry) {
        if self.logging {
            self.log.push(entry);
        }
    }

    /// Replays the log backwards to the previous marker, undoing every
    /// recorded mutation. Logging must be off.
    pub fn revert_to_marker(&mut self) {
        assert!(!self.logging, "reverting while logging is on");
        while let Some(entry) = self.log.pop() {
            match entry {
                ChangeEntry::Marker => break,
                ChangeEntry::Add(vc) => {
                    let removed = self.lists[index(vc.kind(), vc.x(), vc.y())].remove(&vc);
                    assert!(removed, "logged connection vanished: {vc}");
                }
                ChangeEntry::Remove(vc) => {
                    self.lists[index(vc.kind(), vc.x(), vc.y())].simple_add(vc);
                }
                ChangeEntry::Processed(vc) => {
                    let list = &mut self.lists[index(vc.kind(), vc.x(), vc.y())];
                    let i = list.find(&vc).expect("processed connection vanished");
                    assert!(list.get(i).processed());
                    list.set_processed(i, false);
                }
            }
        }
    }

    // mutation

    /// Adds a connection to its list, logging the insertion and any
    /// displaced supersets.
    pub fn add(&mut self, vc: Vc) -> AddResult {
        let logging = self.logging;
        let list = &mut self.lists[index(vc.kind(), vc.x(), vc.y())];
        let mut displaced = vec![];
        let result = list.add(vc, Some(&mut displaced));
        if result != AddResult::Failed && logging {
            for d in displaced {
                self.log.push(ChangeEntry::Remove(d));
            }
            self.log.push(ChangeEntry::Add(vc));
        }
        result
    }

    /// Removes every connection of the pair whose carrier meets the
    /// given cells; returns how many went.
    pub fn remove_all_containing(
        &mut self,
        kind: VcKind,
        x: HexPoint,
        y: HexPoint,
        cells: &PointSet,
        removed: &mut Vec<Vc>,
    ) -> usize {
        let start = removed.len();
        let count = self.lists[index(kind, x, y)].remove_all_containing(cells, removed);
        if self.logging {
            for i in start..removed.len() {
                self.log.push(ChangeEntry::Remove(removed[i]));
            }
        }
        count
    }

    /// Removes every connection of the pair whose carrier is a superset
    /// of the given carrier.
    pub fn remove_supersets_of(
        &mut self,
        kind: VcKind,
        x: HexPoint,
        y: HexPoint,
        carrier: &PointSet,
    ) -> usize {
        let mut removed = vec![];
        let count = self.lists[index(kind, x, y)].remove_supersets_of(carrier, &mut removed);
        if self.logging {
            for vc in removed {
                self.log.push(ChangeEntry::Remove(vc));
            }
        }
        count
    }

    /// Raises the processed flag of the i-th connection of the pair.
    pub fn set_processed(&mut self, kind: VcKind, x: HexPoint, y: HexPoint, i: usize) {
        let list = &mut self.lists[index(kind, x, y)];
        debug_assert!(!list.get(i).processed());
        list.set_processed(i, true);
        let vc = *list.get(i);
        self.log_push(ChangeEntry::Processed(vc));
    }

    /// Clears every list and the log.
    pub fn clear(&mut self) {
        for list in &mut self.lists {
            list.clear();
        }
        self.log.clear();
    }

    // queries through the group structure

    /// True if a connection of the kind exists between the two
    /// locations. Either location lying in an opponent group means no;
    /// locations already in one group are trivially fully connected.
    pub fn exists(&self, brd: &GroupBoard<'_>, x: HexPoint, y: HexPoint, kind: VcKind) -> bool {
        let other = -self.color;
        if brd.board().color_of(x) == Some(other) || brd.board().color_of(y) == Some(other) {
            return false;
        }
        if brd.captain(x) == brd.captain(y) {
            return kind == VcKind::Full;
        }
        !self
            .list(kind, brd.captain(x), brd.captain(y))
            .is_empty()
    }

    /// The smallest connection of the kind between the two locations.
    /// Locations sharing a group yield the empty full.
    pub fn smallest(
        &self,
        brd: &GroupBoard<'_>,
        x: HexPoint,
        y: HexPoint,
        kind: VcKind,
    ) -> Option<Vc> {
        if !self.exists(brd, x, y, kind) {
            return None;
        }
        if brd.captain(x) == brd.captain(y) {
            return Some(Vc::full(x, y, PointSet::EMPTY, crate::hex::vc::VcRule::Base));
        }
        self.list(kind, brd.captain(x), brd.captain(y))
            .smallest()
            .copied()
    }

    /// Every connection of the kind between the two locations.
    pub fn between(
        &self,
        brd: &GroupBoard<'_>,
        x: HexPoint,
        y: HexPoint,
        kind: VcKind,
    ) -> Vec<Vc> {
        let other = -self.color;
        if brd.board().color_of(x) == Some(other) || brd.board().color_of(y) == Some(other) {
            return vec![];
        }
        self.list(kind, brd.captain(x), brd.captain(y))
            .iter()
            .copied()
            .collect()
    }

    /// The locations connected to x by some connection of the kind.
    pub fn connected_to(&self, brd: &GroupBoard<'_>, x: HexPoint, kind: VcKind) -> PointSet {
        let mut out = PointSet::EMPTY;
        for &y in brd.geometry().locations() {
            if y != x && self.exists(brd, x, y, kind) {
                out |= brd.group_members(y);
            }
        }
        out
    }

    /// Total connection counts over the groups of the current position.
    pub fn size(&self, brd: &GroupBoard<'_>) -> (usize, usize) {
        let groups = brd.groups(ColorFilter::NotColor(-self.color));
        let mut fulls = 0;
        let mut semis = 0;
        for (i, &x) in groups.iter().enumerate() {
            for &y in &groups[..i] {
                fulls += self.list(VcKind::Full, x, y).len();
                semis += self.list(VcKind::Semi, x, y).len();
            }
        }
        (fulls, semis)
    }
}

/// Two sets are equal when every pair's lists hold the same
/// connections. Logs and logging state are ignored.
impl PartialEq for VcSet {
    fn eq(&self, other: &Self) -> bool {
        self.lists == other.lists
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::vc::VcRule;

    fn p(name: &str) -> HexPoint {
        name.parse().unwrap()
    }

    fn full(x: &str, y: &str, carrier: &[&str]) -> Vc {
        Vc::full(
            p(x),
            p(y),
            carrier.iter().map(|n| p(n)).collect(),
            VcRule::And,
        )
    }

    #[test]
    fn revert_restores_adds_and_removes() {
        let mut set = VcSet::new(Color::Black, 8, 16);
        set.set_logging(true);
        set.mark_log();

        set.add(full("a1", "e5", &["b2", "c2"]));
        // displaces the first
        set.add(full("a1", "e5", &["b2"]));
        let mut gone = vec![];
        set.remove_all_containing(
            VcKind::Full,
            p("a1"),
            p("e5"),
            &PointSet::singleton(p("b2")),
            &mut gone,
        );
        assert_eq!(gone.len(), 1);
        assert!(set.list(VcKind::Full, p("a1"), p("e5")).is_empty());

        set.set_logging(false);
        set.revert_to_marker();
        assert!(set.list(VcKind::Full, p("a1"), p("e5")).is_empty());
        assert_eq!(set.log_len(), 0);
    }

    #[test]
    fn revert_restores_processed_flags() {
        let mut set = VcSet::new(Color::Black, 8, 16);
        set.set_logging(true);
        set.mark_log();
        set.add(full("a1", "e5", &["c3"]));
        set.set_processed(VcKind::Full, p("a1"), p("e5"), 0);
        assert!(set.list(VcKind::Full, p("a1"), p("e5")).get(0).processed());

        set.mark_log();
        set.set_logging(false);
        set.revert_to_marker();
        // first marker scope: the add and the flag
        set.revert_to_marker();
        assert!(set.list(VcKind::Full, p("a1"), p("e5")).is_empty());
    }
}
