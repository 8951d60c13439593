use std::cell::Cell;

use crate::hex::coords::HexPoint;
use crate::hex::sets::PointSet;
use crate::hex::vc::Vc;

/// Outcome of trying to add a connection to a list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddResult {
    /// The connection was a superset of an existing one.
    Failed,
    /// Added within the soft limit: the builder should process it.
    InsideSoftLimit,
    /// Added past the soft limit: kept only to support shrinking.
    OutsideSoftLimit,
}

/// The sorted list of connections between one endpoint pair and kind.
///
/// Connections are ordered by carrier size. The soft limit splits the
/// list into the prefix the builder combines further and a tail kept
/// because later shrinking may pull its members forward. Two
/// intersections are cached: over the soft prefix and over the whole
/// list; both are rebuilt on demand after any structural change.
#[derive(Clone, Debug)]
pub struct VcList {
    x: HexPoint,
    y: HexPoint,
    soft_limit: usize,
    vcs: Vec<Vc>,
    dirty: Cell<bool>,
    soft: Cell<PointSet>,
    hard: Cell<PointSet>,
}

impl VcList {
    pub fn new(x: HexPoint, y: HexPoint, soft_limit: usize) -> VcList {
        VcList {
            x: x.min(y),
            y: x.max(y),
            soft_limit,
            vcs: vec![],
            dirty: Cell::new(false),
            soft: Cell::new(PointSet::ALL),
            hard: Cell::new(PointSet::ALL),
        }
    }

    pub fn x(&self) -> HexPoint {
        self.x
    }

    pub fn y(&self) -> HexPoint {
        self.y
    }

    pub fn soft_limit(&self) -> usize {
        self.soft_limit
    }

    pub fn len(&self) -> usize {
        self.vcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vcs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Vc> {
        self.vcs.iter()
    }

    pub fn get(&self, i: usize) -> &Vc {
        &self.vcs[i]
    }

    pub fn smallest(&self) -> Option<&Vc> {
        self.vcs.first()
    }

    /// The soft-prefix members, cloned for iteration while the set is
    /// being mutated elsewhere.
    pub fn soft_prefix(&self) -> Vec<Vc> {
        self.vcs[..self.soft_limit.min(self.vcs.len())].to_vec()
    }

    /// Intersection of the carriers in the soft prefix. An empty list
    /// intersects to everything.
    pub fn soft_intersection(&self) -> PointSet {
        self.refresh();
        self.soft.get()
    }

    /// Intersection over the entire list.
    pub fn hard_intersection(&self) -> PointSet {
        self.refresh();
        self.hard.get()
    }

    /// Union of every carrier in the list.
    pub fn union(&self) -> PointSet {
        let mut u = PointSet::EMPTY;
        for vc in &self.vcs {
            u |= vc.carrier();
        }
        u
    }

    /// A small union still covering the list: scans smallest-first and
    /// takes only members that shrink the running intersection, until it
    /// is empty. Falls back to the full union if it never empties.
    pub fn greedy_union(&self) -> PointSet {
        let Some(first) = self.vcs.first() else {
            return PointSet::EMPTY;
        };
        let mut inter = first.carrier();
        let mut union = first.carrier();
        for vc in &self.vcs[1..] {
            if inter.is_empty() {
                return union;
            }
            let next = inter & vc.carrier();
            if next != inter {
                inter = next;
                union |= vc.carrier();
            }
        }
        if inter.is_empty() { union } else { self.union() }
    }

    /// Adds a connection, maintaining order and the superset policy:
    /// a superset of an existing member is rejected, existing supersets
    /// of the newcomer are removed.
    pub fn add(&mut self, vc: Vc, removed: Option<&mut Vec<Vc>>) -> AddResult {
        if self.is_superset_of_any(&vc.carrier()) {
            return AddResult::Failed;
        }
        self.remove_supersets_of_carrier(&vc.carrier(), removed);

        let pos = self.vcs.partition_point(|v| v <= &vc);
        self.vcs.insert(pos, vc);
        self.dirty.set(true);
        if pos < self.soft_limit {
            AddResult::InsideSoftLimit
        } else {
            AddResult::OutsideSoftLimit
        }
    }

    /// Inserts in order with no superset checking; used when replaying
    /// the change log backwards.
    pub fn simple_add(&mut self, vc: Vc) {
        let pos = self.vcs.partition_point(|v| v <= &vc);
        self.vcs.insert(pos, vc);
        self.dirty.set(true);
    }

    pub fn find(&self, vc: &Vc) -> Option<usize> {
        self.vcs.iter().position(|v| v == vc)
    }

    /// Removes the matching connection; true if one was found.
    pub fn remove(&mut self, vc: &Vc) -> bool {
        match self.find(vc) {
            Some(i) => {
                self.vcs.remove(i);
                self.dirty.set(true);
                true
            }
            None => false,
        }
    }

    /// True if some member's carrier is a subset of the given carrier.
    pub fn is_superset_of_any(&self, carrier: &PointSet) -> bool {
        self.vcs.iter().any(|v| v.carrier().is_subset_of(carrier))
    }

    /// True if the given carrier is a subset of some member's carrier.
    pub fn contains_superset_of(&self, carrier: &PointSet) -> bool {
        self.vcs.iter().any(|v| carrier.is_subset_of(&v.carrier()))
    }

    /// Removes every member whose carrier intersects the given cells,
    /// collecting them for shrinking.
    pub fn remove_all_containing(&mut self, cells: &PointSet, removed: &mut Vec<Vc>) -> usize {
        let before = self.vcs.len();
        self.vcs.retain(|v| {
            if v.carrier().intersects(cells) {
                removed.push(*v);
                false
            } else {
                true
            }
        });
        let count = before - self.vcs.len();
        if count > 0 {
            self.dirty.set(true);
        }
        count
    }

    /// Removes every member whose carrier is a superset of the given
    /// carrier.
    pub fn remove_supersets_of(&mut self, carrier: &PointSet, removed: &mut Vec<Vc>) -> usize {
        let before = self.vcs.len();
        self.remove_supersets_of_carrier(carrier, Some(removed));
        before - self.vcs.len()
    }

    fn remove_supersets_of_carrier(&mut self, carrier: &PointSet, removed: Option<&mut Vec<Vc>>) {
        let mut sink = removed;
        let before = self.vcs.len();
        self.vcs.retain(|v| {
            if carrier.is_subset_of(&v.carrier()) {
                if let Some(sink) = sink.as_mut() {
                    sink.push(*v);
                }
                false
            } else {
                true
            }
        });
        if self.vcs.len() != before {
            self.dirty.set(true);
        }
    }

    /// Flips the processed flag of the member at index i.
    pub(crate) fn set_processed(&mut self, i: usize, flag: bool) {
        self.vcs[i].set_processed(flag);
    }

    pub fn clear(&mut self) {
        self.vcs.clear();
        self.dirty.set(true);
    }

    fn refresh(&self) {
        if !self.dirty.get() {
            return;
        }
        let mut soft = PointSet::ALL;
        let mut hard = PointSet::ALL;
        for (i, vc) in self.vcs.iter().enumerate() {
            if i < self.soft_limit {
                soft &= vc.carrier();
            }
            hard &= vc.carrier();
        }
        self.soft.set(soft);
        self.hard.set(hard);
        self.dirty.set(false);
    }
}

impl PartialEq for VcList {
    fn eq(&self, other: &Self) -> bool {
        self.vcs == other.vcs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::vc::VcRule;

    fn p(name: &str) -> HexPoint {
        name.parse().unwrap()
    }

    fn full(carrier: &[&str]) -> Vc {
        let set: PointSet = carrier.iter().map(|n| p(n)).collect();
        Vc::full(p("a1"), p("e5"), set, VcRule::And)
    }

    #[test]
    fn supersets_are_rejected_subsets_displace() {
        let mut list = VcList::new(p("a1"), p("e5"), 8);
        assert_eq!(list.add(full(&["b2", "c2"]), None), AddResult::InsideSoftLimit);
        // a superset fails
        assert_eq!(list.add(full(&["b2", "c2", "d2"]), None), AddResult::Failed);
        // a subset throws the old one out
        let mut removed = vec![];
        assert_eq!(
            list.add(full(&["b2"]), Some(&mut removed)),
            AddResult::InsideSoftLimit
        );
        assert_eq!(list.len(), 1);
        assert_eq!(removed.len(), 1);
        assert_eq!(list.smallest().unwrap().carrier(), PointSet::singleton(p("b2")));
    }

    #[test]
    fn soft_limit_partitions() {
        let mut list = VcList::new(p("a1"), p("e5"), 2);
        assert_eq!(list.add(full(&["b1"]), None), AddResult::InsideSoftLimit);
        assert_eq!(list.add(full(&["b2"]), None), AddResult::InsideSoftLimit);
        assert_eq!(list.add(full(&["b3", "b4"]), None), AddResult::OutsideSoftLimit);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn intersections_track_changes() {
        let mut list = VcList::new(p("a1"), p("e5"), 8);
        assert_eq!(list.hard_intersection(), PointSet::ALL);
        list.add(full(&["b2", "c2"]), None);
        list.add(full(&["b2", "d2"]), None);
        assert_eq!(list.hard_intersection(), PointSet::singleton(p("b2")));
        assert_eq!(list.soft_intersection(), PointSet::singleton(p("b2")));
        list.add(full(&["c4"]), None);
        assert!(list.hard_intersection().is_empty());

        // the cache must equal a from-scratch recomputation at any point
        let mut expect = PointSet::ALL;
        for vc in list.iter() {
            expect &= vc.carrier();
        }
        assert_eq!(list.hard_intersection(), expect);
    }

    #[test]
    fn sorted_by_size() {
        let mut list = VcList::new(p("a1"), p("e5"), 8);
        list.add(full(&["b1", "b2", "b3"]), None);
        list.add(full(&["c1"]), None);
        list.add(full(&["d1", "d2"]), None);
        let sizes: Vec<usize> = list.iter().map(|v| v.count()).collect();
        assert_eq!(sizes, vec![1, 2, 3]);
    }

    #[test]
    fn greedy_union_is_small_but_covering() {
        let mut list = VcList::new(p("a1"), p("e5"), 8);
        list.add(full(&["b1", "b2"]), None);
        list.add(full(&["b1", "c2"]), None);
        list.add(full(&["d4", "d5", "c4"]), None);
        let gu = list.greedy_union();
        // two disjoint members already intersect to nothing
        assert!(gu.is_subset_of(&list.union()));
        let inter = list.iter().fold(PointSet::ALL, |a, v| a & v.carrier());
        assert!(inter.is_empty());
        assert!(gu.len() <= list.union().len());
    }
}
