use crate::hex::consts::*;
use crate::hex::coords::HexPoint;
use crate::hex::sets::PointSet;
use crate::utils::prelude::*;

/// A response that kills a vulnerable cell: the killing move and the
/// cells that must stay empty for the kill to work.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct VulnerableKiller {
    pub killer: HexPoint,
    pub carrier: PointSet,
}

/// Classification of empty cells for one position.
///
/// Dead and captured cells feed fill-in; vulnerable and dominated cells
/// prune the solver's consider set. Domination arcs form a graph that
/// may contain cycles; `dominated()` condenses it by strongly connected
/// component and keeps one representative per sink component, so the
/// kept cells are never dominated away entirely.
#[derive(Clone, Debug, Default)]
pub struct InferiorCells {
    dead: PointSet,
    captured: [PointSet; 2],
    perm_inferior: [PointSet; 2],
    perm_inferior_carrier: [PointSet; 2],
    vulnerable: PointSet,
    killers: HashMap<HexPoint, BTreeSet<VulnerableKiller>>,
    /// arcs dominated -> killer
    dominated_arcs: HashMap<HexPoint, PointSet>,
}

impl InferiorCells {
    pub fn new() -> InferiorCells {
        InferiorCells::default()
    }

    pub fn clear(&mut self) {
        *self = InferiorCells::default();
    }

    // accessors

    pub fn dead(&self) -> PointSet {
        self.dead
    }

    pub fn captured(&self, color: Color) -> PointSet {
        self.captured[color as usize]
    }

    pub fn permanently_inferior(&self, color: Color) -> PointSet {
        self.perm_inferior[color as usize]
    }

    pub fn permanently_inferior_carrier(&self, color: Color) -> PointSet {
        self.perm_inferior_carrier[color as usize]
    }

    pub fn vulnerable(&self) -> PointSet {
        self.vulnerable
    }

    pub fn killers(&self, cell: HexPoint) -> &BTreeSet<VulnerableKiller> {
        static NONE: std::sync::OnceLock<BTreeSet<VulnerableKiller>> = std::sync::OnceLock::new();
        self.killers
            .get(&cell)
            .unwrap_or_else(|| NONE.get_or_init(BTreeSet::new))
    }

    /// Cells a colour may fill in as its own.
    pub fn fillin(&self, color: Color) -> PointSet {
        self.captured[color as usize] | self.perm_inferior[color as usize]
    }

    /// Everything classified inferior in some way.
    pub fn all(&self) -> PointSet {
        let mut out = self.dead | self.vulnerable | self.dominated();
        for c in Color::both() {
            out |= self.captured[c as usize] | self.perm_inferior[c as usize];
        }
        out
    }

    // mutation

    pub fn add_dead(&mut self, dead: PointSet) {
        self.dead |= dead;
        for p in dead.iter() {
            self.remove_vulnerable(p);
            self.dominated_arcs.remove(&p);
        }
    }

    pub fn add_captured(&mut self, color: Color, captured: PointSet) {
        self.captured[color as usize] |= captured;
        for p in captured.iter() {
            self.remove_vulnerable(p);
            self.dominated_arcs.remove(&p);
        }
    }

    pub fn add_permanently_inferior(&mut self, color: Color, cell: HexPoint, carrier: PointSet) {
        self.perm_inferior[color as usize].insert(cell);
        self.perm_inferior_carrier[color as usize] |= carrier;
    }

    pub fn add_vulnerable(&mut self, cell: HexPoint, killer: VulnerableKiller) {
        self.vulnerable.insert(cell);
        self.killers.entry(cell).or_default().insert(killer);
    }

    pub fn add_dominated(&mut self, cell: HexPoint, killer: HexPoint) {
        self.dominated_arcs.entry(cell).or_default().insert(killer);
    }

    fn remove_vulnerable(&mut self, cell: HexPoint) {
        self.vulnerable.remove(cell);
        self.killers.remove(&cell);
    }

    /// Folds another classification into this one. Carriers of
    /// permanently inferior cells may not contain dead cells; such cells
    /// are re-filed as captured.
    pub fn union_with(&mut self, other: &InferiorCells) {
        self.add_dead(other.dead);
        for c in Color::both() {
            let carrier = other.perm_inferior_carrier[c as usize];
            self.add_captured(c, other.captured[c as usize] | (carrier & self.dead));
            self.perm_inferior[c as usize] |= other.perm_inferior[c as usize];
            self.perm_inferior_carrier[c as usize] |= carrier - self.dead;
        }
        for (cell, killers) in &other.killers {
            for k in killers {
                self.add_vulnerable(*cell, *k);
            }
        }
        for (cell, killers) in &other.dominated_arcs {
            *self.dominated_arcs.entry(*cell).or_default() |= *killers;
        }
    }

    /// The dominated cells: every vertex of the (vulnerability-pruned)
    /// domination graph except one representative per sink strongly
    /// connected component.
    pub fn dominated(&self) -> PointSet {
        let (sccs, sinks) = self.condense();
        let mut dominated = PointSet::EMPTY;
        for (i, scc) in sccs.iter().enumerate() {
            let mut members = scc.iter();
            if sinks.contains(&i) {
                // the representative survives
                members.next();
            }
            for &m in members {
                dominated.insert(m);
            }
        }
        dominated
    }

    /// A surviving cell at least as good as the given dominated cell:
    /// follows arcs through the condensation until a kept cell appears.
    pub fn killer_of_dominated(&self, cell: HexPoint) -> Option<HexPoint> {
        let dominated = self.dominated();
        if !dominated.contains(cell) {
            return None;
        }
        let mut seen = PointSet::singleton(cell);
        let mut queue = vec![cell];
        while let Some(v) = queue.pop() {
            for k in self.pruned_arcs(v).iter() {
                if !dominated.contains(k) {
                    return Some(k);
                }
                if !seen.contains(k) {
                    seen.insert(k);
                    queue.push(k);
                }
            }
        }
        None
    }

    /// Domination arcs with vulnerable endpoints dropped: a killer that
    /// can itself be killed proves nothing.
    fn pruned_arcs(&self, cell: HexPoint) -> PointSet {
        if self.vulnerable.contains(cell) {
            return PointSet::EMPTY;
        }
        match self.dominated_arcs.get(&cell) {
            Some(ks) => *ks - self.vulnerable,
            None => PointSet::EMPTY,
        }
    }

    /// Iterative Tarjan over the pruned graph. Returns the components
    /// (members sorted) and the indices of components with no outgoing
    /// arcs.
    fn condense(&self) -> (Vec<Vec<HexPoint>>, HashSet<usize>) {
        let mut vertex_set: PointSet = self
            .dominated_arcs
            .keys()
            .copied()
            .filter(|p| !self.vulnerable.contains(*p))
            .collect();
        // targets that never dominate anything are vertices too
        for v in vertex_set.iter().collect::<Vec<_>>() {
            vertex_set |= self.pruned_arcs(v);
        }
        let vertices: Vec<HexPoint> = vertex_set.iter().collect();

        let mut index = HashMap::new();
        let mut lowlink = HashMap::new();
        let mut on_stack = PointSet::EMPTY;
        let mut stack: Vec<HexPoint> = vec![];
        let mut next_index = 0usize;
        let mut sccs: Vec<Vec<HexPoint>> = vec![];
        let mut scc_of: HashMap<HexPoint, usize> = HashMap::new();

        enum Frame {
            Visit(HexPoint),
            PostEdge(HexPoint, HexPoint),
            Close(HexPoint),
        }

        for &root in &vertices {
            if index.contains_key(&root) {
                continue;
            }
            let mut work = vec![Frame::Visit(root)];
            while let Some(frame) = work.pop() {
                match frame {
                    Frame::Visit(v) => {
                        if index.contains_key(&v) {
                            continue;
                        }
                        index.insert(v, next_index);
                        lowlink.insert(v, next_index);
                        next_index += 1;
                        stack.push(v);
                        on_stack.insert(v);
                        work.push(Frame::Close(v));
                        for t in self.pruned_arcs(v).iter() {
                            work.push(Frame::PostEdge(v, t));
                            work.push(Frame::Visit(t));
                        }
                    }
                    Frame::PostEdge(v, t) => {
                        // tree and back edges lower v; edges into
                        // finished components do not
                        if on_stack.contains(t) {
                            let lt = lowlink.get(&t).copied().unwrap_or(usize::MAX);
                            let lv = lowlink[&v];
                            lowlink.insert(v, lv.min(lt));
                        }
                    }
                    Frame::Close(v) => {
                        if lowlink[&v] == index[&v] {
                            let mut comp = vec![];
                            while let Some(w) = stack.pop() {
                                on_stack.remove(w);
                                comp.push(w);
                                if w == v {
                                    break;
                                }
                            }
                            comp.sort();
                            for &m in &comp {
                                scc_of.insert(m, sccs.len());
                            }
                            sccs.push(comp);
                        }
                    }
                }
            }
        }

        let mut sinks: HashSet<usize> = (0..sccs.len()).collect();
        for (&v, &ci) in &scc_of {
            for t in self.pruned_arcs(v).iter() {
                if scc_of.get(&t) != Some(&ci) {
                    sinks.remove(&ci);
                }
            }
        }
        (sccs, sinks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(name: &str) -> HexPoint {
        name.parse().unwrap()
    }

    #[test]
    fn chains_keep_their_sink() {
        //   a1 -> b1 <- c1
        let mut inf = InferiorCells::new();
        inf.add_dominated(p("a1"), p("b1"));
        inf.add_dominated(p("c1"), p("b1"));
        let dom = inf.dominated();
        assert_eq!(dom.len(), 2);
        assert!(dom.contains(p("a1")));
        assert!(dom.contains(p("c1")));
        assert!(!dom.contains(p("b1")));

        //   a1 <- b1 -> c1
        let mut inf = InferiorCells::new();
        inf.add_dominated(p("b1"), p("a1"));
        inf.add_dominated(p("b1"), p("c1"));
        let dom = inf.dominated();
        assert_eq!(dom.len(), 1);
        assert!(dom.contains(p("b1")));
    }

    #[test]
    fn vulnerable_killers_invalidate_arcs() {
        //   a1 -> b1 -> c1        (a1, b1 dominated)
        //   a2 -> b2 -> c2 -> c3  (c2 vulnerable: only a2 dominated)
        let mut inf = InferiorCells::new();
        inf.add_dominated(p("a1"), p("b1"));
        inf.add_dominated(p("b1"), p("c1"));
        inf.add_dominated(p("a2"), p("b2"));
        inf.add_dominated(p("b2"), p("c2"));
        inf.add_vulnerable(
            p("c2"),
            VulnerableKiller {
                killer: p("c3"),
                carrier: PointSet::EMPTY,
            },
        );

        let dom = inf.dominated();
        assert!(dom.contains(p("a1")));
        assert!(dom.contains(p("b1")));
        assert!(!dom.contains(p("c1")));
        assert!(dom.contains(p("a2")));
        assert!(!dom.contains(p("b2")));
        assert!(!dom.contains(p("c2")));
    }

    #[test]
    fn cycles_keep_one_representative() {
        //   a1 <-> b1
        let mut inf = InferiorCells::new();
        inf.add_dominated(p("a1"), p("b1"));
        inf.add_dominated(p("b1"), p("a1"));
        let dom = inf.dominated();
        assert_eq!(dom.len(), 1);
        assert!(dom.contains(p("a1")) != dom.contains(p("b1")));

        //   a1 -> b1 -> c1 -> a1 cycle fed by b2 -> a2 -> b1
        let mut inf = InferiorCells::new();
        inf.add_dominated(p("a1"), p("b1"));
        inf.add_dominated(p("b1"), p("c1"));
        inf.add_dominated(p("c1"), p("a1"));
        inf.add_dominated(p("b2"), p("a2"));
        inf.add_dominated(p("a2"), p("b1"));
        let dom = inf.dominated();
        assert_eq!(dom.len(), 4);
        assert!(dom.contains(p("b2")));
        assert!(dom.contains(p("a2")));
        assert!(!dom.contains(p("a1")) || !dom.contains(p("b1")) || !dom.contains(p("c1")));
    }

    #[test]
    fn killer_of_dominated_reaches_a_kept_cell() {
        let mut inf = InferiorCells::new();
        inf.add_dominated(p("a1"), p("b1"));
        inf.add_dominated(p("b1"), p("c1"));
        let killer = inf.killer_of_dominated(p("a1")).unwrap();
        assert!(!inf.dominated().contains(killer));
        assert_eq!(inf.killer_of_dominated(p("c1")), None);
    }
}
