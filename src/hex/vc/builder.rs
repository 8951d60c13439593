use crate::hex::consts::*;
use crate::hex::coords::HexPoint;
use crate::utils::prelude::BTreeSet;
use crate::hex::groupboard::GroupBoard;
use crate::hex::sets::PointSet;
use crate::hex::vc::list::AddResult;
use crate::hex::vc::pattern::VcPatternSet;
use crate::hex::vc::set::VcSet;
use crate::hex::vc::{Vc, VcKind, VcRule};

/// Tunables for one builder run.
#[derive(Clone, Debug)]
pub struct VcBuilderParam {
    /// Largest number of semis or-ed together is max_ors + 1.
    pub max_ors: usize,
    /// Allow the and rule to combine across an edge endpoint.
    pub and_over_edge: bool,
    /// Seed the build with precomputed edge templates.
    pub use_patterns: bool,
    /// Run the push rule over processed semis.
    pub use_push_rule: bool,
    /// Use the greedy union when creating the all-rule full.
    pub use_greedy_union: bool,
    /// Stop the search once an edge-to-edge full exists.
    pub abort_on_winning_connection: bool,
}

impl Default for VcBuilderParam {
    fn default() -> Self {
        VcBuilderParam {
            max_ors: 4,
            and_over_edge: false,
            use_patterns: false,
            use_push_rule: false,
            use_greedy_union: true,
            abort_on_winning_connection: false,
        }
    }
}

/// Counters for one build; attempts and successes per rule.
#[derive(Clone, Copy, Debug, Default)]
pub struct VcBuilderStats {
    pub base_attempts: u64,
    pub base_successes: u64,
    pub pattern_attempts: u64,
    pub pattern_successes: u64,
    pub and_full_attempts: u64,
    pub and_full_successes: u64,
    pub and_semi_attempts: u64,
    pub and_semi_successes: u64,
    pub push_attempts: u64,
    pub push_successes: u64,
    pub or_attempts: u64,
    pub or_successes: u64,
    pub do_ors: u64,
    pub good_ors: u64,
    pub shrunk0: u64,
    pub shrunk1: u64,
    pub upgraded: u64,
    pub killed0: u64,
    pub killed1: u64,
}

impl std::fmt::Display for VcBuilderStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[base:{}/{}, pat:{}/{}, and-f:{}/{}, and-s:{}/{}, push-s:{}/{}, \
             or:{}/{}, doOr():{}/{}, s0/s1/u1:{}/{}/{}, killed0/1:{}/{}]",
            self.base_successes,
            self.base_attempts,
            self.pattern_successes,
            self.pattern_attempts,
            self.and_full_successes,
            self.and_full_attempts,
            self.and_semi_successes,
            self.and_semi_attempts,
            self.push_successes,
            self.push_attempts,
            self.or_successes,
            self.or_attempts,
            self.good_ors,
            self.do_ors,
            self.shrunk0,
            self.shrunk1,
            self.upgraded,
            self.killed0,
            self.killed1
        )
    }
}

/// FIFO queue of endpoint pairs needing processing. A pair already
/// waiting is not re-added. The vector only grows within one build;
/// popping advances a head index.
struct WorkQueue {
    array: Vec<(HexPoint, HexPoint)>,
    head: usize,
    seen: Box<[[bool; BITSET_SIZE]; BITSET_SIZE]>,
}

impl WorkQueue {
    fn new() -> WorkQueue {
        WorkQueue {
            array: Vec::with_capacity(128),
            head: 0,
            seen: Box::new([[false; BITSET_SIZE]; BITSET_SIZE]),
        }
    }

    fn clear(&mut self) {
        for (a, b) in self.array.drain(..) {
            self.seen[a.index()][b.index()] = false;
        }
        self.head = 0;
    }

    fn push(&mut self, pair: (HexPoint, HexPoint)) {
        let a = pair.0.min(pair.1);
        let b = pair.0.max(pair.1);
        if !self.seen[a.index()][b.index()] {
            self.seen[a.index()][b.index()] = true;
            self.array.push((a, b));
        }
    }

    fn pop(&mut self) -> Option<(HexPoint, HexPoint)> {
        if self.head == self.array.len() {
            return None;
        }
        let pair = self.array[self.head];
        self.head += 1;
        self.seen[pair.0.index()][pair.1.index()] = false;
        Some(pair)
    }
}

#[derive(Clone, Copy)]
enum AndRule {
    CreateFull,
    CreateSemi,
}

/// Builds the connection set of one colour, from scratch or
/// incrementally from the previous position.
pub struct VcBuilder {
    param: VcBuilderParam,
    queue: WorkQueue,
    stats: VcBuilderStats,
}

impl VcBuilder {
    pub fn new(param: VcBuilderParam) -> VcBuilder {
        VcBuilder {
            param,
            queue: WorkQueue::new(),
            stats: VcBuilderStats::default(),
        }
    }

    pub fn param(&self) -> &VcBuilderParam {
        &self.param
    }

    pub fn param_mut(&mut self) -> &mut VcBuilderParam {
        &mut self.param
    }

    pub fn stats(&self) -> &VcBuilderStats {
        &self.stats
    }

    /// Builds from scratch. Old connections are dropped and the change
    /// log stays off: a static build is its own baseline.
    pub fn build(&mut self, con: &mut VcSet, brd: &GroupBoard<'_>, patterns: &VcPatternSet) {
        con.set_logging(false);
        con.clear();
        self.stats = VcBuilderStats::default();
        self.queue.clear();

        self.add_base_vcs(con, brd);
        if self.param.use_patterns {
            self.add_pattern_vcs(con, brd, patterns);
        }
        self.do_search(con, brd);

        log::debug!("built vcs for {}: {}", con.color(), self.stats);
    }

    /// Updates an existing set for newly played stones. The previous
    /// connection data must describe the position before the stones
    /// appeared. Every mutation lands on the change log; when
    /// mark_the_log is set a marker separates this move's entries.
    pub fn build_incremental(
        &mut self,
        con: &mut VcSet,
        brd: &mut GroupBoard<'_>,
        patterns: &VcPatternSet,
        added: [PointSet; 2],
        mark_the_log: bool,
    ) {
        assert!(
            !added[0].intersects(&added[1]),
            "added stone sets overlap"
        );
        let color = con.color();
        let other = -color;
        self.stats = VcBuilderStats::default();
        self.queue.clear();

        con.set_logging(true);
        if mark_the_log {
            con.mark_log();
        }

        #[cfg(debug_assertions)]
        let snapshot = brd.board().clone();
        let own_added = added[color as usize];
        let opp_added = added[other as usize];

        // step back to the pre-add position to kill opponent hits and
        // to see which groups the new stones will merge
        brd.remove_color(color, own_added);
        brd.absorb_all();

        self.remove_all_containing(con, brd, &opp_added);

        let mut affected = own_added;
        for x in own_added.iter() {
            for &y in brd.geometry().nbs(x) {
                if brd.board().color_of(y) == Some(color) {
                    affected.insert(brd.captain(y));
                }
            }
        }

        brd.add_color(color, own_added);
        brd.absorb_set(own_added);

        self.merge_and_shrink(con, brd, &affected, &own_added);

        if self.param.use_patterns {
            self.add_pattern_vcs(con, brd, patterns);
        }
        self.do_search(con, brd);
        con.set_logging(false);

        #[cfg(debug_assertions)]
        debug_assert!(
            *brd.board() == snapshot,
            "incremental build disturbed the position"
        );
        log::debug!("incrementally built vcs for {color}: {}", self.stats);
    }

    // seeding

    /// The base rule: an empty connection between every group and each
    /// of its empty neighbours.
    fn add_base_vcs(&mut self, con: &mut VcSet, brd: &GroupBoard<'_>) {
        let color = con.color();
        for x in brd.groups(ColorFilter::ColorOrEmpty(color)) {
            for y in brd.nbs_of(x, None).iter() {
                let vc = Vc::base(x, y);
                self.stats.base_attempts += 1;
                if con.add(vc) != AddResult::Failed {
                    self.stats.base_successes += 1;
                    self.queue.push((vc.x(), vc.y()));
                }
            }
        }
    }

    /// Seeds fulls from matching edge templates.
    fn add_pattern_vcs(&mut self, con: &mut VcSet, brd: &GroupBoard<'_>, patterns: &VcPatternSet) {
        let color = con.color();
        for pat in patterns.iter() {
            if !pat.matches(color, brd.board()) {
                continue;
            }
            let (end1, end2) = pat.endpoints();
            let (end1, end2) = (brd.captain(end1), brd.captain(end2));
            if end1 == end2 {
                continue;
            }
            let mut carrier = pat.not_opponent() - brd.board().stones(color);
            carrier.remove(end1);
            carrier.remove(end2);
            let vc = Vc::full(end1, end2, carrier, VcRule::Base);
            self.stats.pattern_attempts += 1;
            if con.add(vc) != AddResult::Failed {
                self.stats.pattern_successes += 1;
                self.queue.push((vc.x(), vc.y()));
            }
        }
    }

    // queue processing

    fn do_search(&mut self, con: &mut VcSet, brd: &GroupBoard<'_>) {
        let color = con.color();
        let mut winning_connection = false;
        while let Some((x, y)) = self.queue.pop() {
            self.process_semis(con, brd, x, y);
            self.process_fulls(con, brd, x, y);

            if self.param.abort_on_winning_connection
                && con.exists(brd, color.edge1(), color.edge2(), VcKind::Full)
            {
                winning_connection = true;
                break;
            }
        }

        if winning_connection {
            log::debug!("aborted on winning connection");
        }

        // process the edge-to-edge semi list so a full exists whenever
        // the mustplay is empty
        let xc = brd.captain(color.edge1());
        let yc = brd.captain(color.edge2());
        self.process_semis(con, brd, xc, yc);
    }

    /// Ors every unprocessed semi of the pair against the other
    /// processed semis; guarantees a full exists afterwards if the
    /// list's intersection is empty.
    fn process_semis(&mut self, con: &mut VcSet, brd: &GroupBoard<'_>, xc: HexPoint, yc: HexPoint) {
        // pairs queued before a fill-in batch may have gained an
        // opponent endpoint; their lists are unreachable garbage
        let other = -con.color();
        if brd.board().color_of(xc) == Some(other) || brd.board().color_of(yc) == Some(other) {
            return;
        }
        // a non-empty intersection means no subset can or to a full
        if con.list(VcKind::Semi, xc, yc).hard_intersection().any() {
            return;
        }

        let soft = con.list(VcKind::Semi, xc, yc).soft_limit();
        let mut added = vec![];
        let end = soft.min(con.list(VcKind::Semi, xc, yc).len());
        for i in 0..end {
            let vc = *con.list(VcKind::Semi, xc, yc).get(i);
            if vc.processed() {
                continue;
            }
            if self.param.use_push_rule {
                self.push_rule(con, brd, &vc);
            }
            self.stats.do_ors += 1;
            if self.or_rule(con, &vc, xc, yc, &mut added) > 0 {
                self.stats.good_ors += 1;
            }
            con.set_processed(VcKind::Semi, xc, yc, i);
        }

        // newly created fulls make semi supersets of them useless
        for v in &added {
            con.remove_supersets_of(VcKind::Semi, xc, yc, &v.carrier());
        }

        if con.list(VcKind::Full, xc, yc).is_empty() {
            let semis = con.list(VcKind::Semi, xc, yc);
            let carrier = if self.param.use_greedy_union {
                semis.greedy_union()
            } else {
                semis.union()
            };
            con.add(Vc::full(xc, yc, carrier, VcRule::All));
        }
    }

    /// Runs the and closure over every unprocessed full of the pair.
    fn process_fulls(&mut self, con: &mut VcSet, brd: &GroupBoard<'_>, xc: HexPoint, yc: HexPoint) {
        let other = -con.color();
        if brd.board().color_of(xc) == Some(other) || brd.board().color_of(yc) == Some(other) {
            return;
        }
        let soft = con.list(VcKind::Full, xc, yc).soft_limit();
        let end = soft.min(con.list(VcKind::Full, xc, yc).len());
        for i in 0..end {
            let vc = *con.list(VcKind::Full, xc, yc).get(i);
            if !vc.processed() {
                self.and_closure(con, brd, &vc);
                con.set_processed(VcKind::Full, xc, yc, i);
            }
        }
    }

    /// For every third group z, ands the connection with the processed
    /// fulls between z and each endpoint. An empty midpoint yields a
    /// semi keyed on it, an occupied one a full.
    fn and_closure(&mut self, con: &mut VcSet, brd: &GroupBoard<'_>, vc: &Vc) {
        let color = con.color();
        let other = -color;

        let endp = [brd.captain(vc.x()), brd.captain(vc.y())];
        let endc = [
            brd.board().color_of(endp[0]),
            brd.board().color_of(endp[1]),
        ];
        assert!(endc[0] != Some(other) && endc[1] != Some(other));

        for z in brd.groups(ColorFilter::NotColor(other)) {
            if z == endp[0] || z == endp[1] {
                continue;
            }
            if vc.carrier().contains(z) {
                continue;
            }
            for i in 0..2 {
                let j = (i + 1) & 1;
                if !self.param.and_over_edge && endp[i].is_edge() {
                    continue;
                }
                let fulls = con.list(VcKind::Full, z, endp[i]);
                if fulls.soft_intersection().intersects(&vc.carrier()) {
                    continue;
                }
                let rule = if endc[i].is_none() {
                    AndRule::CreateSemi
                } else {
                    AndRule::CreateFull
                };
                self.do_and(con, brd, z, endp[i], endp[j], rule, vc);
            }
        }
    }

    /// Pairs the connection against the processed fulls of the list
    /// between from and over, adding those with disjoint carriers.
    fn do_and(
        &mut self,
        con: &mut VcSet,
        brd: &GroupBoard<'_>,
        from: HexPoint,
        over: HexPoint,
        to: HexPoint,
        rule: AndRule,
        vc: &Vc,
    ) {
        let old = con.list(VcKind::Full, from, over);
        if old.is_empty() {
            return;
        }

        let candidates: Vec<Vc> = old
            .soft_prefix()
            .into_iter()
            .filter(|v| v.processed())
            .filter(|v| !v.carrier().contains(to))
            .filter(|v| !v.carrier().intersects(&vc.carrier()))
            .collect();

        let stones = PointSet::singleton(brd.captain(over));
        for cand in candidates {
            match rule {
                AndRule::CreateFull => {
                    self.stats.and_full_attempts += 1;
                    if self.add_new_full(con, Vc::and_full(from, to, &cand, vc, stones)) {
                        self.stats.and_full_successes += 1;
                    }
                }
                AndRule::CreateSemi => {
                    self.stats.and_semi_attempts += 1;
                    if self.add_new_semi(con, Vc::and_semi(from, to, &cand, vc, over)) {
                        self.stats.and_semi_successes += 1;
                    }
                }
            }
        }
    }

    /// The or rule: enumerates subsets of the processed semis that
    /// include vc, adding a full for every subset whose carriers
    /// intersect to nothing. Subsets whose running intersection cannot
    /// reach empty are pruned through suffix intersections.
    fn or_rule(
        &mut self,
        con: &mut VcSet,
        vc: &Vc,
        xc: HexPoint,
        yc: HexPoint,
        added: &mut Vec<Vc>,
    ) -> usize {
        let semi_list = con.list(VcKind::Semi, xc, yc);
        if semi_list.is_empty() {
            return 0;
        }

        let semis: Vec<Vc> = semi_list
            .soft_prefix()
            .into_iter()
            .filter(|v| v.processed())
            .collect();
        if semis.is_empty() {
            return 0;
        }

        let n = semis.len();
        // tail[i] is the intersection of the carriers in semis[i..]
        let mut tail = vec![PointSet::EMPTY; n];
        tail[n - 1] = semis[n - 1].carrier();
        for i in (0..n - 1).rev() {
            tail[i] = semis[i].carrier() & tail[i + 1];
        }

        let max_ors = self.param.max_ors - 1;
        assert!(max_ors < 16);

        let mut index = [0usize; 16];
        let mut ors = [PointSet::EMPTY; 16];
        let mut ands = [PointSet::EMPTY; 16];
        ors[0] = vc.carrier();
        ands[0] = vc.carrier();
        index[1] = 0;

        let mut d = 1;
        let mut count = 0;
        loop {
            let mut i = index[d];

            // the current subset cannot become disjoint using only the
            // remaining semis
            if i < n && ands[d - 1].intersects(&tail[i]) {
                i = n;
            }

            if i == n {
                if d == 1 {
                    break;
                }
                d -= 1;
                index[d] += 1;
                continue;
            }

            ands[d] = ands[d - 1] & semis[i].carrier();
            ors[d] = ors[d - 1] | semis[i].carrier();

            if ands[d].is_empty() {
                // a disjoint subset: its union carries a full. Queue and
                // superset maintenance are handled by the caller.
                let v = Vc::full(xc, yc, ors[d], VcRule::Or);
                self.stats.or_attempts += 1;
                if con.add(v) != AddResult::Failed {
                    count += 1;
                    self.stats.or_successes += 1;
                    added.push(v);
                }
                index[d] += 1;
            } else if ands[d] == ands[d - 1] {
                // no progress from this semi
                index[d] += 1;
            } else if d < max_ors {
                index[d + 1] = i + 1;
                d += 1;
            } else {
                index[d] += 1;
            }
        }
        count
    }

    /// The push rule: a three-way combination of the connection with
    /// two processed semis, all pairwise disjoint with pairwise
    /// disjoint mustuse sets, of which at most one is empty. Produces
    /// fulls from each key to each mustuse captain and semis between
    /// mustuse captains. A two-cell overlap is tolerated only as a
    /// valid edge bridge whose apex is one of the keys; the miai then
    /// fixes both the only usable key and the edge endpoint.
    fn push_rule(&mut self, con: &mut VcSet, brd: &GroupBoard<'_>, vc: &Vc) {
        if !brd.board().is_empty(vc.x()) || !brd.board().is_empty(vc.y()) {
            return;
        }

        let semis: Vec<Vc> = con
            .list(VcKind::Semi, vc.x(), vc.y())
            .soft_prefix()
            .into_iter()
            .filter(|v| v.processed())
            .collect();
        if semis.is_empty() {
            return;
        }

        let keys = [vc.x(), vc.y()];

        let mut mu = [PointSet::EMPTY; 3];
        let has_empty_mustuse0 = vc.stones().is_empty();
        mu[0] = captainize_stones(brd, vc.stones());

        for i in 0..semis.len() {
            let vi = semis[i];
            let mut has_empty_mustuse1 = has_empty_mustuse0;

            let mut has_miai1 = false;
            let mut miai_endpoint = crate::hex::coords::INVALID;
            let mut miai_edge = crate::hex::coords::INVALID;

            let isect = vi.carrier() & vc.carrier();
            if isect.is_empty() {
                // disjoint, good
            } else if isect.len() == 2 {
                match valid_edge_bridge(brd, &isect) {
                    Some((k, e)) if k == keys[0] || k == keys[1] => {
                        has_miai1 = true;
                        miai_endpoint = k;
                        miai_edge = e;
                    }
                    _ => continue,
                }
            } else {
                continue;
            }

            if vi.stones().is_empty() {
                if has_empty_mustuse1 {
                    continue;
                }
                has_empty_mustuse1 = true;
            }

            mu[1] = captainize_stones(brd, vi.stones());
            if mu[0].intersects(&mu[1]) {
                continue;
            }

            for j in i + 1..semis.len() {
                let vj = semis[j];
                let mut has_empty_mustuse2 = has_empty_mustuse1;
                let mut has_miai = has_miai1;

                let isect = vj.carrier() & vc.carrier();
                if isect.is_empty() {
                    // good
                } else if isect.len() == 2 && !has_miai {
                    match valid_edge_bridge(brd, &isect) {
                        Some((k, e)) if k == keys[0] || k == keys[1] => {
                            has_miai = true;
                            miai_endpoint = k;
                            miai_edge = e;
                        }
                        _ => continue,
                    }
                } else {
                    continue;
                }

                let isect = vj.carrier() & vi.carrier();
                if isect.is_empty() {
                    // good
                } else if isect.len() == 2 && !has_miai {
                    match valid_edge_bridge(brd, &isect) {
                        Some((k, e)) if k == keys[0] || k == keys[1] => {
                            has_miai = true;
                            miai_endpoint = k;
                            miai_edge = e;
                        }
                        _ => continue,
                    }
                } else {
                    continue;
                }

                if vj.stones().is_empty() {
                    if has_empty_mustuse2 {
                        continue;
                    }
                    has_empty_mustuse2 = true;
                }

                mu[2] = captainize_stones(brd, vj.stones());
                if mu[2].intersects(&(mu[0] | mu[1])) {
                    continue;
                }

                // pairwise disjoint, at most one empty mustuse, and all
                // mustuse sets disjoint: both endpoints act as keys
                let mut carrier = vi.carrier() | vj.carrier() | vc.carrier();
                assert!(!carrier.contains(vc.x()));
                assert!(!carrier.contains(vc.y()));
                carrier.insert(vc.x());
                carrier.insert(vc.y());

                for p in (mu[0] | mu[1] | mu[2]).iter() {
                    for &key in &keys {
                        let our_carrier = carrier.without(key);
                        self.add_new_full(con, Vc::full(
                            key,
                            p,
                            our_carrier,
                            VcRule::Push,
                        ));
                    }
                }

                // all endpoint pairs drawn from two different mustuse
                // sets; with a miai only pairs through the miai edge
                let mut ends = BTreeSet::new();
                for a in 0..2 {
                    for b in a + 1..3 {
                        for p1 in mu[a].iter() {
                            for p2 in mu[b].iter() {
                                assert!(p1 != p2);
                                if has_miai && p1 != miai_edge && p2 != miai_edge {
                                    continue;
                                }
                                ends.insert((p1.min(p2), p1.max(p2)));
                            }
                        }
                    }
                }

                for &key in &keys {
                    if has_miai && key != miai_endpoint {
                        continue;
                    }
                    for &(p1, p2) in &ends {
                        let new_semi =
                            Vc::semi(p1, p2, key, carrier, PointSet::EMPTY, VcRule::Push);
                        self.stats.push_attempts += 1;
                        if self.add_new_semi(con, new_semi) {
                            self.stats.push_successes += 1;
                        }
                    }
                }
            }
        }
    }

    // insertion helpers

    /// Adds a full; removes semi supersets between the same endpoints
    /// and queues the pair when the full landed in the soft prefix.
    fn add_new_full(&mut self, con: &mut VcSet, vc: Vc) -> bool {
        debug_assert!(vc.kind() == VcKind::Full);
        let result = con.add(vc);
        if result == AddResult::Failed {
            return false;
        }
        con.remove_supersets_of(VcKind::Semi, vc.x(), vc.y(), &vc.carrier());
        if result == AddResult::InsideSoftLimit {
            self.queue.push((vc.x(), vc.y()));
        }
        true
    }

    /// Adds a semi unless it is a superset of a full between the same
    /// endpoints. When the list's intersection is empty the pair is
    /// queued, or an all-rule full is created if the semi fell past the
    /// soft limit and no full exists.
    fn add_new_semi(&mut self, con: &mut VcSet, vc: Vc) -> bool {
        let (x, y) = (vc.x(), vc.y());
        if con
            .list(VcKind::Full, x, y)
            .is_superset_of_any(&vc.carrier())
        {
            return false;
        }
        let result = con.add(vc);
        if result == AddResult::Failed {
            return false;
        }
        if con.list(VcKind::Semi, x, y).hard_intersection().is_empty() {
            if result == AddResult::InsideSoftLimit {
                self.queue.push((x, y));
            } else if con.list(VcKind::Full, x, y).is_empty() {
                let semis = con.list(VcKind::Semi, x, y);
                let carrier = if self.param.use_greedy_union {
                    semis.greedy_union()
                } else {
                    semis.union()
                };
                con.add(Vc::full(x, y, carrier, VcRule::All));
            }
        }
        true
    }

    // incremental steps

    /// Kills every connection whose carrier holds a new opponent stone.
    /// Changed pairs are queued: the removals may pull unprocessed
    /// members under the soft limit.
    fn remove_all_containing(&mut self, con: &mut VcSet, brd: &GroupBoard<'_>, cells: &PointSet) {
        let groups = brd.groups(ColorFilter::NotColor(-con.color()));
        let mut scratch = vec![];
        for (i, &x) in groups.iter().enumerate() {
            for &y in &groups[..i] {
                scratch.clear();
                let cur0 = con.remove_all_containing(VcKind::Full, x, y, cells, &mut scratch);
                let cur1 = con.remove_all_containing(VcKind::Semi, x, y, cells, &mut scratch);
                self.stats.killed0 += cur0 as u64;
                self.stats.killed1 += cur1 as u64;
                if cur0 + cur1 > 0 {
                    self.queue.push((x, y));
                }
            }
        }
    }

    /// Walks every pair of locations that may have moved captains and
    /// merges or shrinks their lists into the lists of the new
    /// captains.
    fn merge_and_shrink(
        &mut self,
        con: &mut VcSet,
        brd: &GroupBoard<'_>,
        affected: &PointSet,
        added: &PointSet,
    ) {
        let locations = brd.locations_matching(ColorFilter::NotColor(-con.color()));
        for (i, &x) in locations.iter().enumerate() {
            if !brd.is_captain(x) && !affected.contains(x) {
                continue;
            }
            for &y in &locations[..i] {
                if !brd.is_captain(y) && !affected.contains(y) {
                    continue;
                }
                let cx = brd.captain(x);
                let cy = brd.captain(y);
                // a pair that collapsed into one group carries nothing
                if cx == cy {
                    continue;
                }
                self.queue.push((cx, cy));
                self.merge_shrink_pair(con, added, x, y, cx, cy);
            }
        }
    }

    fn merge_shrink_pair(
        &mut self,
        con: &mut VcSet,
        added: &PointSet,
        xin: HexPoint,
        yin: HexPoint,
        xout: HexPoint,
        yout: HexPoint,
    ) {
        assert!(xin != yin && xout != yout);
        let pair_in = (xin.min(yin), xin.max(yin));
        let pair_out = (xout.min(yout), xout.max(yout));
        let doing_merge = pair_in != pair_out;

        // fulls: shrink members hit by the new stones, transferring the
        // survivors when the pair moved captains
        let mut removed = vec![];
        con.remove_all_containing(VcKind::Full, xin, yin, added, &mut removed);

        if doing_merge {
            let transfer: Vec<Vc> = con.list(VcKind::Full, xin, yin).iter().copied().collect();
            for v in transfer {
                let mut t = v.translate(xout, yout);
                t.set_processed(false);
                if con.add(t) != AddResult::Failed {
                    // semis between the new captains may be supersets of
                    // the transferred full
                    con.remove_supersets_of(VcKind::Semi, xout, yout, &t.carrier());
                }
            }
        }

        for v in &removed {
            let nv = Vc::shrink_full(v, added, xout, yout);
            if con.add(nv) != AddResult::Failed {
                con.remove_supersets_of(VcKind::Semi, xout, yout, &nv.carrier());
                self.stats.shrunk0 += 1;
            }
        }

        // semis: the same dance, except a semi whose key was just
        // played upgrades to a full
        let mut removed_semis = vec![];
        con.remove_all_containing(VcKind::Semi, xin, yin, added, &mut removed_semis);

        if doing_merge {
            let transfer: Vec<Vc> = con.list(VcKind::Semi, xin, yin).iter().copied().collect();
            for v in transfer {
                let mut t = v.translate(xout, yout);
                t.set_processed(false);
                if !con
                    .list(VcKind::Full, xout, yout)
                    .is_superset_of_any(&t.carrier())
                {
                    con.add(t);
                }
            }
        }

        // shrink before upgrading so upgrades see the final semi list
        for v in &removed_semis {
            if added.contains(v.key()) {
                continue;
            }
            let nv = Vc::shrink_semi(v, added, xout, yout);
            if !con
                .list(VcKind::Full, xout, yout)
                .is_superset_of_any(&nv.carrier())
                && con.add(nv) != AddResult::Failed
            {
                self.stats.shrunk1 += 1;
            }
        }

        for v in &removed_semis {
            if !added.contains(v.key()) {
                continue;
            }
            let nv = Vc::upgrade_semi(v, added, xout, yout);
            if con.add(nv) != AddResult::Failed {
                con.remove_supersets_of(VcKind::Semi, xout, yout, &nv.carrier());
                self.stats.upgraded += 1;
            }
        }
    }
}

/// Projects a mustuse set onto group captains.
fn captainize_stones(brd: &GroupBoard<'_>, stones: PointSet) -> PointSet {
    if stones.is_empty() {
        PointSet::EMPTY
    } else {
        brd.captainize(stones)
    }
}

/// Checks whether a two-cell carrier overlap forms a bridge to an edge:
/// both cells empty and adjacent, with an edge and an empty apex cell
/// each adjacent to both. Returns the apex and the edge.
fn valid_edge_bridge(
    brd: &GroupBoard<'_>,
    overlap: &PointSet,
) -> Option<(HexPoint, HexPoint)> {
    let mut cells = overlap.iter();
    let p = cells.next()?;
    let q = cells.next()?;
    debug_assert!(cells.next().is_none());

    let geom = brd.geometry();
    if !p.is_interior() || !q.is_interior() {
        return None;
    }
    if !brd.board().is_empty(p) || !brd.board().is_empty(q) {
        return None;
    }
    if !geom.adjacent(p, q) {
        return None;
    }

    let edge = [
        crate::hex::coords::NORTH,
        crate::hex::coords::EAST,
        crate::hex::coords::SOUTH,
        crate::hex::coords::WEST,
    ]
    .into_iter()
    .find(|&e| geom.adjacent(p, e) && geom.adjacent(q, e))?;

    let apex = geom
        .nbs(p)
        .iter()
        .copied()
        .find(|&k| {
            k.is_interior() && geom.adjacent(q, k) && brd.board().is_empty(k)
        })?;

    Some((apex, edge))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::coords::{NORTH, SOUTH};
    use crate::hex::geometry::Geometry;
    use crate::hex::vc::set::{DEFAULT_FULL_SOFT_LIMIT, DEFAULT_SEMI_SOFT_LIMIT};

    fn p(name: &str) -> HexPoint {
        name.parse().unwrap()
    }

    fn fresh(color: Color) -> VcSet {
        VcSet::new(color, DEFAULT_FULL_SOFT_LIMIT, DEFAULT_SEMI_SOFT_LIMIT)
    }

    #[test]
    fn single_cell_board_yields_an_edge_semi() {
        let g = Geometry::new(1, 1).unwrap();
        let mut brd = GroupBoard::new(&g);
        brd.start_new_game();

        let mut con = fresh(Color::Black);
        let mut builder = VcBuilder::new(VcBuilderParam::default());
        builder.build(&mut con, &brd, &VcPatternSet::empty());

        assert!(con.exists(&brd, NORTH, p("a1"), VcKind::Full));
        assert!(con.exists(&brd, NORTH, SOUTH, VcKind::Semi));
        assert!(!con.exists(&brd, NORTH, SOUTH, VcKind::Full));
        let semi = con.smallest(&brd, NORTH, SOUTH, VcKind::Semi).unwrap();
        assert_eq!(semi.key(), p("a1"));
        assert_eq!(semi.carrier(), PointSet::singleton(p("a1")));
    }

    #[test]
    fn or_rule_builds_the_winning_full() {
        // on a 2x1 board black has semis through a1 and through b1;
        // their carriers are disjoint, so the or rule yields a full
        let g = Geometry::new(2, 1).unwrap();
        let mut brd = GroupBoard::new(&g);
        brd.start_new_game();

        let mut con = fresh(Color::Black);
        let mut builder = VcBuilder::new(VcBuilderParam::default());
        builder.build(&mut con, &brd, &VcPatternSet::empty());

        let full = con.smallest(&brd, NORTH, SOUTH, VcKind::Full).unwrap();
        let both: PointSet = [p("a1"), p("b1")].iter().collect();
        assert_eq!(full.carrier(), both);
        // the semi list intersects to nothing: white has no saving move
        assert!(
            con.list(VcKind::Semi, NORTH, SOUTH)
                .hard_intersection()
                .is_empty()
        );
    }

    #[test]
    fn played_key_upgrades_the_semi() {
        let g = Geometry::new(1, 1).unwrap();
        let mut brd = GroupBoard::new(&g);
        brd.start_new_game();

        let mut con = fresh(Color::Black);
        let mut builder = VcBuilder::new(VcBuilderParam::default());
        builder.build(&mut con, &brd, &VcPatternSet::empty());

        brd.play_move(Color::Black, p("a1"));
        let mut added = [PointSet::EMPTY; 2];
        added[Color::Black as usize] = PointSet::singleton(p("a1"));
        builder.build_incremental(&mut con, &mut brd, &VcPatternSet::empty(), added, true);

        let full = con.smallest(&brd, NORTH, SOUTH, VcKind::Full).unwrap();
        assert!(full.carrier().is_empty());
        assert!(brd.is_game_over());
    }

    #[test]
    fn incremental_build_reverts_exactly() {
        let g = Geometry::new(3, 3).unwrap();
        let mut brd = GroupBoard::new(&g);
        brd.start_new_game();
        brd.play_move(Color::Black, p("b2"));
        brd.play_move(Color::White, p("c1"));

        let mut builder = VcBuilder::new(VcBuilderParam::default());
        let patterns = VcPatternSet::empty();

        let mut con1 = fresh(Color::Black);
        let mut con2 = fresh(Color::Black);
        builder.build(&mut con1, &brd, &patterns);
        builder.build(&mut con2, &brd, &patterns);
        assert!(con1 == con2);

        for cell in brd.board().empty_cells().iter().collect::<Vec<_>>() {
            for color in Color::both() {
                let mut added = [PointSet::EMPTY; 2];
                added[color as usize] = PointSet::singleton(cell);

                brd.play_move(color, cell);
                builder.build_incremental(&mut con2, &mut brd, &patterns, added, true);

                con2.revert_to_marker();
                brd.undo_move(cell);

                assert!(con1 == con2, "revert differs after {color} {cell}");
            }
        }
    }
}
