//! Co-partition group computation
//!
//! Two sources feeding the same join (or merge) must be partitioned
//! identically, so that every record for a key lands on the same instance on
//! both sides. Grouping is a disjoint-set problem: sources are the elements,
//! "feeds the same join" edges union them, and each resulting set must map to
//! topics with one shared partition count.

use std::collections::{BTreeMap, BTreeSet};

/// Disjoint-set forest with path halving and union by rank
#[derive(Debug, Clone, Default)]
pub struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    pub fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
            rank: vec![0; size],
        }
    }

    /// Add a singleton set, returning its index
    pub fn push(&mut self) -> usize {
        let index = self.parent.len();
        self.parent.push(index);
        self.rank.push(0);
        index
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Representative of the set containing `x`
    pub fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Merge the sets containing `a` and `b`; returns false if already merged
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let (root_a, root_b) = (self.find(a), self.find(b));
        if root_a == root_b {
            return false;
        }
        match self.rank[root_a].cmp(&self.rank[root_b]) {
            std::cmp::Ordering::Less => self.parent[root_a] = root_b,
            std::cmp::Ordering::Greater => self.parent[root_b] = root_a,
            std::cmp::Ordering::Equal => {
                self.parent[root_b] = root_a;
                self.rank[root_a] += 1;
            }
        }
        true
    }
}

/// Partition `sources` into co-partition groups.
///
/// Each edge states that its two endpoints feed the same join or merge node.
/// Edge endpoints that are not in `sources` are added. Every source appears in
/// exactly one group; sources touched by no edge form singleton groups.
/// Groups are ordered by their smallest member.
pub fn compute_copartition_groups<S, I, E>(sources: I, edges: E) -> Vec<BTreeSet<S>>
where
    S: Ord + Clone,
    I: IntoIterator<Item = S>,
    E: IntoIterator<Item = (S, S)>,
{
    let mut index: BTreeMap<S, usize> = BTreeMap::new();
    let mut sets = DisjointSet::default();

    let mut intern = |source: S, sets: &mut DisjointSet| -> usize {
        *index.entry(source).or_insert_with(|| sets.push())
    };

    for source in sources {
        intern(source, &mut sets);
    }
    let mut pairs = Vec::new();
    for (a, b) in edges {
        let ia = intern(a, &mut sets);
        let ib = intern(b, &mut sets);
        pairs.push((ia, ib));
    }
    for (a, b) in pairs {
        sets.union(a, b);
    }

    let mut groups: BTreeMap<usize, BTreeSet<S>> = BTreeMap::new();
    for (source, i) in index {
        let root = sets.find(i);
        groups.entry(root).or_default().insert(source);
    }

    let mut result: Vec<BTreeSet<S>> = groups.into_values().collect();
    result.sort_by(|a, b| a.first().cmp(&b.first()));
    result
}
