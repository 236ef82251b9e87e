//! Sparse boolean relations over node ids
//!
//! A `Relation` is a set of (start, end) pairs. Traversal is expressed as
//! relation algebra: composing with a [`Step`] advances every pair by one hop,
//! and unions merge per-type results.

use super::types::NodeId;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

/// One hop of a traversal: the nodes reachable from `node` in a single step
pub trait Step: Sync {
    fn successors(&self, node: NodeId, out: &mut Vec<NodeId>);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relation {
    rows: FxHashMap<NodeId, FxHashSet<NodeId>>,
    len: usize,
}

impl Relation {
    pub fn new() -> Self {
        Self::default()
    }

    /// The zero-hop relation: one self-pair per node
    pub fn identity(nodes: impl IntoIterator<Item = NodeId>) -> Self {
        let mut relation = Self::new();
        for node in nodes {
            relation.insert(node, node);
        }
        relation
    }

    pub fn insert(&mut self, start: NodeId, end: NodeId) -> bool {
        let added = self.rows.entry(start).or_default().insert(end);
        if added {
            self.len += 1;
        }
        added
    }

    pub fn contains(&self, start: NodeId, end: NodeId) -> bool {
        self.rows.get(&start).map_or(false, |row| row.contains(&end))
    }

    /// Ends paired with `start`
    pub fn row(&self, start: NodeId) -> Option<&FxHashSet<NodeId>> {
        self.rows.get(&start)
    }

    /// Ends paired with `start`, ascending
    pub fn sorted_row(&self, start: NodeId) -> Vec<NodeId> {
        let mut ends: Vec<NodeId> = self
            .rows
            .get(&start)
            .map(|row| row.iter().copied().collect())
            .unwrap_or_default();
        ends.sort_unstable();
        ends
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn pairs(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.rows
            .iter()
            .flat_map(|(start, ends)| ends.iter().map(move |end| (*start, *end)))
    }

    /// All pairs in ascending (start, end) order
    pub fn sorted_pairs(&self) -> Vec<(NodeId, NodeId)> {
        let mut pairs: Vec<_> = self.pairs().collect();
        pairs.sort_unstable();
        pairs
    }

    /// Add every pair of `other`; returns how many were new
    pub fn union_with(&mut self, other: &Relation) -> usize {
        let before = self.len;
        for (start, end) in other.pairs() {
            self.insert(start, end);
        }
        self.len - before
    }

    /// Pairs of `self` that are not in `other`
    pub fn difference(&self, other: &Relation) -> Relation {
        let mut result = Relation::new();
        for (start, end) in self.pairs() {
            if !other.contains(start, end) {
                result.insert(start, end);
            }
        }
        result
    }

    pub fn transpose(&self) -> Relation {
        let mut result = Relation::new();
        for (start, end) in self.pairs() {
            result.insert(end, start);
        }
        result
    }

    /// Compose with one hop: (s, m) and m -> e give (s, e).
    ///
    /// Rows are expanded in parallel once there are at least
    /// `parallel_threshold` of them; the result is the same set either way.
    pub fn compose<S: Step>(&self, step: &S, parallel_threshold: usize) -> Relation {
        let expand = |(start, mids): (&NodeId, &FxHashSet<NodeId>)| {
            let mut ends = FxHashSet::default();
            let mut buf = Vec::new();
            for mid in mids {
                buf.clear();
                step.successors(*mid, &mut buf);
                ends.extend(buf.iter().copied());
            }
            (*start, ends)
        };

        let rows: Vec<(NodeId, FxHashSet<NodeId>)> = if self.rows.len() >= parallel_threshold {
            self.rows.par_iter().map(expand).collect()
        } else {
            self.rows.iter().map(expand).collect()
        };

        Self::from_rows(rows)
    }

    fn from_rows(rows: Vec<(NodeId, FxHashSet<NodeId>)>) -> Relation {
        let mut relation = Relation::new();
        for (start, ends) in rows {
            if ends.is_empty() {
                continue;
            }
            relation.len += ends.len();
            relation.rows.insert(start, ends);
        }
        relation
    }
}

impl Step for Relation {
    fn successors(&self, node: NodeId, out: &mut Vec<NodeId>) {
        if let Some(row) = self.rows.get(&node) {
            out.extend(row.iter().copied());
        }
    }
}

impl FromIterator<(NodeId, NodeId)> for Relation {
    fn from_iter<I: IntoIterator<Item = (NodeId, NodeId)>>(iter: I) -> Self {
        let mut relation = Relation::new();
        for (start, end) in iter {
            relation.insert(start, end);
        }
        relation
    }
}
