//! Fixed and variable-length traversal over the adjacency relations
//!
//! Given a set of start nodes, a relationship-type filter, a direction and a
//! hop interval `[min, max]`, compute every (start, end) pair such that `end`
//! is reachable from `start` by exactly `k` hops for some `k` in the interval.
//!
//! Levels below `min` are computed exactly. From `min` on, only pairs not seen
//! before are expanded further: a pair's successors depend on the pair alone,
//! so re-expanding a known pair can only rediscover known pairs. With no upper
//! bound the loop stops at the first level that adds nothing. Every iteration
//! either adds a pair or stops, and there are finitely many pairs.

use super::adjacency::{Direction, RelationView};
use super::relation::Relation;
use super::types::{NodeId, RelationTypeId};
use tracing::debug;

/// Which relationship types a traversal step may follow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationFilter {
    /// Every relationship type
    Any,
    /// Only the listed types; an empty list matches nothing
    Types(Vec<RelationTypeId>),
}

impl RelationFilter {
    pub fn allows(&self, rel_type: RelationTypeId) -> bool {
        match self {
            RelationFilter::Any => true,
            RelationFilter::Types(types) => types.contains(&rel_type),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalSpec {
    pub types: RelationFilter,
    pub direction: Direction,
    pub min_hops: u32,
    /// `None` is unbounded
    pub max_hops: Option<u32>,
}

impl TraversalSpec {
    pub fn new(types: RelationFilter, direction: Direction, min_hops: u32, max_hops: Option<u32>) -> Self {
        Self {
            types,
            direction,
            min_hops,
            max_hops,
        }
    }

    /// A single outgoing hop over `types`
    pub fn single_hop(types: RelationFilter) -> Self {
        Self::new(types, Direction::Outgoing, 1, Some(1))
    }

    pub fn is_single_hop(&self) -> bool {
        self.min_hops == 1 && self.max_hops == Some(1)
    }

    pub fn is_empty_interval(&self) -> bool {
        self.max_hops.map_or(false, |max| max < self.min_hops)
    }
}

/// Pairs reachable from `sources` within the hop interval of `spec`
pub(crate) fn reachable_pairs(
    sources: impl IntoIterator<Item = NodeId>,
    view: &RelationView<'_>,
    spec: &TraversalSpec,
    parallel_threshold: usize,
) -> Relation {
    if spec.is_empty_interval() {
        return Relation::new();
    }

    let mut level = Relation::identity(sources);
    for hop in 0..spec.min_hops {
        if level.is_empty() {
            break;
        }
        level = level.compose(view, parallel_threshold);
        debug!("traversal level {} holds {} pairs", hop + 1, level.len());
    }

    let mut result = level.clone();
    let mut frontier = level;
    let mut hops = spec.min_hops;

    while !frontier.is_empty() && spec.max_hops.map_or(true, |max| hops < max) {
        let next = frontier.compose(view, parallel_threshold).difference(&result);
        hops += 1;
        if next.is_empty() {
            break;
        }
        result.union_with(&next);
        debug!("traversal level {} added {} pairs", hops, next.len());
        frontier = next;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::adjacency::AdjacencyMatrix;
    use crate::graph::types::EdgeId;

    fn chain(pairs: &[(u64, u64)]) -> AdjacencyMatrix {
        let mut m = AdjacencyMatrix::new();
        for (i, (a, b)) in pairs.iter().enumerate() {
            m.insert(NodeId(*a), NodeId(*b), EdgeId(i as u64));
        }
        m
    }

    fn run(m: &AdjacencyMatrix, sources: &[u64], min: u32, max: Option<u32>) -> Vec<(u64, u64)> {
        let view = RelationView::new(vec![m], Direction::Outgoing);
        let spec = TraversalSpec::new(RelationFilter::Any, Direction::Outgoing, min, max);
        reachable_pairs(sources.iter().map(|s| NodeId(*s)), &view, &spec, usize::MAX)
            .sorted_pairs()
            .into_iter()
            .map(|(a, b)| (a.0, b.0))
            .collect()
    }

    #[test]
    fn test_hop_intervals_on_chain() {
        let m = chain(&[(0, 1), (1, 2)]);
        let all = [0, 1, 2];
        assert_eq!(run(&m, &all, 1, Some(1)), vec![(0, 1), (1, 2)]);
        assert_eq!(run(&m, &all, 2, Some(2)), vec![(0, 2)]);
        assert_eq!(run(&m, &all, 1, None), vec![(0, 1), (0, 2), (1, 2)]);
        assert_eq!(
            run(&m, &all, 0, Some(1)),
            vec![(0, 0), (0, 1), (1, 1), (1, 2), (2, 2)]
        );
        assert!(run(&m, &all, 3, None).is_empty());
    }

    #[test]
    fn test_closure_terminates_on_cycle() {
        let m = chain(&[(0, 1), (1, 2), (2, 0)]);
        let pairs = run(&m, &[0], 1, None);
        assert_eq!(pairs, vec![(0, 0), (0, 1), (0, 2)]);
    }

    #[test]
    fn test_exact_levels_below_min_on_cycle() {
        // 0 -> 1 -> 0: even hop counts end at the start node
        let m = chain(&[(0, 1), (1, 0)]);
        assert_eq!(run(&m, &[0], 2, Some(2)), vec![(0, 0)]);
        assert_eq!(run(&m, &[0], 3, Some(3)), vec![(0, 1)]);
    }

    #[test]
    fn test_empty_interval() {
        let m = chain(&[(0, 1)]);
        assert!(run(&m, &[0], 2, Some(1)).is_empty());
    }

    #[test]
    fn test_filter() {
        assert!(RelationFilter::Any.allows(RelationTypeId(7)));
        let only = RelationFilter::Types(vec![RelationTypeId(1)]);
        assert!(only.allows(RelationTypeId(1)));
        assert!(!only.allows(RelationTypeId(0)));
        assert!(!RelationFilter::Types(vec![]).allows(RelationTypeId(0)));
    }
}
