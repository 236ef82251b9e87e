//! Per-relationship-type adjacency
//!
//! Each relationship type owns one matrix: a sparse (source × destination)
//! table whose cells list the relationships of that type between the pair in
//! creation order. A cell that exists is a `true` entry of the boolean relation.

use super::relation::{Relation, Step};
use super::types::{EdgeId, NodeId};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

type Cells = FxHashMap<NodeId, BTreeMap<NodeId, Vec<EdgeId>>>;

#[derive(Debug, Clone, Default)]
pub struct AdjacencyMatrix {
    outgoing: Cells,
    incoming: Cells,
    edges: usize,
}

impl AdjacencyMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a relationship. Ids must arrive in creation order.
    pub fn insert(&mut self, source: NodeId, target: NodeId, edge: EdgeId) {
        self.outgoing
            .entry(source)
            .or_default()
            .entry(target)
            .or_default()
            .push(edge);
        self.incoming
            .entry(target)
            .or_default()
            .entry(source)
            .or_default()
            .push(edge);
        self.edges += 1;
    }

    pub fn remove(&mut self, source: NodeId, target: NodeId, edge: EdgeId) -> bool {
        let removed = remove_cell(&mut self.outgoing, source, target, edge);
        if removed {
            remove_cell(&mut self.incoming, target, source, edge);
            self.edges -= 1;
        }
        removed
    }

    pub fn contains(&self, source: NodeId, target: NodeId) -> bool {
        self.outgoing
            .get(&source)
            .map_or(false, |row| row.contains_key(&target))
    }

    /// Relationships from `source` to `target`, oldest first
    pub fn edges_between(&self, source: NodeId, target: NodeId) -> &[EdgeId] {
        self.outgoing
            .get(&source)
            .and_then(|row| row.get(&target))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Destinations of `source` with the relationships leading to each
    pub fn row(&self, source: NodeId) -> impl Iterator<Item = (NodeId, &[EdgeId])> + '_ {
        self.outgoing
            .get(&source)
            .into_iter()
            .flat_map(|row| row.iter().map(|(dst, edges)| (*dst, edges.as_slice())))
    }

    /// Sources pointing at `target` with the relationships leading from each
    pub fn column(&self, target: NodeId) -> impl Iterator<Item = (NodeId, &[EdgeId])> + '_ {
        self.incoming
            .get(&target)
            .into_iter()
            .flat_map(|col| col.iter().map(|(src, edges)| (*src, edges.as_slice())))
    }

    pub fn successors(&self, source: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.row(source).map(|(dst, _)| dst)
    }

    pub fn predecessors(&self, target: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.column(target).map(|(src, _)| src)
    }

    /// Number of relationships recorded
    pub fn edge_count(&self) -> usize {
        self.edges
    }

    /// Number of `true` cells
    pub fn pair_count(&self) -> usize {
        self.outgoing.values().map(BTreeMap::len).sum()
    }

    /// The boolean (source × destination) relation
    pub fn to_relation(&self) -> Relation {
        let mut relation = Relation::new();
        for (src, row) in &self.outgoing {
            for dst in row.keys() {
                relation.insert(*src, *dst);
            }
        }
        relation
    }
}

fn remove_cell(cells: &mut Cells, from: NodeId, to: NodeId, edge: EdgeId) -> bool {
    let Some(row) = cells.get_mut(&from) else {
        return false;
    };
    let Some(list) = row.get_mut(&to) else {
        return false;
    };
    let Some(pos) = list.iter().position(|e| *e == edge) else {
        return false;
    };
    list.remove(pos);
    if list.is_empty() {
        row.remove(&to);
        if row.is_empty() {
            cells.remove(&from);
        }
    }
    true
}

/// Direction a relationship pattern is walked in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// (a)-[]->(b)
    Outgoing,
    /// (a)<-[]-(b)
    Incoming,
    /// (a)-[]-(b), either orientation
    Both,
}

impl Direction {
    pub fn reverse(self) -> Self {
        match self {
            Direction::Outgoing => Direction::Incoming,
            Direction::Incoming => Direction::Outgoing,
            Direction::Both => Direction::Both,
        }
    }
}

/// A union of per-type matrices walked in one direction, computed on demand
#[derive(Debug, Clone)]
pub struct RelationView<'a> {
    matrices: Vec<&'a AdjacencyMatrix>,
    direction: Direction,
}

impl<'a> RelationView<'a> {
    pub fn new(matrices: Vec<&'a AdjacencyMatrix>, direction: Direction) -> Self {
        Self {
            matrices,
            direction,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.matrices.iter().all(|m| m.edge_count() == 0)
    }
}

impl Step for RelationView<'_> {
    fn successors(&self, node: NodeId, out: &mut Vec<NodeId>) {
        for matrix in &self.matrices {
            match self.direction {
                Direction::Outgoing => out.extend(matrix.successors(node)),
                Direction::Incoming => out.extend(matrix.predecessors(node)),
                Direction::Both => {
                    out.extend(matrix.successors(node));
                    out.extend(matrix.predecessors(node));
                }
            }
        }
    }
}
