//! B-Tree based property index for equality lookups
//!
//! Nulls and NaN are never stored: neither can satisfy an equality predicate.

use crate::graph::{NodeId, PropertyValue};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Number wrapper with a total order; `-0.0` is folded into `0.0`
#[derive(Debug, Clone, Copy)]
pub struct OrderedNumber(f64);

impl OrderedNumber {
    fn new(n: f64) -> Option<Self> {
        if n.is_nan() {
            return None;
        }
        Some(OrderedNumber(if n == 0.0 { 0.0 } else { n }))
    }
}

impl PartialEq for OrderedNumber {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OrderedNumber {}

impl PartialOrd for OrderedNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Indexable form of a property value
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum IndexKey {
    Boolean(bool),
    Number(OrderedNumber),
    Text(String),
}

impl IndexKey {
    /// `None` for values no equality predicate can match
    pub fn from_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Null => None,
            PropertyValue::Boolean(b) => Some(IndexKey::Boolean(*b)),
            PropertyValue::Number(n) => OrderedNumber::new(*n).map(IndexKey::Number),
            PropertyValue::Text(s) => Some(IndexKey::Text(s.clone())),
        }
    }
}

/// Index for a specific property on a specific label
#[derive(Debug, Clone, Default)]
pub struct PropertyIndex {
    /// Value -> node ids, ascending (creation order)
    index: BTreeMap<IndexKey, BTreeSet<NodeId>>,
    entries: usize,
}

impl PropertyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, value: &PropertyValue, node_id: NodeId) -> bool {
        let Some(key) = IndexKey::from_value(value) else {
            return false;
        };
        let added = self.index.entry(key).or_default().insert(node_id);
        if added {
            self.entries += 1;
        }
        added
    }

    pub fn remove(&mut self, value: &PropertyValue, node_id: NodeId) -> bool {
        let Some(key) = IndexKey::from_value(value) else {
            return false;
        };
        let Some(nodes) = self.index.get_mut(&key) else {
            return false;
        };
        let removed = nodes.remove(&node_id);
        if nodes.is_empty() {
            self.index.remove(&key);
        }
        if removed {
            self.entries -= 1;
        }
        removed
    }

    /// Nodes holding `value`, in creation order
    pub fn get(&self, value: &PropertyValue) -> Vec<NodeId> {
        IndexKey::from_value(value)
            .and_then(|key| self.index.get(&key))
            .map(|nodes| nodes.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of (value, node) entries
    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    pub fn distinct_values(&self) -> usize {
        self.index.len()
    }
}
