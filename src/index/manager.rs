//! Manager for property indices
//!
//! Handles creation, deletion, access and maintenance of (label, property)
//! indices. Indices hold node ids only; values are read from the graph store.

use super::property_index::PropertyIndex;
use crate::graph::{IndexEvent, LabelId, Node, NodeId, PropertyId, PropertyValue};
use indexmap::IndexMap;

/// Key for identifying a property index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyIndexKey {
    pub label: LabelId,
    pub property: PropertyId,
}

impl PropertyIndexKey {
    pub fn new(label: LabelId, property: PropertyId) -> Self {
        Self { label, property }
    }
}

/// Manager for all property indices, in creation order
#[derive(Debug, Clone, Default)]
pub struct IndexManager {
    indices: IndexMap<PropertyIndexKey, PropertyIndex>,
}

impl IndexManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an index and backfill it from `nodes`.
    ///
    /// Returns `false` if the index already existed, in which case nothing changes.
    pub fn create_index<'a>(
        &mut self,
        label: LabelId,
        property: PropertyId,
        nodes: impl IntoIterator<Item = &'a Node>,
    ) -> bool {
        let key = PropertyIndexKey::new(label, property);
        if self.indices.contains_key(&key) {
            return false;
        }

        let mut index = PropertyIndex::new();
        for node in nodes {
            if !node.has_label(label) {
                continue;
            }
            if let Some(value) = node.get_property(property) {
                index.insert(value, node.id);
            }
        }
        self.indices.insert(key, index);
        true
    }

    /// Drop an index
    pub fn drop_index(&mut self, label: LabelId, property: PropertyId) -> bool {
        self.indices
            .shift_remove(&PropertyIndexKey::new(label, property))
            .is_some()
    }

    /// Check if an index exists
    pub fn has_index(&self, label: LabelId, property: PropertyId) -> bool {
        self.indices.contains_key(&PropertyIndexKey::new(label, property))
    }

    /// Get index for querying
    pub fn get_index(&self, label: LabelId, property: PropertyId) -> Option<&PropertyIndex> {
        self.indices.get(&PropertyIndexKey::new(label, property))
    }

    /// Nodes with `label` whose `property` equals `value`, in creation order.
    ///
    /// `None` when no such index exists; the caller falls back to a label scan.
    pub fn point_lookup(
        &self,
        label: LabelId,
        property: PropertyId,
        value: &PropertyValue,
    ) -> Option<Vec<NodeId>> {
        self.get_index(label, property).map(|index| index.get(value))
    }

    /// Index definitions in creation order
    pub fn definitions(&self) -> Vec<PropertyIndexKey> {
        self.indices.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Apply a node mutation to every index it touches
    pub fn handle_event(&mut self, event: &IndexEvent<'_>) {
        if self.indices.is_empty() {
            return;
        }

        match event {
            IndexEvent::NodeCreated {
                id,
                labels,
                properties,
            } => {
                for (key, value) in properties.iter() {
                    for label in labels.iter() {
                        self.index_insert(*label, *key, value, *id);
                    }
                }
            }
            IndexEvent::NodeDeleted {
                id,
                labels,
                properties,
            } => {
                for (key, value) in properties.iter() {
                    for label in labels.iter() {
                        self.index_remove(*label, *key, value, *id);
                    }
                }
            }
            IndexEvent::PropertySet {
                id,
                labels,
                key,
                old_value,
                new_value,
            } => {
                for label in labels.iter() {
                    if let Some(old) = old_value {
                        self.index_remove(*label, *key, old, *id);
                    }
                    if let Some(new) = new_value {
                        self.index_insert(*label, *key, new, *id);
                    }
                }
            }
        }
    }

    fn index_insert(&mut self, label: LabelId, property: PropertyId, value: &PropertyValue, node_id: NodeId) {
        if let Some(index) = self.indices.get_mut(&PropertyIndexKey::new(label, property)) {
            index.insert(value, node_id);
        }
    }

    fn index_remove(&mut self, label: LabelId, property: PropertyId, value: &PropertyValue, node_id: NodeId) {
        if let Some(index) = self.indices.get_mut(&PropertyIndexKey::new(label, property)) {
            index.remove(value, node_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::PropertyMap;

    fn node(id: u64, labels: &[u32], props: &[(u32, PropertyValue)]) -> Node {
        let properties: PropertyMap = props
            .iter()
            .map(|(k, v)| (PropertyId(*k), v.clone()))
            .collect();
        Node::new(NodeId(id), labels.iter().map(|l| LabelId(*l)), properties)
    }

    #[test]
    fn test_create_index_backfills() {
        let nodes = vec![
            node(0, &[0], &[(0, "a".into())]),
            node(1, &[1], &[(0, "a".into())]),
            node(2, &[0], &[(0, "a".into())]),
            node(3, &[0], &[]),
        ];
        let mut manager = IndexManager::new();
        assert!(manager.create_index(LabelId(0), PropertyId(0), &nodes));
        assert!(!manager.create_index(LabelId(0), PropertyId(0), &nodes));
        assert_eq!(
            manager.point_lookup(LabelId(0), PropertyId(0), &"a".into()),
            Some(vec![NodeId(0), NodeId(2)])
        );
        assert_eq!(manager.point_lookup(LabelId(1), PropertyId(0), &"a".into()), None);
    }

    #[test]
    fn test_events_keep_index_current() {
        let mut manager = IndexManager::new();
        manager.create_index(LabelId(0), PropertyId(0), std::iter::empty());

        let n = node(5, &[0], &[(0, PropertyValue::from(1))]);
        manager.handle_event(&IndexEvent::NodeCreated {
            id: n.id,
            labels: &n.labels,
            properties: &n.properties,
        });
        assert_eq!(
            manager.point_lookup(LabelId(0), PropertyId(0), &1.into()),
            Some(vec![NodeId(5)])
        );

        let old = PropertyValue::from(1);
        let new = PropertyValue::from(2);
        manager.handle_event(&IndexEvent::PropertySet {
            id: n.id,
            labels: &n.labels,
            key: PropertyId(0),
            old_value: Some(&old),
            new_value: Some(&new),
        });
        assert_eq!(manager.point_lookup(LabelId(0), PropertyId(0), &1.into()), Some(vec![]));
        assert_eq!(
            manager.point_lookup(LabelId(0), PropertyId(0), &2.into()),
            Some(vec![NodeId(5)])
        );

        let mut updated = n.clone();
        updated.set_property(PropertyId(0), 2);
        manager.handle_event(&IndexEvent::NodeDeleted {
            id: updated.id,
            labels: &updated.labels,
            properties: &updated.properties,
        });
        assert_eq!(manager.point_lookup(LabelId(0), PropertyId(0), &2.into()), Some(vec![]));
    }

    #[test]
    fn test_definitions_and_drop() {
        let mut manager = IndexManager::new();
        manager.create_index(LabelId(2), PropertyId(1), std::iter::empty());
        manager.create_index(LabelId(0), PropertyId(3), std::iter::empty());
        assert_eq!(
            manager.definitions(),
            vec![
                PropertyIndexKey::new(LabelId(2), PropertyId(1)),
                PropertyIndexKey::new(LabelId(0), PropertyId(3)),
            ]
        );
        assert!(manager.drop_index(LabelId(2), PropertyId(1)));
        assert!(!manager.drop_index(LabelId(2), PropertyId(1)));
        assert!(!manager.has_index(LabelId(2), PropertyId(1)));
        assert_eq!(manager.len(), 1);
    }
}
