//! Node records
//!
//! A node carries a set of interned label ids (immutable after creation) and a
//! property list keyed by interned property id.

use super::property::{PropertyMap, PropertyValue};
use super::types::{LabelId, NodeId, PropertyId};
use serde::{Deserialize, Serialize};

/// A node in the property graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier for this node
    pub id: NodeId,

    /// Sorted, de-duplicated label ids
    pub labels: Vec<LabelId>,

    /// Properties associated with this node
    pub properties: PropertyMap,
}

impl Node {
    /// Create a new node with labels and properties
    pub fn new(id: NodeId, labels: impl IntoIterator<Item = LabelId>, properties: PropertyMap) -> Self {
        let mut labels: Vec<LabelId> = labels.into_iter().collect();
        labels.sort_unstable();
        labels.dedup();

        Node {
            id,
            labels,
            properties,
        }
    }

    pub fn has_label(&self, label: LabelId) -> bool {
        self.labels.binary_search(&label).is_ok()
    }

    pub fn set_property(&mut self, key: PropertyId, value: impl Into<PropertyValue>) -> Option<PropertyValue> {
        self.properties.insert(key, value.into())
    }

    pub fn get_property(&self, key: PropertyId) -> Option<&PropertyValue> {
        self.properties.get(&key)
    }

    pub fn remove_property(&mut self, key: PropertyId) -> Option<PropertyValue> {
        self.properties.remove(&key)
    }

    pub fn has_property(&self, key: PropertyId) -> bool {
        self.properties.contains_key(&key)
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}
