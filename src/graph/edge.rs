//! Relationship records
//!
//! Relationships are directed and carry exactly one relationship type. Several
//! relationships may share the same endpoints and type; each is a distinct
//! entity with its own id.

use super::property::{PropertyMap, PropertyValue};
use super::types::{EdgeId, NodeId, PropertyId, RelationTypeId};
use serde::{Deserialize, Serialize};

/// A relationship in the property graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub rel_type: RelationTypeId,
    pub properties: PropertyMap,
}

impl Edge {
    pub fn new(
        id: EdgeId,
        source: NodeId,
        target: NodeId,
        rel_type: RelationTypeId,
        properties: PropertyMap,
    ) -> Self {
        Edge {
            id,
            source,
            target,
            rel_type,
            properties,
        }
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

    /// Other endpoint when walked from `node`
    pub fn opposite(&self, node: NodeId) -> NodeId {
        if self.source == node {
            self.target
        } else {
            self.source
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Edge {}
