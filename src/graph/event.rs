//! Graph change events
//!
//! Every node mutation that can affect a secondary index is described by an
//! event and applied to the index manager before the mutating call returns.

use super::property::{PropertyMap, PropertyValue};
use super::types::{LabelId, NodeId, PropertyId};

#[derive(Debug, Clone)]
pub enum IndexEvent<'a> {
    NodeCreated {
        id: NodeId,
        labels: &'a [LabelId],
        properties: &'a PropertyMap,
    },
    NodeDeleted {
        id: NodeId,
        labels: &'a [LabelId],
        properties: &'a PropertyMap,
    },
    /// `None` on either side means the property was absent
    PropertySet {
        id: NodeId,
        labels: &'a [LabelId],
        key: PropertyId,
        old_value: Option<&'a PropertyValue>,
        new_value: Option<&'a PropertyValue>,
    },
}
