//! Core type definitions for the graph store
//!
//! Entity ids are dense slot positions in the property store. Schema ids are
//! positions in the schema registry's name tables.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl NodeId {
    pub fn new(id: u64) -> Self {
        NodeId(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        NodeId(id)
    }
}

/// Unique identifier for a relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct EdgeId(pub u64);

impl EdgeId {
    pub fn new(id: u64) -> Self {
        EdgeId(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdgeId({})", self.0)
    }
}

impl From<u64> for EdgeId {
    fn from(id: u64) -> Self {
        EdgeId(id)
    }
}

macro_rules! schema_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            pub fn new(id: u32) -> Self {
                $name(id)
            }

            pub fn as_u32(&self) -> u32 {
                self.0
            }

            pub fn index(&self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<u32> for $name {
            fn from(id: u32) -> Self {
                $name(id)
            }
        }
    };
}

schema_id!(
    /// Interned node label (e.g., "Person")
    LabelId
);

schema_id!(
    /// Interned relationship type (e.g., "KNOWS")
    RelationTypeId
);

schema_id!(
    /// Interned property key
    PropertyId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id() {
        let id1 = NodeId::new(42);
        let id2 = NodeId::from(42);
        assert_eq!(id1, id2);
        assert_eq!(id1.as_u64(), 42);
        assert_eq!(id1.to_string(), "NodeId(42)");
    }

    #[test]
    fn test_edge_id() {
        let id = EdgeId::new(7);
        assert_eq!(id.as_u64(), 7);
        assert_eq!(id.to_string(), "EdgeId(7)");
    }

    #[test]
    fn test_schema_ids() {
        let label = LabelId::new(3);
        assert_eq!(label.index(), 3);
        assert_eq!(label.to_string(), "LabelId(3)");
        assert_eq!(RelationTypeId::from(1).as_u32(), 1);
        assert!(PropertyId(1) < PropertyId(2));
    }
}
