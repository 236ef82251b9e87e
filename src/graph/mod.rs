//! Core graph storage
//!
//! This module implements the property graph data model with:
//! - Slot-allocated node and relationship records with tombstoned deletion
//! - Interned label, relationship-type and property names
//! - Per-relationship-type adjacency exposed as boolean relations
//! - Fixed and variable-length traversal by relation composition

pub mod adjacency;
pub mod edge;
pub mod event;
pub mod node;
pub mod property;
pub mod property_store;
pub mod relation;
pub mod schema;
pub mod store;
pub mod traversal;
pub mod types;

// Re-export main types
pub use adjacency::{AdjacencyMatrix, Direction, RelationView};
pub use edge::Edge;
pub use event::IndexEvent;
pub use node::Node;
pub use property::{PropertyMap, PropertyValue};
pub use property_store::PropertyStore;
pub use relation::{Relation, Step};
pub use schema::{SchemaKind, SchemaRegistry};
pub use store::{GraphError, GraphResult, GraphStore};
pub use traversal::{RelationFilter, TraversalSpec};
pub use types::{EdgeId, LabelId, NodeId, PropertyId, RelationTypeId};
