//! Samyama graph core
//!
//! An embedded property-graph engine: typed nodes and relationships in
//! slot-allocated storage, per-type adjacency relations composed for
//! variable-length traversal, (label, property) equality indices, a pattern
//! planner with a pull-based executor, and a versioned snapshot codec.
//!
//! Textual query parsing is not part of this crate. Hosts build a
//! [`query::ast::Query`] and hand it to a [`QueryEngine`]:
//!
//! ```
//! use samyama_core::query::ast::{EdgePattern, NodePattern, PathPattern, Query};
//! use samyama_core::{GraphStore, QueryEngine};
//!
//! let mut store = GraphStore::new();
//! let a = store.create_node(["Person"], [("name", "Alice")]);
//! let b = store.create_node(["Person"], [("name", "Bob")]);
//! store.create_relationship(a, b, "KNOWS", [("since", 2020.0)]).unwrap();
//!
//! let query = Query::from_path(
//!     PathPattern::new(NodePattern::new("a").with_label("Person"))
//!         .then(EdgePattern::outgoing().with_type("KNOWS"), NodePattern::new("b")),
//! );
//! let rows = QueryEngine::new().execute(&query, &store).unwrap();
//! assert_eq!(rows.len(), 1);
//! ```
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod graph;
pub mod index;
pub mod query;
pub mod snapshot;

// Re-export main types for convenience
pub use config::{ConfigError, EngineConfig, SnapshotConfig, TraversalConfig};
pub use error::{Error, ErrorKind, Result};
pub use graph::{
    Direction, Edge, EdgeId, GraphError, GraphResult, GraphStore, LabelId, Node, NodeId, PropertyId,
    PropertyMap, PropertyValue, RelationTypeId,
};
pub use index::IndexManager;
pub use query::{
    ExecutionError, ExecutionPlan, ExecutionResult, ParseError, Query, QueryEngine, RecordBatch, Value,
};
pub use snapshot::{CodecError, CodecResult};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn version() -> &'static str {
    VERSION
}
