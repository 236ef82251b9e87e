//! In-memory graph storage
//!
//! The store exclusively owns every node and relationship record. Records live
//! in slot arenas addressed by id; adjacency is kept per relationship type;
//! label membership and secondary indices hold ids only.
//!
//! Every public mutation validates its inputs before touching any structure,
//! so a failed call leaves the store unchanged.

use super::adjacency::{AdjacencyMatrix, Direction, RelationView};
use super::edge::Edge;
use super::event::IndexEvent;
use super::node::Node;
use super::property::{PropertyMap, PropertyValue};
use super::property_store::PropertyStore;
use super::relation::Relation;
use super::schema::SchemaRegistry;
use super::traversal::{reachable_pairs, RelationFilter, TraversalSpec};
use super::types::{EdgeId, LabelId, NodeId, PropertyId, RelationTypeId};
use crate::config::TraversalConfig;
use crate::index::IndexManager;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur during graph operations
#[derive(Error, Debug, PartialEq)]
pub enum GraphError {
    #[error("Node {0} not found")]
    NodeNotFound(NodeId),

    #[error("Edge {0} not found")]
    EdgeNotFound(EdgeId),

    #[error("Invalid edge: source node {0} does not exist")]
    InvalidEdgeSource(NodeId),

    #[error("Invalid edge: target node {0} does not exist")]
    InvalidEdgeTarget(NodeId),

    #[error("Slot {0} is not allocated or has been tombstoned")]
    OutOfRange(u64),

    #[error("Schema violation: {0}")]
    SchemaViolation(String),
}

impl GraphError {
    /// Reference to a node or relationship that does not exist
    pub fn is_unknown_entity(&self) -> bool {
        matches!(
            self,
            GraphError::NodeNotFound(_)
                | GraphError::EdgeNotFound(_)
                | GraphError::InvalidEdgeSource(_)
                | GraphError::InvalidEdgeTarget(_)
        )
    }
}

pub type GraphResult<T> = Result<T, GraphError>;

/// In-memory graph storage
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    schema: SchemaRegistry,

    nodes: PropertyStore<Node>,

    edges: PropertyStore<Edge>,

    /// Live node ids per label, indexed by `LabelId`
    label_index: Vec<BTreeSet<NodeId>>,

    /// One matrix per relationship type, indexed by `RelationTypeId`
    adjacency: Vec<AdjacencyMatrix>,

    indices: IndexManager,

    traversal: TraversalConfig,
}

impl GraphStore {
    /// Create a new empty graph store
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(traversal: TraversalConfig) -> Self {
        Self {
            traversal,
            ..Self::default()
        }
    }

    /// Empty store over an already populated schema (snapshot restore)
    pub(crate) fn with_schema(schema: SchemaRegistry, traversal: TraversalConfig) -> Self {
        Self {
            schema,
            traversal,
            ..Self::default()
        }
    }

    pub fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    pub fn indices(&self) -> &IndexManager {
        &self.indices
    }

    pub fn traversal_config(&self) -> &TraversalConfig {
        &self.traversal
    }

    // ============================================================
    // Nodes
    // ============================================================

    /// Create a node, interning label and property names on first use
    pub fn create_node<L, P, K, V>(&mut self, labels: L, properties: P) -> NodeId
    where
        L: IntoIterator,
        L::Item: AsRef<str>,
        P: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<PropertyValue>,
    {
        let labels: Vec<LabelId> = labels
            .into_iter()
            .map(|l| self.schema.intern_label(l.as_ref()))
            .collect();
        let properties = self.intern_properties(properties);
        self.insert_node(labels, properties)
    }

    /// Create a node from already interned ids
    pub fn create_node_with_ids(
        &mut self,
        labels: Vec<LabelId>,
        properties: PropertyMap,
    ) -> GraphResult<NodeId> {
        self.check_labels(&labels)?;
        self.check_properties(&properties)?;
        Ok(self.insert_node(labels, properties))
    }

    fn insert_node(&mut self, labels: Vec<LabelId>, properties: PropertyMap) -> NodeId {
        let id = NodeId(self.nodes.capacity() as u64);
        let node = Node::new(id, labels, properties);

        for label in &node.labels {
            self.label_members_mut(*label).insert(id);
        }
        self.indices.handle_event(&IndexEvent::NodeCreated {
            id,
            labels: &node.labels,
            properties: &node.properties,
        });

        self.nodes.insert(node);
        id
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.read(id.0).ok()
    }

    /// Like [`get_node`](Self::get_node) but reports unknown ids as an error
    pub fn node(&self, id: NodeId) -> GraphResult<&Node> {
        self.nodes.read(id.0).map_err(|_| GraphError::NodeNotFound(id))
    }

    pub fn has_node(&self, id: NodeId) -> bool {
        self.nodes.is_live(id.0)
    }

    /// Property of a node by name; `None` if the node or property is absent
    pub fn node_property(&self, id: NodeId, key: &str) -> Option<&PropertyValue> {
        let key = self.schema.property_id(key)?;
        self.get_node(id)?.get_property(key)
    }

    /// Set a node property, returning the previous value
    pub fn set_node_property(
        &mut self,
        id: NodeId,
        key: &str,
        value: impl Into<PropertyValue>,
    ) -> GraphResult<Option<PropertyValue>> {
        if !self.nodes.is_live(id.0) {
            return Err(GraphError::NodeNotFound(id));
        }
        let key = self.schema.intern_property(key);
        self.set_node_property_by_id(id, key, value.into())
    }

    pub fn set_node_property_by_id(
        &mut self,
        id: NodeId,
        key: PropertyId,
        value: PropertyValue,
    ) -> GraphResult<Option<PropertyValue>> {
        if self.schema.property_name(key).is_none() {
            return Err(GraphError::SchemaViolation(format!("unknown property id {}", key.0)));
        }
        let node = self
            .nodes
            .read_mut(id.0)
            .map_err(|_| GraphError::NodeNotFound(id))?;
        let old_value = node.set_property(key, value);

        self.indices.handle_event(&IndexEvent::PropertySet {
            id,
            labels: &node.labels,
            key,
            old_value: old_value.as_ref(),
            new_value: node.properties.get(&key),
        });
        Ok(old_value)
    }

    /// Remove a node property, returning the value it had
    pub fn remove_node_property(&mut self, id: NodeId, key: &str) -> GraphResult<Option<PropertyValue>> {
        let node = self
            .nodes
            .read_mut(id.0)
            .map_err(|_| GraphError::NodeNotFound(id))?;
        let Some(key) = self.schema.property_id(key) else {
            return Ok(None);
        };
        let old_value = node.remove_property(key);

        if old_value.is_some() {
            self.indices.handle_event(&IndexEvent::PropertySet {
                id,
                labels: &node.labels,
                key,
                old_value: old_value.as_ref(),
                new_value: None,
            });
        }
        Ok(old_value)
    }

    /// Delete a node and every relationship incident to it
    pub fn delete_node(&mut self, id: NodeId) -> GraphResult<Node> {
        if !self.nodes.is_live(id.0) {
            return Err(GraphError::NodeNotFound(id));
        }

        let incident = self.incident_edges(id);
        for edge_id in &incident {
            self.unlink_edge(*edge_id);
        }

        let node = self
            .nodes
            .free(id.0)
            .ok()
            .flatten()
            .ok_or(GraphError::NodeNotFound(id))?;

        for label in &node.labels {
            self.label_members_mut(*label).remove(&id);
        }
        self.indices.handle_event(&IndexEvent::NodeDeleted {
            id,
            labels: &node.labels,
            properties: &node.properties,
        });

        debug!("Deleted {} with {} incident relationships", id, incident.len());
        Ok(node)
    }

    /// Live nodes in creation order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.iter().map(|(_, node)| node)
    }

    /// Live node ids holding `label`, in creation order
    pub fn nodes_with_label(&self, label: LabelId) -> impl Iterator<Item = NodeId> + '_ {
        self.label_index
            .get(label.index())
            .into_iter()
            .flat_map(|members| members.iter().copied())
    }

    pub fn label_cardinality(&self, label: LabelId) -> usize {
        self.label_index.get(label.index()).map_or(0, BTreeSet::len)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Node slots ever allocated, tombstones included
    pub fn node_capacity(&self) -> usize {
        self.nodes.capacity()
    }

    // ============================================================
    // Relationships
    // ============================================================

    /// Create a relationship, interning the type and property names on first use
    pub fn create_relationship<P, K, V>(
        &mut self,
        source: NodeId,
        target: NodeId,
        rel_type: &str,
        properties: P,
    ) -> GraphResult<EdgeId>
    where
        P: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<PropertyValue>,
    {
        self.check_endpoints(source, target)?;
        let rel_type = self.schema.intern_relation_type(rel_type);
        let properties = self.intern_properties(properties);
        Ok(self.insert_edge(source, target, rel_type, properties))
    }

    /// Create a relationship from already interned ids
    pub fn create_relationship_with_ids(
        &mut self,
        source: NodeId,
        target: NodeId,
        rel_type: RelationTypeId,
        properties: PropertyMap,
    ) -> GraphResult<EdgeId> {
        self.check_endpoints(source, target)?;
        if self.schema.relation_type_name(rel_type).is_none() {
            return Err(GraphError::SchemaViolation(format!(
                "unknown relationship type id {}",
                rel_type.0
            )));
        }
        self.check_properties(&properties)?;
        Ok(self.insert_edge(source, target, rel_type, properties))
    }

    fn insert_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        rel_type: RelationTypeId,
        properties: PropertyMap,
    ) -> EdgeId {
        let id = EdgeId(self.edges.capacity() as u64);
        self.edges
            .insert(Edge::new(id, source, target, rel_type, properties));
        self.matrix_mut(rel_type).insert(source, target, id);
        id
    }

    pub fn get_edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.read(id.0).ok()
    }

    pub fn edge(&self, id: EdgeId) -> GraphResult<&Edge> {
        self.edges.read(id.0).map_err(|_| GraphError::EdgeNotFound(id))
    }

    pub fn has_edge(&self, id: EdgeId) -> bool {
        self.edges.is_live(id.0)
    }

    pub fn edge_property(&self, id: EdgeId, key: &str) -> Option<&PropertyValue> {
        let key = self.schema.property_id(key)?;
        self.get_edge(id)?.get_property(key)
    }

    pub fn set_edge_property(
        &mut self,
        id: EdgeId,
        key: &str,
        value: impl Into<PropertyValue>,
    ) -> GraphResult<Option<PropertyValue>> {
        if !self.edges.is_live(id.0) {
            return Err(GraphError::EdgeNotFound(id));
        }
        let key = self.schema.intern_property(key);
        let edge = self.edges.read_mut(id.0)?;
        Ok(edge.set_property(key, value))
    }

    /// Delete a single relationship; its endpoints are untouched
    pub fn delete_relationship(&mut self, id: EdgeId) -> GraphResult<Edge> {
        self.unlink_edge(id).ok_or(GraphError::EdgeNotFound(id))
    }

    /// Live relationships in creation order
    pub fn edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.iter().map(|(_, edge)| edge)
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Relationship slots ever allocated, tombstones included
    pub fn edge_capacity(&self) -> usize {
        self.edges.capacity()
    }

    fn unlink_edge(&mut self, id: EdgeId) -> Option<Edge> {
        let edge = self.edges.free(id.0).ok().flatten()?;
        if let Some(matrix) = self.adjacency.get_mut(edge.rel_type.index()) {
            matrix.remove(edge.source, edge.target, edge.id);
        }
        Some(edge)
    }

    /// Every relationship touching `node`, ascending, self-loops once
    fn incident_edges(&self, node: NodeId) -> Vec<EdgeId> {
        let mut edges: Vec<EdgeId> = self
            .edges_of(node, &RelationFilter::Any, Direction::Both)
            .into_iter()
            .map(|(edge, _)| edge)
            .collect();
        edges.dedup();
        edges
    }

    // ============================================================
    // Adjacency and traversal
    // ============================================================

    /// The matrix of one relationship type
    pub fn adjacency(&self, rel_type: RelationTypeId) -> Option<&AdjacencyMatrix> {
        self.adjacency.get(rel_type.index())
    }

    /// Boolean (source × destination) relation of one relationship type
    pub fn relation(&self, rel_type: RelationTypeId) -> Relation {
        self.adjacency(rel_type)
            .map(AdjacencyMatrix::to_relation)
            .unwrap_or_default()
    }

    /// Union of every per-type relation, built on request
    pub fn any_type_relation(&self) -> Relation {
        let mut union = Relation::new();
        for matrix in &self.adjacency {
            union.union_with(&matrix.to_relation());
        }
        union
    }

    /// Lazily unioned view over the matrices `filter` selects
    pub fn relation_view(&self, filter: &RelationFilter, direction: Direction) -> RelationView<'_> {
        let matrices = match filter {
            RelationFilter::Any => self.adjacency.iter().collect(),
            RelationFilter::Types(types) => {
                let mut types = types.clone();
                types.sort_unstable();
                types.dedup();
                types
                    .iter()
                    .filter_map(|t| self.adjacency.get(t.index()))
                    .collect()
            }
        };
        RelationView::new(matrices, direction)
    }

    /// Relationships leaving `node` in `direction`, with the node at the
    /// other end, ordered by relationship id. A self-loop walked in both
    /// directions appears twice.
    pub fn edges_of(
        &self,
        node: NodeId,
        filter: &RelationFilter,
        direction: Direction,
    ) -> Vec<(EdgeId, NodeId)> {
        let mut found = Vec::new();
        for (rel_type, matrix) in self.adjacency.iter().enumerate() {
            if !filter.allows(RelationTypeId(rel_type as u32)) {
                continue;
            }
            if matches!(direction, Direction::Outgoing | Direction::Both) {
                for (dst, edges) in matrix.row(node) {
                    found.extend(edges.iter().map(|e| (*e, dst)));
                }
            }
            if matches!(direction, Direction::Incoming | Direction::Both) {
                for (src, edges) in matrix.column(node) {
                    found.extend(edges.iter().map(|e| (*e, src)));
                }
            }
        }
        found.sort_unstable();
        found
    }

    /// Distinct neighbours of `node` in `direction`, ascending
    pub fn neighbors(&self, node: NodeId, filter: &RelationFilter, direction: Direction) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self
            .edges_of(node, filter, direction)
            .into_iter()
            .map(|(_, other)| other)
            .collect();
        nodes.sort_unstable();
        nodes.dedup();
        nodes
    }

    /// Compute the (start, end) pairs reachable from `sources` under `spec`.
    ///
    /// Ids that are not live nodes are ignored. The result is unordered.
    pub fn traverse(&self, sources: impl IntoIterator<Item = NodeId>, spec: &TraversalSpec) -> Relation {
        let sources: Vec<NodeId> = sources.into_iter().filter(|id| self.has_node(*id)).collect();
        let view = self.relation_view(&spec.types, spec.direction);
        reachable_pairs(sources, &view, spec, self.traversal.parallel_threshold)
    }

    // ============================================================
    // Indices
    // ============================================================

    /// Create an index on (label, property), interning both names.
    ///
    /// Returns `false` if the index already existed.
    pub fn create_index(&mut self, label: &str, property: &str) -> bool {
        let label = self.schema.intern_label(label);
        let property = self.schema.intern_property(property);
        self.build_index(label, property)
    }

    /// Create an index from interned ids; both must already be registered
    pub fn create_index_by_id(&mut self, label: LabelId, property: PropertyId) -> GraphResult<bool> {
        self.check_labels(&[label])?;
        if self.schema.property_name(property).is_none() {
            return Err(GraphError::SchemaViolation(format!(
                "cannot index unknown property id {}",
                property.0
            )));
        }
        Ok(self.build_index(label, property))
    }

    fn build_index(&mut self, label: LabelId, property: PropertyId) -> bool {
        let members = self.label_index.get(label.index());
        let nodes = members
            .into_iter()
            .flat_map(|ids| ids.iter())
            .filter_map(|id| self.nodes.read(id.0).ok());
        let created = self.indices.create_index(label, property, nodes);

        if created {
            let entries = self
                .indices
                .get_index(label, property)
                .map_or(0, |index| index.len());
            info!(
                "Created index on :{}({}) with {} entries",
                self.schema.label_name(label).unwrap_or("?"),
                self.schema.property_name(property).unwrap_or("?"),
                entries
            );
        }
        created
    }

    pub fn drop_index(&mut self, label: &str, property: &str) -> bool {
        match (self.schema.label_id(label), self.schema.property_id(property)) {
            (Some(label), Some(property)) => self.indices.drop_index(label, property),
            _ => false,
        }
    }

    pub fn has_index(&self, label: LabelId, property: PropertyId) -> bool {
        self.indices.has_index(label, property)
    }

    /// Index point lookup; `None` when no index covers (label, property)
    pub fn point_lookup(
        &self,
        label: LabelId,
        property: PropertyId,
        value: &PropertyValue,
    ) -> Option<Vec<NodeId>> {
        self.indices.point_lookup(label, property, value)
    }

    // ============================================================
    // Snapshot restore
    // ============================================================

    /// Every node slot in id order, `None` for tombstones
    pub(crate) fn node_slots(&self) -> impl Iterator<Item = Option<&Node>> + '_ {
        self.nodes.slots()
    }

    /// Every relationship slot in id order, `None` for tombstones
    pub(crate) fn edge_slots(&self) -> impl Iterator<Item = Option<&Edge>> + '_ {
        self.edges.slots()
    }

    /// Append a node slot with the next id; `None` restores a tombstone
    pub(crate) fn restore_node(&mut self, entry: Option<(Vec<LabelId>, PropertyMap)>) -> NodeId {
        match entry {
            Some((labels, properties)) => self.insert_node(labels, properties),
            None => NodeId(self.nodes.push_tombstone()),
        }
    }

    /// Append a relationship slot with the next id; endpoints must be live
    pub(crate) fn restore_edge(
        &mut self,
        entry: Option<(NodeId, NodeId, RelationTypeId, PropertyMap)>,
    ) -> GraphResult<EdgeId> {
        match entry {
            Some((source, target, rel_type, properties)) => {
                self.check_endpoints(source, target)?;
                Ok(self.insert_edge(source, target, rel_type, properties))
            }
            None => Ok(EdgeId(self.edges.push_tombstone())),
        }
    }

    // ============================================================
    // Helpers
    // ============================================================

    fn intern_properties<P, K, V>(&mut self, properties: P) -> PropertyMap
    where
        P: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<PropertyValue>,
    {
        properties
            .into_iter()
            .map(|(k, v)| (self.schema.intern_property(k.as_ref()), v.into()))
            .collect()
    }

    fn check_endpoints(&self, source: NodeId, target: NodeId) -> GraphResult<()> {
        if !self.has_node(source) {
            return Err(GraphError::InvalidEdgeSource(source));
        }
        if !self.has_node(target) {
            return Err(GraphError::InvalidEdgeTarget(target));
        }
        Ok(())
    }

    fn check_labels(&self, labels: &[LabelId]) -> GraphResult<()> {
        match labels.iter().find(|l| self.schema.label_name(**l).is_none()) {
            Some(label) => Err(GraphError::SchemaViolation(format!("unknown label id {}", label.0))),
            None => Ok(()),
        }
    }

    fn check_properties(&self, properties: &PropertyMap) -> GraphResult<()> {
        match properties.keys().find(|k| self.schema.property_name(**k).is_none()) {
            Some(key) => Err(GraphError::SchemaViolation(format!("unknown property id {}", key.0))),
            None => Ok(()),
        }
    }

    fn label_members_mut(&mut self, label: LabelId) -> &mut BTreeSet<NodeId> {
        let idx = label.index();
        if self.label_index.len() <= idx {
            self.label_index.resize_with(idx + 1, BTreeSet::new);
        }
        &mut self.label_index[idx]
    }

    fn matrix_mut(&mut self, rel_type: RelationTypeId) -> &mut AdjacencyMatrix {
        let idx = rel_type.index();
        if self.adjacency.len() <= idx {
            self.adjacency.resize_with(idx + 1, AdjacencyMatrix::new);
        }
        &mut self.adjacency[idx]
    }
}
