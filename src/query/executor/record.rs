//! Record structures for query execution
//!
//! Records flow through the Volcano iterator pipeline. Nodes and
//! relationships travel as ids; their data stays in the graph store.

use crate::graph::{EdgeId, GraphStore, NodeId, PropertyValue};
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// A single record flowing through the query pipeline
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    /// Variable bindings (variable name -> value), in binding order
    bindings: IndexMap<String, Value>,
}

/// Value types that can be bound to variables
#[derive(Debug, Clone)]
pub enum Value {
    /// Reference to a live node
    Node(NodeId),
    /// Reference to a live relationship
    Edge(EdgeId),
    /// A non-null property value
    Property(PropertyValue),
    /// Null
    Null,
}

// Structural equality: the grouping and DISTINCT notion of "same value".
// Predicate equality with null semantics lives in the evaluator.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Node(a), Value::Node(b)) => a == b,
            (Value::Edge(a), Value::Edge(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Property(a), Value::Property(b)) => match (a, b) {
                (PropertyValue::Number(x), PropertyValue::Number(y)) => number_bits(*x) == number_bits(*y),
                _ => a == b,
            },
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Node(id) => id.hash(state),
            Value::Edge(id) => id.hash(state),
            Value::Null => {}
            Value::Property(prop) => {
                std::mem::discriminant(prop).hash(state);
                match prop {
                    PropertyValue::Null => {}
                    PropertyValue::Boolean(b) => b.hash(state),
                    PropertyValue::Number(n) => number_bits(*n).hash(state),
                    PropertyValue::Text(s) => s.hash(state),
                }
            }
        }
    }
}

/// -0.0 and 0.0 are one value, as are all NaNs
fn number_bits(n: f64) -> u64 {
    if n == 0.0 {
        0
    } else if n.is_nan() {
        f64::NAN.to_bits()
    } else {
        n.to_bits()
    }
}

impl Value {
    /// Wrap a property value, mapping a stored null to [`Value::Null`]
    pub fn from_property(value: PropertyValue) -> Self {
        if value.is_null() {
            Value::Null
        } else {
            Value::Property(value)
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn node_id(&self) -> Option<NodeId> {
        match self {
            Value::Node(id) => Some(*id),
            _ => None,
        }
    }

    pub fn edge_id(&self) -> Option<EdgeId> {
        match self {
            Value::Edge(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_property(&self) -> Option<&PropertyValue> {
        match self {
            Value::Property(p) => Some(p),
            _ => None,
        }
    }

    /// Collapse to a property value; nodes and relationships have none
    pub fn to_property(&self) -> PropertyValue {
        match self {
            Value::Property(p) => p.clone(),
            _ => PropertyValue::Null,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Node(_) => "Node",
            Value::Edge(_) => "Relationship",
            Value::Property(p) => p.type_name(),
            Value::Null => "Null",
        }
    }

    /// Total order for ORDER BY: nodes, relationships, properties, nulls last
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        fn rank(v: &Value) -> u8 {
            match v {
                Value::Node(_) => 0,
                Value::Edge(_) => 1,
                Value::Property(_) => 2,
                Value::Null => 3,
            }
        }

        match (self, other) {
            (Value::Node(a), Value::Node(b)) => a.cmp(b),
            (Value::Edge(a), Value::Edge(b)) => a.cmp(b),
            (Value::Property(a), Value::Property(b)) => a.sort_cmp(b),
            _ => rank(self).cmp(&rank(other)),
        }
    }

    /// Render for hosts. Nodes and relationships expand to their stored data.
    pub fn to_json(&self, store: &GraphStore) -> serde_json::Value {
        let schema = store.schema();
        let properties = |props: &crate::graph::PropertyMap| {
            let mut map = serde_json::Map::new();
            for (key, value) in props {
                let name = schema.property_name(*key).unwrap_or_default().to_string();
                map.insert(name, value.to_json());
            }
            serde_json::Value::Object(map)
        };

        match self {
            Value::Node(id) => match store.get_node(*id) {
                Some(node) => {
                    let labels: Vec<&str> = node
                        .labels
                        .iter()
                        .filter_map(|l| schema.label_name(*l))
                        .collect();
                    serde_json::json!({
                        "id": id.as_u64(),
                        "labels": labels,
                        "properties": properties(&node.properties),
                    })
                }
                None => serde_json::Value::Null,
            },
            Value::Edge(id) => match store.get_edge(*id) {
                Some(edge) => serde_json::json!({
                    "id": id.as_u64(),
                    "type": schema.relation_type_name(edge.rel_type),
                    "source": edge.source.as_u64(),
                    "target": edge.target.as_u64(),
                    "properties": properties(&edge.properties),
                }),
                None => serde_json::Value::Null,
            },
            Value::Property(p) => p.to_json(),
            Value::Null => serde_json::Value::Null,
        }
    }
}

impl From<PropertyValue> for Value {
    fn from(value: PropertyValue) -> Self {
        Value::from_property(value)
    }
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a variable to a value
    pub fn bind(&mut self, variable: String, value: Value) {
        self.bindings.insert(variable, value);
    }

    /// Get value bound to variable
    pub fn get(&self, variable: &str) -> Option<&Value> {
        self.bindings.get(variable)
    }

    pub fn has(&self, variable: &str) -> bool {
        self.bindings.contains_key(variable)
    }

    pub fn bindings(&self) -> &IndexMap<String, Value> {
        &self.bindings
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Combine with another record; `other` wins on name clashes
    pub fn merge(&self, other: &Record) -> Record {
        let mut merged = self.clone();
        for (var, val) in &other.bindings {
            merged.bindings.insert(var.clone(), val.clone());
        }
        merged
    }

    /// Keep only `columns`, in that order
    pub fn project(&self, columns: &[String]) -> Record {
        let mut projected = Record::new();
        for column in columns {
            if let Some(value) = self.bindings.get(column) {
                projected.bind(column.clone(), value.clone());
            }
        }
        projected
    }

    /// Values of `columns` in order; unbound columns are null
    pub fn values(&self, columns: &[String]) -> Vec<Value> {
        columns
            .iter()
            .map(|c| self.bindings.get(c).cloned().unwrap_or(Value::Null))
            .collect()
    }
}

/// Collection of records with column metadata
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordBatch {
    pub records: Vec<Record>,
    pub columns: Vec<String>,
}

impl RecordBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows as value lists in column order
    pub fn rows(&self) -> Vec<Vec<Value>> {
        self.records.iter().map(|r| r.values(&self.columns)).collect()
    }

    /// One column across all rows
    pub fn column(&self, name: &str) -> Vec<Value> {
        self.records
            .iter()
            .map(|r| r.get(name).cloned().unwrap_or(Value::Null))
            .collect()
    }

    /// Rows as JSON objects keyed by column name
    pub fn to_json(&self, store: &GraphStore) -> serde_json::Value {
        let rows = self
            .records
            .iter()
            .map(|record| {
                let mut row = serde_json::Map::new();
                for column in &self.columns {
                    let value = record.get(column).map_or(serde_json::Value::Null, |v| v.to_json(store));
                    row.insert(column.clone(), value);
                }
                serde_json::Value::Object(row)
            })
            .collect();
        serde_json::Value::Array(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_record_bind_and_merge() {
        let mut left = Record::new();
        left.bind("a".to_string(), Value::Node(NodeId(1)));
        let mut right = Record::new();
        right.bind("b".to_string(), Value::Property(PropertyValue::Number(2.0)));

        let merged = left.merge(&right);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.get("a"), Some(&Value::Node(NodeId(1))));
        assert!(merged.has("b"));
        assert_eq!(
            merged.values(&["b".to_string(), "missing".to_string()]),
            vec![Value::Property(PropertyValue::Number(2.0)), Value::Null]
        );
    }

    #[test]
    fn test_structural_equality_and_hash() {
        let mut set = HashSet::new();
        set.insert(Value::Property(PropertyValue::Number(0.0)));
        assert!(set.contains(&Value::Property(PropertyValue::Number(-0.0))));
        assert_eq!(Value::Null, Value::Null);
        assert_ne!(Value::Node(NodeId(1)), Value::Edge(EdgeId(1)));
        assert_ne!(
            Value::Property(PropertyValue::Text("1".into())),
            Value::Property(PropertyValue::Number(1.0))
        );
    }

    #[test]
    fn test_stored_null_maps_to_null() {
        assert!(Value::from_property(PropertyValue::Null).is_null());
        assert_eq!(Value::from(PropertyValue::Boolean(true)).to_property(), PropertyValue::Boolean(true));
    }

    #[test]
    fn test_sort_order_nulls_last() {
        let mut values = vec![
            Value::Null,
            Value::Property(PropertyValue::Number(2.0)),
            Value::Property(PropertyValue::Text("a".into())),
            Value::Property(PropertyValue::Number(1.0)),
        ];
        values.sort_by(Value::sort_cmp);
        assert_eq!(values[0], Value::Property(PropertyValue::Number(1.0)));
        assert_eq!(values[2], Value::Property(PropertyValue::Text("a".into())));
        assert!(values[3].is_null());
    }

    #[test]
    fn test_batch_to_json() {
        let mut store = GraphStore::new();
        let id = store.create_node(["Person"], [("name", "Ada")]);

        let mut record = Record::new();
        record.bind("n".to_string(), Value::Node(id));
        record.bind("n.name".to_string(), Value::Property("Ada".into()));
        let batch = RecordBatch {
            records: vec![record],
            columns: vec!["n".to_string(), "n.name".to_string()],
        };

        let json = batch.to_json(&store);
        assert_eq!(json[0]["n.name"], "Ada");
        assert_eq!(json[0]["n"]["labels"][0], "Person");
        assert_eq!(json[0]["n"]["properties"]["name"], "Ada");
        assert_eq!(batch.rows().len(), 1);
    }
}
