//! Schema registry: interned label, relationship-type and property names
//!
//! Each kind has its own append-only name table. An id is the position of the
//! name in its table and is never reassigned.

use super::types::{LabelId, PropertyId, RelationTypeId};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which name table an entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaKind {
    Label,
    RelationType,
    Property,
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaKind::Label => write!(f, "label"),
            SchemaKind::RelationType => write!(f, "relationship type"),
            SchemaKind::Property => write!(f, "property"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    labels: IndexSet<String>,
    relation_types: IndexSet<String>,
    properties: IndexSet<String>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a registry from its three name tables, in id order.
    ///
    /// Returns `None` if a table repeats a name.
    pub fn from_tables(
        labels: Vec<String>,
        relation_types: Vec<String>,
        properties: Vec<String>,
    ) -> Option<Self> {
        fn table(names: Vec<String>) -> Option<IndexSet<String>> {
            let len = names.len();
            let set: IndexSet<String> = names.into_iter().collect();
            (set.len() == len).then_some(set)
        }

        Some(Self {
            labels: table(labels)?,
            relation_types: table(relation_types)?,
            properties: table(properties)?,
        })
    }

    /// Intern `name`, returning the existing id when it was seen before
    pub fn intern(&mut self, kind: SchemaKind, name: &str) -> u32 {
        let table = self.table_mut(kind);
        if let Some(id) = table.get_index_of(name) {
            return id as u32;
        }
        table.insert_full(name.to_string()).0 as u32
    }

    pub fn resolve(&self, kind: SchemaKind, id: u32) -> Option<&str> {
        self.table(kind).get_index(id as usize).map(String::as_str)
    }

    pub fn lookup(&self, kind: SchemaKind, name: &str) -> Option<u32> {
        self.table(kind).get_index_of(name).map(|id| id as u32)
    }

    pub fn len(&self, kind: SchemaKind) -> usize {
        self.table(kind).len()
    }

    /// Names of one table in id order
    pub fn names(&self, kind: SchemaKind) -> impl Iterator<Item = &str> + '_ {
        self.table(kind).iter().map(String::as_str)
    }

    pub fn intern_label(&mut self, name: &str) -> LabelId {
        LabelId(self.intern(SchemaKind::Label, name))
    }

    pub fn intern_relation_type(&mut self, name: &str) -> RelationTypeId {
        RelationTypeId(self.intern(SchemaKind::RelationType, name))
    }

    pub fn intern_property(&mut self, name: &str) -> PropertyId {
        PropertyId(self.intern(SchemaKind::Property, name))
    }

    pub fn label_id(&self, name: &str) -> Option<LabelId> {
        self.lookup(SchemaKind::Label, name).map(LabelId)
    }

    pub fn relation_type_id(&self, name: &str) -> Option<RelationTypeId> {
        self.lookup(SchemaKind::RelationType, name).map(RelationTypeId)
    }

    pub fn property_id(&self, name: &str) -> Option<PropertyId> {
        self.lookup(SchemaKind::Property, name).map(PropertyId)
    }

    pub fn label_name(&self, id: LabelId) -> Option<&str> {
        self.resolve(SchemaKind::Label, id.0)
    }

    pub fn relation_type_name(&self, id: RelationTypeId) -> Option<&str> {
        self.resolve(SchemaKind::RelationType, id.0)
    }

    pub fn property_name(&self, id: PropertyId) -> Option<&str> {
        self.resolve(SchemaKind::Property, id.0)
    }

    fn table(&self, kind: SchemaKind) -> &IndexSet<String> {
        match kind {
            SchemaKind::Label => &self.labels,
            SchemaKind::RelationType => &self.relation_types,
            SchemaKind::Property => &self.properties,
        }
    }

    fn table_mut(&mut self, kind: SchemaKind) -> &mut IndexSet<String> {
        match kind {
            SchemaKind::Label => &mut self.labels,
            SchemaKind::RelationType => &mut self.relation_types,
            SchemaKind::Property => &mut self.properties,
        }
    }
}
