//! Row storage for the in-memory executor.

use std::collections::HashMap;

use critq_proto::Value;
use serde::{Deserialize, Serialize};

/// A row of an entity: field names paired with values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityRow {
    pub fields: Vec<(String, Value)>,
}

impl EntityRow {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing an existing value.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
        self
    }

    /// Get a field value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// Rows grouped by entity name.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    rows: HashMap<String, Vec<EntityRow>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row to an entity.
    pub fn insert(&mut self, entity: impl Into<String>, row: EntityRow) {
        self.rows.entry(entity.into()).or_default().push(row);
    }

    /// Append rows to an entity.
    pub fn with_rows(mut self, entity: impl Into<String>, rows: impl IntoIterator<Item = EntityRow>) -> Self {
        self.rows.entry(entity.into()).or_default().extend(rows);
        self
    }

    /// Rows of an entity, in insertion order.
    pub fn rows(&self, entity: &str) -> &[EntityRow] {
        self.rows.get(entity).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of rows of an entity.
    pub fn len(&self, entity: &str) -> usize {
        self.rows(entity).len()
    }

    /// Whether the store holds no rows at all.
    pub fn is_empty(&self) -> bool {
        self.rows.values().all(Vec::is_empty)
    }
}
