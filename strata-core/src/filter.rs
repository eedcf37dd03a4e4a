//! Equality filters over records.
//!
//! The CRUD layer only ever inspects filters for one thing, whether the
//! primary key is pinned to a single value. Everything else is passed through
//! to the backing store, which evaluates field-by-field equality. Richer
//! predicate algebras belong to the query engine behind the store contract.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::record::{id_from_value, Record, RecordId};

/// An equality predicate: every entry must match the record's field value.
///
/// Entries live in a sorted map so serialized filters are key-ordered
/// regardless of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter {
    fields: BTreeMap<String, Value>,
}

impl Filter {
    /// Create an empty filter (matches every record).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a single-field equality filter.
    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(field.into(), value);
        Self { fields }
    }

    /// Add a field constraint, consuming and returning the filter.
    pub fn with(mut self, field: impl Into<String>, value: Value) -> Self {
        self.fields.insert(field.into(), value);
        self
    }

    /// Add a field constraint in place.
    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.fields.insert(field.into(), value);
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// The record id this filter pins, if it constrains exactly the primary
    /// key and nothing else.
    ///
    /// Filters carrying additional predicates must consult the store: a
    /// cached record satisfies the key lookup but not necessarily the rest
    /// of the filter.
    pub fn pinned_id(&self, primary_key: &str) -> Option<RecordId> {
        if self.fields.len() != 1 {
            return None;
        }
        self.fields.get(primary_key).and_then(id_from_value)
    }

    /// Evaluate the filter against a record.
    ///
    /// An explicit `null` constraint matches only a stored `null`, not an
    /// absent field.
    pub fn matches(&self, record: &Record) -> bool {
        self.fields
            .iter()
            .all(|(field, expected)| record.get(field) == Some(expected))
    }

    /// The filter as a JSON object value.
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================
