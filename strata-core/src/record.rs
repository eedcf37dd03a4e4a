//! Dynamic record values.
//!
//! Rows in this layer are schema-described rather than statically typed: a
//! record is a flat JSON map of column name to value, and the per-model
//! [`ModelConfig`](crate::ModelConfig) says which fields are columns, which
//! are relations, and which one is the primary key.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single row: column name mapped to a JSON value.
pub type Record = Map<String, Value>;

/// Stringified primary-key value used in cache keys.
///
/// String primary keys are used verbatim; integer primary keys render in
/// decimal. Other value types do not identify records.
pub type RecordId = String;

/// Cached ids for one relation name on one record.
///
/// Serialized untagged so the cached form is a bare number, an array of
/// numbers, or `null`. `Empty` means the relation was loaded and found
/// absent, which is distinct from the relation never having been cached
/// (key absence in the relation-index entry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelationIds {
    One(i64),
    Many(Vec<i64>),
    Empty,
}

/// Derive a [`RecordId`] from a primary-key value.
///
/// Returns `None` for values that cannot identify a record: non-integer
/// numbers, booleans, empty strings, nulls, arrays, and objects.
pub fn id_from_value(value: &Value) -> Option<RecordId> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => n
            .as_i64()
            .map(|i| i.to_string())
            .or_else(|| n.as_u64().map(|u| u.to_string())),
        _ => None,
    }
}

/// Read and stringify a record's primary-key field.
pub fn extract_id(record: &Record, primary_key: &str) -> Option<RecordId> {
    record.get(primary_key).and_then(id_from_value)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_from_string_value() {
        assert_eq!(id_from_value(&json!("u1")), Some("u1".to_string()));
    }

    #[test]
    fn test_id_from_integer_value() {
        assert_eq!(id_from_value(&json!(42)), Some("42".to_string()));
        assert_eq!(id_from_value(&json!(-7)), Some("-7".to_string()));
    }

    #[test]
    fn test_id_rejects_non_identifying_values() {
        assert_eq!(id_from_value(&json!(1.5)), None);
        assert_eq!(id_from_value(&json!(true)), None);
        assert_eq!(id_from_value(&json!("")), None);
        assert_eq!(id_from_value(&Value::Null), None);
        assert_eq!(id_from_value(&json!([1])), None);
        assert_eq!(id_from_value(&json!({"id": 1})), None);
    }

    #[test]
    fn test_extract_id_reads_primary_key_field() {
        let mut record = Record::new();
        record.insert("id".to_string(), json!("u1"));
        record.insert("name".to_string(), json!("Alice"));
        assert_eq!(extract_id(&record, "id"), Some("u1".to_string()));
        assert_eq!(extract_id(&record, "uuid"), None);
    }

    #[test]
    fn test_relation_ids_serialize_untagged() {
        assert_eq!(
            serde_json::to_value(RelationIds::One(5)).unwrap(),
            json!(5)
        );
        assert_eq!(
            serde_json::to_value(RelationIds::Many(vec![1, 2, 3])).unwrap(),
            json!([1, 2, 3])
        );
        assert_eq!(
            serde_json::to_value(RelationIds::Empty).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_relation_ids_deserialize_untagged() {
        let one: RelationIds = serde_json::from_value(json!(9)).unwrap();
        assert_eq!(one, RelationIds::One(9));

        let many: RelationIds = serde_json::from_value(json!([4, 5])).unwrap();
        assert_eq!(many, RelationIds::Many(vec![4, 5]));

        let empty: RelationIds = serde_json::from_value(Value::Null).unwrap();
        assert_eq!(empty, RelationIds::Empty);
    }

    #[test]
    fn test_relation_ids_empty_list_stays_a_list() {
        let round: RelationIds =
            serde_json::from_value(serde_json::to_value(RelationIds::Many(vec![])).unwrap())
                .unwrap();
        assert_eq!(round, RelationIds::Many(vec![]));
    }
}
