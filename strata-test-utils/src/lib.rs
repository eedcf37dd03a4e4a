//! STRATA Test Utilities
//!
//! Centralized test infrastructure for the STRATA workspace:
//! - Model-config fixtures for common schemas
//! - Record builders
//! - Proptest generators for records, filters, and list parameters

// Re-export core types for convenience
pub use strata_core::{
    extract_id, Filter, ListParams, ModelConfig, ModelRegistry, Record, RelationDef, RelationIds,
    SortDirection,
};

use proptest::prelude::*;
use serde_json::{json, Value};
use std::time::Duration;
use uuid::Uuid;

// ============================================================================
// FIXTURES
// ============================================================================

/// A `user` model with two relations and caching enabled (ttl 60s).
pub fn user_config() -> ModelConfig {
    ModelConfig::new("user", "id")
        .with_columns(["id", "name", "email", "age", "active"])
        .with_relation("roles", RelationDef::new("role"))
        .with_relation("team", RelationDef::new("team"))
        .with_cache_ttl(Duration::from_secs(60))
}

/// A `post` model related back to `user`, caching enabled (ttl 30s).
pub fn post_config() -> ModelConfig {
    ModelConfig::new("post", "id")
        .with_columns(["id", "title", "body", "published"])
        .with_relation("author", RelationDef::new("user"))
        .with_cache_ttl(Duration::from_secs(30))
}

/// A model with no configured ttl, caching disabled.
pub fn uncached_config() -> ModelConfig {
    ModelConfig::new("audit_log", "id").with_columns(["id", "action", "actor"])
}

/// Registry holding all fixture models.
pub fn test_registry() -> ModelRegistry {
    let mut registry = ModelRegistry::new();
    registry.register(user_config()).expect("user config valid");
    registry.register(post_config()).expect("post config valid");
    registry
        .register(uncached_config())
        .expect("audit config valid");
    registry
}

// ============================================================================
// RECORD BUILDERS
// ============================================================================

/// Build a record from field/value pairs.
pub fn record(pairs: &[(&str, Value)]) -> Record {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// A `user` row with the given id and name.
pub fn user_record(id: &str, name: &str) -> Record {
    record(&[
        ("id", json!(id)),
        ("name", json!(name)),
        ("email", json!(format!("{}@example.com", name.to_lowercase()))),
        ("active", json!(true)),
    ])
}

/// A fresh uuid-v7 string, the shape `MemoryStore` assigns to created rows.
pub fn fresh_id() -> String {
    Uuid::now_v7().to_string()
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

/// Scalar JSON values (no objects, no arrays).
pub fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        "[a-zA-Z0-9 ]{0,12}".prop_map(Value::from),
        Just(Value::Null),
    ]
}

/// Flat records: scalars and arrays of scalars only.
pub fn arb_flat_record() -> impl Strategy<Value = Record> {
    let field_value = prop_oneof![
        arb_scalar(),
        proptest::collection::vec(arb_scalar(), 0..4).prop_map(Value::from),
    ];
    proptest::collection::btree_map("[a-z_]{1,10}", field_value, 0..8)
        .prop_map(|map| map.into_iter().collect())
}

/// Records that may carry embedded relation objects, the shape
/// `cache_record` must strip.
pub fn arb_record_with_relations() -> impl Strategy<Value = Record> {
    let field_value = prop_oneof![
        arb_scalar(),
        proptest::collection::vec(arb_scalar(), 0..4).prop_map(Value::from),
        (any::<i64>(), "[a-z]{1,8}")
            .prop_map(|(id, name)| json!({"id": id, "name": name})),
    ];
    proptest::collection::btree_map("[a-z_]{1,10}", field_value, 1..8)
        .prop_map(|map| map.into_iter().collect())
}

/// Arbitrary list parameters with optional fields set or unset.
pub fn arb_list_params() -> impl Strategy<Value = ListParams> {
    (
        proptest::option::of(1u32..200),
        proptest::option::of(1u32..50),
        proptest::option::of("[a-z_]{1,10}"),
        proptest::option::of(prop_oneof![
            Just(SortDirection::Asc),
            Just(SortDirection::Desc)
        ]),
        proptest::option::of("[a-z ]{0,10}"),
        proptest::collection::vec(("[a-z_]{1,8}", arb_scalar()), 0..4),
    )
        .prop_map(
            |(page, per_page, order_by, order_direction, search, filter_entries)| {
                let filter = if filter_entries.is_empty() {
                    None
                } else {
                    let mut filter = Filter::new();
                    for (field, value) in filter_entries {
                        filter.insert(field, value);
                    }
                    Some(filter)
                };
                ListParams {
                    page,
                    per_page,
                    order_by,
                    order_direction,
                    filter,
                    search,
                }
            },
        )
}

// =============================================================================
// TESTS
// =============================================================================
