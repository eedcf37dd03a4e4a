//! List query parameters, normalization, and pagination shapes.
//!
//! List cache keys are derived from parameters, so two requests that mean
//! the same query must serialize identically. Normalization fills every
//! unset field with its model-aware default, and the cache fragment fixes
//! field order and sorts filter keys at every nesting depth. The
//! [`NormalizedListParams`] type is the only input a list key accepts, which
//! keeps un-normalized parameters out of the key scheme by construction.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::filter::Filter;
use crate::record::{extract_id, Record, RecordId};

/// Sort direction for list queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Caller-facing list parameters. Unset fields take defaults at
/// normalization time: page 1, ten items per page, ordered by the model's
/// primary key descending, empty filter, empty search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub order_by: Option<String>,
    pub order_direction: Option<SortDirection>,
    pub filter: Option<Filter>,
    pub search: Option<String>,
}

impl ListParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    pub fn with_order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(field.into());
        self
    }

    pub fn with_order_direction(mut self, direction: SortDirection) -> Self {
        self.order_direction = Some(direction);
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Fill unset fields with their defaults. Zero `page` or `per_page` is
    /// treated as unset.
    pub fn normalize(&self, primary_key: &str) -> NormalizedListParams {
        NormalizedListParams {
            page: self.page.unwrap_or(1).max(1),
            per_page: self.per_page.unwrap_or(10).max(1),
            order_by: self
                .order_by
                .clone()
                .unwrap_or_else(|| primary_key.to_string()),
            order_direction: self.order_direction.unwrap_or_default(),
            filter: self.filter.clone().unwrap_or_default(),
            search: self.search.clone().unwrap_or_default(),
        }
    }
}

/// Fully defaulted list parameters, the only type a list cache key can be
/// derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedListParams {
    pub page: u32,
    pub per_page: u32,
    pub order_by: String,
    pub order_direction: SortDirection,
    pub filter: Filter,
    pub search: String,
}

impl NormalizedListParams {
    /// Offset of the first row of this page.
    pub fn offset(&self) -> u64 {
        (u64::from(self.page) - 1) * u64::from(self.per_page)
    }

    /// Deterministic serialization used as the list cache key suffix.
    ///
    /// Filter keys are sorted at every nesting depth before serializing, so
    /// semantically identical filters built in different key orders share a
    /// key instead of silently fragmenting the cache.
    pub fn cache_fragment(&self) -> String {
        let mut fragment = Map::new();
        fragment.insert("page".to_string(), Value::from(self.page));
        fragment.insert("perPage".to_string(), Value::from(self.per_page));
        fragment.insert("orderBy".to_string(), Value::from(self.order_by.as_str()));
        fragment.insert(
            "orderDirection".to_string(),
            Value::from(self.order_direction.as_str()),
        );
        fragment.insert("where".to_string(), canonical_value(&self.filter.to_value()));
        fragment.insert("search".to_string(), Value::from(self.search.as_str()));
        Value::Object(fragment).to_string()
    }
}

/// Rebuild a value with object keys inserted in sorted order at every depth.
fn canonical_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by_key(|(key, _)| *key);
            let mut sorted = Map::new();
            for (key, inner) in entries {
                sorted.insert(key.clone(), canonical_value(inner));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical_value).collect()),
        other => other.clone(),
    }
}

fn total_pages(total: u64, per_page: u32) -> u32 {
    total.div_ceil(u64::from(per_page)) as u32
}

/// One page of fully materialized records plus pagination bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResult {
    pub data: Vec<Record>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

impl ListResult {
    pub fn new(data: Vec<Record>, total: u64, params: &NormalizedListParams) -> Self {
        Self {
            data,
            total,
            page: params.page,
            per_page: params.per_page,
            total_pages: total_pages(total, params.per_page),
        }
    }
}

/// The cached form of one list page: record ids only. Rows are re-assembled
/// from per-record entries at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEntry {
    pub ids: Vec<RecordId>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

impl ListEntry {
    /// Project a result down to its cacheable id page.
    ///
    /// Returns `None` when any row lacks a usable primary key, since a page
    /// that cannot name all its rows cannot be re-assembled later.
    pub fn from_result(result: &ListResult, primary_key: &str) -> Option<Self> {
        let mut ids = Vec::with_capacity(result.data.len());
        for record in &result.data {
            ids.push(extract_id(record, primary_key)?);
        }
        Some(Self {
            ids,
            total: result.total,
            page: result.page,
            per_page: result.per_page,
            total_pages: result.total_pages,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_fills_defaults() {
        let normalized = ListParams::new().normalize("id");
        assert_eq!(normalized.page, 1);
        assert_eq!(normalized.per_page, 10);
        assert_eq!(normalized.order_by, "id");
        assert_eq!(normalized.order_direction, SortDirection::Desc);
        assert!(normalized.filter.is_empty());
        assert_eq!(normalized.search, "");
    }

    #[test]
    fn test_normalize_keeps_explicit_values() {
        let normalized = ListParams::new()
            .with_page(3)
            .with_per_page(25)
            .with_order_by("name")
            .with_order_direction(SortDirection::Asc)
            .with_filter(Filter::eq("active", json!(true)))
            .with_search("ali")
            .normalize("id");
        assert_eq!(normalized.page, 3);
        assert_eq!(normalized.per_page, 25);
        assert_eq!(normalized.order_by, "name");
        assert_eq!(normalized.order_direction, SortDirection::Asc);
        assert_eq!(normalized.filter.get("active"), Some(&json!(true)));
        assert_eq!(normalized.search, "ali");
    }

    #[test]
    fn test_normalize_treats_zero_as_unset() {
        let normalized = ListParams::new()
            .with_page(0)
            .with_per_page(0)
            .normalize("id");
        assert_eq!(normalized.page, 1);
        assert_eq!(normalized.per_page, 1);
    }

    #[test]
    fn test_offset() {
        let mut normalized = ListParams::new().normalize("id");
        assert_eq!(normalized.offset(), 0);
        normalized.page = 3;
        normalized.per_page = 10;
        assert_eq!(normalized.offset(), 20);
    }

    #[test]
    fn test_cache_fragment_default_shape() {
        let fragment = ListParams::new().normalize("id").cache_fragment();
        assert_eq!(
            fragment,
            r#"{"orderBy":"id","orderDirection":"desc","page":1,"perPage":10,"search":"","where":{}}"#
        );
    }

    #[test]
    fn test_cache_fragment_is_order_insensitive_for_filters() {
        let first = ListParams::new()
            .with_filter(Filter::new().with("b", json!(2)).with("a", json!(1)))
            .normalize("id")
            .cache_fragment();
        let second = ListParams::new()
            .with_filter(Filter::new().with("a", json!(1)).with("b", json!(2)))
            .normalize("id")
            .cache_fragment();
        assert_eq!(first, second);
    }

    #[test]
    fn test_cache_fragment_sorts_nested_filter_objects() {
        let first = ListParams::new()
            .with_filter(Filter::eq("profile", json!({"zip": "10", "city": "x"})))
            .normalize("id")
            .cache_fragment();
        let second = ListParams::new()
            .with_filter(Filter::eq("profile", json!({"city": "x", "zip": "10"})))
            .normalize("id")
            .cache_fragment();
        assert_eq!(first, second);
    }

    #[test]
    fn test_cache_fragment_differs_on_each_dimension() {
        let base = ListParams::new().normalize("id").cache_fragment();
        let variants = [
            ListParams::new().with_page(2).normalize("id"),
            ListParams::new().with_per_page(20).normalize("id"),
            ListParams::new().with_order_by("name").normalize("id"),
            ListParams::new()
                .with_order_direction(SortDirection::Asc)
                .normalize("id"),
            ListParams::new()
                .with_filter(Filter::eq("active", json!(true)))
                .normalize("id"),
            ListParams::new().with_search("x").normalize("id"),
        ];
        for variant in variants {
            assert_ne!(variant.cache_fragment(), base);
        }
    }

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
    }

    #[test]
    fn test_list_result_computes_total_pages() {
        let params = ListParams::new().with_per_page(10).normalize("id");
        let result = ListResult::new(vec![], 35, &params);
        assert_eq!(result.total_pages, 4);
        assert_eq!(result.page, 1);
        assert_eq!(result.per_page, 10);
    }

    #[test]
    fn test_list_entry_from_result() {
        let params = ListParams::new().normalize("id");
        let rows: Vec<Record> = vec![
            [("id".to_string(), json!("a"))].into_iter().collect(),
            [("id".to_string(), json!(2))].into_iter().collect(),
        ];
        let result = ListResult::new(rows, 2, &params);
        let entry = ListEntry::from_result(&result, "id").unwrap();
        assert_eq!(entry.ids, vec!["a".to_string(), "2".to_string()]);
        assert_eq!(entry.total, 2);
    }

    #[test]
    fn test_list_entry_requires_ids_on_every_row() {
        let params = ListParams::new().normalize("id");
        let rows: Vec<Record> = vec![[("name".to_string(), json!("x"))].into_iter().collect()];
        let result = ListResult::new(rows, 1, &params);
        assert!(ListEntry::from_result(&result, "id").is_none());
    }

    #[test]
    fn test_sort_direction_serde() {
        assert_eq!(serde_json::to_string(&SortDirection::Asc).unwrap(), "\"asc\"");
        let parsed: SortDirection = serde_json::from_str("\"desc\"").unwrap();
        assert_eq!(parsed, SortDirection::Desc);
    }
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn arb_scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<i64>().prop_map(Value::from),
            any::<bool>().prop_map(Value::from),
            "[a-z]{0,8}".prop_map(Value::from),
            Just(Value::Null),
        ]
    }

    fn arb_filter_entries() -> impl Strategy<Value = Vec<(String, Value)>> {
        proptest::collection::vec(("[a-z]{1,6}", arb_scalar()), 0..6)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Property: filter insertion order never changes the cache key.
        #[test]
        fn prop_fragment_ignores_insertion_order(entries in arb_filter_entries()) {
            let forward = {
                let mut filter = Filter::new();
                for (key, value) in &entries {
                    filter.insert(key.clone(), value.clone());
                }
                filter
            };
            let reverse = {
                let mut filter = Filter::new();
                for (key, value) in entries.iter().rev() {
                    filter.insert(key.clone(), value.clone());
                }
                filter
            };
            let first = ListParams::new()
                .with_filter(forward)
                .normalize("id")
                .cache_fragment();
            let second = ListParams::new()
                .with_filter(reverse)
                .normalize("id")
                .cache_fragment();
            prop_assert_eq!(first, second);
        }

        /// Property: page and per-page always separate cache keys.
        #[test]
        fn prop_fragment_separates_pages(page_a in 1u32..500, page_b in 1u32..500, per_page in 1u32..100) {
            prop_assume!(page_a != page_b);
            let a = ListParams::new()
                .with_page(page_a)
                .with_per_page(per_page)
                .normalize("id")
                .cache_fragment();
            let b = ListParams::new()
                .with_page(page_b)
                .with_per_page(per_page)
                .normalize("id")
                .cache_fragment();
            prop_assert_ne!(a, b);
        }

        /// Property: normalization is stable, the same params always produce
        /// the same fragment.
        #[test]
        fn prop_fragment_is_deterministic(page in 1u32..100, search in "[a-z]{0,6}") {
            let params = ListParams::new()
                .with_page(page)
                .with_search(search)
                .with_filter(Filter::eq("nested", json!({"b": 1, "a": [1, 2]})));
            let first = params.normalize("id").cache_fragment();
            let second = params.normalize("id").cache_fragment();
            prop_assert_eq!(first, second);
        }
    }
}
