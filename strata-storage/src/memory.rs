//! In-memory backing store.
//!
//! Reference implementation of the [`DataStore`] contract, suitable for
//! tests, development, and single-process deployments. Rows live in
//! per-model tables behind an `RwLock`; query evaluation is equality
//! filtering, case-insensitive substring search over string fields,
//! value-ordered sorting, then paging and projection.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use strata_core::{
    extract_id, Filter, ModelConfig, Query, Record, SortDirection, StoreError, StrataError,
    StrataResult,
};

use crate::store::DataStore;

/// In-memory [`DataStore`] implementation.
pub struct MemoryStore {
    tables: Arc<RwLock<HashMap<String, Vec<Record>>>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            tables: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of rows stored for a model.
    pub fn row_count(&self, model: &str) -> StrataResult<usize> {
        let tables = self.tables.read().map_err(|_| lock_poisoned())?;
        Ok(tables.get(model).map(Vec::len).unwrap_or(0))
    }

    /// Remove every row of every model.
    pub fn clear(&self) -> StrataResult<()> {
        self.tables.write().map_err(|_| lock_poisoned())?.clear();
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MemoryStore {
    fn clone(&self) -> Self {
        Self {
            tables: Arc::clone(&self.tables),
        }
    }
}

fn lock_poisoned() -> StrataError {
    StrataError::Store(StoreError::LockPoisoned)
}

fn matches_search(record: &Record, search: &str) -> bool {
    if search.is_empty() {
        return true;
    }
    let needle = search.to_lowercase();
    record.values().any(|value| match value {
        Value::String(s) => s.to_lowercase().contains(&needle),
        _ => false,
    })
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over JSON values: numbers numerically, strings and booleans
/// naturally, mixed types by type rank so sorting stays deterministic.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn project(record: &Record, select: Option<&[String]>) -> Record {
    match select {
        None => record.clone(),
        Some(fields) => fields
            .iter()
            .filter_map(|field| {
                record
                    .get(field)
                    .map(|value| (field.clone(), value.clone()))
            })
            .collect(),
    }
}

/// Filter, search, order, page, and project rows for one query.
fn select_rows(rows: &[Record], query: &Query) -> Vec<Record> {
    let mut matched: Vec<&Record> = rows
        .iter()
        .filter(|row| query.filter.matches(row) && matches_search(row, &query.search))
        .collect();

    if let Some(order_by) = &query.order_by {
        matched.sort_by(|a, b| {
            let ord = compare_values(
                a.get(order_by).unwrap_or(&Value::Null),
                b.get(order_by).unwrap_or(&Value::Null),
            );
            match query.order_direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });
    }

    let offset = query.offset.unwrap_or(0) as usize;
    let paged = matched.into_iter().skip(offset);
    match query.limit {
        Some(limit) => paged
            .take(limit as usize)
            .map(|row| project(row, query.select.as_deref()))
            .collect(),
        None => paged
            .map(|row| project(row, query.select.as_deref()))
            .collect(),
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn find_first(
        &self,
        model: &ModelConfig,
        query: &Query,
    ) -> StrataResult<Option<Record>> {
        let tables = self.tables.read().map_err(|_| lock_poisoned())?;
        let rows = match tables.get(&model.model_name) {
            Some(rows) => rows,
            None => return Ok(None),
        };
        Ok(select_rows(rows, query).into_iter().next())
    }

    async fn find_many(&self, model: &ModelConfig, query: &Query) -> StrataResult<Vec<Record>> {
        let tables = self.tables.read().map_err(|_| lock_poisoned())?;
        let rows = match tables.get(&model.model_name) {
            Some(rows) => rows,
            None => return Ok(Vec::new()),
        };
        Ok(select_rows(rows, query))
    }

    async fn count(&self, model: &ModelConfig, query: &Query) -> StrataResult<u64> {
        let tables = self.tables.read().map_err(|_| lock_poisoned())?;
        let rows = match tables.get(&model.model_name) {
            Some(rows) => rows,
            None => return Ok(0),
        };
        let matched = rows
            .iter()
            .filter(|row| query.filter.matches(row) && matches_search(row, &query.search))
            .count();
        Ok(matched as u64)
    }

    async fn create(
        &self,
        model: &ModelConfig,
        data: Record,
        select: Option<&[String]>,
    ) -> StrataResult<Record> {
        let mut tables = self.tables.write().map_err(|_| lock_poisoned())?;
        let rows = tables.entry(model.model_name.clone()).or_default();

        let mut record = data;
        match record.get(&model.primary_key) {
            Some(_) => {
                // Explicit primary keys must not collide with stored rows.
                if let Some(id) = extract_id(&record, &model.primary_key) {
                    let exists = rows
                        .iter()
                        .any(|row| extract_id(row, &model.primary_key).as_deref() == Some(&id));
                    if exists {
                        return Err(StoreError::InsertFailed {
                            model: model.model_name.clone(),
                            reason: format!("duplicate primary key: {}", id),
                        }
                        .into());
                    }
                }
            }
            None => {
                record.insert(
                    model.primary_key.clone(),
                    Value::from(Uuid::now_v7().to_string()),
                );
            }
        }

        rows.push(record.clone());
        Ok(project(&record, select))
    }

    async fn update(
        &self,
        model: &ModelConfig,
        filter: &Filter,
        data: Record,
        select: Option<&[String]>,
    ) -> StrataResult<Record> {
        let mut tables = self.tables.write().map_err(|_| lock_poisoned())?;
        let rows = tables
            .get_mut(&model.model_name)
            .ok_or_else(|| StoreError::NotFound {
                model: model.model_name.clone(),
            })?;
        let position = rows
            .iter()
            .position(|row| filter.matches(row))
            .ok_or_else(|| StoreError::NotFound {
                model: model.model_name.clone(),
            })?;

        let row = &mut rows[position];
        for (field, value) in data {
            row.insert(field, value);
        }
        Ok(project(row, select))
    }

    async fn delete(
        &self,
        model: &ModelConfig,
        filter: &Filter,
        select: Option<&[String]>,
    ) -> StrataResult<Record> {
        let mut tables = self.tables.write().map_err(|_| lock_poisoned())?;
        let rows = tables
            .get_mut(&model.model_name)
            .ok_or_else(|| StoreError::NotFound {
                model: model.model_name.clone(),
            })?;
        let position = rows
            .iter()
            .position(|row| filter.matches(row))
            .ok_or_else(|| StoreError::NotFound {
                model: model.model_name.clone(),
            })?;

        let removed = rows.remove(position);
        Ok(project(&removed, select))
    }
}

// =============================================================================
// TESTS
// =============================================================================
