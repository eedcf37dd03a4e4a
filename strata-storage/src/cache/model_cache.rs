//! Model-level cache entries and invalidation.
//!
//! [`ModelCache`] translates domain read/write intents into [`CacheStore`]
//! operations. It owns entry shaping — flat records with relation payloads
//! stripped, incrementally merged relation indices, exact-match list pages —
//! and the invalidation protocol. Errors from the backing store propagate to
//! the caller untouched; the CRUD layer above decides what to swallow.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use strata_core::{
    CacheError, ListEntry, NormalizedListParams, Record, RelationIds, StrataResult,
};

use super::keys;
use super::traits::CacheStore;

/// Per-table cache entry management over a shared [`CacheStore`].
pub struct ModelCache<C: CacheStore> {
    store: Arc<C>,
}

impl<C: CacheStore> ModelCache<C> {
    /// Create a model cache over a shared store handle.
    pub fn new(store: Arc<C>) -> Self {
        Self { store }
    }

    /// Get a reference to the underlying cache store.
    pub fn store(&self) -> &C {
        &self.store
    }

    /// Store one record entry under `{table}:{id}`.
    ///
    /// Every field whose value is a non-null, non-array object is stripped
    /// first: relation payloads are cached separately and would otherwise go
    /// stale independently of the owning record. A zero ttl is a no-op, the
    /// model has caching disabled.
    pub async fn cache_record(
        &self,
        table: &str,
        id: &str,
        record: &Record,
        ttl: Duration,
    ) -> StrataResult<()> {
        if ttl.is_zero() {
            return Ok(());
        }
        let flat: Record = record
            .iter()
            .filter(|(_, value)| !value.is_object())
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect();
        self.store
            .set(&keys::record_key(table, id), Value::Object(flat), ttl)
            .await
    }

    /// Get a cached record entry. Absent keys and malformed entries are both
    /// misses.
    pub async fn cached_record(&self, table: &str, id: &str) -> StrataResult<Option<Record>> {
        let value = self.store.get(&keys::record_key(table, id)).await?;
        Ok(match value {
            Some(Value::Object(map)) => Some(map),
            _ => None,
        })
    }

    /// Merge one relation's ids into the record's relation-index entry.
    ///
    /// The existing entry is read back first so setting one relation name
    /// never erases ids cached for other relation names on the same record.
    /// The merged entry is written with a fresh ttl.
    pub async fn cache_relation_ids(
        &self,
        table: &str,
        id: &str,
        relation: &str,
        ids: RelationIds,
        ttl: Duration,
    ) -> StrataResult<()> {
        if ttl.is_zero() {
            return Ok(());
        }
        let mut index = self.cached_relations(table, id).await?.unwrap_or_default();
        index.insert(relation.to_string(), ids);
        let value = serde_json::to_value(&index).map_err(serialization_error)?;
        self.store
            .set(&keys::relations_key(table, id), value, ttl)
            .await
    }

    /// Get the whole relation-index entry for one record.
    pub async fn cached_relations(
        &self,
        table: &str,
        id: &str,
    ) -> StrataResult<Option<BTreeMap<String, RelationIds>>> {
        let value = self.store.get(&keys::relations_key(table, id)).await?;
        Ok(match value {
            Some(value) => serde_json::from_value(value).ok(),
            None => None,
        })
    }

    /// Get the cached ids for one relation name. `Some(RelationIds::Empty)`
    /// means the relation was checked and found absent; `None` means it was
    /// never cached.
    pub async fn cached_relation_ids(
        &self,
        table: &str,
        id: &str,
        relation: &str,
    ) -> StrataResult<Option<RelationIds>> {
        Ok(self
            .cached_relations(table, id)
            .await?
            .and_then(|mut index| index.remove(relation)))
    }

    /// Store one list-page entry keyed by the exact normalized parameters.
    pub async fn cache_list(
        &self,
        table: &str,
        params: &NormalizedListParams,
        entry: &ListEntry,
        ttl: Duration,
    ) -> StrataResult<()> {
        if ttl.is_zero() {
            return Ok(());
        }
        let value = serde_json::to_value(entry).map_err(serialization_error)?;
        self.store.set(&keys::list_key(table, params), value, ttl).await
    }

    /// Get the list-page entry for exactly these normalized parameters.
    pub async fn cached_list(
        &self,
        table: &str,
        params: &NormalizedListParams,
    ) -> StrataResult<Option<ListEntry>> {
        let value = self.store.get(&keys::list_key(table, params)).await?;
        Ok(match value {
            Some(value) => serde_json::from_value(value).ok(),
            None => None,
        })
    }

    /// Invalidate one record: its entry, its relation index, and every list
    /// page of the table.
    ///
    /// List pages go wholesale because a mutated record can appear in
    /// unboundedly many previously cached pages and nothing tracks which
    /// pages reference which ids. Precision is traded for correctness here.
    pub async fn invalidate_record(&self, table: &str, id: &str) -> StrataResult<()> {
        self.store.delete(&keys::record_key(table, id)).await?;
        self.store.delete(&keys::relations_key(table, id)).await?;
        self.store.delete_prefix(&keys::list_prefix(table)).await?;
        Ok(())
    }

    /// Invalidate every entry of one table, returning how many were removed.
    /// Used when the scope of a change is unknown or table-wide.
    pub async fn invalidate_model(&self, table: &str) -> StrataResult<u64> {
        self.store.delete_prefix(&keys::table_prefix(table)).await
    }
}

impl<C: CacheStore> Clone for ModelCache<C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

fn serialization_error(e: serde_json::Error) -> strata_core::StrataError {
    CacheError::Serialization {
        reason: e.to_string(),
    }
    .into()
}

// =============================================================================
// TESTS
// =============================================================================


// =============================================================================
// PROPERTY TESTS
// =============================================================================
