//! In-memory cache store.
//!
//! Reference implementation of the [`CacheStore`] contract: a `RwLock`ed map
//! of JSON values with wall-clock expiry. Expired entries are evicted lazily
//! on read; long-lived processes can call [`purge_expired`] periodically to
//! reclaim entries no one reads again.
//!
//! [`purge_expired`]: MemoryCacheStore::purge_expired

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use strata_core::{CacheError, StrataError, StrataResult};

use super::traits::{CacheStore, CacheStats};

/// One stored value with its expiry instant.
#[derive(Debug, Clone)]
struct CacheSlot {
    value: Value,
    expires_at: DateTime<Utc>,
}

impl CacheSlot {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Default)]
struct Inner {
    slots: RwLock<HashMap<String, CacheSlot>>,
    hits: AtomicU64,
    misses: AtomicU64,
    expired_evictions: AtomicU64,
}

/// In-memory [`CacheStore`] implementation.
pub struct MemoryCacheStore {
    inner: Arc<Inner>,
}

impl MemoryCacheStore {
    /// Create a new empty cache store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner::default()),
        }
    }

    /// Number of entries currently held, expired ones included until they
    /// are evicted.
    pub fn len(&self) -> StrataResult<usize> {
        Ok(self.read_slots()?.len())
    }

    pub fn is_empty(&self) -> StrataResult<bool> {
        Ok(self.read_slots()?.is_empty())
    }

    /// Drop every entry whose ttl has elapsed, returning how many were
    /// removed.
    pub fn purge_expired(&self) -> StrataResult<u64> {
        let now = Utc::now();
        let mut slots = self.write_slots()?;
        let before = slots.len();
        slots.retain(|_, slot| !slot.is_expired(now));
        let removed = (before - slots.len()) as u64;
        self.inner
            .expired_evictions
            .fetch_add(removed, Ordering::Relaxed);
        Ok(removed)
    }

    /// Remove every entry regardless of expiry.
    pub fn clear(&self) -> StrataResult<()> {
        self.write_slots()?.clear();
        Ok(())
    }

    fn read_slots(
        &self,
    ) -> StrataResult<std::sync::RwLockReadGuard<'_, HashMap<String, CacheSlot>>> {
        self.inner
            .slots
            .read()
            .map_err(|_| StrataError::Cache(CacheError::LockPoisoned))
    }

    fn write_slots(
        &self,
    ) -> StrataResult<std::sync::RwLockWriteGuard<'_, HashMap<String, CacheSlot>>> {
        self.inner
            .slots
            .write()
            .map_err(|_| StrataError::Cache(CacheError::LockPoisoned))
    }

    fn record_hit(&self) {
        self.inner.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self) {
        self.inner.misses.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MemoryCacheStore {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> StrataResult<Option<Value>> {
        let now = Utc::now();

        // Fast path under the read lock; expired entries fall through to
        // eviction below.
        {
            let slots = self.read_slots()?;
            match slots.get(key) {
                Some(slot) if !slot.is_expired(now) => {
                    self.record_hit();
                    return Ok(Some(slot.value.clone()));
                }
                Some(_) => {}
                None => {
                    self.record_miss();
                    return Ok(None);
                }
            }
        }

        // The entry was present but expired. Re-check under the write lock,
        // another reader may have evicted it already.
        let mut slots = self.write_slots()?;
        if let Some(slot) = slots.get(key) {
            if slot.is_expired(now) {
                slots.remove(key);
                self.inner.expired_evictions.fetch_add(1, Ordering::Relaxed);
            } else {
                // Overwritten with a fresh value between the two locks.
                self.record_hit();
                return Ok(Some(slot.value.clone()));
            }
        }
        self.record_miss();
        Ok(None)
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> StrataResult<()> {
        let expires_at = Utc::now()
            + chrono::Duration::from_std(ttl).map_err(|e| {
                StrataError::Cache(CacheError::Backend {
                    reason: format!("ttl out of range: {}", e),
                })
            })?;
        self.write_slots()?
            .insert(key.to_string(), CacheSlot { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> StrataResult<()> {
        self.write_slots()?.remove(key);
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> StrataResult<u64> {
        let mut slots = self.write_slots()?;
        let before = slots.len();
        slots.retain(|key, _| !key.starts_with(prefix));
        Ok((before - slots.len()) as u64)
    }

    async fn stats(&self) -> StrataResult<CacheStats> {
        let entry_count = self.read_slots()?.len() as u64;
        Ok(CacheStats {
            hits: self.inner.hits.load(Ordering::Relaxed),
            misses: self.inner.misses.load(Ordering::Relaxed),
            entry_count,
            expired_evictions: self.inner.expired_evictions.load(Ordering::Relaxed),
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
