//! Cache store contract.
//!
//! Abstracts over key-value stores with per-entry expiry (in-memory, Redis,
//! and the like). Implementations must be thread-safe; the only ordering
//! guarantee callers may rely on is last-write-wins per key.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use strata_core::StrataResult;

/// A process-wide key-value store with per-entry time-to-live and prefix
/// deletion.
///
/// Values are JSON so the three entry shapes (record, relation index, list
/// page) share one transport without a serialization scheme per shape.
/// Expired entries must behave as absent on `get`.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get a live value, or `None` when the key is absent or expired.
    async fn get(&self, key: &str) -> StrataResult<Option<Value>>;

    /// Store a value under `key` for `ttl`, overwriting any prior entry.
    async fn set(&self, key: &str, value: Value, ttl: Duration) -> StrataResult<()>;

    /// Remove one key. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> StrataResult<()>;

    /// Remove every key starting with `prefix`, returning how many were
    /// removed.
    async fn delete_prefix(&self, prefix: &str) -> StrataResult<u64>;

    /// Usage counters for observability.
    async fn stats(&self) -> StrataResult<CacheStats>;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of entries currently live.
    pub entry_count: u64,
    /// Number of entries evicted after expiring.
    pub expired_evictions: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_stats_hit_rate() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            ..Default::default()
        };
        assert!((stats.hit_rate() - 0.8).abs() < 0.001);

        let empty_stats = CacheStats::default();
        assert!((empty_stats.hit_rate() - 0.0).abs() < 0.001);
    }
}
