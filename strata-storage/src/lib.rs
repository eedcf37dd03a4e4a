//! STRATA Storage - Backing-Store Contract and Cache-Aside Layer
//!
//! The backing store ([`DataStore`]) is the source of truth; the cache layer
//! ([`ModelCache`] over a [`CacheStore`]) is strictly a read accelerator with
//! ttl-bounded staleness. [`CrudManager`] orchestrates the two per model:
//! cache-aside reads, schema-sanitized writes, populate-on-write, and
//! conservative invalidation on delete.
//!
//! # Staleness trade-off
//!
//! `create` and `update` refresh record entries in place but leave cached
//! list pages alone, so a filtered list can serve a page that no longer
//! reflects a row's latest values until its ttl elapses. This is deliberate:
//! list caches are ttl-bounded, not write-coherent. Deployments that need
//! read-your-writes list behavior should disable caching for the model or
//! call [`ModelCache::invalidate_model`] after writes.

pub mod cache;
pub mod crud;
pub mod memory;
pub mod store;

pub use cache::{CacheStats, CacheStore, MemoryCacheStore, ModelCache};
pub use crud::{
    CrudManager, DefaultSchemaHooks, FindFirstOptions, FindListOptions, FindManyOptions,
    SchemaHooks, WriteOptions,
};
pub use memory::MemoryStore;
pub use store::DataStore;
