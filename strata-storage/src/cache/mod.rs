//! Cache-aside layer: key scheme, entry shapes, and invalidation.
//!
//! Three entry shapes live under one per-table key namespace:
//!
//! - **record** (`{table}:{id}`): the flat column values of one row, relation
//!   payloads stripped;
//! - **relation index** (`{table}:{id}:relations`): relation name mapped to
//!   related ids, merged incrementally;
//! - **list page** (`{table}:list:{params}`): the id sequence and counts of
//!   one exact paginated query.
//!
//! Invalidation is conservative: deleting a record also drops every list page
//! of its table, because nothing tracks which pages reference which ids.
//! Entries expire by ttl otherwise; the cache is a read accelerator, never a
//! source of truth.

pub mod keys;
pub mod memory;
pub mod model_cache;
pub mod traits;

pub use memory::MemoryCacheStore;
pub use model_cache::ModelCache;
pub use traits::{CacheStats, CacheStore};
