//! STRATA Core - Model Configuration and Value Types
//!
//! Defines the schema-driven value layer shared by the storage and caching
//! crates: dynamic records, equality filters, list parameters with
//! deterministic normalization, and per-model configuration. No I/O happens
//! here.

pub mod config;
pub mod error;
pub mod filter;
pub mod params;
pub mod query;
pub mod record;

pub use config::{ManagerMode, ModelConfig, ModelRegistry, RelationDef};
pub use error::{CacheError, ConfigError, StoreError, StrataError, StrataResult};
pub use filter::Filter;
pub use params::{ListEntry, ListParams, ListResult, NormalizedListParams, SortDirection};
pub use query::Query;
pub use record::{extract_id, id_from_value, Record, RecordId, RelationIds};
