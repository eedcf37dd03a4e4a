//! Async backing-store contract.
//!
//! The store is the source of truth. The cache layer in front of it never
//! masks or retries a failed store operation, so every error returned here
//! reaches the caller unmodified.

use async_trait::async_trait;
use strata_core::{Filter, ModelConfig, Query, Record, StrataResult};

/// Row-oriented store operations, dispatched per model.
///
/// Implementations evaluate equality filters and free-text search, apply
/// ordering, paging, and field projection, and assign primary keys on insert
/// when the payload carries none. Rows come back as plain records with no
/// embedded live relation objects unless the caller selected them.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// First record matching the query, if any.
    async fn find_first(
        &self,
        model: &ModelConfig,
        query: &Query,
    ) -> StrataResult<Option<Record>>;

    /// All records matching the query, in query order.
    async fn find_many(&self, model: &ModelConfig, query: &Query) -> StrataResult<Vec<Record>>;

    /// Number of records matching the query's filter and search term.
    /// Ordering, paging, and projection are ignored.
    async fn count(&self, model: &ModelConfig, query: &Query) -> StrataResult<u64>;

    /// Insert a record, assigning the primary key when the payload has none.
    /// Returns the stored row, projected through `select` when given.
    async fn create(
        &self,
        model: &ModelConfig,
        data: Record,
        select: Option<&[String]>,
    ) -> StrataResult<Record>;

    /// Merge `data` into the first record matching `filter`, returning the
    /// updated row.
    async fn update(
        &self,
        model: &ModelConfig,
        filter: &Filter,
        data: Record,
        select: Option<&[String]>,
    ) -> StrataResult<Record>;

    /// Remove the first record matching `filter`, returning the removed row.
    async fn delete(
        &self,
        model: &ModelConfig,
        filter: &Filter,
        select: Option<&[String]>,
    ) -> StrataResult<Record>;
}
