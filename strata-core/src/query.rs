//! The row-oriented read shape consumed by backing stores.

use serde::{Deserialize, Serialize};

use crate::filter::Filter;
use crate::params::{NormalizedListParams, SortDirection};

/// A read against the backing store.
///
/// Point reads use `filter` and `select`; list reads add search, ordering,
/// and paging; counts use `filter` and `search` only and ignore the rest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub filter: Filter,
    pub search: String,
    pub select: Option<Vec<String>>,
    pub order_by: Option<String>,
    pub order_direction: SortDirection,
    pub limit: Option<u32>,
    pub offset: Option<u64>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_select(mut self, select: Vec<String>) -> Self {
        self.select = Some(select);
        self
    }

    pub fn with_order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(field.into());
        self
    }

    pub fn with_order_direction(mut self, direction: SortDirection) -> Self {
        self.order_direction = direction;
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// The page read for one normalized list request.
    pub fn for_page(params: &NormalizedListParams) -> Self {
        Self {
            filter: params.filter.clone(),
            search: params.search.clone(),
            select: None,
            order_by: Some(params.order_by.clone()),
            order_direction: params.order_direction,
            limit: Some(params.per_page),
            offset: Some(params.offset()),
        }
    }
}
