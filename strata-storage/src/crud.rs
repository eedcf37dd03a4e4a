//! Per-model CRUD façade with cache-aside orchestration.
//!
//! [`CrudManager`] decides per call whether caching applies, sequences store
//! and cache operations around each verb, and sanitizes write payloads
//! against the model schema. The backing store stays the source of truth:
//! store errors propagate unmodified, cache errors are logged and degrade to
//! a miss or a skipped invalidation, never to a failed request.
//!
//! Writes are deliberately lazy about list pages: `create` and `update` do
//! not invalidate cached lists even though the row may now qualify or
//! disqualify for some cached filter. List entries are ttl-bounded, not
//! write-coherent. `delete` is the one verb that clears them, because a page
//! naming a removed id can never be served again.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{join_all, try_join};
use serde_json::Value;

use strata_core::{
    extract_id, Filter, ListEntry, ListParams, ListResult, ManagerMode, ModelConfig,
    NormalizedListParams, Query, Record, RelationDef, RelationIds, SortDirection, StrataResult,
};

use crate::cache::{CacheStore, ModelCache};
use crate::store::DataStore;

// =============================================================================
// SCHEMA HOOKS
// =============================================================================

/// Schema-dependent helpers, injected as a strategy.
///
/// Everything the manager needs to know about row shapes beyond the raw
/// `ModelConfig` lives behind this trait, so deployments with unusual id or
/// relation encodings can swap the behavior without touching the
/// orchestration.
pub trait SchemaHooks: Send + Sync {
    /// Make a field selection usable for cache population: a selection that
    /// omits the primary key gets it added, so returned rows can be keyed.
    fn ensure_primary_key(
        &self,
        config: &ModelConfig,
        select: Option<Vec<String>>,
    ) -> Option<Vec<String>>;

    /// Derive cacheable relation ids from a loaded relation field value.
    /// `None` means the value has no usable id shape and is skipped.
    fn relation_ids(&self, def: &RelationDef, value: &Value) -> Option<RelationIds>;

    /// Merge cached relation ids back onto a record on the cache-hit path.
    /// Fields the row already carries are never clobbered.
    fn attach_relations(
        &self,
        config: &ModelConfig,
        record: &mut Record,
        relations: &BTreeMap<String, RelationIds>,
    );
}

/// Default hooks driven entirely by `ModelConfig` and `RelationDef` metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSchemaHooks;

impl SchemaHooks for DefaultSchemaHooks {
    fn ensure_primary_key(
        &self,
        config: &ModelConfig,
        select: Option<Vec<String>>,
    ) -> Option<Vec<String>> {
        match select {
            None => None,
            Some(mut fields) => {
                if !fields.iter().any(|field| field == &config.primary_key) {
                    fields.push(config.primary_key.clone());
                }
                Some(fields)
            }
        }
    }

    fn relation_ids(&self, def: &RelationDef, value: &Value) -> Option<RelationIds> {
        match value {
            Value::Null => Some(RelationIds::Empty),
            Value::Number(n) => n.as_i64().map(RelationIds::One),
            Value::Object(map) => map
                .get(&def.target_primary_key)
                .and_then(Value::as_i64)
                .map(RelationIds::One),
            Value::Array(items) => {
                // Rows may carry bare ids or embedded objects; non-numeric
                // related keys are skipped rather than failing population.
                let ids = items
                    .iter()
                    .filter_map(|item| match item {
                        Value::Number(n) => n.as_i64(),
                        Value::Object(map) => {
                            map.get(&def.target_primary_key).and_then(Value::as_i64)
                        }
                        _ => None,
                    })
                    .collect();
                Some(RelationIds::Many(ids))
            }
            _ => None,
        }
    }

    fn attach_relations(
        &self,
        config: &ModelConfig,
        record: &mut Record,
        relations: &BTreeMap<String, RelationIds>,
    ) {
        for (name, ids) in relations {
            if !config.is_relation(name) || record.contains_key(name) {
                continue;
            }
            let value = serde_json::to_value(ids).unwrap_or(Value::Null);
            record.insert(name.clone(), value);
        }
    }
}

// =============================================================================
// CALL OPTIONS
// =============================================================================

/// Options for [`CrudManager::find_first`].
#[derive(Debug, Clone, Default)]
pub struct FindFirstOptions {
    pub filter: Filter,
    pub select: Option<Vec<String>>,
    /// Overrides the manager's cache-applicability default for this call.
    pub use_cache: Option<bool>,
}

impl FindFirstOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_select(mut self, select: Vec<String>) -> Self {
        self.select = Some(select);
        self
    }

    pub fn with_use_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = Some(use_cache);
        self
    }
}

/// Options for [`CrudManager::find_many`].
#[derive(Debug, Clone, Default)]
pub struct FindManyOptions {
    pub filter: Filter,
    pub search: String,
    pub select: Option<Vec<String>>,
    pub order_by: Option<String>,
    pub order_direction: SortDirection,
    pub limit: Option<u32>,
    pub offset: Option<u64>,
    pub use_cache: Option<bool>,
}

impl FindManyOptions {
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

    pub fn with_use_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = Some(use_cache);
        self
    }
}

/// Options for [`CrudManager::find_list`].
#[derive(Debug, Clone, Default)]
pub struct FindListOptions {
    pub params: ListParams,
    pub select: Option<Vec<String>>,
    pub use_cache: Option<bool>,
}

impl FindListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(mut self, params: ListParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_select(mut self, select: Vec<String>) -> Self {
        self.select = Some(select);
        self
    }

    pub fn with_use_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = Some(use_cache);
        self
    }
}

/// Options for the write verbs.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    pub select: Option<Vec<String>>,
    pub use_cache: Option<bool>,
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_select(mut self, select: Vec<String>) -> Self {
        self.select = Some(select);
        self
    }

    pub fn with_use_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = Some(use_cache);
        self
    }
}

// =============================================================================
// CRUD MANAGER
// =============================================================================

/// Per-model CRUD manager with cache-aside reads and write-triggered
/// population/invalidation.
///
/// Constructed with explicit dependencies — a store handle, a cache store
/// handle, and a validated model config — and carries no process-wide state.
pub struct CrudManager<S: DataStore, C: CacheStore, H: SchemaHooks = DefaultSchemaHooks> {
    store: Arc<S>,
    cache: ModelCache<C>,
    config: Arc<ModelConfig>,
    hooks: H,
    mode: ManagerMode,
}

impl<S: DataStore, C: CacheStore> CrudManager<S, C, DefaultSchemaHooks> {
    /// Create a manager with the default schema hooks, in `Client` mode.
    pub fn new(store: Arc<S>, cache_store: Arc<C>, config: Arc<ModelConfig>) -> Self {
        Self {
            store,
            cache: ModelCache::new(cache_store),
            config,
            hooks: DefaultSchemaHooks,
            mode: ManagerMode::default(),
        }
    }
}

impl<S: DataStore, C: CacheStore, H: SchemaHooks> CrudManager<S, C, H> {
    /// Replace the schema hooks.
    pub fn with_hooks<H2: SchemaHooks>(self, hooks: H2) -> CrudManager<S, C, H2> {
        CrudManager {
            store: self.store,
            cache: self.cache,
            config: self.config,
            hooks,
            mode: self.mode,
        }
    }

    /// Set the execution mode. `Server` mode never consults the cache unless
    /// a call forces it.
    pub fn with_mode(mut self, mode: ManagerMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn mode(&self) -> ManagerMode {
        self.mode
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn cache(&self) -> &ModelCache<C> {
        &self.cache
    }

    /// Whether a call with the given override consults the cache. The
    /// default requires `Client` mode and a positive configured ttl.
    pub fn should_use_cache(&self, call_override: Option<bool>) -> bool {
        match call_override {
            Some(forced) => forced,
            None => self.mode == ManagerMode::Client && self.config.cache_enabled(),
        }
    }

    fn table(&self) -> &str {
        &self.config.model_name
    }

    /// Configured ttl; zero when the model has caching disabled, which turns
    /// every populate into a no-op even when a call forces `use_cache`.
    fn ttl(&self) -> Duration {
        self.config.cache_ttl.unwrap_or(Duration::ZERO)
    }

    fn select_for(&self, use_cache: bool, select: Option<Vec<String>>) -> Option<Vec<String>> {
        if use_cache {
            self.hooks.ensure_primary_key(&self.config, select)
        } else {
            select
        }
    }

    /// Find a record by its primary-key value.
    pub async fn find_by_id(&self, id: impl Into<Value>) -> StrataResult<Option<Record>> {
        let filter = Filter::eq(self.config.primary_key.as_str(), id.into());
        self.find_first(FindFirstOptions::new().with_filter(filter))
            .await
    }

    /// Find the first record matching the filter.
    ///
    /// When the filter pins the primary key and caching applies, the record
    /// entry is consulted first and a hit returns without touching the
    /// store, with cached relation ids attached. Otherwise the store is
    /// queried and the result populates the cache.
    pub async fn find_first(&self, options: FindFirstOptions) -> StrataResult<Option<Record>> {
        let use_cache = self.should_use_cache(options.use_cache);
        let pinned = options.filter.pinned_id(&self.config.primary_key);

        if use_cache {
            if let Some(id) = &pinned {
                match self.cache.cached_record(self.table(), id).await {
                    Ok(Some(mut record)) => {
                        match self.cache.cached_relations(self.table(), id).await {
                            Ok(Some(relations)) => {
                                self.hooks
                                    .attach_relations(&self.config, &mut record, &relations)
                            }
                            Ok(None) => {}
                            Err(e) => tracing::warn!(
                                error = %e,
                                model = %self.config.model_name,
                                id = %id,
                                "cached relation read failed"
                            ),
                        }
                        return Ok(Some(record));
                    }
                    Ok(None) => {}
                    Err(e) => tracing::warn!(
                        error = %e,
                        model = %self.config.model_name,
                        id = %id,
                        "cache read failed, falling back to store"
                    ),
                }
            }
        }

        let query = Query {
            filter: options.filter,
            select: self.select_for(use_cache, options.select),
            limit: Some(1),
            ..Query::default()
        };
        let row = self.store.find_first(&self.config, &query).await?;
        if use_cache {
            if let Some(row) = &row {
                self.populate_row(row).await;
            }
        }
        Ok(row)
    }

    /// Find every record matching the options.
    ///
    /// Arbitrary multi-row queries are not addressed by a single record key,
    /// so this always queries the store; when caching applies, every
    /// returned row populates its record and relation entries so subsequent
    /// single-record lookups benefit.
    pub async fn find_many(&self, options: FindManyOptions) -> StrataResult<Vec<Record>> {
        let use_cache = self.should_use_cache(options.use_cache);
        let query = Query {
            filter: options.filter,
            search: options.search,
            select: self.select_for(use_cache, options.select),
            order_by: options.order_by,
            order_direction: options.order_direction,
            limit: options.limit,
            offset: options.offset,
        };
        let rows = self.store.find_many(&self.config, &query).await?;
        if use_cache {
            // Independent cache keys, safe to fan out.
            join_all(rows.iter().map(|row| self.populate_row(row))).await;
        }
        Ok(rows)
    }

    /// Find one page of records plus pagination bookkeeping.
    ///
    /// Parameters are normalized first; when caching applies and the exact
    /// normalized page was cached, the result is assembled from per-record
    /// entries without a store query. Any missing record entry degrades to a
    /// full miss. On miss, page rows and total count are fetched
    /// concurrently, then rows and the id page populate the cache.
    pub async fn find_list(&self, options: FindListOptions) -> StrataResult<ListResult> {
        let use_cache = self.should_use_cache(options.use_cache);
        let params = options.params.normalize(&self.config.primary_key);

        if use_cache {
            if let Some(result) = self.list_from_cache(&params).await {
                return Ok(result);
            }
        }

        let mut page_query = Query::for_page(&params);
        page_query.select = self.select_for(use_cache, options.select);
        let count_query = Query::new()
            .with_filter(params.filter.clone())
            .with_search(params.search.clone());

        let (rows, total) = try_join(
            self.store.find_many(&self.config, &page_query),
            self.store.count(&self.config, &count_query),
        )
        .await?;
        let result = ListResult::new(rows, total, &params);

        if use_cache {
            join_all(result.data.iter().map(|row| self.populate_row(row))).await;
            if let Some(entry) = ListEntry::from_result(&result, &self.config.primary_key) {
                if let Err(e) = self
                    .cache
                    .cache_list(self.table(), &params, &entry, self.ttl())
                    .await
                {
                    tracing::warn!(
                        error = %e,
                        model = %self.config.model_name,
                        "failed to cache list page"
                    );
                }
            }
        }
        Ok(result)
    }

    /// Create a record from a sanitized payload, then populate its cache
    /// entries.
    pub async fn create(&self, data: Record, options: WriteOptions) -> StrataResult<Record> {
        let use_cache = self.should_use_cache(options.use_cache);
        let sanitized = self.sanitize(data);
        let select = self.select_for(use_cache, options.select);
        let created = self
            .store
            .create(&self.config, sanitized, select.as_deref())
            .await?;
        if use_cache {
            self.populate_row(&created).await;
        }
        Ok(created)
    }

    /// Update the first record matching `filter` with a sanitized patch.
    ///
    /// Population doubles as the cache refresh: the new value overwrites the
    /// old record key, so no pre-invalidation is needed.
    pub async fn update(
        &self,
        filter: Filter,
        data: Record,
        options: WriteOptions,
    ) -> StrataResult<Record> {
        let use_cache = self.should_use_cache(options.use_cache);
        let sanitized = self.sanitize(data);
        let select = self.select_for(use_cache, options.select);
        let updated = self
            .store
            .update(&self.config, &filter, sanitized, select.as_deref())
            .await?;
        if use_cache {
            self.populate_row(&updated).await;
        }
        Ok(updated)
    }

    /// Delete the first record matching `filter`, then invalidate its cache
    /// entries and every list page of the table.
    pub async fn delete(&self, filter: Filter, options: WriteOptions) -> StrataResult<Record> {
        let use_cache = self.should_use_cache(options.use_cache);
        let pinned = filter.pinned_id(&self.config.primary_key);
        let select = self.select_for(use_cache, options.select);
        let removed = self
            .store
            .delete(&self.config, &filter, select.as_deref())
            .await?;

        if use_cache {
            let id = pinned.or_else(|| extract_id(&removed, &self.config.primary_key));
            let outcome = match &id {
                Some(id) => self.cache.invalidate_record(self.table(), id).await,
                // Scope of change unknown, clear the whole table.
                None => self.cache.invalidate_model(self.table()).await.map(|_| ()),
            };
            if let Err(e) = outcome {
                tracing::warn!(
                    error = %e,
                    model = %self.config.model_name,
                    "cache invalidation failed after delete"
                );
            }
        }
        Ok(removed)
    }

    /// Drop the primary key, empty relation sequences, and undeclared fields
    /// from a write payload.
    fn sanitize(&self, data: Record) -> Record {
        data.into_iter()
            .filter(|(field, value)| {
                if field == &self.config.primary_key {
                    return false;
                }
                if self.config.is_relation(field) {
                    // An explicit "no related rows" write is treated as
                    // omission; non-empty relation payloads pass through.
                    return !matches!(value, Value::Array(items) if items.is_empty());
                }
                self.config.is_column(field)
            })
            .collect()
    }

    /// Populate the record and relation-index entries for one row. Cache
    /// errors are logged and swallowed.
    async fn populate_row(&self, row: &Record) {
        let ttl = self.ttl();
        let Some(id) = extract_id(row, &self.config.primary_key) else {
            tracing::warn!(
                model = %self.config.model_name,
                "row has no usable primary key, skipping cache population"
            );
            return;
        };
        if let Err(e) = self.cache.cache_record(self.table(), &id, row, ttl).await {
            tracing::warn!(
                error = %e,
                model = %self.config.model_name,
                id = %id,
                "failed to cache record"
            );
        }
        for (name, def) in &self.config.relations {
            let Some(value) = row.get(name) else { continue };
            let Some(ids) = self.hooks.relation_ids(def, value) else {
                continue;
            };
            if let Err(e) = self
                .cache
                .cache_relation_ids(self.table(), &id, name, ids, ttl)
                .await
            {
                tracing::warn!(
                    error = %e,
                    model = %self.config.model_name,
                    id = %id,
                    relation = %name,
                    "failed to cache relation ids"
                );
            }
        }
    }

    /// Assemble a list result from the cached id page. Any cache error or
    /// missing record entry degrades to a full miss.
    async fn list_from_cache(&self, params: &NormalizedListParams) -> Option<ListResult> {
        let entry = match self.cache.cached_list(self.table(), params).await {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    model = %self.config.model_name,
                    "list cache read failed, falling back to store"
                );
                return None;
            }
        };

        let mut rows = Vec::with_capacity(entry.ids.len());
        for id in &entry.ids {
            match self.cache.cached_record(self.table(), id).await {
                Ok(Some(record)) => rows.push(record),
                Ok(None) => return None,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        model = %self.config.model_name,
                        id = %id,
                        "record read failed during list assembly"
                    );
                    return None;
                }
            }
        }
        Some(ListResult {
            data: rows,
            total: entry.total,
            page: entry.page,
            per_page: entry.per_page,
            total_pages: entry.total_pages,
        })
    }
}

impl<S: DataStore, C: CacheStore, H: SchemaHooks + Clone> Clone for CrudManager<S, C, H> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cache: self.cache.clone(),
            config: Arc::clone(&self.config),
            hooks: self.hooks.clone(),
            mode: self.mode,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
