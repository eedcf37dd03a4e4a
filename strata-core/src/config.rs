//! Per-model configuration and the configuration-time model registry.
//!
//! A [`ModelConfig`] is the declarative schema the CRUD layer reads but does
//! not define: the primary-key field, the column allowlist used to sanitize
//! writes, the declared relations, and the optional cache ttl. Configs are
//! validated once and shared via [`ModelRegistry`], so per-model dispatch is
//! a map lookup resolved at wiring time rather than a runtime string
//! transform.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use crate::error::ConfigError;

/// Execution mode of a CRUD manager.
///
/// Caching is only consulted in `Client` mode, where slightly stale reads
/// are acceptable. `Server` mode always reads through to the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManagerMode {
    #[default]
    Client,
    Server,
}

/// Declared relation metadata: the model a relation points at and the field
/// that keys related rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDef {
    pub target_model: String,
    pub target_primary_key: String,
}

impl RelationDef {
    pub fn new(target_model: impl Into<String>) -> Self {
        Self {
            target_model: target_model.into(),
            target_primary_key: "id".to_string(),
        }
    }

    pub fn with_target_primary_key(mut self, field: impl Into<String>) -> Self {
        self.target_primary_key = field.into();
        self
    }
}

/// Declarative schema for one model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model_name: String,
    pub primary_key: String,
    /// Write-sanitization allowlist. Fields outside this set (and outside
    /// the declared relations) are dropped from create/update payloads.
    pub columns: BTreeSet<String>,
    pub relations: BTreeMap<String, RelationDef>,
    /// Absent or zero disables caching for this model.
    pub cache_ttl: Option<Duration>,
}

impl ModelConfig {
    pub fn new(model_name: impl Into<String>, primary_key: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            primary_key: primary_key.into(),
            columns: BTreeSet::new(),
            relations: BTreeMap::new(),
            cache_ttl: None,
        }
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.columns.insert(column.into());
        self
    }

    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn with_relation(mut self, name: impl Into<String>, def: RelationDef) -> Self {
        self.relations.insert(name.into(), def);
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Whether this model's reads may be cached at all.
    pub fn cache_enabled(&self) -> bool {
        matches!(self.cache_ttl, Some(ttl) if !ttl.is_zero())
    }

    pub fn is_column(&self, field: &str) -> bool {
        self.columns.contains(field)
    }

    pub fn is_relation(&self, field: &str) -> bool {
        self.relations.contains_key(field)
    }

    /// Validate the schema declaration.
    ///
    /// The model name must not contain `:`, which is the cache key
    /// separator; a name carrying it would let one model's keys alias
    /// another's prefix.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model_name.is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "model_name".to_string(),
            });
        }
        if self.model_name.contains(':') {
            return Err(ConfigError::InvalidValue {
                field: "model_name".to_string(),
                value: self.model_name.clone(),
                reason: "must not contain ':'".to_string(),
            });
        }
        if self.primary_key.is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "primary_key".to_string(),
            });
        }
        if self.columns.is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "columns".to_string(),
            });
        }
        for (name, def) in &self.relations {
            if name.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "relations".to_string(),
                    value: String::new(),
                    reason: "relation name must not be empty".to_string(),
                });
            }
            if def.target_model.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("relations.{}", name),
                    value: String::new(),
                    reason: "target model must not be empty".to_string(),
                });
            }
            if def.target_primary_key.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("relations.{}", name),
                    value: String::new(),
                    reason: "target primary key must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Configuration-time mapping from model name to shared config.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: HashMap<String, Arc<ModelConfig>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register a model, returning the shared handle.
    pub fn register(&mut self, config: ModelConfig) -> Result<Arc<ModelConfig>, ConfigError> {
        config.validate()?;
        if self.models.contains_key(&config.model_name) {
            return Err(ConfigError::DuplicateModel {
                model: config.model_name,
            });
        }
        let shared = Arc::new(config);
        self.models
            .insert(shared.model_name.clone(), Arc::clone(&shared));
        Ok(shared)
    }

    pub fn get(&self, model: &str) -> Option<Arc<ModelConfig>> {
        self.models.get(model).map(Arc::clone)
    }

    /// Like [`get`](Self::get) but typed as an error for wiring paths that
    /// require the model to exist.
    pub fn resolve(&self, model: &str) -> Result<Arc<ModelConfig>, ConfigError> {
        self.get(model).ok_or_else(|| ConfigError::UnknownModel {
            model: model.to_string(),
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn make_user_config() -> ModelConfig {
        ModelConfig::new("user", "id")
            .with_columns(["id", "name", "email"])
            .with_relation("roles", RelationDef::new("role"))
            .with_cache_ttl(Duration::from_secs(60))
    }

    #[test]
    fn test_builder_collects_schema() {
        let config = make_user_config();
        assert_eq!(config.model_name, "user");
        assert_eq!(config.primary_key, "id");
        assert!(config.is_column("email"));
        assert!(!config.is_column("roles"));
        assert!(config.is_relation("roles"));
        assert_eq!(
            config.relations["roles"].target_primary_key,
            "id".to_string()
        );
    }

    #[test]
    fn test_validate_accepts_complete_config() {
        assert!(make_user_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_names() {
        let err = ModelConfig::new("", "id")
            .with_column("id")
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { field } if field == "model_name"));

        let err = ModelConfig::new("user", "")
            .with_column("id")
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { field } if field == "primary_key"));
    }

    #[test]
    fn test_validate_rejects_colon_in_model_name() {
        let err = ModelConfig::new("user:admin", "id")
            .with_column("id")
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field, .. } if field == "model_name"));
    }

    #[test]
    fn test_validate_rejects_empty_columns() {
        let err = ModelConfig::new("user", "id").validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { field } if field == "columns"));
    }

    #[test]
    fn test_validate_rejects_incomplete_relation() {
        let err = ModelConfig::new("user", "id")
            .with_column("id")
            .with_relation("roles", RelationDef::new(""))
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field, .. } if field == "relations.roles"));
    }

    #[test]
    fn test_cache_enabled_requires_positive_ttl() {
        let disabled = ModelConfig::new("user", "id").with_column("id");
        assert!(!disabled.cache_enabled());

        let zero = disabled.clone().with_cache_ttl(Duration::ZERO);
        assert!(!zero.cache_enabled());

        let enabled = disabled.with_cache_ttl(Duration::from_secs(60));
        assert!(enabled.cache_enabled());
    }

    #[test]
    fn test_registry_register_and_resolve() {
        let mut registry = ModelRegistry::new();
        let shared = registry.register(make_user_config()).unwrap();
        assert_eq!(shared.model_name, "user");
        assert_eq!(registry.len(), 1);

        let resolved = registry.resolve("user").unwrap();
        assert_eq!(resolved.model_name, "user");
        assert!(Arc::ptr_eq(&shared, &resolved));
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let mut registry = ModelRegistry::new();
        registry.register(make_user_config()).unwrap();
        let err = registry.register(make_user_config()).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateModel { model } if model == "user"));
    }

    #[test]
    fn test_registry_unknown_model() {
        let registry = ModelRegistry::new();
        assert!(registry.get("ghost").is_none());
        let err = registry.resolve("ghost").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownModel { model } if model == "ghost"));
    }

    #[test]
    fn test_registry_rejects_invalid_config() {
        let mut registry = ModelRegistry::new();
        let err = registry.register(ModelConfig::new("user", "id")).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { .. }));
    }

    #[test]
    fn test_manager_mode_default_is_client() {
        assert_eq!(ManagerMode::default(), ManagerMode::Client);
    }
}
