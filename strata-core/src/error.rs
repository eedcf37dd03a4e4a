//! Error types for STRATA operations

use thiserror::Error;

/// Model configuration and registry errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Model not registered: {model}")]
    UnknownModel { model: String },

    #[error("Model already registered: {model}")]
    DuplicateModel { model: String },
}

/// Backing-store errors. These always propagate to the caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Record not found in {model}")]
    NotFound { model: String },

    #[error("Insert failed for {model}: {reason}")]
    InsertFailed { model: String, reason: String },

    #[error("Update failed for {model}: {reason}")]
    UpdateFailed { model: String, reason: String },

    #[error("Delete failed for {model}: {reason}")]
    DeleteFailed { model: String, reason: String },

    #[error("Query failed for {model}: {reason}")]
    QueryFailed { model: String, reason: String },

    #[error("Primary key missing or unusable for {model}")]
    InvalidPrimaryKey { model: String },

    #[error("Store lock poisoned")]
    LockPoisoned,
}

/// Cache-store errors. The CRUD layer treats these as misses or no-ops,
/// never as request failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache entry serialization failed: {reason}")]
    Serialization { reason: String },

    #[error("Cache backend error: {reason}")]
    Backend { reason: String },

    #[error("Cache lock poisoned")]
    LockPoisoned,
}

/// Master error type for all STRATA errors.
#[derive(Debug, Clone, Error)]
pub enum StrataError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

/// Result type alias for STRATA operations.
pub type StrataResult<T> = Result<T, StrataError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display_not_found() {
        let err = StoreError::NotFound {
            model: "user".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Record not found"));
        assert!(msg.contains("user"));
    }

    #[test]
    fn test_store_error_display_insert_failed() {
        let err = StoreError::InsertFailed {
            model: "post".to_string(),
            reason: "duplicate id".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Insert failed"));
        assert!(msg.contains("post"));
        assert!(msg.contains("duplicate id"));
    }

    #[test]
    fn test_store_error_display_lock_poisoned() {
        let err = StoreError::LockPoisoned;
        let msg = format!("{}", err);
        assert!(msg.contains("lock poisoned"));
    }

    #[test]
    fn test_cache_error_display_serialization() {
        let err = CacheError::Serialization {
            reason: "invalid type".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("serialization failed"));
        assert!(msg.contains("invalid type"));
    }

    #[test]
    fn test_config_error_display_invalid_value() {
        let err = ConfigError::InvalidValue {
            field: "model_name".to_string(),
            value: "a:b".to_string(),
            reason: "must not contain ':'".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("model_name"));
        assert!(msg.contains("a:b"));
        assert!(msg.contains("must not contain"));
    }

    #[test]
    fn test_config_error_display_unknown_model() {
        let err = ConfigError::UnknownModel {
            model: "ghost".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("not registered"));
        assert!(msg.contains("ghost"));
    }

    #[test]
    fn test_strata_error_from_variants() {
        let store = StrataError::from(StoreError::LockPoisoned);
        assert!(matches!(store, StrataError::Store(_)));

        let cache = StrataError::from(CacheError::Backend {
            reason: "closed".to_string(),
        });
        assert!(matches!(cache, StrataError::Cache(_)));

        let config = StrataError::from(ConfigError::MissingRequired {
            field: "primary_key".to_string(),
        });
        assert!(matches!(config, StrataError::Config(_)));
    }
}
