//! Cache key derivation.
//!
//! The whole namespace hangs off the `{table}:` prefix so one prefix delete
//! can clear a model, and list pages get their own `{table}:list:` prefix so
//! record invalidation can clear every page without touching other tables.
//! `ModelConfig::validate` rejects `:` in model names, which keeps one
//! table's keys from aliasing another's prefix.

use strata_core::NormalizedListParams;

/// Separator between the key namespace segments.
const SEPARATOR: char = ':';

/// Key for one record entry: `{table}:{id}`.
pub fn record_key(table: &str, id: &str) -> String {
    format!("{table}{SEPARATOR}{id}")
}

/// Key for one record's relation-index entry: `{table}:{id}:relations`.
pub fn relations_key(table: &str, id: &str) -> String {
    format!("{table}{SEPARATOR}{id}{SEPARATOR}relations")
}

/// Key for one exact list page: `{table}:list:{canonical-params-json}`.
///
/// Only [`NormalizedListParams`] can reach this function, so un-normalized
/// parameters cannot fragment the list namespace.
pub fn list_key(table: &str, params: &NormalizedListParams) -> String {
    format!(
        "{table}{SEPARATOR}list{SEPARATOR}{}",
        params.cache_fragment()
    )
}

/// Prefix shared by every key of one table.
pub fn table_prefix(table: &str) -> String {
    format!("{table}{SEPARATOR}")
}

/// Prefix shared by every list-page key of one table.
pub fn list_prefix(table: &str) -> String {
    format!("{table}{SEPARATOR}list{SEPARATOR}")
}

// =============================================================================
// TESTS
// =============================================================================


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Property: every derived key is covered by its table prefix.
        #[test]
        fn prop_table_prefix_covers_keys(table in "[a-z_]{1,12}", id in "[a-zA-Z0-9-]{1,20}") {
            let prefix = table_prefix(&table);
            prop_assert!(record_key(&table, &id).starts_with(&prefix));
            prop_assert!(relations_key(&table, &id).starts_with(&prefix));
        }

        /// Property: distinct colon-free tables never capture each other's
        /// record keys through the prefix.
        #[test]
        fn prop_tables_are_isolated(
            table_a in "[a-z]{1,10}",
            table_b in "[a-z]{1,10}",
            id in "[a-zA-Z0-9]{1,10}",
        ) {
            prop_assume!(table_a != table_b);
            prop_assert!(!record_key(&table_a, &id).starts_with(&table_prefix(&table_b)));
        }
    }
}
