//! Property-based test generators using proptest.
//!
//! Provides strategies for model names, property names and values that
//! are valid inside backend keys.

use proptest::prelude::*;
use std::collections::BTreeMap;

/// Strategy for model type names in CamelCase (`"UserAccount"`).
pub fn type_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z][a-z]{1,8}([A-Z][a-z]{1,8}){0,2}").expect("Invalid regex")
}

/// Strategy for property names other than `id`.
pub fn property_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,15}")
        .expect("Invalid regex")
        .prop_filter("Property name must not be id", |s| s != "id")
}

/// Strategy for property values, including the empty string and
/// characters that are significant in RESP and key names.
pub fn value_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        "[a-zA-Z0-9@._ -]{1,32}",
        "[a-z:]{1,16}",
        any::<String>().prop_map(|s| s.chars().take(32).collect()),
    ]
}

/// Strategy for a set of distinct property names with a value each.
pub fn attributes_strategy() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map(property_name_strategy(), value_strategy(), 1..8)
}

/// Strategy for a list of distinct non-empty values for uniqueness tests.
pub fn distinct_values_strategy(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set("[a-z0-9]{1,12}@[a-z]{1,8}", 1..max.max(2))
        .prop_map(|set| set.into_iter().collect())
}
