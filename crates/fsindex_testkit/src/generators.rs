//! Property-based test generators using proptest.
//!
//! Generated keys and values are always valid path segments, so properties
//! exercise index behavior rather than input validation.

use proptest::prelude::*;
use std::collections::BTreeMap;

/// Strategy for primary keys shaped like `goefe-789`.
pub fn primary_key_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z]{5}-[0-9]{3}").expect("Invalid regex")
}

/// Strategy for indexed values: names, mail addresses, colors.
///
/// Excludes glob metacharacters so a value can double as a literal pattern.
pub fn value_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z0-9][A-Za-z0-9@._ -]{0,23}")
        .expect("Invalid regex")
}

/// Strategy for a small value vocabulary, so non-unique values collide.
pub fn color_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["Black", "Brown", "Green", "Grey", "White"])
        .prop_map(str::to_owned)
}

/// Strategy for entries with distinct primary keys.
pub fn entries_strategy<V>(values: V, max: usize) -> impl Strategy<Value = BTreeMap<String, String>>
where
    V: Strategy<Value = String>,
{
    prop::collection::btree_map(primary_key_strategy(), values, 1..max)
}

/// Strategy for strings that must be rejected as keys or values.
pub fn invalid_segment_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just(".".to_owned()),
        Just("..".to_owned()),
        prop::string::string_regex("[a-z]{0,5}/[a-z]{0,5}").expect("Invalid regex"),
        prop::string::string_regex("[a-z]{0,5}\\\\[a-z]{0,5}").expect("Invalid regex"),
    ]
}

/// A fresh random primary key.
pub fn uuid_key() -> String {
    uuid::Uuid::new_v4().to_string()
}
