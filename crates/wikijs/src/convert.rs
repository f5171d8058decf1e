//! Conversions between host-side primitives and GraphQL wire values.
//!
//! The host tracks identity as strings and permissions as sets; the API wants
//! 32-bit `Int` ids, ordered lists, and JSON-encoded config values.

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeSet;

/// Parse a host-side identity into a GraphQL `Int`.
pub fn parse_id(id: &str) -> Result<i32> {
    id.trim()
        .parse::<i32>()
        .map_err(|_| Error::InvalidId(id.to_string()))
}

/// Render a GraphQL `Int` as a host-side identity.
#[must_use]
pub fn format_id(id: i32) -> String {
    id.to_string()
}

/// Collect strings into a set, dropping duplicates and order.
pub fn to_set<I, S>(items: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

/// Flatten a set into the list the API expects.
#[must_use]
pub fn to_wire_list(set: &BTreeSet<String>) -> Vec<String> {
    set.iter().cloned().collect()
}

/// Encode an instance config value for `KeyValuePairInput.value`.
///
/// Wiki.js reads the value back out of a `{"v": ...}` envelope.
pub fn encode_config_value(value: &Value) -> Result<String> {
    Ok(serde_json::to_string(&serde_json::json!({ "v": value }))?)
}

/// Decode a `KeyValuePair.value` returned by `activeStrategies`.
///
/// Accepts the `{"v": ...}` input envelope, the `{"value": ...}` descriptor
/// shape the API answers with, or a bare JSON value. Anything that is not JSON
/// is kept as a plain string.
#[must_use]
pub fn decode_config_value(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(mut map)) => {
            if let Some(v) = map.remove("v") {
                v
            } else if let Some(v) = map.remove("value") {
                v
            } else {
                Value::Object(map)
            }
        }
        Ok(other) => other,
        Err(_) => Value::String(raw.to_string()),
    }
}

/// Deserialize a nullable field into its default value.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserialize a list that may contain nulls, dropping them.
pub(crate) fn compact_list<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let items = Option::<Vec<Option<T>>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(items.into_iter().flatten().collect())
}
