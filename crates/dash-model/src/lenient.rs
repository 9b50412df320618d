//! Tolerant field readers
//!
//! Stored dashboards come from many tool versions and from hand edits. A
//! `null` or wrongly shaped optional field falls back to its default instead
//! of rejecting the whole document.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// String; numbers and booleans are stringified, anything else is empty
pub(crate) fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(scalar_string(Value::deserialize(deserializer)?).unwrap_or_default())
}

/// Optional string; non-scalars read as absent
pub(crate) fn opt_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(scalar_string(Value::deserialize(deserializer)?))
}

/// Optional flag; anything but a boolean reads as absent
pub(crate) fn opt_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    Ok(Value::deserialize(deserializer)?.as_bool())
}

/// Flag defaulting to `true`
pub(crate) fn bool_or_true<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(opt_bool(deserializer)?.unwrap_or(true))
}

/// Flag defaulting to `false`
pub(crate) fn bool_or_false<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(opt_bool(deserializer)?.unwrap_or(false))
}

/// Optional integer
pub(crate) fn opt_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(Value::deserialize(deserializer)?.as_i64())
}

/// Non-negative counter, 0 when unreadable
pub(crate) fn counter<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(Value::deserialize(deserializer)?.as_u64().unwrap_or(0))
}

/// Schema version, read the way the migrator reads it
pub(crate) fn schema_version<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Ok(dash_migrate::parse_version(&Value::deserialize(deserializer)?).unwrap_or(0))
}

/// Optional object; anything else reads as absent
pub(crate) fn opt_map<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Map<String, Value>>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Object(map) => Ok(Some(map)),
        _ => Ok(None),
    }
}

/// List; a non-list is empty and unreadable entries are skipped
pub(crate) fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable list entry");
                None
            }
        })
        .collect())
}

/// List of strings; scalar entries are stringified, others skipped
pub(crate) fn string_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(items.into_iter().filter_map(scalar_string).collect())
}

/// Any value, or its default when the stored shape does not fit
pub(crate) fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "unreadable field, using default");
        T::default()
    }))
}

fn scalar_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Fields {
        #[serde(deserialize_with = "string")]
        name: String,
        #[serde(deserialize_with = "string_list")]
        tags: Vec<String>,
        #[serde(deserialize_with = "list")]
        counts: Vec<u32>,
        #[serde(deserialize_with = "bool_or_true")]
        enabled: bool,
    }

    #[test]
    fn nulls_fall_back_to_defaults() {
        let parsed: Fields =
            serde_json::from_value(json!({"name": null, "tags": null, "counts": null, "enabled": null}))
                .unwrap();
        assert_eq!(parsed.name, "");
        assert!(parsed.tags.is_empty());
        assert!(parsed.counts.is_empty());
        assert!(parsed.enabled);
    }

    #[test]
    fn mixed_entries_are_salvaged() {
        let parsed: Fields = serde_json::from_value(json!({
            "name": 42,
            "tags": ["a", 1, true, {"x": 1}],
            "counts": [1, "two", 3]
        }))
        .unwrap();
        assert_eq!(parsed.name, "42");
        assert_eq!(parsed.tags, vec!["a", "1", "true"]);
        assert_eq!(parsed.counts, vec![1, 3]);
    }
}
