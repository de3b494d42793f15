//! Operation variables and their canonical string form.

use serde_json::{Map, Value};

/// Variables of a GraphQL operation.
pub type Variables = Map<String, Value>;

/// Serializes `value` to compact JSON with every object's keys sorted.
///
/// Two values that differ only in key insertion order produce the same string.
pub fn canonical_stringify(value: &Value) -> String {
    sort_keys(value).to_string()
}

/// Canonical form of optional variables; absent variables are the empty object.
pub fn canonical_variables(variables: Option<&Variables>) -> String {
    match variables {
        Some(variables) => canonical_object(variables).to_string(),
        None => String::from("{}"),
    }
}

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => canonical_object(map),
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

fn canonical_object(map: &Map<String, Value>) -> Value {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));
    Value::Object(
        entries
            .into_iter()
            .map(|(key, value)| (key.clone(), sort_keys(value)))
            .collect(),
    )
}
