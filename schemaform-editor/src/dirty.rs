//! Change tracking and dirtiness.
//!
//! Dirtiness is not equality. `null`, an absent value and `{}` are one
//! "empty" class, and only keys recorded in the [`ChangeSet`] are compared.
//! Any change to an object or array value counts as dirty without a deep
//! comparison.

use serde_json::{Map, Value};

/// Keys touched since the last commit or rollback, in first-touch order,
/// with the most recent value written (`None` when the key was removed).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    entries: Vec<(String, Option<Value>)>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, key: impl Into<String>, value: Option<Value>) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Records every entry of `values` as written.
    pub fn record_all(&mut self, values: &Map<String, Value>) {
        for (key, value) in values {
            self.record(key.clone(), Some(value.clone()));
        }
    }

    pub fn get(&self, key: &str) -> Option<Option<&Value>> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_ref())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// `None`, `null` and `{}`.
pub fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Object(map)) => map.is_empty(),
        Some(_) => false,
    }
}

/// Whether `new` is a real change from `old`, looking only at the keys in
/// `changes`.
pub fn reconcile(old: Option<&Value>, new: Option<&Value>, changes: &ChangeSet) -> bool {
    match (is_empty_value(old), is_empty_value(new)) {
        (true, true) => return false,
        (true, false) | (false, true) => return true,
        (false, false) => {}
    }

    match (old, new) {
        (Some(Value::Object(old)), Some(Value::Object(new))) => changes
            .keys()
            .any(|key| value_changed(old.get(key), new.get(key))),
        _ => value_changed(old, new),
    }
}

fn value_changed(old: Option<&Value>, new: Option<&Value>) -> bool {
    let old = old.unwrap_or(&Value::Null);
    let new = new.unwrap_or(&Value::Null);
    if type_name(old) != type_name(new) {
        return true;
    }
    if is_collection(old) || is_collection(new) {
        return true;
    }
    old != new
}

fn is_collection(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
