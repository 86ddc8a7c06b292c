use std::{collections::BTreeMap, ops::Bound};

use serde::{Deserialize, Serialize};

/// Single value of the namespace. Stored as plain json scalars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrefValue {
    Bool(bool),
    Int(i64),
    Text(String),
    /// Anything else found in the file (floats, nulls, nested values). Kept as is, typed getters
    /// read it as missing.
    Other(serde_json::Value),
}

/// Snapshot of the whole key-value namespace. Getters fall back to the provided default when the
/// key is missing or holds a value of another type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Prefs {
    values: BTreeMap<String, PrefValue>,
}

impl Prefs {
    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        match self.values.get(key) {
            Some(PrefValue::Int(v)) => *v,
            _ => default,
        }
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(PrefValue::Text(v)) => Some(v),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.values.get(key) {
            Some(PrefValue::Bool(v)) => *v,
            _ => default,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn put_int(&mut self, key: impl Into<String>, value: i64) {
        self.values.insert(key.into(), PrefValue::Int(value));
    }

    pub fn put_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), PrefValue::Text(value.into()));
    }

    pub fn put_bool(&mut self, key: impl Into<String>, value: bool) {
        self.values.insert(key.into(), PrefValue::Bool(value));
    }

    pub fn remove(&mut self, key: &str) -> Option<PrefValue> {
        self.values.remove(key)
    }

    /// Iterates over keys sharing `prefix` in key order.
    pub fn keys_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.values
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .map(|(key, _)| key.as_str())
            .take_while(move |key| key.starts_with(prefix))
    }
}
