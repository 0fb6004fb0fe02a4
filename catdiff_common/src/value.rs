use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A resource attribute value.
///
/// Mappings are kept in a `BTreeMap` so two values built from documents with
/// different key order compare equal. Sequences keep their order. There is no
/// coercion between variants: `1`, `1.0` and `"1"` are three different values.
/// Integers that fit `i64` are `Integer`; larger unsigned ones are kept exactly
/// as `UInteger` rather than rounded through `f64`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Integer(i64),
    UInteger(u64),
    Float(f64),
    String(String),
    Array(Vec<AttrValue>),
    Hash(BTreeMap<String, AttrValue>),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::String(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::String(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Integer(value)
    }
}

impl From<u64> for AttrValue {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(small) => AttrValue::Integer(small),
            Err(_) => AttrValue::UInteger(value),
        }
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Float(value)
    }
}

impl<T: Into<AttrValue>> From<Vec<T>> for AttrValue {
    fn from(values: Vec<T>) -> Self {
        AttrValue::Array(values.into_iter().map(Into::into).collect())
    }
}
