//! Plain structural values flowing through the form pipeline.
//!
//! A [`FormValue`] is what the deriver produces for a fresh form, what the coercer
//! produces from a submission, and what the validator checks. It distinguishes
//! "absent" ([`FormValue::Undefined`]) from "no value" ([`FormValue::Null`]), which
//! JSON alone cannot.
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use num_bigint::BigInt;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

static NEXT_SYMBOL: AtomicU64 = AtomicU64::new(1);

/// Process-unique token. Two symbols are equal only if they were minted together.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    id: u64,
    description: Option<String>,
}

impl Symbol {
    pub fn new(description: Option<String>) -> Self {
        Self {
            id: NEXT_SYMBOL.fetch_add(1, Ordering::Relaxed),
            description,
        }
    }

    pub fn id(&self) -> u64 { self.id }

    pub fn description(&self) -> Option<&str> { self.description.as_deref() }
}

/// Binary payload submitted as a file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blob {
    pub data: Bytes,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

impl Blob {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into(), ..Self::default() }
    }

    pub fn size(&self) -> usize { self.data.len() }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum FormValue {
    /// Absent.
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    BigInt(BigInt),
    String(String),
    Symbol(Symbol),
    /// `None` is an unparseable date; the validator rejects it.
    Date(Option<DateTime<Utc>>),
    Blob(Blob),
    Array(Vec<FormValue>),
    Set(Vec<FormValue>),
    Map(Vec<(FormValue, FormValue)>),
    Object(IndexMap<String, FormValue>),
}

impl FormValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::BigInt(_) => "bigint",
            Self::String(_) => "string",
            Self::Symbol(_) => "symbol",
            Self::Date(_) => "date",
            Self::Blob(_) => "blob",
            Self::Array(_) => "array",
            Self::Set(_) => "set",
            Self::Map(_) => "map",
            Self::Object(_) => "object",
        }
    }

    pub fn is_undefined(&self) -> bool { matches!(self, Self::Undefined) }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, FormValue>> {
        match self {
            Self::Object(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[FormValue]> {
        match self {
            Self::Array(xs) => Some(xs),
            _ => None,
        }
    }

    /// Field lookup on objects; `None` for any other shape or a missing key.
    pub fn get(&self, key: &str) -> Option<&FormValue> {
        self.as_object().and_then(|m| m.get(key))
    }

    /// JSON rendering. Absent object entries are dropped, absent array slots,
    /// NaN and symbols become `null`, bigints become decimal strings.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Undefined | Self::Null | Self::Symbol(_) => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Self::BigInt(i) => Value::String(i.to_string()),
            Self::String(s) => Value::String(s.clone()),
            Self::Date(Some(d)) => Value::String(d.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Self::Date(None) => Value::Null,
            Self::Blob(blob) => serde_json::json!({
                "name": blob.file_name,
                "type": blob.content_type,
                "size": blob.size(),
            }),
            Self::Array(xs) | Self::Set(xs) => Value::Array(xs.iter().map(Self::to_json).collect()),
            Self::Map(pairs) => Value::Array(
                pairs.iter()
                    .map(|(k, v)| Value::Array(vec![k.to_json(), v.to_json()]))
                    .collect(),
            ),
            Self::Object(m) => {
                let mut out = Map::new();
                for (k, v) in m {
                    if !v.is_undefined() {
                        out.insert(k.clone(), v.to_json());
                    }
                }
                Value::Object(out)
            }
        }
    }
}

impl From<Value> for FormValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => Self::String(s),
            Value::Array(xs) => Self::Array(xs.into_iter().map(Self::from).collect()),
            Value::Object(m) => Self::Object(m.into_iter().map(|(k, v)| (k, Self::from(v))).collect()),
        }
    }
}

impl From<&str> for FormValue {
    fn from(s: &str) -> Self { Self::String(s.to_owned()) }
}

impl From<String> for FormValue {
    fn from(s: String) -> Self { Self::String(s) }
}

impl From<f64> for FormValue {
    fn from(n: f64) -> Self { Self::Number(n) }
}

impl From<bool> for FormValue {
    fn from(b: bool) -> Self { Self::Bool(b) }
}

impl Serialize for FormValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl fmt::Display for FormValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::String(s) => f.write_str(s),
            Self::BigInt(i) => write!(f, "{i}"),
            Self::Number(n) if n.is_nan() => f.write_str("NaN"),
            Self::Symbol(sym) => write!(f, "Symbol({})", sym.description().unwrap_or_default()),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn json_objects_keep_key_order() {
        let v = FormValue::from(json!({"b": 1, "a": [true, null, "x"]}));
        let keys: Vec<_> = v.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(v.to_json(), json!({"b": 1.0, "a": [true, null, "x"]}));
    }

    #[test]
    fn absent_entries_are_dropped_from_json() {
        let mut m = IndexMap::new();
        m.insert("kept".to_string(), FormValue::Null);
        m.insert("gone".to_string(), FormValue::Undefined);
        m.insert("big".to_string(), FormValue::BigInt(BigInt::from(12345678901234567890u64)));
        m.insert("nan".to_string(), FormValue::Number(f64::NAN));
        assert_eq!(
            FormValue::Object(m).to_json(),
            json!({"kept": null, "big": "12345678901234567890", "nan": null})
        );
    }

    #[test]
    fn symbols_are_unique() {
        let a = Symbol::new(Some("x".into()));
        let b = Symbol::new(Some("x".into()));
        assert_ne!(a, b);
        assert_eq!(a.clone(), a);
        assert_eq!(a.description(), Some("x"));
    }

    #[test]
    fn blob_renders_metadata_only() {
        let blob = Blob {
            data: Bytes::from_static(b"hello"),
            content_type: Some("text/plain".into()),
            file_name: Some("a.txt".into()),
        };
        assert_eq!(
            FormValue::Blob(blob).to_json(),
            json!({"name": "a.txt", "type": "text/plain", "size": 5})
        );
    }
}
