//! Structured attributes carried by every record
//!
//! An [`Attr`] is a key paired with a [`Value`]. A group is an attribute
//! whose value is a nested ordered sequence of attributes, used for
//! namespacing (e.g. `address.city`). Attribute order is always insertion
//! order. Duplicate keys are preserved rather than collapsed; handlers must
//! tolerate them and never assume uniqueness.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Value type for structured attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Time(DateTime<Utc>),
    Duration(Duration),
    /// Nested ordered attribute sequence
    Group(Vec<Attr>),
    /// Opaque payload carried as JSON
    Any(serde_json::Value),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Time(t) => write!(f, "{}", t.format("%Y-%m-%dT%H:%M:%S%.3fZ")),
            Value::Duration(d) => write!(f, "{:?}", d),
            Value::Group(attrs) => {
                write!(f, "{{")?;
                for (i, attr) in attrs.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}={}", attr.key, attr.value)?;
                }
                write!(f, "}}")
            }
            Value::Any(v) => write!(f, "{}", v),
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Value::Time(t)
    }
}

impl From<Duration> for Value {
    fn from(d: Duration) -> Self {
        Value::Duration(d)
    }
}

/// One key-value attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attr {
    pub key: String,
    pub value: Value,
}

impl Attr {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn str(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, Value::String(value.into()))
    }

    pub fn int(key: impl Into<String>, value: i64) -> Self {
        Self::new(key, Value::Int(value))
    }

    pub fn float(key: impl Into<String>, value: f64) -> Self {
        Self::new(key, Value::Float(value))
    }

    pub fn bool(key: impl Into<String>, value: bool) -> Self {
        Self::new(key, Value::Bool(value))
    }

    pub fn time(key: impl Into<String>, value: DateTime<Utc>) -> Self {
        Self::new(key, Value::Time(value))
    }

    pub fn duration(key: impl Into<String>, value: Duration) -> Self {
        Self::new(key, Value::Duration(value))
    }

    pub fn group(key: impl Into<String>, attrs: Vec<Attr>) -> Self {
        Self::new(key, Value::Group(attrs))
    }

    /// Capture an error's display form
    pub fn error(key: impl Into<String>, err: &dyn std::error::Error) -> Self {
        Self::new(key, Value::String(err.to_string()))
    }

    /// Carry an arbitrary serializable payload as JSON
    pub fn any<T: Serialize>(key: impl Into<String>, value: &T) -> Self {
        let json = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
        Self::new(key, Value::Any(json))
    }
}

impl fmt::Display for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Format attributes as `key=value` pairs, flattening groups with a dotted
/// prefix (`address.city=Seoul`).
pub fn format_attrs(attrs: &[Attr]) -> String {
    let mut out = Vec::new();
    format_into(&mut out, "", attrs);
    out.join(" ")
}

fn format_into(out: &mut Vec<String>, prefix: &str, attrs: &[Attr]) {
    for attr in attrs {
        let key = if prefix.is_empty() {
            attr.key.clone()
        } else {
            format!("{}.{}", prefix, attr.key)
        };
        match &attr.value {
            Value::Group(nested) => format_into(out, &key, nested),
            other => out.push(format!("{}={}", key, other)),
        }
    }
}
