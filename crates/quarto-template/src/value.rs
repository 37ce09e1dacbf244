/*
 * value.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Runtime values.
//!
//! [`Value`] is what expressions evaluate to and what scopes store. Compound
//! values are reference counted so that forking a scope for a parallel task
//! is cheap and never aliases mutable state.

use indexmap::IndexMap;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// A generic iterable whose size is not known without walking it.
pub trait Sequence: Send + Sync + fmt::Debug {
    /// Iterate the elements from the start.
    fn iter(&self) -> Box<dyn Iterator<Item = Value> + '_>;
}

/// A value that can be used in template evaluation.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// An absent value.
    #[default]
    Null,

    Bool(bool),

    Integer(i64),

    Float(f64),

    String(String),

    /// A fixed-size, indexable list.
    List(Arc<Vec<Value>>),

    /// An ordered map of string keys to values.
    Map(Arc<IndexMap<String, Value>>),

    /// A lazily produced sequence of values.
    Sequence(Arc<dyn Sequence>),
}

impl Value {
    /// Build a map value from key/value pairs.
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Value {
        Value::Map(Arc::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// Build a list value.
    pub fn list(items: impl IntoIterator<Item = Value>) -> Value {
        Value::List(Arc::new(items.into_iter().collect()))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value is "truthy" for conditional evaluation.
    ///
    /// - Null and `false` are falsy
    /// - Numbers are truthy unless zero
    /// - Strings, lists and maps are truthy unless empty
    /// - Sequences are truthy if they yield at least one element
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Integer(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(m) => !m.is_empty(),
            Value::Sequence(seq) => seq.iter().next().is_some(),
        }
    }

    /// Name of the value's shape, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Sequence(_) => "sequence",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view of the value; floats with no fractional part qualify.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Look up a named attribute.
    ///
    /// Maps are looked up by key. Lists and strings expose `length`.
    pub fn get_attribute(&self, name: &str) -> Option<Value> {
        match self {
            Value::Map(m) => m.get(name).cloned(),
            Value::List(items) if name == "length" => Some(Value::Integer(items.len() as i64)),
            Value::String(s) if name == "length" => {
                Some(Value::Integer(s.chars().count() as i64))
            }
            _ => None,
        }
    }

    /// Look up an element by subscript.
    pub fn get_index(&self, index: &Value) -> Option<Value> {
        match (self, index) {
            (Value::List(items), idx) => {
                let i = idx.as_i64()?;
                let i = if i < 0 { items.len() as i64 + i } else { i };
                usize::try_from(i).ok().and_then(|i| items.get(i).cloned())
            }
            (Value::Map(m), Value::String(key)) => m.get(key).cloned(),
            (Value::Map(m), key) => m.get(&key.to_string()).cloned(),
            _ => None,
        }
    }

    /// Compare two values for ordering operators.
    ///
    /// Numbers compare numerically across integer and float, strings
    /// lexically. Other combinations are unordered.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.partial_cmp(&y),
                _ => None,
            },
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Sequence(a), Value::Sequence(b)) => Arc::ptr_eq(a, b),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => f.write_str(s),
            Value::List(items) => write_list(f, items.iter()),
            Value::Sequence(seq) => write_list(f, seq.iter()),
            Value::Map(m) => {
                f.write_str("{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}={}", k, v)?;
                }
                f.write_str("}")
            }
        }
    }
}

fn write_list<I>(f: &mut fmt::Formatter<'_>, items: I) -> fmt::Result
where
    I: Iterator,
    I::Item: fmt::Display,
{
    f.write_str("[")?;
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    f.write_str("]")
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        Value::Integer(i as i64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(Arc::new(items))
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(m: IndexMap<String, Value>) -> Self {
        Value::Map(Arc::new(m))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::list(items.into_iter().map(Value::from))
            }
            serde_json::Value::Object(map) => {
                Value::map(map.into_iter().map(|(k, v)| (k, Value::from(v))))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(!Value::Integer(0).is_truthy());
        assert!(Value::Integer(-1).is_truthy());
        assert!(Value::from("false").is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(!Value::list(vec![]).is_truthy());
        assert!(Value::map([("k", Value::Null)]).is_truthy());
    }

    #[test]
    fn test_numeric_equality_across_kinds() {
        assert_eq!(Value::Integer(2), Value::Float(2.0));
        assert_ne!(Value::Integer(2), Value::from("2"));
    }

    #[test]
    fn test_compare() {
        assert_eq!(
            Value::Integer(1).compare(&Value::Float(1.5)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::from("b").compare(&Value::from("a")),
            Some(Ordering::Greater)
        );
        assert_eq!(Value::from("a").compare(&Value::Integer(1)), None);
    }

    #[test]
    fn test_attributes_and_index() {
        let value = Value::map([("name", Value::from("Ada"))]);
        assert_eq!(value.get_attribute("name"), Some(Value::from("Ada")));
        assert_eq!(value.get_attribute("missing"), None);

        let list = Value::list(vec![Value::from(1), Value::from(2), Value::from(3)]);
        assert_eq!(list.get_index(&Value::from(0)), Some(Value::from(1)));
        assert_eq!(list.get_index(&Value::from(-1)), Some(Value::from(3)));
        assert_eq!(list.get_index(&Value::from(3)), None);
        assert_eq!(list.get_attribute("length"), Some(Value::from(3)));
    }

    #[test]
    fn test_display() {
        let list = Value::list(vec![Value::from(1), Value::from("a")]);
        assert_eq!(list.to_string(), "[1, a]");
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::map([("k", Value::from(1))]).to_string(), "{k=1}");
    }

    #[test]
    fn test_from_json() {
        let json = serde_json::json!({
            "name": "Ada",
            "tags": ["a", "b"],
            "age": 36,
            "ratio": 0.5,
            "none": null
        });
        let value = Value::from(json);
        assert_eq!(value.get_attribute("name"), Some(Value::from("Ada")));
        assert_eq!(value.get_attribute("age"), Some(Value::Integer(36)));
        assert_eq!(value.get_attribute("ratio"), Some(Value::Float(0.5)));
        assert_eq!(value.get_attribute("none"), Some(Value::Null));
        assert_eq!(
            value.get_attribute("tags"),
            Some(Value::list(vec![Value::from("a"), Value::from("b")]))
        );
    }
}
