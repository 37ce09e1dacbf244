/*
 * callable.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Filters, tests and functions.
//!
//! All three are named callables that receive their arguments as an ordered
//! map. Positional arguments in a template are mapped onto the names the
//! callable declares, in order.

use crate::error::ExtensionError;
use crate::value::Value;
use indexmap::IndexMap;

/// Resolved arguments of a filter, test or function invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: IndexMap<String, Value>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Fetch a required integer argument.
    pub fn require_i64(&self, name: &str) -> Result<i64, ExtensionError> {
        match self.values.get(name) {
            Some(value) => value.as_i64().ok_or_else(|| {
                ExtensionError::new(format!(
                    "argument '{}' must be an integer, got {}",
                    name,
                    value.type_name()
                ))
            }),
            None => Err(ExtensionError::new(format!(
                "missing required argument '{}'",
                name
            ))),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Arguments {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Transforms a value: `{{ name | upper }}`.
pub trait Filter: Send + Sync {
    /// Declared argument names, in positional order.
    fn argument_names(&self) -> &[&str] {
        &[]
    }

    /// Apply the filter. A null input should be returned unchanged.
    fn apply(&self, input: Value, args: &Arguments) -> Result<Value, ExtensionError>;
}

/// Checks a property of a value: `{% if n is even %}`.
pub trait Test: Send + Sync {
    fn argument_names(&self) -> &[&str] {
        &[]
    }

    fn apply(&self, input: &Value, args: &Arguments) -> Result<bool, ExtensionError>;
}

/// Produces a value from its arguments alone: `{{ range(1, 5) }}`.
pub trait Function: Send + Sync {
    fn argument_names(&self) -> &[&str] {
        &[]
    }

    fn execute(&self, args: &Arguments) -> Result<Value, ExtensionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_i64() {
        let args: Arguments = [("length", Value::from(8))].into_iter().collect();
        assert_eq!(args.require_i64("length"), Ok(8));

        let err = args.require_i64("width").unwrap_err();
        assert!(err.message.contains("missing required argument 'width'"));

        let args: Arguments = [("length", Value::from("eight"))].into_iter().collect();
        let err = args.require_i64("length").unwrap_err();
        assert!(err.message.contains("must be an integer"));
    }

    #[test]
    fn test_arguments_preserve_order() {
        let mut args = Arguments::new();
        args.insert("b", Value::from(2));
        args.insert("a", Value::from(1));
        let names: Vec<&String> = args.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}
