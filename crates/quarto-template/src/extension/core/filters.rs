/*
 * filters.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Built-in filters.
//!
//! Filters pass a null input through unchanged unless documented otherwise.

use crate::error::ExtensionError;
use crate::extension::{Arguments, Filter};
use crate::runtime::IterableSource;
use crate::value::Value;

const ELLIPSIS: &str = "...";

/// Shortens a string to `length` characters, ending it with `...` when
/// anything was cut.
///
/// - strings shorter than `length` are returned unchanged
/// - strings of three characters or fewer are returned unchanged
/// - a `length` of three or less truncates without an ellipsis
/// - a negative `length` is an error
#[derive(Debug, Clone, Copy, Default)]
pub struct AbbreviateFilter;

impl Filter for AbbreviateFilter {
    fn argument_names(&self) -> &[&str] {
        &["length"]
    }

    fn apply(&self, input: Value, args: &Arguments) -> Result<Value, ExtensionError> {
        if input.is_null() {
            return Ok(Value::Null);
        }
        let value = match input {
            Value::String(s) => s,
            other => other.to_string(),
        };
        let max_width = args.require_i64("length")?;
        if max_width < 0 {
            return Err(ExtensionError::new(
                "Invalid argument to abbreviate filter; must be greater than zero",
            ));
        }
        let max_width = usize::try_from(max_width).unwrap_or(usize::MAX);

        let length = value.chars().count();
        if length < max_width || length <= ELLIPSIS.len() {
            return Ok(Value::String(value));
        }
        if max_width <= ELLIPSIS.len() {
            return Ok(Value::String(value.chars().take(max_width).collect()));
        }
        let mut abbreviated: String = value.chars().take(max_width - ELLIPSIS.len()).collect();
        abbreviated.push_str(ELLIPSIS);
        Ok(Value::String(abbreviated))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UpperFilter;

impl Filter for UpperFilter {
    fn apply(&self, input: Value, _args: &Arguments) -> Result<Value, ExtensionError> {
        Ok(match input {
            Value::Null => Value::Null,
            Value::String(s) => Value::String(s.to_uppercase()),
            other => Value::String(other.to_string().to_uppercase()),
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LowerFilter;

impl Filter for LowerFilter {
    fn apply(&self, input: Value, _args: &Arguments) -> Result<Value, ExtensionError> {
        Ok(match input {
            Value::Null => Value::Null,
            Value::String(s) => Value::String(s.to_lowercase()),
            other => Value::String(other.to_string().to_lowercase()),
        })
    }
}

/// Number of characters in a string or elements in a collection. Null has
/// length zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct LengthFilter;

impl Filter for LengthFilter {
    fn apply(&self, input: Value, _args: &Arguments) -> Result<Value, ExtensionError> {
        let length = match &input {
            Value::Null => 0,
            Value::String(s) => s.chars().count(),
            other => match IterableSource::from_value(other) {
                Some(source) => source.len(),
                None => {
                    return Err(ExtensionError::new(format!(
                        "cannot take the length of {}",
                        other.type_name()
                    )));
                }
            },
        };
        Ok(Value::from(length))
    }
}

/// Joins the elements of a collection with an optional separator.
#[derive(Debug, Clone, Copy, Default)]
pub struct JoinFilter;

impl Filter for JoinFilter {
    fn argument_names(&self) -> &[&str] {
        &["separator"]
    }

    fn apply(&self, input: Value, args: &Arguments) -> Result<Value, ExtensionError> {
        if input.is_null() {
            return Ok(Value::Null);
        }
        let separator = args.get("separator").map(Value::to_string).unwrap_or_default();
        let source = IterableSource::from_value(&input).ok_or_else(|| {
            ExtensionError::new(format!("cannot join {}", input.type_name()))
        })?;
        let parts: Vec<String> = source.iter().map(|item| item.to_string()).collect();
        Ok(Value::String(parts.join(&separator)))
    }
}

/// Replaces a null or empty-string input with `default`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFilter;

impl Filter for DefaultFilter {
    fn argument_names(&self) -> &[&str] {
        &["default"]
    }

    fn apply(&self, input: Value, args: &Arguments) -> Result<Value, ExtensionError> {
        match input {
            Value::Null => Ok(args.get("default").cloned().unwrap_or_default()),
            Value::String(s) if s.is_empty() => Ok(args.get("default").cloned().unwrap_or_default()),
            other => Ok(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abbreviate(input: Value, length: i64) -> Result<Value, ExtensionError> {
        let args: Arguments = [("length", Value::from(length))].into_iter().collect();
        AbbreviateFilter.apply(input, &args)
    }

    #[test]
    fn test_abbreviate() {
        assert_eq!(
            abbreviate(Value::from("Hello World"), 8).unwrap(),
            Value::from("Hello...")
        );
        assert_eq!(abbreviate(Value::from("Hi"), 3).unwrap(), Value::from("Hi"));
        assert_eq!(
            abbreviate(Value::from("Hello"), 20).unwrap(),
            Value::from("Hello")
        );
        assert_eq!(abbreviate(Value::from("Hello"), 2).unwrap(), Value::from("He"));
        assert_eq!(abbreviate(Value::Null, 8).unwrap(), Value::Null);
    }

    #[test]
    fn test_abbreviate_counts_characters() {
        assert_eq!(
            abbreviate(Value::from("héllo wörld"), 7).unwrap(),
            Value::from("héll...")
        );
    }

    #[test]
    fn test_abbreviate_rejects_negative_length() {
        let err = abbreviate(Value::from("Hello"), -1).unwrap_err();
        assert!(err.message.contains("must be greater than zero"));
    }

    #[test]
    fn test_abbreviate_requires_length() {
        let err = AbbreviateFilter
            .apply(Value::from("Hello"), &Arguments::new())
            .unwrap_err();
        assert!(err.message.contains("missing required argument 'length'"));
    }

    #[test]
    fn test_length_and_join() {
        let list = Value::list([Value::from(1), Value::from("a"), Value::from(2.5)]);
        assert_eq!(
            LengthFilter.apply(list.clone(), &Arguments::new()).unwrap(),
            Value::from(3)
        );
        assert_eq!(
            LengthFilter.apply(Value::from("héllo"), &Arguments::new()).unwrap(),
            Value::from(5)
        );
        assert!(LengthFilter.apply(Value::from(5), &Arguments::new()).is_err());

        let args: Arguments = [("separator", Value::from(", "))].into_iter().collect();
        assert_eq!(
            JoinFilter.apply(list, &args).unwrap(),
            Value::from("1, a, 2.5")
        );
    }

    #[test]
    fn test_default() {
        let args: Arguments = [("default", Value::from("n/a"))].into_iter().collect();
        assert_eq!(DefaultFilter.apply(Value::Null, &args).unwrap(), Value::from("n/a"));
        assert_eq!(DefaultFilter.apply(Value::from(""), &args).unwrap(), Value::from("n/a"));
        assert_eq!(DefaultFilter.apply(Value::from(0), &args).unwrap(), Value::from(0));
    }
}
