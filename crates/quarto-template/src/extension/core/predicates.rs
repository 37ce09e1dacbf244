/*
 * predicates.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Built-in tests (`x is empty`, `n is even`, ...).

use crate::error::ExtensionError;
use crate::extension::{Arguments, Test};
use crate::runtime::IterableSource;
use crate::value::Value;

/// Null, the empty string and empty collections.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyTest;

impl Test for EmptyTest {
    fn apply(&self, input: &Value, _args: &Arguments) -> Result<bool, ExtensionError> {
        Ok(match input {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            other => IterableSource::from_value(other).is_some_and(|source| source.is_empty()),
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullTest;

impl Test for NullTest {
    fn apply(&self, input: &Value, _args: &Arguments) -> Result<bool, ExtensionError> {
        Ok(input.is_null())
    }
}

fn integer_input(test: &str, input: &Value) -> Result<i64, ExtensionError> {
    input.as_i64().ok_or_else(|| {
        ExtensionError::new(format!(
            "'{}' expects an integer, got {}",
            test,
            input.type_name()
        ))
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EvenTest;

impl Test for EvenTest {
    fn apply(&self, input: &Value, _args: &Arguments) -> Result<bool, ExtensionError> {
        Ok(integer_input("even", input)? % 2 == 0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OddTest;

impl Test for OddTest {
    fn apply(&self, input: &Value, _args: &Arguments) -> Result<bool, ExtensionError> {
        Ok(integer_input("odd", input)? % 2 != 0)
    }
}

/// Anything a `for` loop accepts.
#[derive(Debug, Clone, Copy, Default)]
pub struct IterableTest;

impl Test for IterableTest {
    fn apply(&self, input: &Value, _args: &Arguments) -> Result<bool, ExtensionError> {
        Ok(IterableSource::from_value(input).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(test: &dyn Test, input: Value) -> bool {
        test.apply(&input, &Arguments::new()).unwrap()
    }

    #[test]
    fn test_empty() {
        assert!(check(&EmptyTest, Value::Null));
        assert!(check(&EmptyTest, Value::from("")));
        assert!(check(&EmptyTest, Value::list([])));
        assert!(!check(&EmptyTest, Value::map([("a", Value::Null)])));
        assert!(!check(&EmptyTest, Value::from(0)));
    }

    #[test]
    fn test_parity() {
        assert!(check(&EvenTest, Value::from(4)));
        assert!(check(&OddTest, Value::from(-3)));
        assert!(!check(&OddTest, Value::from(0)));
        assert!(EvenTest.apply(&Value::from("4"), &Arguments::new()).is_err());
    }

    #[test]
    fn test_iterable_and_null() {
        assert!(check(&IterableTest, Value::list([Value::from(1)])));
        assert!(!check(&IterableTest, Value::from("abc")));
        assert!(check(&NullTest, Value::Null));
        assert!(!check(&NullTest, Value::from(false)));
    }
}
