/*
 * operators.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Built-in operators.
//!
//! | operator                         | precedence |
//! |----------------------------------|------------|
//! | `or`                             | 10         |
//! | `and`                            | 15         |
//! | `not` (unary)                    | 20         |
//! | `==` `!=` `<` `>` `<=` `>=`      | 30         |
//! | `~`                              | 38         |
//! | `+` `-`                          | 40         |
//! | `*` `/` `%`                      | 60         |
//! | `-` `+` (unary)                  | 500        |

use crate::error::ExtensionError;
use crate::extension::{BinaryOperator, UnaryOperator};
use crate::value::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, Default)]
pub struct OrOperator;

impl BinaryOperator for OrOperator {
    fn symbol(&self) -> &str {
        "or"
    }

    fn precedence(&self) -> u32 {
        10
    }

    fn short_circuit(&self, left: &Value) -> Option<Value> {
        left.is_truthy().then_some(Value::Bool(true))
    }

    fn apply(&self, left: &Value, right: &Value) -> Result<Value, ExtensionError> {
        Ok(Value::Bool(left.is_truthy() || right.is_truthy()))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AndOperator;

impl BinaryOperator for AndOperator {
    fn symbol(&self) -> &str {
        "and"
    }

    fn precedence(&self) -> u32 {
        15
    }

    fn short_circuit(&self, left: &Value) -> Option<Value> {
        (!left.is_truthy()).then_some(Value::Bool(false))
    }

    fn apply(&self, left: &Value, right: &Value) -> Result<Value, ExtensionError> {
        Ok(Value::Bool(left.is_truthy() && right.is_truthy()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
}

#[derive(Debug, Clone, Copy)]
pub struct ComparisonOperator(pub Comparison);

impl BinaryOperator for ComparisonOperator {
    fn symbol(&self) -> &str {
        match self.0 {
            Comparison::Equal => "==",
            Comparison::NotEqual => "!=",
            Comparison::Less => "<",
            Comparison::Greater => ">",
            Comparison::LessEqual => "<=",
            Comparison::GreaterEqual => ">=",
        }
    }

    fn precedence(&self) -> u32 {
        30
    }

    fn apply(&self, left: &Value, right: &Value) -> Result<Value, ExtensionError> {
        let result = match self.0 {
            Comparison::Equal => left == right,
            Comparison::NotEqual => left != right,
            ordering => {
                let Some(order) = left.compare(right) else {
                    return Err(ExtensionError::new(format!(
                        "cannot compare {} with {}",
                        left.type_name(),
                        right.type_name()
                    )));
                };
                match ordering {
                    Comparison::Less => order == Ordering::Less,
                    Comparison::Greater => order == Ordering::Greater,
                    Comparison::LessEqual => order != Ordering::Greater,
                    _ => order != Ordering::Less,
                }
            }
        };
        Ok(Value::Bool(result))
    }
}

/// `~`: string concatenation of the displayed operands.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConcatOperator;

impl BinaryOperator for ConcatOperator {
    fn symbol(&self) -> &str {
        "~"
    }

    fn precedence(&self) -> u32 {
        38
    }

    fn apply(&self, left: &Value, right: &Value) -> Result<Value, ExtensionError> {
        Ok(Value::String(format!("{}{}", left, right)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arithmetic {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulus,
}

/// Integer arithmetic stays integral (checked for overflow); any float
/// operand makes the result a float. Division of integers that do not
/// divide evenly yields a float.
#[derive(Debug, Clone, Copy)]
pub struct ArithmeticOperator(pub Arithmetic);

impl ArithmeticOperator {
    fn integer(&self, a: i64, b: i64) -> Result<Value, ExtensionError> {
        let result = match self.0 {
            Arithmetic::Add => a.checked_add(b),
            Arithmetic::Subtract => a.checked_sub(b),
            Arithmetic::Multiply => a.checked_mul(b),
            Arithmetic::Divide | Arithmetic::Modulus if b == 0 => {
                return Err(ExtensionError::new("division by zero"));
            }
            Arithmetic::Divide if a % b != 0 => return Ok(Value::Float(a as f64 / b as f64)),
            Arithmetic::Divide => a.checked_div(b),
            Arithmetic::Modulus => a.checked_rem(b),
        };
        result
            .map(Value::Integer)
            .ok_or_else(|| ExtensionError::new("integer overflow"))
    }

    fn float(&self, a: f64, b: f64) -> Result<Value, ExtensionError> {
        let result = match self.0 {
            Arithmetic::Add => a + b,
            Arithmetic::Subtract => a - b,
            Arithmetic::Multiply => a * b,
            Arithmetic::Divide | Arithmetic::Modulus if b == 0.0 => {
                return Err(ExtensionError::new("division by zero"));
            }
            Arithmetic::Divide => a / b,
            Arithmetic::Modulus => a % b,
        };
        Ok(Value::Float(result))
    }
}

impl BinaryOperator for ArithmeticOperator {
    fn symbol(&self) -> &str {
        match self.0 {
            Arithmetic::Add => "+",
            Arithmetic::Subtract => "-",
            Arithmetic::Multiply => "*",
            Arithmetic::Divide => "/",
            Arithmetic::Modulus => "%",
        }
    }

    fn precedence(&self) -> u32 {
        match self.0 {
            Arithmetic::Add | Arithmetic::Subtract => 40,
            _ => 60,
        }
    }

    fn apply(&self, left: &Value, right: &Value) -> Result<Value, ExtensionError> {
        match (left, right) {
            (Value::Integer(a), Value::Integer(b)) => self.integer(*a, *b),
            _ => match (left.as_f64(), right.as_f64()) {
                (Some(a), Some(b)) => self.float(a, b),
                _ => Err(ExtensionError::new(format!(
                    "unsupported operand types: {} {} {}",
                    left.type_name(),
                    self.symbol(),
                    right.type_name()
                ))),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NotOperator;

impl UnaryOperator for NotOperator {
    fn symbol(&self) -> &str {
        "not"
    }

    fn precedence(&self) -> u32 {
        20
    }

    fn apply(&self, operand: &Value) -> Result<Value, ExtensionError> {
        Ok(Value::Bool(!operand.is_truthy()))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NegativeOperator;

impl UnaryOperator for NegativeOperator {
    fn symbol(&self) -> &str {
        "-"
    }

    fn precedence(&self) -> u32 {
        500
    }

    fn apply(&self, operand: &Value) -> Result<Value, ExtensionError> {
        match operand {
            Value::Integer(i) => i
                .checked_neg()
                .map(Value::Integer)
                .ok_or_else(|| ExtensionError::new("integer overflow")),
            Value::Float(f) => Ok(Value::Float(-f)),
            other => Err(ExtensionError::new(format!(
                "cannot negate {}",
                other.type_name()
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PositiveOperator;

impl UnaryOperator for PositiveOperator {
    fn symbol(&self) -> &str {
        "+"
    }

    fn precedence(&self) -> u32 {
        500
    }

    fn apply(&self, operand: &Value) -> Result<Value, ExtensionError> {
        match operand {
            Value::Integer(_) | Value::Float(_) => Ok(operand.clone()),
            other => Err(ExtensionError::new(format!(
                "unary + expects a number, got {}",
                other.type_name()
            ))),
        }
    }
}
