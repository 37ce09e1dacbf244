/*
 * operator.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Unary and binary operator definitions.
//!
//! An operator supplies its symbol, its precedence and how it combines
//! values. How it is written back out by the compiler protocol is inherited
//! from the expression node that holds it.

use crate::error::ExtensionError;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    Left,
    Right,
}

pub trait BinaryOperator: Send + Sync {
    fn symbol(&self) -> &str;

    /// Higher binds tighter.
    fn precedence(&self) -> u32;

    fn associativity(&self) -> Associativity {
        Associativity::Left
    }

    /// Result to use without evaluating the right operand, if any.
    fn short_circuit(&self, _left: &Value) -> Option<Value> {
        None
    }

    fn apply(&self, left: &Value, right: &Value) -> Result<Value, ExtensionError>;
}

pub trait UnaryOperator: Send + Sync {
    fn symbol(&self) -> &str;

    fn precedence(&self) -> u32;

    fn apply(&self, operand: &Value) -> Result<Value, ExtensionError>;
}
