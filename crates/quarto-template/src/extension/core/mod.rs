/*
 * mod.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The built-in extension.
//!
//! Every engine registers [`CoreExtension`] before any user extension, so
//! the core operators can not be replaced (operators are first-wins) while
//! core filters, tests and functions can be overridden (last-wins).

mod filters;
mod functions;
mod operators;
mod predicates;

pub use filters::{
    AbbreviateFilter, DefaultFilter, JoinFilter, LengthFilter, LowerFilter, UpperFilter,
};
pub use functions::{RangeFunction, RangeSequence};
pub use operators::{
    AndOperator, Arithmetic, ArithmeticOperator, Comparison, ComparisonOperator, ConcatOperator,
    NegativeOperator, NotOperator, OrOperator, PositiveOperator,
};
pub use predicates::{EmptyTest, EvenTest, IterableTest, NullTest, OddTest};

use super::{Contributions, Extension};
use crate::parser::{
    ForTokenParser, IfTokenParser, IncludeTokenParser, ParallelTokenParser, SetTokenParser,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct CoreExtension;

impl Extension for CoreExtension {
    fn contributions(&self) -> Contributions {
        Contributions::new()
            .token_parser(ForTokenParser)
            .token_parser(IfTokenParser)
            .token_parser(SetTokenParser)
            .token_parser(IncludeTokenParser)
            .token_parser(ParallelTokenParser)
            .binary_operator(OrOperator)
            .binary_operator(AndOperator)
            .binary_operator(ComparisonOperator(Comparison::Equal))
            .binary_operator(ComparisonOperator(Comparison::NotEqual))
            .binary_operator(ComparisonOperator(Comparison::Less))
            .binary_operator(ComparisonOperator(Comparison::Greater))
            .binary_operator(ComparisonOperator(Comparison::LessEqual))
            .binary_operator(ComparisonOperator(Comparison::GreaterEqual))
            .binary_operator(ConcatOperator)
            .binary_operator(ArithmeticOperator(Arithmetic::Add))
            .binary_operator(ArithmeticOperator(Arithmetic::Subtract))
            .binary_operator(ArithmeticOperator(Arithmetic::Multiply))
            .binary_operator(ArithmeticOperator(Arithmetic::Divide))
            .binary_operator(ArithmeticOperator(Arithmetic::Modulus))
            .unary_operator(NotOperator)
            .unary_operator(NegativeOperator)
            .unary_operator(PositiveOperator)
            .filter("abbreviate", AbbreviateFilter)
            .filter("upper", UpperFilter)
            .filter("lower", LowerFilter)
            .filter("length", LengthFilter)
            .filter("join", JoinFilter)
            .filter("default", DefaultFilter)
            .test("empty", EmptyTest)
            .test("null", NullTest)
            .test("even", EvenTest)
            .test("odd", OddTest)
            .test("iterable", IterableTest)
            .function("range", RangeFunction)
    }
}
