/*
 * mod.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Extensions and the registry that merges their contributions.
//!
//! An [`Extension`] describes what it adds to the engine by returning a
//! [`Contributions`] value. Every table in it defaults to empty, so an
//! extension only fills in what it actually provides.

pub mod callable;
pub mod core;
pub mod operator;
pub mod registry;

pub use callable::{Arguments, Filter, Function, Test};
pub use operator::{Associativity, BinaryOperator, UnaryOperator};
pub use registry::{ExtensionRegistry, ExtensionRegistryBuilder, MergePolicy};

use crate::node::NodeVisitorFactory;
use crate::parser::TokenParser;
use crate::value::Value;
use indexmap::IndexMap;
use std::any::Any;
use std::sync::Arc;

/// A bundle of grammar and runtime capabilities.
///
/// At most one instance of a given extension type is registered with an
/// engine.
pub trait Extension: Any + Send + Sync {
    fn contributions(&self) -> Contributions;
}

/// Everything a single extension adds to the engine.
#[derive(Clone, Default)]
pub struct Contributions {
    pub token_parsers: Vec<Arc<dyn TokenParser>>,
    pub binary_operators: Vec<Arc<dyn BinaryOperator>>,
    pub unary_operators: Vec<Arc<dyn UnaryOperator>>,
    pub filters: IndexMap<String, Arc<dyn Filter>>,
    pub tests: IndexMap<String, Arc<dyn Test>>,
    pub functions: IndexMap<String, Arc<dyn Function>>,
    pub global_variables: IndexMap<String, Value>,
    pub node_visitors: Vec<Arc<dyn NodeVisitorFactory>>,
}

impl Contributions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token_parser(mut self, parser: impl TokenParser + 'static) -> Self {
        self.token_parsers.push(Arc::new(parser));
        self
    }

    pub fn binary_operator(mut self, operator: impl BinaryOperator + 'static) -> Self {
        self.binary_operators.push(Arc::new(operator));
        self
    }

    pub fn unary_operator(mut self, operator: impl UnaryOperator + 'static) -> Self {
        self.unary_operators.push(Arc::new(operator));
        self
    }

    pub fn filter(mut self, name: impl Into<String>, filter: impl Filter + 'static) -> Self {
        self.filters.insert(name.into(), Arc::new(filter));
        self
    }

    pub fn test(mut self, name: impl Into<String>, test: impl Test + 'static) -> Self {
        self.tests.insert(name.into(), Arc::new(test));
        self
    }

    pub fn function(mut self, name: impl Into<String>, function: impl Function + 'static) -> Self {
        self.functions.insert(name.into(), Arc::new(function));
        self
    }

    pub fn global_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.global_variables.insert(name.into(), value.into());
        self
    }

    pub fn node_visitor(mut self, factory: impl NodeVisitorFactory + 'static) -> Self {
        self.node_visitors.push(Arc::new(factory));
        self
    }
}
