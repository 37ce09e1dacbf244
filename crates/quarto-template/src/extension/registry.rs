/*
 * registry.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Merged lookup tables built from all registered extensions.
//!
//! Extensions are merged in registration order. Each table is merged with a
//! named [`MergePolicy`]:
//!
//! | Table                        | Policy       |
//! |------------------------------|--------------|
//! | token parsers                | last wins    |
//! | unary and binary operators   | first wins   |
//! | filters, tests, functions    | last wins    |
//! | global variables             | last wins    |
//! | node visitor factories       | appended     |
//!
//! Operators are first-wins so that the built-in operators, which are always
//! registered first, cannot be replaced by a plugin. The registry is frozen
//! once built and is shared read-only between concurrent renders.

use super::{BinaryOperator, Contributions, Extension, Filter, Function, Test, UnaryOperator};
use crate::node::NodeVisitorFactory;
use crate::parser::TokenParser;
use crate::value::Value;
use indexmap::IndexMap;
use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

/// How a table resolves two contributions under the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Keep the entry that was registered first; later ones are ignored.
    FirstWins,
    /// Replace the existing entry with the later one.
    LastWins,
}

impl MergePolicy {
    /// Merge one entry into `table`. Returns false if the entry was ignored.
    pub fn merge<V>(self, table: &mut IndexMap<String, V>, name: String, value: V) -> bool {
        match self {
            MergePolicy::FirstWins if table.contains_key(&name) => false,
            _ => {
                table.insert(name, value);
                true
            }
        }
    }
}

/// Merge policy for each keyed table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergePolicies {
    pub token_parsers: MergePolicy,
    pub operators: MergePolicy,
    pub callables: MergePolicy,
    pub global_variables: MergePolicy,
}

impl Default for MergePolicies {
    fn default() -> Self {
        Self {
            token_parsers: MergePolicy::LastWins,
            operators: MergePolicy::FirstWins,
            callables: MergePolicy::LastWins,
            global_variables: MergePolicy::LastWins,
        }
    }
}

/// Collects extensions before freezing them into an [`ExtensionRegistry`].
#[derive(Default)]
pub struct ExtensionRegistryBuilder {
    extensions: Vec<(TypeId, Arc<dyn Extension>)>,
    policies: MergePolicies,
}

impl ExtensionRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extension.
    ///
    /// Registering a second instance of the same type replaces the first one
    /// in place, keeping its position in the merge order.
    pub fn register<E: Extension>(self, extension: E) -> Self {
        self.register_shared(Arc::new(extension))
    }

    pub fn register_shared<E: Extension>(mut self, extension: Arc<E>) -> Self {
        self.add(extension);
        self
    }

    pub(crate) fn add<E: Extension>(&mut self, extension: Arc<E>) {
        let id = TypeId::of::<E>();
        let extension: Arc<dyn Extension> = extension;
        match self.extensions.iter_mut().find(|(existing, _)| *existing == id) {
            Some(slot) => slot.1 = extension,
            None => self.extensions.push((id, extension)),
        }
    }

    pub fn with_policies(mut self, policies: MergePolicies) -> Self {
        self.policies = policies;
        self
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    pub fn build(self) -> ExtensionRegistry {
        let mut registry = ExtensionRegistry::empty();
        for (_, extension) in &self.extensions {
            registry.merge(extension.contributions(), &self.policies);
        }

        tracing::debug!(
            extensions = self.extensions.len(),
            token_parsers = registry.token_parsers.len(),
            binary_operators = registry.binary_operators.len(),
            unary_operators = registry.unary_operators.len(),
            filters = registry.filters.len(),
            tests = registry.tests.len(),
            functions = registry.functions.len(),
            global_variables = registry.global_variables.len(),
            node_visitors = registry.node_visitors.len(),
            "Built extension registry"
        );

        registry
    }
}

/// Frozen lookup tables consulted by the parser and the evaluator.
pub struct ExtensionRegistry {
    token_parsers: IndexMap<String, Arc<dyn TokenParser>>,
    binary_operators: IndexMap<String, Arc<dyn BinaryOperator>>,
    unary_operators: IndexMap<String, Arc<dyn UnaryOperator>>,
    filters: IndexMap<String, Arc<dyn Filter>>,
    tests: IndexMap<String, Arc<dyn Test>>,
    functions: IndexMap<String, Arc<dyn Function>>,
    global_variables: IndexMap<String, Value>,
    node_visitors: Vec<Arc<dyn NodeVisitorFactory>>,
}

impl ExtensionRegistry {
    pub fn builder() -> ExtensionRegistryBuilder {
        ExtensionRegistryBuilder::new()
    }

    fn empty() -> Self {
        Self {
            token_parsers: IndexMap::new(),
            binary_operators: IndexMap::new(),
            unary_operators: IndexMap::new(),
            filters: IndexMap::new(),
            tests: IndexMap::new(),
            functions: IndexMap::new(),
            global_variables: IndexMap::new(),
            node_visitors: Vec::new(),
        }
    }

    fn merge(&mut self, contributions: Contributions, policies: &MergePolicies) {
        let Contributions {
            token_parsers,
            binary_operators,
            unary_operators,
            filters,
            tests,
            functions,
            global_variables,
            node_visitors,
        } = contributions;

        for parser in token_parsers {
            let tag = parser.tag().to_string();
            policies.token_parsers.merge(&mut self.token_parsers, tag, parser);
        }

        for operator in binary_operators {
            let symbol = operator.symbol().to_string();
            if !policies
                .operators
                .merge(&mut self.binary_operators, symbol.clone(), operator)
            {
                tracing::debug!(symbol = %symbol, "Ignoring binary operator already registered");
            }
        }

        for operator in unary_operators {
            let symbol = operator.symbol().to_string();
            if !policies
                .operators
                .merge(&mut self.unary_operators, symbol.clone(), operator)
            {
                tracing::debug!(symbol = %symbol, "Ignoring unary operator already registered");
            }
        }

        for (name, filter) in filters {
            policies.callables.merge(&mut self.filters, name, filter);
        }
        for (name, test) in tests {
            policies.callables.merge(&mut self.tests, name, test);
        }
        for (name, function) in functions {
            policies.callables.merge(&mut self.functions, name, function);
        }
        for (name, value) in global_variables {
            policies
                .global_variables
                .merge(&mut self.global_variables, name, value);
        }

        self.node_visitors.extend(node_visitors);
    }

    pub fn filter(&self, name: &str) -> Option<&Arc<dyn Filter>> {
        self.filters.get(name)
    }

    pub fn test(&self, name: &str) -> Option<&Arc<dyn Test>> {
        self.tests.get(name)
    }

    pub fn function(&self, name: &str) -> Option<&Arc<dyn Function>> {
        self.functions.get(name)
    }

    pub fn binary_operators(&self) -> &IndexMap<String, Arc<dyn BinaryOperator>> {
        &self.binary_operators
    }

    pub fn unary_operators(&self) -> &IndexMap<String, Arc<dyn UnaryOperator>> {
        &self.unary_operators
    }

    pub fn token_parsers(&self) -> &IndexMap<String, Arc<dyn TokenParser>> {
        &self.token_parsers
    }

    pub fn global_variables(&self) -> &IndexMap<String, Value> {
        &self.global_variables
    }

    pub fn node_visitors(&self) -> &[Arc<dyn NodeVisitorFactory>] {
        &self.node_visitors
    }
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("token_parsers", &self.token_parsers.keys().collect::<Vec<_>>())
            .field(
                "binary_operators",
                &self.binary_operators.keys().collect::<Vec<_>>(),
            )
            .field(
                "unary_operators",
                &self.unary_operators.keys().collect::<Vec<_>>(),
            )
            .field("filters", &self.filters.keys().collect::<Vec<_>>())
            .field("tests", &self.tests.keys().collect::<Vec<_>>())
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .field(
                "global_variables",
                &self.global_variables.keys().collect::<Vec<_>>(),
            )
            .field("node_visitors", &self.node_visitors.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExtensionError, ParseError};
    use crate::extension::Arguments;
    use crate::node::{NodeVisitor, RenderableNode, TextNode};
    use crate::parser::{Parser, Token};
    use std::sync::Mutex;

    struct ConstOperator {
        symbol: &'static str,
        result: i64,
    }

    impl BinaryOperator for ConstOperator {
        fn symbol(&self) -> &str {
            self.symbol
        }

        fn precedence(&self) -> u32 {
            40
        }

        fn apply(&self, _left: &Value, _right: &Value) -> Result<Value, ExtensionError> {
            Ok(Value::Integer(self.result))
        }
    }

    struct ConstFilter(&'static str);

    impl Filter for ConstFilter {
        fn apply(&self, _input: Value, _args: &Arguments) -> Result<Value, ExtensionError> {
            Ok(Value::from(self.0))
        }
    }

    struct ConstTag {
        output: &'static str,
    }

    impl TokenParser for ConstTag {
        fn tag(&self) -> &str {
            "const"
        }

        fn parse(
            &self,
            token: &Token,
            parser: &mut Parser<'_>,
        ) -> Result<Box<dyn RenderableNode>, ParseError> {
            parser.expect_execute_end()?;
            Ok(Box::new(TextNode::new(self.output, token.line)))
        }
    }

    struct NamedVisitorFactory {
        name: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    struct NoopVisitor;

    impl NodeVisitor for NoopVisitor {}

    impl NodeVisitorFactory for NamedVisitorFactory {
        fn create_visitor(&self, _template_name: &str) -> Box<dyn NodeVisitor> {
            self.log.lock().unwrap().push(self.name);
            Box::new(NoopVisitor)
        }
    }

    struct First;
    impl Extension for First {
        fn contributions(&self) -> Contributions {
            Contributions::new()
                .binary_operator(ConstOperator {
                    symbol: "+",
                    result: 1,
                })
                .filter("upper", ConstFilter("first"))
                .token_parser(ConstTag { output: "first" })
                .global_variable("site", "first")
        }
    }

    struct Second;
    impl Extension for Second {
        fn contributions(&self) -> Contributions {
            Contributions::new()
                .binary_operator(ConstOperator {
                    symbol: "+",
                    result: 2,
                })
                .filter("upper", ConstFilter("second"))
                .token_parser(ConstTag { output: "second" })
                .global_variable("site", "second")
        }
    }

    struct Empty;
    impl Extension for Empty {
        fn contributions(&self) -> Contributions {
            Contributions::default()
        }
    }

    #[test]
    fn test_operators_first_registration_wins() {
        let registry = ExtensionRegistry::builder()
            .register(First)
            .register(Second)
            .build();
        let plus = &registry.binary_operators()["+"];
        assert_eq!(
            plus.apply(&Value::Null, &Value::Null).unwrap(),
            Value::Integer(1)
        );
    }

    #[test]
    fn test_filters_last_registration_wins() {
        let registry = ExtensionRegistry::builder()
            .register(First)
            .register(Second)
            .build();
        let upper = registry.filter("upper").unwrap();
        assert_eq!(
            upper.apply(Value::Null, &Arguments::new()).unwrap(),
            Value::from("second")
        );
    }

    #[test]
    fn test_token_parsers_and_globals_last_registration_wins() {
        let registry = ExtensionRegistry::builder()
            .register(First)
            .register(Second)
            .build();
        assert_eq!(registry.token_parsers().len(), 1);
        assert_eq!(registry.global_variables()["site"], Value::from("second"));
    }

    #[test]
    fn test_missing_lookups_return_none() {
        let registry = ExtensionRegistry::builder().register(Empty).build();
        assert!(registry.filter("upper").is_none());
        assert!(registry.test("even").is_none());
        assert!(registry.function("range").is_none());
        assert!(registry.binary_operators().is_empty());
        assert!(registry.node_visitors().is_empty());
    }

    #[test]
    fn test_same_extension_type_registered_once() {
        let builder = ExtensionRegistry::builder()
            .register(First)
            .register(Empty)
            .register(First);
        assert_eq!(builder.len(), 2);
    }

    #[test]
    fn test_node_visitors_are_appended_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));

        struct VisitorsA(Arc<Mutex<Vec<&'static str>>>);
        impl Extension for VisitorsA {
            fn contributions(&self) -> Contributions {
                Contributions::new().node_visitor(NamedVisitorFactory {
                    name: "a",
                    log: self.0.clone(),
                })
            }
        }

        struct VisitorsB(Arc<Mutex<Vec<&'static str>>>);
        impl Extension for VisitorsB {
            fn contributions(&self) -> Contributions {
                Contributions::new()
                    .node_visitor(NamedVisitorFactory {
                        name: "b1",
                        log: self.0.clone(),
                    })
                    .node_visitor(NamedVisitorFactory {
                        name: "b2",
                        log: self.0.clone(),
                    })
            }
        }

        let registry = ExtensionRegistry::builder()
            .register(VisitorsA(log.clone()))
            .register(VisitorsB(log.clone()))
            .build();

        for factory in registry.node_visitors() {
            factory.create_visitor("t");
        }
        assert_eq!(*log.lock().unwrap(), vec!["a", "b1", "b2"]);
    }

    #[test]
    fn test_merge_policy() {
        let mut table = IndexMap::new();
        assert!(MergePolicy::FirstWins.merge(&mut table, "k".to_string(), 1));
        assert!(!MergePolicy::FirstWins.merge(&mut table, "k".to_string(), 2));
        assert_eq!(table["k"], 1);
        assert!(MergePolicy::LastWins.merge(&mut table, "k".to_string(), 3));
        assert_eq!(table["k"], 3);
    }
}
