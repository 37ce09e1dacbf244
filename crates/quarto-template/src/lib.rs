/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Extensible text template engine.
//!
//! Templates mix literal text with tags:
//!
//! - Output: `{{ user.name | upper }}`
//! - Loops: `{% for item in items %}...{% else %}...{% endfor %}`
//! - Conditionals: `{% if a %}...{% elseif b %}...{% else %}...{% endif %}`
//! - Assignment: `{% set total = price * count %}`
//! - Composition: `{% include "./footer" with {"year": 2025} %}`
//! - Concurrency: `{% parallel %}...{% endparallel %}`
//! - Comments: `{# ignored #}`
//!
//! Inside a `for` loop the `loop` variable exposes `index`, `revindex`,
//! `first`, `last` and `length`.
//!
//! # Architecture
//!
//! - [`loader`] turns template names into source text. Loaders compose
//!   through [`DelegatingLoader`], which tries its children in order.
//! - [`extension`] holds the pluggable grammar and runtime: tag parsers,
//!   operators, filters, tests, functions, globals and node visitors. The
//!   [`ExtensionRegistry`] merges contributions from all extensions.
//! - [`parser`] builds a tree of [`node`]s, which the [`runtime`] renders
//!   against a chain of variable scopes.
//! - [`Engine`] ties these together and caches compiled [`Template`]s.
//!
//! # Example
//!
//! ```ignore
//! use quarto_template::{Engine, MemoryLoader, Value};
//!
//! let engine = Engine::builder()
//!     .loader(MemoryLoader::new().with_template(
//!         "list",
//!         "{% for x in items %}{{ loop.index }}:{{ x }}{% endfor %}",
//!     ))
//!     .build()?;
//!
//! let output = engine
//!     .get_template("list")?
//!     .render([("items", Value::list(["a".into(), "b".into()]))])?;
//! assert_eq!(output, "0:a1:b");
//! ```

pub mod compiler;
pub mod config;
pub mod engine;
pub mod error;
pub mod extension;
pub mod lexer;
pub mod loader;
pub mod node;
pub mod parser;
pub mod runtime;
pub mod template;
pub mod value;

// Re-export main types at crate root
pub use compiler::{Compiler, compile_expression};
pub use config::EngineConfig;
pub use engine::{Engine, EngineBuilder};
pub use error::{
    ExtensionError, LoaderError, ParseError, RenderError, RenderResult, TemplateError,
    TemplateResult,
};
pub use extension::core::CoreExtension;
pub use extension::{
    Arguments, Associativity, BinaryOperator, Contributions, Extension, ExtensionRegistry,
    Filter, Function, MergePolicy, Test, UnaryOperator,
};
pub use loader::{
    DelegatingLoader, FileLoader, Loader, LoaderSettings, MemoryLoader, StringLoader,
};
pub use node::{Expression, NodeVisitor, NodeVisitorFactory, RenderableNode};
pub use parser::TokenParser;
pub use runtime::{EvaluationContext, Executor, InlineExecutor, LoopMetadata};
pub use template::Template;
pub use value::{Sequence, Value};
