/*
 * mod.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Expression nodes.

mod call;
mod operator;

pub use call::{ArgumentsNode, FilterExpression, FunctionCallExpression, TestExpression};
pub use operator::{BinaryExpression, UnaryExpression};

use super::NodeVisitor;
use crate::compiler::Compiler;
use crate::error::{RenderError, RenderResult};
use crate::runtime::EvaluationContext;
use crate::template::Template;
use crate::value::Value;
use indexmap::IndexMap;
use std::fmt;

/// A node that evaluates to a value.
pub trait Expression: Send + Sync + fmt::Debug {
    fn line_number(&self) -> usize;

    fn kind(&self) -> &'static str;

    fn evaluate(&self, template: &Template, ctx: &EvaluationContext) -> RenderResult<Value>;

    /// Append a textual form of this expression to `compiler`.
    fn compile(&self, compiler: &mut Compiler);

    fn accept(&self, visitor: &mut dyn NodeVisitor);
}

/// A constant: string, number, boolean or null.
#[derive(Debug, Clone)]
pub struct LiteralExpression {
    line: usize,
    value: Value,
}

impl LiteralExpression {
    pub fn new(value: Value, line: usize) -> Self {
        Self { line, value }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl Expression for LiteralExpression {
    fn line_number(&self) -> usize {
        self.line
    }

    fn kind(&self) -> &'static str {
        "literal"
    }

    fn evaluate(&self, _template: &Template, _ctx: &EvaluationContext) -> RenderResult<Value> {
        Ok(self.value.clone())
    }

    fn compile(&self, compiler: &mut Compiler) {
        compile_value(&self.value, compiler);
    }

    fn accept(&self, visitor: &mut dyn NodeVisitor) {
        visitor.visit_expression(self);
    }
}

fn compile_value(value: &Value, compiler: &mut Compiler) {
    match value {
        Value::Null => {
            compiler.raw("null");
        }
        Value::Bool(b) => {
            compiler.raw(if *b { "true" } else { "false" });
        }
        Value::Integer(i) => {
            compiler.raw(&i.to_string());
        }
        Value::Float(x) => {
            compiler.raw(&format!("{:?}", x));
        }
        Value::String(s) => {
            compiler.string(s);
        }
        Value::List(items) => {
            compiler.raw("[");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    compiler.raw(", ");
                }
                compile_value(item, compiler);
            }
            compiler.raw("]");
        }
        Value::Map(_) | Value::Sequence(_) => {
            compiler.raw(&value.to_string());
        }
    }
}

/// A variable looked up in the scope chain.
#[derive(Debug, Clone)]
pub struct ContextVariableExpression {
    line: usize,
    name: String,
}

impl ContextVariableExpression {
    pub fn new(name: impl Into<String>, line: usize) -> Self {
        Self {
            line,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Expression for ContextVariableExpression {
    fn line_number(&self) -> usize {
        self.line
    }

    fn kind(&self) -> &'static str {
        "variable"
    }

    fn evaluate(&self, template: &Template, ctx: &EvaluationContext) -> RenderResult<Value> {
        match ctx.scope_chain().get(&self.name) {
            Some(value) => Ok(value.clone()),
            None if ctx.is_strict_variables() => Err(RenderError::UndefinedVariable {
                name: self.name.clone(),
                line: self.line,
                template: template.name().to_string(),
            }),
            None => Ok(Value::Null),
        }
    }

    fn compile(&self, compiler: &mut Compiler) {
        compiler.raw(&self.name);
    }

    fn accept(&self, visitor: &mut dyn NodeVisitor) {
        visitor.visit_expression(self);
    }
}

#[derive(Debug)]
pub enum Attribute {
    /// `object.name`
    Name(String),
    /// `object[expression]`
    Index(Box<dyn Expression>),
}

/// Attribute or subscript access on another expression.
#[derive(Debug)]
pub struct GetAttributeExpression {
    line: usize,
    object: Box<dyn Expression>,
    attribute: Attribute,
}

impl GetAttributeExpression {
    pub fn new(object: Box<dyn Expression>, attribute: Attribute, line: usize) -> Self {
        Self {
            line,
            object,
            attribute,
        }
    }
}

impl Expression for GetAttributeExpression {
    fn line_number(&self) -> usize {
        self.line
    }

    fn kind(&self) -> &'static str {
        "attribute"
    }

    fn evaluate(&self, template: &Template, ctx: &EvaluationContext) -> RenderResult<Value> {
        let object = self.object.evaluate(template, ctx)?;
        let (found, description) = match &self.attribute {
            Attribute::Name(name) => (object.get_attribute(name), name.clone()),
            Attribute::Index(index) => {
                let index = index.evaluate(template, ctx)?;
                (object.get_index(&index), format!("[{}]", index))
            }
        };
        match found {
            Some(value) => Ok(value),
            None if ctx.is_strict_variables() => Err(RenderError::UndefinedVariable {
                name: description,
                line: self.line,
                template: template.name().to_string(),
            }),
            None => Ok(Value::Null),
        }
    }

    fn compile(&self, compiler: &mut Compiler) {
        compiler.subcompile(self.object.as_ref());
        match &self.attribute {
            Attribute::Name(name) => {
                compiler.raw(".").raw(name);
            }
            Attribute::Index(index) => {
                compiler.raw("[").subcompile(index.as_ref()).raw("]");
            }
        }
    }

    fn accept(&self, visitor: &mut dyn NodeVisitor) {
        visitor.visit_expression(self);
        self.object.accept(visitor);
        if let Attribute::Index(index) = &self.attribute {
            index.accept(visitor);
        }
    }
}

/// `[a, b, c]`
#[derive(Debug)]
pub struct ListExpression {
    line: usize,
    items: Vec<Box<dyn Expression>>,
}

impl ListExpression {
    pub fn new(items: Vec<Box<dyn Expression>>, line: usize) -> Self {
        Self { line, items }
    }
}

impl Expression for ListExpression {
    fn line_number(&self) -> usize {
        self.line
    }

    fn kind(&self) -> &'static str {
        "list"
    }

    fn evaluate(&self, template: &Template, ctx: &EvaluationContext) -> RenderResult<Value> {
        let items = self
            .items
            .iter()
            .map(|item| item.evaluate(template, ctx))
            .collect::<RenderResult<Vec<_>>>()?;
        Ok(Value::from(items))
    }

    fn compile(&self, compiler: &mut Compiler) {
        compiler.raw("[");
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                compiler.raw(", ");
            }
            compiler.subcompile(item.as_ref());
        }
        compiler.raw("]");
    }

    fn accept(&self, visitor: &mut dyn NodeVisitor) {
        visitor.visit_expression(self);
        for item in &self.items {
            item.accept(visitor);
        }
    }
}

/// `{"key": value}`
#[derive(Debug)]
pub struct MapExpression {
    line: usize,
    entries: Vec<(String, Box<dyn Expression>)>,
}

impl MapExpression {
    pub fn new(entries: Vec<(String, Box<dyn Expression>)>, line: usize) -> Self {
        Self { line, entries }
    }
}

impl Expression for MapExpression {
    fn line_number(&self) -> usize {
        self.line
    }

    fn kind(&self) -> &'static str {
        "map"
    }

    fn evaluate(&self, template: &Template, ctx: &EvaluationContext) -> RenderResult<Value> {
        let mut map = IndexMap::with_capacity(self.entries.len());
        for (key, value) in &self.entries {
            map.insert(key.clone(), value.evaluate(template, ctx)?);
        }
        Ok(Value::from(map))
    }

    fn compile(&self, compiler: &mut Compiler) {
        compiler.raw("{");
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                compiler.raw(", ");
            }
            compiler.string(key).raw(": ").subcompile(value.as_ref());
        }
        compiler.raw("}");
    }

    fn accept(&self, visitor: &mut dyn NodeVisitor) {
        visitor.visit_expression(self);
        for (_, value) in &self.entries {
            value.accept(visitor);
        }
    }
}
