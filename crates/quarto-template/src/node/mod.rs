/*
 * mod.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The parsed node tree.
//!
//! Nodes come in two kinds:
//!
//! - [`RenderableNode`]s write output as a side effect of rendering
//! - [`Expression`]s evaluate to a [`Value`]
//!
//! Trees are immutable after parsing and shared between concurrent renders
//! of the same template.

pub mod conditional;
pub mod expression;
pub mod for_loop;
pub mod include;
pub mod parallel;
pub mod set;

pub use conditional::IfNode;
pub use expression::{
    ArgumentsNode, Attribute, BinaryExpression, ContextVariableExpression, Expression, FilterExpression,
    FunctionCallExpression, GetAttributeExpression, ListExpression, LiteralExpression,
    MapExpression, TestExpression, UnaryExpression,
};
pub use for_loop::ForNode;
pub use include::IncludeNode;
pub use parallel::ParallelNode;
pub use set::SetNode;

use crate::error::RenderResult;
use crate::runtime::{EvaluationContext, Output};
use crate::template::Template;
use std::fmt;
use std::fmt::Write;

/// A node that produces output.
pub trait RenderableNode: Send + Sync + fmt::Debug {
    fn line_number(&self) -> usize;

    /// Short name of the node type (e.g. `"for"`), for visitors and logs.
    fn kind(&self) -> &'static str;

    /// Render this node into `out`.
    ///
    /// Errors carry this node's line and the name of `template`.
    fn render(
        &self,
        template: &Template,
        out: &mut Output,
        ctx: &mut EvaluationContext,
    ) -> RenderResult<()>;

    /// Call `visitor` for this node and everything below it.
    fn accept(&self, visitor: &mut dyn NodeVisitor);

    /// Offer every child body node to [`NodeVisitor::transform_node`],
    /// innermost first. Leaf nodes have nothing to do.
    fn transform_children(&mut self, _visitor: &mut dyn NodeVisitor) {}
}

/// A pass over a parsed tree, run before the template is finalized.
///
/// The engine first walks the tree with [`RenderableNode::accept`], then
/// gives the visitor a chance to rewrite it through `transform_node`.
pub trait NodeVisitor {
    fn visit_node(&mut self, _node: &dyn RenderableNode) {}

    fn visit_expression(&mut self, _expression: &dyn Expression) {}

    /// Replace, wrap or keep a node. Children have already been
    /// transformed when this is called.
    fn transform_node(&mut self, node: Box<dyn RenderableNode>) -> Box<dyn RenderableNode> {
        node
    }
}

/// Creates one visitor per compiled template.
pub trait NodeVisitorFactory: Send + Sync {
    fn create_visitor(&self, template_name: &str) -> Box<dyn NodeVisitor>;
}

/// An ordered sequence of renderable children.
#[derive(Debug, Default)]
pub struct BodyNode {
    line: usize,
    children: Vec<Box<dyn RenderableNode>>,
}

impl BodyNode {
    pub fn new(children: Vec<Box<dyn RenderableNode>>, line: usize) -> Self {
        Self { line, children }
    }

    pub fn children(&self) -> &[Box<dyn RenderableNode>] {
        &self.children
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Run the rewriting half of a visitor pass over this body.
    pub fn transform(&mut self, visitor: &mut dyn NodeVisitor) {
        let children = std::mem::take(&mut self.children);
        self.children.reserve(children.len());
        for mut child in children {
            child.transform_children(visitor);
            self.children.push(visitor.transform_node(child));
        }
    }
}

impl RenderableNode for BodyNode {
    fn line_number(&self) -> usize {
        self.line
    }

    fn kind(&self) -> &'static str {
        "body"
    }

    fn render(
        &self,
        template: &Template,
        out: &mut Output,
        ctx: &mut EvaluationContext,
    ) -> RenderResult<()> {
        for child in &self.children {
            child.render(template, out, ctx)?;
        }
        Ok(())
    }

    fn accept(&self, visitor: &mut dyn NodeVisitor) {
        visitor.visit_node(self);
        for child in &self.children {
            child.accept(visitor);
        }
    }

    fn transform_children(&mut self, visitor: &mut dyn NodeVisitor) {
        self.transform(visitor);
    }
}

/// Literal text copied to the output.
#[derive(Debug, Clone)]
pub struct TextNode {
    line: usize,
    text: String,
}

impl TextNode {
    pub fn new(text: impl Into<String>, line: usize) -> Self {
        Self {
            line,
            text: text.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl RenderableNode for TextNode {
    fn line_number(&self) -> usize {
        self.line
    }

    fn kind(&self) -> &'static str {
        "text"
    }

    fn render(
        &self,
        _template: &Template,
        out: &mut Output,
        _ctx: &mut EvaluationContext,
    ) -> RenderResult<()> {
        out.write(&self.text);
        Ok(())
    }

    fn accept(&self, visitor: &mut dyn NodeVisitor) {
        visitor.visit_node(self);
    }
}

/// `{{ expression }}`
#[derive(Debug)]
pub struct PrintNode {
    line: usize,
    expression: Box<dyn Expression>,
}

impl PrintNode {
    pub fn new(expression: Box<dyn Expression>, line: usize) -> Self {
        Self { line, expression }
    }

    pub fn expression(&self) -> &dyn Expression {
        self.expression.as_ref()
    }
}

impl RenderableNode for PrintNode {
    fn line_number(&self) -> usize {
        self.line
    }

    fn kind(&self) -> &'static str {
        "print"
    }

    fn render(
        &self,
        template: &Template,
        out: &mut Output,
        ctx: &mut EvaluationContext,
    ) -> RenderResult<()> {
        let value = self.expression.evaluate(template, ctx)?;
        write!(out, "{}", value)?;
        Ok(())
    }

    fn accept(&self, visitor: &mut dyn NodeVisitor) {
        visitor.visit_node(self);
        self.expression.accept(visitor);
    }
}
