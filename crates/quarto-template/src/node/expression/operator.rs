/*
 * operator.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Operator expressions.

use super::Expression;
use crate::compiler::Compiler;
use crate::error::{ExtensionError, RenderError, RenderResult};
use crate::extension::{BinaryOperator, UnaryOperator};
use crate::node::NodeVisitor;
use crate::runtime::EvaluationContext;
use crate::template::Template;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

fn operator_error(
    symbol: &str,
    error: ExtensionError,
    line: usize,
    template: &Template,
) -> RenderError {
    RenderError::Operator {
        operator: symbol.to_string(),
        message: error.message,
        line,
        template: template.name().to_string(),
    }
}

/// `left <op> right`
pub struct BinaryExpression {
    line: usize,
    operator: Arc<dyn BinaryOperator>,
    left: Box<dyn Expression>,
    right: Box<dyn Expression>,
}

impl BinaryExpression {
    pub fn new(
        operator: Arc<dyn BinaryOperator>,
        left: Box<dyn Expression>,
        right: Box<dyn Expression>,
        line: usize,
    ) -> Self {
        Self {
            line,
            operator,
            left,
            right,
        }
    }

    pub fn symbol(&self) -> &str {
        self.operator.symbol()
    }
}

impl fmt::Debug for BinaryExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinaryExpression")
            .field("operator", &self.operator.symbol())
            .field("left", &self.left)
            .field("right", &self.right)
            .finish()
    }
}

impl Expression for BinaryExpression {
    fn line_number(&self) -> usize {
        self.line
    }

    fn kind(&self) -> &'static str {
        "binary"
    }

    fn evaluate(&self, template: &Template, ctx: &EvaluationContext) -> RenderResult<Value> {
        let left = self.left.evaluate(template, ctx)?;
        if let Some(result) = self.operator.short_circuit(&left) {
            return Ok(result);
        }
        let right = self.right.evaluate(template, ctx)?;
        self.operator
            .apply(&left, &right)
            .map_err(|e| operator_error(self.operator.symbol(), e, self.line, template))
    }

    fn compile(&self, compiler: &mut Compiler) {
        compiler
            .raw("(")
            .subcompile(self.left.as_ref())
            .raw(" ")
            .raw(self.operator.symbol())
            .raw(" ")
            .subcompile(self.right.as_ref())
            .raw(")");
    }

    fn accept(&self, visitor: &mut dyn NodeVisitor) {
        visitor.visit_expression(self);
        self.left.accept(visitor);
        self.right.accept(visitor);
    }
}

/// `<op> operand`
pub struct UnaryExpression {
    line: usize,
    operator: Arc<dyn UnaryOperator>,
    operand: Box<dyn Expression>,
}

impl UnaryExpression {
    pub fn new(
        operator: Arc<dyn UnaryOperator>,
        operand: Box<dyn Expression>,
        line: usize,
    ) -> Self {
        Self {
            line,
            operator,
            operand,
        }
    }
}

impl fmt::Debug for UnaryExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnaryExpression")
            .field("operator", &self.operator.symbol())
            .field("operand", &self.operand)
            .finish()
    }
}

impl Expression for UnaryExpression {
    fn line_number(&self) -> usize {
        self.line
    }

    fn kind(&self) -> &'static str {
        "unary"
    }

    fn evaluate(&self, template: &Template, ctx: &EvaluationContext) -> RenderResult<Value> {
        let operand = self.operand.evaluate(template, ctx)?;
        self.operator
            .apply(&operand)
            .map_err(|e| operator_error(self.operator.symbol(), e, self.line, template))
    }

    fn compile(&self, compiler: &mut Compiler) {
        let symbol = self.operator.symbol();
        compiler.raw("(").raw(symbol);
        // word operators need a separator: `(not x)`
        if symbol.chars().all(char::is_alphabetic) {
            compiler.raw(" ");
        }
        compiler.subcompile(self.operand.as_ref()).raw(")");
    }

    fn accept(&self, visitor: &mut dyn NodeVisitor) {
        visitor.visit_expression(self);
        self.operand.accept(visitor);
    }
}
