/*
 * conditional.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! `{% if %} ... {% elseif %} ... {% else %} ... {% endif %}`

use super::{BodyNode, Expression, NodeVisitor, RenderableNode};
use crate::error::RenderResult;
use crate::runtime::{EvaluationContext, Output};
use crate::template::Template;

#[derive(Debug)]
pub struct IfNode {
    line: usize,
    branches: Vec<(Box<dyn Expression>, BodyNode)>,
    else_body: Option<BodyNode>,
}

impl IfNode {
    pub fn new(
        branches: Vec<(Box<dyn Expression>, BodyNode)>,
        else_body: Option<BodyNode>,
        line: usize,
    ) -> Self {
        Self {
            line,
            branches,
            else_body,
        }
    }
}

impl RenderableNode for IfNode {
    fn line_number(&self) -> usize {
        self.line
    }

    fn kind(&self) -> &'static str {
        "if"
    }

    fn render(
        &self,
        template: &Template,
        out: &mut Output,
        ctx: &mut EvaluationContext,
    ) -> RenderResult<()> {
        for (condition, body) in &self.branches {
            if condition.evaluate(template, ctx)?.is_truthy() {
                return body.render(template, out, ctx);
            }
        }
        match &self.else_body {
            Some(body) => body.render(template, out, ctx),
            None => Ok(()),
        }
    }

    fn accept(&self, visitor: &mut dyn NodeVisitor) {
        visitor.visit_node(self);
        for (condition, body) in &self.branches {
            condition.accept(visitor);
            body.accept(visitor);
        }
        if let Some(body) = &self.else_body {
            body.accept(visitor);
        }
    }

    fn transform_children(&mut self, visitor: &mut dyn NodeVisitor) {
        for (_, body) in &mut self.branches {
            body.transform(visitor);
        }
        if let Some(body) = &mut self.else_body {
            body.transform(visitor);
        }
    }
}
