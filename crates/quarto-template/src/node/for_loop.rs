/*
 * for_loop.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! `{% for item in items %} ... {% else %} ... {% endfor %}`

use super::{BodyNode, Expression, NodeVisitor, RenderableNode};
use crate::error::{RenderError, RenderResult};
use crate::runtime::{EvaluationContext, IterableSource, LOOP_VARIABLE, Output};
use crate::template::Template;

#[derive(Debug)]
pub struct ForNode {
    line: usize,
    variable: String,
    iterable: Box<dyn Expression>,
    body: BodyNode,
    else_body: Option<BodyNode>,
}

impl ForNode {
    pub fn new(
        variable: impl Into<String>,
        iterable: Box<dyn Expression>,
        body: BodyNode,
        else_body: Option<BodyNode>,
        line: usize,
    ) -> Self {
        Self {
            line,
            variable: variable.into(),
            iterable,
            body,
            else_body,
        }
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }
}

impl RenderableNode for ForNode {
    fn line_number(&self) -> usize {
        self.line
    }

    fn kind(&self) -> &'static str {
        "for"
    }

    fn render(
        &self,
        template: &Template,
        out: &mut Output,
        ctx: &mut EvaluationContext,
    ) -> RenderResult<()> {
        let subject = self.iterable.evaluate(template, ctx)?;
        if subject.is_null() {
            return Ok(());
        }

        let source =
            IterableSource::from_value(&subject).ok_or_else(|| RenderError::NotIterable {
                value: subject.to_string(),
                line: self.line,
                template: template.name().to_string(),
            })?;

        let length = source.len();
        if length == 0 {
            if let Some(else_body) = &self.else_body {
                else_body.render(template, out, ctx)?;
            }
            return Ok(());
        }

        let scopes = ctx.scope_chain();
        let new_scope = scopes.current_scope_contains(LOOP_VARIABLE)
            || scopes.current_scope_contains(&self.variable);
        if new_scope {
            ctx.scope_chain_mut().push_scope();
        }

        let mut state = ctx.loop_state_policy().new_state(length);
        let mut result = Ok(());
        for (index, item) in source.iter().enumerate().take(length) {
            state.bind(ctx.scope_chain_mut(), index);
            ctx.scope_chain_mut().put(self.variable.clone(), item);
            result = self.body.render(template, out, ctx);
            if result.is_err() {
                break;
            }
        }

        if new_scope {
            ctx.scope_chain_mut().pop_scope();
        }
        result
    }

    fn accept(&self, visitor: &mut dyn NodeVisitor) {
        visitor.visit_node(self);
        self.iterable.accept(visitor);
        self.body.accept(visitor);
        if let Some(else_body) = &self.else_body {
            else_body.accept(visitor);
        }
    }

    fn transform_children(&mut self, visitor: &mut dyn NodeVisitor) {
        self.body.transform(visitor);
        if let Some(else_body) = &mut self.else_body {
            else_body.transform(visitor);
        }
    }
}
