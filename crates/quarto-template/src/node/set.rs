/*
 * set.rs
 * Copyright (c) 2025 Posit, PBC
 */

use super::{Expression, NodeVisitor, RenderableNode};
use crate::error::RenderResult;
use crate::runtime::{EvaluationContext, Output};
use crate::template::Template;

/// `{% set name = expression %}`, bound in the innermost frame.
#[derive(Debug)]
pub struct SetNode {
    line: usize,
    name: String,
    value: Box<dyn Expression>,
}

impl SetNode {
    pub fn new(name: impl Into<String>, value: Box<dyn Expression>, line: usize) -> Self {
        Self {
            line,
            name: name.into(),
            value,
        }
    }
}

impl RenderableNode for SetNode {
    fn line_number(&self) -> usize {
        self.line
    }

    fn kind(&self) -> &'static str {
        "set"
    }

    fn render(
        &self,
        template: &Template,
        _out: &mut Output,
        ctx: &mut EvaluationContext,
    ) -> RenderResult<()> {
        let value = self.value.evaluate(template, ctx)?;
        ctx.scope_chain_mut().put(self.name.clone(), value);
        Ok(())
    }

    fn accept(&self, visitor: &mut dyn NodeVisitor) {
        visitor.visit_node(self);
        self.value.accept(visitor);
    }
}
