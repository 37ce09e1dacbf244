/*
 * parallel.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! `{% parallel %} ... {% endparallel %}`
//!
//! When the render has an executor, the body is rendered as a task on it
//! against a forked copy of the scope chain, and its output is stitched back
//! in at the position of the tag. Without an executor, or inside a task that
//! is already running on one, the body renders inline.
//!
//! Variables set inside a dispatched body are not visible after the tag.

use super::{BodyNode, NodeVisitor, RenderableNode};
use crate::error::RenderResult;
use crate::runtime::{EvaluationContext, Output};
use crate::template::Template;
use std::sync::{Arc, mpsc};

#[derive(Debug)]
pub struct ParallelNode {
    line: usize,
    body: Arc<BodyNode>,
}

impl ParallelNode {
    pub fn new(body: BodyNode, line: usize) -> Self {
        Self {
            line,
            body: Arc::new(body),
        }
    }
}

impl RenderableNode for ParallelNode {
    fn line_number(&self) -> usize {
        self.line
    }

    fn kind(&self) -> &'static str {
        "parallel"
    }

    fn render(
        &self,
        template: &Template,
        out: &mut Output,
        ctx: &mut EvaluationContext,
    ) -> RenderResult<()> {
        let executor = match ctx.executor() {
            Some(executor) if !ctx.is_parallel_task() => executor.clone(),
            _ => return self.body.render(template, out, ctx),
        };

        let mut task_ctx = ctx.fork_for_task();
        let body = self.body.clone();
        let task_template = template.clone();
        let (sender, receiver) = mpsc::channel();

        tracing::trace!(
            template = template.name(),
            line = self.line,
            "Dispatching parallel block"
        );
        executor.spawn(Box::new(move || {
            let mut task_out = Output::new();
            let result = body
                .render(&task_template, &mut task_out, &mut task_ctx)
                .and_then(|()| task_out.into_string());
            // the receiving render may already have failed
            let _ = sender.send(result);
        }));

        out.defer(receiver, self.line, template.name());
        Ok(())
    }

    fn accept(&self, visitor: &mut dyn NodeVisitor) {
        visitor.visit_node(self);
        self.body.accept(visitor);
    }

    fn transform_children(&mut self, visitor: &mut dyn NodeVisitor) {
        // the body is only shared once rendering has started
        if let Some(body) = Arc::get_mut(&mut self.body) {
            body.transform(visitor);
        }
    }
}
