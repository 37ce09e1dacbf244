/*
 * include.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! `{% include "name" %}` and `{% include "name" with {"key": value} %}`
//!
//! The included template is looked up through the engine that compiled the
//! including template. Relative names (`./`, `../`) are resolved against the
//! including template's name by the loader.

use super::{Expression, NodeVisitor, RenderableNode};
use crate::error::{LoaderError, RenderError, RenderResult, TemplateError};
use crate::runtime::{EvaluationContext, Output};
use crate::template::Template;
use crate::value::Value;

#[derive(Debug)]
pub struct IncludeNode {
    line: usize,
    name: Box<dyn Expression>,
    with: Option<Box<dyn Expression>>,
}

impl IncludeNode {
    pub fn new(name: Box<dyn Expression>, with: Option<Box<dyn Expression>>, line: usize) -> Self {
        Self { line, name, with }
    }

    fn include_error(&self, name: &str, template: &Template, source: TemplateError) -> RenderError {
        RenderError::Include {
            name: name.to_string(),
            line: self.line,
            template: template.name().to_string(),
            source: Box::new(source),
        }
    }
}

impl RenderableNode for IncludeNode {
    fn line_number(&self) -> usize {
        self.line
    }

    fn kind(&self) -> &'static str {
        "include"
    }

    fn render(
        &self,
        template: &Template,
        out: &mut Output,
        ctx: &mut EvaluationContext,
    ) -> RenderResult<()> {
        let name = self.name.evaluate(template, ctx)?.to_string();

        let Some(engine) = template.engine() else {
            return Err(self.include_error(
                &name,
                template,
                LoaderError::not_found(name.as_str()).into(),
            ));
        };
        let resolved = engine.resolve_relative_path(&name, template.name());
        let included = engine
            .get_template(&resolved)
            .map_err(|e| self.include_error(&resolved, template, e))?;

        let extra = match &self.with {
            Some(expression) => match expression.evaluate(template, ctx)? {
                Value::Map(map) => Some(map),
                Value::Null => None,
                other => {
                    return Err(RenderError::InvalidArgument {
                        callable: "include".to_string(),
                        message: format!("'with' expects a map, got {}", other.type_name()),
                        line: self.line,
                        template: template.name().to_string(),
                    });
                }
            },
            None => None,
        };

        ctx.enter_include(&resolved, self.line, template.name())?;
        tracing::trace!(
            template = template.name(),
            include = %resolved,
            depth = ctx.include_depth(),
            "Including template"
        );

        ctx.scope_chain_mut().push_scope();
        if let Some(map) = extra {
            for (key, value) in map.iter() {
                ctx.scope_chain_mut().put(key.clone(), value.clone());
            }
        }
        let result = included.root().render(&included, out, ctx);
        ctx.scope_chain_mut().pop_scope();
        ctx.exit_include();
        result
    }

    fn accept(&self, visitor: &mut dyn NodeVisitor) {
        visitor.visit_node(self);
        self.name.accept(visitor);
        if let Some(with) = &self.with {
            with.accept(visitor);
        }
    }
}
