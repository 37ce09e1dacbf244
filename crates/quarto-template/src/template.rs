/*
 * template.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Compiled templates.

use crate::engine::{Engine, EngineShared};
use crate::error::RenderResult;
use crate::extension::ExtensionRegistry;
use crate::node::{BodyNode, RenderableNode};
use crate::runtime::{EvaluationContext, Executor, Output};
use crate::value::Value;
use std::fmt;
use std::sync::{Arc, Weak};

/// Render settings captured from the engine when a template is compiled.
#[derive(Debug, Clone, Default)]
pub(crate) struct RenderSettings {
    pub strict_variables: bool,
    pub max_include_depth: usize,
    pub default_locale: Option<String>,
}

/// A parsed template, ready to render.
///
/// Templates are cheap to clone and can be rendered concurrently from any
/// number of threads; each render gets its own [`EvaluationContext`].
#[derive(Clone)]
pub struct Template {
    name: Arc<str>,
    root: Arc<BodyNode>,
    registry: Arc<ExtensionRegistry>,
    settings: Arc<RenderSettings>,
    executor: Option<Arc<dyn Executor>>,
    engine: Weak<EngineShared>,
}

impl Template {
    pub(crate) fn new(
        name: &str,
        root: BodyNode,
        registry: Arc<ExtensionRegistry>,
        settings: Arc<RenderSettings>,
        executor: Option<Arc<dyn Executor>>,
        engine: Weak<EngineShared>,
    ) -> Self {
        Self {
            name: Arc::from(name),
            root: Arc::new(root),
            registry,
            settings,
            executor,
            engine,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &BodyNode {
        &self.root
    }

    /// The engine this template was compiled by, if it is still alive.
    pub fn engine(&self) -> Option<Engine> {
        self.engine.upgrade().map(Engine::from_shared)
    }

    /// Render with the engine's default locale.
    pub fn render<K: Into<String>>(
        &self,
        variables: impl IntoIterator<Item = (K, Value)>,
    ) -> RenderResult<String> {
        let mut out = String::new();
        self.render_to(&mut out, variables)?;
        Ok(out)
    }

    pub fn render_to<W: fmt::Write + ?Sized, K: Into<String>>(
        &self,
        writer: &mut W,
        variables: impl IntoIterator<Item = (K, Value)>,
    ) -> RenderResult<()> {
        let ctx = self.evaluation_context(variables, None);
        self.evaluate(writer, ctx)
    }

    pub fn render_with_locale<K: Into<String>>(
        &self,
        variables: impl IntoIterator<Item = (K, Value)>,
        locale: &str,
    ) -> RenderResult<String> {
        let mut out = String::new();
        let ctx = self.evaluation_context(variables, Some(locale.to_string()));
        self.evaluate(&mut out, ctx)?;
        Ok(out)
    }

    /// Render against a context built by the caller.
    pub fn render_context<W: fmt::Write + ?Sized>(
        &self,
        writer: &mut W,
        ctx: EvaluationContext,
    ) -> RenderResult<()> {
        self.evaluate(writer, ctx)
    }

    /// Fresh context: globals in frame 0, `variables` in frame 1.
    pub fn evaluation_context<K: Into<String>>(
        &self,
        variables: impl IntoIterator<Item = (K, Value)>,
        locale: Option<String>,
    ) -> EvaluationContext {
        EvaluationContext::new(self.registry.clone())
            .with_variables(variables)
            .with_locale(locale.or_else(|| self.settings.default_locale.clone()))
            .with_executor(self.executor.clone())
            .with_strict_variables(self.settings.strict_variables)
            .with_max_include_depth(self.settings.max_include_depth)
    }

    fn evaluate<W: fmt::Write + ?Sized>(
        &self,
        writer: &mut W,
        mut ctx: EvaluationContext,
    ) -> RenderResult<()> {
        let mut out = Output::new();
        self.root.render(self, &mut out, &mut ctx)?;
        out.finish(writer)
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("name", &self.name)
            .field("root", &self.root)
            .finish()
    }
}
