/*
 * context.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Evaluation context for template rendering.
//!
//! [`EvaluationContext`] is threaded through every node during a render. It
//! carries:
//!
//! 1. **Variables**: the [`ScopeChain`] of the render
//! 2. **Extensions**: the registry that filters, tests and functions are
//!    looked up in
//! 3. **Configuration**: locale, strict variables, include depth limit
//! 4. **Concurrency**: the executor used by `parallel`, if any

use super::executor::Executor;
use super::iteration::LoopStatePolicy;
use super::scope::{Scope, ScopeChain};
use crate::error::{RenderError, RenderResult};
use crate::extension::ExtensionRegistry;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Default limit on nested includes.
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 50;

/// State of a single render.
#[derive(Clone)]
pub struct EvaluationContext {
    scope_chain: ScopeChain,
    registry: Arc<ExtensionRegistry>,
    locale: Option<String>,
    executor: Option<Arc<dyn Executor>>,
    strict_variables: bool,
    include_depth: usize,
    max_include_depth: usize,
    in_parallel_task: bool,
}

impl EvaluationContext {
    /// Create a context whose global frame holds the registry's global
    /// variables.
    pub fn new(registry: Arc<ExtensionRegistry>) -> Self {
        let mut globals = Scope::new();
        for (name, value) in registry.global_variables() {
            globals.insert(name.clone(), value.clone());
        }
        Self {
            scope_chain: ScopeChain::new(globals),
            registry,
            locale: None,
            executor: None,
            strict_variables: false,
            include_depth: 0,
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
            in_parallel_task: false,
        }
    }

    /// Push a frame holding the caller's variables.
    pub fn with_variables<K: Into<String>>(
        mut self,
        variables: impl IntoIterator<Item = (K, Value)>,
    ) -> Self {
        let mut scope = Scope::new();
        for (name, value) in variables {
            scope.insert(name, value);
        }
        self.scope_chain.push(scope);
        self
    }

    pub fn with_locale(mut self, locale: Option<String>) -> Self {
        self.locale = locale;
        self
    }

    /// Attach an executor. `parallel` bodies are only dispatched when one
    /// is present.
    pub fn with_executor(mut self, executor: Option<Arc<dyn Executor>>) -> Self {
        self.executor = executor;
        self
    }

    /// Enable or disable strict variables.
    ///
    /// In strict mode, undefined variables and attributes are errors instead
    /// of evaluating to null.
    pub fn with_strict_variables(mut self, strict: bool) -> Self {
        self.strict_variables = strict;
        self
    }

    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }

    pub fn scope_chain(&self) -> &ScopeChain {
        &self.scope_chain
    }

    pub fn scope_chain_mut(&mut self) -> &mut ScopeChain {
        &mut self.scope_chain
    }

    pub fn registry(&self) -> &ExtensionRegistry {
        &self.registry
    }

    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    pub fn executor(&self) -> Option<&Arc<dyn Executor>> {
        self.executor.as_ref()
    }

    pub fn is_strict_variables(&self) -> bool {
        self.strict_variables
    }

    /// True while rendering the body of a dispatched `parallel` task.
    pub fn is_parallel_task(&self) -> bool {
        self.in_parallel_task
    }

    /// How for-loops maintain their `loop` variable in this render.
    ///
    /// With an executor attached, loop bodies may be captured by tasks on
    /// other threads, so every iteration gets a freshly allocated state.
    pub fn loop_state_policy(&self) -> LoopStatePolicy {
        if self.executor.is_some() {
            LoopStatePolicy::Fresh
        } else {
            LoopStatePolicy::Reuse
        }
    }

    pub fn include_depth(&self) -> usize {
        self.include_depth
    }

    /// Record entry into an included template.
    pub fn enter_include(&mut self, name: &str, line: usize, template: &str) -> RenderResult<()> {
        if self.include_depth >= self.max_include_depth {
            return Err(RenderError::RecursiveInclude {
                name: name.to_string(),
                max_depth: self.max_include_depth,
                line,
                template: template.to_string(),
            });
        }
        self.include_depth += 1;
        Ok(())
    }

    pub fn exit_include(&mut self) {
        self.include_depth = self.include_depth.saturating_sub(1);
    }

    /// Snapshot of this context for a task running on another thread.
    ///
    /// The scope chain is forked, so writes on either side stay private.
    pub fn fork_for_task(&self) -> EvaluationContext {
        EvaluationContext {
            scope_chain: self.scope_chain.fork(),
            in_parallel_task: true,
            ..self.clone()
        }
    }
}

impl fmt::Debug for EvaluationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationContext")
            .field("scope_depth", &self.scope_chain.depth())
            .field("locale", &self.locale)
            .field("has_executor", &self.executor.is_some())
            .field("strict_variables", &self.strict_variables)
            .field("include_depth", &self.include_depth)
            .field("max_include_depth", &self.max_include_depth)
            .field("in_parallel_task", &self.in_parallel_task)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::{Contributions, Extension};
    use crate::runtime::InlineExecutor;

    struct Site;
    impl Extension for Site {
        fn contributions(&self) -> Contributions {
            Contributions::new().global_variable("site", "docs")
        }
    }

    fn registry() -> Arc<ExtensionRegistry> {
        Arc::new(ExtensionRegistry::builder().register(Site).build())
    }

    #[test]
    fn test_globals_then_caller_variables() {
        let ctx = EvaluationContext::new(registry())
            .with_variables([("site", Value::from("override")), ("x", Value::from(1))]);
        assert_eq!(ctx.scope_chain().depth(), 2);
        assert_eq!(ctx.scope_chain().get("site"), Some(&Value::from("override")));
        assert_eq!(ctx.scope_chain().get("x"), Some(&Value::from(1)));
    }

    #[test]
    fn test_loop_state_policy_follows_executor() {
        let ctx = EvaluationContext::new(registry());
        assert_eq!(ctx.loop_state_policy(), LoopStatePolicy::Reuse);

        let ctx = ctx.with_executor(Some(Arc::new(InlineExecutor)));
        assert_eq!(ctx.loop_state_policy(), LoopStatePolicy::Fresh);
    }

    #[test]
    fn test_include_depth_limit() {
        let mut ctx = EvaluationContext::new(registry()).with_max_include_depth(2);
        ctx.enter_include("a", 1, "root").unwrap();
        ctx.enter_include("b", 1, "a").unwrap();
        let err = ctx.enter_include("c", 4, "b").unwrap_err();
        assert!(matches!(
            err,
            RenderError::RecursiveInclude { max_depth: 2, line: 4, .. }
        ));
        ctx.exit_include();
        assert_eq!(ctx.include_depth(), 1);
    }

    #[test]
    fn test_fork_for_task_is_isolated() {
        let mut ctx = EvaluationContext::new(registry()).with_variables([("x", Value::from(1))]);
        let fork = ctx.fork_for_task();
        assert!(fork.is_parallel_task());
        assert!(!ctx.is_parallel_task());

        ctx.scope_chain_mut().put("x", Value::from(2));
        assert_eq!(fork.scope_chain().get("x"), Some(&Value::from(1)));
    }
}
