/*
 * scope.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Variable scopes.
//!
//! A [`ScopeChain`] is a stack of frames searched innermost-first. Frame 0
//! holds the global variables of the render and is never popped.
//!
//! Frames are reference counted. Writes go through [`Arc::make_mut`], so a
//! frame captured by [`ScopeChain::fork`] is never mutated by the render that
//! forked it.

use crate::value::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A single frame of variable bindings.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    variables: HashMap<String, Value>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_variables(variables: HashMap<String, Value>) -> Self {
        Self { variables }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.variables.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

/// Ordered stack of scopes with innermost-first lookup.
#[derive(Debug, Clone)]
pub struct ScopeChain {
    frames: Vec<Arc<Scope>>,
}

impl ScopeChain {
    /// Create a chain whose outermost frame holds `globals`.
    pub fn new(globals: Scope) -> Self {
        Self {
            frames: vec![Arc::new(globals)],
        }
    }

    /// Number of frames, including the global frame.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn push_scope(&mut self) {
        self.frames.push(Arc::new(Scope::new()));
    }

    pub fn push(&mut self, scope: Scope) {
        self.frames.push(Arc::new(scope));
    }

    /// Pop the innermost frame. The global frame is never removed.
    pub fn pop_scope(&mut self) -> bool {
        if self.frames.len() > 1 {
            self.frames.pop();
            true
        } else {
            false
        }
    }

    /// Look up a variable, searching from the innermost frame outward.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn current_scope_contains(&self, name: &str) -> bool {
        self.current().contains(name)
    }

    /// Bind a variable in the innermost frame.
    pub fn put(&mut self, name: impl Into<String>, value: Value) {
        self.current_mut().insert(name, value);
    }

    pub fn current(&self) -> &Scope {
        // frames is never empty
        &self.frames[self.frames.len() - 1]
    }

    /// Mutable access to the innermost frame, copying it first if a fork
    /// still shares it.
    pub fn current_mut(&mut self) -> &mut Scope {
        let last = self.frames.len() - 1;
        Arc::make_mut(&mut self.frames[last])
    }

    /// Replace the innermost frame with a freshly allocated copy of its
    /// bindings.
    pub fn detach_current(&mut self) {
        let last = self.frames.len() - 1;
        let copy = Scope::clone(&self.frames[last]);
        self.frames[last] = Arc::new(copy);
    }

    /// Snapshot of the chain for use on another thread.
    ///
    /// Frames are shared until either side writes to them.
    pub fn fork(&self) -> ScopeChain {
        self.clone()
    }

    /// True if the innermost frames of both chains are the same allocation.
    pub fn shares_current_with(&self, other: &ScopeChain) -> bool {
        Arc::ptr_eq(
            &self.frames[self.frames.len() - 1],
            &other.frames[other.frames.len() - 1],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> ScopeChain {
        let mut globals = Scope::new();
        globals.insert("x", Value::from("global_x"));
        globals.insert("y", Value::from("global_y"));
        ScopeChain::new(globals)
    }

    #[test]
    fn test_inner_frame_shadows_outer() {
        let mut scopes = chain();
        scopes.push_scope();
        scopes.put("x", Value::from("inner_x"));

        assert_eq!(scopes.get("x"), Some(&Value::from("inner_x")));
        assert_eq!(scopes.get("y"), Some(&Value::from("global_y")));
        assert!(!scopes.current_scope_contains("y"));

        scopes.pop_scope();
        assert_eq!(scopes.get("x"), Some(&Value::from("global_x")));
    }

    #[test]
    fn test_global_frame_is_never_popped() {
        let mut scopes = chain();
        assert!(!scopes.pop_scope());
        assert_eq!(scopes.depth(), 1);
        assert!(scopes.contains("x"));
    }

    #[test]
    fn test_fork_isolates_writes() {
        let mut scopes = chain();
        scopes.push_scope();
        scopes.put("item", Value::from(1));

        let fork = scopes.fork();
        assert!(scopes.shares_current_with(&fork));

        scopes.put("item", Value::from(2));
        assert!(!scopes.shares_current_with(&fork));
        assert_eq!(fork.get("item"), Some(&Value::from(1)));
        assert_eq!(scopes.get("item"), Some(&Value::from(2)));
    }

    #[test]
    fn test_detach_current_allocates_new_frame() {
        let mut scopes = chain();
        let before = scopes.fork();
        scopes.detach_current();
        assert!(!scopes.shares_current_with(&before));
        assert_eq!(scopes.get("x"), Some(&Value::from("global_x")));
    }
}
