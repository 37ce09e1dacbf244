/*
 * mod.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Evaluation runtime: scopes, loop state, output and task execution.

pub mod context;
pub mod executor;
pub mod iteration;
pub mod output;
pub mod scope;

pub use context::{DEFAULT_MAX_INCLUDE_DEPTH, EvaluationContext};
pub use executor::{Executor, InlineExecutor, Task, thread_pool};
pub use iteration::{IterableSource, LOOP_VARIABLE, LoopMetadata, LoopState, LoopStatePolicy};
pub use output::Output;
pub use scope::{Scope, ScopeChain};
