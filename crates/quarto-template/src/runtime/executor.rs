/*
 * executor.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Concurrent task facility used by the `parallel` construct.

/// A unit of work submitted to an [`Executor`].
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Something that can run tasks on other threads.
///
/// Ordering of task completion is up to the executor; the render output is
/// reassembled in source order regardless.
pub trait Executor: Send + Sync {
    fn spawn(&self, task: Task);
}

impl Executor for rayon::ThreadPool {
    fn spawn(&self, task: Task) {
        rayon::ThreadPool::spawn(self, task);
    }
}

/// Executor that runs every task immediately on the submitting thread.
///
/// Renders still take the concurrent code paths (fresh loop state, forked
/// scopes) which makes it useful for deterministic tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn spawn(&self, task: Task) {
        task();
    }
}

/// Build a rayon pool with the given number of worker threads.
pub fn thread_pool(threads: usize) -> Result<rayon::ThreadPool, rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("quarto-template-{}", i))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_inline_executor_runs_immediately() {
        let (tx, rx) = mpsc::channel();
        InlineExecutor.spawn(Box::new(move || tx.send(42).unwrap()));
        assert_eq!(rx.try_recv().unwrap(), 42);
    }

    #[test]
    fn test_thread_pool_executes_tasks() {
        let pool = thread_pool(2).unwrap();
        let (tx, rx) = mpsc::channel();
        for i in 0..4 {
            let tx = tx.clone();
            Executor::spawn(&pool, Box::new(move || tx.send(i).unwrap()));
        }
        drop(tx);
        let mut results: Vec<i32> = rx.iter().collect();
        results.sort();
        assert_eq!(results, vec![0, 1, 2, 3]);
    }
}
