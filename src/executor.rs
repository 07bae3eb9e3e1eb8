//! Execution capability for detached work (refresh, async loads, removal
//! notifications).
//!
//! Submitted tasks run in no particular order relative to each other. The
//! cache never waits for a task it submits.
//!
//! | Executor               | Runs tasks on                        |
//! |------------------------|--------------------------------------|
//! | [`RayonExecutor`]      | rayon's global pool (default)        |
//! | [`ThreadExecutor`]     | a fresh detached thread per task     |
//! | [`SameThreadExecutor`] | the submitting thread, inline        |
//! | any `Fn(Task)`         | wherever the closure sends it        |

use std::thread;

/// A unit of detached work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Accepts zero-argument work for asynchronous execution.
pub trait Executor: Send + Sync {
    fn execute(&self, task: Task);
}

impl<F> Executor for F
where
    F: Fn(Task) + Send + Sync,
{
    fn execute(&self, task: Task) {
        self(task)
    }
}

/// Runs tasks on rayon's global thread pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct RayonExecutor;

impl Executor for RayonExecutor {
    fn execute(&self, task: Task) {
        rayon::spawn(task);
    }
}

/// Spawns a named, detached thread per task.
#[derive(Debug, Clone)]
pub struct ThreadExecutor {
    name: String,
}

impl ThreadExecutor {
    /// Executor whose worker threads are named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for ThreadExecutor {
    fn default() -> Self {
        Self::new("loadkit-worker")
    }
}

impl Executor for ThreadExecutor {
    fn execute(&self, task: Task) {
        let spawned = thread::Builder::new().name(self.name.clone()).spawn(task);
        if let Err(err) = spawned {
            tracing::error!(error = %err, thread = %self.name, "failed to spawn cache worker thread");
        }
    }
}

/// Runs each task immediately on the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct SameThreadExecutor;

impl Executor for SameThreadExecutor {
    fn execute(&self, task: Task) {
        task()
    }
}
