//! Worker pool for per-directory fan-out
//!
//! This module provides the task execution layer used by the directory walker.
//! It knows nothing about files, archives or results; it runs closures and hands
//! back handles that are joined in the order they were submitted.
//!
//! # Architecture Responsibilities
//!
//! ## What This Module Does:
//! - **Resource Discovery**: Detects available CPU cores using `num_cpus::get()`
//! - **Resource Calculation**: Applies user configuration (thread percentage, max threads)
//! - **Execution Strategy**: Inline (sequential) or threaded execution behind one type
//! - **Ordered Join**: Every submission returns a [`TaskHandle`]; callers join them in
//!   submission order, so completion order never leaks into results
//!
//! ## What This Module Does NOT Do:
//! - **Priorities or work stealing**: The queue is a plain FIFO crossbeam channel
//! - **Cancellation**: Submitted tasks always run to completion
//! - **Lifecycle management for callers**: Pools are created, shared and shut down by
//!   whoever owns the walk
//!
//! # Nested Joins
//!
//! A directory task blocks on its children before it can fold them. With a
//! threaded pool this means a worker may wait on work queued behind it:
//!
//! ```text
//! worker-0: /root ──submit──▶ [/root/a, /root/b] ──join /root/a──┐
//!                                                                │ not started yet:
//!                                                                ▼ run /root/a here
//! ```
//!
//! [`TaskHandle::join`] therefore runs its own task inline when no worker has
//! claimed it yet, and otherwise waits for the worker that did. Every wait is
//! on a task submitted further down the same tree, so a pool of any size makes
//! progress on trees of any depth, and a thread's stack depth follows the
//! nesting depth of the tree rather than the number of siblings.
//!
//! # Example Usage
//!
//! ```rust
//! use nestwalk::parallel::WorkerPool;
//!
//! let pool = WorkerPool::parallel(4).unwrap();
//! let handles: Vec<_> = (0..8)
//!     .map(|i| pool.submit(move || i * 2).unwrap())
//!     .collect();
//! let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
//! assert_eq!(results, vec![0, 2, 4, 6, 8, 10, 12, 14]);
//! ```

pub mod core;

use serde::{Deserialize, Serialize};

pub use self::core::{JoinError, PoolError, TaskHandle, WorkerPool};

/// How directory members are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Parallel when more than one worker is available, sequential otherwise
    #[default]
    Auto,
    /// Run every task inline on the calling thread
    Sequential,
    /// Always use a worker thread pool
    Parallel,
}

/// Configuration for the worker pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelConfig {
    pub mode: ExecutionMode,
    /// Maximum number of worker threads (0 = no explicit limit)
    pub max_threads: usize,
    /// Percentage of CPU cores to use (1-100)
    pub thread_percentage: u8,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Auto,
            max_threads: 0,
            thread_percentage: 75,
        }
    }
}
