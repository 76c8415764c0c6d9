use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use crossbeam::channel::{Receiver, Sender, bounded, unbounded};

use super::{ExecutionMode, ParallelConfig};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Worker stacks hold one frame chain per nesting level of the walk.
pub const WORKER_STACK_SIZE: usize = 8 * 1024 * 1024;

/// A queued job, run by whichever of a worker or the joining thread claims
/// it first. The loser finds the slot empty.
struct TaskSlot(Mutex<Option<Job>>);

impl TaskSlot {
    fn new(job: Job) -> Arc<Self> {
        Arc::new(Self(Mutex::new(Some(job))))
    }

    fn claim(&self) -> Option<Job> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("worker pool has been shut down")]
    Shutdown,

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum JoinError {
    #[error("task panicked: {0}")]
    Panicked(String),

    #[error("task was dropped before it produced a result")]
    Disconnected,
}

/// Task executor shared by every level of a walk.
///
/// `Sequential` runs each task inline inside `submit`; `Parallel` queues it on
/// a fixed set of worker threads. Cloning is cheap and clones share workers.
#[derive(Clone)]
pub enum WorkerPool {
    Sequential,
    Parallel(Arc<ThreadPool>),
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerPool::Sequential => write!(f, "WorkerPool::Sequential"),
            WorkerPool::Parallel(pool) => write!(f, "WorkerPool::Parallel({} workers)", pool.size),
        }
    }
}

impl WorkerPool {
    pub fn sequential() -> Self {
        WorkerPool::Sequential
    }

    pub fn parallel(workers: usize) -> Result<Self, PoolError> {
        Ok(WorkerPool::Parallel(Arc::new(ThreadPool::new(workers)?)))
    }

    /// Build the pool described by `config`.
    ///
    /// `Auto` only starts threads when more than one worker is available.
    pub fn from_config(config: &ParallelConfig) -> Result<Self, PoolError> {
        let workers = Self::calculate_optimal_workers(config.max_threads, config.thread_percentage);
        match config.mode {
            ExecutionMode::Sequential => Ok(Self::sequential()),
            ExecutionMode::Parallel => Self::parallel(workers),
            ExecutionMode::Auto if workers > 1 => Self::parallel(workers),
            ExecutionMode::Auto => Ok(Self::sequential()),
        }
    }

    /// Calculate the worker count from system resources and user limits.
    pub fn calculate_optimal_workers(max_threads: usize, thread_percentage: u8) -> usize {
        let cpu_cores = num_cpus::get();
        let percentage = thread_percentage.clamp(1, 100) as usize;
        let by_percentage = std::cmp::max(1, (cpu_cores * percentage) / 100);

        if max_threads > 0 {
            std::cmp::min(max_threads, by_percentage)
        } else {
            by_percentage
        }
    }

    pub fn workers(&self) -> usize {
        match self {
            WorkerPool::Sequential => 1,
            WorkerPool::Parallel(pool) => pool.size,
        }
    }

    pub fn is_parallel(&self) -> bool {
        matches!(self, WorkerPool::Parallel(_))
    }

    /// Schedule `task` and return a handle to its eventual result.
    pub fn submit<T, F>(&self, task: F) -> Result<TaskHandle<T>, PoolError>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        match self {
            WorkerPool::Sequential => {
                let outcome = panic::catch_unwind(AssertUnwindSafe(task));
                Ok(TaskHandle {
                    state: HandleState::Ready(outcome),
                })
            }
            WorkerPool::Parallel(pool) => pool.submit(task),
        }
    }

    /// Stop accepting tasks. Queued tasks still run; worker threads exit
    /// once the queue is drained. A no-op for the sequential pool.
    pub fn shutdown(&self) {
        if let WorkerPool::Parallel(pool) = self {
            pool.shutdown();
        }
    }
}

/// Fixed-size pool of worker threads fed by a crossbeam channel.
pub struct ThreadPool {
    sender: Mutex<Option<Sender<Arc<TaskSlot>>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    size: usize,
}

impl ThreadPool {
    pub fn new(size: usize) -> Result<Self, PoolError> {
        let size = size.max(1);
        let (sender, receiver) = unbounded::<Arc<TaskSlot>>();

        let mut workers = Vec::with_capacity(size);
        for worker_id in 0..size {
            let jobs = receiver.clone();
            let handle = thread::Builder::new()
                .name(format!("nestwalk-worker-{worker_id}"))
                .stack_size(WORKER_STACK_SIZE)
                .spawn(move || {
                    while let Ok(slot) = jobs.recv() {
                        if let Some(job) = slot.claim() {
                            job();
                        }
                    }
                    tracing::trace!("worker-{} exiting", worker_id);
                })?;
            workers.push(handle);
        }
        tracing::debug!("Started worker pool with {} threads", size);

        Ok(Self {
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
            size,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn submit<T, F>(&self, task: F) -> Result<TaskHandle<T>, PoolError>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (result_tx, result_rx) = bounded(1);
        let slot = TaskSlot::new(Box::new(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(task));
            // The handle may have been dropped without joining.
            let _ = result_tx.send(outcome);
        }));

        let guard = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        let sender = guard.as_ref().ok_or(PoolError::Shutdown)?;
        sender.send(slot.clone()).map_err(|_| PoolError::Shutdown)?;

        Ok(TaskHandle {
            state: HandleState::Pending {
                result: result_rx,
                slot,
            },
        })
    }

    fn shutdown(&self) {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if sender.is_none() {
            return;
        }
        drop(sender);

        let current = thread::current().id();
        let workers = std::mem::take(
            &mut *self.workers.lock().unwrap_or_else(PoisonError::into_inner),
        );
        for worker in workers {
            // A worker cannot wait for itself.
            if worker.thread().id() == current {
                continue;
            }
            if worker.join().is_err() {
                tracing::warn!("worker thread terminated abnormally");
            }
        }
        tracing::debug!("Worker pool shut down");
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        // Detach: workers exit on their own once the channel disconnects.
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

enum HandleState<T> {
    Ready(thread::Result<T>),
    Pending {
        result: Receiver<thread::Result<T>>,
        slot: Arc<TaskSlot>,
    },
}

/// Result of a submitted task, retrieved with [`TaskHandle::join`].
pub struct TaskHandle<T> {
    state: HandleState<T>,
}

impl<T> TaskHandle<T> {
    /// Wait for the task.
    ///
    /// A task no worker has picked up yet is run on the calling thread. The
    /// caller never runs any other queued task, so a thread's stack only
    /// grows with the nesting depth of the tasks it waits for. A panic inside
    /// the task is returned as [`JoinError::Panicked`].
    pub fn join(self) -> Result<T, JoinError> {
        match self.state {
            HandleState::Ready(outcome) => outcome.map_err(panic_message),
            HandleState::Pending { result, slot } => {
                if let Some(job) = slot.claim() {
                    job();
                }
                match result.recv() {
                    Ok(outcome) => outcome.map_err(panic_message),
                    Err(_) => Err(JoinError::Disconnected),
                }
            }
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> JoinError {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    };
    JoinError::Panicked(message)
}
