//! # Worker Pool
//!
//! Runs one execution context per worker. Each context repeatedly takes a task
//! from the shared queue and awaits `worker.process(&task)` inline before
//! taking the next one.
//!
//! ## Lifecycle
//!
//! ```text
//! Created ──start()──▶ Running ──shutdown()──▶ Stopped
//!    └─────────────shutdown()─────────────────────┘
//! ```
//!
//! Shutdown cancels every context, waits for them against one shared deadline,
//! then shuts the queue down. A task already taken finishes processing; tasks
//! still queued are discarded and counted in the [`ShutdownReport`].
//!
//! ## Execution models
//!
//! - [`ExecutionModel::Cooperative`]: each context is a tokio task.
//! - [`ExecutionModel::DedicatedThread`]: each context owns a thread from the
//!   blocking pool and drives the same loop there.

mod stats;

use std::marker::PhantomData;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use futures::FutureExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::bus::panic_message;
use crate::config::WorkerPoolConfig;
use crate::constants::pool::ABORT_JOIN_GRACE_MS;
use crate::queue::TaskQueue;
use crate::shutdown::ShutdownReport;
use crate::worker::Worker;

pub use stats::PoolStats;
use stats::{InFlightGuard, LiveWorkerGuard, PoolCounters};

/// How each worker's execution context is scheduled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionModel {
    /// Lightweight task on the shared runtime
    #[default]
    Cooperative,
    /// Dedicated blocking-pool thread per worker
    DedicatedThread,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PoolState {
    Created,
    Running,
    Stopped,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("Worker pool already started")]
    AlreadyStarted,

    #[error("Worker pool already stopped")]
    AlreadyStopped,

    #[error("Worker pool has no workers")]
    NoWorkers,

    #[error("No tokio runtime available to start the pool: {message}")]
    NoRuntime { message: String },

    #[error("Drain timed out after {timeout_ms}ms: {completed}/{submitted} tasks completed")]
    DrainTimeout {
        completed: u64,
        submitted: u64,
        timeout_ms: u64,
    },
}

pub type PoolResult<T> = Result<T, PoolError>;

const ABORT_JOIN_GRACE: Duration = Duration::from_millis(ABORT_JOIN_GRACE_MS);

struct WorkerContext {
    name: String,
    handle: JoinHandle<()>,
    model: ExecutionModel,
}

enum ContextExit {
    Stopped,
    Failed(String),
    TimedOut(String),
}

/// Fixed set of workers draining a shared [`TaskQueue`]
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::time::Duration;
/// use dispatch_core::config::WorkerPoolConfig;
/// use dispatch_core::models::OrderTask;
/// use dispatch_core::pool::WorkerPool;
/// use dispatch_core::queue::{InMemoryTaskQueue, TaskQueue};
/// use dispatch_core::worker::OrderWorker;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let queue = Arc::new(InMemoryTaskQueue::unbounded("orders"));
/// let workers = vec![Arc::new(OrderWorker::new("Worker-1"))];
/// let pool = WorkerPool::new(Arc::clone(&queue), workers, WorkerPoolConfig::default());
///
/// pool.start()?;
/// queue.submit(OrderTask::for_order("ORD-1", "CUST-1", vec!["Book".into()], 1_500)).await?;
/// pool.drain(Duration::from_secs(5)).await?;
///
/// let report = pool.shutdown().await;
/// assert!(report.is_clean());
/// # Ok(())
/// # }
/// ```
pub struct WorkerPool<T, Q, W>
where
    T: Send + Sync + 'static,
    Q: TaskQueue<T>,
    W: Worker<T>,
{
    queue: Arc<Q>,
    workers: Vec<Arc<W>>,
    config: WorkerPoolConfig,
    state: Mutex<PoolState>,
    contexts: Mutex<Vec<WorkerContext>>,
    cancel: CancellationToken,
    counters: Arc<PoolCounters>,
    _task: PhantomData<fn() -> T>,
}

impl<T, Q, W> std::fmt::Debug for WorkerPool<T, Q, W>
where
    T: Send + Sync + 'static,
    Q: TaskQueue<T>,
    W: Worker<T>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("queue", &self.queue.name())
            .field("workers", &self.workers.len())
            .field("state", &*self.state.lock())
            .field("stats", &self.counters.snapshot())
            .finish()
    }
}

impl<T, Q, W> WorkerPool<T, Q, W>
where
    T: Send + Sync + 'static,
    Q: TaskQueue<T>,
    W: Worker<T>,
{
    pub fn new(queue: Arc<Q>, workers: Vec<Arc<W>>, config: WorkerPoolConfig) -> Self {
        Self {
            queue,
            workers,
            config,
            state: Mutex::new(PoolState::Created),
            contexts: Mutex::new(Vec::new()),
            cancel: CancellationToken::new(),
            counters: Arc::new(PoolCounters::default()),
            _task: PhantomData,
        }
    }

    /// Launch one execution context per worker
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> PoolResult<()> {
        let mut state = self.state.lock();
        match *state {
            PoolState::Running => return Err(PoolError::AlreadyStarted),
            PoolState::Stopped => return Err(PoolError::AlreadyStopped),
            PoolState::Created => {}
        }
        if self.workers.is_empty() {
            return Err(PoolError::NoWorkers);
        }
        let runtime = Handle::try_current().map_err(|e| PoolError::NoRuntime {
            message: e.to_string(),
        })?;

        let mut contexts = self.contexts.lock();
        for worker in &self.workers {
            let name = worker.name().to_string();
            let context = run_worker_loop(
                Arc::clone(&self.queue),
                Arc::clone(worker),
                self.cancel.child_token(),
                Arc::clone(&self.counters),
                LiveWorkerGuard::register(&self.counters),
            );

            let handle = match self.config.execution_model {
                ExecutionModel::Cooperative => runtime.spawn(context),
                ExecutionModel::DedicatedThread => {
                    let driver = runtime.clone();
                    runtime.spawn_blocking(move || driver.block_on(context))
                }
            };
            contexts.push(WorkerContext {
                name,
                handle,
                model: self.config.execution_model,
            });
        }
        *state = PoolState::Running;

        info!(
            queue = %self.queue.name(),
            workers = self.workers.len(),
            execution_model = ?self.config.execution_model,
            "🏊 POOL: Worker pool started"
        );
        Ok(())
    }

    /// Wait until every task submitted so far has finished processing
    pub async fn drain(&self, timeout: Duration) -> PoolResult<()> {
        let deadline = Instant::now() + timeout;
        let interval = Duration::from_millis(self.config.drain_poll_interval_ms.max(1));

        loop {
            let submitted = self.queue.submitted_count();
            let completed = self.counters.completed();
            if completed >= submitted {
                debug!(completed = completed, "POOL: Drained");
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(PoolError::DrainTimeout {
                    completed,
                    submitted,
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(interval).await;
        }
    }

    /// Stop every context, then shut the queue down
    ///
    /// Contexts that miss the shared deadline are aborted (cooperative) or
    /// detached (dedicated thread) and listed in `timed_out`. Calling this
    /// again returns an empty report.
    #[instrument(skip(self), fields(queue = %self.queue.name()))]
    pub async fn shutdown(&self) -> ShutdownReport {
        let started = std::time::Instant::now();
        let mut report = ShutdownReport::new("worker_pool");

        let contexts = {
            let mut state = self.state.lock();
            if *state == PoolState::Stopped {
                return report;
            }
            *state = PoolState::Stopped;
            std::mem::take(&mut *self.contexts.lock())
        };

        info!(
            contexts = contexts.len(),
            timeout_ms = self.config.shutdown_timeout_ms,
            "🛑 POOL: Shutting down worker pool"
        );
        self.cancel.cancel();

        let deadline = Instant::now() + Duration::from_millis(self.config.shutdown_timeout_ms);
        let exits = join_all(contexts.into_iter().map(|context| async move {
            let WorkerContext {
                name,
                mut handle,
                model,
            } = context;
            match timeout_at(deadline, &mut handle).await {
                Ok(Ok(())) => ContextExit::Stopped,
                Ok(Err(e)) => {
                    error!(worker = %name, error = %e, "❌ POOL: Worker context terminated abnormally");
                    ContextExit::Failed(name)
                }
                Err(_) => {
                    warn!(worker = %name, "⚠️ POOL: Worker did not stop before the deadline");
                    handle.abort();
                    // Dedicated threads ignore abort and are left detached
                    if model == ExecutionModel::Cooperative {
                        let _ = tokio::time::timeout(ABORT_JOIN_GRACE, handle).await;
                    }
                    ContextExit::TimedOut(name)
                }
            }
        }))
        .await;

        for exit in exits {
            match exit {
                ContextExit::Stopped => report.stopped += 1,
                ContextExit::Failed(name) => report.failed.push(name),
                ContextExit::TimedOut(name) => report.timed_out.push(name),
            }
        }

        report.discarded = self.queue.shutdown().await;
        report.elapsed = started.elapsed();

        let stats = self.counters.snapshot();
        info!(
            stopped = report.stopped,
            timed_out = report.timed_out.len(),
            discarded = report.discarded,
            processed = stats.processed,
            failed = stats.failed,
            panicked = stats.panicked,
            aborted = stats.aborted,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "✅ POOL: Worker pool stopped"
        );
        report
    }

    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot()
    }

    pub fn state(&self) -> PoolState {
        *self.state.lock()
    }

    pub fn workers(&self) -> &[Arc<W>] {
        &self.workers
    }

    pub fn queue(&self) -> &Arc<Q> {
        &self.queue
    }

    pub fn config(&self) -> &WorkerPoolConfig {
        &self.config
    }
}

async fn run_worker_loop<T, Q, W>(
    queue: Arc<Q>,
    worker: Arc<W>,
    cancel: CancellationToken,
    counters: Arc<PoolCounters>,
    _live: LiveWorkerGuard,
) where
    T: Send + Sync + 'static,
    Q: TaskQueue<T>,
    W: Worker<T>,
{
    debug!(worker = %worker.name(), "🔄 POOL: Worker loop started");

    loop {
        let taken = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            taken = queue.take() => taken,
        };

        let task = match taken {
            Ok(task) => task,
            Err(e) => {
                debug!(worker = %worker.name(), reason = %e, "POOL: Queue closed, worker exiting");
                break;
            }
        };

        let in_flight = InFlightGuard::begin(&counters);
        let result = AssertUnwindSafe(worker.process(&task)).catch_unwind().await;

        match result {
            Ok(Ok(outcome)) => {
                counters.record_processed();
                debug!(worker = %worker.name(), outcome = ?outcome, "POOL: Task completed");
            }
            Ok(Err(e)) => {
                counters.record_failed();
                warn!(worker = %worker.name(), error = %e, "⚠️ POOL: Task failed");
            }
            Err(payload) => {
                counters.record_panicked();
                error!(
                    worker = %worker.name(),
                    panic = %panic_message(payload.as_ref()),
                    "❌ POOL: Worker panicked while processing task"
                );
            }
        }
        in_flight.settle();
    }

    debug!(worker = %worker.name(), "POOL: Worker loop stopped");
}
