use super::handle::JoinHandle;
use super::task::{Job, TaskCell, TaskShared};
use super::worker::{Worker, WorkerId, WorkerState};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::queue::TaskQueue;
use crate::stats::{PoolStats, StatsSnapshot};
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle as ThreadHandle};
use std::time::{Duration, Instant};

/// Pool lifecycle. Transitions are monotonic:
/// `Running -> Draining -> Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    /// Accepting submissions.
    Running,
    /// Queue closed; queued and in-flight tasks still finish.
    Draining,
    /// All workers have exited. Terminal.
    Stopped,
}

const RUNNING: u8 = 0;
const DRAINING: u8 = 1;
const STOPPED: u8 = 2;

struct Shared {
    lifecycle: AtomicU8,
    live_workers: Mutex<usize>,
    all_stopped: Condvar,
}

impl Shared {
    fn state(&self) -> PoolState {
        match self.lifecycle.load(Ordering::Acquire) {
            RUNNING => PoolState::Running,
            DRAINING => PoolState::Draining,
            _ => PoolState::Stopped,
        }
    }

    // Running -> Draining. False when some earlier call already advanced.
    fn begin_draining(&self) -> bool {
        self.lifecycle
            .compare_exchange(RUNNING, DRAINING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

struct WorkerHandle {
    id: WorkerId,
    thread: Option<ThreadHandle<()>>,
    state: Arc<WorkerState>,
}

/// Fixed-size worker pool over a FIFO task queue.
///
/// Owns N long-lived worker threads and the queue between them and
/// submitters. Each [`submit`](Pool::submit) returns a [`JoinHandle`] that
/// resolves to exactly one outcome: the task's value, a panic captured as
/// [`Error::TaskPanicked`], or [`Error::Cancelled`].
pub struct Pool {
    queue: Arc<TaskQueue<TaskCell>>,
    workers: Vec<WorkerHandle>,
    shared: Arc<Shared>,
    stats: Arc<PoolStats>,
    num_threads: usize,
}

impl Pool {
    /// Build a pool from a validated [`Config`], spawning all workers.
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;

        let num_threads = config.worker_count();
        let queue: Arc<TaskQueue<TaskCell>> = Arc::new(TaskQueue::new(config.queue_capacity));
        let stats = Arc::new(PoolStats::new());
        let shared = Arc::new(Shared {
            lifecycle: AtomicU8::new(RUNNING),
            live_workers: Mutex::new(num_threads),
            all_stopped: Condvar::new(),
        });

        let mut workers = Vec::with_capacity(num_threads);

        for id in 0..num_threads {
            let worker = Worker::new(id);
            let worker_state = worker.state.clone();
            let queue_clone = queue.clone();
            let stats_clone = stats.clone();
            let shared_clone = shared.clone();
            let name = format!("{}-{}", config.thread_name_prefix, id);

            let mut builder = thread::Builder::new().name(name);
            if let Some(stack_size) = config.stack_size {
                builder = builder.stack_size(stack_size);
            }

            let spawned = builder.spawn(move || {
                worker.run(queue_clone, stats_clone);

                let mut live = shared_clone.live_workers.lock();
                *live -= 1;
                if *live == 0 {
                    shared_clone.lifecycle.store(STOPPED, Ordering::Release);
                }
                drop(live);
                shared_clone.all_stopped.notify_all();
            });

            let thread = match spawned {
                Ok(thread) => thread,
                Err(e) => {
                    // Unwind: close the queue so already-spawned workers
                    // exit, and forget the workers that never started.
                    queue.close();
                    *shared.live_workers.lock() -= num_threads - id;
                    return Err(Error::executor(format!("spawn failed: {}", e)));
                }
            };

            workers.push(WorkerHandle {
                id,
                thread: Some(thread),
                state: worker_state,
            });
        }

        Ok(Self {
            queue,
            workers,
            shared,
            stats,
            num_threads,
        })
    }

    /// Convenience constructor matching `(worker_count, queue_capacity)`,
    /// where capacity 0 means unbounded.
    pub fn new_with(worker_count: usize, queue_capacity: usize) -> Result<Self> {
        let mut builder = Config::builder().worker_threads(worker_count);
        if queue_capacity > 0 {
            builder = builder.queue_capacity(queue_capacity);
        }
        Self::new(&builder.build()?)
    }

    /// Submit a task for execution, blocking while a bounded queue is full.
    ///
    /// Fails with [`Error::PoolClosed`] once a shutdown has begun. When a
    /// shutdown races with the enqueue itself, the submission is admitted
    /// nowhere but still yields a handle whose outcome is `PoolClosed`, so
    /// every returned handle resolves.
    pub fn submit<T, F>(&self, f: F) -> Result<JoinHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        if self.shared.state() != PoolState::Running {
            return Err(Error::PoolClosed);
        }

        let task = Arc::new(TaskShared::new());
        let cell: TaskCell = Box::new(Job::new(task.clone(), f));

        match self.queue.push(cell) {
            Ok(()) => Ok(JoinHandle::new(task)),
            Err(Error::QueueClosed) => {
                // Lost the race against close(). The cell was dropped
                // unexecuted; resolve the handle instead of hanging it.
                task.abort(Error::PoolClosed);
                Ok(JoinHandle::new(task))
            }
            Err(e) => Err(e),
        }
    }

    /// Non-blocking submit: fails with [`Error::QueueFull`] instead of
    /// waiting when a bounded queue is at capacity. The task is dropped
    /// without running in that case.
    pub fn try_submit<T, F>(&self, f: F) -> Result<JoinHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        if self.shared.state() != PoolState::Running {
            return Err(Error::PoolClosed);
        }

        let task = Arc::new(TaskShared::new());
        let cell: TaskCell = Box::new(Job::new(task.clone(), f));

        match self.queue.try_push(cell) {
            Ok(()) => Ok(JoinHandle::new(task)),
            Err(Error::QueueClosed) => {
                task.abort(Error::PoolClosed);
                Ok(JoinHandle::new(task))
            }
            Err(e) => Err(e),
        }
    }

    /// Graceful shutdown: stop admitting, let queued tasks drain.
    ///
    /// Non-blocking and idempotent; pair with
    /// [`await_termination`](Pool::await_termination) to wait for workers.
    pub fn shutdown(&self) {
        if self.shared.begin_draining() {
            tracing::debug!("pool draining");
            self.queue.close();
        }
    }

    /// Forced shutdown: additionally discard the not-yet-claimed backlog,
    /// resolving each discarded task's handle as [`Error::Cancelled`].
    ///
    /// Tasks already running are never interrupted; they finish normally.
    pub fn shutdown_now(&self) {
        self.shutdown();

        let backlog = self.queue.drain();
        if !backlog.is_empty() {
            tracing::debug!(discarded = backlog.len(), "discarding queued tasks");
        }
        for cell in backlog {
            if cell.cancel() {
                self.stats.record_cancelled();
            }
        }
    }

    /// Block until every worker has exited, or until `timeout` elapses.
    ///
    /// `Err(TimedOut)` leaves the pool untouched; workers keep draining.
    /// Returns `Ok(())` once the pool is [`PoolState::Stopped`].
    pub fn await_termination(&self, timeout: Option<Duration>) -> Result<()> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut live = self.shared.live_workers.lock();

        while *live > 0 {
            match deadline {
                Some(deadline) => {
                    if self
                        .shared
                        .all_stopped
                        .wait_until(&mut live, deadline)
                        .timed_out()
                        && *live > 0
                    {
                        return Err(Error::TimedOut);
                    }
                }
                None => self.shared.all_stopped.wait(&mut live),
            }
        }

        Ok(())
    }

    pub fn state(&self) -> PoolState {
        self.shared.state()
    }

    /// Tasks enqueued but not yet claimed by a worker.
    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    /// Workers currently executing a task.
    pub fn active_worker_count(&self) -> usize {
        self.stats.active_count()
    }

    pub fn completed_count(&self) -> u64 {
        self.stats.completed_count()
    }

    pub fn failed_count(&self) -> u64 {
        self.stats.failed_count()
    }

    pub fn cancelled_count(&self) -> u64 {
        self.stats.cancelled_count()
    }

    pub fn worker_threads(&self) -> usize {
        self.num_threads
    }

    /// Tasks executed per worker, indexed by worker id.
    pub fn worker_task_counts(&self) -> Vec<u64> {
        self.workers
            .iter()
            .map(|w| w.state.tasks_executed.load(Ordering::Relaxed))
            .collect()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        self.shutdown();

        for worker in &mut self.workers {
            if let Some(thread) = worker.thread.take() {
                if thread.join().is_err() {
                    tracing::error!(worker = worker.id, "worker thread panicked");
                }
            }
        }
    }
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("state", &self.state())
            .field("workers", &self.num_threads)
            .field("pending", &self.pending_count())
            .field("completed", &self.completed_count())
            .field("failed", &self.failed_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_and_get() {
        let pool = Pool::new_with(2, 0).unwrap();
        let handle = pool.submit(|| 2 + 2).unwrap();
        assert_eq!(handle.get(), Ok(4));
    }

    #[test]
    fn test_invalid_worker_count() {
        assert!(matches!(Pool::new_with(0, 0), Err(Error::Config(_))));
    }

    #[test]
    fn test_submit_after_shutdown_rejected() {
        let pool = Pool::new_with(1, 0).unwrap();
        pool.shutdown();
        assert_eq!(pool.submit(|| 1).err(), Some(Error::PoolClosed));
    }

    #[test]
    fn test_shutdown_idempotent() {
        let pool = Pool::new_with(1, 0).unwrap();
        pool.shutdown();
        pool.shutdown();
        pool.shutdown_now();
        pool.await_termination(None).unwrap();
        assert_eq!(pool.state(), PoolState::Stopped);
    }

    #[test]
    fn test_drop_joins_workers() {
        let handle;
        {
            let pool = Pool::new_with(1, 0).unwrap();
            handle = pool.submit(|| 21 * 2).unwrap();
        }
        // Pool dropped: graceful drain, so the task ran.
        assert_eq!(handle.get(), Ok(42));
    }
}
