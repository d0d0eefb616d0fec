// worker thread stuff

use super::task::{RunOutcome, TaskCell};
use crate::queue::TaskQueue;
use crate::stats::PoolStats;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

pub type WorkerId = usize;

// per-worker counters, aggregated into pool stats snapshots
pub(crate) struct WorkerState {
    pub tasks_executed: AtomicU64,
}

impl WorkerState {
    fn new() -> Self {
        Self {
            tasks_executed: AtomicU64::new(0),
        }
    }
}

pub(crate) struct Worker {
    pub id: WorkerId,
    pub state: Arc<WorkerState>,
}

impl Worker {
    pub fn new(id: WorkerId) -> Self {
        Self {
            id,
            state: Arc::new(WorkerState::new()),
        }
    }

    // main loop: drain the queue until it is closed and empty. A task's
    // panic is captured inside the cell; nothing a task does ends this loop.
    pub fn run(&self, queue: Arc<TaskQueue<TaskCell>>, stats: Arc<PoolStats>) {
        while let Some(cell) = queue.pop() {
            stats.task_started();
            let start = Instant::now();

            match cell.run() {
                RunOutcome::Completed => {
                    self.state.tasks_executed.fetch_add(1, Ordering::Relaxed);
                    stats.record_completed(start.elapsed());
                }
                RunOutcome::Panicked => {
                    self.state.tasks_executed.fetch_add(1, Ordering::Relaxed);
                    stats.record_failed(start.elapsed());
                }
                RunOutcome::Skipped => stats.record_cancelled(),
            }

            stats.task_finished();
        }

        tracing::debug!(worker = self.id, "worker exiting");
    }
}
