//! Task representation: type-erased work cells and their shared state.

use crate::error::{Error, Result};
use parking_lot::{Condvar, Mutex};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

static TASK_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a submitted task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

impl TaskId {
    fn next() -> Self {
        TaskId(TASK_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Pending,
    Running,
    Done,
}

struct State<T> {
    phase: Phase,
    outcome: Option<Result<T>>,
}

/// State shared between one `JoinHandle` and the worker that executes the
/// task. The outcome slot is written exactly once; the phase transitions are
/// `Pending -> Running -> Done` (execution) or `Pending -> Done`
/// (cancellation or admission failure).
pub(crate) struct TaskShared<T> {
    id: TaskId,
    state: Mutex<State<T>>,
    done: Condvar,
}

impl<T> TaskShared<T> {
    pub fn new() -> Self {
        Self {
            id: TaskId::next(),
            state: Mutex::new(State {
                phase: Phase::Pending,
                outcome: None,
            }),
            done: Condvar::new(),
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Pending -> Running. Returns false when the task was already
    /// cancelled, in which case the worker must not execute it.
    fn claim(&self) -> bool {
        let mut state = self.state.lock();
        if state.phase == Phase::Pending {
            state.phase = Phase::Running;
            true
        } else {
            false
        }
    }

    /// Pending -> Done with the given error. No effect once the task is
    /// claimed or terminal; returns whether the transition happened.
    pub fn abort(&self, error: Error) -> bool {
        let mut state = self.state.lock();
        if state.phase != Phase::Pending {
            return false;
        }
        state.phase = Phase::Done;
        state.outcome = Some(Err(error));
        drop(state);
        self.done.notify_all();
        true
    }

    /// Running -> Done. The single terminal write of an executed task.
    fn finish(&self, outcome: Result<T>) {
        let mut state = self.state.lock();
        if state.outcome.is_some() {
            // Double terminal write is a defect in the executor, never
            // recovered. Keep the first outcome.
            debug_assert!(false, "task outcome written twice");
            tracing::error!(task = ?self.id, "task outcome written twice, keeping first");
            return;
        }
        state.phase = Phase::Done;
        state.outcome = Some(outcome);
        drop(state);
        self.done.notify_all();
    }

    pub fn is_done(&self) -> bool {
        self.state.lock().phase == Phase::Done
    }

    pub fn wait(&self) {
        let mut state = self.state.lock();
        while state.phase != Phase::Done {
            self.done.wait(&mut state);
        }
    }

    /// Returns false if the deadline passed before the task became terminal.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while state.phase != Phase::Done {
            if self.done.wait_until(&mut state, deadline).timed_out() {
                return state.phase == Phase::Done;
            }
        }
        true
    }
}

impl<T> TaskShared<T> {
    /// Move the terminal outcome out of the slot. Callers wait for `Done`
    /// first; at most one caller may take it.
    pub fn take_outcome(&self) -> Result<T> {
        let mut state = self.state.lock();
        state
            .outcome
            .take()
            .expect("outcome taken before task reached a terminal state")
    }

    /// Whether the task ended cancelled (as opposed to completed or failed).
    pub fn is_cancelled(&self) -> bool {
        matches!(self.state.lock().outcome, Some(Err(Error::Cancelled)))
    }
}

impl<T: Clone> TaskShared<T> {
    /// Clone out the terminal outcome. Callers wait for `Done` first.
    pub fn outcome(&self) -> Result<T> {
        let state = self.state.lock();
        state
            .outcome
            .clone()
            .expect("outcome read before task reached a terminal state")
    }
}

/// How a dequeued cell resolved, for the worker's bookkeeping.
pub(crate) enum RunOutcome {
    Completed,
    Panicked,
    /// Cancelled before the worker claimed it; nothing ran.
    Skipped,
}

/// Type-erased task cell held by the queue. Ownership flows queue -> worker
/// (`run`) or queue -> shutdown path (`cancel`).
pub(crate) trait Runnable: Send {
    fn run(self: Box<Self>) -> RunOutcome;

    /// Discard without executing. Returns whether the task ended cancelled,
    /// whether by this call or by an earlier `JoinHandle::cancel`; a cell
    /// is disposed of exactly once, so the caller counts on `true`.
    fn cancel(self: Box<Self>) -> bool;

    fn id(&self) -> TaskId;
}

pub(crate) type TaskCell = Box<dyn Runnable>;

pub(crate) struct Job<T, F> {
    shared: Arc<TaskShared<T>>,
    func: F,
}

impl<T, F> Job<T, F> {
    pub fn new(shared: Arc<TaskShared<T>>, func: F) -> Self {
        Self { shared, func }
    }
}

impl<T, F> Runnable for Job<T, F>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    fn run(self: Box<Self>) -> RunOutcome {
        let Job { shared, func } = *self;

        if !shared.claim() {
            return RunOutcome::Skipped;
        }

        match catch_unwind(AssertUnwindSafe(func)) {
            Ok(value) => {
                shared.finish(Ok(value));
                RunOutcome::Completed
            }
            Err(payload) => {
                let message = panic_message(payload);
                tracing::error!(task = ?shared.id(), %message, "task panicked");
                shared.finish(Err(Error::TaskPanicked(message)));
                RunOutcome::Panicked
            }
        }
    }

    fn cancel(self: Box<Self>) -> bool {
        self.shared.abort(Error::Cancelled);
        self.shared.is_cancelled()
    }

    fn id(&self) -> TaskId {
        self.shared.id()
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
