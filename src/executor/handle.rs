//! Caller-facing future for a single submission.

use super::task::{TaskId, TaskShared};
use crate::error::{Error, Result};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Pairs with one submitted task. Lets the submitter wait for completion,
/// read the outcome, or cancel the task before a worker claims it.
///
/// The outcome is written exactly once by the executing worker (or the
/// cancellation path) and can be read any number of times.
pub struct JoinHandle<T> {
    inner: Arc<TaskShared<T>>,
}

impl<T> JoinHandle<T> {
    pub(crate) fn new(inner: Arc<TaskShared<T>>) -> Self {
        Self { inner }
    }

    pub fn id(&self) -> TaskId {
        self.inner.id()
    }

    /// Non-blocking poll for a terminal state.
    pub fn is_done(&self) -> bool {
        self.inner.is_done()
    }

    /// Cancel the task if it has not started executing.
    ///
    /// Returns true only when the task was still pending; a running or
    /// terminal task is unaffected and keeps its eventual outcome.
    pub fn cancel(&self) -> bool {
        self.inner.abort(Error::Cancelled)
    }

    /// Block until the task reaches a terminal state, without reading it.
    pub fn wait(&self) {
        self.inner.wait()
    }

    /// Block until terminal and move the outcome out of the handle.
    ///
    /// Unlike [`get`](Self::get) this does not require `T: Clone`, so it is
    /// the way to retrieve results that cannot or should not be copied.
    pub fn into_result(self) -> Result<T> {
        self.inner.wait();
        self.inner.take_outcome()
    }
}

impl<T: Clone> JoinHandle<T> {
    /// Block until terminal and return the outcome. Repeated calls return
    /// the identical result.
    pub fn get(&self) -> Result<T> {
        self.inner.wait();
        self.inner.outcome()
    }

    /// Like [`get`](Self::get) but gives up after `timeout` with
    /// `Err(TimedOut)`. The task keeps running; only the wait stops.
    pub fn get_timeout(&self, timeout: Duration) -> Result<T> {
        if self.inner.wait_timeout(timeout) {
            self.inner.outcome()
        } else {
            Err(Error::TimedOut)
        }
    }
}

impl<T> fmt::Debug for JoinHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinHandle")
            .field("id", &self.id())
            .field("done", &self.is_done())
            .finish()
    }
}
