//! Bounded FIFO hand-off between submitters and workers.
//!
//! One mutex guards the buffer and the closed flag; two condvars signal
//! "not empty" (poppers) and "not full" (pushers). Every wait re-checks its
//! predicate under the lock, so spurious wakes and close races are benign.

use crate::error::{Error, Result};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::fmt;

struct Inner<T> {
    items: VecDeque<T>,
    closed: bool,
}

pub struct TaskQueue<T> {
    inner: Mutex<Inner<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: Option<usize>,
}

impl<T> TaskQueue<T> {
    /// `capacity = None` builds an unbounded queue; `push` then never blocks.
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                items: VecDeque::new(),
                closed: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
        }
    }

    /// Append to the tail, blocking while the queue is at capacity.
    ///
    /// Fails with `QueueClosed` as soon as the queue is closed, including
    /// while blocked waiting for a slot.
    pub fn push(&self, item: T) -> Result<()> {
        let mut inner = self.inner.lock();
        loop {
            if inner.closed {
                return Err(Error::QueueClosed);
            }
            match self.capacity {
                Some(cap) if inner.items.len() >= cap => self.not_full.wait(&mut inner),
                _ => break,
            }
        }
        inner.items.push_back(item);
        drop(inner);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Non-blocking variant: `QueueFull` instead of waiting for a slot.
    pub fn try_push(&self, item: T) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(Error::QueueClosed);
        }
        if let Some(cap) = self.capacity {
            if inner.items.len() >= cap {
                return Err(Error::QueueFull);
            }
        }
        inner.items.push_back(item);
        drop(inner);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Remove the head, blocking while the queue is empty and open.
    ///
    /// Returns `None` once the queue is closed and fully drained; that is the
    /// workers' exit signal, not an error.
    pub fn pop(&self) -> Option<T> {
        let mut inner = self.inner.lock();
        loop {
            if let Some(item) = inner.items.pop_front() {
                drop(inner);
                if self.capacity.is_some() {
                    self.not_full.notify_one();
                }
                return Some(item);
            }
            if inner.closed {
                return None;
            }
            self.not_empty.wait(&mut inner);
        }
    }

    /// Idempotent. Wakes every blocked pusher and popper so they observe the
    /// closed state.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.closed = true;
        drop(inner);
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    /// Remove and return the entire backlog. Used by forced shutdown to
    /// discard not-yet-claimed tasks.
    pub fn drain(&self) -> Vec<T> {
        let mut inner = self.inner.lock();
        let backlog: Vec<T> = inner.items.drain(..).collect();
        drop(inner);
        self.not_full.notify_all();
        backlog
    }

    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}

impl<T> fmt::Debug for TaskQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("TaskQueue")
            .field("len", &inner.items.len())
            .field("closed", &inner.closed)
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_fifo_order() {
        let queue = TaskQueue::new(None);
        for i in 0..10 {
            queue.push(i).unwrap();
        }
        for i in 0..10 {
            assert_eq!(queue.pop(), Some(i));
        }
    }

    #[test]
    fn test_push_after_close_fails() {
        let queue = TaskQueue::new(None);
        queue.push(1).unwrap();
        queue.close();
        assert_eq!(queue.push(2), Err(Error::QueueClosed));
    }

    #[test]
    fn test_pop_drains_after_close() {
        let queue = TaskQueue::new(None);
        queue.push(1).unwrap();
        queue.push(2).unwrap();
        queue.close();

        assert_eq!(queue.pop(), Some(1));
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.pop(), None);
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_close_idempotent() {
        let queue: TaskQueue<i32> = TaskQueue::new(None);
        queue.close();
        queue.close();
        assert!(queue.is_closed());
    }

    #[test]
    fn test_try_push_full() {
        let queue = TaskQueue::new(Some(1));
        queue.try_push(1).unwrap();
        assert_eq!(queue.try_push(2), Err(Error::QueueFull));
        assert_eq!(queue.pop(), Some(1));
        queue.try_push(2).unwrap();
    }

    #[test]
    fn test_bounded_push_blocks_until_slot_frees() {
        let queue = Arc::new(TaskQueue::new(Some(1)));
        queue.push(1).unwrap();

        let producer = {
            let queue = queue.clone();
            thread::spawn(move || queue.push(2))
        };

        // Producer should still be parked on the full queue.
        thread::sleep(Duration::from_millis(50));
        assert_eq!(queue.len(), 1);

        assert_eq!(queue.pop(), Some(1));
        producer.join().unwrap().unwrap();
        assert_eq!(queue.pop(), Some(2));
    }

    #[test]
    fn test_close_wakes_blocked_popper() {
        let queue: Arc<TaskQueue<i32>> = Arc::new(TaskQueue::new(None));

        let popper = {
            let queue = queue.clone();
            thread::spawn(move || queue.pop())
        };

        thread::sleep(Duration::from_millis(50));
        queue.close();
        assert_eq!(popper.join().unwrap(), None);
    }

    #[test]
    fn test_close_wakes_blocked_pusher() {
        let queue = Arc::new(TaskQueue::new(Some(1)));
        queue.push(1).unwrap();

        let pusher = {
            let queue = queue.clone();
            thread::spawn(move || queue.push(2))
        };

        thread::sleep(Duration::from_millis(50));
        queue.close();
        assert_eq!(pusher.join().unwrap(), Err(Error::QueueClosed));
    }

    #[test]
    fn test_drain_empties_backlog() {
        let queue = TaskQueue::new(None);
        for i in 0..5 {
            queue.push(i).unwrap();
        }
        queue.close();

        assert_eq!(queue.drain(), vec![0, 1, 2, 3, 4]);
        assert!(queue.is_empty());
        assert_eq!(queue.pop(), None);
    }
}
