// src/queue.rs
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

/// `recv` failed because the queue was shut down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceivingStopped;

struct Inner<T> {
    queue: VecDeque<T>,
    stopped: bool,
}

/// Bounded multi-producer single-consumer FIFO with shutdown.
///
/// Strict FIFO across all producers. `send` never blocks; `recv` blocks until
/// a message arrives or `stop` is called. The stop flag is sticky.
pub struct MessageQueue<T> {
    inner: Mutex<Inner<T>>,
    cv: Condvar,
    max_size: usize,
}

impl<T> MessageQueue<T> {
    pub fn new() -> Self {
        Self::with_capacity(usize::MAX)
    }

    pub fn with_capacity(max_size: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                queue: VecDeque::new(),
                stopped: false,
            }),
            cv: Condvar::new(),
            max_size,
        }
    }

    /// Enqueue and wake one waiter. Returns `false` if the queue is full.
    pub fn send(&self, msg: T) -> bool {
        let sent = {
            let mut inner = self.inner.lock().unwrap();
            if inner.queue.len() < self.max_size {
                inner.queue.push_back(msg);
                true
            } else {
                false
            }
        };
        if sent {
            self.cv.notify_one();
        }
        sent
    }

    /// Dequeue, blocking until a message is available or the queue is stopped.
    pub fn recv(&self) -> Result<T, ReceivingStopped> {
        let mut inner = self.inner.lock().unwrap();
        loop {
            if inner.stopped {
                return Err(ReceivingStopped);
            }
            if let Some(msg) = inner.queue.pop_front() {
                return Ok(msg);
            }
            inner = self.cv.wait(inner).unwrap();
        }
    }

    /// Sticky shutdown: wakes a blocked receiver and fails all further `recv`s.
    pub fn stop(&self) {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.stopped = true;
        }
        self.cv.notify_one();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for MessageQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
