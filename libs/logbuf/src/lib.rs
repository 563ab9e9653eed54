//! Bounded in-memory log capture.
//!
//! Host applications surface proxy diagnostics to the user from a rolling
//! window of recent messages. [`LogBuffer`] keeps that window: a
//! capacity-bounded, timestamped deque with a configurable display order.
//! It is an explicitly owned value; clone the `Arc` you wrap it in rather
//! than reaching for a global.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Default number of retained log items.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Errors from log buffer configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LogBufferError {
    /// The capacity must retain at least one item.
    #[error("log capacity must be >= 1, got {0}")]
    InvalidCapacity(usize),
}

/// One captured log message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogItem {
    /// When the message was captured.
    pub timestamp: DateTime<Utc>,
    /// The message text.
    pub message: String,
}

#[derive(Debug)]
struct Window {
    items: VecDeque<LogItem>,
    capacity: usize,
    /// When set, the newest item sits at the front instead of the back.
    reverse: bool,
}

/// A thread-safe rolling window of log messages.
#[derive(Debug)]
pub struct LogBuffer {
    inner: Mutex<Window>,
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl LogBuffer {
    /// Creates a buffer with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Window {
                items: VecDeque::new(),
                capacity: DEFAULT_CAPACITY,
                reverse: false,
            }),
        }
    }

    /// Appends a message, evicting the oldest item once over capacity.
    pub fn push(&self, message: impl Into<String>) {
        let item = LogItem {
            timestamp: Utc::now(),
            message: message.into(),
        };
        let mut window = self.lock();
        if window.reverse {
            window.items.push_front(item);
        } else {
            window.items.push_back(item);
        }
        Self::trim(&mut window);
    }

    /// Switches between oldest-first and newest-first storage, reversing
    /// the retained items once per change.
    pub fn set_reverse_order(&self, reverse: bool) {
        let mut window = self.lock();
        if window.reverse == reverse {
            return;
        }
        window.reverse = reverse;
        let reversed: VecDeque<LogItem> = window.items.drain(..).rev().collect();
        window.items = reversed;
    }

    /// Changes the retention capacity, trimming the oldest items if the
    /// buffer already holds more.
    pub fn set_capacity(&self, capacity: usize) -> Result<(), LogBufferError> {
        if capacity < 1 {
            return Err(LogBufferError::InvalidCapacity(capacity));
        }
        let mut window = self.lock();
        window.capacity = capacity;
        Self::trim(&mut window);
        Ok(())
    }

    /// A copy of the retained items in their current storage order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<LogItem> {
        self.lock().items.iter().cloned().collect()
    }

    /// Drops all retained items.
    pub fn clear(&self) {
        self.lock().items.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// Evicts from the oldest end: the back when newest-first, the front
    /// otherwise.
    fn trim(window: &mut Window) {
        while window.items.len() > window.capacity {
            if window.reverse {
                window.items.pop_back();
            } else {
                window.items.pop_front();
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Window> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
