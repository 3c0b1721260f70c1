//! Zero-balance signal queue
//!
//! The recorder pushes one signal per zero crossing it commits; the milestone
//! detector drains them on its synchronous path. Signals are a fast path only:
//! the periodic scan finds any crossing whose signal was lost.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::Mutex;

/// A debt crossed to zero
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZeroBalanceSignal {
    pub debt_id: String,
    pub user_id: String,
    pub reached_zero_at: DateTime<Utc>,
}

/// FIFO of pending zero-balance signals
#[derive(Debug, Default)]
pub struct ZeroBalanceSignals {
    queue: Mutex<VecDeque<ZeroBalanceSignal>>,
}

impl ZeroBalanceSignals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, signal: ZeroBalanceSignal) {
        self.queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(signal);
    }

    /// Take every pending signal, oldest first
    pub fn drain(&self) -> Vec<ZeroBalanceSignal> {
        self.queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain(..)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
