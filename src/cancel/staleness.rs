//! Latest-wins run tracking for callers that apply results to shared state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

/// Identifier of one logical run for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(u64);

/// Tracks the newest run per key. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct RunTracker {
    latest: Arc<DashMap<String, RunId>>,
    next: Arc<AtomicU64>,
}

impl RunTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new run for `key`; every earlier run for it becomes stale.
    pub fn begin(&self, key: &str) -> RunId {
        let id = RunId(self.next.fetch_add(1, Ordering::Relaxed) + 1);
        self.latest.insert(key.to_string(), id);
        id
    }

    pub fn is_latest(&self, key: &str, id: RunId) -> bool {
        self.latest.get(key).map(|r| *r.value() == id).unwrap_or(false)
    }

    pub fn is_stale(&self, key: &str, id: RunId) -> bool {
        !self.is_latest(key, id)
    }
}
