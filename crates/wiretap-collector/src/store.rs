//! Bounded in-memory capture store.

use crate::models::{ListQuery, StoredCapture};
use crate::{CollectorError, CollectorResult};
use parking_lot::RwLock;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tracing::debug;

/// Default number of captures retained.
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// Captures in arrival order plus the set of their ids.
#[derive(Default)]
struct Entries {
    order: VecDeque<StoredCapture>,
    ids: HashSet<String>,
}

/// Captures in arrival order, oldest first. Cheap to clone.
#[derive(Clone)]
pub struct CaptureStore {
    entries: Arc<RwLock<Entries>>,
    max_entries: usize,
}

impl CaptureStore {
    /// Create a store keeping at most `max_entries` captures (minimum 1).
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(Entries::default())),
            max_entries: max_entries.max(1),
        }
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Insert a capture, evicting the oldest ones past the limit.
    pub fn insert(&self, capture: StoredCapture) -> CollectorResult<()> {
        let mut entries = self.entries.write();
        if !entries.ids.insert(capture.id.clone()) {
            return Err(CollectorError::Conflict(capture.id));
        }

        entries.order.push_back(capture);
        while entries.order.len() > self.max_entries {
            if let Some(evicted) = entries.order.pop_front() {
                entries.ids.remove(&evicted.id);
                debug!(id = %evicted.id, "Evicted oldest capture");
            }
        }
        Ok(())
    }

    /// Captures matching `query`, newest first, at most `query.limit()`.
    pub fn list(&self, query: &ListQuery) -> Vec<StoredCapture> {
        self.entries
            .read()
            .order
            .iter()
            .rev()
            .filter(|capture| query.matches(capture))
            .take(query.limit())
            .cloned()
            .collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.read().ids.contains(id)
    }

    pub fn get(&self, id: &str) -> Option<StoredCapture> {
        let entries = self.entries.read();
        if !entries.ids.contains(id) {
            return None;
        }
        entries.order.iter().find(|capture| capture.id == id).cloned()
    }

    /// Remove everything. Returns how many captures were dropped.
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.write();
        let removed = entries.order.len();
        entries.order.clear();
        entries.ids.clear();
        removed
    }

    /// Every capture, oldest first.
    pub fn snapshot(&self) -> Vec<StoredCapture> {
        self.entries.read().order.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().order.is_empty()
    }
}

impl Default for CaptureStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}
