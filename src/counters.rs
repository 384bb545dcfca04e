//! Named progress counters shared across concurrently running tasks.
//!
//! [`Counters`] is the concrete [`CounterSink`] used by the local executor.
//! Increments are atomic per counter, so tasks running in parallel can bump
//! the same counter without lost updates.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use crate::task::CounterSink;

/// Process-wide store of monotonically increasing counters.
///
/// Designed to be wrapped in `Arc` and shared by every task of a run.
#[derive(Debug, Default)]
pub struct Counters {
    values: DashMap<String, AtomicU64>,
}

impl Counters {
    /// Creates an empty counter store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a counter; zero if it was never incremented.
    #[must_use]
    pub fn get(&self, name: &str) -> u64 {
        self.values
            .get(name)
            .map_or(0, |value| value.load(Ordering::SeqCst))
    }

    /// Copy of all counters, ordered by name.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        self.values
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().load(Ordering::SeqCst)))
            .collect()
    }
}

impl CounterSink for Counters {
    fn increment(&self, name: &str, delta: u64) {
        // Fast path avoids allocating the key once the counter exists.
        if let Some(value) = self.values.get(name) {
            value.fetch_add(delta, Ordering::SeqCst);
            return;
        }
        self.values
            .entry(name.to_string())
            .or_default()
            .fetch_add(delta, Ordering::SeqCst);
    }
}
