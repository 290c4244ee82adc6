//! Per-run accumulators for observations that arrive before completion.
//!
//! Each store maps a [`RunId`] to the observations recorded for it, in
//! arrival order. Appends lock only the entry for their key, so hooks of
//! unrelated runs never wait on each other.

use dashmap::DashMap;

use crate::model::{AgentObservation, CheckoutObservation, RunId};

/// Concurrent map from run identity to an ordered list of observations.
#[derive(Debug)]
pub struct CorrelationStore<T> {
    entries: DashMap<RunId, Vec<T>>,
}

impl<T> CorrelationStore<T> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Append `value` to the list for `key`, creating the list if needed.
    ///
    /// The entry stays write-locked for the whole create-then-push, so
    /// concurrent appends to the same key are never lost.
    pub fn append(&self, key: &RunId, value: T) {
        self.entries
            .entry(key.clone())
            .or_insert_with(Vec::new)
            .push(value);
    }

    /// Remove `key` and return everything recorded for it.
    ///
    /// A key that was never written yields an empty list.
    pub fn take_and_remove(&self, key: &RunId) -> Vec<T> {
        self.entries
            .remove(key)
            .map(|(_, values)| values)
            .unwrap_or_default()
    }

    /// Number of observations currently held for `key`.
    pub fn count(&self, key: &RunId) -> usize {
        self.entries.get(key).map(|values| values.len()).unwrap_or(0)
    }

    pub fn contains(&self, key: &RunId) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of runs with at least one pending observation.
    pub fn run_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Clone> CorrelationStore<T> {
    /// Copy of the observations held for `key`, leaving the store untouched.
    pub fn snapshot(&self, key: &RunId) -> Vec<T> {
        self.entries
            .get(key)
            .map(|values| values.value().clone())
            .unwrap_or_default()
    }
}

impl<T> Default for CorrelationStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// The two channels of partial observations tracked per run.
///
/// One instance is shared (behind an `Arc`) by all observers of a process.
#[derive(Debug, Default)]
pub struct Observations {
    pub agents: CorrelationStore<AgentObservation>,
    pub checkouts: CorrelationStore<CheckoutObservation>,
}

impl Observations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evict everything recorded for `run`, returning agents and checkouts.
    pub fn take_run(&self, run: &RunId) -> (Vec<AgentObservation>, Vec<CheckoutObservation>) {
        (
            self.agents.take_and_remove(run),
            self.checkouts.take_and_remove(run),
        )
    }

    /// True if neither channel holds anything for `run`.
    pub fn is_released(&self, run: &RunId) -> bool {
        !self.agents.contains(run) && !self.checkouts.contains(run)
    }

    /// True if no run has pending observations in either channel.
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty() && self.checkouts.is_empty()
    }
}
