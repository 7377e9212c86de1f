//! Set of steps the user chose to apply.

#![allow(missing_docs)]

use std::hash::Hash;

use indexmap::IndexSet;

use crate::recommendations::StepId;

/// Toggle-based selection set that remembers insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionTracker<K = StepId>
where
    K: Hash + Eq,
{
    members: IndexSet<K>,
}

impl<K: Hash + Eq> Default for SelectionTracker<K> {
    fn default() -> Self {
        Self {
            members: IndexSet::new(),
        }
    }
}

impl<K: Hash + Eq + Clone> SelectionTracker<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `value` when absent, removes it when present. Returns whether the
    /// value is selected afterwards.
    pub fn toggle(&mut self, value: K) -> bool {
        if self.members.shift_remove(&value) {
            false
        } else {
            self.members.insert(value);
            true
        }
    }

    #[must_use]
    pub fn contains(&self, value: &K) -> bool {
        self.members.contains(value)
    }

    /// Members in the order they were selected.
    #[must_use]
    pub fn snapshot(&self) -> Vec<K> {
        self.members.iter().cloned().collect()
    }

    /// Keeps only members for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&K) -> bool) {
        self.members.retain(|value| keep(value));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
