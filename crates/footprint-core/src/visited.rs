//! Cycle tracking
//!
//! The [`VisitedSet`] maps composite values, by identity, to the id assigned
//! at their first visit. It holds a strong handle to every recorded value so
//! an address cannot be freed and reused by an unrelated value while the set
//! is alive.

use crate::path::NodeId;
use crate::value::{Composite, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct VisitedEntry {
    /// Keeps the allocation alive so its address stays unique
    _handle: Composite,
    id: NodeId,
}

/// Identity-keyed map of visited composite values
#[derive(Debug, Clone, Default)]
pub struct VisitedSet {
    entries: BTreeMap<usize, VisitedEntry>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id assigned to `value` when it was first recorded
    ///
    /// Always `None` for non-composite values.
    pub fn lookup(&self, value: &Value) -> Option<&NodeId> {
        let composite = value.as_composite()?;
        self.lookup_composite(&composite)
    }

    pub fn lookup_composite(&self, composite: &Composite) -> Option<&NodeId> {
        self.entries.get(&composite.address()).map(|entry| &entry.id)
    }

    /// Record the first visit of a composite value
    ///
    /// Returns the previously recorded id instead if the value is already
    /// present; the existing entry is left untouched.
    pub fn record(&mut self, composite: Composite, id: NodeId) -> Option<NodeId> {
        let address = composite.address();
        if let Some(existing) = self.entries.get(&address) {
            return Some(existing.id.clone());
        }
        self.entries.insert(
            address,
            VisitedEntry {
                _handle: composite,
                id,
            },
        );
        None
    }

    /// Pre-seed a value under an explicit id
    ///
    /// Non-composite values are ignored and `false` is returned.
    pub fn seed(&mut self, value: &Value, id: NodeId) -> bool {
        match value.as_composite() {
            Some(composite) => {
                self.record(composite, id);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.lookup(value).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget every recorded value
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Recorded ids, in no particular order
    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.entries.values().map(|entry| &entry.id)
    }
}
