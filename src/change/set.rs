use super::record::ChangeRecord;
use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::hash::Hash;

/// Changes aggregated at one anchor, keyed by the anchor's direct children.
///
/// Entries carry no order; consumers that need sibling order ask the tree.
#[derive(Debug, Clone)]
pub struct NodeChangeSet<N> {
    changes: HashMap<N, ChangeRecord>,
}

impl<N: Copy + Eq + Hash> NodeChangeSet<N> {
    pub fn new() -> Self {
        Self {
            changes: HashMap::new(),
        }
    }

    /// Record `record` for `child`, reconciling with an earlier entry through
    /// [`ChangeRecord::combine`]. Returns `false` when the two reports cancel
    /// out and the entry was dropped.
    pub fn add_change(&mut self, child: N, record: ChangeRecord) -> bool {
        let Some(existing) = self.changes.get(&child) else {
            self.changes.insert(child, record);
            return true;
        };
        match ChangeRecord::combine(existing, record) {
            Some(combined) => {
                self.changes.insert(child, combined);
                true
            }
            None => {
                self.changes.remove(&child);
                false
            }
        }
    }

    pub fn get_change(&self, child: N) -> Option<&ChangeRecord> {
        self.changes.get(&child)
    }

    /// Correct the pre-change extent of an existing entry, keeping its kind.
    ///
    /// Returns `false` if `child` has no entry.
    pub fn set_old_length(&mut self, child: N, old_length: usize) -> bool {
        match self.changes.get_mut(&child) {
            Some(record) => {
                record.set_old_length(old_length);
                true
            }
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn children(&self) -> impl Iterator<Item = N> + '_ {
        self.changes.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (N, &ChangeRecord)> + '_ {
        self.changes.iter().map(|(child, record)| (*child, record))
    }
}

impl<N: Copy + Eq + Hash> Default for NodeChangeSet<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Debug> fmt::Display for NodeChangeSet<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<String> = self
            .changes
            .iter()
            .map(|(child, record)| format!("{child:?}: {record}"))
            .collect();
        // HashMap order is unstable; sort for reproducible output.
        entries.sort();
        write!(f, "{{{}}}", entries.join(", "))
    }
}
