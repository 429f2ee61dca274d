use super::ChangeAggregator;
use crate::change::ChangeKind;
use crate::tree::TreeNavigation;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use std::hash::Hash;

/// Owned, serializable view of a transaction's aggregated changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    pub anchors: Vec<AnchorSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorSummary {
    pub anchor: String,
    pub changes: Vec<ChildChange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildChange {
    pub child: String,
    pub kind: ChangeKind,
    pub old_length: usize,
}

pub(super) fn build<N, T, F>(aggregator: &ChangeAggregator<N>, tree: &T, label: F) -> ChangeSummary
where
    N: Copy + Eq + Hash + Debug,
    T: TreeNavigation<Node = N>,
    F: Fn(N) -> String,
{
    let anchors = aggregator
        .iter()
        .map(|(anchor, set)| {
            let mut entries: Vec<(Option<usize>, ChildChange)> = set
                .iter()
                .map(|(child, record)| {
                    let position = tree
                        .parent(child)
                        .filter(|parent| *parent == anchor)
                        .and_then(|_| tree.index_in_parent(child));
                    let change = ChildChange {
                        child: label(child),
                        kind: record.kind(),
                        old_length: record.old_length(),
                    };
                    (position, change)
                })
                .collect();
            // Attached children by position, detached ones after them.
            entries.sort_by(|(left_pos, left), (right_pos, right)| {
                match (left_pos, right_pos) {
                    (Some(l), Some(r)) => l.cmp(r),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => left.child.cmp(&right.child),
                }
            });
            AnchorSummary {
                anchor: label(anchor),
                changes: entries.into_iter().map(|(_, change)| change).collect(),
            }
        })
        .collect();
    ChangeSummary { anchors }
}

impl fmt::Display for ChangeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for anchor in &self.anchors {
            writeln!(f, "{}", anchor.anchor)?;
            for change in &anchor.changes {
                writeln!(
                    f,
                    "  {} {} (old length {})",
                    change.child, change.kind, change.old_length
                )?;
            }
        }
        Ok(())
    }
}
