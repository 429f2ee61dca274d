//! Change records: the value describing one child's net edit.

use crate::tree::TreeNavigation;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Kind of an elementary or aggregated change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeKind {
    Added,
    Removed,
    ContentsChanged,
    Replaced,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChangeKind::Added => "added",
            ChangeKind::Removed => "removed",
            ChangeKind::ContentsChanged => "contents-changed",
            ChangeKind::Replaced => "replaced",
        };
        f.write_str(name)
    }
}

/// Opaque resource a host needs to reconstruct removed content later
/// (for example the interned text table of the edited document).
///
/// The aggregator only carries it along on removal records.
#[derive(Clone)]
pub struct ContextTable(Arc<dyn Any + Send + Sync>);

impl ContextTable {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Whether both handles refer to the same underlying table.
    pub fn ptr_eq(&self, other: &ContextTable) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ContextTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ContextTable(..)")
    }
}

/// The recorded change of one child under an anchor.
///
/// `old_length` is the child's extent before the transaction began; consumers
/// use it to recompute offsets.
#[derive(Debug, Clone)]
pub struct ChangeRecord {
    kind: ChangeKind,
    old_length: usize,
    context: Option<ContextTable>,
}

impl ChangeRecord {
    /// Build the record for an elementary edit to `node`, reading its current
    /// extent from `tree`.
    ///
    /// Added content had no previous extent. The context table is kept only
    /// for removals.
    pub fn create<T: TreeNavigation>(
        kind: ChangeKind,
        node: T::Node,
        tree: &T,
        context: Option<ContextTable>,
    ) -> Self {
        let old_length = match kind {
            ChangeKind::Added => 0,
            ChangeKind::Removed | ChangeKind::ContentsChanged | ChangeKind::Replaced => {
                tree.text_len(node)
            }
        };
        Self::new(kind, old_length).with_context(context)
    }

    pub fn new(kind: ChangeKind, old_length: usize) -> Self {
        Self {
            kind,
            old_length,
            context: None,
        }
    }

    fn with_context(mut self, context: Option<ContextTable>) -> Self {
        if self.kind == ChangeKind::Removed {
            self.context = context;
        }
        self
    }

    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    pub fn old_length(&self) -> usize {
        self.old_length
    }

    pub fn context(&self) -> Option<&ContextTable> {
        self.context.as_ref()
    }

    pub(crate) fn set_old_length(&mut self, old_length: usize) {
        self.old_length = old_length;
    }

    /// Fold a finer change reported on a descendant into this subtree record.
    ///
    /// `descendant_len` is the descendant's current extent. Removals are not
    /// folded: removed content has no internal structure left to describe.
    /// Records that are themselves additions or removals already describe the
    /// whole subtree and come back unchanged.
    pub fn merge(mut self, incoming: &ChangeRecord, descendant_len: usize) -> ChangeRecord {
        match self.kind {
            ChangeKind::Added | ChangeKind::Removed => return self,
            ChangeKind::ContentsChanged | ChangeKind::Replaced => {}
        }
        match incoming.kind {
            ChangeKind::Removed => {}
            ChangeKind::Added => {
                self.old_length = self.old_length.saturating_sub(descendant_len);
            }
            ChangeKind::ContentsChanged | ChangeKind::Replaced => {
                self.old_length = (self.old_length + incoming.old_length)
                    .saturating_sub(descendant_len);
            }
        }
        self
    }

    /// Reduce a subtree's recorded edits into one `ContentsChanged` record for
    /// `node`, whose `old_length` is the node's extent before the transaction.
    pub fn summarize<'a, T, I>(node: T::Node, child_records: I, tree: &T) -> ChangeRecord
    where
        T: TreeNavigation,
        I: IntoIterator<Item = (T::Node, &'a ChangeRecord)>,
    {
        let mut old_length = tree.text_len(node);
        for (child, record) in child_records {
            match record.kind {
                ChangeKind::Added => {
                    old_length = old_length.saturating_sub(tree.text_len(child));
                }
                ChangeKind::Removed => old_length += record.old_length,
                ChangeKind::ContentsChanged | ChangeKind::Replaced => {
                    old_length = (old_length + record.old_length)
                        .saturating_sub(tree.text_len(child));
                }
            }
        }
        ChangeRecord::new(ChangeKind::ContentsChanged, old_length)
    }

    /// Reconcile a second report for the same child with the one already
    /// stored. `None` means the two cancel out and the entry should go.
    ///
    /// The earliest `old_length` always wins, since it describes the content
    /// as it was before the transaction.
    pub fn combine(existing: &ChangeRecord, incoming: ChangeRecord) -> Option<ChangeRecord> {
        use ChangeKind::*;

        match (existing.kind, incoming.kind) {
            (Added, Removed) => None,
            (Added, _) => Some(existing.clone()),
            (Removed, Added) => Some(ChangeRecord::new(Replaced, existing.old_length)),
            (Removed, _) => Some(existing.clone()),
            (ContentsChanged | Replaced, Removed) => Some(ChangeRecord {
                kind: Removed,
                old_length: existing.old_length,
                context: incoming.context,
            }),
            (ContentsChanged, Replaced) => Some(ChangeRecord::new(Replaced, existing.old_length)),
            (ContentsChanged, Added) => Some(incoming),
            (ContentsChanged, ContentsChanged) | (Replaced, _) => Some(existing.clone()),
        }
    }
}

impl PartialEq for ChangeRecord {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.old_length == other.old_length
    }
}

impl Eq for ChangeRecord {}

impl fmt::Display for ChangeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.old_length)
    }
}
