//! Hierarchical aggregation of elementary tree edits.
//!
//! A [`ChangeAggregator`] lives for exactly one edit transaction. Every edit is
//! anchored at the closest ancestor that already aggregates changes, or, when
//! there is none, at the edited node's parent, which then absorbs any anchors
//! already tracked inside its subtree. The tracked anchors therefore always form
//! an antichain: no anchor is an ancestor of another.

mod depth_index;
mod listener;
mod ordering;
mod summary;

pub use listener::ChangeListener;
pub use ordering::Route;
pub use summary::{AnchorSummary, ChangeSummary, ChildChange};

use crate::change::{ChangeKind, ChangeRecord, NodeChangeSet};
use crate::config::AggregatorSettings;
use crate::error::{AggregatorError, AggregatorResult};
use crate::tree::TreeNavigation;
use depth_index::DepthIndex;
use ordering::OrderedAnchors;
use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::hash::Hash;

#[derive(Debug, Clone)]
struct TrackedAnchor<N> {
    depth: usize,
    changes: NodeChangeSet<N>,
}

/// Aggregated changes of one edit transaction.
#[derive(Debug, Clone)]
pub struct ChangeAggregator<N> {
    root: N,
    anchors: HashMap<N, TrackedAnchor<N>>,
    ordered: OrderedAnchors<N>,
    depths: DepthIndex<N>,
    settings: AggregatorSettings,
}

impl<N: Copy + Eq + Hash + Debug> ChangeAggregator<N> {
    /// Start an empty transaction over the tree rooted at `root`.
    pub fn new(root: N) -> Self {
        Self::with_settings(root, AggregatorSettings::default())
    }

    pub fn with_settings(root: N, settings: AggregatorSettings) -> Self {
        Self {
            root,
            anchors: HashMap::new(),
            ordered: OrderedAnchors::new(),
            depths: DepthIndex::with_capacity(settings.depth_capacity),
            settings,
        }
    }

    /// Root of the tree this transaction edits.
    pub fn root(&self) -> N {
        self.root
    }

    pub fn settings(&self) -> &AggregatorSettings {
        &self.settings
    }

    /// Report that `node` itself (not its subtree) changed as `record` says.
    ///
    /// Edits to the root have no ancestor to anchor at and are ignored. An
    /// edit inside a child subtree that an anchor already summarizes is
    /// covered by that summary and ignored as well.
    pub fn record_edit<T>(&mut self, tree: &T, node: N, record: ChangeRecord) -> AggregatorResult<()>
    where
        T: TreeNavigation<Node = N>,
    {
        self.add_elementary_change(tree, node, record)?;
        if self.settings.check_invariants {
            self.check_invariants(tree)?;
        }
        Ok(())
    }

    fn add_elementary_change<T>(&mut self, tree: &T, node: N, record: ChangeRecord) -> AggregatorResult<()>
    where
        T: TreeNavigation<Node = N>,
    {
        let Some(parent) = tree.parent(node) else {
            log::trace!(
                target: "tree_change_aggregator::record",
                "Ignoring {} edit of parentless node {:?}",
                record.kind(),
                node
            );
            return Ok(());
        };
        let mut steps = 0;
        let mut prev_child = node;
        let mut current = Some(parent);
        while let Some(candidate) = current {
            if let Some(tracked) = self.anchors.get(&candidate) {
                let covered = tracked.changes.get_change(prev_child).is_some();
                if covered && prev_child != node {
                    log::trace!(
                        target: "tree_change_aggregator::record",
                        "Edit of {:?} already covered by {:?} under anchor {:?}",
                        node,
                        prev_child,
                        candidate
                    );
                    return Ok(());
                }

                let stored = if prev_child == node {
                    record
                } else {
                    let summary = ChangeRecord::summarize(prev_child, std::iter::empty(), tree);
                    if record.kind() == ChangeKind::Removed {
                        summary
                    } else {
                        summary.merge(&record, tree.text_len(node))
                    }
                };
                let depth = tracked.depth;
                return self.store_change(tree, candidate, prev_child, stored, depth);
            }
            steps += 1;
            prev_child = candidate;
            current = tree.parent(candidate);
        }

        // No tracked ancestor: `parent` becomes an anchor. `steps` counted
        // every node from `parent` up to the root inclusive.
        let depth = steps - 1;
        // Fail on a malformed ancestor chain before compaction mutates anything.
        Route::of(tree, parent)?;
        self.compact_changes(tree, parent, depth)?;
        self.store_change(tree, parent, node, record, depth)
    }

    /// Fold every anchor tracked strictly inside `anchor`'s subtree into
    /// summaries attached one level up, deepest levels first, until the
    /// summaries reach `anchor` or an anchor already tracked inside it.
    fn compact_changes<T>(&mut self, tree: &T, anchor: N, anchor_depth: usize) -> AggregatorResult<()>
    where
        T: TreeNavigation<Node = N>,
    {
        let mut level = self.depths.depth_limit();
        while level > anchor_depth + 1 {
            level -= 1;
            let inside: Vec<N> = self
                .depths
                .bucket(level)
                .filter(|candidate| tree.is_proper_ancestor(anchor, *candidate))
                .collect();

            for compacted in inside {
                let Some(tracked) = self.untrack(compacted) else {
                    continue;
                };
                let summary = ChangeRecord::summarize(compacted, tracked.changes.iter(), tree);
                log::debug!(
                    target: "tree_change_aggregator::compaction",
                    "Compacted anchor {:?} at depth {} ({} changes, old length {}) into {:?}",
                    compacted,
                    level,
                    tracked.changes.len(),
                    summary.old_length(),
                    anchor
                );

                let Some(grandparent) = tree.parent(compacted) else {
                    continue;
                };
                match self.anchors.get_mut(&grandparent) {
                    // `grandparent` can only be tracked here if an earlier
                    // pass of this loop created it for a sibling of
                    // `compacted`, so an existing entry for `compacted`
                    // would need `compacted` to be folded twice.
                    Some(parent_anchor) => {
                        if !parent_anchor
                            .changes
                            .set_old_length(compacted, summary.old_length())
                        {
                            parent_anchor.changes.add_change(compacted, summary);
                        }
                    }
                    None => {
                        // Lands in the next shallower bucket, which this loop
                        // visits next.
                        self.store_change(tree, grandparent, compacted, summary, level - 1)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Store `record` for `child` under `anchor`, tracking the anchor if it is
    /// new and untracking it if the set ends up empty.
    fn store_change<T>(
        &mut self,
        tree: &T,
        anchor: N,
        child: N,
        record: ChangeRecord,
        depth: usize,
    ) -> AggregatorResult<()>
    where
        T: TreeNavigation<Node = N>,
    {
        if !self.anchors.contains_key(&anchor) {
            self.ordered.insert(tree, anchor)?;
            self.depths.insert(depth, anchor);
            self.anchors.insert(
                anchor,
                TrackedAnchor {
                    depth,
                    changes: NodeChangeSet::new(),
                },
            );
            log::debug!(
                target: "tree_change_aggregator::record",
                "Tracking new anchor {:?} at depth {}",
                anchor,
                depth
            );
        }

        let emptied = match self.anchors.get_mut(&anchor) {
            Some(tracked) => {
                tracked.changes.add_change(child, record);
                tracked.changes.is_empty()
            }
            None => false,
        };
        if emptied {
            log::debug!(
                target: "tree_change_aggregator::record",
                "Changes under {:?} cancelled out; untracking",
                anchor
            );
            self.untrack(anchor);
        }
        Ok(())
    }

    fn untrack(&mut self, anchor: N) -> Option<TrackedAnchor<N>> {
        let tracked = self.anchors.remove(&anchor)?;
        self.ordered.remove(anchor);
        self.depths.remove(tracked.depth, anchor);
        Some(tracked)
    }

    /// Tracked anchors in position order.
    pub fn changed_anchors_in_order(&self) -> &[N] {
        self.ordered.as_slice()
    }

    /// Changes aggregated at `anchor`, if it is tracked.
    pub fn changes_for(&self, anchor: N) -> Option<&NodeChangeSet<N>> {
        self.anchors.get(&anchor).map(|tracked| &tracked.changes)
    }

    /// Anchors with their change sets, in position order.
    pub fn iter(&self) -> impl Iterator<Item = (N, &NodeChangeSet<N>)> + '_ {
        self.ordered
            .as_slice()
            .iter()
            .filter_map(|anchor| self.changes_for(*anchor).map(|changes| (*anchor, changes)))
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Number of tracked anchors.
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// Drop all tracked state, abandoning the transaction's changes.
    pub fn clear(&mut self) {
        self.anchors.clear();
        self.ordered.clear();
        self.depths.clear();
    }

    /// Hand the finished transaction to `listener`, consuming it.
    pub fn publish<L>(self, listener: &mut L)
    where
        L: ChangeListener<N> + ?Sized,
    {
        log::debug!(
            target: "tree_change_aggregator::record",
            "Publishing {} changed anchors under {:?}",
            self.len(),
            self.root
        );
        listener.tree_changed(&self);
    }

    /// Verify the structural invariants against the current tree shape:
    /// anchors form an antichain, sit in the depth bucket of their real depth,
    /// appear in route order, and hold at least one change each.
    pub fn check_invariants<T>(&self, tree: &T) -> AggregatorResult<()>
    where
        T: TreeNavigation<Node = N>,
    {
        for (anchor, tracked) in &self.anchors {
            if tracked.changes.is_empty() {
                return Err(self.violation(format!("anchor {anchor:?} has no changes")));
            }
            let actual = tree.depth(*anchor);
            if tracked.depth != actual {
                return Err(self.violation(format!(
                    "anchor {anchor:?} indexed at depth {} but sits at depth {actual}",
                    tracked.depth
                )));
            }
            let mut ancestor = tree.parent(*anchor);
            while let Some(candidate) = ancestor {
                if self.anchors.contains_key(&candidate) {
                    return Err(self.violation(format!(
                        "anchor {candidate:?} is an ancestor of anchor {anchor:?}"
                    )));
                }
                ancestor = tree.parent(candidate);
            }
        }

        if self.depths.len() != self.anchors.len()
            || self
                .depths
                .entries()
                .any(|(depth, node)| self.anchors.get(&node).map(|t| t.depth) != Some(depth))
        {
            return Err(self.violation("depth index does not mirror tracked anchors"));
        }

        let ordered = self.ordered.as_slice();
        if ordered.len() != self.anchors.len()
            || ordered.iter().any(|node| !self.anchors.contains_key(node))
        {
            return Err(self.violation("ordered list does not mirror tracked anchors"));
        }
        let routes = ordered
            .iter()
            .map(|node| Route::of(tree, *node))
            .collect::<AggregatorResult<Vec<_>>>()?;
        if routes.windows(2).any(|pair| pair[0] > pair[1]) {
            return Err(self.violation("ordered list is not in route order"));
        }
        Ok(())
    }

    fn violation(&self, message: impl Into<String>) -> AggregatorError {
        let error = AggregatorError::invariant(message);
        log::error!(target: "tree_change_aggregator::invariants", "{}", error);
        error
    }

    /// Serializable snapshot of the result, naming nodes through `label`.
    ///
    /// Children of each anchor are listed in sibling order; detached children
    /// (removed content) follow, ordered by label.
    pub fn summary<T, F>(&self, tree: &T, label: F) -> ChangeSummary
    where
        T: TreeNavigation<Node = N>,
        F: Fn(N) -> String,
    {
        summary::build(self, tree, label)
    }
}

impl<N: Copy + Eq + Hash + Debug> fmt::Display for ChangeAggregator<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (anchor, changes) in self.iter() {
            writeln!(f, "{anchor:?}: {changes}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{ArenaTree, NodeId};

    struct Fixture {
        tree: ArenaTree,
        r: NodeId,
        a: NodeId,
        a1: NodeId,
        a2: NodeId,
        b: NodeId,
    }

    /// R{A{A1, A2}, B}
    fn fixture() -> Fixture {
        let mut tree = ArenaTree::new("R", 0);
        let r = tree.root();
        let a = tree.add_child(r, "A", 0);
        let a1 = tree.add_child(a, "A1", 2);
        let a2 = tree.add_child(a, "A2", 3);
        let b = tree.add_child(r, "B", 4);
        Fixture {
            tree,
            r,
            a,
            a1,
            a2,
            b,
        }
    }

    fn changed(tree: &ArenaTree, node: NodeId) -> ChangeRecord {
        ChangeRecord::create(ChangeKind::ContentsChanged, node, tree, None)
    }

    fn checked(root: NodeId) -> ChangeAggregator<NodeId> {
        ChangeAggregator::with_settings(
            root,
            AggregatorSettings {
                check_invariants: true,
                ..Default::default()
            },
        )
    }

    #[test]
    fn sibling_edits_share_their_parent_anchor() {
        let f = fixture();
        let mut changes = checked(f.r);

        changes.record_edit(&f.tree, f.a1, changed(&f.tree, f.a1)).unwrap();
        changes.record_edit(&f.tree, f.a2, changed(&f.tree, f.a2)).unwrap();

        assert_eq!(changes.changed_anchors_in_order(), &[f.a]);
        let set = changes.changes_for(f.a).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.get_change(f.a1).is_some());
        assert!(set.get_change(f.a2).is_some());
    }

    #[test]
    fn edit_above_existing_anchor_compacts_it() {
        let f = fixture();
        let mut changes = checked(f.r);
        changes.record_edit(&f.tree, f.a1, changed(&f.tree, f.a1)).unwrap();
        changes.record_edit(&f.tree, f.a2, changed(&f.tree, f.a2)).unwrap();

        changes.record_edit(&f.tree, f.b, changed(&f.tree, f.b)).unwrap();

        assert_eq!(changes.changed_anchors_in_order(), &[f.r]);
        assert!(changes.changes_for(f.a).is_none());
        let set = changes.changes_for(f.r).unwrap();
        assert_eq!(
            set.get_change(f.a),
            Some(&ChangeRecord::new(ChangeKind::ContentsChanged, 5))
        );
        assert_eq!(
            set.get_change(f.b),
            Some(&ChangeRecord::new(ChangeKind::ContentsChanged, 4))
        );
    }

    #[test]
    fn edit_inside_summarized_child_is_covered() {
        let f = fixture();
        let mut changes = checked(f.r);
        changes.record_edit(&f.tree, f.a1, changed(&f.tree, f.a1)).unwrap();
        changes.record_edit(&f.tree, f.b, changed(&f.tree, f.b)).unwrap();
        let before = changes.to_string();

        changes.record_edit(&f.tree, f.a1, changed(&f.tree, f.a1)).unwrap();

        assert_eq!(changes.changed_anchors_in_order(), &[f.r]);
        assert_eq!(changes.to_string(), before);
    }

    #[test]
    fn root_edits_are_ignored() {
        let f = fixture();
        let mut changes = checked(f.r);

        changes.record_edit(&f.tree, f.r, changed(&f.tree, f.r)).unwrap();

        assert!(changes.is_empty());
        assert!(changes.changed_anchors_in_order().is_empty());
    }

    #[test]
    fn edit_below_unsummarized_child_synthesizes_summary() {
        // R{A{A1, A2}, B}: anchor R via B, then an edit on A1 whose path
        // child A has no entry in R yet.
        let f = fixture();
        let mut changes = checked(f.r);
        changes.record_edit(&f.tree, f.b, changed(&f.tree, f.b)).unwrap();

        changes
            .record_edit(&f.tree, f.a1, ChangeRecord::new(ChangeKind::ContentsChanged, 7))
            .unwrap();

        let set = changes.changes_for(f.r).unwrap();
        // A now spans 5; A1 went from 7 to 2, so A spanned 10 before.
        assert_eq!(
            set.get_change(f.a),
            Some(&ChangeRecord::new(ChangeKind::ContentsChanged, 10))
        );
        assert!(changes.changes_for(f.a).is_none());
    }

    #[test]
    fn cancelled_changes_untrack_the_anchor() {
        let mut f = fixture();
        let mut changes = checked(f.r);
        let fresh = f.tree.add_child(f.a, "fresh", 1);
        changes
            .record_edit(&f.tree, fresh, ChangeRecord::create(ChangeKind::Added, fresh, &f.tree, None))
            .unwrap();
        assert_eq!(changes.changed_anchors_in_order(), &[f.a]);

        let removed = ChangeRecord::create(ChangeKind::Removed, fresh, &f.tree, None);
        changes.record_edit(&f.tree, fresh, removed).unwrap();

        assert!(changes.is_empty());
        assert!(changes.changes_for(f.a).is_none());
        assert!(changes.changed_anchors_in_order().is_empty());
    }

    #[test]
    fn removal_of_anchor_keeps_extent_before_the_transaction() {
        // A1 shrank from 7 to 2, so A spanned 7 + 3 before it was removed.
        let mut f = fixture();
        let mut changes = checked(f.r);
        changes
            .record_edit(&f.tree, f.a1, ChangeRecord::new(ChangeKind::ContentsChanged, 7))
            .unwrap();
        assert_eq!(changes.changed_anchors_in_order(), &[f.a]);

        let removal = ChangeRecord::create(ChangeKind::Removed, f.a, &f.tree, None);
        assert_eq!(removal.old_length(), 5);
        changes.record_edit(&f.tree, f.a, removal).unwrap();
        f.tree.detach(f.a);

        assert_eq!(changes.changed_anchors_in_order(), &[f.r]);
        assert!(changes.changes_for(f.a).is_none());
        assert_eq!(
            changes.changes_for(f.r).unwrap().get_change(f.a),
            Some(&ChangeRecord::new(ChangeKind::Removed, 10))
        );
        changes.check_invariants(&f.tree).unwrap();
    }

    #[test]
    fn removal_under_existing_anchor_stores_current_extent() {
        // R tracks B, so nothing inside A has changed and A's extent is intact.
        let mut f = fixture();
        let mut changes = checked(f.r);
        changes.record_edit(&f.tree, f.b, changed(&f.tree, f.b)).unwrap();

        let removal = ChangeRecord::create(ChangeKind::Removed, f.a, &f.tree, None);
        changes.record_edit(&f.tree, f.a, removal).unwrap();
        f.tree.detach(f.a);

        let set = changes.changes_for(f.r).unwrap();
        assert_eq!(set.get_change(f.a), Some(&ChangeRecord::new(ChangeKind::Removed, 5)));
        assert_eq!(set.len(), 2);
        changes.check_invariants(&f.tree).unwrap();
    }

    #[test]
    fn compaction_folds_sibling_anchors_into_one_new_anchor() {
        // R{A{A1, A2}, B{B0}}: anchors A and B both fold into R in one pass.
        let mut f = fixture();
        let b0 = f.tree.add_child(f.b, "B0", 1);
        let mut changes = checked(f.r);
        changes.record_edit(&f.tree, f.a1, changed(&f.tree, f.a1)).unwrap();
        changes.record_edit(&f.tree, b0, changed(&f.tree, b0)).unwrap();
        assert_eq!(changes.changed_anchors_in_order(), &[f.a, f.b]);

        changes.record_edit(&f.tree, f.a, changed(&f.tree, f.a)).unwrap();

        assert_eq!(changes.changed_anchors_in_order(), &[f.r]);
        let set = changes.changes_for(f.r).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get_change(f.a), Some(&ChangeRecord::new(ChangeKind::ContentsChanged, 5)));
        assert_eq!(set.get_change(f.b), Some(&ChangeRecord::new(ChangeKind::ContentsChanged, 5)));
    }

    #[test]
    fn clear_empties_every_read() {
        let f = fixture();
        let mut changes = checked(f.r);
        changes.record_edit(&f.tree, f.a1, changed(&f.tree, f.a1)).unwrap();
        changes.record_edit(&f.tree, f.b, changed(&f.tree, f.b)).unwrap();

        changes.clear();

        assert!(changes.is_empty());
        assert!(changes.changed_anchors_in_order().is_empty());
        assert!(changes.changes_for(f.r).is_none());
        assert_eq!(changes.to_string(), "");
        changes.check_invariants(&f.tree).unwrap();
    }

    #[test]
    fn display_lists_anchors_in_order() {
        let f = fixture();
        let mut changes = checked(f.r);
        changes.record_edit(&f.tree, f.a1, changed(&f.tree, f.a1)).unwrap();

        assert_eq!(
            changes.to_string(),
            format!("{:?}: {{{:?}: contents-changed(2)}}\n", f.a, f.a1)
        );
    }

    #[test]
    fn publish_hands_result_to_listener() {
        let f = fixture();
        let mut changes = ChangeAggregator::new(f.r);
        changes.record_edit(&f.tree, f.a2, changed(&f.tree, f.a2)).unwrap();

        let mut seen = Vec::new();
        changes.publish(&mut |event: &ChangeAggregator<NodeId>| {
            seen.extend_from_slice(event.changed_anchors_in_order());
        });

        assert_eq!(seen, vec![f.a]);
    }
}
