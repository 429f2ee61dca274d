//! Positional order over tracked anchors.
//!
//! A node's route is the list of sibling indices leading from the root down to
//! it. Routes compare index by index; when one route is a prefix of the other
//! the shorter (ancestor) route sorts after the longer one.

use crate::error::{AggregatorError, AggregatorResult};
use crate::tree::TreeNavigation;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route(Vec<usize>);

impl Route {
    /// Compute the route of `node` in its current position.
    ///
    /// The root has an empty route. Fails with `MalformedTree` if some node on
    /// the way up is not listed among its parent's children.
    pub fn of<T: TreeNavigation>(tree: &T, node: T::Node) -> AggregatorResult<Route> {
        let mut indices = Vec::new();
        let mut current = node;
        while let Some(parent) = tree.parent(current) {
            let index = tree
                .index_in_parent(current)
                .ok_or_else(|| AggregatorError::malformed_tree(current))?;
            indices.push(index);
            current = parent;
        }
        indices.reverse();
        Ok(Route(indices))
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }
}

impl Ord for Route {
    fn cmp(&self, other: &Self) -> Ordering {
        for (left, right) in self.0.iter().zip(&other.0) {
            match left.cmp(right) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        // Prefix: the shorter route is the ancestor and goes last.
        other.0.len().cmp(&self.0.len())
    }
}

impl PartialOrd for Route {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Tracked anchors kept sorted by [`Route`].
///
/// Routes are recomputed on every insertion because the tree may have been
/// reshaped by reported edits since an anchor was added.
#[derive(Debug, Clone)]
pub(crate) struct OrderedAnchors<N> {
    anchors: Vec<N>,
}

impl<N: Copy + Eq + std::fmt::Debug> OrderedAnchors<N> {
    pub(crate) fn new() -> Self {
        Self {
            anchors: Vec::new(),
        }
    }

    /// Insert `node` before the first anchor whose route sorts after it.
    pub(crate) fn insert<T>(&mut self, tree: &T, node: N) -> AggregatorResult<()>
    where
        T: TreeNavigation<Node = N>,
    {
        let route = Route::of(tree, node)?;
        for (position, anchor) in self.anchors.iter().enumerate() {
            if route < Route::of(tree, *anchor)? {
                log::trace!(
                    target: "tree_change_aggregator::ordering",
                    "Placing anchor {:?} at position {} (route {:?})",
                    node,
                    position,
                    route.indices()
                );
                self.anchors.insert(position, node);
                return Ok(());
            }
        }
        self.anchors.push(node);
        Ok(())
    }

    pub(crate) fn remove(&mut self, node: N) -> bool {
        match self.anchors.iter().position(|anchor| *anchor == node) {
            Some(position) => {
                self.anchors.remove(position);
                true
            }
            None => false,
        }
    }

    pub(crate) fn as_slice(&self) -> &[N] {
        &self.anchors
    }

    pub(crate) fn clear(&mut self) {
        self.anchors.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::ArenaTree;
    use rstest::rstest;

    #[rstest]
    #[case::first_difference_decides(vec![0, 5], vec![1, 0], Ordering::Less)]
    #[case::later_difference_decides(vec![2, 3, 1], vec![2, 1, 9], Ordering::Greater)]
    #[case::equal(vec![1, 2], vec![1, 2], Ordering::Equal)]
    #[case::ancestor_sorts_after_descendant(vec![1], vec![1, 0], Ordering::Greater)]
    #[case::descendant_sorts_before_ancestor(vec![1, 4, 2], vec![1], Ordering::Less)]
    #[case::root_sorts_last(vec![], vec![3], Ordering::Greater)]
    fn route_comparison(
        #[case] left: Vec<usize>,
        #[case] right: Vec<usize>,
        #[case] expected: Ordering,
    ) {
        assert_eq!(Route(left).cmp(&Route(right)), expected);
    }

    #[test]
    fn route_lists_sibling_indices_from_below_root() {
        let mut tree = ArenaTree::new("R", 0);
        let root = tree.root();
        tree.add_child(root, "X", 0);
        let y = tree.add_child(root, "Y", 0);
        tree.add_child(y, "Y0", 0);
        let y1 = tree.add_child(y, "Y1", 0);

        assert_eq!(Route::of(&tree, root).unwrap().indices(), &[] as &[usize]);
        assert_eq!(Route::of(&tree, y1).unwrap().indices(), &[1, 1]);
    }

    #[test]
    fn insert_keeps_anchors_sorted_regardless_of_arrival() {
        let mut tree = ArenaTree::new("R", 0);
        let root = tree.root();
        let a = tree.add_child(root, "A", 0);
        let b = tree.add_child(root, "B", 0);
        let c = tree.add_child(root, "C", 0);
        let b0 = tree.add_child(b, "B0", 0);

        let mut anchors = OrderedAnchors::new();
        for node in [c, a, b0] {
            anchors.insert(&tree, node).unwrap();
        }

        assert_eq!(anchors.as_slice(), &[a, b0, c]);
        assert!(anchors.remove(b0));
        assert!(!anchors.remove(b0));
        assert_eq!(anchors.as_slice(), &[a, c]);
    }

    /// Navigation whose parent link is not mirrored in the child list.
    struct OrphanedChild;

    impl TreeNavigation for OrphanedChild {
        type Node = u8;

        fn parent(&self, node: u8) -> Option<u8> {
            (node != 0).then_some(0)
        }

        fn children(&self, _node: u8) -> Vec<u8> {
            Vec::new()
        }

        fn text_len(&self, _node: u8) -> usize {
            0
        }
    }

    #[test]
    fn route_of_unlisted_child_is_malformed_tree() {
        let result = Route::of(&OrphanedChild, 3);
        assert!(matches!(result, Err(AggregatorError::MalformedTree { .. })));
    }
}
