//! Tree navigation capability.
//!
//! The aggregator never owns tree nodes. It works on copyable handles and asks a
//! [`TreeNavigation`] provider for structure whenever it needs to walk the tree.

pub mod arena;
pub mod syntax;

pub use arena::{ArenaTree, NodeId};

use std::fmt::Debug;
use std::hash::Hash;

/// Navigation over an externally owned, ordered tree.
///
/// Handles must have stable identity for the duration of a transaction.
/// Nodes detached by a reported removal keep answering [`text_len`] but have
/// no parent.
///
/// [`text_len`]: TreeNavigation::text_len
pub trait TreeNavigation {
    type Node: Copy + Eq + Hash + Debug;

    /// The parent of `node`, or `None` for the root (and for detached nodes).
    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// Children of `node` in sibling order.
    fn children(&self, node: Self::Node) -> Vec<Self::Node>;

    /// Current extent of the node's content (e.g. its text length in bytes).
    fn text_len(&self, node: Self::Node) -> usize;

    /// Number of edges between `node` and the root.
    fn depth(&self, node: Self::Node) -> usize {
        let mut depth = 0;
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            depth += 1;
            current = parent;
        }
        depth
    }

    /// Whether `ancestor` lies strictly above `node`.
    fn is_proper_ancestor(&self, ancestor: Self::Node, node: Self::Node) -> bool {
        let mut current = self.parent(node);
        while let Some(candidate) = current {
            if candidate == ancestor {
                return true;
            }
            current = self.parent(candidate);
        }
        false
    }

    /// Position of `node` among its parent's children.
    ///
    /// Returns `None` for the root, and for a node its parent does not list
    /// (a malformed tree).
    fn index_in_parent(&self, node: Self::Node) -> Option<usize> {
        let parent = self.parent(node)?;
        self.children(parent).iter().position(|child| *child == node)
    }
}
