//! Arena-backed ordered tree.
//!
//! Nodes live in a flat vector and are addressed by [`NodeId`]. Every node
//! carries a kind label and the length of the content it contributes itself;
//! its extent is that length plus the extents of its children, so attaching or
//! detaching a subtree changes the extent of every ancestor.

use super::TreeNavigation;

/// Handle to a node in an [`ArenaTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct ArenaNode {
    kind: String,
    own_len: usize,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct ArenaTree {
    nodes: Vec<ArenaNode>,
    root: NodeId,
}

impl ArenaTree {
    /// Create a tree holding only a root node.
    pub fn new(root_kind: impl Into<String>, own_len: usize) -> Self {
        Self {
            nodes: vec![ArenaNode {
                kind: root_kind.into(),
                own_len,
                parent: None,
                children: Vec::new(),
            }],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Append a new last child to `parent`.
    pub fn add_child(&mut self, parent: NodeId, kind: impl Into<String>, own_len: usize) -> NodeId {
        let index = self.nodes[parent.0].children.len();
        self.insert_child(parent, index, kind, own_len)
    }

    /// Insert a new child at `index` among `parent`'s children.
    ///
    /// An index past the end appends.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        kind: impl Into<String>,
        own_len: usize,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(ArenaNode {
            kind: kind.into(),
            own_len,
            parent: Some(parent),
            children: Vec::new(),
        });
        let siblings = &mut self.nodes[parent.0].children;
        let index = index.min(siblings.len());
        siblings.insert(index, id);
        id
    }

    /// Unlink `node` from its parent. The subtree stays in the arena so its
    /// extent remains queryable.
    ///
    /// Returns the index the node occupied, or `None` if it was already detached.
    pub fn detach(&mut self, node: NodeId) -> Option<usize> {
        let parent = self.nodes[node.0].parent.take()?;
        let siblings = &mut self.nodes[parent.0].children;
        let index = siblings.iter().position(|child| *child == node)?;
        siblings.remove(index);
        Some(index)
    }

    /// Change the content length `node` contributes itself.
    pub fn set_own_len(&mut self, node: NodeId, own_len: usize) {
        self.nodes[node.0].own_len = own_len;
    }

    pub fn node_kind(&self, node: NodeId) -> &str {
        &self.nodes[node.0].kind
    }

    /// First node (in creation order) with the given kind label.
    pub fn find(&self, kind: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|node| node.kind == kind)
            .map(NodeId)
    }

    /// Number of nodes ever created, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `node` is reachable from the root.
    pub fn is_attached(&self, node: NodeId) -> bool {
        node == self.root || self.is_proper_ancestor(self.root, node)
    }
}

impl TreeNavigation for ArenaTree {
    type Node = NodeId;

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes[node.0].children.clone()
    }

    fn text_len(&self, node: NodeId) -> usize {
        let mut total = 0;
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            let entry = &self.nodes[current.0];
            total += entry.own_len;
            stack.extend(entry.children.iter().copied());
        }
        total
    }

    fn index_in_parent(&self, node: NodeId) -> Option<usize> {
        let parent = self.nodes[node.0].parent?;
        self.nodes[parent.0]
            .children
            .iter()
            .position(|child| *child == node)
    }
}
