//! Arena snapshots of Tree-sitter syntax trees.

use super::{ArenaTree, NodeId};
use tree_sitter::Tree;

impl ArenaTree {
    /// Mirror a parsed syntax tree into an arena, one arena node per syntax
    /// node (named and anonymous), preserving sibling order.
    ///
    /// Each arena node is labelled with the syntax node's kind. Bytes not
    /// covered by any child (whitespace, the node's own token) become the arena
    /// node's own length, so every arena extent equals the syntax node's byte
    /// length.
    pub fn from_syntax_tree(tree: &Tree) -> Self {
        let root_node = tree.root_node();
        let mut arena = ArenaTree::new(root_node.kind(), 0);
        let mut cursor = tree.walk();

        // Parallel stack of arena ids for the cursor's current ancestry.
        let mut ids: Vec<NodeId> = vec![arena.root()];
        let mut covered: Vec<usize> = vec![0];

        loop {
            if cursor.goto_first_child() {
                let node = cursor.node();
                let parent = *ids.last().unwrap_or(&arena.root());
                let id = arena.add_child(parent, node.kind(), 0);
                ids.push(id);
                covered.push(0);
                continue;
            }

            // Leaf, or finished with a subtree: settle lengths and move on.
            loop {
                let node = cursor.node();
                let child_bytes = covered.pop().unwrap_or(0);
                let id = ids.pop().unwrap_or(arena.root());
                let byte_len = node.byte_range().len();
                arena.set_own_len(id, byte_len.saturating_sub(child_bytes));
                if let Some(parent_covered) = covered.last_mut() {
                    *parent_covered += byte_len;
                }

                if cursor.goto_next_sibling() {
                    let sibling = cursor.node();
                    let parent = *ids.last().unwrap_or(&arena.root());
                    let id = arena.add_child(parent, sibling.kind(), 0);
                    ids.push(id);
                    covered.push(0);
                    break;
                }
                if !cursor.goto_parent() {
                    return arena;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TreeNavigation;
    use tree_sitter::Parser;

    fn parse_query(source: &str) -> Tree {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_tsquery::LANGUAGE.into())
            .expect("load tsquery grammar");
        parser.parse(source, None).expect("parse query")
    }

    /// Collect (kind, byte length) pairs in preorder from the syntax tree.
    fn syntax_preorder(tree: &Tree) -> Vec<(String, usize)> {
        let mut out = Vec::new();
        let mut stack = vec![tree.root_node()];
        while let Some(node) = stack.pop() {
            out.push((node.kind().to_string(), node.byte_range().len()));
            let mut cursor = node.walk();
            let children: Vec<_> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
        out
    }

    fn arena_preorder(arena: &ArenaTree) -> Vec<(String, usize)> {
        let mut out = Vec::new();
        let mut stack = vec![arena.root()];
        while let Some(node) = stack.pop() {
            out.push((arena.node_kind(node).to_string(), arena.text_len(node)));
            stack.extend(arena.children(node).into_iter().rev());
        }
        out
    }

    #[test]
    fn snapshot_mirrors_kinds_order_and_extents() {
        let tree = parse_query("(identifier) @variable\n(string) @string\n");
        let arena = ArenaTree::from_syntax_tree(&tree);

        assert_eq!(arena_preorder(&arena), syntax_preorder(&tree));
        assert_eq!(arena.node_kind(arena.root()), tree.root_node().kind());
    }

    #[test]
    fn snapshot_of_single_pattern_has_nested_structure() {
        let tree = parse_query("(identifier) @variable");
        let arena = ArenaTree::from_syntax_tree(&tree);

        let root = arena.root();
        assert!(!arena.children(root).is_empty());
        assert!(arena.len() > 2);
        assert_eq!(arena.text_len(root), tree.root_node().byte_range().len());
    }
}
