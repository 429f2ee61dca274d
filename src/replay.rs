//! Replay of scripted edit transactions.
//!
//! A script describes an initial tree and a list of edits in TOML:
//!
//! ```toml
//! [tree]
//! root = "R"
//! nodes = [
//!   { name = "A", parent = "R" },
//!   { name = "A1", parent = "A", len = 2 },
//! ]
//!
//! [[edit]]
//! node = "A1"
//! kind = "contents-changed"
//! len = 5
//! ```
//!
//! Edits are applied the way a host reports them: contents changes and
//! replacements capture the old extent, apply the new `len`, then report;
//! additions attach the node under `parent` (at `index`, default last) and
//! report; removals report while still attached, then detach.

use crate::aggregator::{ChangeAggregator, ChangeSummary};
use crate::change::{ChangeKind, ChangeRecord};
use crate::config::AggregatorSettings;
use crate::error::{AggregatorError, AggregatorResult};
use crate::tree::{ArenaTree, NodeId};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct ReplayScript {
    pub tree: TreeSpec,
    #[serde(default, rename = "edit")]
    pub edits: Vec<EditSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TreeSpec {
    pub root: String,
    #[serde(default)]
    pub root_len: usize,
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeSpec {
    pub name: String,
    pub parent: String,
    #[serde(default)]
    pub len: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EditSpec {
    pub node: String,
    pub kind: ChangeKind,
    /// New own length (contents changes, replacements, additions).
    pub len: Option<usize>,
    /// Parent to attach under (additions only).
    pub parent: Option<String>,
    /// Sibling index to attach at (additions only).
    pub index: Option<usize>,
}

impl ReplayScript {
    pub fn from_toml_str(contents: &str) -> AggregatorResult<Self> {
        toml::from_str(contents).map_err(|err| AggregatorError::script(err.to_string()))
    }

    pub fn load(path: &Path) -> AggregatorResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|err| AggregatorError::script(format!("{}: {}", path.display(), err)))
    }
}

/// Outcome of a replayed transaction.
pub struct Replay {
    pub tree: ArenaTree,
    pub changes: ChangeAggregator<NodeId>,
}

impl Replay {
    pub fn summary(&self) -> ChangeSummary {
        self.changes
            .summary(&self.tree, |node| self.tree.node_kind(node).to_string())
    }
}

struct Names(HashMap<String, NodeId>);

impl Names {
    fn get(&self, name: &str) -> AggregatorResult<NodeId> {
        self.0
            .get(name)
            .copied()
            .ok_or_else(|| AggregatorError::script(format!("unknown node '{name}'")))
    }

    fn claim(&mut self, name: &str, id: NodeId) -> AggregatorResult<()> {
        if self.0.insert(name.to_string(), id).is_some() {
            return Err(AggregatorError::script(format!("duplicate node '{name}'")));
        }
        Ok(())
    }
}

fn build_tree(shape: &TreeSpec) -> AggregatorResult<(ArenaTree, Names)> {
    let mut tree = ArenaTree::new(shape.root.as_str(), shape.root_len);
    let mut names = Names(HashMap::new());
    names.claim(&shape.root, tree.root())?;
    for node in &shape.nodes {
        let parent = names.get(&node.parent)?;
        let id = tree.add_child(parent, node.name.as_str(), node.len);
        names.claim(&node.name, id)?;
    }
    Ok((tree, names))
}

/// Build the script's tree and run its edits through a fresh aggregator.
pub fn replay(script: &ReplayScript, settings: AggregatorSettings) -> AggregatorResult<Replay> {
    let (mut tree, mut names) = build_tree(&script.tree)?;
    let mut changes = ChangeAggregator::with_settings(tree.root(), settings);

    for (step, edit) in script.edits.iter().enumerate() {
        log::debug!(
            target: "tree_change_aggregator::replay",
            "Step {}: {} {}",
            step,
            edit.kind,
            edit.node
        );
        match edit.kind {
            ChangeKind::ContentsChanged | ChangeKind::Replaced => {
                let node = names.get(&edit.node)?;
                let record = ChangeRecord::create(edit.kind, node, &tree, None);
                if let Some(len) = edit.len {
                    tree.set_own_len(node, len);
                }
                changes.record_edit(&tree, node, record)?;
            }
            ChangeKind::Added => {
                let parent_name = edit.parent.as_deref().ok_or_else(|| {
                    AggregatorError::script(format!("added node '{}' needs a parent", edit.node))
                })?;
                let parent = names.get(parent_name)?;
                let len = edit.len.unwrap_or(0);
                let node = match edit.index {
                    Some(index) => tree.insert_child(parent, index, edit.node.as_str(), len),
                    None => tree.add_child(parent, edit.node.as_str(), len),
                };
                names.claim(&edit.node, node)?;
                let record = ChangeRecord::create(ChangeKind::Added, node, &tree, None);
                changes.record_edit(&tree, node, record)?;
            }
            ChangeKind::Removed => {
                let node = names.get(&edit.node)?;
                let record = ChangeRecord::create(ChangeKind::Removed, node, &tree, None);
                changes.record_edit(&tree, node, record)?;
                tree.detach(node);
            }
        }
    }

    Ok(Replay { tree, changes })
}
