//! Hierarchical aggregation of edits to ordered trees.
//!
//! An edit transaction reports elementary changes one node at a time; the
//! [`ChangeAggregator`] compacts them into the coarsest set of ancestor anchors
//! that describes the transaction, enumerated in tree position order.
//!
//! ```
//! use tree_change_aggregator::{ArenaTree, ChangeAggregator, ChangeKind, ChangeRecord};
//!
//! let mut tree = ArenaTree::new("R", 0);
//! let a = tree.add_child(tree.root(), "A", 0);
//! let a1 = tree.add_child(a, "A1", 3);
//!
//! let mut changes = ChangeAggregator::new(tree.root());
//! let record = ChangeRecord::create(ChangeKind::ContentsChanged, a1, &tree, None);
//! changes.record_edit(&tree, a1, record).unwrap();
//!
//! assert_eq!(changes.changed_anchors_in_order(), &[a]);
//! ```

pub mod aggregator;
pub mod change;
pub mod config;
pub mod error;
pub mod replay;
pub mod tree;

pub use aggregator::{ChangeAggregator, ChangeListener, ChangeSummary, Route};
pub use change::{ChangeKind, ChangeRecord, ContextTable, NodeChangeSet};
pub use config::AggregatorSettings;
pub use error::{AggregatorError, AggregatorResult};
pub use tree::{ArenaTree, NodeId, TreeNavigation};
