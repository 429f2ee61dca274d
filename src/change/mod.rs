//! Change values: per-child records and the per-anchor sets that hold them.

mod record;
mod set;

pub use record::{ChangeKind, ChangeRecord, ContextTable};
pub use set::NodeChangeSet;
