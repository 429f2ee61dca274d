//! Error handling types for tree-change-aggregator
//!
//! Normal aggregation never fails: duplicate reports are reconciled and reads
//! after `clear` are empty. Errors surface only for malformed trees, opt-in
//! invariant checks, and the configuration/replay tooling.

use thiserror::Error;

/// Comprehensive error type for aggregation operations
#[derive(Debug, Error)]
pub enum AggregatorError {
    /// A node could not be located among its parent's children
    #[error("Malformed tree: node {node} is not a child of its parent")]
    MalformedTree { node: String },

    /// A structural invariant failed after a mutation (only with `check_invariants`)
    #[error("Invariant violated: {message}")]
    InvariantViolation { message: String },

    /// Configuration error
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// Replay script could not be interpreted
    #[error("Invalid replay script: {message}")]
    Script { message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for aggregation operations
pub type AggregatorResult<T> = Result<T, AggregatorError>;

/// Helper functions for common error patterns
impl AggregatorError {
    /// Create a malformed tree error for the given node handle
    pub fn malformed_tree(node: impl std::fmt::Debug) -> Self {
        AggregatorError::MalformedTree {
            node: format!("{node:?}"),
        }
    }

    /// Create an invariant violation error
    pub fn invariant(message: impl Into<String>) -> Self {
        AggregatorError::InvariantViolation {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        AggregatorError::Config {
            message: message.into(),
        }
    }

    /// Create a replay script error
    pub fn script(message: impl Into<String>) -> Self {
        AggregatorError::Script {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_tree_message_uses_debug_form_of_node() {
        let err = AggregatorError::malformed_tree(42usize);
        assert_eq!(
            err.to_string(),
            "Malformed tree: node 42 is not a child of its parent"
        );
    }

    #[test]
    fn io_errors_convert_with_question_mark() {
        fn read() -> AggregatorResult<()> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"))?;
            Ok(())
        }

        assert!(matches!(read(), Err(AggregatorError::Io(_))));
    }
}
