//! Error types for tree operations
//!
//! Simple, flat error hierarchy. Every variant is raised synchronously by the
//! call that breaks the contract; nothing here is transient or retryable.

use thiserror::Error;

use crate::types::NodeId;

pub type Result<T> = std::result::Result<T, TreeError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Invalid node type: expected {expected}, got {actual}")]
    InvalidNodeType {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Attributes modified outside the iterator; use the cursor's remove() while iterating")]
    ConcurrentModification,
}

impl TreeError {
    pub(crate) fn precondition(msg: impl Into<String>) -> Self {
        TreeError::Precondition(msg.into())
    }

    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        TreeError::InvalidArgument(msg.into())
    }
}
