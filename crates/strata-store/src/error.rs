use strata_types::NodePath;

/// Errors from tree store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested node does not exist.
    #[error("node not found: {0}")]
    NotFound(NodePath),

    /// A group was required but the node is a dataset.
    #[error("not a group: {0}")]
    NotAGroup(NodePath),

    /// A dataset was required but the node is a group.
    #[error("not a dataset: {0}")]
    NotADataset(NodePath),

    /// A write would break the tree invariants.
    #[error("conflict at {path}: {reason}")]
    Conflict { path: NodePath, reason: String },

    /// The backend could not materialize attributes or a body.
    #[error("failed to read {path}: {reason}")]
    Read { path: NodePath, reason: String },

    /// Document serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
