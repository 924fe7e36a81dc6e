//! Error types for the diff crate.

use std::fmt;

use strata_store::StoreError;
use strata_types::NodePath;

/// Which of the two compared trees a path belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    A,
    B,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => write!(f, "a"),
            Self::B => write!(f, "b"),
        }
    }
}

/// Errors that can occur during traversal, matching or comparison.
///
/// All of them are terminal for the call that raised them: nothing is
/// retried and nothing is reported as "changed" instead.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// A traversal root or an explicitly named path does not exist.
    #[error("path not found: {0}")]
    NotFound(NodePath),

    /// A literal rename pair names a path absent from its side.
    #[error("renamed path {path} is not present in tree {side}")]
    MissingPath { path: String, side: Side },

    /// A group was compared against a dataset.
    #[error("cannot compare {path_a} with {path_b}: not both datasets")]
    InvalidComparison { path_a: NodePath, path_b: NodePath },

    /// The store could not materialize attributes or a body.
    #[error("read failure: {0}")]
    ReadFailure(#[from] StoreError),

    /// A rename pattern is not a valid regular expression.
    #[error("invalid rename pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
