//! Readability pre-check for datasets.
//!
//! The diff engine treats any read failure as terminal. Callers that want a
//! best-effort diff over a partially unreadable store run this pass first and
//! hand only the readable paths to the engine.

use strata_types::NodePath;
use tracing::warn;

use crate::error::StoreError;
use crate::traits::TreeStore;

/// Outcome of [`verify_readable`].
#[derive(Debug, Default)]
pub struct Verification {
    /// Paths whose body could be materialized.
    pub readable: Vec<NodePath>,
    /// Paths that failed, with the error that stopped them.
    pub unreadable: Vec<(NodePath, StoreError)>,
}

impl Verification {
    /// Returns `true` if every path could be read.
    pub fn is_complete(&self) -> bool {
        self.unreadable.is_empty()
    }
}

/// Try reading the body of each dataset in `paths`.
pub fn verify_readable<S: TreeStore + ?Sized>(store: &S, paths: &[NodePath]) -> Verification {
    let mut report = Verification::default();
    for path in paths {
        match store.read_dataset_body(path) {
            Ok(_) => report.readable.push(path.clone()),
            Err(e) => {
                warn!(path = %path, error = %e, "dataset could not be read");
                report.unreadable.push((path.clone(), e));
            }
        }
    }
    report
}
