use strata_types::{Attributes, DatasetMeta, NodeKind, NodePath, Value};

use crate::error::{StoreError, StoreResult};

/// Read access to a hierarchical, path-addressed store.
///
/// All implementations must satisfy these invariants:
/// - Every non-root node's parent exists and is a group.
/// - `list_children` returns children ordered by name, each name once.
/// - Reads never mutate the store.
/// - All I/O errors are propagated, never silently ignored.
pub trait TreeStore: Send + Sync {
    /// Kind of the node at `path`, or `Ok(None)` if it does not exist.
    fn node_kind(&self, path: &NodePath) -> StoreResult<Option<NodeKind>>;

    /// Direct children of the group at `path`, ordered by name.
    ///
    /// Returns `NotFound` if the node does not exist and `NotAGroup` if it
    /// is a dataset.
    fn list_children(&self, path: &NodePath) -> StoreResult<Vec<(String, NodeKind)>>;

    /// Attributes of the node at `path`.
    fn read_attributes(&self, path: &NodePath) -> StoreResult<Attributes>;

    /// Fully materialized body of the dataset at `path`.
    fn read_dataset_body(&self, path: &NodePath) -> StoreResult<Value>;

    /// Check whether a node exists.
    fn exists(&self, path: &NodePath) -> StoreResult<bool> {
        Ok(self.node_kind(path)?.is_some())
    }

    /// Dtype and shape of the dataset at `path`.
    ///
    /// Default implementation reads the body. Backends that keep metadata
    /// apart from the data should override this.
    fn dataset_meta(&self, path: &NodePath) -> StoreResult<DatasetMeta> {
        Ok(self.read_dataset_body(path)?.meta())
    }

    /// Kind of the node at `path`, or `NotFound`.
    fn require_kind(&self, path: &NodePath) -> StoreResult<NodeKind> {
        self.node_kind(path)?
            .ok_or_else(|| StoreError::NotFound(path.clone()))
    }
}
