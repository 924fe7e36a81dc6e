use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dtype::DType;
use crate::value::Shape;

/// The two kinds of node in a hierarchical store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Container node: children and attributes, no body.
    Group,
    /// Leaf node with a typed body and optional attributes.
    Dataset,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Group => write!(f, "group"),
            Self::Dataset => write!(f, "dataset"),
        }
    }
}

/// Structural description of a dataset body, available without reading it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetMeta {
    pub dtype: DType,
    pub shape: Shape,
}

impl DatasetMeta {
    /// Number of elements in the body.
    pub fn size(&self) -> usize {
        self.shape.size()
    }
}
