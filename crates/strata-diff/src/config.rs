use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strata_types::NodePath;

/// Marker appended to a folded group's path.
pub const DEFAULT_FOLD_SYMBOL: &str = "/...";

/// Which groups a traversal stops at.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoldSpec {
    /// Groups this many levels (or more) below the root are folded.
    pub max_depth: Option<usize>,
    /// Groups folded regardless of depth. Paths not below the traversal root
    /// are taken relative to it.
    pub fold_paths: BTreeSet<NodePath>,
    /// Suffix marking a folded group.
    pub fold_symbol: String,
}

impl Default for FoldSpec {
    fn default() -> Self {
        Self {
            max_depth: None,
            fold_paths: BTreeSet::new(),
            fold_symbol: DEFAULT_FOLD_SYMBOL.to_string(),
        }
    }
}

impl FoldSpec {
    /// A spec that folds nothing.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn fold(mut self, path: impl Into<NodePath>) -> Self {
        self.fold_paths.insert(path.into());
        self
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.fold_symbol = symbol.into();
        self
    }

    /// Returns `true` if no group would ever be folded.
    pub fn is_noop(&self) -> bool {
        self.max_depth.is_none() && self.fold_paths.is_empty()
    }
}

/// How two nodes are judged equal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareOptions {
    /// Compare attributes (key sets, and values unless `shallow`).
    pub compare_attrs: bool,
    /// Element types must match exactly, for bodies and attributes.
    pub require_matching_dtype: bool,
    /// Check presence and structure only, never values.
    pub shallow: bool,
    /// Allow closeness instead of exact equality for integers and for
    /// integer/float pairs.
    pub tolerant: bool,
    /// Absolute tolerance of the closeness test.
    pub atol: f64,
    /// Relative tolerance of the closeness test.
    pub rtol: f64,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            compare_attrs: true,
            require_matching_dtype: false,
            shallow: false,
            tolerant: false,
            atol: 1e-8,
            rtol: 1e-5,
        }
    }
}

impl CompareOptions {
    /// Presence and structure only.
    pub fn shallow() -> Self {
        Self {
            shallow: true,
            ..Default::default()
        }
    }

    /// Exact dtypes on top of the defaults.
    pub fn strict() -> Self {
        Self {
            require_matching_dtype: true,
            ..Default::default()
        }
    }
}

/// Everything a tree diff needs besides the two stores.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffOptions {
    /// Where both traversals start.
    pub root: NodePath,
    /// Folding applied identically to both trees.
    pub fold: FoldSpec,
    /// Node equality rules.
    pub compare: CompareOptions,
    /// Leave groups out even when they carry attributes.
    pub only_datasets: bool,
}
