//! Structural diff for hierarchical group/dataset stores.
//!
//! Compares two trees held in any [`TreeStore`](strata_store::TreeStore)
//! and sorts every path into added, removed, changed, unchanged or folded.
//!
//! # Pipeline
//!
//! 1. [`traverse`] lists the paths of each tree, replacing folded groups by
//!    a single marker.
//! 2. [`match_paths`] pairs the two lists directly and through a
//!    [`RenameMap`].
//! 3. [`nodes_equal`] compares each pair: attributes, structure, then
//!    values, with float closeness controlled by [`CompareOptions`].
//! 4. [`diff`] / [`diff_with_rename`] run the whole pipeline and return a
//!    [`TreeDiff`].
//!
//! # Key Types
//!
//! - [`FoldSpec`] / [`FoldedPathList`] / [`PathEntry`] -- Folded traversal
//! - [`RenameMap`] / [`MatchedPaths`] -- Rename-aware path matching
//! - [`CompareOptions`] -- Node equality rules
//! - [`TreeDiff`] / [`RenamedDiff`] -- Categorized diff output

pub mod compare;
pub mod config;
pub mod engine;
pub mod error;
pub mod fold;
pub mod matcher;

pub use compare::{all_equal, equal, is_close, nodes_equal, values_equal};
pub use config::{CompareOptions, DiffOptions, FoldSpec, DEFAULT_FOLD_SYMBOL};
pub use engine::{diff, diff_paths, diff_with_rename, RenamedDiff, TreeDiff};
pub use error::{DiffError, DiffResult, Side};
pub use fold::{traverse, traverse_with, FoldedPathList, PathEntry, TraverseOptions};
pub use matcher::{match_paths, MatchedPaths, RenameMap, RenameRule};
