//! Tree diff: traverse both trees, match their paths, compare the pairs.
//!
//! Every selected path of either tree ends up in exactly one category of the
//! [`TreeDiff`]. Fold markers are never value-compared: a marker present in
//! both trees is reported as `folded`, a marker on one side only as
//! `added` or `removed`. Renamed pairs are compared like common paths but
//! reported separately, once per side, as [`RenamedDiff`]s.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strata_store::TreeStore;
use strata_types::NodePath;
use tracing::{debug, info};

use crate::compare::nodes_equal;
use crate::config::{CompareOptions, DiffOptions};
use crate::error::{DiffError, DiffResult};
use crate::fold::{traverse_with, FoldedPathList, PathEntry, TraverseOptions};
use crate::matcher::{match_paths, MatchedPaths, RenameMap};

/// Categorized outcome of comparing two trees.
///
/// All sets hold rendered paths and are pairwise disjoint. `added` holds
/// paths only in B, `removed` paths only in A.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeDiff {
    pub added: BTreeSet<String>,
    pub removed: BTreeSet<String>,
    pub changed: BTreeSet<String>,
    pub unchanged: BTreeSet<String>,
    /// Fold markers present in both trees; their content was not compared.
    pub folded: BTreeSet<String>,
}

impl TreeDiff {
    /// Create an empty diff.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if nothing was added, removed or changed.
    pub fn is_identical(&self) -> bool {
        self.differences() == 0
    }

    /// Number of added, removed and changed paths.
    pub fn differences(&self) -> usize {
        self.added.len() + self.removed.len() + self.changed.len()
    }

    /// Number of paths in all categories.
    pub fn total(&self) -> usize {
        self.differences() + self.unchanged.len() + self.folded.len()
    }
}

/// Outcome of the renamed pairs, seen from one tree.
///
/// Entries keep pair order, so the A-side and B-side results of one diff
/// line up index by index.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenamedDiff {
    pub changed: Vec<String>,
    pub unchanged: Vec<String>,
}

impl RenamedDiff {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.unchanged.is_empty()
    }
}

/// Diff two trees below `options.root`.
pub fn diff(a: &dyn TreeStore, b: &dyn TreeStore, options: &DiffOptions) -> DiffResult<TreeDiff> {
    let list_a = index(a, options)?;
    let list_b = index(b, options)?;
    let matched = match_paths(&list_a, &list_b, None)?;
    let (diff, _, _) = compare_matched(a, b, &list_a, &list_b, &matched, &options.compare)?;
    Ok(diff)
}

/// Diff two trees, pairing paths related by `rename` first.
///
/// Returns the diff of the unrenamed paths and the outcome of the renamed
/// pairs from the A and the B side. A literal pair naming a missing path
/// fails before anything is compared.
pub fn diff_with_rename(
    a: &dyn TreeStore,
    b: &dyn TreeStore,
    rename: &RenameMap,
    options: &DiffOptions,
) -> DiffResult<(TreeDiff, RenamedDiff, RenamedDiff)> {
    let list_a = index(a, options)?;
    let list_b = index(b, options)?;
    let matched = match_paths(&list_a, &list_b, Some(rename))?;
    compare_matched(a, b, &list_a, &list_b, &matched, &options.compare)
}

/// Diff caller-chosen paths instead of traversing the trees.
///
/// Every listed path must exist in its store. `options.root` and
/// `options.fold` are not used.
pub fn diff_paths(
    a: &dyn TreeStore,
    b: &dyn TreeStore,
    paths_a: &[NodePath],
    paths_b: &[NodePath],
    options: &DiffOptions,
) -> DiffResult<TreeDiff> {
    for (store, paths) in [(a, paths_a), (b, paths_b)] {
        for path in paths {
            if !store.exists(path)? {
                return Err(DiffError::NotFound(path.clone()));
            }
        }
    }

    let symbol = options.fold.fold_symbol.as_str();
    let list_a = FoldedPathList::from_paths(paths_a.iter().cloned(), symbol);
    let list_b = FoldedPathList::from_paths(paths_b.iter().cloned(), symbol);
    let matched = match_paths(&list_a, &list_b, None)?;
    let (diff, _, _) = compare_matched(a, b, &list_a, &list_b, &matched, &options.compare)?;
    Ok(diff)
}

fn index(store: &dyn TreeStore, options: &DiffOptions) -> DiffResult<FoldedPathList> {
    let traverse_options = TraverseOptions {
        include_attributed_groups: !options.only_datasets && options.compare.compare_attrs,
    };
    traverse_with(store, &options.root, &options.fold, traverse_options)
}

fn compare_matched(
    a: &dyn TreeStore,
    b: &dyn TreeStore,
    list_a: &FoldedPathList,
    list_b: &FoldedPathList,
    matched: &MatchedPaths,
    options: &CompareOptions,
) -> DiffResult<(TreeDiff, RenamedDiff, RenamedDiff)> {
    let mut diff = TreeDiff::new();
    let mut renamed_a = RenamedDiff::default();
    let mut renamed_b = RenamedDiff::default();

    diff.removed
        .extend(matched.only_a.iter().map(|e| list_a.render(e)));
    diff.added
        .extend(matched.only_b.iter().map(|e| list_b.render(e)));

    for entry in &matched.common {
        let rendered = list_a.render(entry);
        match entry {
            PathEntry::Folded(_) => {
                diff.folded.insert(rendered);
            }
            PathEntry::Node(path) => {
                if nodes_equal(a, path, b, path, options)? {
                    diff.unchanged.insert(rendered);
                } else {
                    debug!(path = %rendered, "changed");
                    diff.changed.insert(rendered);
                }
            }
        }
    }

    for (entry_a, entry_b) in &matched.renamed {
        let rendered_a = list_a.render(entry_a);
        let rendered_b = list_b.render(entry_b);
        match (entry_a, entry_b) {
            (PathEntry::Node(path_a), PathEntry::Node(path_b)) => {
                if nodes_equal(a, path_a, b, path_b, options)? {
                    renamed_a.unchanged.push(rendered_a);
                    renamed_b.unchanged.push(rendered_b);
                } else {
                    debug!(a = %rendered_a, b = %rendered_b, "renamed pair changed");
                    renamed_a.changed.push(rendered_a);
                    renamed_b.changed.push(rendered_b);
                }
            }
            _ => {
                diff.folded.insert(rendered_a);
            }
        }
    }

    info!(
        added = diff.added.len(),
        removed = diff.removed.len(),
        changed = diff.changed.len(),
        unchanged = diff.unchanged.len(),
        folded = diff.folded.len(),
        renamed = matched.renamed.len(),
        "diff complete"
    );
    Ok((diff, renamed_a, renamed_b))
}
