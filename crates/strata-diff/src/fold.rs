//! Folded traversal: list the addressable paths of one tree.
//!
//! Walks a tree depth-first from a root and emits every dataset. A group
//! that the [`FoldSpec`] folds is emitted once as a marker (its path plus
//! the fold symbol) and not descended into; this holds for empty groups too.
//! The walk uses an explicit stack, so tree depth is bounded by memory only.

use std::collections::{BTreeSet, HashSet};

use strata_store::TreeStore;
use strata_types::{NodeKind, NodePath};
use tracing::debug;

use crate::config::FoldSpec;
use crate::error::{DiffError, DiffResult};

/// One entry of a [`FoldedPathList`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathEntry {
    /// A dataset, or a group listed for its attributes.
    Node(NodePath),
    /// A group that was not descended into.
    Folded(NodePath),
}

impl PathEntry {
    /// The underlying node path.
    pub fn path(&self) -> &NodePath {
        match self {
            Self::Node(p) | Self::Folded(p) => p,
        }
    }

    pub fn is_folded(&self) -> bool {
        matches!(self, Self::Folded(_))
    }

    /// String form: the path itself, or the path followed by `fold_symbol`.
    pub fn render(&self, fold_symbol: &str) -> String {
        match self {
            Self::Node(p) => p.to_string(),
            Self::Folded(p) => {
                format!("{}{}", p.as_str().trim_end_matches('/'), fold_symbol)
            }
        }
    }
}

/// Deduplicated, traversal-ordered paths of one tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FoldedPathList {
    entries: Vec<PathEntry>,
    fold_symbol: String,
}

impl FoldedPathList {
    /// Build a list from explicit node paths, dropping duplicates.
    pub fn from_paths<I>(paths: I, fold_symbol: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = NodePath>,
    {
        let mut list = Self {
            entries: Vec::new(),
            fold_symbol: fold_symbol.into(),
        };
        let mut seen = HashSet::new();
        for path in paths {
            list.push(&mut seen, PathEntry::Node(path));
        }
        list
    }

    fn push(&mut self, seen: &mut HashSet<PathEntry>, entry: PathEntry) {
        if seen.insert(entry.clone()) {
            self.entries.push(entry);
        }
    }

    pub fn entries(&self) -> &[PathEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn fold_symbol(&self) -> &str {
        &self.fold_symbol
    }

    pub fn contains(&self, entry: &PathEntry) -> bool {
        self.entries.contains(entry)
    }

    /// String form of `entry` using this list's fold symbol.
    pub fn render(&self, entry: &PathEntry) -> String {
        entry.render(&self.fold_symbol)
    }

    /// String form of every entry, in traversal order.
    pub fn rendered(&self) -> Vec<String> {
        self.entries.iter().map(|e| self.render(e)).collect()
    }

    /// Paths of the entries that are not folded.
    pub fn node_paths(&self) -> impl Iterator<Item = &NodePath> {
        self.entries.iter().filter_map(|e| match e {
            PathEntry::Node(p) => Some(p),
            PathEntry::Folded(_) => None,
        })
    }

    /// Paths of the folded groups.
    pub fn folded_paths(&self) -> impl Iterator<Item = &NodePath> {
        self.entries.iter().filter_map(|e| match e {
            PathEntry::Folded(p) => Some(p),
            PathEntry::Node(_) => None,
        })
    }

    /// Keep only the entries that are datasets in `store`.
    pub fn datasets(&self, store: &dyn TreeStore) -> DiffResult<Vec<NodePath>> {
        let mut out = Vec::new();
        for path in self.node_paths() {
            if store.node_kind(path)? == Some(NodeKind::Dataset) {
                out.push(path.clone());
            }
        }
        Ok(out)
    }
}

impl<'a> IntoIterator for &'a FoldedPathList {
    type Item = &'a PathEntry;
    type IntoIter = std::slice::Iter<'a, PathEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Extra selection rules for [`traverse_with`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TraverseOptions {
    /// Also list unfolded groups (other than the root) that carry at least
    /// one attribute.
    pub include_attributed_groups: bool,
}

/// List the datasets below `root`, folding groups as `spec` asks.
pub fn traverse(
    store: &dyn TreeStore,
    root: &NodePath,
    spec: &FoldSpec,
) -> DiffResult<FoldedPathList> {
    traverse_with(store, root, spec, TraverseOptions::default())
}

/// [`traverse`] with extra selection rules.
///
/// Depth is counted in components below `root`. A group is folded when its
/// depth reaches `spec.max_depth` or when it is one of `spec.fold_paths`;
/// when both apply the marker is still emitted once. If `root` is itself a
/// dataset it is the only entry.
pub fn traverse_with(
    store: &dyn TreeStore,
    root: &NodePath,
    spec: &FoldSpec,
    options: TraverseOptions,
) -> DiffResult<FoldedPathList> {
    let root_kind = store
        .node_kind(root)?
        .ok_or_else(|| DiffError::NotFound(root.clone()))?;

    let fold_paths: BTreeSet<NodePath> = spec
        .fold_paths
        .iter()
        .map(|f| {
            if f.starts_with(root) {
                f.clone()
            } else {
                root.join(f.as_str())
            }
        })
        .collect();

    let is_folded = |path: &NodePath| {
        let depth = path.depth_below(root).unwrap_or(0);
        spec.max_depth.is_some_and(|max| depth >= max) || fold_paths.contains(path)
    };

    let mut list = FoldedPathList {
        entries: Vec::new(),
        fold_symbol: spec.fold_symbol.clone(),
    };
    let mut seen = HashSet::new();

    let mut stack: Vec<(NodePath, NodeKind)> = vec![(root.clone(), root_kind)];
    while let Some((path, kind)) = stack.pop() {
        match kind {
            NodeKind::Dataset => list.push(&mut seen, PathEntry::Node(path)),
            NodeKind::Group if is_folded(&path) => {
                list.push(&mut seen, PathEntry::Folded(path));
            }
            NodeKind::Group => {
                if options.include_attributed_groups
                    && path != *root
                    && !store.read_attributes(&path)?.is_empty()
                {
                    list.push(&mut seen, PathEntry::Node(path.clone()));
                }
                let children = store.list_children(&path)?;
                // Reversed so the first child is popped first.
                stack.extend(
                    children
                        .into_iter()
                        .rev()
                        .map(|(name, kind)| (path.join(&name), kind)),
                );
            }
        }
    }

    debug!(root = %root, entries = list.len(), "traversal complete");
    Ok(list)
}
