//! Pair up the paths of two traversals.
//!
//! Paths present in both lists match directly. A [`RenameMap`] adds pairs
//! whose paths differ: literal pairs must exist on both sides, pattern pairs
//! rewrite every matching A-path and keep the rewrite only if B has it.
//! Whatever is left over is exclusive to one side.

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;
use serde::{Deserialize, Serialize};
use strata_types::NodePath;
use tracing::debug;

use crate::error::{DiffError, DiffResult, Side};
use crate::fold::{FoldedPathList, PathEntry};

/// One declared correspondence between tree A and tree B.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RenameRule {
    /// `from` in A is `to` in B. Both must be present.
    Literal { from: String, to: String },
    /// Every A-path starting with a match of the regex `from` corresponds to
    /// the B-path `to` followed by the rest of the A-path. `to` may refer to
    /// groups of `from` as `$1` or `${name}`; write `$$` for a literal `$`.
    Pattern { from: String, to: String },
}

/// Ordered rename rules, applied first to last.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RenameMap {
    rules: Vec<RenameRule>,
}

impl RenameMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map made of literal pairs.
    pub fn literal<A, B>(pairs: impl IntoIterator<Item = (A, B)>) -> Self
    where
        A: Into<String>,
        B: Into<String>,
    {
        let mut map = Self::new();
        for (from, to) in pairs {
            map.push_literal(from, to);
        }
        map
    }

    /// Map made of pattern pairs.
    pub fn patterns<A, B>(pairs: impl IntoIterator<Item = (A, B)>) -> Self
    where
        A: Into<String>,
        B: Into<String>,
    {
        let mut map = Self::new();
        for (from, to) in pairs {
            map.push_pattern(from, to);
        }
        map
    }

    pub fn push_literal(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.rules.push(RenameRule::Literal {
            from: from.into(),
            to: to.into(),
        });
    }

    pub fn push_pattern(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.rules.push(RenameRule::Pattern {
            from: from.into(),
            to: to.into(),
        });
    }

    pub fn rules(&self) -> &[RenameRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }
}

/// The four disjoint groups produced by [`match_paths`].
///
/// Each group is ordered by the rendered path of its (A-side) entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchedPaths {
    /// Present in both trees under the same path.
    pub common: Vec<PathEntry>,
    /// Present in both trees under related paths, as `(a, b)`.
    pub renamed: Vec<(PathEntry, PathEntry)>,
    /// Present in A only.
    pub only_a: Vec<PathEntry>,
    /// Present in B only.
    pub only_b: Vec<PathEntry>,
}

/// Partition two path lists into common, renamed and exclusive groups.
///
/// A literal rename pair whose path is missing on its side fails with
/// [`DiffError::MissingPath`]; a rewritten pattern target missing from B is
/// dropped. Each path takes part in at most one renamed pair.
pub fn match_paths(
    list_a: &FoldedPathList,
    list_b: &FoldedPathList,
    rename: Option<&RenameMap>,
) -> DiffResult<MatchedPaths> {
    let by_path_a: BTreeMap<String, &PathEntry> =
        list_a.iter().map(|e| (list_a.render(e), e)).collect();
    let by_path_b: BTreeMap<String, &PathEntry> =
        list_b.iter().map(|e| (list_b.render(e), e)).collect();

    let mut renamed: Vec<(String, String)> = Vec::new();
    let mut used_a: BTreeSet<String> = BTreeSet::new();
    let mut used_b: BTreeSet<String> = BTreeSet::new();

    for rule in rename.map(RenameMap::rules).unwrap_or_default() {
        match rule {
            RenameRule::Literal { from, to } => {
                let from = NodePath::parse(from).to_string();
                let to = NodePath::parse(to).to_string();
                if !by_path_a.contains_key(&from) {
                    return Err(DiffError::MissingPath {
                        path: from,
                        side: Side::A,
                    });
                }
                if !by_path_b.contains_key(&to) {
                    return Err(DiffError::MissingPath {
                        path: to,
                        side: Side::B,
                    });
                }
                if used_a.contains(&from) || used_b.contains(&to) {
                    debug!(from = %from, to = %to, "rename pair overlaps an earlier pair; skipped");
                    continue;
                }
                used_a.insert(from.clone());
                used_b.insert(to.clone());
                renamed.push((from, to));
            }
            RenameRule::Pattern { from, to } => {
                let re = compile_prefix(from)?;
                for path_a in by_path_a.keys() {
                    if used_a.contains(path_a) {
                        continue;
                    }
                    let Some(target) = rewrite(&re, to, path_a) else {
                        continue;
                    };
                    if !by_path_b.contains_key(&target) || used_b.contains(&target) {
                        debug!(path = %path_a, target = %target, "rename target not in b; dropped");
                        continue;
                    }
                    used_a.insert(path_a.clone());
                    used_b.insert(target.clone());
                    renamed.push((path_a.clone(), target));
                }
            }
        }
    }

    let mut matched = MatchedPaths::default();
    for (path, entry) in &by_path_a {
        if used_a.contains(path) {
            continue;
        }
        if by_path_b.contains_key(path) && !used_b.contains(path) {
            matched.common.push((*entry).clone());
        } else {
            matched.only_a.push((*entry).clone());
        }
    }
    for (path, entry) in &by_path_b {
        if used_b.contains(path) {
            continue;
        }
        if !by_path_a.contains_key(path) || used_a.contains(path) {
            matched.only_b.push((*entry).clone());
        }
    }

    renamed.sort();
    matched.renamed = renamed
        .iter()
        .filter_map(|(a, b)| Some(((*by_path_a.get(a)?).clone(), (*by_path_b.get(b)?).clone())))
        .collect();

    debug!(
        common = matched.common.len(),
        renamed = matched.renamed.len(),
        only_a = matched.only_a.len(),
        only_b = matched.only_b.len(),
        "paths matched"
    );
    Ok(matched)
}

fn compile_prefix(pattern: &str) -> DiffResult<Regex> {
    Regex::new(&format!("^(?:{pattern})(?P<suffix>(?s:.*))$")).map_err(|source| {
        DiffError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        }
    })
}

fn rewrite(re: &Regex, replacement: &str, path: &str) -> Option<String> {
    let caps = re.captures(path)?;
    let mut target = String::new();
    caps.expand(replacement, &mut target);
    target.push_str(caps.name("suffix").map_or("", |m| m.as_str()));
    Some(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(paths: &[&str]) -> FoldedPathList {
        FoldedPathList::from_paths(paths.iter().map(|p| NodePath::parse(p)), "/...")
    }

    fn paths(entries: &[PathEntry]) -> Vec<String> {
        entries.iter().map(|e| e.render("/...")).collect()
    }

    fn pairs(matched: &MatchedPaths) -> Vec<(String, String)> {
        matched
            .renamed
            .iter()
            .map(|(a, b)| (a.render("/..."), b.render("/...")))
            .collect()
    }

    #[test]
    fn plain_set_algebra() {
        let a = list(&["/keep", "/gone", "/both"]);
        let b = list(&["/keep", "/new", "/both"]);
        let m = match_paths(&a, &b, None).unwrap();
        assert_eq!(paths(&m.common), vec!["/both", "/keep"]);
        assert_eq!(paths(&m.only_a), vec!["/gone"]);
        assert_eq!(paths(&m.only_b), vec!["/new"]);
        assert!(m.renamed.is_empty());
    }

    #[test]
    fn pattern_rewrites_prefix_and_keeps_suffix() {
        let a = list(&["/run_1/result", "/run_2/result", "/other"]);
        let b = list(&["/job_1/result", "/other"]);
        let rename = RenameMap::patterns([("/run_", "/job_")]);
        let m = match_paths(&a, &b, Some(&rename)).unwrap();
        assert_eq!(
            pairs(&m),
            vec![("/run_1/result".to_string(), "/job_1/result".to_string())]
        );
        // Rewrite target absent from b: silently left unmatched.
        assert_eq!(paths(&m.only_a), vec!["/run_2/result"]);
        assert_eq!(paths(&m.common), vec!["/other"]);
        assert!(m.only_b.is_empty());
    }

    #[test]
    fn pattern_groups_can_be_reused() {
        let a = list(&["/v1/alpha/x"]);
        let b = list(&["/alpha/v1/x"]);
        let rename = RenameMap::patterns([(r"/v(\d+)/(\w+)", "/${2}/v${1}")]);
        let m = match_paths(&a, &b, Some(&rename)).unwrap();
        assert_eq!(
            pairs(&m),
            vec![("/v1/alpha/x".to_string(), "/alpha/v1/x".to_string())]
        );
    }

    #[test]
    fn pattern_target_needs_doubled_dollar() {
        let a = list(&["/old/x"]);
        let b = list(&["/price$usd/x"]);

        let rename = RenameMap::patterns([("/old", "/price$$usd")]);
        let m = match_paths(&a, &b, Some(&rename)).unwrap();
        assert_eq!(
            pairs(&m),
            vec![("/old/x".to_string(), "/price$usd/x".to_string())]
        );

        // A single `$usd` names a group that does not exist and expands to "".
        let rename = RenameMap::patterns([("/old", "/price$usd")]);
        let m = match_paths(&a, &b, Some(&rename)).unwrap();
        assert!(m.renamed.is_empty());
        assert_eq!(paths(&m.only_b), vec!["/price$usd/x"]);
    }

    #[test]
    fn pattern_must_match_at_start() {
        let a = list(&["/x/run_1"]);
        let b = list(&["/x/job_1"]);
        let rename = RenameMap::patterns([("run_", "job_")]);
        let m = match_paths(&a, &b, Some(&rename)).unwrap();
        assert!(m.renamed.is_empty());
        assert_eq!(paths(&m.only_a), vec!["/x/run_1"]);
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let a = list(&["/a"]);
        let rename = RenameMap::patterns([("/[unclosed", "/b")]);
        let err = match_paths(&a, &a, Some(&rename)).unwrap_err();
        assert!(matches!(err, DiffError::InvalidPattern { .. }));
    }

    #[test]
    fn literal_pairs_must_exist() {
        let a = list(&["/a/0"]);
        let b = list(&["/b/1"]);

        let ok = RenameMap::literal([("/a/0", "/b/1")]);
        let m = match_paths(&a, &b, Some(&ok)).unwrap();
        assert_eq!(pairs(&m), vec![("/a/0".to_string(), "/b/1".to_string())]);
        assert!(m.only_a.is_empty() && m.only_b.is_empty() && m.common.is_empty());

        let missing_a = RenameMap::literal([("/a/9", "/b/1")]);
        let err = match_paths(&a, &b, Some(&missing_a)).unwrap_err();
        assert!(matches!(err, DiffError::MissingPath { side: Side::A, .. }));

        let missing_b = RenameMap::literal([("/a/0", "/b/9")]);
        let err = match_paths(&a, &b, Some(&missing_b)).unwrap_err();
        assert!(matches!(err, DiffError::MissingPath { side: Side::B, .. }));
    }

    #[test]
    fn renamed_away_path_reappearing_in_b_is_added() {
        let a = list(&["/x"]);
        let b = list(&["/x", "/y"]);
        let rename = RenameMap::literal([("/x", "/y")]);
        let m = match_paths(&a, &b, Some(&rename)).unwrap();
        assert_eq!(pairs(&m), vec![("/x".to_string(), "/y".to_string())]);
        assert_eq!(paths(&m.only_b), vec!["/x"]);
        assert!(m.common.is_empty());
    }

    #[test]
    fn each_path_pairs_once() {
        let a = list(&["/a", "/c"]);
        let b = list(&["/b"]);
        let rename = RenameMap::literal([("/a", "/b"), ("/c", "/b")]);
        let m = match_paths(&a, &b, Some(&rename)).unwrap();
        assert_eq!(pairs(&m), vec![("/a".to_string(), "/b".to_string())]);
        assert_eq!(paths(&m.only_a), vec!["/c"]);
    }

    #[test]
    fn fold_markers_match_by_rendered_path() {
        use crate::config::FoldSpec;
        use crate::fold::traverse;
        use strata_store::InMemoryTree;
        use strata_types::Value;

        let mut ta = InMemoryTree::new();
        ta.insert_dataset(&NodePath::parse("/g/x"), Value::int(1)).unwrap();
        ta.insert_dataset(&NodePath::parse("/run_1/x"), Value::int(1)).unwrap();
        let mut tb = InMemoryTree::new();
        tb.insert_dataset(&NodePath::parse("/g/y"), Value::int(2)).unwrap();
        tb.insert_dataset(&NodePath::parse("/job_1/x"), Value::int(1)).unwrap();

        let spec = FoldSpec::new().with_max_depth(1);
        let a = traverse(&ta, &NodePath::root(), &spec).unwrap();
        let b = traverse(&tb, &NodePath::root(), &spec).unwrap();
        let rename = RenameMap::patterns([("/run_", "/job_")]);
        let m = match_paths(&a, &b, Some(&rename)).unwrap();

        assert_eq!(m.common, vec![PathEntry::Folded(NodePath::parse("/g"))]);
        assert_eq!(
            pairs(&m),
            vec![("/run_1/...".to_string(), "/job_1/...".to_string())]
        );
        assert!(m.renamed[0].0.is_folded());
    }

    #[test]
    fn rename_map_serializes_as_tagged_list() {
        let mut map = RenameMap::new();
        map.push_literal("/a", "/b");
        map.push_pattern("/run_", "/job_");
        assert_eq!(map.len(), 2);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(
            json,
            r#"[{"type":"literal","from":"/a","to":"/b"},{"type":"pattern","from":"/run_","to":"/job_"}]"#
        );
    }
}
