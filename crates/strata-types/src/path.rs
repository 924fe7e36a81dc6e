use std::borrow::Borrow;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Absolute, normalized address of a node inside a hierarchical store.
///
/// A `NodePath` always starts with `/`, never ends with one (except the root
/// itself), and contains no empty, `.` or `..` components. Any string can be
/// turned into a `NodePath`: normalization follows POSIX `normpath` applied to
/// the path joined onto `/`, so `..` never climbs above the root.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct NodePath(String);

impl NodePath {
    /// The root path `/`.
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Normalize `raw` into an absolute path.
    pub fn parse(raw: &str) -> Self {
        let mut parts: Vec<&str> = Vec::new();
        for component in raw.split('/') {
            match component {
                "" | "." => {}
                ".." => {
                    parts.pop();
                }
                name => parts.push(name),
            }
        }
        if parts.is_empty() {
            Self::root()
        } else {
            Self(format!("/{}", parts.join("/")))
        }
    }

    /// Returns `true` for the root path.
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// The path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last component, or `None` for the root.
    pub fn name(&self) -> Option<&str> {
        if self.is_root() {
            None
        } else {
            self.0.rsplit('/').next()
        }
    }

    /// Parent path, or `None` for the root.
    pub fn parent(&self) -> Option<NodePath> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) | None => Some(Self::root()),
            Some(idx) => Some(Self(self.0[..idx].to_string())),
        }
    }

    /// Append `child` (which may itself contain separators) to this path.
    pub fn join(&self, child: &str) -> NodePath {
        Self::parse(&format!("{}/{}", self.0, child))
    }

    /// Iterate over the path components, root first.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|c| !c.is_empty())
    }

    /// Number of components (`0` for the root).
    pub fn depth(&self) -> usize {
        self.components().count()
    }

    /// Number of components below `root`, or `None` if this path is not
    /// at or below `root`.
    pub fn depth_below(&self, root: &NodePath) -> Option<usize> {
        if self.starts_with(root) {
            Some(self.depth() - root.depth())
        } else {
            None
        }
    }

    /// Component-wise prefix test: `/a/b` starts with `/a` but not with `/a/b/c`
    /// or `/a/bc`. Every path starts with the root.
    pub fn starts_with(&self, prefix: &NodePath) -> bool {
        if prefix.is_root() {
            return true;
        }
        match self.0.strip_prefix(prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

impl Default for NodePath {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Debug for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodePath({})", self.0)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NodePath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for NodePath {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for NodePath {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<NodePath> for String {
    fn from(path: NodePath) -> Self {
        path.0
    }
}

impl AsRef<str> for NodePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NodePath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn normalizes_relative_and_redundant_paths() {
        assert_eq!(NodePath::parse("a/b").as_str(), "/a/b");
        assert_eq!(NodePath::parse("//a///b/").as_str(), "/a/b");
        assert_eq!(NodePath::parse("/a/./b/../c").as_str(), "/a/c");
        assert_eq!(NodePath::parse("/../..").as_str(), "/");
        assert_eq!(NodePath::parse("").as_str(), "/");
    }

    #[test]
    fn name_and_parent() {
        let p = NodePath::parse("/a/b/c");
        assert_eq!(p.name(), Some("c"));
        assert_eq!(p.parent(), Some(NodePath::parse("/a/b")));
        assert_eq!(NodePath::parse("/a").parent(), Some(NodePath::root()));
        assert_eq!(NodePath::root().parent(), None);
        assert_eq!(NodePath::root().name(), None);
    }

    #[test]
    fn join_normalizes() {
        let p = NodePath::parse("/a");
        assert_eq!(p.join("b").as_str(), "/a/b");
        assert_eq!(p.join("/b/c/").as_str(), "/a/b/c");
        assert_eq!(NodePath::root().join("x").as_str(), "/x");
    }

    #[test]
    fn prefix_is_component_wise() {
        let p = NodePath::parse("/a/bc");
        assert!(p.starts_with(&NodePath::parse("/a")));
        assert!(p.starts_with(&NodePath::parse("/a/bc")));
        assert!(!p.starts_with(&NodePath::parse("/a/b")));
        assert!(p.starts_with(&NodePath::root()));
    }

    #[test]
    fn depth_counts_components_below_root() {
        let p = NodePath::parse("/x/y/z");
        assert_eq!(p.depth(), 3);
        assert_eq!(p.depth_below(&NodePath::parse("/x")), Some(2));
        assert_eq!(p.depth_below(&NodePath::parse("/q")), None);
        assert_eq!(NodePath::root().depth(), 0);
    }

    #[test]
    fn serializes_as_plain_string() {
        let p = NodePath::parse("/a/b");
        assert_eq!(serde_json::to_string(&p).unwrap(), "\"/a/b\"");
        let back: NodePath = serde_json::from_str("\"a//b/\"").unwrap();
        assert_eq!(back, p);
    }

    proptest! {
        #[test]
        fn parse_is_idempotent(raw in "[a-c/.]{0,16}") {
            let once = NodePath::parse(&raw);
            let twice = NodePath::parse(once.as_str());
            prop_assert_eq!(once, twice);
        }
    }
}
