use std::collections::BTreeMap;
use std::ops::Bound;

use strata_types::{Attributes, DatasetMeta, NodeKind, NodePath, Value};

use crate::error::{StoreError, StoreResult};
use crate::traits::TreeStore;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Node {
    Group { attrs: Attributes },
    Dataset { attrs: Attributes, value: Value },
}

impl Node {
    pub(crate) fn kind(&self) -> NodeKind {
        match self {
            Self::Group { .. } => NodeKind::Group,
            Self::Dataset { .. } => NodeKind::Dataset,
        }
    }

    pub(crate) fn attrs(&self) -> &Attributes {
        match self {
            Self::Group { attrs } | Self::Dataset { attrs, .. } => attrs,
        }
    }

    fn attrs_mut(&mut self) -> &mut Attributes {
        match self {
            Self::Group { attrs } | Self::Dataset { attrs, .. } => attrs,
        }
    }
}

/// In-memory, `BTreeMap`-based tree store.
///
/// Intended for tests, embedding and the command-line tool. Nodes are keyed
/// by path, so children of a group are a contiguous, name-ordered range of
/// the map. Writes create missing parent groups, the way writing
/// `/a/b/data` into an empty archive creates `/a` and `/a/b`.
#[derive(Clone)]
pub struct InMemoryTree {
    nodes: BTreeMap<NodePath, Node>,
}

impl InMemoryTree {
    /// Create a tree holding only the root group.
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            NodePath::root(),
            Node::Group {
                attrs: Attributes::new(),
            },
        );
        Self { nodes }
    }

    /// Number of nodes, not counting the root group.
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Returns `true` if the tree holds nothing but the root group.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All node paths in path order, the root first.
    pub fn paths(&self) -> impl Iterator<Item = &NodePath> {
        self.nodes.keys()
    }

    pub(crate) fn nodes(&self) -> impl Iterator<Item = (&NodePath, &Node)> {
        self.nodes.iter()
    }

    /// Create the group at `path` (and any missing parents).
    ///
    /// A no-op if the group already exists; a `Conflict` if any node on the
    /// way is a dataset.
    pub fn insert_group(&mut self, path: &NodePath) -> StoreResult<()> {
        self.ensure_parents(path)?;
        match self.nodes.get(path) {
            Some(Node::Group { .. }) => Ok(()),
            Some(Node::Dataset { .. }) => Err(StoreError::Conflict {
                path: path.clone(),
                reason: "a dataset already exists at this path".into(),
            }),
            None => {
                self.nodes.insert(
                    path.clone(),
                    Node::Group {
                        attrs: Attributes::new(),
                    },
                );
                Ok(())
            }
        }
    }

    /// Write the dataset at `path`, creating missing parent groups.
    ///
    /// Replacing an existing dataset keeps its attributes. Writing over a
    /// group, or at the root, is a `Conflict`.
    pub fn insert_dataset(&mut self, path: &NodePath, value: Value) -> StoreResult<()> {
        if path.is_root() {
            return Err(StoreError::Conflict {
                path: path.clone(),
                reason: "the root is always a group".into(),
            });
        }
        self.ensure_parents(path)?;
        match self.nodes.get_mut(path) {
            Some(Node::Group { .. }) => Err(StoreError::Conflict {
                path: path.clone(),
                reason: "a group already exists at this path".into(),
            }),
            Some(Node::Dataset { value: existing, .. }) => {
                *existing = value;
                Ok(())
            }
            None => {
                self.nodes.insert(
                    path.clone(),
                    Node::Dataset {
                        attrs: Attributes::new(),
                        value,
                    },
                );
                Ok(())
            }
        }
    }

    /// Set an attribute on the node at `path`. A missing node is created as
    /// a group.
    pub fn set_attribute(
        &mut self,
        path: &NodePath,
        name: impl Into<String>,
        value: Value,
    ) -> StoreResult<()> {
        if !self.nodes.contains_key(path) {
            self.insert_group(path)?;
        }
        let node = self
            .nodes
            .get_mut(path)
            .ok_or_else(|| StoreError::NotFound(path.clone()))?;
        node.attrs_mut().insert(name.into(), value);
        Ok(())
    }

    fn ensure_parents(&mut self, path: &NodePath) -> StoreResult<()> {
        let mut ancestors = Vec::new();
        let mut cursor = path.parent();
        while let Some(parent) = cursor {
            cursor = parent.parent();
            ancestors.push(parent);
        }

        for ancestor in ancestors.into_iter().rev() {
            match self.nodes.get(&ancestor) {
                Some(Node::Group { .. }) => {}
                Some(Node::Dataset { .. }) => {
                    return Err(StoreError::Conflict {
                        path: path.clone(),
                        reason: format!("parent {ancestor} is a dataset"),
                    });
                }
                None => {
                    self.nodes.insert(
                        ancestor,
                        Node::Group {
                            attrs: Attributes::new(),
                        },
                    );
                }
            }
        }
        Ok(())
    }

    fn get(&self, path: &NodePath) -> StoreResult<&Node> {
        self.nodes
            .get(path)
            .ok_or_else(|| StoreError::NotFound(path.clone()))
    }
}

impl Default for InMemoryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeStore for InMemoryTree {
    fn node_kind(&self, path: &NodePath) -> StoreResult<Option<NodeKind>> {
        Ok(self.nodes.get(path).map(Node::kind))
    }

    fn list_children(&self, path: &NodePath) -> StoreResult<Vec<(String, NodeKind)>> {
        if let Node::Dataset { .. } = self.get(path)? {
            return Err(StoreError::NotAGroup(path.clone()));
        }

        let prefix = if path.is_root() {
            "/".to_string()
        } else {
            format!("{path}/")
        };

        let children = self
            .nodes
            .range::<str, _>((Bound::Excluded(prefix.as_str()), Bound::Unbounded))
            .take_while(|(key, _)| key.as_str().starts_with(&prefix))
            .filter_map(|(key, node)| {
                let rest = &key.as_str()[prefix.len()..];
                (!rest.contains('/')).then(|| (rest.to_string(), node.kind()))
            })
            .collect();
        Ok(children)
    }

    fn read_attributes(&self, path: &NodePath) -> StoreResult<Attributes> {
        Ok(self.get(path)?.attrs().clone())
    }

    fn read_dataset_body(&self, path: &NodePath) -> StoreResult<Value> {
        match self.get(path)? {
            Node::Dataset { value, .. } => Ok(value.clone()),
            Node::Group { .. } => Err(StoreError::NotADataset(path.clone())),
        }
    }

    fn dataset_meta(&self, path: &NodePath) -> StoreResult<DatasetMeta> {
        match self.get(path)? {
            Node::Dataset { value, .. } => Ok(value.meta()),
            Node::Group { .. } => Err(StoreError::NotADataset(path.clone())),
        }
    }
}

impl std::fmt::Debug for InMemoryTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryTree")
            .field("node_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> NodePath {
        NodePath::parse(s)
    }

    fn sample() -> InMemoryTree {
        let mut tree = InMemoryTree::new();
        tree.insert_dataset(&p("/a"), Value::int_array(vec![0, 1, 2]))
            .unwrap();
        tree.insert_dataset(&p("/b/foo"), Value::float(1.0)).unwrap();
        tree.insert_dataset(&p("/c/d/foo"), Value::string("x"))
            .unwrap();
        tree.insert_group(&p("/b-c")).unwrap();
        tree
    }

    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    #[test]
    fn new_tree_is_empty() {
        let tree = InMemoryTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.node_kind(&NodePath::root()).unwrap(), Some(NodeKind::Group));
    }

    #[test]
    fn dataset_insert_creates_parent_groups() {
        let tree = sample();
        assert_eq!(tree.node_kind(&p("/c")).unwrap(), Some(NodeKind::Group));
        assert_eq!(tree.node_kind(&p("/c/d")).unwrap(), Some(NodeKind::Group));
        assert_eq!(
            tree.node_kind(&p("/c/d/foo")).unwrap(),
            Some(NodeKind::Dataset)
        );
        // a, b, b/foo, b-c, c, c/d, c/d/foo
        assert_eq!(tree.len(), 7);
    }

    #[test]
    fn writing_below_a_dataset_conflicts() {
        let mut tree = sample();
        let err = tree
            .insert_dataset(&p("/a/inner"), Value::int(1))
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
        let err = tree.insert_group(&p("/a")).unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
        let err = tree.insert_dataset(&p("/b"), Value::int(1)).unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
        let err = tree.insert_dataset(&NodePath::root(), Value::int(1)).unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[test]
    fn replacing_a_dataset_keeps_attributes() {
        let mut tree = sample();
        tree.set_attribute(&p("/a"), "unit", Value::string("m")).unwrap();
        tree.insert_dataset(&p("/a"), Value::int(5)).unwrap();
        let attrs = tree.read_attributes(&p("/a")).unwrap();
        assert_eq!(attrs.get("unit"), Some(&Value::string("m")));
        assert_eq!(tree.read_dataset_body(&p("/a")).unwrap(), Value::int(5));
    }

    #[test]
    fn set_attribute_on_missing_node_creates_group() {
        let mut tree = InMemoryTree::new();
        tree.set_attribute(&p("/meta"), "version", Value::int(0)).unwrap();
        assert_eq!(tree.node_kind(&p("/meta")).unwrap(), Some(NodeKind::Group));
        assert_eq!(tree.read_attributes(&p("/meta")).unwrap().len(), 1);
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    #[test]
    fn list_children_is_direct_and_name_ordered() {
        let tree = sample();
        let root: Vec<String> = tree
            .list_children(&NodePath::root())
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(root, vec!["a", "b", "b-c", "c"]);

        let b = tree.list_children(&p("/b")).unwrap();
        assert_eq!(b, vec![("foo".to_string(), NodeKind::Dataset)]);

        assert!(tree.list_children(&p("/b-c")).unwrap().is_empty());
    }

    #[test]
    fn list_children_errors() {
        let tree = sample();
        assert!(matches!(
            tree.list_children(&p("/nope")),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            tree.list_children(&p("/a")),
            Err(StoreError::NotAGroup(_))
        ));
    }

    #[test]
    fn body_and_meta_of_datasets_only() {
        let tree = sample();
        let meta = tree.dataset_meta(&p("/a")).unwrap();
        assert_eq!(meta.size(), 3);
        assert!(matches!(
            tree.read_dataset_body(&p("/b")),
            Err(StoreError::NotADataset(_))
        ));
        assert!(matches!(
            tree.read_attributes(&p("/missing")),
            Err(StoreError::NotFound(_))
        ));
        assert!(!tree.exists(&p("/missing")).unwrap());
        assert!(tree.exists(&p("/b/foo")).unwrap());
    }

    #[test]
    fn debug_shows_node_count() {
        let tree = sample();
        assert_eq!(format!("{tree:?}"), "InMemoryTree { node_count: 7 }");
    }
}
