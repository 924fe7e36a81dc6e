//! JSON document form of a tree.
//!
//! A document is the root group written out as nested objects:
//!
//! ```json
//! {
//!   "attrs": { "version": { "dtype": "i64", "data": 2 } },
//!   "children": {
//!     "run_1": {
//!       "kind": "group",
//!       "children": {
//!         "result": { "kind": "dataset", "value": { "dtype": "f64", "shape": [3], "data": [1, 2, 3] } }
//!       }
//!     }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use strata_types::{Attributes, NodePath};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::memory::{InMemoryTree, Node};

/// Document form of the root group.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeDocument {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: Attributes,
    #[serde(default)]
    pub children: BTreeMap<String, NodeDocument>,
}

/// Document form of a non-root node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NodeDocument {
    Group {
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        attrs: Attributes,
        #[serde(default)]
        children: BTreeMap<String, NodeDocument>,
    },
    Dataset {
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        attrs: Attributes,
        value: strata_types::Value,
    },
}

impl InMemoryTree {
    /// Build a tree from its document form.
    pub fn from_document(doc: &TreeDocument) -> StoreResult<Self> {
        let mut tree = InMemoryTree::new();
        let root = NodePath::root();
        for (name, value) in &doc.attrs {
            tree.set_attribute(&root, name.as_str(), value.clone())?;
        }

        let mut stack: Vec<(NodePath, &BTreeMap<String, NodeDocument>)> =
            vec![(root, &doc.children)];
        while let Some((parent, children)) = stack.pop() {
            for (name, child) in children {
                if name.is_empty() || name == "." || name == ".." || name.contains('/') {
                    return Err(StoreError::Serialization(format!(
                        "invalid node name {name:?} below {parent}"
                    )));
                }
                let path = parent.join(name);
                let attrs = match child {
                    NodeDocument::Group { attrs, children } => {
                        tree.insert_group(&path)?;
                        stack.push((path.clone(), children));
                        attrs
                    }
                    NodeDocument::Dataset { attrs, value } => {
                        tree.insert_dataset(&path, value.clone())?;
                        attrs
                    }
                };
                for (key, value) in attrs {
                    tree.set_attribute(&path, key.as_str(), value.clone())?;
                }
            }
        }
        Ok(tree)
    }

    /// The document form of this tree.
    pub fn to_document(&self) -> TreeDocument {
        let mut doc = TreeDocument::default();
        // Path order visits every parent before its children.
        for (path, node) in self.nodes() {
            let components: Vec<&str> = path.components().collect();
            let Some((name, parents)) = components.split_last() else {
                doc.attrs = node.attrs().clone();
                continue;
            };
            let entry = match node {
                Node::Group { attrs } => NodeDocument::Group {
                    attrs: attrs.clone(),
                    children: BTreeMap::new(),
                },
                Node::Dataset { attrs, value } => NodeDocument::Dataset {
                    attrs: attrs.clone(),
                    value: value.clone(),
                },
            };
            if let Some(children) = children_at(&mut doc.children, parents) {
                children.insert((*name).to_string(), entry);
            }
        }
        doc
    }

    /// Parse a tree from a JSON document.
    pub fn from_json(json: &str) -> StoreResult<Self> {
        let doc: TreeDocument =
            serde_json::from_str(json).map_err(|e| StoreError::Serialization(e.to_string()))?;
        Self::from_document(&doc)
    }

    /// Serialize the tree as a pretty-printed JSON document.
    pub fn to_json(&self) -> StoreResult<String> {
        serde_json::to_string_pretty(&self.to_document())
            .map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Load a tree from a JSON document on disk.
    pub fn load(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let tree = Self::from_json(&json)?;
        debug!(file = %path.display(), nodes = tree.len(), "loaded tree document");
        Ok(tree)
    }

    /// Write the tree as a JSON document to disk.
    pub fn save(&self, path: impl AsRef<Path>) -> StoreResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

fn children_at<'a>(
    mut children: &'a mut BTreeMap<String, NodeDocument>,
    parents: &[&str],
) -> Option<&'a mut BTreeMap<String, NodeDocument>> {
    for component in parents {
        match children.get_mut(*component)? {
            NodeDocument::Group {
                children: inner, ..
            } => children = inner,
            NodeDocument::Dataset { .. } => return None,
        }
    }
    Some(children)
}
