//! The placement graph value type.
//!
//! A [`Vertex`] is used at every level of the hierarchy: compute instance,
//! switch, accelerator domain, forest root, and the top-level root. Parents
//! own their children outright, so the structure is always a tree.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Root key of the network tree forest; also the tree plugin name.
pub const TOPOLOGY_TREE: &str = "topology/tree";
/// Root key of the accelerator block forest; also the block plugin name.
pub const TOPOLOGY_BLOCK: &str = "topology/block";
/// Reserved ID of the bucket holding instances without placement data.
pub const NO_TOPOLOGY: &str = "no-topology";

/// Root metadata key selecting the output plugin.
pub const KEY_PLUGIN: &str = "plugin";
/// Root metadata key carrying the comma-separated block sizes.
pub const KEY_BLOCK_SIZES: &str = "block_sizes";
/// Root metadata key enabling size-constrained block splitting.
pub const KEY_BLOCK_SPLIT: &str = "block_split";

/// A node of the placement graph.
///
/// A vertex without children is a leaf and stands for one compute instance.
/// A vertex with children is a grouping (switch, domain or forest root).
/// Children are keyed by their ID; equality ignores insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vertex {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub vertices: HashMap<String, Vertex>,
    /// Only populated on the top-level root.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl Vertex {
    /// A leaf for a compute instance.
    pub fn leaf(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// An empty grouping vertex. It becomes internal once a child is inserted.
    pub fn group(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::leaf(id, name)
    }

    /// Build a grouping vertex from its children.
    pub fn with_children(
        id: impl Into<String>,
        name: impl Into<String>,
        children: impl IntoIterator<Item = Vertex>,
    ) -> Self {
        let mut v = Self::group(id, name);
        for child in children {
            v.insert(child);
        }
        v
    }

    pub fn is_leaf(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Insert a child keyed by its ID, replacing any previous child with the
    /// same key.
    pub fn insert(&mut self, child: Vertex) -> Option<Vertex> {
        self.vertices.insert(child.id.clone(), child)
    }

    /// Insert a child under an explicit key.
    pub fn insert_as(&mut self, key: impl Into<String>, child: Vertex) -> Option<Vertex> {
        self.vertices.insert(key.into(), child)
    }

    pub fn child(&self, key: &str) -> Option<&Vertex> {
        self.vertices.get(key)
    }

    /// Children ordered by key.
    pub fn sorted_children(&self) -> Vec<(&String, &Vertex)> {
        let mut children: Vec<_> = self.vertices.iter().collect();
        children.sort_by(|a, b| a.0.cmp(b.0));
        children
    }

    /// Label used when rendering: the name, or the ID when unnamed.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() { &self.id } else { &self.name }
    }

    /// All leaves of the subtree, depth-first with children in key order.
    pub fn leaves(&self) -> Vec<&Vertex> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Vertex>) {
        if self.is_leaf() {
            out.push(self);
            return;
        }
        for (_, child) in self.sorted_children() {
            child.collect_leaves(out);
        }
    }

    pub fn leaf_count(&self) -> usize {
        if self.is_leaf() {
            1
        } else {
            self.vertices.values().map(Vertex::leaf_count).sum()
        }
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }
}
