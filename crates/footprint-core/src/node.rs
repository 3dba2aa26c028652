//! Result tree types
//!
//! A [`SizeNode`] is produced for every visited value. Composite nodes carry
//! their children in one of two shapes, fixed per kind:
//!
//! - arrays and sets: [`Children::Sequence`], in traversal order
//! - maps and objects: [`Children::Entries`], key/value pairs in insertion order
//!
//! Serialized to JSON a node looks like
//! `{"id": "{root}", "type": "object", "size": 10, "values": {...}}`, with
//! `circularId` on back-references and any extra handler fields flattened in.

use crate::classify::NodeType;
use crate::path::NodeId;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// Extra metadata attached to a node
pub type Extras = serde_json::Map<String, serde_json::Value>;

/// Size estimate for one visited value
#[derive(Debug, Clone, Serialize)]
pub struct SizeNode {
    /// Path of this node from the root
    pub id: NodeId,
    /// Kind tag
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Bytes attributed to this value and everything below it
    pub size: u64,
    /// Children of composite nodes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Children>,
    /// Id of the first visit, only on circular nodes
    #[serde(rename = "circularId", skip_serializing_if = "Option::is_none")]
    pub circular_id: Option<NodeId>,
    /// Handler-provided metadata such as `typeof`
    #[serde(flatten)]
    pub extra: Extras,
}

impl SizeNode {
    /// Leaf node with a directly computed size
    pub fn leaf(id: NodeId, node_type: NodeType, size: u64) -> Self {
        Self {
            id,
            node_type,
            size,
            values: None,
            circular_id: None,
            extra: Extras::new(),
        }
    }

    /// Back-reference to a value first visited under `first_id`
    pub fn circular(id: NodeId, first_id: NodeId) -> Self {
        Self {
            circular_id: Some(first_id),
            ..Self::leaf(id, NodeType::Circular, 0)
        }
    }

    /// Composite node whose size is the sum of its children
    pub fn composite(id: NodeId, node_type: NodeType, children: Children) -> Self {
        Self {
            size: children.size_sum(),
            values: Some(children),
            ..Self::leaf(id, node_type, 0)
        }
    }

    /// Attach one metadata field
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn is_circular(&self) -> bool {
        self.node_type == NodeType::Circular
    }

    /// Direct child nodes; for entries, each key node precedes its value node
    pub fn children(&self) -> Vec<&SizeNode> {
        match &self.values {
            None => Vec::new(),
            Some(Children::Sequence(items)) => items.iter().collect(),
            Some(Children::Entries(entries)) => entries
                .iter()
                .flat_map(|entry| [&entry.key, &entry.value])
                .collect(),
        }
    }

    /// Sum of the direct children's sizes, `None` for nodes without children
    pub fn child_size_sum(&self) -> Option<u64> {
        self.values.as_ref().map(Children::size_sum)
    }

    /// Sequence member at `index`
    pub fn item(&self, index: usize) -> Option<&SizeNode> {
        match &self.values {
            Some(Children::Sequence(items)) => items.get(index),
            _ => None,
        }
    }

    /// Entry whose key stringifies to `label`
    pub fn entry(&self, label: &str) -> Option<&Entry> {
        match &self.values {
            Some(Children::Entries(entries)) => entries.iter().find(|e| e.label == label),
            _ => None,
        }
    }

    /// Pre-order walk over this node and every descendant
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }

    /// Find a node by its rendered id
    pub fn find(&self, id: &str) -> Option<&SizeNode> {
        self.walk().find(|node| node.id == id)
    }

    /// Total number of nodes in this tree
    pub fn node_count(&self) -> usize {
        self.walk().count()
    }

    /// Every circular node in this tree, in pre-order
    pub fn circular_nodes(&self) -> Vec<&SizeNode> {
        self.walk().filter(|node| node.is_circular()).collect()
    }

    /// Serialize into a JSON value
    pub fn to_json(&self) -> serde_json::Value {
        // Serializing a tree of strings, numbers and maps cannot fail
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Pre-order iterator returned by [`SizeNode::walk`]
pub struct Walk<'a> {
    stack: Vec<&'a SizeNode>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a SizeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().into_iter().rev());
        Some(node)
    }
}

/// Children of a composite node
#[derive(Debug, Clone)]
pub enum Children {
    /// Array elements or set members
    Sequence(Vec<SizeNode>),
    /// Map entries or object properties
    Entries(Vec<Entry>),
}

impl Children {
    pub fn size_sum(&self) -> u64 {
        match self {
            Children::Sequence(items) => items.iter().map(|n| n.size).sum(),
            Children::Entries(entries) => entries.iter().map(|e| e.size).sum(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Children::Sequence(items) => items.len(),
            Children::Entries(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stable sort, largest first
    pub fn sort_by_size_desc(&mut self) {
        match self {
            Children::Sequence(items) => items.sort_by(|a, b| b.size.cmp(&a.size)),
            Children::Entries(entries) => entries.sort_by(|a, b| b.size.cmp(&a.size)),
        }
    }

    /// Keep only children (or entries) whose size satisfies `keep`
    ///
    /// Returns the total size of what was dropped.
    pub fn retain_sizes(&mut self, keep: impl Fn(u64) -> bool) -> u64 {
        let before = self.size_sum();
        match self {
            Children::Sequence(items) => items.retain(|n| keep(n.size)),
            Children::Entries(entries) => entries.retain(|e| keep(e.size)),
        }
        before - self.size_sum()
    }
}

impl Serialize for Children {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Children::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Children::Entries(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for entry in entries {
                    map.serialize_entry(&entry.label, entry)?;
                }
                map.end()
            }
        }
    }
}

/// One key/value pair of a map or object
#[derive(Debug, Clone, Serialize)]
pub struct Entry {
    /// Stringified key, used to look entries up and as the JSON map key
    #[serde(skip)]
    pub label: String,
    pub key: SizeNode,
    pub value: SizeNode,
    /// Key size plus value size
    pub size: u64,
}

impl Entry {
    pub fn new(label: impl Into<String>, key: SizeNode, value: SizeNode) -> Self {
        Self {
            label: label.into(),
            size: key.size + value.size,
            key,
            value,
        }
    }
}
