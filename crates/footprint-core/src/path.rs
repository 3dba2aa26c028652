//! Hierarchical node identifiers
//!
//! A [`NodeId`] is a persistent linked path: each child id holds its parent
//! and one [`Segment`], so deriving a child costs one small allocation and
//! siblings share their prefix. Ids render to strings only when displayed or
//! serialized:
//!
//! - root: the configured sentinel, `{root}` by default
//! - sequence member: `{root}[3]`
//! - named member: `{root}.name`
//! - key node of an entry: `{root}.name{key}`

use serde::{Serialize, Serializer};
use std::fmt;
use std::rc::Rc;

/// Default root sentinel
pub const DEFAULT_ROOT: &str = "{root}";

/// Suffix that marks the key node of a key/value entry
pub const KEY_MARKER: &str = "{key}";

/// One step of a path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Position in a sequence
    Index(usize),
    /// Stringified key of a table, collection or object member
    Key(String),
    /// Distinguishes an entry's key node from its value node
    KeyMarker,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Index(i) => write!(f, "[{}]", i),
            Segment::Key(key) => write!(f, ".{}", key),
            Segment::KeyMarker => f.write_str(KEY_MARKER),
        }
    }
}

#[derive(Debug)]
enum PathNode {
    Root(String),
    Child { parent: NodeId, segment: Segment },
}

/// Identifier of a node in a size tree
#[derive(Debug, Clone)]
pub struct NodeId(Rc<PathNode>);

impl NodeId {
    /// Create a root id with the given sentinel
    pub fn root(sentinel: impl Into<String>) -> Self {
        Self(Rc::new(PathNode::Root(sentinel.into())))
    }

    fn child(&self, segment: Segment) -> Self {
        Self(Rc::new(PathNode::Child {
            parent: self.clone(),
            segment,
        }))
    }

    /// Id of the sequence member at `index`
    pub fn index(&self, index: usize) -> Self {
        self.child(Segment::Index(index))
    }

    /// Id of the member named `key`
    pub fn key(&self, key: impl Into<String>) -> Self {
        self.child(Segment::Key(key.into()))
    }

    /// Id of the key node paired with this value node
    pub fn key_marker(&self) -> Self {
        self.child(Segment::KeyMarker)
    }

    pub fn parent(&self) -> Option<&NodeId> {
        match &*self.0 {
            PathNode::Root(_) => None,
            PathNode::Child { parent, .. } => Some(parent),
        }
    }

    /// The last segment, `None` for the root
    pub fn last_segment(&self) -> Option<&Segment> {
        match &*self.0 {
            PathNode::Root(_) => None,
            PathNode::Child { segment, .. } => Some(segment),
        }
    }

    /// The root sentinel this path starts from
    pub fn root_name(&self) -> &str {
        let mut current = self;
        loop {
            match &*current.0 {
                PathNode::Root(name) => return name,
                PathNode::Child { parent, .. } => current = parent,
            }
        }
    }

    /// Number of segments below the root
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self;
        while let Some(parent) = current.parent() {
            depth += 1;
            current = parent;
        }
        depth
    }

    /// Segments from the root down to this node
    pub fn segments(&self) -> Vec<Segment> {
        let mut segments = Vec::with_capacity(self.depth());
        let mut current = self;
        while let PathNode::Child { parent, segment } = &*current.0 {
            segments.push(segment.clone());
            current = parent;
        }
        segments.reverse();
        segments
    }

    /// Whether this id names the key node of an entry
    pub fn is_key_node(&self) -> bool {
        matches!(self.last_segment(), Some(Segment::KeyMarker))
    }
}

impl PartialEq for NodeId {
    fn eq(&self, other: &Self) -> bool {
        let (mut a, mut b) = (self, other);
        loop {
            if Rc::ptr_eq(&a.0, &b.0) {
                return true;
            }
            match (&*a.0, &*b.0) {
                (PathNode::Root(x), PathNode::Root(y)) => return x == y,
                (
                    PathNode::Child {
                        parent: pa,
                        segment: sa,
                    },
                    PathNode::Child {
                        parent: pb,
                        segment: sb,
                    },
                ) => {
                    if sa != sb {
                        return false;
                    }
                    a = pa;
                    b = pb;
                }
                _ => return false,
            }
        }
    }
}

impl Eq for NodeId {}

impl PartialEq<str> for NodeId {
    fn eq(&self, other: &str) -> bool {
        self.to_string() == other
    }
}

impl PartialEq<&str> for NodeId {
    fn eq(&self, other: &&str) -> bool {
        self.to_string() == *other
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.root_name())?;
        for segment in self.segments() {
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::root(DEFAULT_ROOT)
    }
}
