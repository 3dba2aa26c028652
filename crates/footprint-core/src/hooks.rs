//! Customization hooks
//!
//! Two narrow traits let callers adjust the estimator without re-walking the
//! value graph:
//!
//! - [`NodeTransform`] post-processes every node once all of its children are
//!   complete. Sorting, pruning and redaction live here.
//! - [`UnknownHandler`] describes values the classifier cannot size:
//!   callables, host handles, and scalars the active codec rejected.
//!
//! Plain closures implement both traits.

use crate::node::{Children, Extras, SizeNode};
use crate::path::NodeId;
use crate::value::Value;
use crate::visited::VisitedSet;

/// Post-processing applied to every node before it reaches its parent
pub trait NodeTransform {
    fn transform(&self, node: SizeNode) -> SizeNode;
}

impl<F> NodeTransform for F
where
    F: Fn(SizeNode) -> SizeNode,
{
    fn transform(&self, node: SizeNode) -> SizeNode {
        self(node)
    }
}

/// Returns every node unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTransform;

impl NodeTransform for IdentityTransform {
    fn transform(&self, node: SizeNode) -> SizeNode {
        node
    }
}

/// Orders children largest first; ties keep traversal order
#[derive(Debug, Clone, Copy, Default)]
pub struct SortBySize;

impl NodeTransform for SortBySize {
    fn transform(&self, mut node: SizeNode) -> SizeNode {
        if let Some(children) = node.values.as_mut() {
            children.sort_by_size_desc();
        }
        node
    }
}

/// Drops children smaller than `min_size`
///
/// The parent keeps its aggregate size, so pruned nodes still account for
/// the bytes of everything they held. The dropped bytes are recorded in a
/// `pruned` extra, keeping `size == children + pruned` checkable.
#[derive(Debug, Clone, Copy)]
pub struct PruneBelow {
    pub min_size: u64,
}

/// Extra field holding the bytes of children removed by [`PruneBelow`]
pub const PRUNED_EXTRA: &str = "pruned";

impl NodeTransform for PruneBelow {
    fn transform(&self, mut node: SizeNode) -> SizeNode {
        let min_size = self.min_size;
        let dropped = match node.values.as_mut() {
            Some(children) => children.retain_sizes(|size| size >= min_size),
            None => 0,
        };
        if dropped > 0 {
            node.extra.insert(PRUNED_EXTRA.into(), dropped.into());
        }
        node
    }
}

/// Bytes removed from a node's children by [`PruneBelow`]
pub fn pruned_bytes(node: &SizeNode) -> u64 {
    node.extra
        .get(PRUNED_EXTRA)
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(0)
}

/// Hides the structure below entries with the given labels
///
/// The value node of a matching entry loses its children and is marked
/// `"redacted": true`; sizes are preserved.
#[derive(Debug, Clone, Default)]
pub struct RedactEntries {
    labels: Vec<String>,
}

impl RedactEntries {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }
}

impl NodeTransform for RedactEntries {
    fn transform(&self, mut node: SizeNode) -> SizeNode {
        if let Some(Children::Entries(entries)) = node.values.as_mut() {
            for entry in entries.iter_mut() {
                if self.labels.iter().any(|label| *label == entry.label) {
                    entry.value.values = None;
                    entry
                        .value
                        .extra
                        .insert("redacted".into(), serde_json::Value::Bool(true));
                }
            }
        }
        node
    }
}

/// Applies several transforms in order
#[derive(Default)]
pub struct TransformChain {
    transforms: Vec<Box<dyn NodeTransform>>,
}

impl TransformChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transform to the chain
    pub fn then(mut self, transform: impl NodeTransform + 'static) -> Self {
        self.transforms.push(Box::new(transform));
        self
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl NodeTransform for TransformChain {
    fn transform(&self, node: SizeNode) -> SizeNode {
        self.transforms
            .iter()
            .fold(node, |node, transform| transform.transform(node))
    }
}

/// What an [`UnknownHandler`] reports about a value
#[derive(Debug, Clone, Default)]
pub struct UnknownReport {
    /// Size to attribute; zero unless the handler implements a sizing policy
    pub size: u64,
    /// Fields merged into the unknown node
    pub extra: Extras,
}

impl UnknownReport {
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Describes values that have no sizing rule
///
/// The visited set is read-only here; handlers must not start their own
/// traversal of the value.
pub trait UnknownHandler {
    fn describe(&self, value: &Value, seen: &VisitedSet, id: &NodeId) -> UnknownReport;
}

impl<F> UnknownHandler for F
where
    F: Fn(&Value, &VisitedSet, &NodeId) -> UnknownReport,
{
    fn describe(&self, value: &Value, seen: &VisitedSet, id: &NodeId) -> UnknownReport {
        self(value, seen, id)
    }
}

/// Reflective type name of a value, as a script engine's `typeof` reports it
pub fn type_of(value: &Value) -> &'static str {
    match value {
        Value::Undefined => "undefined",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::BigInt(_) => "bigint",
        Value::String(_) => "string",
        Value::Symbol(_) => "symbol",
        Value::Function(_) => "function",
        Value::Null
        | Value::Buffer(_)
        | Value::Array(_)
        | Value::Map(_)
        | Value::Set(_)
        | Value::Object(_)
        | Value::External(_) => "object",
    }
}

/// Default handler: size zero, `typeof` diagnostic
///
/// Functions also report `name` and `arity`; host handles report `class`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeofHandler;

impl UnknownHandler for TypeofHandler {
    fn describe(&self, value: &Value, _seen: &VisitedSet, _id: &NodeId) -> UnknownReport {
        let report = UnknownReport::default().with_extra("typeof", type_of(value));
        match value {
            Value::Function(function) => report
                .with_extra("name", function.name())
                .with_extra("arity", function.arity()),
            Value::External(external) => report.with_extra("class", external.class()),
            _ => report,
        }
    }
}

/// Attributes a fixed size to every unknown value, keeping the `typeof`
/// diagnostic of [`TypeofHandler`]
#[derive(Debug, Clone, Copy)]
pub struct FixedSizeHandler {
    pub size: u64,
}

impl UnknownHandler for FixedSizeHandler {
    fn describe(&self, value: &Value, seen: &VisitedSet, id: &NodeId) -> UnknownReport {
        TypeofHandler.describe(value, seen, id).with_size(self.size)
    }
}
