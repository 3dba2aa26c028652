//! Recursive size estimation
//!
//! The [`Estimator`] walks a value depth-first. Each visited value is
//! classified once and sized by the rule for its kind:
//!
//! | kind | size |
//! |------|------|
//! | undefined, null | 0 |
//! | boolean, number, bigint, string | scalar strategy |
//! | symbol | registry key or description, under the scalar strategy |
//! | buffer | byte length |
//! | array, set | sum of members |
//! | map, object | sum of entries, each entry being key + value |
//! | unknown | whatever the unknown handler reports, 0 by default |
//!
//! Composite values are recorded in the [`VisitedSet`] before their children
//! are visited. Meeting the same reference again yields a `circular` node of
//! size 0 pointing at the first id, so shared values are counted once and
//! cycles terminate.

use crate::classify::{classify, NodeType, ValueKind};
use crate::config::EstimateOptions;
use crate::error::{FootprintError, Result};
use crate::node::{Children, Entry, SizeNode};
use crate::path::NodeId;
use crate::sizing::{symbol_size, Scalar};
use crate::value::Value;
use crate::visited::VisitedSet;
use tracing::{debug, trace, warn};

/// Size estimator bound to a set of options
#[derive(Debug, Clone, Copy)]
pub struct Estimator<'o> {
    options: &'o EstimateOptions,
}

impl<'o> Estimator<'o> {
    pub fn new(options: &'o EstimateOptions) -> Self {
        Self { options }
    }

    /// Estimate a value with fresh cycle state
    ///
    /// The traversal starts from a copy of the configured initial seen set,
    /// or from an empty set.
    pub fn estimate(&self, value: &Value) -> Result<SizeNode> {
        let mut seen = self.options.initial_seen().cloned().unwrap_or_default();
        self.estimate_with_seen(value, &mut seen)
    }

    /// Estimate a value against caller-owned cycle state
    ///
    /// Composite values already in `seen` report as circular, and every
    /// composite visited here is added to it. Use this to size several
    /// related roots without counting shared values twice.
    pub fn estimate_with_seen(&self, value: &Value, seen: &mut VisitedSet) -> Result<SizeNode> {
        let root = NodeId::root(self.options.root_id());
        let node = self.visit(value, root, seen, 0)?;
        debug!(
            root = %node.id,
            size = node.size,
            sizer = self.options.sizer().name(),
            tracked = seen.len(),
            "Estimate complete"
        );
        Ok(node)
    }

    fn visit(
        &self,
        value: &Value,
        id: NodeId,
        seen: &mut VisitedSet,
        depth: usize,
    ) -> Result<SizeNode> {
        let limit = self.options.max_depth();
        if depth > limit {
            warn!(id = %id, limit, "Maximum depth exceeded");
            return Err(FootprintError::DepthExceeded {
                id: id.to_string(),
                limit,
            });
        }

        let kind = classify(value);
        trace!(id = %id, ?kind, depth, "Visiting value");

        if kind.is_composite() {
            if let Some(composite) = value.as_composite() {
                if let Some(first_id) = seen.record(composite, id.clone()) {
                    trace!(id = %id, first = %first_id, "Circular reference");
                    return Ok(self.finish(SizeNode::circular(id, first_id)));
                }
            }
        }

        let node = match value {
            Value::Buffer(bytes) => SizeNode::leaf(id, NodeType::Buffer, bytes.len() as u64),
            Value::Null | Value::Undefined => SizeNode::leaf(id, kind.into(), 0),
            Value::Bool(b) => self.scalar(value, Scalar::Bool(*b), kind, id, seen),
            Value::Number(n) => self.scalar(value, Scalar::Number(*n), kind, id, seen),
            Value::BigInt(n) => self.scalar(value, Scalar::BigInt(n), kind, id, seen),
            Value::String(s) => self.scalar(value, Scalar::String(s), kind, id, seen),
            Value::Symbol(symbol) => match symbol_size(self.options.sizer(), symbol) {
                Ok(size) => SizeNode::leaf(id, NodeType::Symbol, size),
                Err(err) => self.unknown(value, id, seen, Some(err)),
            },
            Value::Array(array) => {
                let mut items = Vec::with_capacity(array.len());
                for (index, item) in array.items().iter().enumerate() {
                    items.push(self.visit(item, id.index(index), seen, depth + 1)?);
                }
                SizeNode::composite(id, NodeType::Array, Children::Sequence(items))
            }
            Value::Set(set) => {
                let mut items = Vec::with_capacity(set.len());
                for item in set.items().iter() {
                    let item_id = id.key(item.to_key_string());
                    items.push(self.visit(item, item_id, seen, depth + 1)?);
                }
                SizeNode::composite(id, NodeType::Set, Children::Sequence(items))
            }
            Value::Map(map) => {
                let mut entries = Vec::with_capacity(map.len());
                for (key, item) in map.entries().iter() {
                    entries.push(self.entry(key.to_key_string(), key, item, &id, seen, depth)?);
                }
                SizeNode::composite(id, NodeType::Map, Children::Entries(entries))
            }
            Value::Object(object) => {
                let properties = object.sized_entries();
                let mut entries = Vec::with_capacity(properties.len());
                for (key, item) in properties.iter() {
                    entries.push(self.entry(key.to_string(), &key.to_value(), item, &id, seen, depth)?);
                }
                SizeNode::composite(id, NodeType::Object, Children::Entries(entries))
            }
            Value::Function(_) | Value::External(_) => self.unknown(value, id, seen, None),
        };

        Ok(self.finish(node))
    }

    /// Size one key/value pair; the key node is visited first
    fn entry(
        &self,
        label: String,
        key: &Value,
        value: &Value,
        parent: &NodeId,
        seen: &mut VisitedSet,
        depth: usize,
    ) -> Result<Entry> {
        let value_id = parent.key(label.clone());
        let key_node = self.visit(key, value_id.key_marker(), seen, depth + 1)?;
        let value_node = self.visit(value, value_id, seen, depth + 1)?;
        Ok(Entry::new(label, key_node, value_node))
    }

    fn scalar(
        &self,
        value: &Value,
        scalar: Scalar<'_>,
        kind: ValueKind,
        id: NodeId,
        seen: &VisitedSet,
    ) -> SizeNode {
        match self.options.sizer().size_of(scalar) {
            Ok(size) => SizeNode::leaf(id, kind.into(), size),
            Err(err) => self.unknown(value, id, seen, Some(err)),
        }
    }

    /// Build an unknown node from the handler's report
    ///
    /// `error` carries the codec failure when a scalar could not be sized.
    fn unknown(
        &self,
        value: &Value,
        id: NodeId,
        seen: &VisitedSet,
        error: Option<FootprintError>,
    ) -> SizeNode {
        let report = self.options.unknown_handler().describe(value, seen, &id);
        let mut node = SizeNode::leaf(id, NodeType::Unknown, report.size);
        node.extra = report.extra;
        if let Some(err) = error {
            warn!(id = %node.id, error = %err, "Scalar could not be sized");
            node.extra
                .insert("error".into(), serde_json::Value::String(err.to_string()));
        }
        node
    }

    fn finish(&self, node: SizeNode) -> SizeNode {
        self.options.transform().transform(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MAX_DEPTH;
    use crate::hooks::{FixedSizeHandler, SortBySize, UnknownReport};
    use crate::sizing::{HeuristicSizer, RejectingCodec, SerializedSizer};
    use crate::value::{ArrayRef, ExternalRef, FunctionRef, MapRef, ObjectRef, SetRef, Symbol};
    use std::cell::Cell;
    use std::rc::Rc;

    fn heuristic() -> EstimateOptions {
        EstimateOptions::new().with_sizer(Box::new(HeuristicSizer))
    }

    fn run(value: &Value) -> SizeNode {
        Estimator::new(&heuristic()).estimate(value).unwrap()
    }

    #[test]
    fn test_string_heuristic() {
        let node = run(&Value::from("ab"));
        assert_eq!(node.node_type, NodeType::String);
        assert_eq!(node.size, 4);
        assert_eq!(node.id.to_string(), "{root}");
        assert!(node.values.is_none());
    }

    #[test]
    fn test_single_property_object() {
        let node = run(&Value::object([("a", 1)]));
        assert_eq!(node.node_type, NodeType::Object);
        // key "a" is 2 bytes, the number is 8
        assert_eq!(node.size, 10);
        let entry = node.entry("a").unwrap();
        assert_eq!(entry.key.size, 2);
        assert_eq!(entry.key.id.to_string(), "{root}.a{key}");
        assert_eq!(entry.value.size, 8);
        assert_eq!(entry.value.id.to_string(), "{root}.a");
        assert_eq!(node.values.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_empty_array() {
        let node = run(&Value::array(Vec::<Value>::new()));
        assert_eq!(node.node_type, NodeType::Array);
        assert_eq!(node.size, 0);
        assert!(matches!(&node.values, Some(Children::Sequence(items)) if items.is_empty()));
    }

    #[test]
    fn test_self_reference() {
        let object = ObjectRef::new();
        object.set("self", object.clone());
        let node = run(&Value::from(object.clone()));

        let value = &node.entry("self").unwrap().value;
        assert_eq!(value.node_type, NodeType::Circular);
        assert_eq!(value.size, 0);
        assert_eq!(value.circular_id.as_ref().unwrap().to_string(), "{root}");
        // only the key "self" is counted
        assert_eq!(node.size, 8);
        assert_eq!(node.circular_nodes().len(), 1);

        object.clear();
    }

    #[test]
    fn test_buffer() {
        let node = run(&Value::buffer(vec![0u8; 10]));
        assert_eq!(node.node_type, NodeType::Buffer);
        assert_eq!(node.size, 10);
    }

    #[test]
    fn test_null_and_undefined() {
        assert_eq!(run(&Value::Null).size, 0);
        assert_eq!(run(&Value::Null).node_type, NodeType::Null);
        assert_eq!(run(&Value::Undefined).node_type, NodeType::Undefined);
    }

    #[test]
    fn test_shared_reference_counted_once() {
        let shared = Value::array(["xyz"]);
        let root = Value::array([shared.clone(), shared]);
        let node = run(&root);

        assert_eq!(node.item(0).unwrap().size, 6);
        let second = node.item(1).unwrap();
        assert!(second.is_circular());
        assert_eq!(second.circular_id.as_ref().unwrap().to_string(), "{root}[0]");
        assert_eq!(node.size, 6);
    }

    #[test]
    fn test_identical_but_distinct_values_expand() {
        let root = Value::array([Value::object([("k", "v")]), Value::object([("k", "v")])]);
        let node = run(&root);
        assert!(node.circular_nodes().is_empty());
        assert_eq!(node.item(0).unwrap().size, node.item(1).unwrap().size);
        assert_eq!(node.size, 2 * node.item(0).unwrap().size);
    }

    #[test]
    fn test_indirect_cycle() {
        let a = ObjectRef::new();
        let b = ArrayRef::new();
        a.set("list", b.clone());
        b.push(a.clone());
        let node = run(&Value::from(a.clone()));

        let back = node.find("{root}.list[0]").unwrap();
        assert!(back.is_circular());
        assert_eq!(back.circular_id.as_ref().unwrap().to_string(), "{root}");

        a.clear();
    }

    #[test]
    fn test_map_entries() {
        let map = MapRef::new();
        let key_object = ObjectRef::new();
        key_object.set("id", 7);
        map.insert("name", "ab");
        map.insert(key_object, true);
        let node = run(&Value::from(map));

        assert_eq!(node.node_type, NodeType::Map);
        let named = node.entry("name").unwrap();
        assert_eq!(named.size, 8 + 4);
        let object_key = node.entry("[object Object]").unwrap();
        assert_eq!(object_key.key.node_type, NodeType::Object);
        assert_eq!(object_key.key.id.to_string(), "{root}.[object Object]{key}");
        assert_eq!(object_key.size, (4 + 8) + 4);
        assert_eq!(node.size, 12 + 16);
    }

    #[test]
    fn test_weak_collections_size_like_strong() {
        let weak = MapRef::new_weak();
        weak.insert("k", 1);
        let strong = MapRef::new();
        strong.insert("k", 1);
        assert_eq!(run(&Value::from(weak)).size, run(&Value::from(strong)).size);

        let set = SetRef::new_weak();
        set.add("member");
        let node = run(&Value::from(set));
        assert_eq!(node.node_type, NodeType::Set);
        assert_eq!(node.size, 12);
        assert_eq!(node.item(0).unwrap().id.to_string(), "{root}.member");
    }

    #[test]
    fn test_symbols_as_values_and_keys() {
        let tag = Symbol::new("tag");
        let object = ObjectRef::new();
        object.set(tag.clone(), 1);
        object.define("hidden", 1, false);
        let node = run(&Value::from(object));

        // hidden string key is skipped; symbol key is sized by its description
        assert_eq!(node.values.as_ref().unwrap().len(), 1);
        let entry = node.entry("Symbol(tag)").unwrap();
        assert_eq!(entry.key.node_type, NodeType::Symbol);
        assert_eq!(entry.key.size, 6);
        assert_eq!(node.size, 14);

        assert_eq!(run(&Value::from(Symbol::global("k"))).size, 2);
    }

    #[test]
    fn test_unknown_values() {
        let node = run(&Value::array([
            Value::from(FunctionRef::new("handler", 2)),
            Value::from(ExternalRef::new("Socket")),
        ]));
        assert_eq!(node.size, 0);
        let function = node.item(0).unwrap();
        assert_eq!(function.node_type, NodeType::Unknown);
        assert_eq!(function.extra["typeof"], "function");
        assert_eq!(node.item(1).unwrap().extra["class"], "Socket");
    }

    #[test]
    fn test_unknown_handler_sizing_policy() {
        let options = heuristic().with_unknown_handler(FixedSizeHandler { size: 32 });
        let root = Value::array([Value::from(FunctionRef::new("f", 0)), Value::from(1)]);
        let node = Estimator::new(&options).estimate(&root).unwrap();
        assert_eq!(node.size, 40);
    }

    #[test]
    fn test_unknown_handler_sees_visited_set() {
        let options = heuristic().with_unknown_handler(
            |_value: &Value, seen: &VisitedSet, id: &NodeId| {
                UnknownReport::default()
                    .with_extra("tracked", seen.len() as u64)
                    .with_extra("at", id.to_string())
            },
        );
        let root = Value::object([("run", Value::from(FunctionRef::new("run", 0)))]);
        let node = Estimator::new(&options).estimate(&root).unwrap();
        let unknown = &node.entry("run").unwrap().value;
        assert_eq!(unknown.extra["tracked"], 1);
        assert_eq!(unknown.extra["at"], "{root}.run");
    }

    #[test]
    fn test_codec_failure_becomes_unknown() {
        let options = EstimateOptions::new().with_sizer(Box::new(SerializedSizer::new(RejectingCodec)));
        let node = Estimator::new(&options)
            .estimate(&Value::array([Value::from(1), Value::Null]))
            .unwrap();
        let failed = node.item(0).unwrap();
        assert_eq!(failed.node_type, NodeType::Unknown);
        assert_eq!(failed.size, 0);
        assert_eq!(failed.extra["typeof"], "number");
        assert!(failed.extra["error"].as_str().unwrap().contains("codec refused"));
        assert_eq!(node.item(1).unwrap().node_type, NodeType::Null);
    }

    #[test]
    fn test_depth_limit() {
        let mut value = Value::from(1);
        for _ in 0..5 {
            value = Value::array([value]);
        }
        let options = heuristic().with_max_depth(3);
        let err = Estimator::new(&options).estimate(&value).unwrap_err();
        match err {
            FootprintError::DepthExceeded { id, limit } => {
                assert_eq!(limit, 3);
                assert_eq!(id, "{root}[0][0][0][0]");
            }
            other => panic!("Expected depth error, got {:?}", other),
        }

        let options = heuristic().with_max_depth(5);
        assert_eq!(Estimator::new(&options).estimate(&value).unwrap().size, 8);
    }

    fn nested_arrays(levels: usize) -> Value {
        let mut value = Value::from(1);
        for _ in 0..levels {
            value = Value::array([value]);
        }
        value
    }

    fn nested_objects(levels: usize) -> Value {
        let mut value = Value::from(1);
        for _ in 0..levels {
            value = Value::object([("next", value)]);
        }
        value
    }

    #[test]
    fn test_default_depth_limit_fits_the_stack() {
        let options = heuristic();
        assert_eq!(options.max_depth(), DEFAULT_MAX_DEPTH);
        let estimator = Estimator::new(&options);

        // deepest graphs the default accepts
        let arrays = estimator.estimate(&nested_arrays(DEFAULT_MAX_DEPTH)).unwrap();
        assert_eq!(arrays.size, 8);
        let objects = estimator.estimate(&nested_objects(DEFAULT_MAX_DEPTH)).unwrap();
        assert_eq!(objects.size, 8 + 8 * DEFAULT_MAX_DEPTH as u64);

        // anything deeper is reported instead of overflowing
        for value in [nested_arrays(1000), nested_objects(1000)] {
            match estimator.estimate(&value) {
                Err(FootprintError::DepthExceeded { limit, .. }) => {
                    assert_eq!(limit, DEFAULT_MAX_DEPTH)
                }
                other => panic!("Expected depth error, got {:?}", other.map(|n| n.size)),
            }
        }
    }

    #[test]
    fn test_transform_applies_to_every_node() {
        let count = Rc::new(Cell::new(0));
        let counter = count.clone();
        let options = heuristic().with_transform(move |node: SizeNode| {
            counter.set(counter.get() + 1);
            node
        });
        let object = ObjectRef::new();
        object.set("list", Value::array([1, 2]));
        object.set("me", object.clone());
        let node = Estimator::new(&options).estimate(&Value::from(object.clone())).unwrap();

        // root, two keys, list, two items, circular
        assert_eq!(count.get(), node.node_count());
        assert_eq!(count.get(), 7);
        object.clear();
    }

    #[test]
    fn test_parent_sums_transformed_children() {
        let options = heuristic().with_transform(|mut node: SizeNode| {
            if node.node_type == NodeType::Number {
                node.size = 1;
            }
            node
        });
        let node = Estimator::new(&options)
            .estimate(&Value::array([1, 2, 3]))
            .unwrap();
        assert_eq!(node.size, 3);
    }

    #[test]
    fn test_sorted_output() {
        let options = heuristic().with_transform(SortBySize);
        let node = Estimator::new(&options)
            .estimate(&Value::array([Value::from(true), Value::from("long string")]))
            .unwrap();
        assert_eq!(node.item(0).unwrap().id.to_string(), "{root}[1]");
    }

    #[test]
    fn test_custom_root_id() {
        let options = heuristic().with_root_id("session");
        let node = Estimator::new(&options)
            .estimate(&Value::object([("user", Value::array(["x"]))]))
            .unwrap();
        assert_eq!(node.id.to_string(), "session");
        assert!(node.find("session.user[0]").is_some());
    }

    #[test]
    fn test_initial_seen_is_copied_per_call() {
        let shared = Value::object([("k", 1)]);
        let mut seed = VisitedSet::new();
        seed.seed(&shared, NodeId::root("cache"));

        let options = heuristic().with_initial_seen(seed);
        let estimator = Estimator::new(&options);
        let root = Value::array([shared.clone(), Value::from(true)]);

        for _ in 0..2 {
            let node = estimator.estimate(&root).unwrap();
            let first = node.item(0).unwrap();
            assert!(first.is_circular());
            assert_eq!(first.circular_id.as_ref().unwrap().to_string(), "cache");
            assert_eq!(node.size, 4);
        }
        assert_eq!(options.initial_seen().unwrap().len(), 1);
    }

    #[test]
    fn test_shared_state_across_calls() {
        let shared = Value::array(["abc"]);
        let first = Value::object([("a", shared.clone())]);
        let second = Value::object([("b", shared)]);
        let options = heuristic();
        let estimator = Estimator::new(&options);

        let mut seen = VisitedSet::new();
        let one = estimator.estimate_with_seen(&first, &mut seen).unwrap();
        let two = estimator.estimate_with_seen(&second, &mut seen).unwrap();
        assert_eq!(one.size, 2 + 6);
        assert_eq!(two.size, 2);
        assert!(two.entry("b").unwrap().value.is_circular());

        // without explicit sharing, unrelated calls never report cycles
        let fresh = estimator.estimate(&second).unwrap();
        assert_eq!(fresh.size, 8);
    }

    #[test]
    fn test_deterministic_scalars() {
        let options = EstimateOptions::new();
        let estimator = Estimator::new(&options);
        for value in [Value::from("héllo"), Value::from(3.25), Value::from(true)] {
            let a = estimator.estimate(&value).unwrap();
            let b = estimator.estimate(&value).unwrap();
            assert_eq!(a.size, b.size);
            assert_eq!(a.node_type, b.node_type);
        }
    }
}
