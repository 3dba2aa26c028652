//! Type classification
//!
//! Every visited value is classified exactly once into a closed set of kinds.
//! The estimator dispatches on the kind, never on the value directly.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a visited value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Buffer,
    Null,
    Undefined,
    Boolean,
    Number,
    BigInt,
    String,
    Symbol,
    Array,
    Map,
    Set,
    Object,
    Unknown,
}

impl ValueKind {
    /// Whether values of this kind have children and take part in cycle tracking
    pub fn is_composite(self) -> bool {
        matches!(
            self,
            ValueKind::Array | ValueKind::Map | ValueKind::Set | ValueKind::Object
        )
    }
}

/// Classify a value
///
/// Kinds are tested in a fixed priority order and the first match wins:
/// buffer, null, primitive scalars, symbol, array, map (strong or weak),
/// set (strong or weak), generic object, and finally unknown for callables
/// and host handles.
pub fn classify(value: &Value) -> ValueKind {
    match value {
        Value::Buffer(_) => ValueKind::Buffer,
        Value::Null => ValueKind::Null,
        Value::Undefined => ValueKind::Undefined,
        Value::Bool(_) => ValueKind::Boolean,
        Value::Number(_) => ValueKind::Number,
        Value::BigInt(_) => ValueKind::BigInt,
        Value::String(_) => ValueKind::String,
        Value::Symbol(_) => ValueKind::Symbol,
        Value::Array(_) => ValueKind::Array,
        Value::Map(_) => ValueKind::Map,
        Value::Set(_) => ValueKind::Set,
        Value::Object(_) => ValueKind::Object,
        Value::Function(_) | Value::External(_) => ValueKind::Unknown,
    }
}

/// The `type` tag of a result node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Undefined,
    String,
    Boolean,
    Number,
    BigInt,
    Symbol,
    Null,
    Buffer,
    Array,
    Map,
    Set,
    Object,
    Unknown,
    /// Back-reference to a value already visited in this traversal
    Circular,
}

impl NodeType {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Undefined => "undefined",
            NodeType::String => "string",
            NodeType::Boolean => "boolean",
            NodeType::Number => "number",
            NodeType::BigInt => "bigint",
            NodeType::Symbol => "symbol",
            NodeType::Null => "null",
            NodeType::Buffer => "buffer",
            NodeType::Array => "array",
            NodeType::Map => "map",
            NodeType::Set => "set",
            NodeType::Object => "object",
            NodeType::Unknown => "unknown",
            NodeType::Circular => "circular",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ValueKind> for NodeType {
    fn from(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Buffer => NodeType::Buffer,
            ValueKind::Null => NodeType::Null,
            ValueKind::Undefined => NodeType::Undefined,
            ValueKind::Boolean => NodeType::Boolean,
            ValueKind::Number => NodeType::Number,
            ValueKind::BigInt => NodeType::BigInt,
            ValueKind::String => NodeType::String,
            ValueKind::Symbol => NodeType::Symbol,
            ValueKind::Array => NodeType::Array,
            ValueKind::Map => NodeType::Map,
            ValueKind::Set => NodeType::Set,
            ValueKind::Object => NodeType::Object,
            ValueKind::Unknown => NodeType::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{ExternalRef, FunctionRef, MapRef, SetRef, Symbol};

    #[test]
    fn test_classify_scalars() {
        assert_eq!(classify(&Value::Undefined), ValueKind::Undefined);
        assert_eq!(classify(&Value::Null), ValueKind::Null);
        assert_eq!(classify(&Value::from(true)), ValueKind::Boolean);
        assert_eq!(classify(&Value::from(3.5)), ValueKind::Number);
        assert_eq!(classify(&Value::from("s")), ValueKind::String);
        assert_eq!(classify(&Value::from(Symbol::new("s"))), ValueKind::Symbol);
        assert_eq!(classify(&Value::buffer(vec![0u8; 4])), ValueKind::Buffer);
    }

    #[test]
    fn test_classify_composites() {
        assert_eq!(classify(&Value::array(Vec::<Value>::new())), ValueKind::Array);
        assert_eq!(classify(&Value::from(MapRef::new_weak())), ValueKind::Map);
        assert_eq!(classify(&Value::from(SetRef::new_weak())), ValueKind::Set);
        assert_eq!(classify(&Value::object([("a", 1)])), ValueKind::Object);
        assert!(ValueKind::Set.is_composite());
        assert!(!ValueKind::Buffer.is_composite());
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(
            classify(&Value::from(FunctionRef::new("f", 0))),
            ValueKind::Unknown
        );
        assert_eq!(
            classify(&Value::from(ExternalRef::new("Promise"))),
            ValueKind::Unknown
        );
    }

    #[test]
    fn test_node_type_serialization() {
        assert_eq!(serde_json::to_string(&NodeType::BigInt).unwrap(), "\"bigint\"");
        assert_eq!(
            serde_json::to_string(&NodeType::Circular).unwrap(),
            "\"circular\""
        );
        assert_eq!(NodeType::from(ValueKind::Map).to_string(), "map");
    }
}
