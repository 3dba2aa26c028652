//! Approximate in-memory size estimation for dynamic value graphs
//!
//! This crate walks a graph of script-engine style values (scalars, symbols,
//! byte buffers, arrays, maps, sets, plain objects) and produces a tree of
//! [`SizeNode`]s mirroring the graph, each carrying an estimated byte size.
//!
//! # Features
//!
//! - **Cycle-safe**: composite values are tracked by reference identity;
//!   repeated references become zero-sized `circular` nodes
//! - **Addressable**: every node has a stable path id such as
//!   `{root}.users[3].name`, with `{key}` marking the key half of an entry
//! - **Pluggable scalars**: fixed heuristic costs, or exact encoded lengths
//!   through a binary codec (`serialized` feature, on by default)
//! - **Hookable**: node transforms and unknown-value handlers
//!
//! # Usage
//!
//! ```rust
//! use footprint_core::{estimate, Value};
//!
//! let value = Value::object([("name", Value::from("ada")), ("tags", Value::array(["a", "b"]))]);
//! let tree = estimate(&value)?;
//! assert_eq!(tree.size, tree.child_size_sum().unwrap_or(0));
//! # Ok::<(), footprint_core::FootprintError>(())
//! ```
//!
//! Heuristic sizing without the codec:
//! ```toml
//! [dependencies]
//! footprint-core = { version = "0.1", default-features = false }
//! ```

// Module declarations
pub mod classify;
pub mod config;
pub mod error;
pub mod estimator;
pub mod hooks;
pub mod node;
pub mod path;
pub mod sizing;
pub mod value;
pub mod visited;

// Re-export all public types and traits for convenience
pub use classify::{classify, NodeType, ValueKind};
pub use config::{EstimateConfig, EstimateOptions, DEFAULT_MAX_DEPTH};
pub use error::{FootprintError, Result};
pub use estimator::Estimator;
pub use hooks::{
    pruned_bytes, FixedSizeHandler, IdentityTransform, NodeTransform, PruneBelow, RedactEntries,
    SortBySize, TransformChain, TypeofHandler, UnknownHandler, UnknownReport, PRUNED_EXTRA,
};
pub use node::{Children, Entry, Extras, SizeNode};
pub use path::{NodeId, Segment, DEFAULT_ROOT, KEY_MARKER};
pub use sizing::{HeuristicSizer, Scalar, ScalarCodec, ScalarSizer, SerializedSizer, SizingStrategy};
pub use value::{
    ArrayRef, BigInt, ExternalRef, FunctionRef, MapRef, ObjectRef, PropertyKey, SetRef, Symbol,
    Value,
};
pub use visited::VisitedSet;

#[cfg(feature = "serialized")]
pub use sizing::BincodeCodec;

/// Estimate a value with default options
pub fn estimate(value: &Value) -> Result<SizeNode> {
    estimate_with(value, &EstimateOptions::default())
}

/// Estimate a value with explicit options
pub fn estimate_with(value: &Value, options: &EstimateOptions) -> Result<SizeNode> {
    Estimator::new(options).estimate(value)
}
