//! Estimator configuration
//!
//! [`EstimateOptions`] is the runtime configuration handed to the estimator:
//! root id, hooks, scalar strategy, depth limit and optional pre-seeded cycle
//! state. [`EstimateConfig`] is its serializable subset, suitable for loading
//! from JSON documents.
//!
//! ```rust
//! use footprint_core::{EstimateConfig, EstimateOptions};
//!
//! let config = EstimateConfig::from_json_str(r#"{"strategy": "heuristic", "sort_children": true}"#)?;
//! let options = EstimateOptions::from_config(&config)?;
//! assert_eq!(options.root_id(), "{root}");
//! # Ok::<(), footprint_core::FootprintError>(())
//! ```

use crate::error::{FootprintError, Result};
use crate::hooks::{
    IdentityTransform, NodeTransform, PruneBelow, RedactEntries, SortBySize, TransformChain,
    TypeofHandler, UnknownHandler,
};
use crate::path::DEFAULT_ROOT;
use crate::sizing::{default_sizer, ScalarSizer, SizingStrategy};
use crate::visited::VisitedSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default recursion limit
///
/// Each nesting level costs up to two estimator frames (entry and value), so
/// the limit is kept well inside the 2 MiB stack of a spawned thread in
/// unoptimized builds. Raise it only together with the stack size.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Serializable estimator settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EstimateConfig {
    /// Id of the top node
    pub root_id: String,
    /// Scalar sizing strategy
    pub strategy: SizingStrategy,
    /// Maximum nesting depth before the estimate fails
    pub max_depth: usize,
    /// Order children largest first
    pub sort_children: bool,
    /// Drop children smaller than this many bytes from the output
    pub prune_below: Option<u64>,
    /// Entry labels whose nested structure is hidden
    pub redact: Vec<String>,
}

impl Default for EstimateConfig {
    fn default() -> Self {
        Self {
            root_id: DEFAULT_ROOT.into(),
            strategy: SizingStrategy::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            sort_children: false,
            prune_below: None,
            redact: Vec::new(),
        }
    }
}

impl EstimateConfig {
    /// Parse and validate a JSON configuration document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.root_id.is_empty() {
            return Err(FootprintError::config("root_id must not be empty"));
        }
        if self.max_depth == 0 {
            return Err(FootprintError::config("max_depth must be at least 1"));
        }
        Ok(())
    }
}

/// Runtime estimator options
pub struct EstimateOptions {
    root_id: String,
    transform: Box<dyn NodeTransform>,
    unknown_handler: Box<dyn UnknownHandler>,
    initial_seen: Option<VisitedSet>,
    sizer: Box<dyn ScalarSizer>,
    max_depth: usize,
}

impl Default for EstimateOptions {
    fn default() -> Self {
        Self {
            root_id: DEFAULT_ROOT.into(),
            transform: Box::new(IdentityTransform),
            unknown_handler: Box::new(TypeofHandler),
            initial_seen: None,
            sizer: default_sizer(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl EstimateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build options from serializable settings
    ///
    /// Sorting runs after pruning, and redaction after both.
    pub fn from_config(config: &EstimateConfig) -> Result<Self> {
        config.validate()?;

        let mut chain = TransformChain::new();
        if let Some(min_size) = config.prune_below {
            chain = chain.then(PruneBelow { min_size });
        }
        if config.sort_children {
            chain = chain.then(SortBySize);
        }
        if !config.redact.is_empty() {
            chain = chain.then(RedactEntries::new(config.redact.iter().cloned()));
        }

        let options = Self::new()
            .with_root_id(config.root_id.clone())
            .with_sizer(config.strategy.sizer()?)
            .with_max_depth(config.max_depth);
        Ok(if chain.is_empty() {
            options
        } else {
            options.with_transform(chain)
        })
    }

    pub fn with_root_id(mut self, root_id: impl Into<String>) -> Self {
        self.root_id = root_id.into();
        self
    }

    /// Replace the node transform applied to every node
    pub fn with_transform(mut self, transform: impl NodeTransform + 'static) -> Self {
        self.transform = Box::new(transform);
        self
    }

    pub fn with_unknown_handler(mut self, handler: impl UnknownHandler + 'static) -> Self {
        self.unknown_handler = Box::new(handler);
        self
    }

    /// Start every traversal from a copy of `seen`
    ///
    /// Values recorded in the seed report as circular references to their
    /// seeded ids. The seed itself is never modified.
    pub fn with_initial_seen(mut self, seen: VisitedSet) -> Self {
        self.initial_seen = Some(seen);
        self
    }

    pub fn with_sizer(mut self, sizer: Box<dyn ScalarSizer>) -> Self {
        self.sizer = sizer;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn initial_seen(&self) -> Option<&VisitedSet> {
        self.initial_seen.as_ref()
    }

    pub fn sizer(&self) -> &dyn ScalarSizer {
        self.sizer.as_ref()
    }

    pub fn transform(&self) -> &dyn NodeTransform {
        self.transform.as_ref()
    }

    pub fn unknown_handler(&self) -> &dyn UnknownHandler {
        self.unknown_handler.as_ref()
    }
}

impl fmt::Debug for EstimateOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EstimateOptions")
            .field("root_id", &self.root_id)
            .field("sizer", &self.sizer.name())
            .field("max_depth", &self.max_depth)
            .field("seeded", &self.initial_seen.as_ref().map(VisitedSet::len))
            .finish_non_exhaustive()
    }
}
