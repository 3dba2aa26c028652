//! Test fixtures for end-to-end estimator scenarios
//!
//! Scenarios are JSON documents pairing an input value with estimator
//! configuration and the expected shape of the result tree.

use anyhow::{Context, Result};
use footprint_core::{EstimateConfig, MapRef, ObjectRef, SetRef, Symbol, Value};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Expected outcome of a scenario
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Expected {
    /// Node type of the root
    #[serde(rename = "type")]
    pub node_type: Option<String>,
    /// Total size of the root
    pub size: Option<u64>,
    /// Sizes of individual nodes by id
    pub nodes: BTreeMap<String, u64>,
    /// Ids that must not appear in the tree
    pub absent: Vec<String>,
    /// Expected error message; the estimate must fail
    pub error: Option<String>,
}

/// One estimator scenario
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: String,
    pub input: serde_json::Value,
    #[serde(default)]
    pub config: EstimateConfig,
    pub expected: Expected,
}

impl Scenario {
    /// The scenario input as an estimator value
    pub fn value(&self) -> Value {
        Value::from(self.input.clone())
    }
}

/// Test fixtures containing all scenario data
pub struct TestFixtures {
    /// JSON scenarios, in file order
    pub scenarios: Vec<Scenario>,
}

impl TestFixtures {
    /// Load every fixture bundled with the runner
    pub fn new() -> Result<Self> {
        let content = include_str!("../fixtures/scenarios.json");
        let scenarios: Vec<Scenario> =
            serde_json::from_str(content).context("Failed to parse scenario fixtures")?;
        for scenario in &scenarios {
            scenario
                .config
                .validate()
                .with_context(|| format!("Invalid config in scenario {}", scenario.name))?;
        }
        Ok(Self { scenarios })
    }

    /// Look up a scenario by name
    pub fn scenario(&self, name: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.name == name)
    }
}

/// Object graph with a self-reference, a shared child and a cycle through a map
///
/// ```text
/// root = { self: root, left: shared, right: shared, index: Map { "back" => root } }
/// shared = ["abc"]
/// ```
pub fn cyclic_graph() -> ObjectRef {
    let root = ObjectRef::new();
    let shared = Value::array(["abc"]);
    let index = MapRef::new();
    index.insert("back", root.clone());

    root.set("self", root.clone());
    root.set("left", shared.clone());
    root.set("right", shared);
    root.set("index", index);
    root
}

/// Graph mixing every non-JSON kind the estimator understands
pub fn exotic_graph() -> ObjectRef {
    let root = ObjectRef::new();
    let tags = SetRef::new();
    tags.add("red");
    tags.add("red");
    tags.add("blue");

    root.set("bytes", Value::buffer(vec![0u8; 16]));
    root.set("big", footprint_core::BigInt::from(u128::MAX));
    root.set("tags", tags);
    root.set("id", Symbol::new("session"));
    root.set(Symbol::global("meta"), Value::Undefined);
    root.set("callback", footprint_core::FunctionRef::new("onClose", 1));
    root
}
