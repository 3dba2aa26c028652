//! End-to-end tests over hand-built value graphs
//!
//! Covers what JSON documents cannot express:
//! - self references and cycles through maps
//! - shared children
//! - buffers, big integers, sets, symbols and callables
//! - cycle state shared across estimates

use crate::fixtures::{cyclic_graph, exotic_graph};
use crate::utils::*;
use anyhow::Result;
use footprint_core::{Estimator, FixedSizeHandler, NodeId, NodeType, Value, VisitedSet};

/// Run all graph tests
pub fn run_tests() -> Result<()> {
    println!("    Testing cyclic graph...");
    test_cyclic_graph()?;

    println!("    Testing exotic kinds...");
    test_exotic_graph()?;

    println!("    Testing unknown sizing policy...");
    test_unknown_policy()?;

    println!("    Testing shared cycle state...");
    test_shared_state()?;

    Ok(())
}

fn test_cyclic_graph() -> Result<()> {
    let root = cyclic_graph();
    let options = heuristic_options();
    let tree = Estimator::new(&options).estimate(&Value::from(root.clone()));
    // break the reference cycle before any early return
    root.clear();
    let tree = tree?;

    assertions::assert_size(&tree, 50)?;
    assertions::assert_circular(&tree, "{root}.self", "{root}")?;
    assertions::assert_circular(&tree, "{root}.right", "{root}.left")?;
    assertions::assert_circular(&tree, "{root}.index.back", "{root}")?;
    assertions::assert_node_size(&tree, "{root}.left[0]", 6)?;
    if tree.circular_nodes().len() != 3 {
        return Err(anyhow::anyhow!(
            "Expected 3 circular nodes, got {}",
            tree.circular_nodes().len()
        ));
    }
    TreeValidator::validate(&tree)
}

fn test_exotic_graph() -> Result<()> {
    let options = heuristic_options();
    let tree = Estimator::new(&options).estimate(&Value::from(exotic_graph()))?;

    assertions::assert_size(&tree, 112)?;
    assertions::assert_node_size(&tree, "{root}.bytes", 16)?;
    assertions::assert_node_size(&tree, "{root}.big", 16)?;
    assertions::assert_node_size(&tree, "{root}.tags", 14)?;
    assertions::assert_node_size(&tree, "{root}.tags.blue", 8)?;
    assertions::assert_node_size(&tree, "{root}.id", 14)?;
    assertions::assert_node_size(&tree, "{root}.Symbol(meta){key}", 8)?;

    let callback = tree
        .find("{root}.callback")
        .ok_or_else(|| anyhow::anyhow!("Missing callback node"))?;
    if callback.node_type != NodeType::Unknown || callback.extra.get("typeof").is_none() {
        return Err(anyhow::anyhow!("Callback was not reported as unknown"));
    }
    TreeValidator::validate(&tree)
}

fn test_unknown_policy() -> Result<()> {
    let options = heuristic_options().with_unknown_handler(FixedSizeHandler { size: 64 });
    let tree = Estimator::new(&options).estimate(&Value::from(exotic_graph()))?;
    assertions::assert_node_size(&tree, "{root}.callback", 64)?;
    assertions::assert_size(&tree, 112 + 64)
}

fn test_shared_state() -> Result<()> {
    let shared = Value::array(["abc"]);
    let first = Value::object([("a", shared.clone())]);
    let second = Value::object([("b", shared.clone())]);

    let options = heuristic_options();
    let estimator = Estimator::new(&options);
    let mut seen = VisitedSet::new();
    let one = estimator.estimate_with_seen(&first, &mut seen)?;
    let two = estimator.estimate_with_seen(&second, &mut seen)?;
    assertions::assert_size(&one, 8)?;
    assertions::assert_size(&two, 2)?;
    assertions::assert_circular(&two, "{root}.b", "{root}.a")?;

    let mut seed = VisitedSet::new();
    seed.seed(&shared, NodeId::root("cache"));
    let options = heuristic_options().with_initial_seen(seed);
    let tree = Estimator::new(&options).estimate(&second)?;
    assertions::assert_circular(&tree, "{root}.b", "cache")
}
