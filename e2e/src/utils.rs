//! Utility functions for end-to-end testing
//!
//! This module provides helpers for running scenarios and validating the
//! result trees they produce.

use crate::fixtures::Scenario;
use anyhow::{Context, Result};
use footprint_core::{estimate_with, pruned_bytes, EstimateOptions, HeuristicSizer, SizeNode};
use tracing::debug;

/// Runs scenarios and checks their outcome
pub struct ScenarioRunner {
    verbose: bool,
}

impl ScenarioRunner {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Estimate a scenario input under its configuration
    pub fn estimate(&self, scenario: &Scenario) -> Result<SizeNode> {
        let options = EstimateOptions::from_config(&scenario.config)
            .with_context(|| format!("Invalid options for {}", scenario.name))?;
        let tree = estimate_with(&scenario.value(), &options)?;
        if self.verbose {
            println!("{}", serde_json::to_string_pretty(&tree)?);
        }
        Ok(tree)
    }

    /// Run a scenario and compare it to its expectations
    pub fn run(&self, scenario: &Scenario) -> Result<()> {
        debug!(scenario = %scenario.name, "{}", scenario.description);
        let expected = &scenario.expected;

        let outcome = EstimateOptions::from_config(&scenario.config)
            .and_then(|options| estimate_with(&scenario.value(), &options));
        let tree = match (outcome, &expected.error) {
            (Err(err), Some(message)) => {
                return assertions::assert_output_contains(&err.to_string(), message);
            }
            (Err(err), None) => {
                return Err(anyhow::anyhow!("Scenario {} failed: {}", scenario.name, err));
            }
            (Ok(_), Some(message)) => {
                return Err(anyhow::anyhow!(
                    "Scenario {} succeeded when an error containing '{}' was expected",
                    scenario.name,
                    message
                ));
            }
            (Ok(tree), None) => tree,
        };
        if self.verbose {
            println!("{}", serde_json::to_string_pretty(&tree)?);
        }

        if let Some(node_type) = &expected.node_type {
            assertions::assert_type(&tree, node_type)?;
        }
        if let Some(size) = expected.size {
            assertions::assert_size(&tree, size)?;
        }
        for (id, size) in &expected.nodes {
            assertions::assert_node_size(&tree, id, *size)?;
        }
        for id in &expected.absent {
            assertions::assert_absent(&tree, id)?;
        }
        TreeValidator::validate(&tree)
    }
}

/// Options using fixed per-type costs, so expected sizes are easy to derive
pub fn heuristic_options() -> EstimateOptions {
    EstimateOptions::new().with_sizer(Box::new(HeuristicSizer))
}

/// Structural checks every result tree must pass
pub struct TreeValidator;

impl TreeValidator {
    /// Validate size aggregation and circular node shape across the tree
    pub fn validate(tree: &SizeNode) -> Result<()> {
        for node in tree.walk() {
            if let Some(sum) = node.child_size_sum() {
                // pruned children keep their bytes in the parent
                let pruned = pruned_bytes(node);
                if sum + pruned != node.size {
                    return Err(anyhow::anyhow!(
                        "Node {} has size {} but its children sum to {} (+{} pruned)",
                        node.id,
                        node.size,
                        sum,
                        pruned
                    ));
                }
            }
            if node.is_circular() && (node.size != 0 || node.circular_id.is_none()) {
                return Err(anyhow::anyhow!("Malformed circular node at {}", node.id));
            }
            if !node.is_circular() && node.circular_id.is_some() {
                return Err(anyhow::anyhow!("Non-circular node {} carries a circular id", node.id));
            }
        }
        Self::validate_json(tree)
    }

    /// Validate that the tree serializes with the expected top-level keys
    pub fn validate_json(tree: &SizeNode) -> Result<()> {
        let json = tree.to_json();
        for key in ["id", "type", "size"] {
            assertions::assert_json_contains(&json, key)?;
        }
        Ok(())
    }
}

/// Assertion helpers for common test patterns
pub mod assertions {
    use super::*;

    /// Assert that output contains expected text
    pub fn assert_output_contains(output: &str, expected: &str) -> Result<()> {
        if !output.contains(expected) {
            return Err(anyhow::anyhow!(
                "Output does not contain expected text '{}'. Actual output: {}",
                expected,
                output
            ));
        }
        Ok(())
    }

    pub fn assert_type(tree: &SizeNode, expected: &str) -> Result<()> {
        if tree.node_type.as_str() != expected {
            return Err(anyhow::anyhow!(
                "Expected root type {}, got {}",
                expected,
                tree.node_type
            ));
        }
        Ok(())
    }

    pub fn assert_size(tree: &SizeNode, expected: u64) -> Result<()> {
        if tree.size != expected {
            return Err(anyhow::anyhow!(
                "Expected total size {}, got {}",
                expected,
                tree.size
            ));
        }
        Ok(())
    }

    /// Assert that a node exists and has the given size
    pub fn assert_node_size(tree: &SizeNode, id: &str, expected: u64) -> Result<()> {
        let node = tree
            .find(id)
            .ok_or_else(|| anyhow::anyhow!("Node {} not found in tree", id))?;
        if node.size != expected {
            return Err(anyhow::anyhow!(
                "Expected {} to be {} bytes, got {}",
                id,
                expected,
                node.size
            ));
        }
        Ok(())
    }

    pub fn assert_absent(tree: &SizeNode, id: &str) -> Result<()> {
        if tree.find(id).is_some() {
            return Err(anyhow::anyhow!("Node {} should not be in the tree", id));
        }
        Ok(())
    }

    /// Assert that a node is a back-reference to `first_id`
    pub fn assert_circular(tree: &SizeNode, id: &str, first_id: &str) -> Result<()> {
        let node = tree
            .find(id)
            .ok_or_else(|| anyhow::anyhow!("Node {} not found in tree", id))?;
        match &node.circular_id {
            Some(target) if node.is_circular() && *target == first_id => Ok(()),
            other => Err(anyhow::anyhow!(
                "Expected {} to point at {}, found {:?}",
                id,
                first_id,
                other.as_ref().map(ToString::to_string)
            )),
        }
    }

    /// Assert that JSON contains expected key
    pub fn assert_json_contains(json: &serde_json::Value, expected_key: &str) -> Result<()> {
        if json.get(expected_key).is_none() {
            return Err(anyhow::anyhow!(
                "JSON does not contain expected key '{}'. Available keys: {:?}",
                expected_key,
                json.as_object().map(|o| o.keys().collect::<Vec<_>>())
            ));
        }
        Ok(())
    }
}
