//! End-to-end test suite for the footprint estimator
//!
//! This binary runs the bundled scenarios and graph checks against the
//! public estimator API and reports a pass/fail summary.

use anyhow::Result;
use clap::Parser;

mod fixtures;
mod test_graphs;
mod test_scenarios;
mod utils;

use fixtures::TestFixtures;
use utils::ScenarioRunner;

#[derive(Parser)]
#[command(name = "footprint-e2e")]
#[command(about = "End-to-end checks for the footprint size estimator")]
struct Args {
    /// Print every result tree as JSON
    #[arg(short, long)]
    verbose: bool,

    /// Only run suites whose name contains this text
    #[arg(long)]
    suite: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    println!("Starting footprint end-to-end test suite");
    println!("========================================");

    let fixtures = TestFixtures::new()?;
    println!("Loaded {} scenarios", fixtures.scenarios.len());
    let runner = ScenarioRunner::new(args.verbose);

    let mut passed = 0;
    let mut failed = 0;
    let selected = |name: &str| {
        args.suite
            .as_deref()
            .map_or(true, |filter| name.to_lowercase().contains(&filter.to_lowercase()))
    };

    if selected("Scenarios") {
        println!("\nRunning Scenarios...");
        run_test_suite(
            "Scenarios",
            test_scenarios::run_tests(&fixtures, &runner),
            &mut passed,
            &mut failed,
        );
    }

    if selected("Graphs") {
        println!("\nRunning Graphs...");
        run_test_suite("Graphs", test_graphs::run_tests(), &mut passed, &mut failed);
    }

    // Print summary
    println!("\nTest Results Summary:");
    println!("====================");
    println!("   Passed: {}", passed);
    println!("   Failed: {}", failed);

    if failed > 0 {
        println!("\nSome tests failed. Check output above for details.");
        std::process::exit(1);
    }
    println!("\nAll tests passed!");
    Ok(())
}

fn run_test_suite(name: &str, result: Result<()>, passed: &mut u32, failed: &mut u32) {
    match result {
        Ok(()) => {
            println!("  {} tests passed", name);
            *passed += 1;
        }
        Err(e) => {
            println!("  {} tests failed: {:#}", name, e);
            *failed += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fixtures_load() {
        let fixtures = TestFixtures::new().expect("Failed to load fixtures");
        assert_eq!(fixtures.scenarios.len(), 8);
        assert!(fixtures.scenario("depth_limit").is_some());
    }

    #[test]
    fn test_all_scenarios_pass() {
        let fixtures = TestFixtures::new().expect("Failed to load fixtures");
        let runner = ScenarioRunner::new(false);
        for scenario in &fixtures.scenarios {
            if let Err(e) = runner.run(scenario) {
                panic!("Scenario {} failed: {:#}", scenario.name, e);
            }
        }
    }

    #[test]
    fn test_pruned_scenario_accounts_for_dropped_bytes() {
        let fixtures = TestFixtures::new().expect("Failed to load fixtures");
        let scenario = fixtures.scenario("pruned_children").expect("Missing scenario");
        let tree = ScenarioRunner::new(false).estimate(scenario).unwrap();

        assert_eq!(tree.size, 32);
        assert_eq!(tree.child_size_sum(), Some(26));
        assert_eq!(footprint_core::pruned_bytes(&tree), 6);
        utils::TreeValidator::validate(&tree).expect("Pruned tree should validate");
    }

    #[test]
    fn test_graph_suite_passes() {
        test_graphs::run_tests().expect("Graph suite failed");
    }

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from(["footprint-e2e", "--suite", "graphs", "-v"]);
        assert!(args.verbose);
        assert_eq!(args.suite.as_deref(), Some("graphs"));
    }
}
