//! Property tests over randomly generated JSON-shaped value graphs

use footprint_core::{estimate_with, EstimateOptions, HeuristicSizer, Value};
use proptest::prelude::*;
use serde_json::Value as Json;

fn json_value() -> impl Strategy<Value = Json> {
    let leaf = prop_oneof![
        Just(Json::Null),
        any::<bool>().prop_map(Json::from),
        any::<i32>().prop_map(Json::from),
        "[a-z0-9 ]{0,12}".prop_map(Json::from),
        "\\PC{0,6}".prop_map(Json::from),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Json::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..6)
                .prop_map(|map| Json::Object(map.into_iter().collect())),
        ]
    })
}

fn utf16_bytes(s: &str) -> u64 {
    s.encode_utf16().count() as u64 * 2
}

/// Heuristic size computed straight from the JSON document
fn expected_size(json: &Json) -> u64 {
    match json {
        Json::Null => 0,
        Json::Bool(_) => 4,
        Json::Number(_) => 8,
        Json::String(s) => utf16_bytes(s),
        Json::Array(items) => items.iter().map(expected_size).sum(),
        Json::Object(map) => map
            .iter()
            .map(|(key, value)| utf16_bytes(key) + expected_size(value))
            .sum(),
    }
}

fn heuristic() -> EstimateOptions {
    EstimateOptions::new().with_sizer(Box::new(HeuristicSizer))
}

proptest! {
    #[test]
    fn composite_size_is_sum_of_children(json in json_value()) {
        let tree = estimate_with(&Value::from(json), &EstimateOptions::new()).unwrap();
        for node in tree.walk() {
            if let Some(sum) = node.child_size_sum() {
                prop_assert_eq!(node.size, sum);
            }
        }
    }

    #[test]
    fn heuristic_matches_direct_computation(json in json_value()) {
        let expected = expected_size(&json);
        let tree = estimate_with(&Value::from(json), &heuristic()).unwrap();
        prop_assert_eq!(tree.size, expected);
    }

    #[test]
    fn estimates_are_deterministic(json in json_value()) {
        let value = Value::from(json);
        let options = EstimateOptions::new();
        let first = estimate_with(&value, &options).unwrap();
        let second = estimate_with(&value, &options).unwrap();
        prop_assert_eq!(first.to_json(), second.to_json());
    }

    #[test]
    fn repeated_reference_counts_once(json in json_value(), copies in 1usize..5) {
        let shared = Value::from(json);
        let single = estimate_with(&shared, &heuristic()).unwrap().size;
        let repeated = Value::array(std::iter::repeat(shared.clone()).take(copies));
        let tree = estimate_with(&repeated, &heuristic()).unwrap();
        if shared.is_composite() {
            prop_assert_eq!(tree.size, single);
            prop_assert_eq!(tree.circular_nodes().len(), copies - 1);
        } else {
            prop_assert_eq!(tree.size, single * copies as u64);
        }
    }
}
