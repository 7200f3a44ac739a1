//! Property-based tests for building and querying trees.

use std::collections::{HashMap, HashSet};

use crate::{ConfigKey, ConfigurationBuilder, FlatMap};
use proptest::prelude::*;

// Keys drawn from a tiny alphabet with mixed case so collisions are common
fn key_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-cA-C]{1,2}", 1..4).prop_map(|segments| segments.join(":"))
}

fn layer_strategy() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec((key_strategy(), "[a-z0-9]{0,6}"), 0..8)
}

fn builder_for(layers: &[Vec<(String, String)>]) -> ConfigurationBuilder {
    layers.iter().fold(ConfigurationBuilder::new(), |builder, layer| {
        builder.add_in_memory(layer.iter().cloned())
    })
}

proptest! {
    // The value of every key comes from the last layer that defines it
    #[test]
    fn last_layer_wins(layers in prop::collection::vec(layer_strategy(), 1..5)) {
        let tree = builder_for(&layers).build().unwrap();

        let mut expected: HashMap<String, String> = HashMap::new();
        for layer in &layers {
            for (key, value) in layer {
                expected.insert(key.to_lowercase(), value.clone());
            }
        }

        prop_assert_eq!(tree.len(), expected.len());
        for (key, value) in &expected {
            prop_assert_eq!(tree.get(key), Some(value.as_str()));
        }
    }

    // Building twice from the same registrations gives equal trees
    #[test]
    fn build_is_idempotent(layers in prop::collection::vec(layer_strategy(), 0..4)) {
        let builder = builder_for(&layers);
        prop_assert_eq!(builder.build().unwrap(), builder.build().unwrap());
    }

    // Lookups ignore case
    #[test]
    fn lookups_ignore_case(layer in layer_strategy()) {
        let tree = ConfigurationBuilder::new()
            .add_in_memory(layer.iter().cloned())
            .build()
            .unwrap();
        for (key, _) in &layer {
            prop_assert_eq!(tree.get(&key.to_uppercase()), tree.get(&key.to_lowercase()));
            prop_assert!(tree.section(&key.to_uppercase()).exists());
        }
    }

    // Walk visits every distinct key prefix exactly once
    #[test]
    fn walk_visits_each_prefix_once(layer in layer_strategy()) {
        let tree = ConfigurationBuilder::new()
            .add_in_memory(layer.iter().cloned())
            .build()
            .unwrap();

        let mut prefixes = HashSet::new();
        for (key, _) in &layer {
            let mut current = ConfigKey::parse(key);
            while !current.is_root() {
                prefixes.insert(current.normalized().to_string());
                current = current.parent().unwrap();
            }
        }

        let visited: Vec<String> = tree
            .walk()
            .map(|(_, section)| section.path().normalized().to_string())
            .collect();
        let unique: HashSet<String> = visited.iter().cloned().collect();

        prop_assert_eq!(visited.len(), unique.len());
        prop_assert_eq!(unique, prefixes);
    }

    // Walk depth equals the number of segments below the root minus one
    #[test]
    fn walk_depth_matches_path(layer in layer_strategy()) {
        let tree = ConfigurationBuilder::new()
            .add_in_memory(layer.iter().cloned())
            .build()
            .unwrap();
        for (depth, section) in tree.walk() {
            prop_assert_eq!(depth + 1, section.path().len());
        }
    }

    // Re-inserting a key keeps its first position in a flat map
    #[test]
    fn flat_map_keeps_first_position(pairs in prop::collection::vec((key_strategy(), "[a-z]{0,3}"), 0..12)) {
        let map: FlatMap = pairs.iter().cloned().collect();

        let mut first_seen: Vec<String> = Vec::new();
        for (key, _) in &pairs {
            let normalized = key.to_lowercase();
            if !first_seen.contains(&normalized) {
                first_seen.push(normalized);
            }
        }
        let order: Vec<String> = map.iter().map(|(k, _)| k.normalized().to_string()).collect();
        prop_assert_eq!(order, first_seen);
    }
}

#[cfg(feature = "property-tests")]
proptest! {
    #![proptest_config(ProptestConfig {
        cases: 5000,
        .. ProptestConfig::default()
    })]

    // Deeper trees with many layers still agree with a naive fold
    #[test]
    fn many_layers_agree_with_naive_fold(layers in prop::collection::vec(layer_strategy(), 1..20)) {
        let tree = builder_for(&layers).build().unwrap();
        let mut naive: FlatMap = FlatMap::new();
        for layer in &layers {
            naive.extend(layer.iter().cloned());
        }
        let merged: Vec<(String, String)> = tree
            .entries()
            .map(|e| (e.key().normalized().to_string(), e.value().to_string()))
            .collect();
        let folded: Vec<(String, String)> = naive
            .iter()
            .map(|(k, v)| (k.normalized().to_string(), v.to_string()))
            .collect();
        prop_assert_eq!(merged, folded);
    }
}
