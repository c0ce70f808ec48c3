use std::collections::BTreeMap as StdBTreeMap;

use proptest::prelude::*;
use treant_maps::{BTreeMap, TreeError};

/// The number of operations to perform in each proptest case.
const TEST_SIZE: usize = 2_000;

/// Generates keys in a range small enough to cause collisions.
fn key_strategy() -> impl Strategy<Value = i64> {
    -1_000i64..1_000i64
}

fn value_strategy() -> impl Strategy<Value = i64> {
    any::<i64>()
}

// ─── Operations enum for driving randomized tests ────────────────────────────

#[derive(Debug, Clone)]
enum MapOp {
    Insert(i64, i64),
    Remove(i64),
    Get(i64),
    ContainsKey(i64),
    Clear,
}

fn map_op_strategy() -> impl Strategy<Value = MapOp> {
    prop_oneof![
        5 => (key_strategy(), value_strategy()).prop_map(|(k, v)| MapOp::Insert(k, v)),
        3 => key_strategy().prop_map(MapOp::Remove),
        2 => key_strategy().prop_map(MapOp::Get),
        1 => key_strategy().prop_map(MapOp::ContainsKey),
        1 => Just(MapOp::Clear),
    ]
}

// ─── Core CRUD operations ────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    /// Replays a random sequence of operations on both BTreeMap and the
    /// standard library's map and asserts identical results at every step.
    #[test]
    fn map_ops_match_std(
        degree in 2usize..8,
        ops in proptest::collection::vec(map_op_strategy(), TEST_SIZE),
    ) {
        let mut map: BTreeMap<i64, i64> = BTreeMap::with_degree(degree).unwrap();
        let mut std_map: StdBTreeMap<i64, i64> = StdBTreeMap::new();

        for op in &ops {
            match op {
                MapOp::Insert(k, v) => {
                    prop_assert_eq!(map.insert(*k, *v), std_map.insert(*k, *v), "insert({}, {})", k, v);
                }
                MapOp::Remove(k) => {
                    prop_assert_eq!(map.remove(k), std_map.remove(k), "remove({})", k);
                }
                MapOp::Get(k) => {
                    prop_assert_eq!(map.get(k), std_map.get(k), "get({})", k);
                }
                MapOp::ContainsKey(k) => {
                    prop_assert_eq!(map.contains_key(k), std_map.contains_key(k), "contains_key({})", k);
                }
                MapOp::Clear => {
                    map.clear();
                    std_map.clear();
                }
            }
            prop_assert_eq!(map.len(), std_map.len(), "len mismatch after {:?}", op);
            prop_assert_eq!(map.is_empty(), std_map.is_empty(), "is_empty mismatch after {:?}", op);
        }
    }

    /// Tests that Debug output lists entries in key order, like the standard
    /// library's map.
    #[test]
    fn debug_matches_std(entries in proptest::collection::vec((key_strategy(), value_strategy()), TEST_SIZE)) {
        let map: BTreeMap<i64, i64> = entries.iter().copied().collect();
        let std_map: StdBTreeMap<i64, i64> = entries.iter().copied().collect();

        prop_assert_eq!(format!("{map:?}"), format!("{std_map:?}"), "Debug mismatch");
    }

    /// Tests FromIterator with duplicate keys: the last value wins.
    #[test]
    fn from_iter_matches_std(entries in proptest::collection::vec((key_strategy(), value_strategy()), TEST_SIZE)) {
        let map: BTreeMap<i64, i64> = entries.iter().copied().collect();
        let std_map: StdBTreeMap<i64, i64> = entries.iter().copied().collect();

        prop_assert_eq!(map.len(), std_map.len());
        for (k, v) in &std_map {
            prop_assert_eq!(map.get(k), Some(v), "get({}) after collect", k);
        }
    }

    /// Draining every key one by one always ends at an empty map.
    #[test]
    fn draining_all_keys_empties_the_map(entries in proptest::collection::vec((key_strategy(), value_strategy()), 1..TEST_SIZE)) {
        let mut map: BTreeMap<i64, i64> = entries.iter().copied().collect();
        let std_map: StdBTreeMap<i64, i64> = entries.iter().copied().collect();

        for (k, v) in &std_map {
            let removed = map.remove(k);
            prop_assert_eq!(removed.as_ref(), Some(v), "remove({})", k);
        }
        prop_assert!(map.is_empty());
        prop_assert_eq!(map.len(), 0);
    }
}

// ─── Export views ────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    /// The export view carries every entry exactly once as a `key=value`
    /// fragment, whatever shape the tree took.
    #[test]
    fn export_carries_every_entry(
        degree in 2usize..6,
        entries in proptest::collection::vec((key_strategy(), value_strategy()), 1..200),
    ) {
        let map: BTreeMap<i64, i64> = {
            let mut map = BTreeMap::with_degree(degree).unwrap();
            map.extend(entries.iter().copied());
            map
        };
        let std_map: StdBTreeMap<i64, i64> = entries.iter().copied().collect();

        let mut fragments = Vec::new();
        let mut stack = vec![map.export_tree()];
        while let Some(view) = stack.pop() {
            if !view.label.is_empty() {
                fragments.extend(view.label.split(", ").map(str::to_owned));
            }
            stack.extend(view.children);
        }
        fragments.sort();

        let mut expected: Vec<String> = std_map.iter().map(|(k, v)| format!("{k}={v}")).collect();
        expected.sort();
        prop_assert_eq!(fragments, expected, "export fragments mismatch");
    }
}

// ─── Construction ────────────────────────────────────────────────────────────

#[test]
fn degree_validation() {
    assert_eq!(
        BTreeMap::<i64, i64>::with_degree(0).err(),
        Some(TreeError::InvalidDegree { degree: 0, minimum: 2 })
    );
    assert_eq!(
        BTreeMap::<i64, i64>::with_degree(1).err(),
        Some(TreeError::InvalidDegree { degree: 1, minimum: 2 })
    );
    assert!(BTreeMap::<i64, i64>::with_degree(2).is_ok());
    assert!(BTreeMap::<i64, i64>::with_degree(100).is_ok());
}

#[test]
fn invalid_degree_error_is_displayable() {
    let error = BTreeMap::<i64, i64>::with_degree(1).unwrap_err();
    assert_eq!(error.to_string(), "invalid tree degree 1, must be at least 2");
}
