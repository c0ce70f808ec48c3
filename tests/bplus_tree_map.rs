use std::collections::BTreeMap as StdBTreeMap;

use proptest::prelude::*;
use treant_maps::{BPlusTreeMap, TreeError};

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

    /// Replays a random sequence of operations on both BPlusTreeMap and the
    /// standard library's map and asserts identical results at every step,
    /// including the full iteration order.
    #[test]
    fn map_ops_match_std(
        degree in 3usize..8,
        ops in proptest::collection::vec(map_op_strategy(), TEST_SIZE),
    ) {
        let mut map: BPlusTreeMap<i64, i64> = BPlusTreeMap::with_degree(degree).unwrap();
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
        }

        let items: Vec<_> = map.iter().map(|(&k, &v)| (k, v)).collect();
        let std_items: Vec<_> = std_map.iter().map(|(&k, &v)| (k, v)).collect();
        prop_assert_eq!(items, std_items, "final iteration mismatch");
    }

    /// Tests that iteration order matches the standard library's map after
    /// random insertions.
    #[test]
    fn iter_matches_std(entries in proptest::collection::vec((key_strategy(), value_strategy()), TEST_SIZE)) {
        let map: BPlusTreeMap<i64, i64> = entries.iter().copied().collect();
        let std_map: StdBTreeMap<i64, i64> = entries.iter().copied().collect();

        let items: Vec<_> = map.iter().map(|(&k, &v)| (k, v)).collect();
        let std_items: Vec<_> = std_map.iter().map(|(&k, &v)| (k, v)).collect();
        prop_assert_eq!(&items, &std_items, "iter() mismatch");

        prop_assert_eq!(map.iter().len(), std_map.len(), "ExactSizeIterator len mismatch");

        prop_assert_eq!(format!("{map:?}"), format!("{std_map:?}"), "Debug mismatch");
    }

    /// Iteration after heavy removal still follows the (rewired) leaf chain
    /// in order.
    #[test]
    fn iter_stays_sorted_after_removals(
        entries in proptest::collection::vec((key_strategy(), value_strategy()), TEST_SIZE),
        to_remove in proptest::collection::vec(key_strategy(), TEST_SIZE / 2),
    ) {
        let mut map: BPlusTreeMap<i64, i64> = entries.iter().copied().collect();
        let mut std_map: StdBTreeMap<i64, i64> = entries.iter().copied().collect();

        for k in &to_remove {
            prop_assert_eq!(map.remove(k), std_map.remove(k), "remove({})", k);
        }

        let items: Vec<_> = map.iter().map(|(&k, &v)| (k, v)).collect();
        let std_items: Vec<_> = std_map.iter().map(|(&k, &v)| (k, v)).collect();
        prop_assert_eq!(items, std_items, "iteration after removals mismatch");
    }

    /// Draining every key one by one always ends at an empty map.
    #[test]
    fn draining_all_keys_empties_the_map(entries in proptest::collection::vec((key_strategy(), value_strategy()), 1..TEST_SIZE)) {
        let mut map: BPlusTreeMap<i64, i64> = entries.iter().copied().collect();
        let std_map: StdBTreeMap<i64, i64> = entries.iter().copied().collect();

        for (k, v) in &std_map {
            let removed = map.remove(k);
            prop_assert_eq!(removed.as_ref(), Some(v), "remove({})", k);
        }
        prop_assert!(map.is_empty());
        prop_assert_eq!(map.iter().next(), None);
    }
}

// ─── Export views ────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    /// The leaves of the export view, read left to right, carry every entry
    /// exactly once and in key order.
    #[test]
    fn export_leaves_list_entries_in_order(
        degree in 3usize..6,
        entries in proptest::collection::vec((key_strategy(), value_strategy()), 1..200),
    ) {
        let map: BPlusTreeMap<i64, i64> = {
            let mut map = BPlusTreeMap::with_degree(degree).unwrap();
            map.extend(entries.iter().copied());
            map
        };
        let std_map: StdBTreeMap<i64, i64> = entries.iter().copied().collect();

        fn collect_leaf_labels(view: &treant_maps::TreeView, out: &mut Vec<String>) {
            if view.children.is_empty() {
                if !view.label.is_empty() {
                    out.extend(view.label.split(", ").map(str::to_owned));
                }
            } else {
                for child in &view.children {
                    collect_leaf_labels(child, out);
                }
            }
        }

        let mut fragments = Vec::new();
        collect_leaf_labels(&map.export_tree(), &mut fragments);

        let expected: Vec<String> = std_map.iter().map(|(k, v)| format!("{k}={v}")).collect();
        prop_assert_eq!(fragments, expected, "export leaf fragments mismatch");
    }
}

// ─── Construction ────────────────────────────────────────────────────────────

#[test]
fn degree_validation() {
    assert_eq!(
        BPlusTreeMap::<i64, i64>::with_degree(2).err(),
        Some(TreeError::InvalidDegree { degree: 2, minimum: 3 })
    );
    assert!(BPlusTreeMap::<i64, i64>::with_degree(3).is_ok());
    assert!(BPlusTreeMap::<i64, i64>::with_degree(100).is_ok());
}

#[test]
fn invalid_degree_error_is_displayable() {
    let error = BPlusTreeMap::<i64, i64>::with_degree(2).unwrap_err();
    assert_eq!(error.to_string(), "invalid tree degree 2, must be at least 3");
}
