//! Property-based tests for `BpTreeMap`.
//!
//! These tests verify invariants and properties that should hold for all
//! inputs. Uses differential testing against `BTreeMap` as an oracle; the
//! one deliberate difference is that `BpTreeMap::insert` never overwrites,
//! so the oracle inserts through `entry(..).or_insert(..)`.

use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};

use bptree::BpTreeMap;
use proptest::prelude::*;

/// Small block: fan-out 3 for `u16` keys, so a few dozen entries already
/// build several levels.
type TestMap = BpTreeMap<u16, u64, 48>;

/// Wider block: fan-out 24 for `u16` keys.
type WideMap = BpTreeMap<u16, u64, 256>;

/// Keys are drawn from a narrow space so removals and duplicates hit often.
const KEY_SPACE: u16 = 300;

// ============================================================================
//  Strategies
// ============================================================================

/// Strategy for a key in the shared narrow space.
fn key() -> impl Strategy<Value = u16> {
    0..KEY_SPACE
}

/// Strategy for key-value pairs, duplicates included.
fn key_value_pairs(max_count: usize) -> impl Strategy<Value = Vec<(u16, u64)>> {
    prop::collection::vec((key(), any::<u64>()), 0..=max_count)
}

/// Operations for random testing.
#[derive(Debug, Clone)]
enum Op {
    Insert(u16, u64),
    Remove(u16),
    Get(u16),
    Update(u16, u64),
}

/// Strategy for generating random operations.
fn operations(max_ops: usize) -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(
        prop_oneof![
            4 => (key(), any::<u64>()).prop_map(|(k, v)| Op::Insert(k, v)),
            2 => key().prop_map(Op::Remove),
            2 => key().prop_map(Op::Get),
            1 => (key(), any::<u64>()).prop_map(|(k, v)| Op::Update(k, v)),
        ],
        0..=max_ops,
    )
}

/// Fill a map and a `BTreeMap` oracle with the same pairs, first insert of
/// a key winning in both.
fn build_both(pairs: &[(u16, u64)]) -> (TestMap, BTreeMap<u16, u64>) {
    let mut map = TestMap::new();
    let mut oracle = BTreeMap::new();

    for &(k, v) in pairs {
        map.insert(k, v);
        oracle.entry(k).or_insert(v);
    }

    (map, oracle)
}

// ============================================================================
//  Basic Insert/Get/Remove Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Every inserted key is retrievable with its value.
    #[test]
    fn insert_then_get_returns_value(k in key(), v: u64) {
        let mut map = TestMap::new();

        let (_, inserted) = map.insert(k, v);
        prop_assert!(inserted);
        prop_assert_eq!(map.get(&k), Some(&v));
    }

    /// A duplicate insert keeps the first value and reports no insertion.
    #[test]
    fn insert_duplicate_keeps_first_value(k in key(), v1: u64, v2: u64) {
        let mut map = TestMap::new();
        map.insert(k, v1);

        let (cursor, inserted) = map.insert(k, v2);
        prop_assert!(!inserted);
        prop_assert_eq!(cursor.value(), Some(&v1));
        prop_assert_eq!(map.len(), 1);
    }

    /// Removing an absent key is a reported no-op.
    #[test]
    fn remove_missing_returns_none(present in key(), absent in key(), v: u64) {
        prop_assume!(present != absent);

        let mut map = TestMap::new();
        map.insert(present, v);

        prop_assert_eq!(map.remove(&absent), None);
        prop_assert_eq!(map.len(), 1);
        map.check_invariants();
    }
}

// ============================================================================
//  Differential Testing Against BTreeMap
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Random operation streams leave the map equal to the oracle with all
    /// structural invariants intact.
    #[test]
    fn differential_random_ops(ops in operations(200)) {
        let mut map = TestMap::new();
        let mut oracle: BTreeMap<u16, u64> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(k, v) => {
                    let (_, inserted) = map.insert(k, v);
                    prop_assert_eq!(inserted, !oracle.contains_key(&k));
                    oracle.entry(k).or_insert(v);
                }
                Op::Remove(k) => {
                    prop_assert_eq!(map.remove(&k), oracle.remove(&k));
                }
                Op::Get(k) => {
                    prop_assert_eq!(map.get(&k), oracle.get(&k));
                    prop_assert_eq!(map.contains_key(&k), oracle.contains_key(&k));
                }
                Op::Update(k, v) => {
                    if let Some(value) = map.get_mut(&k) {
                        *value = v;
                    }
                    if let Some(value) = oracle.get_mut(&k) {
                        *value = v;
                    }
                }
            }
            map.check_invariants();
        }

        prop_assert_eq!(map.len(), oracle.len());
        prop_assert!(map.iter().eq(oracle.iter()));
        prop_assert_eq!(map.first_key_value(), oracle.first_key_value());
        prop_assert_eq!(map.last_key_value(), oracle.last_key_value());
    }

    /// Iteration yields exactly the oracle's pairs, in both directions.
    #[test]
    fn iteration_matches_oracle(pairs in key_value_pairs(150)) {
        let (map, oracle) = build_both(&pairs);

        prop_assert!(map.iter().eq(oracle.iter()));
        prop_assert!(map.iter().rev().eq(oracle.iter().rev()));
        prop_assert!(map.keys().eq(oracle.keys()));
        prop_assert!(map.values().eq(oracle.values()));
    }

    /// A forward cursor walk visits the same pairs as the iterator.
    #[test]
    fn cursor_walk_matches_iter(pairs in key_value_pairs(150)) {
        let (map, _) = build_both(&pairs);

        let mut walked = Vec::new();
        let mut cursor = map.cursor_front();
        while let Some((k, v)) = cursor.key_value() {
            walked.push((*k, *v));
            cursor.move_next();
        }

        let iterated: Vec<(u16, u64)> = map.iter().map(|(&k, &v)| (k, v)).collect();
        prop_assert_eq!(walked, iterated);
    }

    /// Bound queries land where the oracle's range queries land.
    #[test]
    fn bounds_agree_with_oracle(pairs in key_value_pairs(150), probe in key()) {
        let (map, oracle) = build_both(&pairs);

        let lower = oracle.range(probe..).next().map(|(&k, _)| k);
        let upper = oracle
            .range((Excluded(probe), Unbounded))
            .next()
            .map(|(&k, _)| k);

        prop_assert_eq!(map.lower_bound(&probe).key().copied(), lower);
        prop_assert_eq!(map.upper_bound(&probe).key().copied(), upper);

        let (low, high) = map.equal_range(&probe);
        if map.contains_key(&probe) {
            prop_assert_eq!(low.key(), Some(&probe));
            prop_assert_eq!(high.key().copied(), upper);
        } else {
            prop_assert_eq!(low, high);
        }
    }

    /// Range removal removes exactly the oracle's range.
    #[test]
    fn remove_range_matches_oracle(pairs in key_value_pairs(150), a in key(), b in key()) {
        let (mut map, mut oracle) = build_both(&pairs);
        let (lo, hi) = (a.min(b), a.max(b));

        let expected: Vec<u16> = oracle.range(lo..hi).map(|(&k, _)| k).collect();
        for k in &expected {
            oracle.remove(k);
        }

        prop_assert_eq!(map.remove_range(lo..hi), expected.len());
        map.check_invariants();
        prop_assert!(map.iter().eq(oracle.iter()));
    }

    /// A clone is detached: mutating either side never shows through the
    /// other.
    #[test]
    fn clone_is_detached(pairs in key_value_pairs(100), extra in key(), v: u64) {
        let (mut map, _) = build_both(&pairs);
        let snapshot: Vec<(u16, u64)> = map.iter().map(|(&k, &v)| (k, v)).collect();

        let mut copy = map.clone();
        copy.insert(extra, v);
        copy.remove_range(..);

        let after: Vec<(u16, u64)> = map.iter().map(|(&k, &v)| (k, v)).collect();
        prop_assert_eq!(&snapshot, &after);

        // The other direction: churn the original and re-read a clone taken
        // before the churn.
        let second = map.clone();
        map.insert(extra, v);
        map.remove_range(..);

        let kept: Vec<(u16, u64)> = second.iter().map(|(&k, &v)| (k, v)).collect();
        prop_assert_eq!(snapshot, kept);

        map.check_invariants();
        copy.check_invariants();
        second.check_invariants();
    }

    /// The fan-out is a tuning knob: contents are identical across blocks.
    #[test]
    fn fan_out_does_not_change_contents(pairs in key_value_pairs(150)) {
        let (map, _) = build_both(&pairs);

        let mut wide = WideMap::new();
        for &(k, v) in &pairs {
            wide.insert(k, v);
        }

        wide.check_invariants();
        prop_assert!(map.iter().eq(wide.iter()));
    }
}
