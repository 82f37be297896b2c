//! Property tests driving the tree against a model.
//!
//! Keys are drawn from a small domain so insertions collide with earlier
//! entries and removals hit present keys often enough to exercise every
//! rebalancing case.

use std::collections::BTreeMap;

use proptest::prelude::*;

use madrone_rbtree::RbMap;

#[derive(Debug, Clone)]
enum Op {
    Insert(u16, u32),
    Remove(u16),
    Lookup(u16),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u16..64, any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        (0u16..64).prop_map(Op::Remove),
        (0u16..64).prop_map(Op::Lookup),
    ]
}

proptest! {
    #[test]
    fn matches_btreemap_model(ops in prop::collection::vec(op_strategy(), 1..200)) {
        let mut tree = RbMap::new();
        let mut model = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(k, v) => {
                    prop_assert_eq!(tree.insert(k, v).unwrap(), model.insert(k, v));
                }
                Op::Remove(k) => {
                    prop_assert_eq!(tree.remove(&k), model.remove(&k));
                }
                Op::Lookup(k) => {
                    prop_assert_eq!(tree.get(&k), model.get(&k));
                }
            }
            tree.check_invariants();
            prop_assert_eq!(tree.len(), model.len());
            prop_assert_eq!(tree.is_empty(), model.is_empty());
        }
    }

    #[test]
    fn height_stays_logarithmic(keys in prop::collection::vec(any::<u32>(), 1..300)) {
        let mut tree = RbMap::new();
        for k in keys {
            tree.insert(k, ()).unwrap();
            let n = tree.len() as f64;
            prop_assert!(
                (tree.height() as f64) <= 2.0 * (n + 1.0).log2(),
                "height {} over bound for {} nodes", tree.height(), tree.len()
            );
        }
    }

    #[test]
    fn overwrite_keeps_length(k in any::<u16>(), v1 in any::<u32>(), v2 in any::<u32>()) {
        let mut tree = RbMap::new();
        prop_assert_eq!(tree.insert(k, v1).unwrap(), None);
        prop_assert_eq!(tree.insert(k, v2).unwrap(), Some(v1));
        prop_assert_eq!(tree.len(), 1);
        prop_assert_eq!(tree.get(&k), Some(&v2));
        tree.check_invariants();
    }

    #[test]
    fn removing_absent_keys_changes_nothing(
        present in prop::collection::btree_set(0u16..100, 1..40),
        absent in 100u16..200,
    ) {
        let mut tree = RbMap::new();
        for &k in &present {
            tree.insert(k, u32::from(k)).unwrap();
        }

        prop_assert_eq!(tree.remove(&absent), None);
        tree.check_invariants();
        prop_assert_eq!(tree.len(), present.len());
        for &k in &present {
            prop_assert_eq!(tree.get(&k), Some(&u32::from(k)));
        }
    }

    #[test]
    fn invariants_hold_under_injected_comparator(
        keys in prop::collection::vec(0u16..64, 1..100),
    ) {
        let mut tree = RbMap::with_comparator(|a: &u16, b: &u16| b.cmp(a));
        for k in keys {
            tree.insert(k, ()).unwrap();
            tree.check_invariants();
        }
    }

    #[test]
    fn drain_in_random_order_empties_the_tree(
        keys in prop::collection::btree_set(0u16..128, 1..64),
        seed in any::<u64>(),
    ) {
        let mut tree = RbMap::new();
        for &k in &keys {
            tree.insert(k, ()).unwrap();
        }

        // Shuffle removal order with a cheap xorshift walk over the set.
        let mut order: Vec<u16> = keys.iter().copied().collect();
        let mut state = seed | 1;
        for i in (1..order.len()).rev() {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            order.swap(i, (state % (i as u64 + 1)) as usize);
        }

        for k in order {
            prop_assert_eq!(tree.remove(&k), Some(()));
            tree.check_invariants();
        }
        prop_assert!(tree.is_empty());
        prop_assert_eq!(tree.len(), 0);
    }
}
