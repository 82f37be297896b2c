//! Shared builders and assertions for acceptance tests.

use madrone_rbtree::RbMap;

/// Build a tree from keys inserted in the given order, checking the
/// structural invariants after every step.
pub fn build_checked(keys: &[i64]) -> RbMap<i64, i64> {
    let mut tree = RbMap::new();
    for &k in keys {
        tree.insert(k, k).expect("node allocation failed");
        tree.check_invariants();
    }
    tree
}

/// The red-black height guarantee for `n` nodes: `ceil(2 * log2(n + 1))`.
pub fn height_bound(n: usize) -> usize {
    (2.0 * ((n + 1) as f64).log2()).ceil() as usize
}
