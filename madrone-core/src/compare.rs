//! Comparison capability injected by the caller.

use core::cmp::Ordering;

/// A strict total order over keys.
///
/// A tree never inspects keys except through its comparator. The order must
/// be pure and consistent for the lifetime of the tree; the engine treats a
/// non-conforming comparator (non-total, non-deterministic) as a contract
/// violation and does not guard against one.
pub trait Comparator<K> {
    /// Order `a` relative to `b`.
    fn compare(&self, a: &K, b: &K) -> Ordering;
}

/// Any ordering closure is a comparator.
impl<K, F> Comparator<K> for F
where
    F: Fn(&K, &K) -> Ordering,
{
    fn compare(&self, a: &K, b: &K) -> Ordering {
        self(a, b)
    }
}

/// The natural order of keys that are `Ord`.
#[derive(Debug, Default, Copy, Clone)]
pub struct NaturalOrder;

impl<K: Ord> Comparator<K> for NaturalOrder {
    fn compare(&self, a: &K, b: &K) -> Ordering {
        a.cmp(b)
    }
}
