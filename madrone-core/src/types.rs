//! Arena handles and node color.

use core::num::NonZeroU32;

use static_assertions::assert_eq_size;

/// Color of a tree node.
///
/// Absent children have no node object at all; they count as black through
/// the owning arena's color lookup, never through a shared sentinel.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Color {
    Red = 0,
    Black = 1,
}

/// Stable handle to a node slot in an arena.
///
/// Stores `index + 1` in a `NonZeroU32`, so `Option<NodeId>` occupies the
/// same four bytes as the bare handle. Handles are plain relations between
/// nodes; the arena is the sole owner and a handle must never be used to
/// extend a node's lifetime.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    /// Create a handle for a slot index.
    ///
    /// Panics when the index cannot be represented (more than
    /// `u32::MAX - 1` slots), which is an arena capacity bug rather than a
    /// caller error.
    pub fn from_index(index: usize) -> Self {
        let raw = u32::try_from(index)
            .ok()
            .and_then(|i| i.checked_add(1))
            .and_then(NonZeroU32::new)
            .expect("node index out of handle range");
        Self(raw)
    }

    /// Slot index this handle refers to.
    pub fn index(self) -> usize {
        self.0.get() as usize - 1
    }
}

assert_eq_size!(NodeId, u32);
assert_eq_size!(Option<NodeId>, u32);
assert_eq_size!(Color, u8);

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_node_id_round_trip() {
        let id = NodeId::from_index(0);
        assert_eq!(id.index(), 0);

        let id = NodeId::from_index(41);
        assert_eq!(id.index(), 41);
    }

    #[test]
    fn test_option_node_id_is_four_bytes() {
        assert_eq!(core::mem::size_of::<Option<NodeId>>(), 4);
    }

    #[test]
    #[should_panic(expected = "node index out of handle range")]
    fn test_node_id_overflow_is_fatal() {
        let _ = NodeId::from_index(u32::MAX as usize);
    }

    proptest! {
        #[test]
        fn round_trips_any_representable_index(index in 0usize..(u32::MAX as usize - 1)) {
            prop_assert_eq!(NodeId::from_index(index).index(), index);
        }
    }
}
