//! Ordered key-value map backed by a red-black tree.
//!
//! The tree guarantees O(log n) worst-case height regardless of insertion
//! order by maintaining the classic red-black invariants:
//!
//! 1. every node is red or black, and absent children count as black;
//! 2. the root, if present, is black;
//! 3. no red node has a red parent;
//! 4. every path from a node down to an absent child passes through the
//!    same number of black nodes;
//! 5. binary-search-tree ordering under the tree's comparator.
//!
//! Nodes live in a slot arena and refer to each other by [`NodeId`] index,
//! so the parent back-references never form an ownership cycle. Both
//! rebalancing cascades are explicit loops that re-target a current node,
//! keeping stack depth constant regardless of tree height.

use std::cmp::Ordering;
use std::collections::TryReserveError;
use std::mem;

use static_assertions::assert_impl_all;
use tracing::trace;

pub use madrone_core::{Color, Comparator, NaturalOrder, NodeId};

use crate::arena::NodeArena;

mod arena;
mod verify;

/// Result type for tree operations.
pub type Result<T> = std::result::Result<T, TreeError>;

/// Errors that can occur during tree operations.
///
/// Looking up or removing an absent key is not an error; it is signaled as
/// an absent value. Internal invariant violations are bugs and panic rather
/// than surfacing here.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    #[error("node allocation failed: {0}")]
    Alloc(#[from] TryReserveError),
}

/// Ordered map over a caller-supplied comparator.
///
/// The comparator is bound at construction and must stay a consistent
/// strict total order for the life of the map. All nodes are owned by the
/// map's internal arena; no operation suspends or blocks, and mutation
/// requires `&mut self`, so exclusive access is enforced by construction.
#[derive(Debug)]
pub struct RbMap<K, V, C = NaturalOrder> {
    arena: NodeArena<K, V>,
    root: Option<NodeId>,
    cmp: C,
}

assert_impl_all!(RbMap<u64, u64>: Send, Sync);

impl<K: Ord, V> RbMap<K, V> {
    /// Create an empty map ordered by `K`'s natural order.
    pub fn new() -> Self {
        Self::with_comparator(NaturalOrder)
    }
}

impl<K: Ord, V> Default for RbMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C: Comparator<K>> RbMap<K, V, C> {
    /// Create an empty map ordered by `cmp`.
    pub fn with_comparator(cmp: C) -> Self {
        Self {
            arena: NodeArena::new(),
            root: None,
            cmp,
        }
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Check if the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.root = None;
    }

    /// Look up a key.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.lookup_node(key).map(|id| &self.arena.node(id).value)
    }

    /// Look up a key, mutably.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let id = self.lookup_node(key)?;
        Some(&mut self.arena.node_mut(id).value)
    }

    /// Check if a key is present.
    pub fn contains_key(&self, key: &K) -> bool {
        self.lookup_node(key).is_some()
    }

    /// Insert a key/value pair, returning the previous value if the key was
    /// already present.
    ///
    /// An existing key is overwritten in place and never rebalances. A
    /// fresh key is attached as a red leaf at its search position and the
    /// insertion cascade restores the invariants, performing at most two
    /// rotations. On allocation failure the map is left untouched.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        // Find the attachment point before allocating: an overwrite must
        // not allocate, and a failed allocation must not mutate the tree.
        let mut parent = None;
        let mut went_left = false;
        let mut cur = self.root;
        while let Some(id) = cur {
            let ord = self.cmp.compare(&key, &self.arena.node(id).key);
            match ord {
                Ordering::Equal => {
                    let old = mem::replace(&mut self.arena.node_mut(id).value, value);
                    trace!("insert: overwrote existing key");
                    return Ok(Some(old));
                }
                Ordering::Less => {
                    parent = Some(id);
                    went_left = true;
                    cur = self.arena.node(id).left;
                }
                Ordering::Greater => {
                    parent = Some(id);
                    went_left = false;
                    cur = self.arena.node(id).right;
                }
            }
        }

        let id = self.arena.try_alloc(key, value, parent)?;
        match parent {
            None => self.root = Some(id),
            Some(p) => {
                if went_left {
                    self.arena.node_mut(p).left = Some(id);
                } else {
                    self.arena.node_mut(p).right = Some(id);
                }
            }
        }
        trace!(len = self.arena.len(), "insert: attached red leaf");
        self.rebalance_after_insert(id);
        self.verify_after_mutation();
        Ok(None)
    }

    /// Remove a key, returning its value; a no-op on an absent key.
    ///
    /// A node with two children swaps key and value with its in-order
    /// predecessor (the maximum of its left subtree) and the predecessor's
    /// position is the one physically removed, so every removal splices out
    /// a node with at most one child. When that node is black, the deletion
    /// cascade runs before the splice to restore the black-height.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let mut n = self.lookup_node(key)?;

        let node = self.arena.node(n);
        if let (Some(left), Some(_)) = (node.left, node.right) {
            // Swap rather than copy, so the caller gets the evicted value
            // back out of the predecessor's old slot.
            let pred = self.maximum_node(left);
            let (doomed, survivor) = self.arena.node_pair_mut(pred, n);
            mem::swap(&mut doomed.key, &mut survivor.key);
            mem::swap(&mut doomed.value, &mut survivor.value);
            n = pred;
        }

        let node = self.arena.node(n);
        debug_assert!(node.left.is_none() || node.right.is_none());
        let child = if node.right.is_none() {
            node.left
        } else {
            node.right
        };

        if node.color == Color::Black {
            // Bookkeeping step: the doomed position takes its child's
            // color so the cascade sees the post-splice coloring.
            let child_color = self.arena.color_of(child);
            self.arena.node_mut(n).color = child_color;
            self.rebalance_before_splice(n);
        }

        self.replace_node(n, child);
        if self.arena.node(n).parent.is_none() {
            if let Some(c) = child {
                self.arena.node_mut(c).color = Color::Black;
            }
        }

        let (_, value) = self.arena.free(n);
        trace!(len = self.arena.len(), "remove: spliced node out");
        self.verify_after_mutation();
        Some(value)
    }

    /// Walk from the root to the node holding `key`.
    fn lookup_node(&self, key: &K) -> Option<NodeId> {
        let mut cur = self.root;
        while let Some(id) = cur {
            let node = self.arena.node(id);
            match self.cmp.compare(key, &node.key) {
                Ordering::Equal => return Some(id),
                Ordering::Less => cur = node.left,
                Ordering::Greater => cur = node.right,
            }
        }
        None
    }

    /// Rightmost node of the subtree rooted at `n`.
    fn maximum_node(&self, mut n: NodeId) -> NodeId {
        while let Some(right) = self.arena.node(n).right {
            n = right;
        }
        n
    }

    /// The other child of `n`'s parent, if `n` has a parent.
    fn sibling(&self, n: NodeId) -> Option<NodeId> {
        let p = self.arena.node(n).parent?;
        let parent = self.arena.node(p);
        if parent.left == Some(n) {
            parent.right
        } else {
            parent.left
        }
    }

    /// Rewire `old`'s parent to point at `new` instead, updating the root
    /// reference when `old` was the root. `old`'s own links are untouched.
    fn replace_node(&mut self, old: NodeId, new: Option<NodeId>) {
        let p = self.arena.node(old).parent;
        match p {
            None => self.root = new,
            Some(p) => {
                if self.arena.node(p).left == Some(old) {
                    self.arena.node_mut(p).left = new;
                } else {
                    self.arena.node_mut(p).right = new;
                }
            }
        }
        if let Some(new) = new {
            self.arena.node_mut(new).parent = p;
        }
    }

    /// Promote `n`'s right child into `n`'s position; `n` becomes its left
    /// child and the promoted node's former left subtree becomes `n`'s new
    /// right subtree. Colors are untouched.
    ///
    /// The promoted child must exist; the callers' case analysis
    /// guarantees it, and its absence is an invariant violation.
    fn rotate_left(&mut self, n: NodeId) {
        let r = self
            .arena
            .node(n)
            .right
            .expect("rotate_left: right child is absent");
        self.replace_node(n, Some(r));
        let moved = self.arena.node(r).left;
        self.arena.node_mut(n).right = moved;
        if let Some(m) = moved {
            self.arena.node_mut(m).parent = Some(n);
        }
        self.arena.node_mut(r).left = Some(n);
        self.arena.node_mut(n).parent = Some(r);
    }

    /// Mirror of [`Self::rotate_left`].
    fn rotate_right(&mut self, n: NodeId) {
        let l = self
            .arena
            .node(n)
            .left
            .expect("rotate_right: left child is absent");
        self.replace_node(n, Some(l));
        let moved = self.arena.node(l).right;
        self.arena.node_mut(n).left = moved;
        if let Some(m) = moved {
            self.arena.node_mut(m).parent = Some(n);
        }
        self.arena.node_mut(l).right = Some(n);
        self.arena.node_mut(n).parent = Some(l);
    }

    /// Restore the invariants after attaching a red leaf.
    ///
    /// The reference case ladder flattened into a loop: case 3 re-targets
    /// the grandparent and starts over, cases 1, 2, and 5 terminate. A red
    /// insertion can only violate the root-blackness or red-parent rules,
    /// never black-height, and at most two rotations occur overall.
    fn rebalance_after_insert(&mut self, mut n: NodeId) {
        loop {
            // Case 1: the node is the root; recolor it black.
            let Some(p) = self.arena.node(n).parent else {
                self.arena.node_mut(n).color = Color::Black;
                return;
            };

            // Case 2: black parent, nothing is violated.
            if self.arena.node(p).color == Color::Black {
                return;
            }

            // A red parent is never the root, so the grandparent exists.
            let g = self
                .arena
                .node(p)
                .parent
                .expect("red parent has no parent");
            let uncle = if self.arena.node(g).left == Some(p) {
                self.arena.node(g).right
            } else {
                self.arena.node(g).left
            };

            // Case 3: red uncle. Recolor parent and uncle black, the
            // grandparent red, and push the possible violation up to it.
            if self.arena.color_of(uncle) == Color::Red {
                trace!("insert case 3: red uncle, recoloring");
                let u = uncle.expect("red uncle is absent");
                self.arena.node_mut(p).color = Color::Black;
                self.arena.node_mut(u).color = Color::Black;
                self.arena.node_mut(g).color = Color::Red;
                n = g;
                continue;
            }

            // Case 4: inner grandchild. Rotate about the parent so the
            // current node takes the outer position, then continue from
            // that position.
            if self.arena.node(p).right == Some(n) && self.arena.node(g).left == Some(p) {
                trace!("insert case 4: rotate left about parent");
                self.rotate_left(p);
                n = self
                    .arena
                    .node(n)
                    .left
                    .expect("rotation lost the demoted parent");
            } else if self.arena.node(p).left == Some(n) && self.arena.node(g).right == Some(p) {
                trace!("insert case 4: rotate right about parent");
                self.rotate_right(p);
                n = self
                    .arena
                    .node(n)
                    .right
                    .expect("rotation lost the demoted parent");
            }

            // Case 5: outer grandchild. Recolor and rotate about the
            // grandparent; this terminates the cascade.
            let p = self.arena.node(n).parent.expect("case 5: no parent");
            let g = self.arena.node(p).parent.expect("case 5: no grandparent");
            self.arena.node_mut(p).color = Color::Black;
            self.arena.node_mut(g).color = Color::Red;
            if self.arena.node(p).left == Some(n) {
                debug_assert_eq!(self.arena.node(g).left, Some(p));
                trace!("insert case 5: rotate right about grandparent");
                self.rotate_right(g);
            } else {
                debug_assert_eq!(self.arena.node(g).right, Some(p));
                trace!("insert case 5: rotate left about grandparent");
                self.rotate_left(g);
            }
            return;
        }
    }

    /// Restore black-height before splicing out a black node.
    ///
    /// On entry every path through `n` is short one black relative to its
    /// siblings. The reference case ladder flattened into a loop: case 3
    /// re-targets the parent and starts over; cases 2 and 5 transform the
    /// configuration and fall through after recomputing the sibling; cases
    /// 1, 4, and 6 terminate.
    fn rebalance_before_splice(&mut self, mut n: NodeId) {
        loop {
            // Case 1: the deficit reached the root; every path lost one
            // black together, so nothing is violated.
            if self.arena.node(n).parent.is_none() {
                return;
            }

            // Case 2: red sibling. Swap colors with the parent and rotate
            // the sibling above it, so the remaining cases see a black
            // sibling.
            if self.arena.color_of(self.sibling(n)) == Color::Red {
                trace!("delete case 2: red sibling, rotating about parent");
                let s = self.sibling(n).expect("red sibling is absent");
                let p = self.arena.node(n).parent.expect("case 2: no parent");
                self.arena.node_mut(p).color = Color::Red;
                self.arena.node_mut(s).color = Color::Black;
                if self.arena.node(p).left == Some(n) {
                    self.rotate_left(p);
                } else {
                    self.rotate_right(p);
                }
            }

            let p = self.arena.node(n).parent.expect("deficit node lost its parent");
            let s = self.sibling(n).expect("deficit node has no sibling");
            let (s_left, s_right) = {
                let sib = self.arena.node(s);
                (sib.left, sib.right)
            };

            // Case 3: parent, sibling, and sibling's children all black.
            // Recoloring the sibling red balances the subtree locally; the
            // whole subtree is now short one black, so re-target the
            // parent.
            if self.arena.node(p).color == Color::Black
                && self.arena.node(s).color == Color::Black
                && self.arena.color_of(s_left) == Color::Black
                && self.arena.color_of(s_right) == Color::Black
            {
                trace!("delete case 3: recolor sibling, deficit moves up");
                self.arena.node_mut(s).color = Color::Red;
                n = p;
                continue;
            }

            // Case 4: red parent, black sibling with black children.
            // Swapping parent and sibling colors adds the missing black to
            // paths through `n` without disturbing the others.
            if self.arena.node(p).color == Color::Red
                && self.arena.node(s).color == Color::Black
                && self.arena.color_of(s_left) == Color::Black
                && self.arena.color_of(s_right) == Color::Black
            {
                trace!("delete case 4: swap parent and sibling colors");
                self.arena.node_mut(s).color = Color::Red;
                self.arena.node_mut(p).color = Color::Black;
                return;
            }

            // Case 5: the sibling's near child is red, its far child
            // black. Rotate about the sibling to expose a red far child
            // for case 6.
            if self.arena.node(p).left == Some(n)
                && self.arena.node(s).color == Color::Black
                && self.arena.color_of(s_left) == Color::Red
                && self.arena.color_of(s_right) == Color::Black
            {
                trace!("delete case 5: rotate right about sibling");
                let near = s_left.expect("red near child is absent");
                self.arena.node_mut(s).color = Color::Red;
                self.arena.node_mut(near).color = Color::Black;
                self.rotate_right(s);
            } else if self.arena.node(p).right == Some(n)
                && self.arena.node(s).color == Color::Black
                && self.arena.color_of(s_right) == Color::Red
                && self.arena.color_of(s_left) == Color::Black
            {
                trace!("delete case 5: rotate left about sibling");
                let near = s_right.expect("red near child is absent");
                self.arena.node_mut(s).color = Color::Red;
                self.arena.node_mut(near).color = Color::Black;
                self.rotate_left(s);
            }

            // Case 6: the sibling's far child is red. The sibling takes
            // the parent's color, the parent and the far child turn black,
            // and rotating about the parent restores the missing black
            // unit on every path through `n`.
            let s = self.sibling(n).expect("case 6: no sibling");
            let p = self.arena.node(n).parent.expect("case 6: no parent");
            let parent_color = self.arena.node(p).color;
            self.arena.node_mut(s).color = parent_color;
            self.arena.node_mut(p).color = Color::Black;
            if self.arena.node(p).left == Some(n) {
                let far = self
                    .arena
                    .node(s)
                    .right
                    .expect("case 6: far child is absent");
                assert_eq!(
                    self.arena.node(far).color,
                    Color::Red,
                    "delete case 6: far child is not red"
                );
                self.arena.node_mut(far).color = Color::Black;
                trace!("delete case 6: rotate left about parent");
                self.rotate_left(p);
            } else {
                let far = self
                    .arena
                    .node(s)
                    .left
                    .expect("case 6: far child is absent");
                assert_eq!(
                    self.arena.node(far).color,
                    Color::Red,
                    "delete case 6: far child is not red"
                );
                self.arena.node_mut(far).color = Color::Black;
                trace!("delete case 6: rotate right about parent");
                self.rotate_right(p);
            }
            return;
        }
    }

    #[cfg(feature = "verify")]
    fn verify_after_mutation(&self) {
        self.check_invariants();
    }

    #[cfg(not(feature = "verify"))]
    #[inline]
    fn verify_after_mutation(&self) {}
}
