//! Slot arena that owns every node in a tree.
//!
//! Links between nodes are plain [`NodeId`] indices; the arena is the sole
//! owner. Freed slots go on a free list and are reused by later insertions,
//! so a handle stays valid exactly as long as its node is in the tree.

use std::collections::TryReserveError;
use std::mem;

use madrone_core::{Color, NodeId};

/// One stored entry and its links.
#[derive(Debug)]
pub(crate) struct Node<K, V> {
    pub key: K,
    pub value: V,
    pub color: Color,
    pub left: Option<NodeId>,
    pub right: Option<NodeId>,
    /// Non-owning back-reference, used only for upward traversal.
    pub parent: Option<NodeId>,
}

#[derive(Debug)]
enum Slot<K, V> {
    Occupied(Node<K, V>),
    Vacant { next_free: Option<NodeId> },
}

fn occupied<K, V>(slot: &Slot<K, V>) -> &Node<K, V> {
    match slot {
        Slot::Occupied(node) => node,
        Slot::Vacant { .. } => unreachable!("stale node handle"),
    }
}

fn occupied_mut<K, V>(slot: &mut Slot<K, V>) -> &mut Node<K, V> {
    match slot {
        Slot::Occupied(node) => node,
        Slot::Vacant { .. } => unreachable!("stale node handle"),
    }
}

#[derive(Debug)]
pub(crate) struct NodeArena<K, V> {
    slots: Vec<Slot<K, V>>,
    free_head: Option<NodeId>,
    len: usize,
}

impl<K, V> NodeArena<K, V> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            len: 0,
        }
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Allocate a fresh red leaf.
    ///
    /// Capacity is reserved up front, so a failed allocation leaves the
    /// arena, and therefore the tree, untouched.
    pub fn try_alloc(
        &mut self,
        key: K,
        value: V,
        parent: Option<NodeId>,
    ) -> Result<NodeId, TryReserveError> {
        let node = Node {
            key,
            value,
            color: Color::Red,
            left: None,
            right: None,
            parent,
        };
        let id = match self.free_head {
            Some(id) => {
                let slot = &mut self.slots[id.index()];
                let next_free = match slot {
                    Slot::Vacant { next_free } => *next_free,
                    Slot::Occupied(_) => unreachable!("free list points at an occupied slot"),
                };
                self.free_head = next_free;
                *slot = Slot::Occupied(node);
                id
            }
            None => {
                self.slots.try_reserve(1)?;
                let id = NodeId::from_index(self.slots.len());
                self.slots.push(Slot::Occupied(node));
                id
            }
        };
        self.len += 1;
        Ok(id)
    }

    /// Release a node, returning its key and value.
    pub fn free(&mut self, id: NodeId) -> (K, V) {
        let slot = &mut self.slots[id.index()];
        let old = mem::replace(
            slot,
            Slot::Vacant {
                next_free: self.free_head,
            },
        );
        let Slot::Occupied(node) = old else {
            unreachable!("released a vacant node slot");
        };
        self.free_head = Some(id);
        self.len -= 1;
        (node.key, node.value)
    }

    /// Drop every node at once.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free_head = None;
        self.len = 0;
    }

    pub fn node(&self, id: NodeId) -> &Node<K, V> {
        occupied(&self.slots[id.index()])
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node<K, V> {
        occupied_mut(&mut self.slots[id.index()])
    }

    /// Mutable access to two distinct nodes at once.
    pub fn node_pair_mut(&mut self, a: NodeId, b: NodeId) -> (&mut Node<K, V>, &mut Node<K, V>) {
        let (ai, bi) = (a.index(), b.index());
        assert_ne!(ai, bi, "node pair aliases a single slot");
        let split = ai.max(bi);
        let (head, tail) = self.slots.split_at_mut(split);
        let lo = occupied_mut(&mut head[ai.min(bi)]);
        let hi = occupied_mut(&mut tail[0]);
        if ai < bi {
            (lo, hi)
        } else {
            (hi, lo)
        }
    }

    /// Color of a possibly-absent node; nil leaves are black.
    pub fn color_of(&self, id: Option<NodeId>) -> Color {
        id.map_or(Color::Black, |id| self.node(id).color)
    }
}
