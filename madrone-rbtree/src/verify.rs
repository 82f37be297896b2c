//! Structural self-checks and test diagnostics.
//!
//! Rust rendition of the reference implementation's verification pass. The
//! checks walk the whole tree, so they are meant for tests and the `verify`
//! feature, not steady-state use.

use std::cmp::Ordering;

use madrone_core::{Color, Comparator, NodeId};

use crate::RbMap;

impl<K, V, C: Comparator<K>> RbMap<K, V, C> {
    /// Assert every structural invariant over the whole tree.
    ///
    /// Panics on the first violation. A violation means the engine, or a
    /// non-conforming comparator, has a bug; it is never recoverable.
    pub fn check_invariants(&self) {
        if let Some(root) = self.root {
            assert_eq!(
                self.arena.node(root).color,
                Color::Black,
                "root is not black"
            );
            assert!(
                self.arena.node(root).parent.is_none(),
                "root has a parent back-reference"
            );
        }
        let mut expected_blacks = None;
        let mut reachable = 0;
        self.check_node(self.root, None, 0, &mut expected_blacks, &mut reachable);
        assert_eq!(
            reachable,
            self.arena.len(),
            "arena length disagrees with reachable nodes"
        );
    }

    /// Walk one subtree, counting blacks down every path.
    ///
    /// The first absent child reached fixes the expected black count, as in
    /// the reference checker; every later path must match it.
    fn check_node(
        &self,
        n: Option<NodeId>,
        parent: Option<NodeId>,
        blacks_above: usize,
        expected_blacks: &mut Option<usize>,
        reachable: &mut usize,
    ) {
        let blacks = blacks_above + usize::from(self.arena.color_of(n) == Color::Black);
        let Some(id) = n else {
            match *expected_blacks {
                None => *expected_blacks = Some(blacks),
                Some(want) => {
                    assert_eq!(blacks, want, "black-height differs between paths");
                }
            }
            return;
        };
        *reachable += 1;

        let node = self.arena.node(id);
        assert_eq!(node.parent, parent, "parent back-reference is wrong");
        if node.color == Color::Red {
            assert_eq!(
                self.arena.color_of(node.left),
                Color::Black,
                "red node has a red left child"
            );
            assert_eq!(
                self.arena.color_of(node.right),
                Color::Black,
                "red node has a red right child"
            );
            assert_eq!(
                self.arena.color_of(parent),
                Color::Black,
                "red node has a red parent"
            );
        }
        if let Some(left) = node.left {
            assert_eq!(
                self.cmp.compare(&self.arena.node(left).key, &node.key),
                Ordering::Less,
                "left child is not less than its parent"
            );
        }
        if let Some(right) = node.right {
            assert_eq!(
                self.cmp.compare(&self.arena.node(right).key, &node.key),
                Ordering::Greater,
                "right child is not greater than its parent"
            );
        }

        self.check_node(node.left, Some(id), blacks, expected_blacks, reachable);
        self.check_node(node.right, Some(id), blacks, expected_blacks, reachable);
    }

    /// Height in nodes of the longest root-to-leaf path.
    ///
    /// The invariants bound this by `2 * log2(n + 1)`.
    pub fn height(&self) -> usize {
        self.depth(self.root)
    }

    fn depth(&self, n: Option<NodeId>) -> usize {
        match n {
            None => 0,
            Some(id) => {
                let node = self.arena.node(id);
                1 + self.depth(node.left).max(self.depth(node.right))
            }
        }
    }

    /// Key at the root, for structural assertions in tests.
    pub fn root_key(&self) -> Option<&K> {
        self.root.map(|id| &self.arena.node(id).key)
    }

    /// Color of the node holding `key`.
    pub fn color_of_key(&self, key: &K) -> Option<Color> {
        self.lookup_node(key).map(|id| self.arena.node(id).color)
    }

    /// Keys of the children of the node holding `key`.
    pub fn child_keys(&self, key: &K) -> Option<(Option<&K>, Option<&K>)> {
        let id = self.lookup_node(key)?;
        let node = self.arena.node(id);
        Some((
            node.left.map(|l| &self.arena.node(l).key),
            node.right.map(|r| &self.arena.node(r).key),
        ))
    }
}
