//! Filepath: src/tree/insert.rs
//!
//! Insertion and node splitting.
//!
//! An insert descends to the leaf that covers the key, refuses duplicates,
//! splices the new entry in at its sorted position, and splits upward while
//! any node sits at the `2C` threshold. Each split leaves two nodes of `C`
//! children. Splitting the root hoists its contents into a fresh child
//! first, so the root id never changes.

use super::{BpTreeMap, Seek};
use crate::entry::{Entry, EntryId};
use crate::node::{Children, Node, NodeId};
use crate::trace::{debug_log, trace_log};

impl<K: Ord, V, const BLOCK_SIZE: usize> BpTreeMap<K, V, BLOCK_SIZE> {
    /// Insert `key -> value` unless the key is present.
    ///
    /// Returns the entry holding the key and whether an insertion happened.
    /// A duplicate key keeps the stored value and drops the offered one.
    pub(crate) fn insert_impl(&mut self, key: K, value: V) -> (EntryId, bool) {
        let leaf = self.descend(&key, Seek::LowerBound);
        let pos = self.leaf_lower_bound_pos(leaf, &key);

        if let Some(&existing) = self.nodes[leaf].entry_ids().get(pos) {
            if *self.entries[existing].key() == key {
                return (existing, false);
            }
        }

        let id = self.entries.insert(Entry::new(key, value, leaf));

        // The new entry becomes the tracked first when the map was empty or
        // when it lands in front of the current first entry.
        if self.first.is_end() || self.nodes[leaf].entry_ids().get(pos) == Some(&self.first) {
            self.first = id;
        }

        self.len += 1;
        self.nodes[leaf].entry_ids_mut().insert(pos, id);
        self.refresh_max(leaf);

        if self.nodes[leaf].len() == 2 * self.branch {
            self.split_cascade(leaf);
        }
        self.propagate_max(leaf);

        (id, true)
    }

    /// Split nodes upward from `from` while they sit at the `2C` threshold.
    fn split_cascade(&mut self, from: NodeId) {
        let mut node = from;
        while self.nodes[node].len() == 2 * self.branch {
            node = self.split_node(node);
        }
    }

    /// Split `node` in half and link the upper half after it.
    ///
    /// Returns the parent both halves ended up under, which may itself have
    /// reached the split threshold.
    fn split_node(&mut self, node: NodeId) -> NodeId {
        let tail = self.nodes[node].children_mut().split_off(self.branch);
        let right = self.nodes.insert(Node::with_children(tail));

        let moved = self.nodes[right].len();
        self.adopt_children_range(right, 0, moved);
        self.refresh_max(node);
        self.refresh_max(right);

        trace_log!(node = ?node, right = ?right, "split node");

        self.link_after(node, right)
    }

    /// Link `right` under `left`'s parent, directly after `left`.
    ///
    /// A parentless `left` is the freshly split root: its halves are first
    /// hoisted under a new child, and that child takes the root's place as
    /// the left sibling.
    fn link_after(&mut self, left: NodeId, right: NodeId) -> NodeId {
        let (left, parent) = match self.nodes[left].parent() {
            Some(parent) => (left, parent),
            None => (self.hoist_root(), self.root),
        };

        self.nodes[right].set_parent(Some(parent));

        let pos = match self.nodes[parent].position_of_child(left) {
            Some(pos) => pos + 1,
            None => panic!("node not linked under its parent"),
        };
        self.nodes[parent].child_ids_mut().insert(pos, right);
        self.refresh_max(parent);

        parent
    }

    /// Move the root's contents into a fresh child and make the root an
    /// internal node over it.
    ///
    /// The root keeps its id and its cached maximum; the returned child
    /// carries the old children, re-parented.
    fn hoist_root(&mut self) -> NodeId {
        let contents = self.nodes[self.root].take_children();
        let max = self.nodes[self.root].max();

        let child = self.nodes.insert(Node::with_children(contents));
        self.nodes[child].set_parent(Some(self.root));
        self.nodes[child].set_max(max);

        let moved = self.nodes[child].len();
        self.adopt_children_range(child, 0, moved);

        self.nodes[self.root]
            .replace_children(Children::Internal(vec![child]));

        debug_log!(child = ?child, "hoisted root contents");

        child
    }
}

// ============================================================================
//  Tests
// ============================================================================
