//! Removal and node rebalancing.
//!
//! Unlinking an entry may push its leaf below the `C` occupancy floor. The
//! underfull node first tries to borrow a child from an adjacent sibling
//! that has more than `C`; failing that it merges with a sibling, which
//! removes a child from the parent and may cascade the deficit upward. An
//! internal root left with a single child absorbs that child, so the tree
//! shrinks in height without the root id ever changing.
//!
//! Cached maxima are ids, and borrows and merges move children without
//! touching the entries they point at, so only the nodes whose last child
//! changed need a refresh. The one upward sweep happens right after the
//! unlink, for the case where the removed entry was a subtree maximum.

use std::borrow::Borrow;
use std::mem as StdMem;
use std::ops::{Bound, RangeBounds};

use super::BpTreeMap;
use crate::entry::EntryId;
use crate::node::NodeId;
use crate::trace::{debug_log, trace_log};

impl<K, V, const BLOCK_SIZE: usize> BpTreeMap<K, V, BLOCK_SIZE> {
    /// Remove the entry `id`, returning its in-order successor and the
    /// owned pair.
    ///
    /// Purely structural: the entry is found through its leaf back-link, so
    /// no key comparisons happen.
    pub(crate) fn remove_at(&mut self, id: EntryId) -> (EntryId, K, V) {
        let next = self.advance(id);
        if id == self.first {
            self.first = next;
        }

        let leaf = self.entries[id].leaf();
        let pos = match self.nodes[leaf].position_of_entry(id) {
            Some(pos) => pos,
            None => panic!("entry not linked in its leaf"),
        };

        self.nodes[leaf].entry_ids_mut().remove(pos);
        let entry = self.entries.remove(id);
        self.len -= 1;

        self.refresh_max(leaf);
        self.propagate_max(leaf);
        self.rebalance(leaf);

        let (key, value) = entry.into_key_value();
        (next, key, value)
    }

    /// Restore occupancy upward from `from` after an unlink.
    fn rebalance(&mut self, from: NodeId) {
        let mut node = from;

        while let Some(parent) = self.nodes[node].parent() {
            if self.nodes[node].len() >= self.branch {
                break;
            }

            let pos = match self.nodes[parent].position_of_child(node) {
                Some(pos) => pos,
                None => panic!("node not linked under its parent"),
            };
            let left = (pos > 0).then(|| self.nodes[parent].child_ids()[pos - 1]);
            let right = self.nodes[parent].child_ids().get(pos + 1).copied();

            if let Some(left) = left {
                if self.nodes[left].len() > self.branch {
                    self.borrow_from_left(left, node);
                    break;
                }
            }
            if let Some(right) = right {
                if self.nodes[right].len() > self.branch {
                    self.borrow_from_right(node, right);
                    break;
                }
            }

            // Both siblings sit at the floor: merging cannot overflow, and
            // the parent loses a child, so the deficit may move up a level.
            if let Some(left) = left {
                self.merge_into_left(left, node, parent, pos);
            } else if let Some(right) = right {
                self.absorb_right(node, right, parent, pos + 1);
            }

            node = parent;
        }

        self.collapse_root();
    }

    /// Move `left`'s last child to the front of `node`.
    fn borrow_from_left(&mut self, left: NodeId, node: NodeId) {
        trace_log!(left = ?left, node = ?node, "borrow from left");

        let back_at = self.nodes[left].len() - 1;
        let moved = self.nodes[left].children_mut().split_off(back_at);
        self.nodes[node].children_mut().prepend(moved);

        self.adopt_children_range(node, 0, 1);

        // `node` keeps its back child; only the donor's maximum moved.
        self.refresh_max(left);
    }

    /// Move `right`'s first child to the back of `node`.
    fn borrow_from_right(&mut self, node: NodeId, right: NodeId) {
        trace_log!(node = ?node, right = ?right, "borrow from right");

        let rest = self.nodes[right].children_mut().split_off(1);
        let moved = StdMem::replace(self.nodes[right].children_mut(), rest);
        self.nodes[node].children_mut().append(moved);

        let len = self.nodes[node].len();
        self.adopt_children_range(node, len - 1, len);

        // The donor keeps its back child; `node` gained a new maximum.
        self.refresh_max(node);
    }

    /// Fold `node`'s children into `left` and drop `node`.
    fn merge_into_left(&mut self, left: NodeId, node: NodeId, parent: NodeId, pos_of_node: usize) {
        debug_log!(left = ?left, node = ?node, "merge into left sibling");

        let old_len = self.nodes[left].len();
        let taken = self.nodes[node].take_children();
        self.nodes[left].children_mut().append(taken);

        let new_len = self.nodes[left].len();
        self.adopt_children_range(left, old_len, new_len);

        self.nodes[parent].child_ids_mut().remove(pos_of_node);
        self.refresh_max(left);
        self.nodes.remove(node);
    }

    /// Fold `right`'s children into `node` and drop `right`.
    fn absorb_right(&mut self, node: NodeId, right: NodeId, parent: NodeId, pos_of_right: usize) {
        debug_log!(node = ?node, right = ?right, "absorb right sibling");

        let old_len = self.nodes[node].len();
        let taken = self.nodes[right].take_children();
        self.nodes[node].children_mut().append(taken);

        let new_len = self.nodes[node].len();
        self.adopt_children_range(node, old_len, new_len);

        self.nodes[parent].child_ids_mut().remove(pos_of_right);
        self.refresh_max(node);
        self.nodes.remove(right);
    }

    /// Absorb a lone child back into an internal root.
    fn collapse_root(&mut self) {
        if self.nodes[self.root].is_leaf() || self.nodes[self.root].len() != 1 {
            return;
        }

        let child = self.nodes[self.root].child_ids()[0];
        let contents = self.nodes[child].take_children();
        let max = self.nodes[child].max();

        self.nodes[self.root].replace_children(contents);
        self.nodes[self.root].set_max(max);

        let adopted = self.nodes[self.root].len();
        self.adopt_children_range(self.root, 0, adopted);
        self.nodes.remove(child);

        debug_log!(child = ?child, "collapsed root");
    }
}

impl<K, V, const BLOCK_SIZE: usize> BpTreeMap<K, V, BLOCK_SIZE> {
    /// Remove every entry whose key falls in `range`, returning how many
    /// were removed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bptree::BpTreeMap;
    ///
    /// let mut map: BpTreeMap<u32, u32> = (0..10).map(|k| (k, k)).collect();
    ///
    /// assert_eq!(map.remove_range(3..7), 4);
    /// assert_eq!(map.len(), 6);
    /// assert!(!map.contains_key(&3));
    /// assert!(map.contains_key(&7));
    /// ```
    pub fn remove_range<T, R>(&mut self, range: R) -> usize
    where
        K: Borrow<T>,
        T: Ord + ?Sized,
        R: RangeBounds<T>,
    {
        let mut cur = match range.start_bound() {
            Bound::Included(key) => self.lower_bound_id(key),
            Bound::Excluded(key) => self.upper_bound_id(key),
            Bound::Unbounded => self.first,
        };

        let mut removed = 0;
        while !cur.is_end() {
            let inside = match range.end_bound() {
                Bound::Included(key) => self.entries[cur].key().borrow() <= key,
                Bound::Excluded(key) => self.entries[cur].key().borrow() < key,
                Bound::Unbounded => true,
            };
            if !inside {
                break;
            }

            let (next, _, _) = self.remove_at(cur);
            cur = next;
            removed += 1;
        }

        removed
    }
}

// ============================================================================
//  Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    type SmallMap = BpTreeMap<u64, u64, 48>;

    fn filled(n: u64) -> SmallMap {
        let mut map = SmallMap::new();
        for k in 0..n {
            map.insert(k, k * 10);
        }
        map
    }

    #[test]
    fn test_remove_ascending_keeps_invariants() {
        let mut map = filled(32);

        for k in 0..32 {
            assert_eq!(map.remove(&k), Some(k * 10));
            map.check_invariants();
        }

        assert!(map.is_empty());
    }

    #[test]
    fn test_remove_descending_keeps_invariants() {
        let mut map = filled(32);

        // Always removes the current maximum, so every ancestor's cached
        // maximum has to be rewritten on each step.
        for k in (0..32).rev() {
            assert_eq!(map.remove(&k), Some(k * 10));
            map.check_invariants();
        }

        assert!(map.is_empty());
    }

    #[test]
    fn test_remove_middle_out_keeps_invariants() {
        let mut map = filled(33);

        for k in [16, 15, 17, 14, 18, 13, 19, 12, 20] {
            assert_eq!(map.remove(&k), Some(k * 10));
            map.check_invariants();
        }

        assert_eq!(map.len(), 24);
        assert!(!map.contains_key(&16));
        assert!(map.contains_key(&11));
        assert!(map.contains_key(&21));
    }

    #[test]
    fn test_tree_shrinks_back_to_a_leaf_root() {
        let mut map = filled(32);
        assert!(!map.nodes[map.root].is_leaf());

        for k in 0..31 {
            map.remove(&k);
        }

        assert_eq!(map.len(), 1);
        assert!(map.nodes[map.root].is_leaf());
        assert_eq!(map.get(&31), Some(&310));
        map.check_invariants();
    }

    #[test]
    fn test_remove_front_advances_tracked_first() {
        let mut map = filled(8);

        map.remove(&0);
        assert_eq!(map.first_key_value(), Some((&1, &10)));

        map.remove(&1);
        assert_eq!(map.first_key_value(), Some((&2, &20)));
        map.check_invariants();
    }

    #[test]
    fn test_remove_at_reports_successor() {
        let mut map = filled(4);

        let id = map.locate(&1).unwrap();
        let (next, key, value) = map.remove_at(id);

        assert_eq!((key, value), (1, 10));
        assert_eq!(*map.entries[next].key(), 2);

        let id = map.locate(&3).unwrap();
        let (next, _, _) = map.remove_at(id);
        assert!(next.is_end());
    }

    #[test]
    fn test_remove_missing_key_is_a_noop() {
        let mut map = filled(8);

        assert_eq!(map.remove(&99), None);
        assert_eq!(map.len(), 8);
        map.check_invariants();
    }

    #[test]
    fn test_remove_range_half_open() {
        let mut map = filled(20);

        assert_eq!(map.remove_range(5..15), 10);
        assert_eq!(map.len(), 10);
        assert!(map.contains_key(&4));
        assert!(!map.contains_key(&5));
        assert!(!map.contains_key(&14));
        assert!(map.contains_key(&15));
        map.check_invariants();
    }

    #[test]
    fn test_remove_range_inclusive_and_open_ends() {
        let mut map = filled(20);

        assert_eq!(map.remove_range(..=3), 4);
        assert_eq!(map.remove_range(16..), 4);
        assert_eq!(map.first_key_value(), Some((&4, &40)));
        assert_eq!(map.last_key_value(), Some((&15, &150)));
        map.check_invariants();
    }

    #[test]
    fn test_remove_range_misses_cleanly() {
        let mut map = filled(10);

        assert_eq!(map.remove_range(20..30), 0);
        #[allow(clippy::reversed_empty_ranges)]
        let backwards = map.remove_range(7..3);
        assert_eq!(backwards, 0);
        assert_eq!(map.len(), 10);
    }

    #[test]
    fn test_remove_range_everything() {
        let mut map = filled(25);

        assert_eq!(map.remove_range(..), 25);
        assert!(map.is_empty());
        map.check_invariants();

        map.insert(3, 30);
        assert_eq!(map.get(&3), Some(&30));
        map.check_invariants();
    }
}
