//! Filepath: src/tree.rs
//!
//! `BpTreeMap` - an in-memory B+ tree ordered map.
//!
//! The map stores every entry in a leaf; internal nodes route descent by the
//! cached maximum key of each child subtree. All nodes and entries live in
//! two slot arenas owned by the map, addressed by stable `u32` ids, so the
//! structure is plain safe Rust with no owning pointer graph. Cursors walk
//! parent back-links instead of a linked leaf chain.
//!
//! # Structure
//!
//! - Fan-out bound `C` is derived once from the `BLOCK_SIZE` const parameter
//!   and the key size, as if each node occupied a block of that many bytes.
//!   A node reaching `2C` children splits into two nodes of `C`; a non-root
//!   node dropping below `C` borrows from a sibling or merges.
//! - The root id never changes: splitting the root hoists its contents into
//!   a fresh child, and an internal root left with one child absorbs that
//!   child back into the root slot.
//! - The end position is a reserved sentinel id that is never allocated.
//!
//! # Invariants
//!
//! After every public mutation:
//!
//! 1. Leaf entry lists are strictly sorted; the map holds no duplicate keys.
//! 2. Every node's cached maximum names the true maximum of its subtree.
//! 3. Non-root nodes hold between `C` and `2C - 1` children.
//! 4. The root is internal only while it has at least two children.
//! 5. The tracked first entry is the in-order minimum (or the sentinel when
//!    the map is empty).
//!
//! [`check_invariants`] asserts all of the above plus back-link consistency
//! and is exercised heavily by the property tests.
//!
//! # Complexity
//!
//! | Operation | Cost |
//! |-----------|------|
//! | `get`, `insert`, `remove`, bound queries | `O(log n)` |
//! | cursor step | amortized `O(1)`, worst `O(log n)` |
//! | `clear` | `O(n)`, no recursion |
//! | `clone` | `O(n)` slot-for-slot copy |
//!
//! [`check_invariants`]: BpTreeMap::check_invariants

use std::borrow::Borrow;
use std::fmt as StdFmt;

use crate::arena::Arena;
use crate::entry::{Entry, EntryId};
use crate::error::{Error, Result};
use crate::node::{Children, DEFAULT_BLOCK_SIZE, Node, NodeId, branch_factor};
use crate::trace::debug_log;

mod cursor;
mod insert;
mod remove;
mod search;

pub use cursor::{Cursor, CursorMut, Iter, Keys, Values};
pub(crate) use search::Seek;

// ============================================================================
//  BpTreeMap
// ============================================================================

/// An ordered map backed by an in-memory B+ tree.
///
/// Keys are kept in strictly increasing order; lookups, insertions, removals
/// and bound queries run in logarithmic time, and cursors iterate the map in
/// both directions. `BLOCK_SIZE` is the nominal block the fan-out is derived
/// from; the default of 4096 gives wide, shallow trees for small keys.
///
/// Insertion never overwrites: inserting a present key keeps the stored
/// value and reports `false`. Use [`get_mut`] or [`get_or_default`] to update
/// values in place.
///
/// # Examples
///
/// ```rust
/// use bptree::BpTreeMap;
///
/// let mut map: BpTreeMap<i32, &str> = BpTreeMap::new();
/// map.insert(3, "three");
/// map.insert(1, "one");
/// map.insert(2, "two");
///
/// assert_eq!(map.len(), 3);
/// assert_eq!(map.get(&2), Some(&"two"));
///
/// let keys: Vec<i32> = map.keys().copied().collect();
/// assert_eq!(keys, vec![1, 2, 3]);
/// ```
///
/// [`get_mut`]: BpTreeMap::get_mut
/// [`get_or_default`]: BpTreeMap::get_or_default
#[derive(Clone)]
pub struct BpTreeMap<K, V, const BLOCK_SIZE: usize = DEFAULT_BLOCK_SIZE> {
    /// All nodes of the tree, leaf and internal alike.
    nodes: Arena<NodeId, Node>,

    /// All live entries.
    entries: Arena<EntryId, Entry<K, V>>,

    /// The root node. Allocated once; never replaced for the life of the map.
    root: NodeId,

    /// The in-order first entry, or the end sentinel when the map is empty.
    first: EntryId,

    /// Number of live entries.
    len: usize,

    /// Branching bound `C` derived from `BLOCK_SIZE` and the key size.
    branch: usize,
}

impl<K, V, const BLOCK_SIZE: usize> BpTreeMap<K, V, BLOCK_SIZE> {
    /// Create an empty map.
    ///
    /// The root starts as an empty leaf and keeps its identity for the life
    /// of the map.
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = Arena::new();
        let root = nodes.insert(Node::leaf());

        Self {
            nodes,
            entries: Arena::new(),
            root,
            first: EntryId::END,
            len: 0,
            branch: branch_factor::<K>(BLOCK_SIZE),
        }
    }

    /// Number of entries in the map.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the map holds no entries.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The derived branching bound `C`.
    ///
    /// Non-root nodes hold between `C` and `2C - 1` children.
    #[inline]
    #[must_use]
    pub const fn branch_factor(&self) -> usize {
        self.branch
    }

    /// Remove every entry.
    ///
    /// Both arenas are dropped wholesale and the root is re-seeded as an
    /// empty leaf, so this is linear in the entry count with no per-entry
    /// tree walk and no recursion.
    pub fn clear(&mut self) {
        debug_log!(len = self.len, "clear");

        self.nodes.clear();
        self.entries.clear();
        self.root = self.nodes.insert(Node::leaf());
        self.first = EntryId::END;
        self.len = 0;
    }

    /// The entry holding the largest key, or the sentinel when empty.
    #[inline]
    pub(crate) fn last_entry_id(&self) -> EntryId {
        self.nodes[self.root].max().unwrap_or(EntryId::END)
    }

    /// First key/value pair in key order.
    #[must_use]
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.entries.get(self.first).map(Entry::key_value)
    }

    /// Last key/value pair in key order.
    #[must_use]
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.entries.get(self.last_entry_id()).map(Entry::key_value)
    }
}

// ============================================================================
//  Keyed operations
// ============================================================================

impl<K: Ord, V, const BLOCK_SIZE: usize> BpTreeMap<K, V, BLOCK_SIZE> {
    /// Shared reference to the value for `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bptree::BpTreeMap;
    ///
    /// let mut map: BpTreeMap<String, u32> = BpTreeMap::new();
    /// map.insert("alpha".to_string(), 1);
    ///
    /// // Lookups accept any borrowed form of the key.
    /// assert_eq!(map.get("alpha"), Some(&1));
    /// assert_eq!(map.get("beta"), None);
    /// ```
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.locate(key).map(|id| self.entries[id].value())
    }

    /// Exclusive reference to the value for `key`.
    #[must_use]
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let id = self.locate(key)?;
        Some(self.entries[id].value_mut())
    }

    /// The stored key/value pair for `key`.
    #[must_use]
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.locate(key).map(|id| self.entries[id].key_value())
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.locate(key).is_some()
    }

    /// Number of entries for `key`: 0 or 1, keys being unique.
    #[must_use]
    pub fn count<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        usize::from(self.contains_key(key))
    }

    /// Checked access to the value for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] when `key` is absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bptree::{BpTreeMap, Error};
    ///
    /// let mut map: BpTreeMap<i32, char> = BpTreeMap::new();
    /// map.insert(7, 'x');
    ///
    /// assert_eq!(map.at(&7), Ok(&'x'));
    /// assert_eq!(map.at(&9), Err(Error::KeyNotFound));
    /// ```
    pub fn at<Q>(&self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get(key).ok_or(Error::KeyNotFound)
    }

    /// Checked exclusive access to the value for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] when `key` is absent.
    pub fn at_mut<Q>(&mut self, key: &Q) -> Result<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get_mut(key).ok_or(Error::KeyNotFound)
    }

    /// Exclusive reference to the value for `key`, inserting `V::default()`
    /// first when the key is absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bptree::BpTreeMap;
    ///
    /// let mut map: BpTreeMap<&str, u32> = BpTreeMap::new();
    /// *map.get_or_default("hits") += 1;
    /// *map.get_or_default("hits") += 1;
    ///
    /// assert_eq!(map.get("hits"), Some(&2));
    /// ```
    pub fn get_or_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        let (id, _) = self.insert_impl(key, V::default());
        self.entries[id].value_mut()
    }

    /// Insert `key -> value`.
    ///
    /// Returns a cursor at the entry for `key` and whether an insertion took
    /// place. When the key is already present the stored value is kept, the
    /// offered `value` is dropped, and the cursor points at the existing
    /// entry.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bptree::BpTreeMap;
    ///
    /// let mut map: BpTreeMap<i32, &str> = BpTreeMap::new();
    /// assert!(map.insert(1, "a").1);
    ///
    /// let (cursor, inserted) = map.insert(1, "b");
    /// assert!(!inserted);
    /// assert_eq!(cursor.value(), Some(&"a"));
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> (Cursor<'_, K, V, BLOCK_SIZE>, bool) {
        let (id, inserted) = self.insert_impl(key, value);
        (Cursor::new(self, id), inserted)
    }

    /// Remove the entry for `key`, returning its value.
    ///
    /// Removing an absent key is a no-op reporting `None`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bptree::BpTreeMap;
    ///
    /// let mut map: BpTreeMap<i32, &str> = BpTreeMap::new();
    /// map.insert(5, "five");
    ///
    /// assert_eq!(map.remove(&5), Some("five"));
    /// assert_eq!(map.remove(&5), None);
    /// ```
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let id = self.locate(key)?;
        let (_, _, value) = self.remove_at(id);
        Some(value)
    }

    /// Remove the entry for `key`, returning the owned pair.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let id = self.locate(key)?;
        let (_, key, value) = self.remove_at(id);
        Some((key, value))
    }
}

// ============================================================================
//  Shared structural maintenance
// ============================================================================

impl<K, V, const BLOCK_SIZE: usize> BpTreeMap<K, V, BLOCK_SIZE> {
    /// Recompute `node`'s cached maximum from its last child.
    pub(crate) fn refresh_max(&mut self, node: NodeId) {
        let max = match self.nodes[node].children() {
            Children::Leaf(ids) => ids.last().copied(),
            Children::Internal(ids) => ids.last().and_then(|&child| self.nodes[child].max()),
        };

        self.nodes[node].set_max(max);
    }

    /// Refresh the cached maxima of every ancestor of `node`.
    ///
    /// Each ancestor takes the maximum of its last child, so one upward walk
    /// restores the whole chain once `node` itself is correct.
    pub(crate) fn propagate_max(&mut self, from: NodeId) {
        let mut node = from;
        while let Some(parent) = self.nodes[node].parent() {
            let back = self.nodes[parent].child_ids().last().copied();
            let max = back.and_then(|child| self.nodes[child].max());

            self.nodes[parent].set_max(max);
            node = parent;
        }
    }

    /// Point the back-links of `node`'s children in `[from, to)` at `node`.
    ///
    /// For a leaf that is each entry's leaf link; otherwise each child
    /// node's parent link.
    pub(crate) fn adopt_children_range(&mut self, node: NodeId, from: usize, to: usize) {
        if self.nodes[node].is_leaf() {
            for i in from..to {
                let entry = self.nodes[node].entry_ids()[i];
                self.entries[entry].set_leaf(node);
            }
        } else {
            for i in from..to {
                let child = self.nodes[node].child_ids()[i];
                self.nodes[child].set_parent(Some(node));
            }
        }
    }
}

// ============================================================================
//  Validation
// ============================================================================

impl<K: Ord, V, const BLOCK_SIZE: usize> BpTreeMap<K, V, BLOCK_SIZE> {
    /// Walk the whole tree and assert every structural invariant.
    ///
    /// Checks occupancy bounds, cached maxima, parent and leaf back-links,
    /// strict key ordering, the tracked first entry, and that the arenas
    /// hold exactly the reachable nodes and entries. Linear cost; meant for
    /// tests and debugging rather than production paths.
    ///
    /// # Panics
    ///
    /// Panics at the first violated invariant.
    pub fn check_invariants(&self) {
        assert!(
            self.nodes[self.root].parent().is_none(),
            "root has a parent"
        );

        let mut stack = vec![self.root];
        let mut seen_nodes = 0usize;
        let mut in_order: Vec<EntryId> = Vec::with_capacity(self.len);

        while let Some(node) = stack.pop() {
            seen_nodes += 1;
            let len = self.nodes[node].len();

            if node == self.root {
                assert!(
                    self.nodes[node].is_leaf() || len >= 2,
                    "internal root with fewer than two children"
                );
            } else {
                assert!(len >= self.branch, "node below minimum occupancy");
            }
            assert!(len < 2 * self.branch, "node at or above split threshold");

            match self.nodes[node].children() {
                Children::Leaf(ids) => {
                    for &entry in ids {
                        assert_eq!(
                            self.entries[entry].leaf(),
                            node,
                            "entry leaf back-link is wrong"
                        );
                    }
                    assert_eq!(
                        self.nodes[node].max(),
                        ids.last().copied(),
                        "leaf maximum is stale"
                    );
                    in_order.extend_from_slice(ids);
                }
                Children::Internal(ids) => {
                    for &child in ids {
                        assert_eq!(
                            self.nodes[child].parent(),
                            Some(node),
                            "child parent back-link is wrong"
                        );
                    }
                    let back_max = ids.last().and_then(|&child| self.nodes[child].max());
                    assert_eq!(self.nodes[node].max(), back_max, "internal maximum is stale");

                    // Reversed so the leftmost child is visited first.
                    stack.extend(ids.iter().rev());
                }
            }
        }

        assert_eq!(seen_nodes, self.nodes.len(), "unreachable nodes in arena");
        assert_eq!(in_order.len(), self.len, "entry count mismatch");
        assert_eq!(in_order.len(), self.entries.len(), "orphan entries in arena");
        assert_eq!(
            self.first,
            in_order.first().copied().unwrap_or(EntryId::END),
            "tracked first entry is wrong"
        );

        for pair in in_order.windows(2) {
            assert!(
                self.entries[pair[0]].key() < self.entries[pair[1]].key(),
                "keys out of order"
            );
        }
    }
}

// ============================================================================
//  Standard trait impls
// ============================================================================

impl<K, V, const BLOCK_SIZE: usize> Default for BpTreeMap<K, V, BLOCK_SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: StdFmt::Debug, V: StdFmt::Debug, const BLOCK_SIZE: usize> StdFmt::Debug
    for BpTreeMap<K, V, BLOCK_SIZE>
{
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: PartialEq, V: PartialEq, const BLOCK_SIZE: usize> PartialEq
    for BpTreeMap<K, V, BLOCK_SIZE>
{
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq, const BLOCK_SIZE: usize> Eq for BpTreeMap<K, V, BLOCK_SIZE> {}

impl<K, Q, V, const BLOCK_SIZE: usize> std::ops::Index<&Q> for BpTreeMap<K, V, BLOCK_SIZE>
where
    K: Borrow<Q> + Ord,
    Q: Ord + ?Sized,
{
    type Output = V;

    /// # Panics
    ///
    /// Panics if `key` is absent.
    fn index(&self, key: &Q) -> &V {
        match self.get(key) {
            Some(value) => value,
            None => panic!("no entry found for key"),
        }
    }
}

impl<K: Ord, V, const BLOCK_SIZE: usize> Extend<(K, V)> for BpTreeMap<K, V, BLOCK_SIZE> {
    /// Insert every pair, first occurrence of a key winning.
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert_impl(key, value);
        }
    }
}

impl<K: Ord, V, const BLOCK_SIZE: usize> FromIterator<(K, V)> for BpTreeMap<K, V, BLOCK_SIZE> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

// ============================================================================
//  Tests
// ============================================================================
