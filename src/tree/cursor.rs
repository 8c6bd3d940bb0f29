//! Filepath: src/tree/cursor.rs
//!
//! Cursors and iteration.
//!
//! There is no linked chain between leaves: a step from the last entry of
//! one leaf climbs the parent links until an ancestor offers a sibling
//! subtree, then drops to that subtree's edge entry. A full scan touches
//! every edge at most twice, so stepping is amortized constant time with a
//! worst case of one root-to-leaf path.
//!
//! [`Cursor`] is a copyable read-only position. [`CursorMut`] borrows the
//! map exclusively and can edit values and remove entries while walking.
//! Both are always either at an entry or at the end position past the last
//! entry.

use std::borrow::Borrow;
use std::fmt as StdFmt;

use super::BpTreeMap;
use crate::entry::{Entry, EntryId};
use crate::node::NodeId;

// ============================================================================
//  Stepping
// ============================================================================

impl<K, V, const BLOCK_SIZE: usize> BpTreeMap<K, V, BLOCK_SIZE> {
    /// The entry after `at` in key order.
    ///
    /// The end position is absorbing: advancing it yields it again.
    pub(crate) fn advance(&self, at: EntryId) -> EntryId {
        if at.is_end() {
            return EntryId::END;
        }

        let leaf = self.entries[at].leaf();
        let pos = match self.nodes[leaf].position_of_entry(at) {
            Some(pos) => pos,
            None => panic!("entry not linked in its leaf"),
        };
        if let Some(&next) = self.nodes[leaf].entry_ids().get(pos + 1) {
            return next;
        }

        // Last entry of its leaf: climb until an ancestor has a right
        // sibling, then take that subtree's first entry.
        let mut node = leaf;
        while let Some(parent) = self.nodes[node].parent() {
            let pos = match self.nodes[parent].position_of_child(node) {
                Some(pos) => pos,
                None => panic!("node not linked under its parent"),
            };
            if let Some(&sibling) = self.nodes[parent].child_ids().get(pos + 1) {
                return self.first_entry_of_subtree(sibling);
            }
            node = parent;
        }

        EntryId::END
    }

    /// The entry before `at` in key order.
    ///
    /// Retreating from the end position yields the last entry; retreating
    /// from the first entry stays on it.
    pub(crate) fn retreat(&self, at: EntryId) -> EntryId {
        if at.is_end() {
            return self.last_entry_id();
        }

        let leaf = self.entries[at].leaf();
        let pos = match self.nodes[leaf].position_of_entry(at) {
            Some(pos) => pos,
            None => panic!("entry not linked in its leaf"),
        };
        if pos > 0 {
            return self.nodes[leaf].entry_ids()[pos - 1];
        }

        // A left sibling's cached maximum is its subtree's last entry, so
        // the climb needs no second descent.
        let mut node = leaf;
        while let Some(parent) = self.nodes[node].parent() {
            let pos = match self.nodes[parent].position_of_child(node) {
                Some(pos) => pos,
                None => panic!("node not linked under its parent"),
            };
            if pos > 0 {
                let sibling = self.nodes[parent].child_ids()[pos - 1];
                return match self.nodes[sibling].max() {
                    Some(id) => id,
                    None => panic!("sibling subtree missing cached maximum"),
                };
            }
            node = parent;
        }

        at
    }

    /// First entry under `node`, following the leftmost spine.
    fn first_entry_of_subtree(&self, node: NodeId) -> EntryId {
        let mut node = node;
        while !self.nodes[node].is_leaf() {
            node = self.nodes[node].child_ids()[0];
        }

        match self.nodes[node].entry_ids().first() {
            Some(&id) => id,
            None => panic!("descended to an empty leaf"),
        }
    }
}

// ============================================================================
//  Position queries
// ============================================================================

impl<K: Ord, V, const BLOCK_SIZE: usize> BpTreeMap<K, V, BLOCK_SIZE> {
    /// Cursor at the entry for `key`, or at the end position when absent.
    #[must_use]
    pub fn find<Q>(&self, key: &Q) -> Cursor<'_, K, V, BLOCK_SIZE>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        Cursor::new(self, self.locate(key).unwrap_or(EntryId::END))
    }

    /// Cursor at the first entry with key `>= key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bptree::BpTreeMap;
    ///
    /// let map: BpTreeMap<u32, &str> =
    ///     [(10, "ten"), (20, "twenty")].into_iter().collect();
    ///
    /// assert_eq!(map.lower_bound(&10).key(), Some(&10));
    /// assert_eq!(map.lower_bound(&15).key(), Some(&20));
    /// assert!(map.lower_bound(&25).is_end());
    /// ```
    #[must_use]
    pub fn lower_bound<Q>(&self, key: &Q) -> Cursor<'_, K, V, BLOCK_SIZE>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        Cursor::new(self, self.lower_bound_id(key))
    }

    /// Cursor at the first entry with key `> key`.
    #[must_use]
    pub fn upper_bound<Q>(&self, key: &Q) -> Cursor<'_, K, V, BLOCK_SIZE>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        Cursor::new(self, self.upper_bound_id(key))
    }

    /// The pair of cursors bracketing `key`.
    ///
    /// Keys are unique, so the two positions are either one entry apart or
    /// equal when `key` is absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bptree::BpTreeMap;
    ///
    /// let map: BpTreeMap<u32, &str> =
    ///     [(1, "one"), (2, "two"), (3, "three")].into_iter().collect();
    ///
    /// let (low, high) = map.equal_range(&2);
    /// assert_eq!(low.key(), Some(&2));
    /// assert_eq!(high.key(), Some(&3));
    ///
    /// let (low, high) = map.equal_range(&9);
    /// assert!(low.is_end() && high.is_end());
    /// ```
    #[must_use]
    pub fn equal_range<Q>(
        &self,
        key: &Q,
    ) -> (Cursor<'_, K, V, BLOCK_SIZE>, Cursor<'_, K, V, BLOCK_SIZE>)
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        (self.lower_bound(key), self.upper_bound(key))
    }

    /// Editing cursor at the entry for `key`, or at the end position.
    #[must_use]
    pub fn find_mut<Q>(&mut self, key: &Q) -> CursorMut<'_, K, V, BLOCK_SIZE>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let at = self.locate(key).unwrap_or(EntryId::END);
        CursorMut::new(self, at)
    }

    /// Editing cursor at the first entry with key `>= key`.
    #[must_use]
    pub fn lower_bound_mut<Q>(&mut self, key: &Q) -> CursorMut<'_, K, V, BLOCK_SIZE>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let at = self.lower_bound_id(key);
        CursorMut::new(self, at)
    }

    /// Editing cursor at the first entry with key `> key`.
    #[must_use]
    pub fn upper_bound_mut<Q>(&mut self, key: &Q) -> CursorMut<'_, K, V, BLOCK_SIZE>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let at = self.upper_bound_id(key);
        CursorMut::new(self, at)
    }
}

impl<K, V, const BLOCK_SIZE: usize> BpTreeMap<K, V, BLOCK_SIZE> {
    /// Cursor at the first entry, or at the end position when empty.
    #[must_use]
    pub fn cursor_front(&self) -> Cursor<'_, K, V, BLOCK_SIZE> {
        Cursor::new(self, self.first)
    }

    /// Cursor at the last entry, or at the end position when empty.
    #[must_use]
    pub fn cursor_back(&self) -> Cursor<'_, K, V, BLOCK_SIZE> {
        Cursor::new(self, self.last_entry_id())
    }

    /// Editing cursor at the first entry.
    #[must_use]
    pub fn cursor_front_mut(&mut self) -> CursorMut<'_, K, V, BLOCK_SIZE> {
        let at = self.first;
        CursorMut::new(self, at)
    }

    /// Editing cursor at the last entry.
    #[must_use]
    pub fn cursor_back_mut(&mut self) -> CursorMut<'_, K, V, BLOCK_SIZE> {
        let at = self.last_entry_id();
        CursorMut::new(self, at)
    }

    /// Iterator over all entries in key order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bptree::BpTreeMap;
    ///
    /// let map: BpTreeMap<u32, char> = [(2, 'b'), (1, 'a')].into_iter().collect();
    ///
    /// let pairs: Vec<(u32, char)> = map.iter().map(|(k, v)| (*k, *v)).collect();
    /// assert_eq!(pairs, vec![(1, 'a'), (2, 'b')]);
    /// ```
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V, BLOCK_SIZE> {
        Iter {
            tree: self,
            front: self.first,
            back: self.last_entry_id(),
            remaining: self.len,
        }
    }

    /// Iterator over the keys in order.
    #[must_use]
    pub fn keys(&self) -> Keys<'_, K, V, BLOCK_SIZE> {
        Keys { inner: self.iter() }
    }

    /// Iterator over the values in key order.
    #[must_use]
    pub fn values(&self) -> Values<'_, K, V, BLOCK_SIZE> {
        Values { inner: self.iter() }
    }
}

impl<'a, K, V, const BLOCK_SIZE: usize> IntoIterator for &'a BpTreeMap<K, V, BLOCK_SIZE> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, BLOCK_SIZE>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ============================================================================
//  Cursor
// ============================================================================

/// A read-only position in a [`BpTreeMap`]: an entry or the end position.
///
/// Cursors are cheap to copy and never invalidate each other. The map
/// cannot be mutated while any cursor into it is alive.
///
/// # Examples
///
/// ```rust
/// use bptree::BpTreeMap;
///
/// let mut map: BpTreeMap<i32, char> = BpTreeMap::new();
/// map.extend([(1, 'a'), (2, 'b'), (3, 'c')]);
///
/// let mut cursor = map.cursor_front();
/// assert_eq!(cursor.key(), Some(&1));
///
/// cursor.move_next();
/// cursor.move_next();
/// assert_eq!(cursor.key_value(), Some((&3, &'c')));
///
/// cursor.move_next();
/// assert!(cursor.is_end());
/// ```
pub struct Cursor<'a, K, V, const BLOCK_SIZE: usize> {
    tree: &'a BpTreeMap<K, V, BLOCK_SIZE>,
    at: EntryId,
}

impl<'a, K, V, const BLOCK_SIZE: usize> Cursor<'a, K, V, BLOCK_SIZE> {
    pub(crate) const fn new(tree: &'a BpTreeMap<K, V, BLOCK_SIZE>, at: EntryId) -> Self {
        Self { tree, at }
    }

    /// Whether the cursor sits past the last entry.
    #[inline]
    #[must_use]
    pub const fn is_end(&self) -> bool {
        self.at.is_end()
    }

    /// The key under the cursor, or `None` at the end position.
    #[must_use]
    pub fn key(&self) -> Option<&'a K> {
        self.tree.entries.get(self.at).map(Entry::key)
    }

    /// The value under the cursor, or `None` at the end position.
    #[must_use]
    pub fn value(&self) -> Option<&'a V> {
        self.tree.entries.get(self.at).map(Entry::value)
    }

    /// The pair under the cursor, or `None` at the end position.
    #[must_use]
    pub fn key_value(&self) -> Option<(&'a K, &'a V)> {
        self.tree.entries.get(self.at).map(Entry::key_value)
    }

    /// Step to the next entry in key order.
    ///
    /// Stepping past the last entry reaches the end position, where further
    /// calls are no-ops.
    pub fn move_next(&mut self) {
        self.at = self.tree.advance(self.at);
    }

    /// Step to the previous entry in key order.
    ///
    /// From the end position this reaches the last entry; at the first
    /// entry it stays put.
    pub fn move_prev(&mut self) {
        self.at = self.tree.retreat(self.at);
    }
}

impl<K, V, const BLOCK_SIZE: usize> Clone for Cursor<'_, K, V, BLOCK_SIZE> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V, const BLOCK_SIZE: usize> Copy for Cursor<'_, K, V, BLOCK_SIZE> {}

impl<K, V, const BLOCK_SIZE: usize> PartialEq for Cursor<'_, K, V, BLOCK_SIZE> {
    /// Cursors are equal when they sit at the same position of the same map.
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.at == other.at
    }
}

impl<K, V, const BLOCK_SIZE: usize> Eq for Cursor<'_, K, V, BLOCK_SIZE> {}

impl<K, V, const BLOCK_SIZE: usize> StdFmt::Debug for Cursor<'_, K, V, BLOCK_SIZE> {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        f.debug_struct("Cursor")
            .field("at_end", &self.is_end())
            .finish()
    }
}

// ============================================================================
//  CursorMut
// ============================================================================

/// An editing position in a [`BpTreeMap`].
///
/// Borrows the map exclusively, so it can change values in place and remove
/// the entry it sits on while walking in either direction.
///
/// # Examples
///
/// ```rust
/// use bptree::BpTreeMap;
///
/// let mut map: BpTreeMap<u32, u32> = (0..6).map(|k| (k, k)).collect();
///
/// // Drop every even key in one pass.
/// let mut cursor = map.cursor_front_mut();
/// while !cursor.is_end() {
///     if cursor.key().is_some_and(|k| k % 2 == 0) {
///         cursor.remove_current();
///     } else {
///         cursor.move_next();
///     }
/// }
///
/// assert_eq!(map.keys().copied().collect::<Vec<u32>>(), vec![1, 3, 5]);
/// ```
pub struct CursorMut<'a, K, V, const BLOCK_SIZE: usize> {
    tree: &'a mut BpTreeMap<K, V, BLOCK_SIZE>,
    at: EntryId,
}

impl<'a, K, V, const BLOCK_SIZE: usize> CursorMut<'a, K, V, BLOCK_SIZE> {
    pub(crate) fn new(tree: &'a mut BpTreeMap<K, V, BLOCK_SIZE>, at: EntryId) -> Self {
        Self { tree, at }
    }

    /// Whether the cursor sits past the last entry.
    #[inline]
    #[must_use]
    pub const fn is_end(&self) -> bool {
        self.at.is_end()
    }

    /// The key under the cursor, or `None` at the end position.
    #[must_use]
    pub fn key(&self) -> Option<&K> {
        self.tree.entries.get(self.at).map(Entry::key)
    }

    /// The value under the cursor, or `None` at the end position.
    #[must_use]
    pub fn value(&self) -> Option<&V> {
        self.tree.entries.get(self.at).map(Entry::value)
    }

    /// Exclusive reference to the value under the cursor.
    ///
    /// Keys stay read-only; editing one could break the ordering.
    #[must_use]
    pub fn value_mut(&mut self) -> Option<&mut V> {
        self.tree.entries.get_mut(self.at).map(Entry::value_mut)
    }

    /// The pair under the cursor, or `None` at the end position.
    #[must_use]
    pub fn key_value(&self) -> Option<(&K, &V)> {
        self.tree.entries.get(self.at).map(Entry::key_value)
    }

    /// Step to the next entry in key order.
    pub fn move_next(&mut self) {
        self.at = self.tree.advance(self.at);
    }

    /// Step to the previous entry in key order.
    pub fn move_prev(&mut self) {
        self.at = self.tree.retreat(self.at);
    }

    /// Remove the entry under the cursor and step to its successor.
    ///
    /// Returns the owned pair, or `None` at the end position.
    pub fn remove_current(&mut self) -> Option<(K, V)> {
        if self.at.is_end() {
            return None;
        }

        let (next, key, value) = self.tree.remove_at(self.at);
        self.at = next;
        Some((key, value))
    }

    /// A read-only cursor at the same position, borrowing this one.
    #[must_use]
    pub fn as_cursor(&self) -> Cursor<'_, K, V, BLOCK_SIZE> {
        Cursor::new(self.tree, self.at)
    }
}

impl<K, V, const BLOCK_SIZE: usize> StdFmt::Debug for CursorMut<'_, K, V, BLOCK_SIZE> {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        f.debug_struct("CursorMut")
            .field("at_end", &self.is_end())
            .finish()
    }
}

// ============================================================================
//  Iterators
// ============================================================================

/// Double-ended iterator over the entries of a [`BpTreeMap`] in key order.
pub struct Iter<'a, K, V, const BLOCK_SIZE: usize> {
    tree: &'a BpTreeMap<K, V, BLOCK_SIZE>,
    front: EntryId,
    back: EntryId,
    remaining: usize,
}

impl<'a, K, V, const BLOCK_SIZE: usize> Iterator for Iter<'a, K, V, BLOCK_SIZE> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let pair = self.tree.entries[self.front].key_value();
        self.front = self.tree.advance(self.front);
        self.remaining -= 1;
        Some(pair)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V, const BLOCK_SIZE: usize> DoubleEndedIterator for Iter<'_, K, V, BLOCK_SIZE> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        // The remaining count stops the ends from crossing, so the clamp
        // retreat performs at the first entry is never observed.
        let pair = self.tree.entries[self.back].key_value();
        self.back = self.tree.retreat(self.back);
        self.remaining -= 1;
        Some(pair)
    }
}

impl<K, V, const BLOCK_SIZE: usize> ExactSizeIterator for Iter<'_, K, V, BLOCK_SIZE> {}

impl<K, V, const BLOCK_SIZE: usize> std::iter::FusedIterator for Iter<'_, K, V, BLOCK_SIZE> {}

impl<K, V, const BLOCK_SIZE: usize> Clone for Iter<'_, K, V, BLOCK_SIZE> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<K, V, const BLOCK_SIZE: usize> StdFmt::Debug for Iter<'_, K, V, BLOCK_SIZE> {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        f.debug_struct("Iter")
            .field("remaining", &self.remaining)
            .finish()
    }
}

/// Iterator over the keys of a [`BpTreeMap`] in order.
pub struct Keys<'a, K, V, const BLOCK_SIZE: usize> {
    inner: Iter<'a, K, V, BLOCK_SIZE>,
}

impl<'a, K, V, const BLOCK_SIZE: usize> Iterator for Keys<'a, K, V, BLOCK_SIZE> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, const BLOCK_SIZE: usize> DoubleEndedIterator for Keys<'_, K, V, BLOCK_SIZE> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(key, _)| key)
    }
}

impl<K, V, const BLOCK_SIZE: usize> ExactSizeIterator for Keys<'_, K, V, BLOCK_SIZE> {}

impl<K, V, const BLOCK_SIZE: usize> std::iter::FusedIterator for Keys<'_, K, V, BLOCK_SIZE> {}

impl<K, V, const BLOCK_SIZE: usize> Clone for Keys<'_, K, V, BLOCK_SIZE> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K, V, const BLOCK_SIZE: usize> StdFmt::Debug for Keys<'_, K, V, BLOCK_SIZE> {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        f.debug_struct("Keys")
            .field("remaining", &self.inner.remaining)
            .finish()
    }
}

/// Iterator over the values of a [`BpTreeMap`] in key order.
pub struct Values<'a, K, V, const BLOCK_SIZE: usize> {
    inner: Iter<'a, K, V, BLOCK_SIZE>,
}

impl<'a, K, V, const BLOCK_SIZE: usize> Iterator for Values<'a, K, V, BLOCK_SIZE> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, const BLOCK_SIZE: usize> DoubleEndedIterator for Values<'_, K, V, BLOCK_SIZE> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, value)| value)
    }
}

impl<K, V, const BLOCK_SIZE: usize> ExactSizeIterator for Values<'_, K, V, BLOCK_SIZE> {}

impl<K, V, const BLOCK_SIZE: usize> std::iter::FusedIterator for Values<'_, K, V, BLOCK_SIZE> {}

impl<K, V, const BLOCK_SIZE: usize> Clone for Values<'_, K, V, BLOCK_SIZE> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K, V, const BLOCK_SIZE: usize> StdFmt::Debug for Values<'_, K, V, BLOCK_SIZE> {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        f.debug_struct("Values")
            .field("remaining", &self.inner.remaining)
            .finish()
    }
}

// ============================================================================
//  Tests
// ============================================================================
