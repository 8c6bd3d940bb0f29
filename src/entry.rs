//! Map entries and their arena ids.
//!
//! An [`Entry`] owns one key/value pair and remembers which leaf currently
//! holds it. The back-link is what lets a cursor step from an entry to its
//! neighbors without an auxiliary linked list of leaves.

use crate::arena::ArenaIndex;
use crate::node::NodeId;

/// Stable index of an [`Entry`] in the tree's entry arena.
///
/// [`EntryId::END`] is reserved and never allocated. It serves as the
/// end-of-map cursor position and as the "no first entry" marker of an empty
/// map; it never appears inside a leaf's entry list.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub(crate) struct EntryId(u32);

impl EntryId {
    /// The reserved end sentinel.
    pub(crate) const END: Self = Self(u32::MAX);

    /// Whether this id is the end sentinel.
    #[inline]
    #[must_use]
    pub(crate) const fn is_end(self) -> bool {
        self.0 == u32::MAX
    }
}

impl ArenaIndex for EntryId {
    #[inline]
    fn from_usize(raw: usize) -> Self {
        // u32::MAX stays reserved for END.
        assert!(raw < u32::MAX as usize, "entry arena capacity exceeded");
        Self(raw as u32)
    }

    #[inline]
    fn to_usize(self) -> usize {
        self.0 as usize
    }
}

/// One key/value pair plus the leaf that currently links it.
#[derive(Clone, Debug)]
pub(crate) struct Entry<K, V> {
    /// The key. Immutable for the life of the entry.
    key: K,

    /// The mapped value.
    value: V,

    /// The leaf whose entry list contains this entry's id.
    ///
    /// Updated whenever rebalancing moves the entry between leaves.
    leaf: NodeId,
}

impl<K, V> Entry<K, V> {
    /// Create an entry linked under `leaf`.
    #[inline]
    pub(crate) const fn new(key: K, value: V, leaf: NodeId) -> Self {
        Self { key, value, leaf }
    }

    /// The key.
    #[inline]
    #[must_use]
    pub(crate) const fn key(&self) -> &K {
        &self.key
    }

    /// The value.
    #[inline]
    #[must_use]
    pub(crate) const fn value(&self) -> &V {
        &self.value
    }

    /// Exclusive access to the value.
    #[inline]
    pub(crate) const fn value_mut(&mut self) -> &mut V {
        &mut self.value
    }

    /// Both halves of the pair.
    #[inline]
    #[must_use]
    pub(crate) const fn key_value(&self) -> (&K, &V) {
        (&self.key, &self.value)
    }

    /// Consume the entry, yielding the owned pair.
    #[inline]
    pub(crate) fn into_key_value(self) -> (K, V) {
        (self.key, self.value)
    }

    /// The leaf currently holding this entry.
    #[inline]
    #[must_use]
    pub(crate) const fn leaf(&self) -> NodeId {
        self.leaf
    }

    /// Re-link the entry under a different leaf.
    #[inline]
    pub(crate) fn set_leaf(&mut self, leaf: NodeId) {
        self.leaf = leaf;
    }
}

// ============================================================================
//  Tests
// ============================================================================
