//! Descent and position queries.
//!
//! Every search walks root-to-leaf choosing children by their cached
//! maximum keys. The two [`Seek`] modes differ only in how a child whose
//! maximum equals the probe key is treated, which is what separates
//! lower-bound from upper-bound descent.

use std::borrow::Borrow;

use super::BpTreeMap;
use crate::entry::EntryId;
use crate::node::NodeId;

/// Tie-break rule for routing past a child whose maximum equals the key.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Seek {
    /// Stop at the first child whose maximum is `>=` the key. The reached
    /// leaf holds the key if it is present anywhere.
    LowerBound,

    /// Stop at the first child whose maximum is `>` the key, skipping an
    /// exact match. The reached leaf holds the first entry after the key.
    UpperBound,
}

impl<K, V, const BLOCK_SIZE: usize> BpTreeMap<K, V, BLOCK_SIZE> {
    /// Walk from the root to the leaf selected by `seek` for `key`.
    ///
    /// When every child maximum falls before the key, descent clamps to the
    /// last child, so the reached leaf is where an entry past the current
    /// maximum would be appended.
    pub(crate) fn descend<Q>(&self, key: &Q, seek: Seek) -> NodeId
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut node = self.root;

        while !self.nodes[node].is_leaf() {
            let ids = self.nodes[node].child_ids();
            let pos = ids.partition_point(|&child| match seek {
                Seek::LowerBound => self.max_key_of(child).borrow() < key,
                Seek::UpperBound => self.max_key_of(child).borrow() <= key,
            });

            node = ids[pos.min(ids.len() - 1)];
        }

        node
    }

    /// The key under `node`'s cached maximum.
    fn max_key_of(&self, node: NodeId) -> &K {
        match self.nodes[node].max() {
            Some(entry) => self.entries[entry].key(),
            None => panic!("internal child missing cached maximum"),
        }
    }

    /// Position in `leaf` of the first entry with key `>= key`.
    pub(crate) fn leaf_lower_bound_pos<Q>(&self, leaf: NodeId, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.nodes[leaf]
            .entry_ids()
            .partition_point(|&id| self.entries[id].key().borrow() < key)
    }

    /// Position in `leaf` of the first entry with key `> key`.
    pub(crate) fn leaf_upper_bound_pos<Q>(&self, leaf: NodeId, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.nodes[leaf]
            .entry_ids()
            .partition_point(|&id| self.entries[id].key().borrow() <= key)
    }

    /// The entry holding exactly `key`, if present.
    pub(crate) fn locate<Q>(&self, key: &Q) -> Option<EntryId>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let leaf = self.descend(key, Seek::LowerBound);
        let pos = self.leaf_lower_bound_pos(leaf, key);
        let id = *self.nodes[leaf].entry_ids().get(pos)?;

        (self.entries[id].key().borrow() == key).then_some(id)
    }

    /// The first entry with key `>= key`, or the end sentinel.
    pub(crate) fn lower_bound_id<Q>(&self, key: &Q) -> EntryId
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let leaf = self.descend(key, Seek::LowerBound);
        let pos = self.leaf_lower_bound_pos(leaf, key);

        self.nodes[leaf]
            .entry_ids()
            .get(pos)
            .copied()
            .unwrap_or(EntryId::END)
    }

    /// The first entry with key `> key`, or the end sentinel.
    pub(crate) fn upper_bound_id<Q>(&self, key: &Q) -> EntryId
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let leaf = self.descend(key, Seek::UpperBound);
        let pos = self.leaf_upper_bound_pos(leaf, key);

        self.nodes[leaf]
            .entry_ids()
            .get(pos)
            .copied()
            .unwrap_or(EntryId::END)
    }
}

// ============================================================================
//  Tests
// ============================================================================
