//! Filepath: src/node.rs
//!
//! Tree nodes and fan-out derivation.
//!
//! A [`Node`] is either a leaf (an ordered list of entry ids) or an internal
//! node (an ordered list of child node ids). Every node caches the id of the
//! maximum entry of its subtree; descent routes by comparing the search key
//! against those cached maxima, so internal nodes carry no separator keys of
//! their own.
//!
//! # Routing model
//!
//! ```text
//!            [ max=e9 ]                  <- internal, 2 children
//!           /          \
//!   [ max=e4 ]        [ max=e9 ]         <- leaves
//!    e1 e2 e4          e6 e7 e9
//! ```
//!
//! To find key `k`, enter the first child whose cached maximum is `>= k`
//! (`> k` for upper-bound descent) and fall into the last child when none
//! qualifies.
//!
//! # Fan-out
//!
//! The branching bound `C` is derived from a nominal block size, as if the
//! node were laid out in a fixed-size block: subtract the bookkeeping header,
//! divide by the per-child footprint of one key plus one pointer. Nodes hold
//! at most `2C` children; non-root nodes at least `C`.

use std::mem::size_of;

use crate::arena::ArenaIndex;
use crate::entry::EntryId;

/// Default nominal block size the fan-out is derived from.
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// Stable index of a [`Node`] in the tree's node arena.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub(crate) struct NodeId(u32);

impl ArenaIndex for NodeId {
    #[inline]
    fn from_usize(raw: usize) -> Self {
        assert!(raw < u32::MAX as usize, "node arena capacity exceeded");
        Self(raw as u32)
    }

    #[inline]
    fn to_usize(self) -> usize {
        self.0 as usize
    }
}

/// Derive the branching bound `C` for key type `K` from a block size.
///
/// Mirrors a block layout of one size header and one pointer, then one key
/// and one pointer per child: `(block - header) / (key + pointer)`. Clamped
/// to 2 so that degenerate block sizes (or enormous keys) still produce a
/// working tree.
#[must_use]
pub(crate) fn branch_factor<K>(block_size: usize) -> usize {
    let header = size_of::<usize>() + size_of::<*const u8>();
    let per_child = size_of::<K>() + size_of::<*const u8>();

    (block_size.saturating_sub(header) / per_child).max(2)
}

/// Ordered children of a node: entry ids in a leaf, node ids otherwise.
///
/// Siblings always have the same kind; the kind-mixing arms below are
/// structurally unreachable.
#[derive(Clone, Debug)]
pub(crate) enum Children {
    /// Leaf level: entries sorted by key, no duplicates.
    Leaf(Vec<EntryId>),

    /// Internal level: children sorted by their subtree key ranges.
    Internal(Vec<NodeId>),
}

impl Children {
    /// Number of children.
    #[inline]
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        match self {
            Self::Leaf(ids) => ids.len(),
            Self::Internal(ids) => ids.len(),
        }
    }

    /// Split off the tail `[at..]`, keeping `[..at]` in place.
    pub(crate) fn split_off(&mut self, at: usize) -> Self {
        match self {
            Self::Leaf(ids) => Self::Leaf(ids.split_off(at)),
            Self::Internal(ids) => Self::Internal(ids.split_off(at)),
        }
    }

    /// Append `tail` after the existing children.
    pub(crate) fn append(&mut self, tail: Self) {
        match (self, tail) {
            (Self::Leaf(ids), Self::Leaf(mut more)) => ids.append(&mut more),
            (Self::Internal(ids), Self::Internal(mut more)) => ids.append(&mut more),
            _ => unreachable!("sibling node kinds differ"),
        }
    }

    /// Insert `head` before the existing children.
    pub(crate) fn prepend(&mut self, head: Self) {
        match (self, head) {
            (Self::Leaf(ids), Self::Leaf(mut front)) => {
                front.append(ids);
                *ids = front;
            }
            (Self::Internal(ids), Self::Internal(mut front)) => {
                front.append(ids);
                *ids = front;
            }
            _ => unreachable!("sibling node kinds differ"),
        }
    }
}

/// One tree node.
///
/// # Invariants
///
/// - `max` names the maximum entry of this node's subtree; it is `None` only
///   for an empty root leaf.
/// - `parent` is `None` only for the root.
/// - A leaf's entry ids are strictly sorted by key; an internal node's
///   children are sorted by their subtree ranges.
#[derive(Clone, Debug)]
pub(crate) struct Node {
    /// The node whose child list contains this node; `None` for the root.
    parent: Option<NodeId>,

    /// Cached maximum entry of this subtree.
    max: Option<EntryId>,

    /// Ordered children.
    children: Children,
}

impl Node {
    /// Create an empty, detached leaf.
    #[must_use]
    pub(crate) const fn leaf() -> Self {
        Self {
            parent: None,
            max: None,
            children: Children::Leaf(Vec::new()),
        }
    }

    /// Create a detached node around existing children.
    ///
    /// The caller re-links the children's back-references and refreshes the
    /// cached maximum afterwards.
    #[must_use]
    pub(crate) const fn with_children(children: Children) -> Self {
        Self {
            parent: None,
            max: None,
            children,
        }
    }

    /// Whether this node is a leaf.
    #[inline]
    #[must_use]
    pub(crate) const fn is_leaf(&self) -> bool {
        matches!(self.children, Children::Leaf(_))
    }

    /// Number of children (entries for a leaf).
    #[inline]
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.children.len()
    }

    /// The parent node, `None` for the root.
    #[inline]
    #[must_use]
    pub(crate) const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Re-link the parent back-reference.
    #[inline]
    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    /// Cached maximum entry of this subtree.
    #[inline]
    #[must_use]
    pub(crate) const fn max(&self) -> Option<EntryId> {
        self.max
    }

    /// Replace the cached maximum.
    #[inline]
    pub(crate) fn set_max(&mut self, max: Option<EntryId>) {
        self.max = max;
    }

    /// Shared view of the children.
    #[inline]
    #[must_use]
    pub(crate) const fn children(&self) -> &Children {
        &self.children
    }

    /// Exclusive view of the children.
    #[inline]
    pub(crate) const fn children_mut(&mut self) -> &mut Children {
        &mut self.children
    }

    /// Take the children out, leaving an empty list of the same kind.
    pub(crate) fn take_children(&mut self) -> Children {
        let empty = match &self.children {
            Children::Leaf(_) => Children::Leaf(Vec::new()),
            Children::Internal(_) => Children::Internal(Vec::new()),
        };

        std::mem::replace(&mut self.children, empty)
    }

    /// Replace the children wholesale, possibly changing the node's kind.
    ///
    /// Used when the root absorbs or hands off its contents.
    #[inline]
    pub(crate) fn replace_children(&mut self, children: Children) {
        self.children = children;
    }

    /// Entry ids of a leaf.
    ///
    /// # Panics
    ///
    /// Panics if the node is internal.
    #[inline]
    #[must_use]
    pub(crate) fn entry_ids(&self) -> &[EntryId] {
        match &self.children {
            Children::Leaf(ids) => ids,
            Children::Internal(_) => panic!("expected a leaf node"),
        }
    }

    /// Exclusive entry list of a leaf.
    ///
    /// # Panics
    ///
    /// Panics if the node is internal.
    #[inline]
    pub(crate) fn entry_ids_mut(&mut self) -> &mut Vec<EntryId> {
        match &mut self.children {
            Children::Leaf(ids) => ids,
            Children::Internal(_) => panic!("expected a leaf node"),
        }
    }

    /// Child ids of an internal node.
    ///
    /// # Panics
    ///
    /// Panics if the node is a leaf.
    #[inline]
    #[must_use]
    pub(crate) fn child_ids(&self) -> &[NodeId] {
        match &self.children {
            Children::Internal(ids) => ids,
            Children::Leaf(_) => panic!("expected an internal node"),
        }
    }

    /// Exclusive child list of an internal node.
    ///
    /// # Panics
    ///
    /// Panics if the node is a leaf.
    #[inline]
    pub(crate) fn child_ids_mut(&mut self) -> &mut Vec<NodeId> {
        match &mut self.children {
            Children::Internal(ids) => ids,
            Children::Leaf(_) => panic!("expected an internal node"),
        }
    }

    /// Position of `entry` in this leaf's list, if linked here.
    #[inline]
    #[must_use]
    pub(crate) fn position_of_entry(&self, entry: EntryId) -> Option<usize> {
        self.entry_ids().iter().position(|&id| id == entry)
    }

    /// Position of `child` in this internal node's list, if linked here.
    #[inline]
    #[must_use]
    pub(crate) fn position_of_child(&self, child: NodeId) -> Option<usize> {
        self.child_ids().iter().position(|&id| id == child)
    }
}

// ============================================================================
//  Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_children(raw: &[usize]) -> Children {
        Children::Leaf(raw.iter().map(|&r| EntryId::from_usize(r)).collect())
    }

    #[test]
    fn test_branch_factor_formula() {
        // 64-bit layout: (4096 - 16) / (8 + 8).
        assert_eq!(branch_factor::<u64>(4096), 255);

        // Small block chosen so fan-out drops to the minimum useful width.
        assert_eq!(branch_factor::<u64>(48), 2);
    }

    #[test]
    fn test_branch_factor_clamps_to_two() {
        assert_eq!(branch_factor::<[u8; 4096]>(64), 2);
        assert_eq!(branch_factor::<u64>(0), 2);
    }

    #[test]
    fn test_split_off_keeps_prefix() {
        let mut children = entry_children(&[0, 1, 2, 3]);
        let tail = children.split_off(2);

        assert_eq!(children.len(), 2);
        assert_eq!(tail.len(), 2);

        children.append(tail);
        assert_eq!(children.len(), 4);
    }

    #[test]
    fn test_prepend_puts_head_first() {
        let mut children = entry_children(&[2, 3]);
        children.prepend(entry_children(&[0, 1]));

        match children {
            Children::Leaf(ids) => {
                let raw: Vec<usize> = ids.iter().map(|id| id.to_usize()).collect();
                assert_eq!(raw, vec![0, 1, 2, 3]);
            }
            Children::Internal(_) => panic!("kind changed"),
        }
    }

    #[test]
    fn test_take_children_preserves_kind() {
        let mut node = Node::with_children(entry_children(&[0, 1]));
        let taken = node.take_children();

        assert_eq!(taken.len(), 2);
        assert_eq!(node.len(), 0);
        assert!(node.is_leaf());
    }

    #[test]
    fn test_positions() {
        let node = Node::with_children(entry_children(&[5, 9, 11]));

        assert_eq!(node.position_of_entry(EntryId::from_usize(9)), Some(1));
        assert_eq!(node.position_of_entry(EntryId::from_usize(4)), None);
    }

    #[test]
    #[should_panic(expected = "expected an internal node")]
    fn test_child_ids_on_leaf_panics() {
        let node = Node::leaf();
        let _ = node.child_ids();
    }
}
