//! Slot arenas with stable typed indices.
//!
//! The tree owns all of its memory through two arenas (one for nodes, one for
//! entries) instead of a web of owning pointers. An [`Arena`] is a slab of
//! slots addressed by a `u32` newtype index: live slots hold a value, freed
//! slots are threaded onto an intrusive free list and reused by later
//! allocations. An index handed out for a live slot stays valid until that
//! exact slot is removed, no matter how many unrelated slots come and go.
//!
//! Teardown is what a `Vec` drop is: iterative, no recursion over the tree
//! shape. Cloning an arena clones it slot for slot, so every index valid in
//! the source names the corresponding value in the copy.
//!
//! Indexing a vacant slot panics. That is deliberate: a cursor that survived
//! the removal of its entry resolves to a vacant (or recycled) slot, and a
//! panic is the memory-safe rendition of that precondition violation.

use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

use crate::trace::trace_log;

/// Index newtype usable as an [`Arena`] address.
///
/// Implementations convert to and from the raw slot position. `from_usize`
/// must panic if the position cannot be represented (the arena relies on this
/// to keep reserved sentinel values unallocated).
pub(crate) trait ArenaIndex: Copy + Eq {
    /// Wrap a raw slot position.
    fn from_usize(raw: usize) -> Self;

    /// Unwrap to the raw slot position.
    fn to_usize(self) -> usize;
}

/// One arena slot: a live value or a link in the free list.
#[derive(Clone, Debug)]
enum Slot<T> {
    /// The slot holds a live value.
    Occupied(T),

    /// The slot is free; `next_free` chains to the next free slot, if any.
    Vacant { next_free: Option<u32> },
}

/// A slab of typed slots with stable indices and slot reuse.
#[derive(Clone, Debug)]
pub(crate) struct Arena<I, T> {
    /// Backing storage. A slot's position in this vector is its index.
    slots: Vec<Slot<T>>,

    /// Head of the intrusive free list (most recently freed slot).
    free_head: Option<u32>,

    /// Number of occupied slots.
    len: usize,

    /// Ties the arena to its index newtype.
    _marker: PhantomData<I>,
}

impl<I: ArenaIndex, T> Arena<I, T> {
    /// Create an empty arena.
    #[must_use]
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            len: 0,
            _marker: PhantomData,
        }
    }

    /// Number of live values.
    #[inline]
    #[must_use]
    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    /// Store `value`, reusing the most recently freed slot when one exists.
    pub(crate) fn insert(&mut self, value: T) -> I {
        if let Some(free) = self.free_head {
            let at = free as usize;
            let next_free = match &self.slots[at] {
                Slot::Vacant { next_free } => *next_free,
                Slot::Occupied(_) => unreachable!("free list points at an occupied slot"),
            };

            self.free_head = next_free;
            self.slots[at] = Slot::Occupied(value);
            self.len += 1;

            trace_log!(slot = at, reused = true, "arena insert");
            return I::from_usize(at);
        }

        let at = self.slots.len();
        // from_usize panics before the push if `at` is unrepresentable, so a
        // reserved sentinel index can never become occupied.
        let index = I::from_usize(at);
        self.slots.push(Slot::Occupied(value));
        self.len += 1;

        trace_log!(slot = at, reused = false, "arena insert");
        index
    }

    /// Remove and return the value at `index`, freeing its slot for reuse.
    ///
    /// # Panics
    ///
    /// Panics if the slot is vacant.
    pub(crate) fn remove(&mut self, index: I) -> T {
        let at = index.to_usize();
        let taken = std::mem::replace(
            &mut self.slots[at],
            Slot::Vacant {
                next_free: self.free_head,
            },
        );

        match taken {
            Slot::Occupied(value) => {
                self.free_head = Some(at as u32);
                self.len -= 1;

                trace_log!(slot = at, "arena remove");
                value
            }
            vacant => {
                self.slots[at] = vacant;
                panic!("access to vacant arena slot {at}")
            }
        }
    }

    /// Shared access, `None` for vacant or out-of-range slots.
    #[inline]
    #[must_use]
    pub(crate) fn get(&self, index: I) -> Option<&T> {
        match self.slots.get(index.to_usize()) {
            Some(Slot::Occupied(value)) => Some(value),
            _ => None,
        }
    }

    /// Exclusive access, `None` for vacant or out-of-range slots.
    #[inline]
    #[must_use]
    pub(crate) fn get_mut(&mut self, index: I) -> Option<&mut T> {
        match self.slots.get_mut(index.to_usize()) {
            Some(Slot::Occupied(value)) => Some(value),
            _ => None,
        }
    }

    /// Drop every value and reset the free list.
    ///
    /// Runs in time linear in the slot count, with no per-value tree walk.
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free_head = None;
        self.len = 0;
    }
}

impl<I: ArenaIndex, T> Default for Arena<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: ArenaIndex, T> Index<I> for Arena<I, T> {
    type Output = T;

    /// # Panics
    ///
    /// Panics if the slot is vacant or out of range.
    #[inline]
    fn index(&self, index: I) -> &T {
        match self.slots.get(index.to_usize()) {
            Some(Slot::Occupied(value)) => value,
            _ => panic!("access to vacant arena slot {}", index.to_usize()),
        }
    }
}

impl<I: ArenaIndex, T> IndexMut<I> for Arena<I, T> {
    /// # Panics
    ///
    /// Panics if the slot is vacant or out of range.
    #[inline]
    fn index_mut(&mut self, index: I) -> &mut T {
        match self.slots.get_mut(index.to_usize()) {
            Some(Slot::Occupied(value)) => value,
            _ => panic!("access to vacant arena slot {}", index.to_usize()),
        }
    }
}

// ============================================================================
//  Tests
// ============================================================================
