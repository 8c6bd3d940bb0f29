//! # `BpTree`
//!
//! An in-memory B+ tree ordered map with arena-backed nodes.
//!
//! [`BpTreeMap`] keeps every key/value pair in a leaf and routes lookups
//! through internal nodes that cache the maximum key of each child subtree,
//! so internal nodes carry no separator keys of their own. All nodes and
//! entries live in two index arenas owned by the map: the whole structure
//! is safe Rust with no reference cycles, a deep clone is a slot-for-slot
//! buffer copy, and teardown drops two buffers regardless of tree height.
//!
//! ## Quick Start
//!
//! ```rust
//! use bptree::BpTreeMap;
//!
//! let mut map: BpTreeMap<&str, i32> = BpTreeMap::new();
//! map.insert("b", 2);
//! map.insert("a", 1);
//! map.insert("c", 3);
//!
//! // Keys come back in order.
//! let keys: Vec<&str> = map.keys().copied().collect();
//! assert_eq!(keys, vec!["a", "b", "c"]);
//!
//! // Bound queries return bidirectional cursors.
//! let mut cursor = map.lower_bound("b");
//! assert_eq!(cursor.key_value(), Some((&"b", &2)));
//! cursor.move_prev();
//! assert_eq!(cursor.key(), Some(&"a"));
//! ```
//!
//! ## Behavior
//!
//! | Operation | Notes |
//! |-----------|-------|
//! | `insert` | Never overwrites; a duplicate key keeps the stored value |
//! | `get`, bound queries | `O(log n)`, accept any borrowed form of the key |
//! | cursor step | Parent-link walk, amortized `O(1)` |
//! | `remove`, `remove_range` | Rebalances by sibling borrow or merge |
//! | `clone` | Deep copy preserving the arena layout |
//!
//! ## Design
//!
//! - Descent compares against each child's cached subtree maximum; the two
//!   tie-break rules give lower-bound and upper-bound positioning.
//! - The fan-out is derived from the `BLOCK_SIZE` const parameter and the
//!   key size, clamped to at least two. The root node keeps its identity
//!   through every split and collapse.
//! - There is no linked leaf chain; cursors climb parent links instead.
//!
//! ## Feature Flags
//!
//! - `tracing`: emit structural events (splits, merges, root changes)
//!   through the [`tracing`](https://docs.rs/tracing) crate. Off by
//!   default; the call sites compile to nothing when disabled.

#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod arena;
mod entry;
pub mod error;
mod node;
mod trace;
pub mod tree;

// Re-export main types for convenience
pub use error::{Error, Result};
pub use node::DEFAULT_BLOCK_SIZE;
pub use tree::{BpTreeMap, Cursor, CursorMut, Iter, Keys, Values};
