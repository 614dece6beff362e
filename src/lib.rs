//! # hash-trie-set
//!
//! A hash-trie set with O(1) snapshots.
//!
//! Items are placed by successive 4-bit digits of a 32-bit hash. Each node has
//! 16 item slots and up to 16 children; an item lives in a 4-slot probe window
//! starting at its home digit, and a full window is split into a child node.
//! Past the last hash digit, colliding items go to an overflow list.
//!
//! Nodes are reference counted. [`HashTrieSet::clone_freeze`] marks the root
//! read-only and shares it; later mutations through either handle clone only
//! the nodes on the path they touch.
//!
//! ## Example
//!
//! ```rust
//! use hash_trie_set::{DefaultComparer, HashTrieSet};
//!
//! let cmp = DefaultComparer;
//! let mut set = HashTrieSet::new();
//! set.insert("hello", &cmp);
//! set.insert("world", &cmp);
//!
//! let snapshot = set.clone_freeze();
//! set.remove(&"hello", &cmp);
//!
//! assert!(!set.contains(&"hello", &cmp));
//! assert!(snapshot.contains(&"hello", &cmp));
//! assert_eq!(snapshot.count(), 2);
//! ```

mod algebra;
mod comparer;
mod constants;
mod debug;
mod enumerator;
mod error;
mod node;
mod overflow;
mod set;
mod tables;

pub use algebra::KnownCounts;
pub use comparer::{DefaultComparer, HashWith, KeyComparer, TrieComparer};
pub use debug::TrieStats;
pub use enumerator::{Iter, TrieEnumerator};
pub use error::{Result, TrieError};
pub use set::{HashTrieSet, Mode, Outcome};

#[cfg(test)]
mod proptests;
