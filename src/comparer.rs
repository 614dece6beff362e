//! Hashing and equality used to place and find items.
//!
//! Every operation takes its comparer explicitly. The trie never stores one,
//! so callers must pass the same comparer (or an equivalent one) on every
//! call against a given set.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

/// Hash and equality for items of type `T`.
///
/// Items that compare equal must produce the same hash code.
pub trait TrieComparer<T: ?Sized> {
    /// 32-bit hash; the trie consumes it 4 bits per level, low bits first.
    fn hash_code(&self, item: &T) -> u32;

    /// Whether `a` and `b` denote the same set member.
    fn equals(&self, a: &T, b: &T) -> bool;
}

impl<T: ?Sized, C: TrieComparer<T> + ?Sized> TrieComparer<T> for &C {
    #[inline]
    fn hash_code(&self, item: &T) -> u32 {
        (**self).hash_code(item)
    }

    #[inline]
    fn equals(&self, a: &T, b: &T) -> bool {
        (**self).equals(a, b)
    }
}

#[inline]
fn fold_hash(h: u64) -> u32 {
    (h ^ (h >> 32)) as u32
}

/// `Hash + Eq` comparer. Hashing is deterministic across runs (FxHash).
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultComparer;

impl<T: Hash + Eq + ?Sized> TrieComparer<T> for DefaultComparer {
    #[inline]
    fn hash_code(&self, item: &T) -> u32 {
        let mut hasher = FxHasher::default();
        item.hash(&mut hasher);
        fold_hash(hasher.finish())
    }

    #[inline]
    fn equals(&self, a: &T, b: &T) -> bool {
        a == b
    }
}

/// Caller-supplied hash function with `Eq` equality.
///
/// ```rust
/// use hash_trie_set::{HashTrieSet, HashWith};
///
/// // Every item lands in one of 16 home slots at the root.
/// let cmp = HashWith(|x: &u32| *x % 16);
/// let mut set = HashTrieSet::new();
/// for i in 0..100u32 {
///     set.insert(i, &cmp);
/// }
/// assert_eq!(set.count(), 100);
/// ```
#[derive(Clone, Copy)]
pub struct HashWith<F>(pub F);

impl<T: Eq + ?Sized, F: Fn(&T) -> u32> TrieComparer<T> for HashWith<F> {
    #[inline]
    fn hash_code(&self, item: &T) -> u32 {
        (self.0)(item)
    }

    #[inline]
    fn equals(&self, a: &T, b: &T) -> bool {
        a == b
    }
}

impl<F> std::fmt::Debug for HashWith<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("HashWith(..)")
    }
}

/// Compares `(key, value)` pairs by key alone, so a set of pairs acts as a
/// map.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyComparer<C>(pub C);

impl<K, V, C: TrieComparer<K>> TrieComparer<(K, V)> for KeyComparer<C> {
    #[inline]
    fn hash_code(&self, item: &(K, V)) -> u32 {
        self.0.hash_code(&item.0)
    }

    #[inline]
    fn equals(&self, a: &(K, V), b: &(K, V)) -> bool {
        self.0.equals(&a.0, &b.0)
    }
}
