//! Set algebra and comparison predicates.
//!
//! Mutating operations return how many items they changed: additions for
//! unions, removals for intersections and differences, both for symmetric
//! differences. Both operands must use equivalent comparers.

use std::borrow::Borrow;
use std::sync::Arc;

use crate::comparer::TrieComparer;
use crate::set::HashTrieSet;

/// Sizes the caller already knows, letting predicates short-circuit
/// without paying for an O(n) [`HashTrieSet::count`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KnownCounts {
    pub this: Option<usize>,
    pub other: Option<usize>,
}

impl KnownCounts {
    pub fn new(this: usize, other: usize) -> Self {
        Self {
            this: Some(this),
            other: Some(other),
        }
    }
}

fn same_root<T>(a: &HashTrieSet<T>, b: &HashTrieSet<T>) -> bool {
    match (&a.root, &b.root) {
        (Some(x), Some(y)) => Arc::ptr_eq(x, y),
        (None, None) => true,
        _ => false,
    }
}

impl<T: Clone> HashTrieSet<T> {
    // =========================================================================
    // Mutating operations
    // =========================================================================

    /// Adds every item of `items`. With `replace`, items already present are
    /// overwritten by the incoming ones. Returns the number of new items.
    pub fn union_with<I, C>(&mut self, items: I, comparer: &C, replace: bool) -> usize
    where
        I: IntoIterator<Item = T>,
        C: TrieComparer<T> + ?Sized,
    {
        let mut added = 0;
        for item in items {
            if replace {
                if self.replace(item, comparer).is_none() {
                    added += 1;
                }
            } else if self.insert(item, comparer) {
                added += 1;
            }
        }
        added
    }

    /// [`union_with`](Self::union_with) against another set. Into an empty
    /// set this shares `other`'s nodes instead of copying them.
    pub fn union_with_set<C>(&mut self, other: &HashTrieSet<T>, comparer: &C, replace: bool) -> usize
    where
        C: TrieComparer<T> + ?Sized,
    {
        if same_root(self, other) {
            return 0;
        }
        if self.is_empty() {
            *self = other.clone_freeze();
            return self.count();
        }
        self.union_with(other.iter().cloned(), comparer, replace)
    }

    /// Keeps only items also found in `items`. Returns the number removed.
    pub fn intersect_with<I, C>(&mut self, items: I, comparer: &C) -> usize
    where
        I: IntoIterator,
        I::Item: Borrow<T>,
        C: TrieComparer<T> + ?Sized,
    {
        if self.is_empty() {
            return 0;
        }
        let mut keep = HashTrieSet::new();
        for item in items {
            if let Some(stored) = self.find(item.borrow(), comparer) {
                if !keep.contains(stored, comparer) {
                    let stored = stored.clone();
                    keep.insert(stored, comparer);
                }
            }
        }
        self.intersect_with_set(&keep, comparer)
    }

    /// Keeps only items also in `other`. Returns the number removed.
    pub fn intersect_with_set<C>(&mut self, other: &HashTrieSet<T>, comparer: &C) -> usize
    where
        C: TrieComparer<T> + ?Sized,
    {
        if same_root(self, other) {
            return 0;
        }
        if other.is_empty() {
            let removed = self.count();
            self.clear();
            return removed;
        }
        let mut removed = 0;
        let mut e = self.enumerator();
        while e.move_next() {
            let keep = e.current().map_or(true, |x| other.contains(x, comparer));
            if !keep && e.remove_current().is_ok() {
                removed += 1;
            }
        }
        removed
    }

    /// Removes every item found in `items`. Returns the number removed.
    pub fn except_with<I, C>(&mut self, items: I, comparer: &C) -> usize
    where
        I: IntoIterator,
        I::Item: Borrow<T>,
        C: TrieComparer<T> + ?Sized,
    {
        let mut removed = 0;
        for item in items {
            if self.is_empty() {
                break;
            }
            if self.remove(item.borrow(), comparer).is_some() {
                removed += 1;
            }
        }
        removed
    }

    /// Removes every item of `other`. Returns the number removed.
    pub fn except_with_set<C>(&mut self, other: &HashTrieSet<T>, comparer: &C) -> usize
    where
        C: TrieComparer<T> + ?Sized,
    {
        if same_root(self, other) {
            let removed = self.count();
            self.clear();
            return removed;
        }
        self.except_with(other.iter(), comparer)
    }

    /// Toggles membership of every distinct item in `items`. Returns the
    /// number of items added plus the number removed.
    pub fn symmetric_except_with<I, C>(&mut self, items: I, comparer: &C) -> usize
    where
        I: IntoIterator<Item = T>,
        C: TrieComparer<T> + ?Sized,
    {
        let other = HashTrieSet::from_iter_with(items, comparer);
        self.symmetric_except_with_set(&other, comparer)
    }

    /// Toggles membership of every item of `other`.
    pub fn symmetric_except_with_set<C>(&mut self, other: &HashTrieSet<T>, comparer: &C) -> usize
    where
        C: TrieComparer<T> + ?Sized,
    {
        if same_root(self, other) {
            let removed = self.count();
            self.clear();
            return removed;
        }
        let mut changed = 0;
        for item in other {
            if self.remove(item, comparer).is_none() {
                self.insert(item.clone(), comparer);
            }
            changed += 1;
        }
        changed
    }
}

impl<T> HashTrieSet<T> {
    // =========================================================================
    // Predicates
    // =========================================================================

    fn contained_in<C>(&self, other: &HashTrieSet<T>, comparer: &C) -> bool
    where
        C: TrieComparer<T> + ?Sized,
    {
        self.iter().all(|x| other.contains(x, comparer))
    }

    pub fn is_subset_of<C>(&self, other: &HashTrieSet<T>, comparer: &C, counts: KnownCounts) -> bool
    where
        C: TrieComparer<T> + ?Sized,
    {
        if same_root(self, other) {
            return true;
        }
        if let (Some(a), Some(b)) = (counts.this, counts.other) {
            if a > b {
                return false;
            }
        }
        self.contained_in(other, comparer)
    }

    pub fn is_superset_of<C>(&self, other: &HashTrieSet<T>, comparer: &C, counts: KnownCounts) -> bool
    where
        C: TrieComparer<T> + ?Sized,
    {
        let flipped = KnownCounts {
            this: counts.other,
            other: counts.this,
        };
        other.is_subset_of(self, comparer, flipped)
    }

    pub fn is_proper_subset_of<C>(&self, other: &HashTrieSet<T>, comparer: &C, counts: KnownCounts) -> bool
    where
        C: TrieComparer<T> + ?Sized,
    {
        if same_root(self, other) {
            return false;
        }
        let a = counts.this.unwrap_or_else(|| self.count());
        let b = counts.other.unwrap_or_else(|| other.count());
        a < b && self.contained_in(other, comparer)
    }

    pub fn is_proper_superset_of<C>(&self, other: &HashTrieSet<T>, comparer: &C, counts: KnownCounts) -> bool
    where
        C: TrieComparer<T> + ?Sized,
    {
        let flipped = KnownCounts {
            this: counts.other,
            other: counts.this,
        };
        other.is_proper_subset_of(self, comparer, flipped)
    }

    /// Same members, by `comparer`.
    pub fn set_equals<C>(&self, other: &HashTrieSet<T>, comparer: &C, counts: KnownCounts) -> bool
    where
        C: TrieComparer<T> + ?Sized,
    {
        if same_root(self, other) {
            return true;
        }
        let a = counts.this.unwrap_or_else(|| self.count());
        let b = counts.other.unwrap_or_else(|| other.count());
        a == b && self.contained_in(other, comparer)
    }

    /// Whether the two sets share any item.
    pub fn overlaps<C>(&self, other: &HashTrieSet<T>, comparer: &C, counts: KnownCounts) -> bool
    where
        C: TrieComparer<T> + ?Sized,
    {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        if same_root(self, other) {
            return true;
        }
        // Walk the smaller side when both sizes are known.
        match (counts.this, counts.other) {
            (Some(a), Some(b)) if b < a => other.iter().any(|x| self.contains(x, comparer)),
            _ => self.iter().any(|x| other.contains(x, comparer)),
        }
    }

    pub fn overlaps_iter<I, C>(&self, items: I, comparer: &C) -> bool
    where
        I: IntoIterator,
        I::Item: Borrow<T>,
        C: TrieComparer<T> + ?Sized,
    {
        !self.is_empty() && items.into_iter().any(|x| self.contains(x.borrow(), comparer))
    }

    /// Whether every item of `items` is in this set.
    pub fn is_superset_of_iter<I, C>(&self, items: I, comparer: &C) -> bool
    where
        I: IntoIterator,
        I::Item: Borrow<T>,
        C: TrieComparer<T> + ?Sized,
    {
        items.into_iter().all(|x| self.contains(x.borrow(), comparer))
    }
}
