//! Explicit-stack traversal.
//!
//! Both walkers visit a node's 16 slots in order, then its overflow list (at
//! maximum depth) or its children in index order, depth-first. Positions
//! within a node share one index space: `0..16` are slots, `16 + j` is
//! overflow item `j` or child `j`. The two never coexist in one node.

use std::sync::Arc;

use crate::comparer::TrieComparer;
use crate::constants::{BITS_PER_LEVEL, DIGIT_MASK, FANOUT};
use crate::error::{Result, TrieError};
use crate::node::Node;
use crate::set::{update_at, HashTrieSet, Tidy};

#[inline]
fn path_digit(path: u32, level: usize) -> usize {
    ((path >> (level as u32 * BITS_PER_LEVEL)) & DIGIT_MASK) as usize
}

#[inline]
fn with_path_digit(path: u32, level: usize, d: usize) -> u32 {
    let shift = level as u32 * BITS_PER_LEVEL;
    (path & !(DIGIT_MASK << shift)) | ((d as u32) << shift)
}

// =============================================================================
// Iter
// =============================================================================

/// Borrowing iterator over a [`HashTrieSet`].
pub struct Iter<'a, T> {
    stack: Vec<(&'a Node<T>, usize)>,
}

impl<'a, T> Iter<'a, T> {
    pub(crate) fn new(set: &'a HashTrieSet<T>) -> Self {
        let mut stack = Vec::with_capacity(8);
        if let Some(root) = set.root.as_deref() {
            stack.push((root, 0));
        }
        Self { stack }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (node, pos) = self.stack.last_mut()?;
            let node: &'a Node<T> = *node;
            let p = *pos;
            *pos += 1;

            if p < FANOUT {
                if let Some(item) = node.item(p) {
                    return Some(item);
                }
                continue;
            }

            let j = p - FANOUT;
            if node.is_max_depth() {
                match node.overflow_item(j) {
                    Some(item) => return Some(item),
                    None => {
                        self.stack.pop();
                    }
                }
            } else {
                match node.next_child(j) {
                    Some((d, child)) => {
                        if let Some((_, pos)) = self.stack.last_mut() {
                            *pos = FANOUT + d + 1;
                        }
                        self.stack.push((&**child, 0));
                    }
                    None => {
                        self.stack.pop();
                    }
                }
            }
        }
    }
}

// =============================================================================
// TrieEnumerator
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    NotStarted,
    Scanning,
    Exhausted,
}

/// Walks a set and can remove or update the item it is positioned on.
///
/// The enumerator holds the set's unique borrow, so nothing else can mutate
/// the set while it is live. [`remove_current`] and [`set_current_value`]
/// thaw the path from the root to the current node, re-splicing clones of
/// frozen nodes, and traversal continues as if nothing moved. Removal never
/// rearranges slots, so no item is skipped or visited twice.
///
/// ```rust
/// use hash_trie_set::{DefaultComparer, HashTrieSet};
///
/// let mut set = HashTrieSet::from_iter_with(0..100u32, &DefaultComparer);
/// let mut e = set.enumerator();
/// while e.move_next() {
///     if e.current().map_or(false, |x| x % 2 == 1) {
///         e.remove_current().unwrap();
///     }
/// }
/// drop(e);
/// assert_eq!(set.count(), 50);
/// ```
///
/// [`remove_current`]: TrieEnumerator::remove_current
/// [`set_current_value`]: TrieEnumerator::set_current_value
pub struct TrieEnumerator<'a, T> {
    set: &'a mut HashTrieSet<T>,
    current: Option<Arc<Node<T>>>,
    /// Ancestors of `current`, root first.
    stack: Vec<Arc<Node<T>>>,
    /// Child index taken at each stack level, 4 bits per level.
    path: u32,
    /// Next position to examine in `current`.
    next: usize,
    state: State,
    on_item: bool,
}

impl<'a, T> TrieEnumerator<'a, T> {
    pub(crate) fn new(set: &'a mut HashTrieSet<T>) -> Self {
        Self {
            set,
            current: None,
            stack: Vec::with_capacity(8),
            path: 0,
            next: 0,
            state: State::NotStarted,
            on_item: false,
        }
    }

    /// Rebinds to `set` and starts over.
    pub fn reset(&mut self, set: &'a mut HashTrieSet<T>) {
        self.set = set;
        self.restart();
    }

    /// Starts over on the same set.
    pub fn restart(&mut self) {
        self.current = None;
        self.stack.clear();
        self.path = 0;
        self.next = 0;
        self.state = State::NotStarted;
        self.on_item = false;
    }

    /// Advances to the next item. Returns `false` once the set is exhausted.
    pub fn move_next(&mut self) -> bool {
        match self.state {
            State::Exhausted => return false,
            State::NotStarted => {
                self.state = State::Scanning;
                self.current = self.set.root.clone();
                self.next = 0;
            }
            State::Scanning => {}
        }
        self.on_item = false;

        loop {
            let Some(node) = self.current.clone() else {
                self.state = State::Exhausted;
                return false;
            };

            while self.next < FANOUT {
                let i = self.next;
                self.next += 1;
                if node.slot_occupied(i) {
                    self.on_item = true;
                    return true;
                }
            }

            let j = self.next - FANOUT;
            if node.is_max_depth() {
                if j < node.overflow_len() {
                    self.next += 1;
                    self.on_item = true;
                    return true;
                }
            } else {
                let child = node.next_child(j).map(|(d, c)| (d, Arc::clone(c)));
                if let Some((d, child)) = child {
                    self.path = with_path_digit(self.path, self.stack.len(), d);
                    self.stack.push(node);
                    self.current = Some(child);
                    self.next = 0;
                    continue;
                }
            }

            // This node is done; resume the parent after the child we left.
            match self.stack.pop() {
                Some(parent) => {
                    let d = path_digit(self.path, self.stack.len());
                    self.current = Some(parent);
                    self.next = FANOUT + d + 1;
                }
                None => {
                    self.current = None;
                    self.state = State::Exhausted;
                    return false;
                }
            }
        }
    }

    /// The item at the current position.
    pub fn current(&self) -> Option<&T> {
        if !self.on_item {
            return None;
        }
        self.current.as_ref()?.item_at(self.next - 1)
    }

    /// Trie depth of the current node.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Drops the enumerator's node handles so the set's unfrozen nodes are
    /// uniquely owned again.
    fn release(&mut self) {
        self.stack.clear();
        self.current = None;
    }

    /// Re-reads the path from the root after a mutation. If the node at
    /// `level` was detached, resumes at the deepest surviving ancestor just
    /// past the child index that led to it.
    fn relocate(&mut self, level: usize) {
        self.release();
        let Some(mut node) = self.set.root.clone() else {
            return;
        };
        for l in 0..level {
            let d = path_digit(self.path, l);
            match node.child(d).map(Arc::clone) {
                Some(child) => {
                    self.stack.push(node);
                    node = child;
                }
                None => {
                    self.current = Some(node);
                    self.next = FANOUT + d + 1;
                    return;
                }
            }
        }
        self.current = Some(node);
    }
}

impl<'a, T: Clone> TrieEnumerator<'a, T> {
    /// Removes the current item and returns it. The enumerator stays where
    /// it was; the next [`move_next`](Self::move_next) continues after it.
    ///
    /// Nodes emptied by the removal are detached from their parents. Unlike
    /// [`HashTrieSet::remove`], small children are not absorbed into their
    /// parents, since that would move items the walk has not reached yet.
    pub fn remove_current(&mut self) -> Result<T> {
        if !self.on_item {
            return Err(TrieError::NoCurrent);
        }
        let pos = self.next - 1;
        let level = self.stack.len();
        self.release();

        let root = self.set.root.as_mut().ok_or(TrieError::NoCurrent)?;
        let removed = update_at(root, self.path, level as u8, Tidy::Detach, |node| node.take_at(pos)).flatten();
        if root.is_empty() {
            self.set.root = None;
        }

        self.on_item = false;
        if pos >= FANOUT {
            // Swap-remove moved the last overflow item into `pos`.
            self.next -= 1;
        }
        self.relocate(level);
        removed.ok_or(TrieError::NoCurrent)
    }

    /// Overwrites the current item with `value`, returning the old one.
    ///
    /// `value` must compare equal to the current item under `comparer`;
    /// otherwise it would sit where lookups cannot find it, and
    /// [`TrieError::ValueMismatch`] is returned with the set unchanged.
    pub fn set_current_value<C>(&mut self, value: T, comparer: &C) -> Result<T>
    where
        C: TrieComparer<T> + ?Sized,
    {
        let old = self.current().ok_or(TrieError::NoCurrent)?;
        if !comparer.equals(old, &value) {
            return Err(TrieError::ValueMismatch);
        }
        let pos = self.next - 1;
        let level = self.stack.len();
        self.release();

        let root = self.set.root.as_mut().ok_or(TrieError::NoCurrent)?;
        let old = update_at(root, self.path, level as u8, Tidy::Keep, |node| node.replace_at(pos, value)).flatten();
        self.relocate(level);
        old.ok_or(TrieError::NoCurrent)
    }
}

impl<'a, T: std::fmt::Debug> std::fmt::Debug for TrieEnumerator<'a, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrieEnumerator")
            .field("state", &self.state)
            .field("depth", &self.stack.len())
            .field("path", &format_args!("{:#010x}", self.path))
            .field("current", &self.current())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparer::{DefaultComparer, HashWith, KeyComparer};
    use std::collections::HashSet;

    #[test]
    fn test_path_digits() {
        let p = with_path_digit(0, 0, 5);
        let p = with_path_digit(p, 3, 0xC);
        assert_eq!(path_digit(p, 0), 5);
        assert_eq!(path_digit(p, 3), 0xC);
        let p = with_path_digit(p, 0, 1);
        assert_eq!(path_digit(p, 0), 1);
        assert_eq!(path_digit(p, 3), 0xC);
    }

    #[test]
    fn test_enumerates_each_item_once() {
        let cmp = HashWith(|x: &u32| *x % 16);
        let mut set = HashTrieSet::from_iter_with(0..500u32, &cmp);
        let expected: Vec<u32> = set.iter().copied().collect();

        let mut seen = Vec::new();
        let mut e = set.enumerator();
        while e.move_next() {
            seen.push(*e.current().unwrap());
        }
        assert!(!e.move_next());
        assert_eq!(e.current(), None);
        assert_eq!(seen, expected);
        assert_eq!(seen.iter().collect::<HashSet<_>>().len(), 500);
    }

    #[test]
    fn test_remove_current_drains() {
        let cmp = HashWith(|x: &u32| *x % 16);
        let mut set = HashTrieSet::from_iter_with(0..300u32, &cmp);
        let mut removed = 0;
        let mut e = set.enumerator();
        while e.move_next() {
            e.remove_current().unwrap();
            assert_eq!(e.remove_current(), Err(TrieError::NoCurrent));
            removed += 1;
        }
        drop(e);
        assert_eq!(removed, 300);
        assert_eq!(set.count(), 0);
        assert!(set.is_empty());
    }

    #[test]
    fn test_remove_current_in_overflow() {
        let cmp = HashWith(|_: &u32| 7);
        let mut set = HashTrieSet::from_iter_with(0..40u32, &cmp);
        let mut seen = HashSet::new();
        let mut e = set.enumerator();
        while e.move_next() {
            let x = *e.current().unwrap();
            assert!(seen.insert(x), "visited {x} twice");
            if x % 3 != 0 {
                assert_eq!(e.remove_current(), Ok(x));
            }
        }
        drop(e);
        assert_eq!(seen.len(), 40);
        let left: HashSet<u32> = set.iter().copied().collect();
        assert_eq!(left, (0..40).filter(|x| x % 3 == 0).collect());
    }

    #[test]
    fn test_remove_current_on_frozen_leaves_snapshot() {
        let mut set = HashTrieSet::from_iter_with(0..1000u32, &DefaultComparer);
        let snapshot = set.clone_freeze();

        let mut e = set.enumerator();
        while e.move_next() {
            if e.current().map_or(false, |x| x % 2 == 0) {
                e.remove_current().unwrap();
            }
        }
        drop(e);

        assert_eq!(set.count(), 500);
        assert_eq!(snapshot.count(), 1000);
        assert!(set.iter().all(|x| x % 2 == 1));
        assert!(set.verify(&DefaultComparer).is_empty());
        assert!(snapshot.verify(&DefaultComparer).is_empty());
    }

    #[test]
    fn test_remove_current_leaves_small_children() {
        let cmp = HashWith(|x: &u32| *x);
        // Same shape as the absorption case for `HashTrieSet::remove`: all
        // five have home 3 at the root and distinct digits below it.
        let mut set = HashTrieSet::from_iter_with([3u32, 19, 35, 51, 67], &cmp);
        assert!(set.root.as_ref().unwrap().child(3).is_some());

        let mut seen = Vec::new();
        let mut e = set.enumerator();
        while e.move_next() {
            let x = *e.current().unwrap();
            seen.push(x);
            if x < 50 {
                assert_eq!(e.remove_current(), Ok(x));
            }
        }
        drop(e);

        seen.sort_unstable();
        assert_eq!(seen, [3, 19, 35, 51, 67]);
        // The two survivors would fit in the root window but stay put.
        assert!(set.root.as_ref().unwrap().child(3).is_some());
        assert_eq!(set.iter().copied().collect::<Vec<_>>(), [51, 67]);
        assert!(set.verify(&cmp).is_empty());

        // A plain removal does pull the last one up.
        assert_eq!(set.remove(&51, &cmp), Some(51));
        assert!(set.root.as_ref().unwrap().child(3).is_none());
        assert!(set.contains(&67, &cmp));
        assert!(set.verify(&cmp).is_empty());
    }

    #[test]
    fn test_set_current_value() {
        let cmp = KeyComparer(DefaultComparer);
        let mut set = HashTrieSet::from_iter_with((0..50u32).map(|k| (k, 0u32)), &cmp);
        let snapshot = set.clone();

        let mut e = set.enumerator();
        assert_eq!(e.set_current_value((0, 0), &cmp), Err(TrieError::NoCurrent));
        while e.move_next() {
            let (k, _) = *e.current().unwrap();
            assert_eq!(e.set_current_value((k + 1, 9), &cmp), Err(TrieError::ValueMismatch));
            assert_eq!(e.set_current_value((k, k * 10), &cmp), Ok((k, 0)));
            assert_eq!(e.current(), Some(&(k, k * 10)));
        }
        drop(e);

        for k in 0..50u32 {
            assert_eq!(set.find(&(k, 0), &cmp), Some(&(k, k * 10)));
            assert_eq!(snapshot.find(&(k, 0), &cmp), Some(&(k, 0)));
        }
    }

    #[test]
    fn test_reset_and_restart() {
        let mut a = HashTrieSet::from_iter_with(0..10u32, &DefaultComparer);
        let mut b = HashTrieSet::from_iter_with(0..3u32, &DefaultComparer);
        let mut empty: HashTrieSet<u32> = HashTrieSet::new();

        let mut e = a.enumerator();
        let mut n = 0;
        while e.move_next() {
            n += 1;
        }
        assert_eq!(n, 10);
        e.restart();
        assert!(e.move_next());

        e.reset(&mut b);
        let mut n = 0;
        while e.move_next() {
            n += 1;
        }
        assert_eq!(n, 3);

        e.reset(&mut empty);
        assert!(!e.move_next());
    }
}
