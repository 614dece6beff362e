//! The set handle and the add/remove/find descent.

use std::sync::Arc;

use crate::comparer::TrieComparer;
use crate::constants::{ABSORB_LIMIT, FANOUT, WINDOW};
use crate::enumerator::{Iter, TrieEnumerator};
use crate::node::{digit, Node};

/// What [`HashTrieSet::add_or_remove`] should do with its item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Insert unless an equal item is present; never overwrites.
    AddIfAbsent,
    /// Insert, overwriting an equal item if present.
    AddOrReplace,
    /// Remove the equal item if present.
    Remove,
}

/// Result of [`HashTrieSet::add_or_remove`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The item was inserted.
    Added,
    /// An equal item was already present and was left alone. Carries a
    /// clone of the stored item.
    Present(T),
    /// An equal item was overwritten. Carries the previous stored value.
    Replaced(T),
    /// The equal item was removed. Carries the removed value.
    Removed(T),
    /// Nothing equal was present; nothing changed.
    NotFound,
}

/// A hash-trie set with O(1) freezing and copy-on-write thaw.
///
/// The handle owns at most one shared root node. [`clone_freeze`] (and
/// `Clone`) marks the root frozen and shares it, so the original and the
/// copy both see the same contents without copying anything. The first
/// mutation through either handle clones exactly the nodes on its path; the
/// other handle keeps reading the frozen originals.
///
/// No comparer is stored: every call takes one, and all calls against a set
/// must use equivalent comparers.
///
/// ```rust
/// use hash_trie_set::{DefaultComparer, HashTrieSet};
///
/// let mut a = HashTrieSet::new();
/// a.insert(1, &DefaultComparer);
/// a.insert(2, &DefaultComparer);
///
/// let snapshot = a.clone_freeze();
/// a.remove(&1, &DefaultComparer);
///
/// assert!(!a.contains(&1, &DefaultComparer));
/// assert!(snapshot.contains(&1, &DefaultComparer));
/// ```
///
/// [`clone_freeze`]: HashTrieSet::clone_freeze
pub struct HashTrieSet<T> {
    pub(crate) root: Option<Arc<Node<T>>>,
}

/// Makes the node behind `slot` safe to mutate: a frozen node is replaced by
/// an unfrozen clone first.
pub(crate) fn thaw<T: Clone>(slot: &mut Arc<Node<T>>) -> &mut Node<T> {
    if slot.is_frozen() {
        *slot = Arc::new(slot.clone_for_thaw());
    }
    Arc::make_mut(slot)
}

impl<T> HashTrieSet<T> {
    /// An empty set. Allocates nothing.
    pub const fn new() -> Self {
        Self { root: None }
    }

    /// O(1).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.as_ref().map_or(true, |r| r.is_empty())
    }

    /// Number of items. O(n): the trie does not cache its size.
    pub fn count(&self) -> usize {
        fn count_in<T>(node: &Node<T>) -> usize {
            let mut n = node.item_count() + node.overflow_len();
            let mut from = 0;
            while let Some((d, child)) = node.next_child(from) {
                n += count_in(child);
                from = d + 1;
            }
            n
        }
        self.root.as_deref().map_or(0, count_in)
    }

    pub fn clear(&mut self) {
        self.root = None;
    }

    /// Borrows the stored item equal to `item`.
    pub fn find<C>(&self, item: &T, comparer: &C) -> Option<&T>
    where
        C: TrieComparer<T> + ?Sized,
    {
        let hash = comparer.hash_code(item);
        self.locate(item, hash, comparer).map(|(_, _, stored)| stored)
    }

    /// Read-only descent to the item equal to `item`: the depth of its node,
    /// its position there (slot, or `FANOUT + j` for overflow item `j`) and
    /// the stored value. The node's path is the low digits of `hash`.
    pub(crate) fn locate<C>(&self, item: &T, hash: u32, comparer: &C) -> Option<(u8, usize, &T)>
    where
        C: TrieComparer<T> + ?Sized,
    {
        let mut node: &Node<T> = self.root.as_deref()?;
        loop {
            let home = digit(hash, node.depth());
            if let Some(child) = node.child(home) {
                node = child;
                continue;
            }
            if let Some(i) = node.find_in_window(home, item, comparer) {
                return node.item(i).map(|x| (node.depth(), i, x));
            }
            if node.is_max_depth() {
                let j = node.find_in_overflow(item, comparer)?;
                return node.overflow_item(j).map(|x| (node.depth(), FANOUT + j, x));
            }
            return None;
        }
    }

    #[inline]
    pub fn contains<C>(&self, item: &T, comparer: &C) -> bool
    where
        C: TrieComparer<T> + ?Sized,
    {
        self.find(item, comparer).is_some()
    }

    /// Marks the root frozen. O(1); children are frozen lazily.
    pub fn freeze(&self) {
        if let Some(root) = &self.root {
            root.freeze();
        }
    }

    /// Whether mutation must clone the root first. An empty set counts as
    /// frozen: it has no root to mutate.
    pub fn is_frozen(&self) -> bool {
        self.root.as_ref().map_or(true, |r| r.is_frozen())
    }

    /// Freezes this set and returns a second handle sharing its nodes. O(1).
    pub fn clone_freeze(&self) -> Self {
        self.freeze();
        Self {
            root: self.root.clone(),
        }
    }

    /// Iterates items in trie order (slot order, overflow, then children
    /// depth-first). The order is deterministic but carries no meaning.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self)
    }
}

impl<T: Clone> HashTrieSet<T> {
    /// Builds a set from `items`; later duplicates are dropped.
    pub fn from_iter_with<I, C>(items: I, comparer: &C) -> Self
    where
        I: IntoIterator<Item = T>,
        C: TrieComparer<T> + ?Sized,
    {
        let mut set = Self::new();
        for item in items {
            set.insert(item, comparer);
        }
        set
    }

    /// Ensures a root exists and is not frozen.
    pub fn thaw(&mut self) {
        let root = self.root.get_or_insert_with(|| Arc::new(Node::new(0)));
        thaw(root);
    }

    /// An enumerator that can remove or update items while walking.
    pub fn enumerator(&mut self) -> TrieEnumerator<'_, T> {
        TrieEnumerator::new(self)
    }

    /// Inserts, replaces or removes `item` according to `mode`.
    ///
    /// Calls that turn out to change nothing (a present item under
    /// [`Mode::AddIfAbsent`], a missing one under [`Mode::Remove`]) never
    /// thaw a frozen node.
    pub fn add_or_remove<C>(&mut self, item: T, comparer: &C, mode: Mode) -> Outcome<T>
    where
        C: TrieComparer<T> + ?Sized,
    {
        match mode {
            Mode::Remove => match self.remove(&item, comparer) {
                Some(old) => Outcome::Removed(old),
                None => Outcome::NotFound,
            },
            Mode::AddIfAbsent => self.insert_value(item, comparer, false),
            Mode::AddOrReplace => self.insert_value(item, comparer, true),
        }
    }

    /// Adds `item`. Returns `None` if it was inserted. If an equal item was
    /// present, `replace` decides: `true` overwrites it and returns the old
    /// value; `false` leaves the set unchanged and returns a clone of the
    /// stored value.
    pub fn add<C>(&mut self, item: T, comparer: &C, replace: bool) -> Option<T>
    where
        C: TrieComparer<T> + ?Sized,
    {
        let mode = if replace {
            Mode::AddOrReplace
        } else {
            Mode::AddIfAbsent
        };
        match self.add_or_remove(item, comparer, mode) {
            Outcome::Added | Outcome::NotFound => None,
            Outcome::Present(v) | Outcome::Replaced(v) | Outcome::Removed(v) => Some(v),
        }
    }

    /// Inserts `item` unless an equal one is present. Returns whether it was
    /// inserted.
    pub fn insert<C>(&mut self, item: T, comparer: &C) -> bool
    where
        C: TrieComparer<T> + ?Sized,
    {
        matches!(
            self.add_or_remove(item, comparer, Mode::AddIfAbsent),
            Outcome::Added
        )
    }

    /// Inserts `item`, overwriting an equal one. Returns the overwritten value.
    pub fn replace<C>(&mut self, item: T, comparer: &C) -> Option<T>
    where
        C: TrieComparer<T> + ?Sized,
    {
        match self.insert_value(item, comparer, true) {
            Outcome::Replaced(old) => Some(old),
            _ => None,
        }
    }

    /// Removes and returns the stored item equal to `item`.
    pub fn remove<C>(&mut self, item: &T, comparer: &C) -> Option<T>
    where
        C: TrieComparer<T> + ?Sized,
    {
        let hash = comparer.hash_code(item);
        let (depth, pos, _) = self.locate(item, hash, comparer)?;
        let root = self.root.as_mut()?;
        let removed = update_at(root, hash, depth, Tidy::Absorb, |node| node.take_at(pos)).flatten();
        if root.is_empty() {
            self.root = None;
        }
        removed
    }

    fn insert_value<C>(&mut self, item: T, comparer: &C, replace: bool) -> Outcome<T>
    where
        C: TrieComparer<T> + ?Sized,
    {
        let hash = comparer.hash_code(&item);
        let hit = match self.locate(&item, hash, comparer) {
            Some((_, _, stored)) if !replace => return Outcome::Present(stored.clone()),
            hit => hit.map(|(depth, pos, _)| (depth, pos)),
        };

        match hit {
            Some((depth, pos)) => {
                let Some(root) = self.root.as_mut() else {
                    return Outcome::NotFound;
                };
                match update_at(root, hash, depth, Tidy::Keep, |node| node.replace_at(pos, item)).flatten() {
                    Some(old) => Outcome::Replaced(old),
                    None => Outcome::NotFound,
                }
            }
            None => {
                let root = self.root.get_or_insert_with(|| Arc::new(Node::new(0)));
                insert_absent(thaw(root), item, hash, comparer);
                Outcome::Added
            }
        }
    }
}

/// What [`update_at`] does to each child on its way back up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tidy {
    Keep,
    /// Drop children left empty.
    Detach,
    /// Drop empty children and pull small leaf children into their parent.
    Absorb,
}

/// Thaws the nodes from `slot` down to `depth` along the digits of `path`,
/// applies `f` to the last one, and tidies each child on the way back.
/// Returns `None` if the path runs out before `depth`.
pub(crate) fn update_at<T, R>(
    slot: &mut Arc<Node<T>>,
    path: u32,
    depth: u8,
    tidy: Tidy,
    f: impl FnOnce(&mut Node<T>) -> R,
) -> Option<R>
where
    T: Clone,
{
    let node = thaw(slot);
    if node.depth() == depth {
        return Some(f(node));
    }
    let d = digit(path, node.depth());
    let result = update_at(node.child_mut(d)?, path, depth, tidy, f);
    match tidy {
        Tidy::Keep => {}
        Tidy::Detach => {
            if node.child(d).map_or(false, |c| c.is_empty()) {
                node.set_child(d, None);
            }
        }
        Tidy::Absorb => settle_child(node, d),
    }
    result
}

/// Places an item known to be absent, splitting full windows on the way.
fn insert_absent<T, C>(node: &mut Node<T>, item: T, hash: u32, comparer: &C)
where
    T: Clone,
    C: TrieComparer<T> + ?Sized,
{
    let home = digit(hash, node.depth());
    loop {
        if let Some(child) = node.child_mut(home) {
            return insert_absent(thaw(child), item, hash, comparer);
        }
        if let Some(i) = node.free_slot_in_window(home) {
            node.assign(i, item);
            return;
        }
        if node.is_max_depth() {
            node.push_overflow(item);
            return;
        }
        // Window full: move the dominant home into a child, then retry here.
        split(node, home, comparer);
    }
}

/// Moves every item of the most common home digit in `home`'s full window
/// into a new child node. Ties go to the first item in probe order.
fn split<T, C>(node: &mut Node<T>, home: usize, comparer: &C)
where
    T: Clone,
    C: TrieComparer<T> + ?Sized,
{
    let depth = node.depth();
    let mut homes = [0usize; WINDOW];
    for (k, h) in homes.iter_mut().enumerate() {
        let i = (home + k) % FANOUT;
        debug_assert!(node.slot_occupied(i));
        *h = node.item(i).map_or(home, |x| digit(comparer.hash_code(x), depth));
    }

    let mut best = homes[0];
    let mut best_n = 0;
    for &h in &homes {
        let n = homes.iter().filter(|&&x| x == h).count();
        if n > best_n {
            best = h;
            best_n = n;
        }
    }
    debug_assert!(node.child(best).is_none());

    let mut child = Node::new(depth + 1);
    for k in 0..WINDOW {
        let i = (best + k) % FANOUT;
        let hash = match node.item(i) {
            Some(x) => comparer.hash_code(x),
            None => continue,
        };
        if digit(hash, depth) != best {
            continue;
        }
        if let Some(moved) = node.clear(i) {
            insert_absent(&mut child, moved, hash, comparer);
        }
    }
    node.set_child(best, Some(Arc::new(child)));
}

/// After a removal below `d`: drops the child if it emptied, otherwise
/// tries to pull its last few items back into this node.
fn settle_child<T: Clone>(node: &mut Node<T>, d: usize) {
    let (empty, leaf) = match node.child(d) {
        Some(child) => (
            child.is_empty(),
            !child.has_children() && !child.has_overflow() && child.item_count() <= ABSORB_LIMIT,
        ),
        None => return,
    };
    if empty {
        node.set_child(d, None);
    } else if leaf {
        absorb_child(node, d);
    }
}

/// Moves a leaf child's items into `d`'s window and drops the child, if the
/// window has room for all of them. All of them have home `d` at this
/// depth, so the window is where they belong.
fn absorb_child<T: Clone>(node: &mut Node<T>, d: usize) {
    let fits = node
        .child(d)
        .map_or(false, |c| c.item_count() <= node.free_in_window(d));
    if !fits {
        return;
    }
    let Some(child) = node.set_child(d, None) else {
        return;
    };
    let items: Vec<T> = match Arc::try_unwrap(child) {
        Ok(child) => child.into_items().collect(),
        Err(shared) => shared.items().cloned().collect(),
    };
    // Each assignment uses one of the free slots counted above.
    for item in items {
        if let Some(i) = node.free_slot_in_window(d) {
            node.assign(i, item);
        }
    }
}

impl<T> Default for HashTrieSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Same as [`HashTrieSet::clone_freeze`].
impl<T> Clone for HashTrieSet<T> {
    fn clone(&self) -> Self {
        self.clone_freeze()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for HashTrieSet<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<'a, T> IntoIterator for &'a HashTrieSet<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
