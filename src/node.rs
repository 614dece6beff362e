//! Trie node: 16 item slots, optional children, packed bookkeeping.
//!
//! Slot state lives in `occupancy`: bit `i` marks slot `i` in use, bit
//! `16 + i` marks it as a tombstone. `counter` packs the number of used slots,
//! the number of children (weighted by [`CHILD_WEIGHT`]) and the overflow
//! flag, so `counter == 0` means the node holds nothing at all.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::comparer::TrieComparer;
use crate::constants::{
    BITS_PER_LEVEL, CHILD_MASK, CHILD_SHIFT, CHILD_WEIGHT, DIGIT_MASK, FANOUT, ITEM_MASK,
    MAX_DEPTH, OVERFLOW_FLAG, WINDOW,
};
use crate::overflow::Overflow;
use crate::tables::{self, FREE_SLOTS, NO_SLOT, TARGET_SLOT};

pub(crate) type Children<T> = [Option<Arc<Node<T>>>; FANOUT];

/// Hash digit (0..16) that a node at `depth` indexes by.
#[inline]
pub(crate) fn digit(hash: u32, depth: u8) -> usize {
    ((hash >> (u32::from(depth) * BITS_PER_LEVEL)) & DIGIT_MASK) as usize
}

pub(crate) struct Node<T> {
    items: [Option<T>; FANOUT],
    children: Option<Box<Children<T>>>,
    occupancy: u32,
    pub(crate) counter: u16,
    depth: u8,
    frozen: AtomicBool,
    /// Only ever allocated at [`MAX_DEPTH`].
    pub(crate) overflow: Option<Box<Overflow<T>>>,
}

impl<T> Node<T> {
    pub(crate) fn new(depth: u8) -> Self {
        debug_assert!(depth <= MAX_DEPTH);
        Self {
            items: std::array::from_fn(|_| None),
            children: None,
            occupancy: 0,
            counter: 0,
            depth,
            frozen: AtomicBool::new(false),
            overflow: None,
        }
    }

    #[inline]
    pub(crate) fn depth(&self) -> u8 {
        self.depth
    }

    #[inline]
    pub(crate) fn is_max_depth(&self) -> bool {
        self.depth == MAX_DEPTH
    }

    #[inline]
    pub(crate) fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    /// Shallow: children are frozen lazily when a frozen parent is thawed.
    #[inline]
    pub(crate) fn freeze(&self) {
        if !self.is_frozen() {
            self.frozen.store(true, Ordering::Release);
        }
    }

    // =========================================================================
    // Slots
    // =========================================================================

    #[inline]
    pub(crate) fn used_mask(&self) -> u16 {
        self.occupancy as u16
    }

    #[inline]
    pub(crate) fn deleted_mask(&self) -> u16 {
        (self.occupancy >> 16) as u16
    }

    #[inline]
    pub(crate) fn slot_occupied(&self, i: usize) -> bool {
        self.occupancy & (1 << i) != 0
    }

    #[inline]
    pub(crate) fn is_tombstone(&self, i: usize) -> bool {
        self.occupancy & (1 << (i + 16)) != 0
    }

    #[inline]
    pub(crate) fn item(&self, i: usize) -> Option<&T> {
        self.items[i].as_ref()
    }

    /// Stores `item` in slot `i`, returning whatever was there.
    pub(crate) fn assign(&mut self, i: usize, item: T) -> Option<T> {
        let bit = 1u32 << i;
        if self.occupancy & bit == 0 {
            self.counter += 1;
        }
        self.occupancy = (self.occupancy | bit) & !(bit << 16);
        let old = self.items[i].replace(item);
        debug_assert_eq!(self.counter, self.recount());
        old
    }

    /// Empties slot `i`, leaving a tombstone.
    pub(crate) fn clear(&mut self, i: usize) -> Option<T> {
        let bit = 1u32 << i;
        if self.occupancy & bit != 0 {
            self.counter -= 1;
            self.occupancy = (self.occupancy & !bit) | (bit << 16);
        }
        let old = self.items[i].take();
        debug_assert_eq!(self.counter, self.recount());
        old
    }

    #[inline]
    pub(crate) fn item_count(&self) -> usize {
        usize::from(self.counter & ITEM_MASK)
    }

    #[inline]
    pub(crate) fn child_count(&self) -> usize {
        usize::from((self.counter & CHILD_MASK) >> CHILD_SHIFT)
    }

    #[inline]
    pub(crate) fn has_children(&self) -> bool {
        self.counter & CHILD_MASK != 0
    }

    #[inline]
    pub(crate) fn has_overflow(&self) -> bool {
        self.counter & OVERFLOW_FLAG != 0
    }

    /// No items, no children, no overflow.
    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.counter == 0
    }

    /// Recomputes `counter` from the node's contents.
    pub(crate) fn recount(&self) -> u16 {
        let items = self.items.iter().filter(|s| s.is_some()).count() as u16;
        let children = self
            .children
            .as_ref()
            .map_or(0, |c| c.iter().filter(|c| c.is_some()).count() as u16);
        let overflow = if self.overflow.as_ref().map_or(false, |o| !o.is_empty()) {
            OVERFLOW_FLAG
        } else {
            0
        };
        items + children * CHILD_WEIGHT + overflow
    }

    // =========================================================================
    // Probe window
    // =========================================================================

    #[inline]
    fn window_key(&self, home: usize) -> usize {
        tables::window_key(self.used_mask(), self.deleted_mask(), home)
    }

    /// Slot in `home`'s window holding an item equal to `item`.
    pub(crate) fn find_in_window<C>(&self, home: usize, item: &T, comparer: &C) -> Option<usize>
    where
        C: TrieComparer<T> + ?Sized,
    {
        (0..WINDOW)
            .map(|k| (home + k) % FANOUT)
            .find(|&i| self.items[i].as_ref().map_or(false, |x| comparer.equals(x, item)))
    }

    /// Slot an insertion into `home`'s window should use, if any is free.
    #[inline]
    pub(crate) fn free_slot_in_window(&self, home: usize) -> Option<usize> {
        let offset = TARGET_SLOT[self.window_key(home)];
        (offset != NO_SLOT).then(|| (home + usize::from(offset)) % FANOUT)
    }

    #[inline]
    pub(crate) fn free_in_window(&self, home: usize) -> usize {
        usize::from(FREE_SLOTS[self.window_key(home)])
    }

    // =========================================================================
    // Children
    // =========================================================================

    #[inline]
    pub(crate) fn child(&self, d: usize) -> Option<&Arc<Node<T>>> {
        self.children.as_ref()?[d].as_ref()
    }

    #[inline]
    pub(crate) fn child_mut(&mut self, d: usize) -> Option<&mut Arc<Node<T>>> {
        self.children.as_mut()?[d].as_mut()
    }

    /// First child at index `from` or later.
    pub(crate) fn next_child(&self, from: usize) -> Option<(usize, &Arc<Node<T>>)> {
        let children = self.children.as_ref()?;
        (from..FANOUT).find_map(|d| children[d].as_ref().map(|c| (d, c)))
    }

    /// Installs or removes the child at `d`, returning the previous one.
    /// The children array is released once the last child goes.
    pub(crate) fn set_child(&mut self, d: usize, child: Option<Arc<Node<T>>>) -> Option<Arc<Node<T>>> {
        debug_assert!(!self.is_max_depth() || child.is_none());
        let children = self
            .children
            .get_or_insert_with(|| Box::new(std::array::from_fn(|_| None)));
        let adding = child.is_some();
        let old = std::mem::replace(&mut children[d], child);
        match (old.is_some(), adding) {
            (false, true) => self.counter += CHILD_WEIGHT,
            (true, false) => self.counter -= CHILD_WEIGHT,
            _ => {}
        }
        if !self.has_children() {
            self.children = None;
        }
        debug_assert_eq!(self.counter, self.recount());
        old
    }

    // =========================================================================
    // Positions (slot index, then overflow index offset by FANOUT)
    // =========================================================================

    pub(crate) fn item_at(&self, pos: usize) -> Option<&T> {
        if pos < FANOUT {
            self.item(pos)
        } else {
            self.overflow_item(pos - FANOUT)
        }
    }

    pub(crate) fn take_at(&mut self, pos: usize) -> Option<T> {
        if pos < FANOUT {
            self.clear(pos)
        } else {
            self.remove_overflow_at(pos - FANOUT)
        }
    }

    pub(crate) fn replace_at(&mut self, pos: usize, item: T) -> Option<T> {
        if pos < FANOUT {
            if !self.slot_occupied(pos) {
                return None;
            }
            self.assign(pos, item)
        } else {
            self.replace_overflow_at(pos - FANOUT, item)
        }
    }

    /// Consumes the node, yielding its slot items (not overflow).
    pub(crate) fn into_items(self) -> impl Iterator<Item = T> {
        self.items.into_iter().flatten()
    }

    pub(crate) fn items(&self) -> impl Iterator<Item = &T> {
        self.items.iter().flatten()
    }
}

impl<T: Clone> Node<T> {
    /// Unfrozen copy of a node. Child handles are shared with the original,
    /// so each one is frozen on the way.
    pub(crate) fn clone_for_thaw(&self) -> Self {
        if let Some(children) = &self.children {
            for child in children.iter().flatten() {
                child.freeze();
            }
        }
        Self {
            items: self.items.clone(),
            children: self.children.clone(),
            occupancy: self.occupancy,
            counter: self.counter,
            depth: self.depth,
            frozen: AtomicBool::new(false),
            overflow: self.overflow.clone(),
        }
    }
}

// `Arc::make_mut` clones through this.
impl<T: Clone> Clone for Node<T> {
    fn clone(&self) -> Self {
        self.clone_for_thaw()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Node<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("depth", &self.depth)
            .field("used", &format_args!("{:#018b}", self.used_mask()))
            .field("deleted", &format_args!("{:#018b}", self.deleted_mask()))
            .field("children", &self.child_count())
            .field("overflow", &self.overflow_len())
            .field("frozen", &self.is_frozen())
            .finish()
    }
}
