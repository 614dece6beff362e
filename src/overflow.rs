//! Overflow list for nodes at maximum depth.
//!
//! Once all 32 hash bits are consumed a full probe window can no longer be
//! split, so further colliding items go into a plain list scanned linearly.

use smallvec::SmallVec;

use crate::comparer::TrieComparer;
use crate::constants::{INLINE_OVERFLOW, OVERFLOW_FLAG};
use crate::node::Node;

#[derive(Clone)]
pub(crate) struct Overflow<T> {
    items: SmallVec<[T; INLINE_OVERFLOW]>,
}

impl<T> Default for Overflow<T> {
    fn default() -> Self {
        Self {
            items: SmallVec::new(),
        }
    }
}

impl<T> Overflow<T> {
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items stored past the inline capacity.
    pub(crate) fn spilled_capacity(&self) -> usize {
        if self.items.spilled() {
            self.items.capacity()
        } else {
            0
        }
    }
}

impl<T> Node<T> {
    #[inline]
    pub(crate) fn overflow_len(&self) -> usize {
        self.overflow.as_ref().map_or(0, |o| o.len())
    }

    #[inline]
    pub(crate) fn overflow_item(&self, j: usize) -> Option<&T> {
        self.overflow.as_ref()?.items.get(j)
    }

    pub(crate) fn overflow_items(&self) -> impl Iterator<Item = &T> {
        self.overflow.iter().flat_map(|o| o.items.iter())
    }

    pub(crate) fn find_in_overflow<C>(&self, item: &T, comparer: &C) -> Option<usize>
    where
        C: TrieComparer<T> + ?Sized,
    {
        self.overflow
            .as_ref()?
            .items
            .iter()
            .position(|x| comparer.equals(x, item))
    }

    pub(crate) fn push_overflow(&mut self, item: T) {
        debug_assert!(self.is_max_depth());
        self.overflow
            .get_or_insert_with(Default::default)
            .items
            .push(item);
        self.counter |= OVERFLOW_FLAG;
    }

    /// Swap-with-last removal; the last item moves into index `j`.
    pub(crate) fn remove_overflow_at(&mut self, j: usize) -> Option<T> {
        let overflow = self.overflow.as_mut()?;
        if j >= overflow.items.len() {
            return None;
        }
        let item = overflow.items.swap_remove(j);
        if overflow.items.is_empty() {
            self.overflow = None;
            self.counter &= !OVERFLOW_FLAG;
        }
        Some(item)
    }

    pub(crate) fn replace_overflow_at(&mut self, j: usize, item: T) -> Option<T> {
        let slot = self.overflow.as_mut()?.items.get_mut(j)?;
        Some(std::mem::replace(slot, item))
    }
}
