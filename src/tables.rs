//! Slot-selection tables for a 4-slot probe window.
//!
//! A window is summarized in one byte: the low nibble holds the in-use bits
//! of its four slots in probe order, the high nibble their tombstone bits.
//! Both tables are built at compile time.

use crate::constants::{FANOUT, WINDOW};

/// Marker in [`TARGET_SLOT`] for a window with no free slot.
pub(crate) const NO_SLOT: u8 = 0xFF;

/// Window offset (0..4) an insertion should use, or [`NO_SLOT`].
///
/// The first tombstone in probe order wins; otherwise the first empty slot.
pub(crate) static TARGET_SLOT: [u8; 256] = build_target_slot();

/// Number of slots in the window that are not in use.
pub(crate) static FREE_SLOTS: [u8; 256] = build_free_slots();

const fn build_target_slot() -> [u8; 256] {
    let mut table = [NO_SLOT; 256];
    let mut key = 0usize;
    while key < 256 {
        let used = (key & 0xF) as u32;
        // A slot in use is never also a tombstone.
        let deleted = ((key >> 4) as u32) & !used & 0xF;
        let empty = !used & 0xF;
        table[key] = if deleted != 0 {
            deleted.trailing_zeros() as u8
        } else if empty != 0 {
            empty.trailing_zeros() as u8
        } else {
            NO_SLOT
        };
        key += 1;
    }
    table
}

const fn build_free_slots() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut key = 0usize;
    while key < 256 {
        let used = (key & 0xF) as u32;
        table[key] = (WINDOW as u32 - used.count_ones()) as u8;
        key += 1;
    }
    table
}

/// Table key for the window starting at `home`, wrapping past slot 15.
#[inline]
pub(crate) fn window_key(used: u16, deleted: u16, home: usize) -> usize {
    debug_assert!(home < FANOUT);
    let shift = home as u32;
    let used = used.rotate_right(shift) & 0xF;
    let deleted = deleted.rotate_right(shift) & 0xF;
    usize::from(used | (deleted << 4))
}
