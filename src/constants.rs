// =============================================================================
// Trie shape
// =============================================================================

/// Hash bits consumed per trie level.
pub(crate) const BITS_PER_LEVEL: u32 = 4;
/// Slots (and child pointers) per node.
pub(crate) const FANOUT: usize = 1 << BITS_PER_LEVEL;
pub(crate) const DIGIT_MASK: u32 = (FANOUT as u32) - 1;
/// Slots probed for one home digit: home, home+1, home+2, home+3 (mod 16).
pub(crate) const WINDOW: usize = 4;
/// Deepest level; 8 levels of 4 bits cover a 32-bit hash.
pub(crate) const MAX_DEPTH: u8 = 7;

// =============================================================================
// Packed node counter
// =============================================================================

// [overflow:1][children:5][items:5], low bits first.
pub(crate) const ITEM_MASK: u16 = 0x1F;
pub(crate) const CHILD_SHIFT: u32 = 5;
pub(crate) const CHILD_WEIGHT: u16 = 1 << CHILD_SHIFT;
pub(crate) const CHILD_MASK: u16 = 0x1F << CHILD_SHIFT;
pub(crate) const OVERFLOW_FLAG: u16 = 1 << 10;

/// Children at or below this many items (and with no grandchildren) are
/// candidates for absorption into their parent.
pub(crate) const ABSORB_LIMIT: usize = 2;

/// Overflow items stored inline before the list spills to the heap.
pub(crate) const INLINE_OVERFLOW: usize = 4;
