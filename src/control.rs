//! Control-byte encoding.
//!
//! Every slot has one control byte. A byte with the top bit clear is Full and
//! carries the 7-bit H2 fragment of the slot's hash; the reserved values with
//! the top bit set mark empty slots, tombstones and the padding past the last
//! slot of the control array.

/// Slot that has never held an entry. Terminates every probe chain.
pub(crate) const EMPTY: u8 = 0b1000_0000;

/// Tombstone left behind by a removal. Probing continues past it.
pub(crate) const DELETED: u8 = 0b1111_1110;

/// Padding after the last real slot, so the control array is a whole number of groups.
pub(crate) const SENTINEL: u8 = 0b1111_1111;

/// Mask selecting the bits of the hash stored in a Full control byte.
const H2_MASK: u64 = 0x7f;

/// Number of low hash bits consumed by H2 and skipped by H1.
const H2_BITS: u32 = 7;

/// Classified view of a control byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Ctrl {
    /// Never used.
    Empty,
    /// Tombstone.
    Deleted,
    /// Live entry with the given H2 tag.
    Full(u8),
    /// Padding lane past the end of the table.
    Sentinel,
}

impl Ctrl {
    /// Classifies a raw control byte.
    pub(crate) const fn classify(byte: u8) -> Self {
        match byte {
            tag if is_full(tag) => Self::Full(tag),
            empty if is_empty(empty) => Self::Empty,
            deleted if is_deleted(deleted) => Self::Deleted,
            // Remaining top-bit patterns are never written.
            _ => Self::Sentinel,
        }
    }
}

/// Probe start derived from the high bits of the hash, decorrelated by the table salt.
///
/// Callers reduce it to a group index with the table's group mask.
#[inline]
#[allow(clippy::cast_possible_truncation)]
pub(crate) const fn h1(hash: u64, salt: u64) -> usize {
    ((hash >> H2_BITS) ^ salt) as usize
}

/// Seven-bit tag stored in a Full control byte, taken from the low bits of the hash.
#[inline]
#[allow(clippy::cast_possible_truncation)]
pub(crate) const fn h2(hash: u64) -> u8 {
    (hash & H2_MASK) as u8
}

/// Returns true if the byte marks a slot that has never been used.
#[inline]
pub(crate) const fn is_empty(ctrl: u8) -> bool {
    ctrl == EMPTY
}

/// Returns true if the byte is a tombstone.
#[inline]
pub(crate) const fn is_deleted(ctrl: u8) -> bool {
    ctrl == DELETED
}

/// Returns true if the byte belongs to a live slot.
#[inline]
pub(crate) const fn is_full(ctrl: u8) -> bool {
    ctrl & 0x80 == 0
}
