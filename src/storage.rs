//! Backing buffers of a table: control bytes and slots, indexed identically.

use std::{alloc::Layout, alloc::handle_alloc_error, iter::Flatten, vec};

use crate::{
    bitmask::{BitMask, BitMaskIter, BitMaskWord},
    control::{Ctrl, DELETED, EMPTY, SENTINEL, is_full},
    error::{Error, Result},
    group::{GROUP_WIDTH, Group},
};

/// A key-value pair owned by the table.
#[derive(Debug, Clone)]
pub(crate) struct Slot<K, V> {
    /// The key in the key-value pair
    pub(crate) key: K,
    /// The value associated with the key
    pub(crate) value: V,
}

/// Owning iterator over the live slots of a storage.
pub(crate) type IntoSlots<K, V> = Flatten<vec::IntoIter<Option<Slot<K, V>>>>;

/// Two parallel buffers of `capacity` entries.
///
/// `ctrl[i]` is Full iff `slots[i]` is `Some`. The control buffer is padded
/// with `SENTINEL` bytes up to a whole number of groups.
#[derive(Debug, Clone)]
pub(crate) struct SlotStorage<K, V> {
    /// One control byte per slot, plus padding.
    ctrl: Box<[u8]>,
    /// Key-value pairs; `None` for empty and deleted slots.
    slots: Box<[Option<Slot<K, V>>]>,
    /// Lanes of a group that map to real slots.
    tail: BitMask,
}

impl<K, V> SlotStorage<K, V> {
    /// Allocates storage for `capacity` slots, rounded up to a power of two.
    ///
    /// # Panics
    ///
    /// Panics if the rounded capacity overflows `usize`. Aborts through
    /// `handle_alloc_error` if the allocator fails.
    pub(crate) fn new(capacity: usize) -> Self {
        or_abort(Self::try_new(capacity))
    }

    /// Allocates storage for `capacity` slots, rounded up to a power of two.
    pub(crate) fn try_new(capacity: usize) -> Result<Self> {
        let capacity = capacity.max(1).checked_next_power_of_two().ok_or(Error::CapacityOverflow)?;
        let ctrl_len = capacity
            .div_ceil(GROUP_WIDTH)
            .checked_mul(GROUP_WIDTH)
            .ok_or(Error::CapacityOverflow)?;

        let mut ctrl = Vec::new();
        try_reserve_exact(&mut ctrl, ctrl_len)?;
        ctrl.resize(capacity, EMPTY);
        ctrl.resize(ctrl_len, SENTINEL);

        let mut slots = Vec::new();
        try_reserve_exact(&mut slots, capacity)?;
        slots.resize_with(capacity, || None);

        let tail = if capacity >= GROUP_WIDTH {
            BitMask::FULL
        } else {
            BitMask(BitMaskWord::MAX >> GROUP_WIDTH.saturating_sub(capacity))
        };

        Ok(Self { ctrl: ctrl.into_boxed_slice(), slots: slots.into_boxed_slice(), tail })
    }

    /// Number of slots.
    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of groups covering the control buffer; always a power of two.
    #[inline]
    pub(crate) fn group_count(&self) -> usize {
        self.ctrl.len() / GROUP_WIDTH
    }

    /// Loads group `group_index`.
    #[inline]
    pub(crate) fn group(&self, group_index: usize) -> Group {
        Group::load(&self.ctrl, group_index.saturating_mul(GROUP_WIDTH))
    }

    /// Lanes of any group that correspond to real slots.
    #[inline]
    pub(crate) fn tail_mask(&self) -> BitMask {
        self.tail
    }

    /// Classified control byte of slot `index`.
    #[inline]
    pub(crate) fn ctrl(&self, index: usize) -> Ctrl {
        self.ctrl.get(index).map_or(Ctrl::Sentinel, |&byte| Ctrl::classify(byte))
    }

    /// Pair stored in slot `index`, if it is Full.
    #[inline]
    pub(crate) fn slot(&self, index: usize) -> Option<&Slot<K, V>> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Mutable access to the pair stored in slot `index`, if it is Full.
    #[inline]
    pub(crate) fn slot_mut(&mut self, index: usize) -> Option<&mut Slot<K, V>> {
        self.slots.get_mut(index).and_then(Option::as_mut)
    }

    /// Writes `slot` at `index` and marks it Full with `tag`.
    ///
    /// Returns the state the slot was in before.
    pub(crate) fn put(&mut self, index: usize, tag: u8, slot: Slot<K, V>) -> Ctrl {
        debug_assert!(is_full(tag));
        let previous = self.ctrl(index);
        if let (Some(ctrl), Some(entry)) = (self.ctrl.get_mut(index), self.slots.get_mut(index)) {
            *ctrl = tag;
            *entry = Some(slot);
        }
        previous
    }

    /// Moves the pair out of slot `index`, leaving a tombstone.
    pub(crate) fn take(&mut self, index: usize) -> Option<Slot<K, V>> {
        let ctrl = self.ctrl.get_mut(index)?;
        if !is_full(*ctrl) {
            return None;
        }
        *ctrl = DELETED;
        self.slots.get_mut(index).and_then(Option::take)
    }

    /// Marks every slot Empty and drops all pairs.
    pub(crate) fn clear(&mut self) {
        self.reset_ctrl();
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }

    /// Sets the control byte of every real slot to `EMPTY`.
    fn reset_ctrl(&mut self) {
        let capacity = self.capacity();
        self.ctrl.iter_mut().take(capacity).for_each(|byte| *byte = EMPTY);
    }

    /// Indices of live slots in control-array order.
    pub(crate) fn full_indices(&self) -> FullIndices<'_> {
        FullIndices { ctrl: &self.ctrl, base: 0, lanes: BitMask(0).into_iter() }
    }

    /// All slots in index order, `None` for free ones.
    pub(crate) fn slots(&self) -> &[Option<Slot<K, V>>] {
        &self.slots
    }

    /// All slots in index order, mutably.
    pub(crate) fn slots_mut(&mut self) -> &mut [Option<Slot<K, V>>] {
        &mut self.slots
    }

    /// Consumes the storage, yielding every live pair.
    pub(crate) fn into_slots(self) -> IntoSlots<K, V> {
        Vec::from(self.slots).into_iter().flatten()
    }
}

/// Scans the control buffer group by group and yields the index of every Full slot.
#[derive(Debug, Clone)]
pub(crate) struct FullIndices<'a> {
    /// Control buffer being scanned.
    ctrl: &'a [u8],
    /// Offset of the group after the one `lanes` was taken from.
    base: usize,
    /// Remaining Full lanes of the current group.
    lanes: BitMaskIter,
}

impl Iterator for FullIndices<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        loop {
            if let Some(lane) = self.lanes.next() {
                return Some(self.base.saturating_sub(GROUP_WIDTH).saturating_add(lane));
            }
            if self.base >= self.ctrl.len() {
                return None;
            }
            self.lanes = Group::load(self.ctrl, self.base).match_full().into_iter();
            self.base = self.base.saturating_add(GROUP_WIDTH);
        }
    }
}

/// Reserves exactly `len` elements, reporting failure instead of aborting.
fn try_reserve_exact<T>(buffer: &mut Vec<T>, len: usize) -> Result<()> {
    let layout = Layout::array::<T>(len).map_err(|_| Error::CapacityOverflow)?;
    buffer.try_reserve_exact(len).map_err(|_| Error::AllocFailed { layout })
}

/// Unwraps an allocation result the way `std` collections do: abort on
/// allocator failure, panic on capacity overflow.
///
/// # Panics
///
/// Panics on any error other than `Error::AllocFailed`.
#[allow(clippy::panic)]
pub(crate) fn or_abort<T>(result: Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(Error::AllocFailed { layout }) => handle_alloc_error(layout),
        Err(err) => panic!("{err}"),
    }
}
