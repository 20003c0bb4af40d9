use std::{
    borrow::Borrow,
    collections::hash_map::RandomState,
    fmt,
    hash::{BuildHasher, Hash},
    iter::FusedIterator,
    marker::PhantomData,
    mem, slice,
};

use crate::{
    config::TableConfig,
    control::{self, Ctrl},
    error::{Error, Result},
    group::GROUP_WIDTH,
    probe::{LinearProbe, ProbePolicy, ProbeSeq},
    storage::{FullIndices, IntoSlots, Slot, SlotStorage, or_abort},
};

/// An open-addressing hash map storing its entries in one flat slot array.
///
/// Every slot has a control byte holding either a 7-bit fragment of the
/// entry's hash or an Empty/Deleted marker. Lookups compare sixteen control
/// bytes at a time and only touch the slots whose fragment matches.
///
/// Inserting a key that is already present replaces its value and returns the
/// old one. Removal leaves a tombstone so that probe chains running through
/// the slot stay intact; tombstones are dropped whenever the table is rebuilt.
///
/// The map grows by `growth_factor` before an insertion would push the number
/// of live entries above `max_load_percent` of the capacity, so a probe always
/// meets an empty slot.
///
/// Note: This implementation is not thread-safe. Wrap it in a lock to share it.
pub struct FlatHashMap<K, V, S = RandomState, P = LinearProbe> {
    /// Control bytes and key-value slots
    storage: SlotStorage<K, V>,
    /// Number of live entries
    len: usize,
    /// Number of deleted slots not yet reclaimed by a rebuild
    tombstones: usize,
    /// Per-table salt mixed into the probe start of every hash
    salt: u64,
    /// Hasher factory for keys
    hash_builder: S,
    /// Probing policy shared by insert, lookup and rebuild
    probe: P,
    /// Load limit, growth factor and initial capacity
    config: TableConfig,
}

impl<K, V> FlatHashMap<K, V, RandomState, LinearProbe> {
    /// Creates an empty `FlatHashMap` with 16 slots
    #[must_use]
    pub fn new() -> Self {
        Self::with_hasher(RandomState::new())
    }

    /// Creates an empty `FlatHashMap` with at least `capacity` slots.
    ///
    /// The capacity is rounded up to a power of two.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, RandomState::new())
    }
}

impl<K, V, S, P: ProbePolicy> FlatHashMap<K, V, S, P> {
    /// Creates an empty map with the default capacity which hashes keys with `hash_builder`.
    #[must_use]
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_capacity_and_hasher(crate::config::DEFAULT_CAPACITY, hash_builder)
    }

    /// Creates an empty map with at least `capacity` slots which hashes keys with `hash_builder`.
    #[must_use]
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        let config = TableConfig::default().with_initial_capacity(capacity);
        Self::from_parts(config, SlotStorage::new(capacity), hash_builder)
    }

    /// Creates an empty map from explicit parameters.
    ///
    /// # Errors
    ///
    /// Fails if the configuration does not validate, or if the initial storage
    /// cannot be allocated.
    pub fn with_config(config: TableConfig, hash_builder: S) -> Result<Self> {
        config.validate()?;
        let storage = SlotStorage::try_new(config.initial_capacity)?;
        Ok(Self::from_parts(config, storage, hash_builder))
    }

    /// Assembles an empty map around freshly allocated storage.
    fn from_parts(config: TableConfig, storage: SlotStorage<K, V>, hash_builder: S) -> Self {
        Self {
            storage,
            len: 0,
            tombstones: 0,
            salt: config.seed.unwrap_or_else(rand::random),
            hash_builder,
            probe: P::default(),
            config,
        }
    }

    /// Returns the number of entries in the map
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the map holds no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of slots
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    /// Returns the number of deleted slots waiting to be reclaimed
    #[must_use]
    pub fn tombstones(&self) -> usize {
        self.tombstones
    }

    /// Returns the ratio of live entries to slots
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn load_factor(&self) -> f64 {
        self.len as f64 / self.capacity() as f64
    }

    /// Returns the map's hasher factory
    #[must_use]
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Returns the parameters the map was built with
    #[must_use]
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Returns an iterator over the key-value pairs, in slot order
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            indices: self.storage.full_indices(),
            slots: self.storage.slots(),
            remaining: self.len,
        }
    }

    /// Returns an iterator over the key-value pairs with mutable values
    #[must_use]
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut { inner: self.storage.slots_mut().iter_mut(), remaining: self.len }
    }

    /// Returns an iterator over the keys
    #[must_use]
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values
    #[must_use]
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Returns an iterator over mutable references to the values
    #[must_use]
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut { inner: self.iter_mut() }
    }

    /// Removes every entry, keeping the allocated capacity
    pub fn clear(&mut self) {
        self.storage.clear();
        self.len = 0;
        self.tombstones = 0;
    }

    /// Removes every entry and yields it, keeping the capacity.
    ///
    /// The map is emptied up front: entries not consumed when the iterator is
    /// dropped or forgotten never reappear in the map.
    pub fn drain(&mut self) -> Drain<'_, K, V> {
        let fresh = SlotStorage::new(self.capacity());
        let old = mem::replace(&mut self.storage, fresh);
        let remaining = mem::take(&mut self.len);
        self.tombstones = 0;
        Drain { inner: old.into_slots(), remaining, marker: PhantomData }
    }

    /// Keeps only the entries for which `keep` returns true
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        for index in 0..self.storage.capacity() {
            let drop_it = self
                .storage
                .slot_mut(index)
                .is_some_and(|slot| !keep(&slot.key, &mut slot.value));
            if drop_it && self.storage.take(index).is_some() {
                self.len = self.len.saturating_sub(1);
                self.tombstones = self.tombstones.saturating_add(1);
            }
        }
    }

    /// Group indices visited when probing for `hash`.
    fn probe_seq(&self, hash: u64) -> ProbeSeq<'_, P> {
        ProbeSeq::new(&self.probe, control::h1(hash, self.salt), self.storage.group_count())
    }

    /// First Empty or Deleted slot on the probe chain of `hash`.
    fn find_insert_index(&self, hash: u64) -> Option<usize> {
        let tail = self.storage.tail_mask();
        for group_index in self.probe_seq(hash) {
            let free = self.storage.group(group_index).match_empty_or_deleted().and(tail);
            if let Some(lane) = free.lowest_set_bit() {
                return Some(group_index.saturating_mul(GROUP_WIDTH).saturating_add(lane));
            }
        }
        None
    }
}

impl<K, V, S, P> FlatHashMap<K, V, S, P>
where
    K: Eq + Hash,
    S: BuildHasher,
    P: ProbePolicy,
{
    /// Hashes a key, or anything it borrows as, with the map's hasher.
    fn hash<Q: Hash + ?Sized>(&self, key: &Q) -> u64 {
        self.hash_builder.hash_one(key)
    }

    /// Slot index holding `key`, if present.
    ///
    /// Stops at the first group containing an Empty slot: insertion never
    /// skips one, so the key cannot live further down the chain.
    fn find_index<Q>(&self, hash: u64, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let tag = control::h2(hash);
        for group_index in self.probe_seq(hash) {
            let group = self.storage.group(group_index);
            let base = group_index.saturating_mul(GROUP_WIDTH);
            for lane in group.match_byte(tag) {
                let index = base.saturating_add(lane);
                if self.storage.slot(index).is_some_and(|slot| slot.key.borrow() == key) {
                    return Some(index);
                }
            }
            if group.match_empty().any_bit_set() {
                return None;
            }
        }
        None
    }

    /// Insert a key-value pair into the map.
    ///
    /// If the key was already present its value is replaced and the old value
    /// returned; the stored key is left untouched.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.hash(&key);
        if let Some(index) = self.find_index(hash, &key) {
            return self.storage.slot_mut(index).map(|slot| mem::replace(&mut slot.value, value));
        }
        self.insert_new(hash, Slot { key, value });
        None
    }

    /// Inserts the pair only if the key is absent. Returns whether it was inserted.
    pub fn insert_if_absent(&mut self, key: K, value: V) -> bool {
        let hash = self.hash(&key);
        if self.find_index(hash, &key).is_some() {
            return false;
        }
        self.insert_new(hash, Slot { key, value });
        true
    }

    /// Places a pair whose key is known to be absent.
    fn insert_new(&mut self, hash: u64, slot: Slot<K, V>) {
        self.reserve_one();
        let index = loop {
            if let Some(index) = self.find_insert_index(hash) {
                break index;
            }
            // Only reachable if the table ran out of free slots; make room and retry.
            let capacity = or_abort(
                self.capacity().checked_mul(self.config.growth_factor).ok_or(Error::CapacityOverflow),
            );
            self.resize(capacity);
        };
        if self.storage.put(index, control::h2(hash), slot) == Ctrl::Deleted {
            self.tombstones = self.tombstones.saturating_sub(1);
        }
        self.len = self.len.saturating_add(1);
    }

    /// Makes sure one more entry can be placed without breaking the load limit.
    fn reserve_one(&mut self) {
        let needed = self.len.saturating_add(1);
        let capacity = self.capacity();
        if self.config.exceeds_load(needed, capacity) {
            let grown = or_abort(
                self.config.grown_capacity(capacity, needed).ok_or(Error::CapacityOverflow),
            );
            log::debug!("growing table from {capacity} to {grown} slots at {} entries", self.len);
            self.resize(grown);
        } else if self.config.exceeds_load(needed.saturating_add(self.tombstones), capacity) {
            log::debug!("purging {} tombstones at {capacity} slots", self.tombstones);
            self.resize(capacity);
        }
    }

    /// Rebuilds the table with `capacity` slots.
    fn resize(&mut self, capacity: usize) {
        self.rebuild(SlotStorage::new(capacity));
    }

    /// Moves every live entry into `fresh`, which becomes the table's storage.
    fn rebuild(&mut self, fresh: SlotStorage<K, V>) {
        let old = mem::replace(&mut self.storage, fresh);
        self.len = 0;
        self.tombstones = 0;
        for slot in old.into_slots() {
            let hash = self.hash(&slot.key);
            self.insert_new(hash, slot);
        }
    }

    /// Retrieve a reference to the value for a given key
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_key_value(key).map(|(_, value)| value)
    }

    /// Retrieve the stored key and the value for a given key
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.find_index(self.hash(key), key)?;
        self.storage.slot(index).map(|slot| (&slot.key, &slot.value))
    }

    /// Get a mutable reference to the value for a given key
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.find_index(self.hash(key), key)?;
        self.storage.slot_mut(index).map(|slot| &mut slot.value)
    }

    /// Returns true if the map contains the given key
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find_index(self.hash(key), key).is_some()
    }

    /// Number of groups a lookup for `key` loads before reaching its slot.
    pub(crate) fn probe_length<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash(key);
        let target = self.find_index(hash, key)? / GROUP_WIDTH;
        self.probe_seq(hash).position(|group| group == target).map(|steps| steps.saturating_add(1))
    }

    /// Removes a key from the map, returning its value
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// Removes a key from the map, returning the stored key and its value.
    ///
    /// The slot becomes a tombstone rather than Empty, so lookups for keys
    /// placed further along the same chain still reach them.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.find_index(self.hash(key), key)?;
        let slot = self.storage.take(index)?;
        self.len = self.len.saturating_sub(1);
        self.tombstones = self.tombstones.saturating_add(1);
        Some((slot.key, slot.value))
    }

    /// Grows the table by its growth factor and re-places every live entry.
    ///
    /// Tombstones are discarded in the process.
    ///
    /// # Panics
    ///
    /// Panics if the new capacity overflows `usize`.
    pub fn rehash(&mut self) {
        let capacity = self.capacity();
        let grown =
            or_abort(capacity.checked_mul(self.config.growth_factor).ok_or(Error::CapacityOverflow));
        log::trace!("rehashing {} entries from {capacity} to {grown} slots", self.len);
        self.resize(grown);
    }

    /// Makes room for at least `additional` more entries without further growth.
    ///
    /// # Panics
    ///
    /// Panics if the required capacity overflows `usize`.
    pub fn reserve(&mut self, additional: usize) {
        or_abort(self.try_reserve(additional));
    }

    /// Makes room for at least `additional` more entries without further growth.
    ///
    /// # Errors
    ///
    /// Returns `Error::CapacityOverflow` if the required capacity does not fit
    /// in `usize`, and `Error::AllocFailed` if the allocator refuses the new
    /// storage. The map is left unchanged on error.
    pub fn try_reserve(&mut self, additional: usize) -> Result<()> {
        let needed = self.len.checked_add(additional).ok_or(Error::CapacityOverflow)?;
        let capacity = self.capacity();
        if !self.config.exceeds_load(needed.saturating_add(self.tombstones), capacity) {
            return Ok(());
        }
        let grown = self.config.grown_capacity(capacity, needed).ok_or(Error::CapacityOverflow)?;
        let fresh = SlotStorage::try_new(grown)?;
        log::debug!("reserving {additional} entries: {capacity} -> {} slots", fresh.capacity());
        self.rebuild(fresh);
        Ok(())
    }

    /// Shrinks the table to the smallest capacity that holds the current entries.
    ///
    /// Capacity only ever decreases through this call.
    pub fn shrink_to_fit(&mut self) {
        let capacity = self.capacity();
        if let Some(target) = self.config.grown_capacity(1, self.len)
            && target < capacity
        {
            log::trace!("shrinking table from {capacity} to {target} slots");
            self.resize(target);
        }
    }
}

impl<K, V> Default for FlatHashMap<K, V, RandomState, LinearProbe> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S, P> Clone for FlatHashMap<K, V, S, P>
where
    K: Clone,
    V: Clone,
    S: Clone,
    P: Clone,
{
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            len: self.len,
            tombstones: self.tombstones,
            salt: self.salt,
            hash_builder: self.hash_builder.clone(),
            probe: self.probe.clone(),
            config: self.config,
        }
    }
}

impl<K, V, S, P> fmt::Debug for FlatHashMap<K, V, S, P>
where
    K: fmt::Debug,
    V: fmt::Debug,
    P: ProbePolicy,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S, P> PartialEq for FlatHashMap<K, V, S, P>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
    P: ProbePolicy,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.iter().all(|(key, value)| other.get(key).is_some_and(|theirs| value == theirs))
    }
}

impl<K, V, S, P> Eq for FlatHashMap<K, V, S, P>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
    P: ProbePolicy,
{
}

impl<K, V, S, P> Extend<(K, V)> for FlatHashMap<K, V, S, P>
where
    K: Eq + Hash,
    S: BuildHasher,
    P: ProbePolicy,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, S, P> FromIterator<(K, V)> for FlatHashMap<K, V, S, P>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
    P: ProbePolicy,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::with_hasher(S::default());
        map.extend(iter);
        map
    }
}

impl<'a, K, V, S, P: ProbePolicy> IntoIterator for &'a FlatHashMap<K, V, S, P> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V, S, P: ProbePolicy> IntoIterator for &'a mut FlatHashMap<K, V, S, P> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}

impl<K, V, S, P> IntoIterator for FlatHashMap<K, V, S, P> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> IntoIter<K, V> {
        IntoIter { remaining: self.len, inner: self.storage.into_slots() }
    }
}

/// Iterator over the key-value pairs of a `FlatHashMap`.
///
/// Walks the control bytes group by group and yields the Full slots.
#[derive(Debug)]
pub struct Iter<'a, K, V> {
    /// Indices of Full slots
    indices: FullIndices<'a>,
    /// Slots the indices point into
    slots: &'a [Option<Slot<K, V>>],
    /// Entries not yet yielded
    remaining: usize,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self { indices: self.indices.clone(), slots: self.slots, remaining: self.remaining }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let slots = self.slots;
        for index in self.indices.by_ref() {
            if let Some(Some(slot)) = slots.get(index) {
                self.remaining = self.remaining.saturating_sub(1);
                return Some((&slot.key, &slot.value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Iterator over the key-value pairs of a `FlatHashMap`, with mutable values.
#[derive(Debug)]
pub struct IterMut<'a, K, V> {
    /// Remaining slots
    inner: slice::IterMut<'a, Option<Slot<K, V>>>,
    /// Entries not yet yielded
    remaining: usize,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.inner.by_ref().find_map(Option::as_mut)?;
        self.remaining = self.remaining.saturating_sub(1);
        Some((&slot.key, &mut slot.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// Owning iterator over the entries of a `FlatHashMap`.
pub struct IntoIter<K, V> {
    /// Remaining live slots
    inner: IntoSlots<K, V>,
    /// Entries not yet yielded
    remaining: usize,
}

impl<K, V> fmt::Debug for IntoIter<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntoIter").field("remaining", &self.remaining).finish_non_exhaustive()
    }
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        let slot = self.inner.next()?;
        self.remaining = self.remaining.saturating_sub(1);
        Some((slot.key, slot.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}

/// Draining iterator returned by `FlatHashMap::drain`.
pub struct Drain<'a, K, V> {
    /// Live slots taken out of the map
    inner: IntoSlots<K, V>,
    /// Entries not yet yielded
    remaining: usize,
    /// Holds the map borrowed while draining
    marker: PhantomData<&'a mut SlotStorage<K, V>>,
}

impl<K, V> fmt::Debug for Drain<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Drain").field("remaining", &self.remaining).finish_non_exhaustive()
    }
}

impl<K, V> Iterator for Drain<'_, K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        let slot = self.inner.next()?;
        self.remaining = self.remaining.saturating_sub(1);
        Some((slot.key, slot.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Drain<'_, K, V> {}
impl<K, V> FusedIterator for Drain<'_, K, V> {}

/// Iterator over the keys of a `FlatHashMap`.
#[derive(Debug)]
pub struct Keys<'a, K, V> {
    /// Underlying pair iterator
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

/// Iterator over the values of a `FlatHashMap`.
#[derive(Debug)]
pub struct Values<'a, K, V> {
    /// Underlying pair iterator
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

/// Iterator over mutable references to the values of a `FlatHashMap`.
#[derive(Debug)]
pub struct ValuesMut<'a, K, V> {
    /// Underlying pair iterator
    inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<&'a mut V> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::TriangularProbe;
    use proptest::prelude::*;
    use std::{
        collections::HashMap,
        hash::{BuildHasherDefault, Hasher},
    };

    /// Hasher sending every key to the same probe start and the same tag.
    #[derive(Debug, Default)]
    struct ConstantHasher;

    impl Hasher for ConstantHasher {
        fn finish(&self) -> u64 {
            0x2a
        }

        fn write(&mut self, _bytes: &[u8]) {}
    }

    type Colliding<K, V> = FlatHashMap<K, V, BuildHasherDefault<ConstantHasher>>;

    fn seeded<K, V>(capacity: usize) -> FlatHashMap<K, V> {
        let config = TableConfig::default().with_initial_capacity(capacity).with_seed(0x5eed);
        let Ok(map) = FlatHashMap::with_config(config, RandomState::new()) else {
            panic!("valid config rejected: {config:?}");
        };
        map
    }

    #[test]
    fn test_insert_and_get() {
        let mut map = FlatHashMap::new();
        assert_eq!(map.insert("key1".to_string(), 1), None);
        assert_eq!(map.insert("key2".to_string(), 2), None);
        assert_eq!(map.insert("key3".to_string(), 3), None);

        assert_eq!(map.get("key1"), Some(&1));
        assert_eq!(map.get("key2"), Some(&2));
        assert_eq!(map.get("key3"), Some(&3));
        assert_eq!(map.get("key4"), None);
    }

    #[test]
    fn test_update() {
        let mut map = FlatHashMap::new();
        assert_eq!(map.insert("key1".to_string(), 1), None);
        assert_eq!(map.insert("key1".to_string(), 10), Some(1));
        assert_eq!(map.get("key1"), Some(&10));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_insert_if_absent_rejects_duplicates() {
        let mut map = FlatHashMap::new();
        assert!(map.insert_if_absent(7, "first"));
        assert!(!map.insert_if_absent(7, "second"));
        assert_eq!(map.get(&7), Some(&"first"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_small_table_grows() {
        let mut map = FlatHashMap::with_capacity(4);
        for (key, value) in [(1, 2), (2, 3), (3, 4), (4, 5)] {
            map.insert(key, value);
        }
        assert_eq!(map.get(&1), Some(&2));
        assert_eq!(map.get(&2), Some(&3));
        assert_eq!(map.get(&3), Some(&4));
        assert_eq!(map.get(&4), Some(&5));
        assert!(map.capacity() > 4);
    }

    #[test]
    fn test_thousand_sequential_keys() {
        let mut map = FlatHashMap::new();
        for i in 0..1000 {
            map.insert(i, i);
        }
        assert_eq!(map.len(), 1000);
        for i in 0..1000 {
            assert_eq!(map.get(&i), Some(&i));
        }
        assert_eq!(map.get(&1000), None);
    }

    #[test]
    fn test_rehash_empty_doubles_capacity() {
        let mut map: FlatHashMap<u64, u64> = FlatHashMap::with_capacity(4);
        map.rehash();
        assert_eq!(map.capacity(), 8);
        assert_eq!(map.len(), 0);
        assert!(map.is_empty());
    }

    #[test]
    fn test_rehash_keeps_entries_and_drops_tombstones() {
        let mut map = FlatHashMap::with_capacity(32);
        for i in 0..10 {
            map.insert(i, i * 10);
        }
        map.remove(&3);
        map.remove(&4);
        assert_eq!(map.tombstones(), 2);

        map.rehash();
        assert_eq!(map.capacity(), 64);
        assert_eq!(map.tombstones(), 0);
        assert_eq!(map.len(), 8);
        for i in (0..10).filter(|i| *i != 3 && *i != 4) {
            assert_eq!(map.get(&i), Some(&(i * 10)));
        }
    }

    #[test]
    fn test_remove() {
        let mut map = FlatHashMap::new();
        map.insert("key1".to_string(), 1);
        map.insert("key2".to_string(), 2);

        assert_eq!(map.remove("key1"), Some(1));
        assert_eq!(map.get("key1"), None);
        assert_eq!(map.get("key2"), Some(&2));
        assert_eq!(map.remove("key1"), None);
        assert_eq!(map.tombstones(), 1);
    }

    #[test]
    fn test_remove_entry_returns_stored_key() {
        let mut map = FlatHashMap::new();
        map.insert("alpha".to_string(), 1);
        assert_eq!(map.remove_entry("alpha"), Some(("alpha".to_string(), 1)));
        assert!(map.is_empty());
    }

    #[test]
    fn test_tombstone_reuse() {
        let mut map: Colliding<u32, &str> =
            FlatHashMap::with_capacity_and_hasher(16, BuildHasherDefault::default());
        map.insert(1, "one");
        assert_eq!(map.remove(&1), Some("one"));
        assert_eq!(map.tombstones(), 1);

        map.insert(2, "two");
        assert_eq!(map.tombstones(), 0);
        assert_eq!(map.get(&1), None);
        assert_eq!(map.get(&2), Some(&"two"));
    }

    #[test]
    fn test_tombstones_do_not_end_probe_chains() {
        let mut map: Colliding<u32, u32> =
            FlatHashMap::with_capacity_and_hasher(64, BuildHasherDefault::default());
        for i in 0..20 {
            map.insert(i, i);
        }
        for i in 0..10 {
            map.remove(&i);
        }
        for i in 10..20 {
            assert_eq!(map.get(&i), Some(&i));
        }
        for i in 0..10 {
            assert_eq!(map.get(&i), None);
        }
    }

    #[test]
    fn test_full_collisions_still_correct() {
        let mut map: Colliding<u32, u32> =
            FlatHashMap::with_capacity_and_hasher(4, BuildHasherDefault::default());
        for i in 0..200 {
            map.insert(i, i + 1);
        }
        for i in 0..200 {
            assert_eq!(map.get(&i), Some(&(i + 1)));
        }
        assert_eq!(map.get(&200), None);
    }

    #[test]
    fn test_churn_purges_tombstones_in_place() {
        let mut map = FlatHashMap::with_capacity(16);
        for round in 0..100 {
            map.insert(round, round);
            map.remove(&round);
        }
        assert!(map.is_empty());
        assert_eq!(map.capacity(), 16);
        assert!(map.tombstones() <= 8);
    }

    #[test]
    fn test_capacity_never_shrinks_implicitly() {
        let mut map = FlatHashMap::with_capacity(4);
        let mut last = map.capacity();
        for i in 0..500 {
            map.insert(i, ());
            assert!(map.capacity() >= last);
            last = map.capacity();
        }
        for i in 0..500 {
            map.remove(&i);
            assert_eq!(map.capacity(), last);
        }
    }

    #[test]
    fn test_load_factor_stays_under_limit() {
        let mut map = FlatHashMap::with_capacity(1);
        for i in 0..300 {
            map.insert(i, i);
            assert!(map.load_factor() <= 0.5);
        }
    }

    #[test]
    fn test_get_mut() {
        let mut map = FlatHashMap::new();
        map.insert("key1".to_string(), 1);

        if let Some(value) = map.get_mut("key1") {
            *value += 10;
        }

        assert_eq!(map.get("key1"), Some(&11));
        assert_eq!(map.get_mut("missing"), None);
    }

    #[test]
    fn test_iter() {
        let mut map = FlatHashMap::new();
        map.insert("key1".to_string(), 1);
        map.insert("key2".to_string(), 2);
        map.insert("key3".to_string(), 3);
        map.remove("key2");

        let iter = map.iter();
        assert_eq!(iter.len(), 2);

        let mut count = 0;
        let mut sum = 0;
        for (_, &value) in &map {
            count += 1;
            sum += value;
        }

        assert_eq!(count, 2);
        assert_eq!(sum, 4);
    }

    #[test]
    fn test_iter_is_restartable() {
        let map: FlatHashMap<u32, u32> = (0..50).map(|i| (i, i)).collect();
        let first: Vec<(u32, u32)> = map.iter().map(|(k, v)| (*k, *v)).collect();
        let second: Vec<(u32, u32)> = map.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 50);
    }

    #[test]
    fn test_iter_mut_and_values_mut() {
        let mut map: FlatHashMap<u32, u32> = (0..10).map(|i| (i, i)).collect();
        for (_, value) in map.iter_mut() {
            *value *= 2;
        }
        for value in map.values_mut() {
            *value += 1;
        }
        for i in 0..10 {
            assert_eq!(map.get(&i), Some(&(i * 2 + 1)));
        }
    }

    #[test]
    fn test_keys_and_values() {
        let mut map = FlatHashMap::new();
        map.insert("a".to_string(), 1);
        map.insert("b".to_string(), 2);
        map.insert("c".to_string(), 3);

        let mut keys: Vec<String> = map.keys().cloned().collect();
        keys.sort();

        let mut values: Vec<i32> = map.values().copied().collect();
        values.sort_unstable();

        assert_eq!(keys, vec!["a".to_string(), "b".to_string(), "c".to_string()]);
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn test_into_iter() {
        let map: FlatHashMap<u32, String> = (0..20).map(|i| (i, i.to_string())).collect();
        let mut pairs: Vec<(u32, String)> = map.into_iter().collect();
        pairs.sort();
        assert_eq!(pairs.len(), 20);
        assert_eq!(pairs[7], (7, "7".to_string()));
    }

    #[test]
    fn test_drain() {
        let mut map: FlatHashMap<u32, u32> = (0..20).map(|i| (i, i)).collect();
        let capacity = map.capacity();
        let mut drained: Vec<u32> = map.drain().map(|(k, _)| k).collect();
        drained.sort_unstable();
        assert_eq!(drained, (0..20).collect::<Vec<_>>());
        assert!(map.is_empty());
        assert_eq!(map.capacity(), capacity);
        assert_eq!(map.get(&3), None);

        map.insert(3, 30);
        assert_eq!(map.get(&3), Some(&30));
    }

    #[test]
    fn test_partial_drain_clears_map() {
        let mut map: FlatHashMap<u32, String> = (0..20).map(|i| (i, i.to_string())).collect();
        let first = map.drain().next();
        assert!(first.is_some());
        assert!(map.is_empty());
        assert_eq!(map.iter().count(), 0);
    }

    #[test]
    fn test_forgotten_drain_leaves_no_entries_behind() {
        let mut map: FlatHashMap<u32, u32> = (0..5).map(|i| (i, i)).collect();
        let capacity = map.capacity();
        mem::forget(map.drain());

        assert!(map.is_empty());
        assert_eq!(map.capacity(), capacity);
        assert_eq!(map.iter().count(), 0);
        assert_eq!(map.iter_mut().count(), 0);
        assert_eq!(map.values_mut().count(), 0);

        let mut visited = 0;
        map.retain(|_, _| {
            visited += 1;
            true
        });
        assert_eq!(visited, 0);

        map.insert(2, 20);
        assert_eq!(map.get(&2), Some(&20));
        assert_eq!(map.iter_mut().count(), 1);
    }

    #[test]
    fn test_retain() {
        let mut map: FlatHashMap<u32, u32> = (0..100).map(|i| (i, i)).collect();
        map.retain(|key, _| key % 3 == 0);
        assert_eq!(map.len(), 34);
        assert_eq!(map.get(&3), Some(&3));
        assert_eq!(map.get(&4), None);
    }

    #[test]
    fn test_len_and_is_empty() {
        let mut map = FlatHashMap::new();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);

        map.insert("key1".to_string(), 1);
        assert!(!map.is_empty());
        assert_eq!(map.len(), 1);

        map.insert("key2".to_string(), 2);
        assert_eq!(map.len(), 2);

        map.remove("key1");
        assert_eq!(map.len(), 1);

        map.remove("key2");
        assert!(map.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut map = FlatHashMap::new();
        map.insert("key1".to_string(), 1);
        map.insert("key2".to_string(), 2);
        map.remove("key2");

        map.clear();

        assert_eq!(map.len(), 0);
        assert_eq!(map.tombstones(), 0);
        assert_eq!(map.get("key1"), None);
        assert_eq!(map.get("key2"), None);
    }

    #[test]
    fn test_reserve_prevents_growth() {
        let mut map = FlatHashMap::new();
        map.reserve(100);
        let capacity = map.capacity();
        assert!(capacity >= 200);
        for i in 0..100 {
            map.insert(i, i);
        }
        assert_eq!(map.capacity(), capacity);
    }

    #[test]
    fn test_try_reserve_overflow() {
        let mut map: FlatHashMap<u64, u64> = FlatHashMap::new();
        map.insert(1, 1);
        assert_eq!(map.try_reserve(usize::MAX), Err(Error::CapacityOverflow));
        assert_eq!(map.get(&1), Some(&1));
    }

    #[test]
    fn test_shrink_to_fit() {
        let mut map: FlatHashMap<u32, u32> = (0..200).map(|i| (i, i)).collect();
        for i in 10..200 {
            map.remove(&i);
        }
        map.shrink_to_fit();
        assert_eq!(map.capacity(), 32);
        for i in 0..10 {
            assert_eq!(map.get(&i), Some(&i));
        }
    }

    #[test]
    fn test_with_config() {
        let config = TableConfig::default()
            .with_initial_capacity(8)
            .with_max_load_percent(75)
            .with_growth_factor(4);
        let Ok(mut map): Result<FlatHashMap<u32, u32>> =
            FlatHashMap::with_config(config, RandomState::new())
        else {
            panic!("valid config rejected: {config:?}");
        };
        assert_eq!(map.config(), &config);
        for i in 0..6 {
            map.insert(i, i);
        }
        assert_eq!(map.capacity(), 8);
        map.insert(6, 6);
        assert_eq!(map.capacity(), 32);
    }

    #[test]
    fn test_with_config_rejects_invalid() {
        let config = TableConfig::default().with_max_load_percent(100);
        let result: Result<FlatHashMap<u32, u32>> =
            FlatHashMap::with_config(config, RandomState::new());
        assert_eq!(result.err(), Some(Error::InvalidLoadFactor(100)));
    }

    #[test]
    fn test_seed_makes_layout_reproducible() {
        let hasher = BuildHasherDefault::<std::collections::hash_map::DefaultHasher>::default();
        let config = TableConfig::default().with_seed(42);
        let build = || {
            let Ok(mut map): Result<FlatHashMap<u32, u32, _>> =
                FlatHashMap::with_config(config, hasher.clone())
            else {
                panic!("valid config rejected: {config:?}");
            };
            for i in 0..40 {
                map.insert(i, i);
            }
            map.keys().copied().collect::<Vec<u32>>()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn test_triangular_probe_map() {
        let mut map: FlatHashMap<u32, u32, RandomState, TriangularProbe> =
            FlatHashMap::with_hasher(RandomState::new());
        for i in 0..1000 {
            map.insert(i, i * 3);
        }
        for i in 0..1000 {
            assert_eq!(map.get(&i), Some(&(i * 3)));
        }
    }

    #[test]
    fn test_eq_clone_and_debug() {
        let mut map = seeded(16);
        map.insert(1, "one");
        let copy = map.clone();
        assert_eq!(map, copy);
        assert_eq!(format!("{map:?}"), r#"{1: "one"}"#);

        map.insert(2, "two");
        assert_ne!(map, copy);
    }

    #[test]
    fn test_extend() {
        let mut map = FlatHashMap::new();
        map.extend(vec![(1, 'a'), (2, 'b')]);
        map.extend(vec![(2, 'c')]);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&2), Some(&'c'));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Insert(u16, u32),
        Remove(u16),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (any::<u16>(), any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
            1 => any::<u16>().prop_map(Op::Remove),
        ]
    }

    proptest! {
        #[test]
        fn prop_round_trip(
            keys in prop::collection::hash_set(any::<u64>(), 0..300),
            capacity in 1_usize..64,
        ) {
            let mut map = FlatHashMap::with_capacity(capacity);
            for &key in &keys {
                prop_assert_eq!(map.insert(key, key.wrapping_mul(3)), None);
            }
            prop_assert_eq!(map.len(), keys.len());
            for &key in &keys {
                prop_assert_eq!(map.get(&key), Some(&key.wrapping_mul(3)));
                // Lookups without mutation are stable.
                prop_assert_eq!(map.get(&key), Some(&key.wrapping_mul(3)));
            }
            let absent = (0_u64..).find(|k| !keys.contains(k)).unwrap_or(0);
            prop_assert_eq!(map.get(&absent), None);
        }

        #[test]
        fn prop_matches_std_hash_map(ops in prop::collection::vec(op(), 0..400)) {
            let mut map = FlatHashMap::with_capacity(2);
            let mut model = HashMap::new();
            for op in ops {
                match op {
                    Op::Insert(key, value) => {
                        prop_assert_eq!(map.insert(key, value), model.insert(key, value));
                    }
                    Op::Remove(key) => {
                        prop_assert_eq!(map.remove(&key), model.remove(&key));
                    }
                }
                prop_assert_eq!(map.len(), model.len());
            }
            for (key, value) in &model {
                prop_assert_eq!(map.get(key), Some(value));
            }
            prop_assert_eq!(map.iter().count(), model.len());
        }

        #[test]
        fn prop_growth_preserves_contents(count in 1_usize..500) {
            let mut map = FlatHashMap::with_capacity(4);
            let mut capacities = vec![map.capacity()];
            for i in 0..count {
                map.insert(i, i.to_string());
                capacities.push(map.capacity());
            }
            prop_assert!(capacities.windows(2).all(|pair| pair[0] <= pair[1]));
            for i in 0..count {
                prop_assert_eq!(map.get(&i), Some(&i.to_string()));
            }
        }
    }
}
