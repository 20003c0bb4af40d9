//! Probe-length statistics of a populated table.

use std::hash::{BuildHasher, Hash};

use crate::{FlatHashMap, probe::ProbePolicy};

/// Snapshot of how far lookups travel in a table.
///
/// The probe length of a key is the number of groups a lookup loads before it
/// reaches the key's slot; a key found in its home group has length 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeStats {
    /// Live entries
    pub len: usize,
    /// Slots
    pub capacity: usize,
    /// Deleted slots not yet reclaimed
    pub tombstones: usize,
    /// `len / capacity`
    pub load_factor: f64,
    /// Mean probe length over all live keys; 0 for an empty table
    pub average_probe_length: f64,
    /// Longest probe length of any live key; 0 for an empty table
    pub max_probe_length: usize,
}

impl<K, V, S, P> FlatHashMap<K, V, S, P>
where
    K: Eq + Hash,
    S: BuildHasher,
    P: ProbePolicy,
{
    /// Measures the probe length of every live key.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn probe_stats(&self) -> ProbeStats {
        let (total, max) = self
            .keys()
            .filter_map(|key| self.probe_length(key))
            .fold((0_usize, 0_usize), |(total, max), length| {
                (total.saturating_add(length), max.max(length))
            });

        let average_probe_length =
            if self.is_empty() { 0.0 } else { total as f64 / self.len() as f64 };

        ProbeStats {
            len: self.len(),
            capacity: self.capacity(),
            tombstones: self.tombstones(),
            load_factor: self.load_factor(),
            average_probe_length,
            max_probe_length: max,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::hash::{BuildHasherDefault, Hasher};

    use super::*;

    /// Hasher sending every key to the same home group.
    #[derive(Debug, Default)]
    struct SameHomeHasher(u64);

    impl Hasher for SameHomeHasher {
        fn finish(&self) -> u64 {
            // Low seven bits vary, the probe start does not.
            self.0 & 0x7f
        }

        fn write(&mut self, bytes: &[u8]) {
            for &byte in bytes {
                self.0 = self.0.wrapping_mul(31).wrapping_add(u64::from(byte));
            }
        }
    }

    #[test]
    fn test_empty_table() {
        let map: FlatHashMap<u32, u32> = FlatHashMap::new();
        let stats = map.probe_stats();
        assert_eq!(stats.len, 0);
        assert_eq!(stats.capacity, 16);
        assert!(stats.average_probe_length.abs() < f64::EPSILON);
        assert_eq!(stats.max_probe_length, 0);
    }

    #[test]
    fn test_single_group_table_has_unit_probes() {
        let mut map = FlatHashMap::with_capacity(16);
        for i in 0..8 {
            map.insert(i, i);
        }
        let stats = map.probe_stats();
        assert_eq!(stats.len, 8);
        assert_eq!(stats.max_probe_length, 1);
        assert!((stats.average_probe_length - 1.0).abs() < f64::EPSILON);
        assert!((stats.load_factor - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clustered_keys_spill_into_later_groups() {
        let mut map: FlatHashMap<u32, u32, BuildHasherDefault<SameHomeHasher>> =
            FlatHashMap::with_capacity_and_hasher(128, BuildHasherDefault::default());
        for i in 0..40 {
            map.insert(i, i);
        }
        map.remove(&0);
        let stats = map.probe_stats();
        assert_eq!(stats.len, 39);
        assert_eq!(stats.tombstones, 1);
        assert_eq!(stats.max_probe_length, 3);
        assert!(stats.average_probe_length > 1.0);
    }
}
