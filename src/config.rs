//! Tunable table parameters.

use crate::error::{Error, Result};

/// Slots allocated by `FlatHashMap::new`.
pub const DEFAULT_CAPACITY: usize = 16;

/// Default upper bound on live entries, in percent of capacity.
pub const DEFAULT_MAX_LOAD_PERCENT: u8 = 50;

/// Default capacity multiplier applied on growth.
pub const DEFAULT_GROWTH_FACTOR: usize = 2;

/// Highest accepted load limit. Keeps at least one empty slot in every table.
const MAX_LOAD_PERCENT_LIMIT: u8 = 90;

/// Construction parameters of a `FlatHashMap`.
///
/// ```
/// use swisstable::TableConfig;
///
/// let config = TableConfig::default()
///     .with_initial_capacity(64)
///     .with_max_load_percent(75)
///     .with_seed(7);
/// assert!(config.validate().is_ok());
/// assert!(TableConfig::default().with_growth_factor(3).validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableConfig {
    /// Requested number of slots; rounded up to a power of two.
    pub initial_capacity: usize,
    /// Growth happens before an insertion would push `len` above this percentage of capacity.
    pub max_load_percent: u8,
    /// Capacity multiplier used by growth and `rehash`; a power of two of at least 2.
    pub growth_factor: usize,
    /// Salt mixed into the probe start of every key. Drawn at random when `None`.
    pub seed: Option<u64>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_CAPACITY,
            max_load_percent: DEFAULT_MAX_LOAD_PERCENT,
            growth_factor: DEFAULT_GROWTH_FACTOR,
            seed: None,
        }
    }
}

impl TableConfig {
    /// Sets the requested number of slots.
    #[must_use]
    pub const fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Sets the load limit in percent.
    #[must_use]
    pub const fn with_max_load_percent(mut self, percent: u8) -> Self {
        self.max_load_percent = percent;
        self
    }

    /// Sets the capacity multiplier applied on growth.
    #[must_use]
    pub const fn with_growth_factor(mut self, factor: usize) -> Self {
        self.growth_factor = factor;
        self
    }

    /// Fixes the probe salt, making slot placement reproducible for a given hasher.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Checks the load limit and growth factor.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidLoadFactor` if `max_load_percent` is outside `1..=90`,
    /// and `Error::InvalidGrowthFactor` if `growth_factor` is not a power of two of at least 2.
    pub const fn validate(&self) -> Result<()> {
        if self.max_load_percent == 0 || self.max_load_percent > MAX_LOAD_PERCENT_LIMIT {
            return Err(Error::InvalidLoadFactor(self.max_load_percent));
        }
        if self.growth_factor < 2 || !self.growth_factor.is_power_of_two() {
            return Err(Error::InvalidGrowthFactor(self.growth_factor));
        }
        Ok(())
    }

    /// Returns true if holding `entries` in `capacity` slots would break the load limit.
    pub(crate) const fn exceeds_load(&self, entries: usize, capacity: usize) -> bool {
        // u128 products cannot overflow for any pair of usize operands.
        (entries as u128).wrapping_mul(100)
            > (capacity as u128).wrapping_mul(self.max_load_percent as u128)
    }

    /// Smallest capacity reachable from `capacity` by growth steps that holds `entries`.
    ///
    /// Returns `None` if that capacity does not fit in `usize`.
    pub(crate) fn grown_capacity(&self, mut capacity: usize, entries: usize) -> Option<usize> {
        capacity = capacity.max(1);
        while self.exceeds_load(entries, capacity) {
            capacity = capacity.checked_mul(self.growth_factor)?;
        }
        Some(capacity)
    }
}
