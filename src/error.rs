//! Errors reported by fallible table operations.

use std::alloc::Layout;

use thiserror::Error;

/// Result alias used by fallible table operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Reasons a table could not be built or grown.
///
/// A missing key is not an error (lookups return `None`) and neither is a
/// duplicate key (`insert` replaces the value).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The requested capacity does not fit in `usize` or in a valid allocation layout.
    #[error("capacity overflow")]
    CapacityOverflow,

    /// The allocator refused to provide backing storage.
    #[error("memory allocation of {} bytes failed", .layout.size())]
    AllocFailed {
        /// Layout of the allocation that failed.
        layout: Layout,
    },

    /// The maximum load factor is outside `1..=90` percent.
    #[error("max load factor must be within 1..=90 percent, got {0}")]
    InvalidLoadFactor(u8),

    /// The growth factor is not a power of two of at least 2.
    #[error("growth factor must be a power of two of at least 2, got {0}")]
    InvalidGrowthFactor(usize),
}
