//! # Swiss Table
//!
//! A Rust implementation of an open-addressing hash map in the "swiss table" style.
//!
//! Every slot carries one control byte. Full slots store seven bits of the
//! key's hash, empty and deleted slots store reserved markers. Lookups load
//! sixteen control bytes at once, compare them in a single SIMD instruction
//! (SSE2 where available, a portable loop elsewhere) and only compare keys in
//! the slots whose byte matched.
//!
//! ## Basic Usage
//!
//! ```rust
//! use swisstable::FlatHashMap;
//!
//! // Create a new hash map
//! let mut map = FlatHashMap::new();
//!
//! // Insert values
//! map.insert("apple".to_string(), 1);
//! map.insert("banana".to_string(), 2);
//!
//! // Retrieve values
//! assert_eq!(map.get("apple"), Some(&1));
//!
//! // Update values
//! assert_eq!(map.insert("apple".to_string(), 10), Some(1));
//! assert_eq!(map.get("apple"), Some(&10));
//!
//! // Remove values
//! map.remove("apple");
//! assert_eq!(map.get("apple"), None);
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use std::collections::hash_map::RandomState;
//! use swisstable::{FlatHashMap, TableConfig, TriangularProbe};
//!
//! let config = TableConfig::default()
//!     .with_initial_capacity(4)
//!     .with_max_load_percent(75)
//!     .with_seed(0x5eed);
//!
//! let mut map: FlatHashMap<u32, u32, RandomState, TriangularProbe> =
//!     FlatHashMap::with_config(config, RandomState::new())?;
//!
//! for i in 0..100 {
//!     map.insert(i, i * i);
//! }
//! assert_eq!(map.get(&9), Some(&81));
//! assert!(map.capacity() >= 128);
//! # Ok::<(), swisstable::Error>(())
//! ```

/// Per-lane match results of a group scan
mod bitmask;
/// Tunable table parameters
mod config;
/// Control-byte encoding
mod control;
/// Error type for fallible operations
mod error;
/// The public hash map
mod flat_hash_map;
/// SIMD and scalar group scans
mod group;
/// Probing policies
mod probe;
/// Probe-length statistics
mod stats;
/// Parallel control and slot buffers
mod storage;

pub use config::{DEFAULT_CAPACITY, DEFAULT_GROWTH_FACTOR, DEFAULT_MAX_LOAD_PERCENT, TableConfig};
pub use error::{Error, Result};
pub use flat_hash_map::{
    Drain, FlatHashMap, IntoIter, Iter, IterMut, Keys, Values, ValuesMut,
};
pub use probe::{LinearProbe, ProbePolicy, TriangularProbe};
pub use stats::ProbeStats;
