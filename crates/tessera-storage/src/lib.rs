//! Coordinate-keyed caches for generated tiles and the reducer that keeps
//! them within an entry budget.
//!
//! Each [`GridStorage`] owns the payloads of one kind of tile data. Any number
//! of stores can share one [`StorageReducer`]: it stamps accesses through a
//! shared [`AccessClock`] and, when the stores together exceed the budget,
//! evicts the least recently touched tiles first, never a tile whose finer
//! descendants are still cached.

mod clock;
mod grid;
mod reducer;

pub use clock::AccessClock;
pub use grid::{GridStorage, StorageStats};
pub use reducer::{ReduceReport, ReducerStats, ReducibleStorage, StorageReducer};
