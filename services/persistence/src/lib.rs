//! Embedded persistence for the feed service
//!
//! Keeps full state in memory and snapshots it to JSON files: one file per
//! artifact, overwritten atomically on each flush. A debounced flusher
//! collapses a burst of updates into a single pending write.

pub mod debounce;
pub mod store;

pub use debounce::DebouncedFlusher;
pub use store::{JsonSnapshotStore, StoreError};
