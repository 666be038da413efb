//! Normalized record state and its persistence.
//!
//! - [`normalize`] flattens raw pages into [`NormalizedEntry`] values
//! - [`Snapshot`] holds one entry per record id
//! - [`SnapshotStore`] loads and saves the snapshot between poll cycles

mod entry;
pub mod normalize;
mod store;

pub use entry::{NO_STATUS, NormalizedEntry, Snapshot, UNKNOWN_AUTHOR};
pub use normalize::{PropertyNames, normalize, normalize_all};
pub use store::{JsonFileStore, SnapshotStore};
