//! Change monitoring.
//!
//! One poll cycle fetches every record through a [`RecordSource`], diffs
//! the normalized result against the stored snapshot with [`classify`],
//! dispatches the resulting [`ChangeEvent`]s and persists the new snapshot.
//! [`TaskMonitor::run`] repeats the cycle on each [`Ticker`] tick.

mod classifier;
mod events;
mod service;
mod source;
mod ticker;

pub use classifier::classify;
pub use events::{ChangeEvent, ChangeKind, ReviewState, StatusCategory};
pub use service::{CycleReport, MonitorSettings, TaskMonitor};
pub use source::{NotionSource, RecordSource};
pub use ticker::{IntervalTicker, Ticker};
