//! Snapshot diffing.
//!
//! Rules, per id in the current snapshot:
//! - new id: `Created`
//! - status moved into Approved: `StatusChanged(Approved)`
//! - status mentions Rejected and the flag went on: `FlagToggled(Rejected)`,
//!   even when it also mentions an approval that was already there
//! - any other status and the flag went on: `FlagToggled(InReview)`
//!
//! Edits that touch only title, reminder, author or url produce nothing, and
//! ids missing from the current snapshot are not reported.

use super::events::{ChangeEvent, ChangeKind, ReviewState, StatusCategory};
use crate::snapshot::{NormalizedEntry, Snapshot};

/// Compare two snapshots; at most one event per id.
pub fn classify(previous: &Snapshot, current: &Snapshot) -> Vec<ChangeEvent> {
    current
        .iter()
        .filter_map(|entry| match previous.get(&entry.id) {
            None => Some(ChangeEvent::created(entry.clone())),
            Some(before) if before != entry => {
                classify_update(before, entry).map(|kind| ChangeEvent {
                    kind,
                    entry: entry.clone(),
                    previous: Some(before.clone()),
                })
            }
            Some(_) => None,
        })
        .collect()
}

fn classify_update(before: &NormalizedEntry, after: &NormalizedEntry) -> Option<ChangeKind> {
    let was = StatusCategory::from_status(&before.status);
    let now = StatusCategory::from_status(&after.status);
    let flag_raised = !before.flag && after.flag;

    if now == StatusCategory::Approved && was != StatusCategory::Approved {
        return Some(ChangeKind::StatusChanged(ReviewState::Approved));
    }

    if !flag_raised {
        return None;
    }

    Some(ChangeKind::FlagToggled(if StatusCategory::mentions_rejection(&after.status) {
        ReviewState::Rejected
    } else {
        ReviewState::InReview
    }))
}
