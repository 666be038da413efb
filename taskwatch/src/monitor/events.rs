//! Change events produced by comparing two snapshots.

use serde::{Deserialize, Serialize};

use crate::snapshot::NormalizedEntry;

/// Coarse category of a raw status string.
///
/// This is the only place status text is substring-matched; everything
/// downstream works on the enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusCategory {
    Approved,
    Rejected,
    Other,
}

impl StatusCategory {
    /// Approved takes precedence when a status mentions both.
    pub fn from_status(status: &str) -> Self {
        if status.contains("Approved") {
            Self::Approved
        } else if Self::mentions_rejection(status) {
            Self::Rejected
        } else {
            Self::Other
        }
    }

    /// Whether the status mentions a rejection, whatever else it says.
    pub fn mentions_rejection(status: &str) -> bool {
        status.contains("Rejected")
    }
}

/// Review state a transition moved a task into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReviewState {
    Approved,
    Rejected,
    InReview,
}

impl std::fmt::Display for ReviewState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
            Self::InReview => write!(f, "in_review"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    /// The record was not in the previous snapshot.
    Created,
    /// The status moved into a new category.
    StatusChanged(ReviewState),
    /// The submitted flag was switched on.
    FlagToggled(ReviewState),
}

impl ChangeKind {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::StatusChanged(_) => "status_changed",
            Self::FlagToggled(_) => "flag_toggled",
        }
    }

    pub fn review_state(&self) -> Option<ReviewState> {
        match self {
            Self::Created => None,
            Self::StatusChanged(state) | Self::FlagToggled(state) => Some(*state),
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.review_state() {
            Some(state) => write!(f, "{}({})", self.event_type(), state),
            None => write!(f, "{}", self.event_type()),
        }
    }
}

/// One classified difference for one record id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub entry: NormalizedEntry,
    pub previous: Option<NormalizedEntry>,
}

impl ChangeEvent {
    pub fn created(entry: NormalizedEntry) -> Self {
        Self {
            kind: ChangeKind::Created,
            entry,
            previous: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.entry.id
    }
}
