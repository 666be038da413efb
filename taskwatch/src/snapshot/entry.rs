//! Comparable per-record state and the snapshot map built from it.

use std::collections::BTreeMap;
use std::collections::btree_map;

use serde::{Deserialize, Serialize};

/// Status used when a record has no status set.
pub const NO_STATUS: &str = "No Status";

/// Author used when no creator name can be resolved.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

fn default_status() -> String {
    NO_STATUS.to_string()
}

fn default_author() -> String {
    UNKNOWN_AUTHOR.to_string()
}

/// Flat, comparable view of one task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedEntry {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub reminder: String,
    #[serde(default)]
    pub flag: bool,
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_author")]
    pub author: String,
}

impl NormalizedEntry {
    /// An entry with only the id set and every other field at its default.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            status: default_status(),
            reminder: String::new(),
            flag: false,
            url: String::new(),
            author: default_author(),
        }
    }
}

/// Every observed record at one poll, keyed by record id.
///
/// Serialized as a plain JSON object `{ id: entry }`; keys are kept sorted so
/// the persisted file diffs cleanly between polls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    entries: BTreeMap<String, NormalizedEntry>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry under its own id, returning the entry it replaced.
    pub fn insert(&mut self, entry: NormalizedEntry) -> Option<NormalizedEntry> {
        self.entries.insert(entry.id.clone(), entry)
    }

    pub fn get(&self, id: &str) -> Option<&NormalizedEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> btree_map::Values<'_, String, NormalizedEntry> {
        self.entries.values()
    }
}

impl FromIterator<NormalizedEntry> for Snapshot {
    fn from_iter<I: IntoIterator<Item = NormalizedEntry>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for entry in iter {
            snapshot.insert(entry);
        }
        snapshot
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a NormalizedEntry;
    type IntoIter = btree_map::Values<'a, String, NormalizedEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
