//! The missing-element guard.
//!
//! A selector that stops matching is recorded here so its absence is
//! reported once, not on every poll. The record is removed when the
//! selector matches again.

use std::collections::{BTreeMap, BTreeSet};

use camino::{Utf8Path, Utf8PathBuf};
use cm_core::{MissingEntry, ObservationKey};
use tracing::debug;

use crate::error::StoreError;
use crate::file::{load_json, save_json};

/// Guard records per observation key, backed by a JSON file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissingGuard {
    path: Option<Utf8PathBuf>,
    entries: BTreeMap<ObservationKey, MissingEntry>,
}

impl MissingGuard {
    /// Creates an empty guard with no backing file.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads the guard from `path`; a missing file yields an empty guard.
    pub fn load(path: &Utf8Path) -> Result<Self, StoreError> {
        let entries: BTreeMap<ObservationKey, MissingEntry> = load_json(path)?;
        debug!(path = %path, entries = entries.len(), "Loaded missing-element guard");
        Ok(Self {
            path: Some(path.to_owned()),
            entries,
        })
    }

    /// Writes the whole guard back to its file. No-op for in-memory guards.
    pub fn save(&self) -> Result<(), StoreError> {
        match &self.path {
            Some(path) => save_json(path, &self.entries),
            None => Ok(()),
        }
    }

    /// Returns the record for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&MissingEntry> {
        self.entries.get(key)
    }

    /// Returns `true` if `key` is currently guarded.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Replaces every record belonging to `url` with `entries`.
    pub fn replace_target(
        &mut self,
        url: &str,
        entries: impl IntoIterator<Item = (ObservationKey, MissingEntry)>,
    ) {
        self.entries.retain(|_, entry| entry.url != url);
        self.entries.extend(entries);
    }

    /// Drops records whose URL is not in `urls`.
    ///
    /// Returns the number of records removed.
    pub fn retain_targets<'a>(&mut self, urls: impl IntoIterator<Item = &'a str>) -> usize {
        let urls: BTreeSet<&str> = urls.into_iter().collect();
        let before = self.entries.len();
        self.entries.retain(|_, entry| urls.contains(entry.url.as_str()));
        before - self.entries.len()
    }

    /// Iterates over all records.
    pub fn iter(&self) -> impl Iterator<Item = (&ObservationKey, &MissingEntry)> {
        self.entries.iter()
    }

    /// Returns the number of guarded keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is guarded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
