//! The snapshot store.
//!
//! [`SnapshotStore`] maps each observation key to its last-known
//! [`SnapshotEntry`]. It is loaded at the start of a poll cycle and written
//! back per target: a successful check replaces every entry belonging to
//! its URL with what that check produced, so stale keys (for example a
//! selector removed from the rule) disappear.

use std::collections::{BTreeMap, BTreeSet};

use camino::{Utf8Path, Utf8PathBuf};
use cm_core::{ObservationKey, SnapshotEntry};
use tracing::debug;

use crate::error::StoreError;
use crate::file::{load_json, save_json};

/// Last-known value per observation key, backed by a JSON file.
///
/// # Examples
///
/// ```
/// use cm_store::SnapshotStore;
/// use cm_core::{ObservationKey, SnapshotEntry};
/// use chrono::Utc;
///
/// let mut store = SnapshotStore::in_memory();
/// let key = ObservationKey::webpage("https://e.com", "h1");
/// let entry = SnapshotEntry::webpage("https://e.com", "<h1>Hi</h1>", "Hi", Utc::now());
///
/// store.replace_target("https://e.com", [(key.clone(), entry)]);
/// assert!(store.get(key.as_str()).is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotStore {
    path: Option<Utf8PathBuf>,
    entries: BTreeMap<ObservationKey, SnapshotEntry>,
}

impl SnapshotStore {
    /// Creates an empty store with no backing file.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads the store from `path`; a missing file yields an empty store.
    pub fn load(path: &Utf8Path) -> Result<Self, StoreError> {
        let entries: BTreeMap<ObservationKey, SnapshotEntry> = load_json(path)?;
        debug!(path = %path, entries = entries.len(), "Loaded snapshot store");
        Ok(Self {
            path: Some(path.to_owned()),
            entries,
        })
    }

    /// Writes the whole store back to its file. No-op for in-memory stores.
    pub fn save(&self) -> Result<(), StoreError> {
        match &self.path {
            Some(path) => save_json(path, &self.entries),
            None => Ok(()),
        }
    }

    /// Returns the entry stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&SnapshotEntry> {
        self.entries.get(key)
    }

    /// Iterates over the entries belonging to `url`.
    pub fn entries_for<'a>(
        &'a self,
        url: &'a str,
    ) -> impl Iterator<Item = (&'a ObservationKey, &'a SnapshotEntry)> + 'a {
        self.entries.iter().filter(move |(_, entry)| entry.target == url)
    }

    /// Replaces every entry belonging to `url` with `entries`.
    pub fn replace_target(
        &mut self,
        url: &str,
        entries: impl IntoIterator<Item = (ObservationKey, SnapshotEntry)>,
    ) {
        self.entries.retain(|_, entry| entry.target != url);
        self.entries.extend(entries);
    }

    /// Drops entries whose URL is not in `urls`.
    ///
    /// Returns the number of entries removed.
    pub fn retain_targets<'a>(&mut self, urls: impl IntoIterator<Item = &'a str>) -> usize {
        let urls: BTreeSet<&str> = urls.into_iter().collect();
        let before = self.entries.len();
        self.entries.retain(|_, entry| urls.contains(entry.target.as_str()));
        before - self.entries.len()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap as Map;

    fn page(url: &str, selector: &str, text: &str) -> (ObservationKey, SnapshotEntry) {
        let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        (
            ObservationKey::webpage(url, selector),
            SnapshotEntry::webpage(url, format!("<p>{text}</p>"), text, at),
        )
    }

    #[test]
    fn test_replace_target_drops_unobserved_keys() {
        let mut store = SnapshotStore::in_memory();
        store.replace_target("https://e.com", [page("https://e.com", "h1", "a"), page("https://e.com", "h2", "b")]);
        store.replace_target("https://f.com", [page("https://f.com", "h1", "c")]);
        assert_eq!(store.len(), 3);

        store.replace_target("https://e.com", [page("https://e.com", "h1", "z")]);
        assert_eq!(store.len(), 2);
        assert!(store.get("https://e.com:h2").is_none());
        assert_eq!(store.get("https://e.com:h1").and_then(SnapshotEntry::text), Some("z"));
        assert!(store.get("https://f.com:h1").is_some());
    }

    #[test]
    fn test_replace_target_does_not_confuse_port_prefixes() {
        let mut store = SnapshotStore::in_memory();
        store.replace_target("https://e.com:8080", [page("https://e.com:8080", "h1", "a")]);
        store.replace_target("https://e.com", []);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_retain_targets() {
        let mut store = SnapshotStore::in_memory();
        store.replace_target("https://e.com", [page("https://e.com", "h1", "a")]);
        store.replace_target("https://gone.com", [page("https://gone.com", "h1", "a")]);

        let removed = store.retain_targets(["https://e.com"]);
        assert_eq!(removed, 1);
        assert_eq!(store.entries_for("https://e.com").count(), 1);
    }

    #[test]
    fn test_load_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("previous_data.json")).unwrap();

        let mut store = SnapshotStore::load(&path).unwrap();
        assert!(store.is_empty());
        store.replace_target("https://e.com", [page("https://e.com", "h1", "Hello")]);
        store.save().unwrap();

        let reloaded = SnapshotStore::load(&path).unwrap();
        assert_eq!(reloaded.get("https://e.com:h1"), store.get("https://e.com:h1"));

        let raw: Map<String, serde_json::Value> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["https://e.com:h1"]["text"], "Hello");
    }
}
