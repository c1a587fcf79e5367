//! The result of evaluating one fetched document.

use cm_core::{MissingEntry, Notification, ObservationKey, SnapshotEntry};

/// Everything a successful check wants to commit for its target.
///
/// `snapshot` and `guard` are the complete sets of entries the target owns
/// after this poll; committing replaces the target's previous entries
/// wholesale. `events` are emitted only after the commit succeeded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    /// Snapshot entries owned by the target.
    pub snapshot: Vec<(ObservationKey, SnapshotEntry)>,
    /// Guard records owned by the target.
    pub guard: Vec<(ObservationKey, MissingEntry)>,
    /// Notifications in the order they occurred.
    pub events: Vec<Notification>,
}

#[cfg(test)]
impl Evaluation {
    /// Returns the guard record produced for `key`.
    pub(crate) fn guard_entry(&self, key: &str) -> Option<&MissingEntry> {
        self.guard
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, entry)| entry)
    }

    /// Event-kind names, in order.
    pub(crate) fn event_kinds(&self) -> Vec<&'static str> {
        self.events.iter().map(Notification::kind).collect()
    }
}
