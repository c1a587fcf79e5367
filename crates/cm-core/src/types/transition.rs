//! Transition classification and the element presence model.
//!
//! [`classify`] compares an old value against a new one. [`presence`] decides
//! what a webpage selector's presence or absence means given the
//! [`MissingEntry`] recorded for it on earlier polls.

use serde::{Deserialize, Serialize};

/// Outcome of comparing a new value with the previously stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// No value was stored for this key.
    FirstSeen,
    /// A value was stored and differs from the new one.
    Changed,
    /// The stored value equals the new one.
    Unchanged,
}

impl Transition {
    /// Returns `true` if the transition warrants a notification.
    #[inline]
    #[must_use]
    pub const fn is_notable(self) -> bool {
        !matches!(self, Self::Unchanged)
    }

    /// Returns a human-readable label for log output.
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FirstSeen => "first seen",
            Self::Changed => "changed",
            Self::Unchanged => "unchanged",
        }
    }
}

/// Classifies `new` against the stored `old` value.
///
/// Equality is the type's own [`PartialEq`]: exact string equality for HTML,
/// deep equality for JSON values.
///
/// # Examples
///
/// ```
/// use cm_core::{classify, Transition};
///
/// assert_eq!(classify(None, &"a"), Transition::FirstSeen);
/// assert_eq!(classify(Some(&"a"), &"a"), Transition::Unchanged);
/// assert_eq!(classify(Some(&"a"), &"b"), Transition::Changed);
/// ```
#[must_use]
pub fn classify<T: PartialEq + ?Sized>(old: Option<&T>, new: &T) -> Transition {
    match old {
        None => Transition::FirstSeen,
        Some(old) if old != new => Transition::Changed,
        Some(_) => Transition::Unchanged,
    }
}

/// Guard record for a selector that was absent on the most recent poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingEntry {
    /// The page URL.
    pub url: String,
    /// The selector that matched nothing.
    pub selector: String,
    /// When the element was first found missing, as a unix timestamp.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub first_missing_at: chrono::DateTime<chrono::Utc>,
    /// Whether the `element_missing` notification went out.
    pub alert_sent: bool,
}

/// What to do with a selector on this poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Presence {
    /// Present and not guarded: classify the value.
    Present,
    /// Present after being missing: drop the guard, notify, then classify.
    Returned,
    /// Absent and not yet alerted: record the guard as alerted and notify.
    NewlyMissing,
    /// Absent and already alerted: do nothing.
    StillMissing,
}

impl Presence {
    /// Returns `true` if the element's value should be classified this poll.
    #[inline]
    #[must_use]
    pub const fn should_classify(self) -> bool {
        matches!(self, Self::Present | Self::Returned)
    }
}

/// Applies the presence model to one selector.
///
/// # Examples
///
/// ```
/// use cm_core::{presence, Presence};
///
/// assert_eq!(presence(true, None), Presence::Present);
/// assert_eq!(presence(false, None), Presence::NewlyMissing);
/// ```
#[must_use]
pub fn presence(found: bool, guard: Option<&MissingEntry>) -> Presence {
    match (found, guard) {
        (true, None) => Presence::Present,
        (true, Some(_)) => Presence::Returned,
        (false, Some(entry)) if entry.alert_sent => Presence::StillMissing,
        (false, _) => Presence::NewlyMissing,
    }
}
