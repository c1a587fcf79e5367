//! Snapshot entries.
//!
//! A [`SnapshotEntry`] is the last-known value of one observation key plus
//! the time it was captured. Webpage entries keep both the structural HTML
//! (compared for change detection) and the normalized text (shown to users).
//! API entries keep the extracted `path -> value` mapping of one document.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The captured value of a snapshot entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotValue {
    /// One element located by a CSS selector.
    Webpage {
        /// Outer HTML of the element; the form compared between polls.
        html: String,
        /// Text content with whitespace-only runs dropped; display only.
        text: String,
    },
    /// Every configured path of one API document.
    Api {
        /// Extracted values keyed by path.
        json: BTreeMap<String, Value>,
    },
}

/// Last-known value for one observation key.
///
/// # Examples
///
/// ```
/// use cm_core::SnapshotEntry;
/// use chrono::{TimeZone, Utc};
///
/// let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
/// let entry = SnapshotEntry::webpage("https://e.com", "<h1>Hi</h1>", "Hi", at);
/// assert_eq!(entry.html(), Some("<h1>Hi</h1>"));
/// assert_eq!(entry.text(), Some("Hi"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    /// The URL this entry belongs to.
    pub target: String,

    /// The captured value.
    #[serde(flatten)]
    pub value: SnapshotValue,

    /// When the value was captured, persisted as a unix timestamp.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub captured_at: DateTime<Utc>,
}

impl SnapshotEntry {
    /// Creates a webpage entry.
    #[must_use]
    pub fn webpage(
        target: impl Into<String>,
        html: impl Into<String>,
        text: impl Into<String>,
        captured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            target: target.into(),
            value: SnapshotValue::Webpage {
                html: html.into(),
                text: text.into(),
            },
            captured_at,
        }
    }

    /// Creates an API entry.
    #[must_use]
    pub fn api(
        target: impl Into<String>,
        json: BTreeMap<String, Value>,
        captured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            target: target.into(),
            value: SnapshotValue::Api { json },
            captured_at,
        }
    }

    /// Returns the structural HTML of a webpage entry.
    #[must_use]
    pub fn html(&self) -> Option<&str> {
        match &self.value {
            SnapshotValue::Webpage { html, .. } => Some(html),
            SnapshotValue::Api { .. } => None,
        }
    }

    /// Returns the display text of a webpage entry.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.value {
            SnapshotValue::Webpage { text, .. } => Some(text),
            SnapshotValue::Api { .. } => None,
        }
    }

    /// Returns the stored value of one API path.
    #[must_use]
    pub fn api_value(&self, path: &str) -> Option<&Value> {
        match &self.value {
            SnapshotValue::Api { json } => json.get(path),
            SnapshotValue::Webpage { .. } => None,
        }
    }
}

/// Formats a timestamp as `YYYY-MM-DD HH:MM:SS UTC`.
#[must_use]
pub fn format_utc(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}
