//! Notification events and their rendering.
//!
//! [`Notification`] is the closed set of events the monitor emits. Each
//! variant renders to an [`Embed`] (title, description, color, fields) by an
//! exhaustive match, so an unknown event kind cannot exist at runtime.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::key::ObservationKey;
use super::snapshot::format_utc;

const COLOR_INFO: u32 = 0x0D_CA_F0;
const COLOR_WARNING: u32 = 0xFF_C1_07;
const COLOR_CHANGE: u32 = 0x0D_6E_FD;
const COLOR_ERROR: u32 = 0xDC_35_45;

/// An event handed to the notification sink.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// A webpage selector was seen for the first time.
    FirstTimeWebpage {
        /// Page URL.
        url: String,
        /// CSS selector.
        selector: String,
        /// Normalized text of the element.
        text: String,
    },
    /// A webpage selector stopped matching.
    ElementMissing {
        /// Page URL.
        url: String,
        /// CSS selector.
        selector: String,
    },
    /// A previously missing selector matches again.
    ElementReturned {
        /// Page URL.
        url: String,
        /// CSS selector.
        selector: String,
    },
    /// The HTML of a webpage element changed.
    ContentChange {
        /// Page URL.
        url: String,
        /// CSS selector.
        selector: String,
        /// Text before the change.
        old_text: String,
        /// Text after the change.
        new_text: String,
        /// When the old value was captured.
        last_updated: Option<DateTime<Utc>>,
    },
    /// Fetching or evaluating a webpage failed.
    WebpageCheckFailed {
        /// Page URL.
        url: String,
        /// Human-readable cause.
        error: String,
    },
    /// An API path was extracted for the first time.
    FirstTimeApi {
        /// API URL.
        url: String,
        /// Extraction path.
        path: String,
        /// Extracted value.
        value: Value,
    },
    /// The value at an API path changed.
    ApiContentChange {
        /// API URL.
        url: String,
        /// Extraction path.
        path: String,
        /// Value before the change.
        old: Value,
        /// Value after the change.
        new: Value,
        /// When the old value was captured.
        last_updated: Option<DateTime<Utc>>,
    },
    /// Fetching, decoding or extracting an API document failed.
    ApiCheckFailed {
        /// API URL.
        url: String,
        /// Human-readable cause.
        error: String,
    },
    /// Yesterday's success/failure summary.
    DailySummary {
        /// The summarized day, `YYYY-MM-DD`.
        date: String,
        /// Pre-formatted per-URL summary.
        summary: String,
    },
}

impl Notification {
    /// Returns the event-kind name.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::FirstTimeWebpage { .. } => "first_time_webpage",
            Self::ElementMissing { .. } => "element_missing",
            Self::ElementReturned { .. } => "element_returned",
            Self::ContentChange { .. } => "content_change",
            Self::WebpageCheckFailed { .. } => "webpage_check_failed",
            Self::FirstTimeApi { .. } => "first_time_api",
            Self::ApiContentChange { .. } => "api_content_change",
            Self::ApiCheckFailed { .. } => "api_check_failed",
            Self::DailySummary { .. } => "daily_summary",
        }
    }

    /// Returns the URL the event is about, if any.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::FirstTimeWebpage { url, .. }
            | Self::ElementMissing { url, .. }
            | Self::ElementReturned { url, .. }
            | Self::ContentChange { url, .. }
            | Self::WebpageCheckFailed { url, .. }
            | Self::FirstTimeApi { url, .. }
            | Self::ApiContentChange { url, .. }
            | Self::ApiCheckFailed { url, .. } => Some(url),
            Self::DailySummary { .. } => None,
        }
    }

    /// Returns the observation key the event addresses, if any.
    #[must_use]
    pub fn key(&self) -> Option<ObservationKey> {
        match self {
            Self::FirstTimeWebpage { url, selector, .. }
            | Self::ElementMissing { url, selector }
            | Self::ElementReturned { url, selector }
            | Self::ContentChange { url, selector, .. } => Some(ObservationKey::webpage(url, selector)),
            Self::FirstTimeApi { url, path, .. } | Self::ApiContentChange { url, path, .. } => {
                Some(ObservationKey::api_value(url, path))
            }
            Self::WebpageCheckFailed { url, .. } | Self::ApiCheckFailed { url, .. } => {
                Some(ObservationKey::api_document(url))
            }
            Self::DailySummary { .. } => None,
        }
    }

    /// Renders the event for display.
    #[must_use]
    pub fn render(&self) -> Embed {
        match self {
            Self::FirstTimeWebpage {
                url,
                selector,
                text,
            } => Embed::new(
                "First-Time Webpage Content Detected",
                "Tracking webpage content for the first time.",
                COLOR_INFO,
                true,
            )
            .with_url(url)
            .field("URL", url)
            .field("Selector", code(selector))
            .field("Data", code(text)),
            Self::ElementMissing { url, selector } => Embed::new(
                "Missing Element Alert",
                "The specified element is missing from the page.",
                COLOR_WARNING,
                false,
            )
            .with_url(url)
            .field("URL", url)
            .field("Selector", code(selector)),
            Self::ElementReturned { url, selector } => Embed::new(
                "Element Returned Notification",
                "The specified element has returned to the page.",
                COLOR_WARNING,
                false,
            )
            .with_url(url)
            .field("URL", url)
            .field("Selector", code(selector)),
            Self::ContentChange {
                url,
                selector,
                old_text,
                new_text,
                last_updated,
            } => Embed::new(
                "Webpage Content Change Detected",
                "A change was detected on the webpage.",
                COLOR_CHANGE,
                true,
            )
            .with_url(url)
            .field("URL", url)
            .field("Selector", code(selector))
            .field("Old Data", if old_text.is_empty() { "N/A".to_owned() } else { code(old_text) })
            .field("New Data", code(new_text))
            .field("Last Updated", last_updated_display(*last_updated)),
            Self::WebpageCheckFailed { url, error } => Embed::new(
                "Webpage Check Failed",
                "Error fetching webpage data.",
                COLOR_ERROR,
                false,
            )
            .with_url(url)
            .field("URL", url)
            .field("Exception", code(error)),
            Self::FirstTimeApi { url, path, value } => Embed::new(
                "First-Time API Content Detected",
                "Tracking API content for the first time.",
                COLOR_INFO,
                true,
            )
            .with_url(url)
            .field("URL", url)
            .field("Selector", code(path))
            .field("Value", code(&display_value(value))),
            Self::ApiContentChange {
                url,
                path,
                old,
                new,
                last_updated,
            } => Embed::new(
                "API Content Change Detected",
                "A change was detected on the API.",
                COLOR_CHANGE,
                true,
            )
            .with_url(url)
            .field("URL", url)
            .field("Selector", code(path))
            .field("Old Value", code(&display_value(old)))
            .field("New Value", code(&display_value(new)))
            .field("Last Updated", last_updated_display(*last_updated)),
            Self::ApiCheckFailed { url, error } => Embed::new(
                "API Check Failed",
                "Error fetching API data.",
                COLOR_ERROR,
                false,
            )
            .with_url(url)
            .field("URL", url)
            .field("Exception", code(error)),
            Self::DailySummary { date, summary } => Embed::new(
                "Daily Monitoring Summary",
                "Summary of monitoring results for the day.",
                COLOR_INFO,
                false,
            )
            .field("Date", date)
            .field("Summary", summary),
        }
    }
}

/// One name/value pair of an [`Embed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedField {
    /// Field label.
    pub name: &'static str,
    /// Field content.
    pub value: String,
}

/// A rendered notification, independent of the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Embed {
    /// Headline.
    pub title: &'static str,
    /// One-sentence explanation.
    pub description: &'static str,
    /// RGB color.
    pub color: u32,
    /// Whether configured users should be pinged.
    pub mention_users: bool,
    /// Link target of the title.
    pub url: Option<String>,
    /// Ordered detail fields.
    pub fields: Vec<EmbedField>,
}

impl Embed {
    fn new(title: &'static str, description: &'static str, color: u32, mention_users: bool) -> Self {
        Self {
            title,
            description,
            color,
            mention_users,
            url: None,
            fields: Vec::new(),
        }
    }

    fn with_url(mut self, url: &str) -> Self {
        self.url = Some(url.to_owned());
        self
    }

    fn field(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.fields.push(EmbedField {
            name,
            value: value.into(),
        });
        self
    }
}

impl fmt::Display for Embed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        write!(f, "{}", self.description)?;
        for field in &self.fields {
            write!(f, "\n{}: {}", field.name, field.value)?;
        }
        Ok(())
    }
}

/// Formats a JSON value for humans: strings bare, everything else as JSON.
#[must_use]
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn code(text: &str) -> String {
    format!("`{text}`")
}

fn last_updated_display(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(|| "N/A".to_owned(), format_utc)
}
