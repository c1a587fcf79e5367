//! Error types for the cm-core crate.
//!
//! This module provides [`ConfigError`] for configuration loading and rule
//! validation, and [`PathError`] for failures of the JSON value extractor.

use camino::Utf8PathBuf;

/// Errors that can occur during configuration loading and validation.
///
/// Every variant is raised once, at startup, before the first poll cycle.
///
/// # Examples
///
/// ```
/// use cm_core::ConfigError;
///
/// let error = ConfigError::invalid_rule("https://example.com", "selectors list is empty");
/// assert!(error.to_string().contains("https://example.com"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A rule for a single URL is malformed.
    #[error("invalid rule for '{url}': {reason}")]
    InvalidRule {
        /// The URL the rule is keyed by.
        url: String,
        /// Explanation of why the rule is invalid.
        reason: String,
    },

    /// The storage directory is not usable.
    #[error("invalid storage directory '{path}': {reason}")]
    InvalidStorageDir {
        /// The rejected directory.
        path: Utf8PathBuf,
        /// Explanation of why the directory is rejected.
        reason: String,
    },

    /// A configuration option has an invalid value.
    #[error("invalid configuration option '{option}': {reason}")]
    InvalidOption {
        /// The name of the invalid option.
        option: String,
        /// Explanation of why the option is invalid.
        reason: String,
    },

    /// An I/O error occurred while reading configuration.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse the rules document.
    #[error("failed to parse rules: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    /// Creates a new [`ConfigError::InvalidRule`] error.
    #[inline]
    pub fn invalid_rule(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRule {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new [`ConfigError::InvalidOption`] error.
    #[inline]
    pub fn invalid_option(option: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            option: option.into(),
            reason: reason.into(),
        }
    }
}

/// A JSON extraction path could not be applied to a document.
///
/// Carries the complete original path string, not just the failing segment,
/// so the notification shows exactly which configured path broke.
///
/// # Examples
///
/// ```
/// use cm_core::PathError;
///
/// let error = PathError::new("items.<x>.price", "expected list for '<x>', got object");
/// assert_eq!(error.path, "items.<x>.price");
/// assert!(error.to_string().contains("got object"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid JSON path '{path}': {detail}")]
pub struct PathError {
    /// The full path as configured.
    pub path: String,
    /// Human-readable cause.
    pub detail: String,
}

impl PathError {
    /// Creates a new path error.
    #[inline]
    pub fn new(path: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            detail: detail.into(),
        }
    }
}
