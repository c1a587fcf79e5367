//! Error types for the cm-monitor crate.
//!
//! This module provides [`FetchError`] for failures obtaining a document and
//! [`CheckError`] for anything that fails a single target's check.

use std::fmt;

use chromiumoxide::error::CdpError;
use cm_core::PathError;
use cm_store::StoreError;

/// Broad category of a fetch failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchErrorKind {
    /// The request did not complete within the configured timeout.
    Timeout,
    /// The connection could not be established.
    Connection,
    /// The server answered with a non-2xx status.
    HttpStatus,
    /// The body could not be decoded (invalid JSON, invalid text).
    Decode,
    /// Anything else: invalid URL, missing browser session, browser errors.
    Other,
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Timeout => "timeout",
            Self::Connection => "connection",
            Self::HttpStatus => "http status",
            Self::Decode => "decode",
            Self::Other => "other",
        })
    }
}

/// A failure to fetch a webpage or API document.
///
/// # Examples
///
/// ```
/// use cm_monitor::{FetchError, FetchErrorKind};
///
/// let err = FetchError::new(FetchErrorKind::Timeout, "operation timed out");
/// assert!(err.is_transport());
/// assert_eq!(err.to_string(), "operation timed out");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct FetchError {
    /// Category of the failure.
    pub kind: FetchErrorKind,
    /// Human-readable cause.
    pub message: String,
}

impl FetchError {
    /// Creates a new fetch error.
    #[inline]
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Creates a [`FetchErrorKind::Other`] error.
    #[inline]
    pub fn other(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Other, message)
    }

    /// Returns `true` for timeouts, connection failures and HTTP status errors.
    ///
    /// Only transport errors honor a rule's "notify on error" setting.
    #[inline]
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self.kind,
            FetchErrorKind::Timeout | FetchErrorKind::Connection | FetchErrorKind::HttpStatus
        )
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            FetchErrorKind::Timeout
        } else if err.is_connect() {
            FetchErrorKind::Connection
        } else if err.is_status() {
            FetchErrorKind::HttpStatus
        } else if err.is_decode() {
            FetchErrorKind::Decode
        } else {
            FetchErrorKind::Other
        };
        Self::new(kind, err.to_string())
    }
}

impl From<CdpError> for FetchError {
    fn from(err: CdpError) -> Self {
        let kind = match err {
            CdpError::Timeout => FetchErrorKind::Timeout,
            _ => FetchErrorKind::Other,
        };
        Self::new(kind, format!("browser: {err}"))
    }
}

/// Everything that can fail one target's check.
///
/// # Error Recovery Strategy
///
/// Every variant is local to the target: the check counts as failed in the
/// ledger, a `*_check_failed` event may be emitted, and the poll cycle moves
/// on. Nothing is retried within the cycle.
///
/// - **Fetch** ([`CheckError::Fetch`]): notify per the rule unless the cause
///   is not a transport error
/// - **Path** ([`CheckError::Path`]): always notify
/// - **Selector** ([`CheckError::Selector`]): always notify
/// - **Persistence** ([`CheckError::Persistence`]): always notify
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    /// The document could not be fetched.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A JSON extraction path did not apply to the document.
    #[error(transparent)]
    Path(#[from] PathError),

    /// A CSS selector could not be parsed.
    #[error("invalid CSS selector '{selector}': {detail}")]
    Selector {
        /// The selector as configured.
        selector: String,
        /// Parser message.
        detail: String,
    },

    /// State could not be persisted.
    #[error(transparent)]
    Persistence(#[from] StoreError),
}

impl CheckError {
    /// Creates a new [`CheckError::Selector`] error.
    #[inline]
    pub fn selector(selector: impl Into<String>, detail: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            detail: detail.to_string(),
        }
    }

    /// Returns `true` if this is a transport-layer fetch failure.
    #[inline]
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        match self {
            Self::Fetch(err) => err.is_transport(),
            _ => false,
        }
    }

    /// Returns `true` if the same check can succeed on a later poll without
    /// a configuration change or a repaired state file.
    ///
    /// Fetch failures depend on the remote side. A path that does not apply
    /// or an invalid selector is a rule problem and fails every poll.
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Fetch(_) => true,
            Self::Path(_) | Self::Selector { .. } => false,
            Self::Persistence(err) => err.is_recoverable(),
        }
    }

    /// Decides whether a `*_check_failed` event goes out.
    ///
    /// Transport errors follow the rule's setting; every other error is
    /// reported regardless.
    #[inline]
    #[must_use]
    pub const fn should_notify(&self, notify_on_error: bool) -> bool {
        notify_on_error || !self.is_transport()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_kinds() {
        for kind in [FetchErrorKind::Timeout, FetchErrorKind::Connection, FetchErrorKind::HttpStatus] {
            assert!(FetchError::new(kind, "x").is_transport(), "{kind}");
        }
        for kind in [FetchErrorKind::Decode, FetchErrorKind::Other] {
            assert!(!FetchError::new(kind, "x").is_transport(), "{kind}");
        }
    }

    #[test]
    fn test_should_notify_transport_respects_rule() {
        let err = CheckError::from(FetchError::new(FetchErrorKind::HttpStatus, "503"));
        assert!(err.should_notify(true));
        assert!(!err.should_notify(false));
    }

    #[test]
    fn test_should_notify_non_transport_overrides_rule() {
        let decode = CheckError::from(FetchError::new(FetchErrorKind::Decode, "bad json"));
        let path = CheckError::from(PathError::new("a.b", "key 'b' not found"));
        let selector = CheckError::selector("h1[", "unexpected end");
        for err in [decode, path, selector] {
            assert!(err.should_notify(false), "{err}");
        }
    }

    #[test]
    fn test_messages_are_transparent() {
        let err = CheckError::from(FetchError::other("no browser session"));
        assert_eq!(err.to_string(), "no browser session");

        let err = CheckError::from(PathError::new("a.<x>", "expected list"));
        assert!(err.to_string().contains("a.<x>"));
    }

    #[test]
    fn test_is_recoverable() {
        let timeout = CheckError::from(FetchError::new(FetchErrorKind::Timeout, "timed out"));
        let path = CheckError::from(PathError::new("a.b", "key 'b' not found"));
        let selector = CheckError::selector("h1[", "unexpected end");
        assert!(timeout.is_recoverable());
        assert!(!path.is_recoverable());
        assert!(!selector.is_recoverable());

        let source = serde_json::from_str::<serde_json::Value>("{garbage").unwrap_err();
        let corrupt = CheckError::from(StoreError::parse("s/missing_elements.json", source));
        assert!(!corrupt.is_recoverable());

        let disk_full = CheckError::from(StoreError::write("s/daily_log.json", std::io::Error::other("disk full")));
        assert!(disk_full.is_recoverable());
    }
}
