//! Error types for the cm-store crate.
//!
//! This module provides the [`StoreError`] type for failures reading or
//! writing a persisted state file.

use camino::Utf8PathBuf;

/// Errors that can occur while loading or saving a state file.
///
/// # Error Recovery Strategy
///
/// A store error is fatal for the target being processed: its check is
/// counted as failed and reported, and the poll cycle moves on to the next
/// target. A missing file is not an error; it loads as an empty mapping.
///
/// # Examples
///
/// ```
/// use cm_store::StoreError;
/// use std::io;
///
/// let err = StoreError::write("state/daily_log.json", io::Error::other("disk full"));
/// assert!(err.to_string().contains("daily_log.json"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The file exists but could not be read.
    #[error("failed to read state file {path}: {source}")]
    Read {
        /// The state file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file content is not valid JSON for the expected mapping.
    #[error("failed to parse state file {path}: {source}")]
    Parse {
        /// The state file.
        path: Utf8PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The file could not be written or renamed into place.
    #[error("failed to write state file {path}: {source}")]
    Write {
        /// The state file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Creates a new [`StoreError::Read`] error.
    #[inline]
    pub fn read(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`StoreError::Parse`] error.
    #[inline]
    pub fn parse(path: impl Into<Utf8PathBuf>, source: serde_json::Error) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`StoreError::Write`] error.
    #[inline]
    pub fn write(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` if a later attempt can succeed without intervention.
    ///
    /// I/O failures may be transient. A file that does not parse stays
    /// broken until it is repaired or removed.
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Read { .. } | Self::Write { .. })
    }

    /// Returns the state file associated with this error.
    #[must_use]
    pub fn path(&self) -> &Utf8PathBuf {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } | Self::Write { path, .. } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_store_error_read() {
        let err = StoreError::read("s/previous_data.json", io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        assert_eq!(err.path().as_str(), "s/previous_data.json");
        assert!(err.to_string().contains("failed to read"));
    }

    #[test]
    fn test_store_error_parse() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = StoreError::parse("s/missing_elements.json", source);
        assert!(err.to_string().contains("missing_elements.json"));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_store_error_io_is_recoverable() {
        let read = StoreError::read("s/daily_log.json", io::Error::other("busy"));
        let write = StoreError::write("s/daily_log.json", io::Error::other("disk full"));
        assert!(read.is_recoverable());
        assert!(write.is_recoverable());
    }
}
