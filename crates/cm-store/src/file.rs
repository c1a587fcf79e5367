//! Whole-file JSON persistence.
//!
//! State files are read entirely and written entirely. Writes go to a
//! temporary file in the same directory, are flushed and synced, and then
//! renamed over the target so a crash never leaves a truncated file behind.

use std::fs;
use std::io::{self, BufWriter, Write};

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;

use crate::error::StoreError;

/// File name of the snapshot store.
pub const PREVIOUS_DATA_FILE: &str = "previous_data.json";
/// File name of the missing-element guard.
pub const MISSING_ELEMENTS_FILE: &str = "missing_elements.json";
/// File name of the daily ledger.
pub const DAILY_LOG_FILE: &str = "daily_log.json";
/// File name of the daily-summary sent flags.
pub const SUMMARY_STATUS_FILE: &str = "daily_notification_status.json";

/// Loads a JSON mapping, treating a missing or empty file as `T::default()`.
pub fn load_json<T>(path: &Utf8Path) -> Result<T, StoreError>
where
    T: DeserializeOwned + Default,
{
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => return Err(StoreError::read(path, e)),
    };

    if content.trim().is_empty() {
        return Ok(T::default());
    }

    serde_json::from_str(&content).map_err(|e| StoreError::parse(path, e))
}

/// Writes `value` to `path` atomically (write-then-rename).
pub fn save_json<T>(path: &Utf8Path, value: &T) -> Result<(), StoreError>
where
    T: Serialize + ?Sized,
{
    let dir = path
        .parent()
        .filter(|p| !p.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    fs::create_dir_all(dir).map_err(|e| StoreError::write(path, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StoreError::write(path, e))?;
    {
        let mut writer = BufWriter::new(&mut tmp);
        serde_json::to_writer_pretty(&mut writer, value)
            .map_err(|e| StoreError::write(path, io::Error::other(e)))?;
        writer.flush().map_err(|e| StoreError::write(path, e))?;
    }
    tmp.as_file()
        .sync_all()
        .map_err(|e| StoreError::write(path, e))?;
    tmp.persist(path).map_err(|e| StoreError::write(path, e.error))?;
    Ok(())
}

/// The directory holding every state file.
///
/// # Examples
///
/// ```
/// use cm_store::StateDir;
///
/// let dir = StateDir::new("/var/lib/content-monitor");
/// assert_eq!(dir.daily_log().as_str(), "/var/lib/content-monitor/daily_log.json");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateDir {
    root: Utf8PathBuf,
}

impl StateDir {
    /// Creates a handle for `root`. Nothing is touched on disk.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of the snapshot store.
    #[must_use]
    pub fn previous_data(&self) -> Utf8PathBuf {
        self.root.join(PREVIOUS_DATA_FILE)
    }

    /// Path of the missing-element guard.
    #[must_use]
    pub fn missing_elements(&self) -> Utf8PathBuf {
        self.root.join(MISSING_ELEMENTS_FILE)
    }

    /// Path of the daily ledger.
    #[must_use]
    pub fn daily_log(&self) -> Utf8PathBuf {
        self.root.join(DAILY_LOG_FILE)
    }

    /// Path of the daily-summary sent flags.
    #[must_use]
    pub fn summary_status(&self) -> Utf8PathBuf {
        self.root.join(SUMMARY_STATUS_FILE)
    }
}
