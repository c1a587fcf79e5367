//! The daily ledger and the daily-summary sent flags.
//!
//! The ledger maps a calendar day to per-URL [`CheckCounts`]. Counters are
//! only ever added to; a day's bucket is created on first use and never
//! pruned here.

use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::NaiveDate;
use cm_core::CheckCounts;
use tracing::trace;

use crate::error::StoreError;
use crate::file::{load_json, save_json};

/// Per-URL counters for one day.
pub type DayBucket = BTreeMap<String, CheckCounts>;

/// Success and failure counters per day and URL, backed by a JSON file.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use cm_store::DailyLedger;
///
/// let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
/// let mut ledger = DailyLedger::in_memory();
/// ledger.record("https://e.com", day, 1, 0);
/// ledger.record("https://e.com", day, 0, 1);
///
/// let counts = ledger.counts(day, "https://e.com");
/// assert_eq!((counts.success, counts.fail), (1, 1));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DailyLedger {
    path: Option<Utf8PathBuf>,
    days: BTreeMap<NaiveDate, DayBucket>,
}

impl DailyLedger {
    /// Creates an empty ledger with no backing file.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads the ledger from `path`; a missing file yields an empty ledger.
    pub fn load(path: &Utf8Path) -> Result<Self, StoreError> {
        Ok(Self {
            path: Some(path.to_owned()),
            days: load_json(path)?,
        })
    }

    /// Writes the whole ledger back to its file. No-op for in-memory ledgers.
    pub fn save(&self) -> Result<(), StoreError> {
        match &self.path {
            Some(path) => save_json(path, &self.days),
            None => Ok(()),
        }
    }

    /// Adds `success` and `fail` to the counters of `url` on `day`.
    pub fn record(&mut self, url: &str, day: NaiveDate, success: u64, fail: u64) {
        self.days
            .entry(day)
            .or_default()
            .entry(url.to_owned())
            .or_default()
            .add(success, fail);
    }

    /// Loads the ledger at `path`, records one outcome and writes it back.
    pub fn increment(
        path: &Utf8Path,
        url: &str,
        day: NaiveDate,
        success: u64,
        fail: u64,
    ) -> Result<(), StoreError> {
        let mut ledger = Self::load(path)?;
        ledger.record(url, day, success, fail);
        ledger.save()?;
        trace!(url, %day, success, fail, "Ledger incremented");
        Ok(())
    }

    /// Returns the bucket of `day`, if anything was recorded that day.
    #[must_use]
    pub fn day(&self, day: NaiveDate) -> Option<&DayBucket> {
        self.days.get(&day)
    }

    /// Returns the counters of `url` on `day`, zero if none were recorded.
    #[must_use]
    pub fn counts(&self, day: NaiveDate, url: &str) -> CheckCounts {
        self.day(day)
            .and_then(|bucket| bucket.get(url))
            .copied()
            .unwrap_or_default()
    }
}

/// Persisted "summary already sent" flags per day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryStatus {
    path: Option<Utf8PathBuf>,
    sent: BTreeMap<NaiveDate, bool>,
}

impl SummaryStatus {
    /// Creates an empty flag set with no backing file.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads the flags from `path`; a missing file yields no flags.
    pub fn load(path: &Utf8Path) -> Result<Self, StoreError> {
        Ok(Self {
            path: Some(path.to_owned()),
            sent: load_json(path)?,
        })
    }

    /// Returns `true` if the summary for `day` went out.
    #[must_use]
    pub fn is_sent(&self, day: NaiveDate) -> bool {
        self.sent.get(&day).copied().unwrap_or(false)
    }

    /// Sets the flag for `day` and persists.
    pub fn mark_sent(&mut self, day: NaiveDate) -> Result<(), StoreError> {
        self.sent.insert(day, true);
        match &self.path {
            Some(path) => save_json(path, &self.sent),
            None => Ok(()),
        }
    }
}
