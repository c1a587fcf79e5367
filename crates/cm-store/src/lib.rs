//! Persisted state for the content monitor.
//!
//! Every piece of state lives in one JSON file under the storage directory
//! and is read and written whole:
//!
//! - [`SnapshotStore`]: `previous_data.json`, last-known value per key
//! - [`MissingGuard`]: `missing_elements.json`, selectors currently absent
//! - [`DailyLedger`]: `daily_log.json`, success/failure counters per day
//! - [`SummaryStatus`]: `daily_notification_status.json`, summary sent flags
//!
//! A missing or empty file loads as an empty mapping. Writes go through a
//! temporary file that is renamed over the target, so a crash mid-write
//! leaves the previous version intact.
//!
//! # Example
//!
//! ```no_run
//! use cm_store::{SnapshotStore, StateDir};
//!
//! let dir = StateDir::new("/var/lib/content-monitor");
//! let store = SnapshotStore::load(&dir.previous_data())?;
//! println!("{} entries", store.len());
//! # Ok::<(), cm_store::StoreError>(())
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

mod error;
mod file;
mod guard;
mod ledger;
mod snapshot;

pub use error::StoreError;
pub use file::{
    DAILY_LOG_FILE, MISSING_ELEMENTS_FILE, PREVIOUS_DATA_FILE, SUMMARY_STATUS_FILE, StateDir,
    load_json, save_json,
};
pub use guard::MissingGuard;
pub use ledger::{DailyLedger, DayBucket, SummaryStatus};
pub use snapshot::SnapshotStore;
