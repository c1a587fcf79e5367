//! Domain types for the content monitor.
//!
//! # Module Organization
//!
//! - [`key`] - Observation keys
//! - [`snapshot`] - Last-known values per key
//! - [`transition`] - Change classification and the element presence model
//! - [`ledger`] - Daily success/failure counters
//! - [`event`] - Notification events and their rendering
//!
//! All public types are re-exported here and at the crate root:
//!
//! ```
//! use cm_core::{Notification, ObservationKey, SnapshotEntry, Transition};
//! ```

mod event;
mod key;
mod ledger;
mod snapshot;
mod transition;

pub use event::{Embed, EmbedField, Notification, display_value};
pub use key::ObservationKey;
pub use ledger::CheckCounts;
pub use snapshot::{SnapshotEntry, SnapshotValue, format_utc};
pub use transition::{MissingEntry, Presence, Transition, classify, presence};
