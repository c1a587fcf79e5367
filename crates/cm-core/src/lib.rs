//! Core types, extraction and classification logic for the content monitor.
//!
//! This crate provides the pure parts of the extraction-and-diff engine:
//!
//! - Configuration and rule validation ([`Config`], [`Rules`])
//! - The JSON value extractor ([`extract`]) with list broadcast
//! - The transition classifier ([`classify`]) and presence model ([`presence`])
//! - Snapshot, guard and ledger value types
//! - The closed set of notification events ([`Notification`])
//!
//! Nothing here performs I/O; persistence lives in `cm-store` and fetching in
//! `cm-monitor`.

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod extract;
pub mod types;

pub use config::{Config, FetchMode, FetchSettings, Rule, RuleKind, Rules, Target};
pub use error::{ConfigError, PathError};
pub use extract::{WILDCARD, extract, extract_all};
pub use types::*;

/// A [`HashMap`](std::collections::HashMap) using the Fx hash algorithm.
///
/// Used for short-lived, in-memory maps keyed by strings. Persisted maps use
/// `BTreeMap` so the files on disk have a stable order.
pub type FxHashMap<K, V> = rustc_hash::FxHashMap<K, V>;
