//! Webpage and API monitors for the content monitor.
//!
//! This crate ties the pure core to the outside world:
//!
//! - [`Fetcher`] / [`HttpFetcher`]: documents over HTTP, optionally rendered
//!   through a [`BrowserSession`] (headless Chromium)
//! - [`NotificationSink`] / [`DiscordWebhook`]: event delivery
//! - [`evaluate_document`] and [`evaluate_json`]: the webpage and API
//!   monitors, pure functions from a fetched document and the stored state
//!   to an [`Evaluation`]
//! - [`Checker`]: the poll cycle and the daily summary
//!
//! # Example
//!
//! ```no_run
//! use cm_core::Config;
//! use cm_monitor::{Checker, DiscordWebhook, HttpFetcher};
//!
//! # async fn run(config: Config) -> Result<(), cm_monitor::FetchError> {
//! let fetcher = HttpFetcher::new(&config)?;
//! let sink = DiscordWebhook::new("https://discord.com/api/webhooks/1/token", Vec::new())?;
//! let checker = Checker::new(&config, fetcher, sink);
//!
//! let report = checker.run_cycle().await;
//! println!("{} checked, {} failed", report.checked, report.failed);
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

mod api;
mod browser;
mod checker;
mod error;
mod fetch;
mod outcome;
mod sink;
mod summary;
#[cfg(test)]
mod testing;
mod webpage;

pub use api::evaluate_json;
pub use browser::BrowserSession;
pub use checker::{Checker, CycleReport};
pub use error::{CheckError, FetchError, FetchErrorKind};
pub use fetch::{Fetcher, HttpFetcher};
pub use outcome::Evaluation;
pub use sink::{DEFAULT_FOOTER, DiscordWebhook, NotificationSink};
pub use summary::{DailySummary, humanize_seconds};
pub use webpage::evaluate_document;
