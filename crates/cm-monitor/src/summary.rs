//! The once-a-day monitoring summary.

use std::fmt::Write as _;

use chrono::NaiveDate;
use cm_core::{CheckCounts, Notification};
use cm_store::DailyLedger;

/// Formatted summary of one day's ledger bucket.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use cm_monitor::DailySummary;
/// use cm_store::DailyLedger;
///
/// let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
/// let mut ledger = DailyLedger::in_memory();
/// assert!(DailySummary::for_day(day, &ledger).is_none());
///
/// ledger.record("https://e.com", day, 1, 0);
/// let summary = DailySummary::for_day(day, &ledger).unwrap();
/// assert!(summary.text().contains("https://e.com"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailySummary {
    day: NaiveDate,
    text: String,
}

impl DailySummary {
    /// Builds the summary of `day`, or `None` if nothing was recorded.
    #[must_use]
    pub fn for_day(day: NaiveDate, ledger: &DailyLedger) -> Option<Self> {
        let bucket = ledger.day(day).filter(|bucket| !bucket.is_empty())?;
        let blocks: Vec<String> = bucket
            .iter()
            .map(|(url, counts)| url_block(url, *counts))
            .collect();
        Some(Self {
            day,
            text: blocks.join("\n"),
        })
    }

    /// The summarized day.
    #[must_use]
    pub const fn day(&self) -> NaiveDate {
        self.day
    }

    /// The formatted per-URL lines.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Converts into the `daily_summary` event.
    #[must_use]
    pub fn into_notification(self) -> Notification {
        Notification::DailySummary {
            date: self.day.format("%Y-%m-%d").to_string(),
            summary: self.text,
        }
    }
}

fn url_block(url: &str, counts: CheckCounts) -> String {
    let rate = counts.success_rate();
    let every = humanize_seconds(counts.seconds_between_successes().unwrap_or(0.0));

    let mut block = String::new();
    let _ = writeln!(block, "- **URL**: {url}");
    let _ = writeln!(block, "  - State: {}", state_emoji(rate));
    let _ = writeln!(block, "  - Success Rate: `{rate:.2}%`");
    let _ = writeln!(block, "  - Successful checks every: `{every}`");
    let _ = writeln!(block, "  - Success: `{}`", counts.success);
    let _ = write!(block, "  - Fail: `{}`", counts.fail);
    block
}

fn state_emoji(rate: f64) -> &'static str {
    if rate >= 80.0 {
        "🟢"
    } else if rate >= 50.0 {
        "🟡"
    } else {
        "🔴"
    }
}

/// Formats a duration in seconds as `1 day, 2 hours, 3 minutes, 4 seconds`,
/// leaving out zero units.
#[must_use]
pub fn humanize_seconds(seconds: f64) -> String {
    const UNITS: [(u64, &str); 4] = [(86_400, "day"), (3_600, "hour"), (60, "minute"), (1, "second")];

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let mut remaining = seconds.max(0.0).round() as u64;
    if remaining == 0 {
        return "0 seconds".to_owned();
    }

    let mut parts = Vec::with_capacity(UNITS.len());
    for (size, name) in UNITS {
        let count = remaining / size;
        remaining %= size;
        match count {
            0 => {}
            1 => parts.push(format!("1 {name}")),
            n => parts.push(format!("{n} {name}s")),
        }
    }
    parts.join(", ")
}
