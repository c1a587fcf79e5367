//! Daily ledger counters.

use serde::{Deserialize, Serialize};

/// Success and failure counts for one URL on one day.
///
/// # Examples
///
/// ```
/// use cm_core::CheckCounts;
///
/// let counts = CheckCounts { success: 3, fail: 1 };
/// assert_eq!(counts.total(), 4);
/// assert!((counts.success_rate() - 75.0).abs() < f64::EPSILON);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CheckCounts {
    /// Checks whose fetch succeeded.
    pub success: u64,
    /// Checks that failed.
    pub fail: u64,
}

impl CheckCounts {
    /// Adds the deltas, saturating at `u64::MAX`.
    #[inline]
    pub fn add(&mut self, success: u64, fail: u64) {
        self.success = self.success.saturating_add(success);
        self.fail = self.fail.saturating_add(fail);
    }

    /// Total number of checks.
    #[inline]
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.success.saturating_add(self.fail)
    }

    /// Percentage of successful checks, `0.0` when nothing ran.
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.success as f64 / total as f64 * 100.0,
        }
    }

    /// Average seconds between successful checks over a whole day.
    #[must_use]
    pub fn seconds_between_successes(&self) -> Option<f64> {
        (self.success > 0).then(|| 86_400.0 / self.success as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_add() {
        let mut counts = CheckCounts::default();
        counts.add(1, 0);
        counts.add(0, 1);
        counts.add(1, 0);
        assert_eq!(counts, CheckCounts { success: 2, fail: 1 });
    }

    #[test]
    fn test_success_rate_empty() {
        assert!(CheckCounts::default().success_rate().abs() < f64::EPSILON);
    }

    #[test]
    fn test_seconds_between_successes() {
        assert_eq!(CheckCounts { success: 288, fail: 0 }.seconds_between_successes(), Some(300.0));
        assert_eq!(CheckCounts { success: 0, fail: 5 }.seconds_between_successes(), None);
    }
}
