//! The poll cycle.
//!
//! [`Checker`] runs every configured target once, in rule order. Each
//! target goes through the same steps:
//!
//! 1. fetch the document
//! 2. evaluate it against the stored state (pure)
//! 3. commit the target's snapshot and guard entries and persist them
//! 4. emit the target's notifications
//! 5. count the outcome in the daily ledger
//!
//! Any failure in steps 1-3 fails only that target: nothing of its
//! evaluation is committed or emitted, a `*_check_failed` event may go out,
//! and the cycle continues with the next target. A ledger write failure in
//! step 5 turns the already emitted check into a failed one.
//!
//! The snapshot store is needed by every target, so a store that cannot be
//! loaded fails the whole cycle. The missing-element guard is only loaded
//! for webpage targets, and a broken guard file fails only those.

use chrono::{DateTime, Local, NaiveDate, Utc};
use cm_core::{Config, FxHashMap, Notification, RuleKind, Target};
use cm_store::{DailyLedger, MissingGuard, SnapshotStore, StateDir, StoreError, SummaryStatus};
use tracing::{debug, error, info, warn};

use crate::api::evaluate_json;
use crate::error::CheckError;
use crate::fetch::Fetcher;
use crate::outcome::Evaluation;
use crate::sink::NotificationSink;
use crate::summary::DailySummary;
use crate::webpage::evaluate_document;

/// What happened during one poll cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Targets processed.
    pub checked: usize,
    /// Targets whose check failed.
    pub failed: usize,
    /// Emitted notifications per event kind.
    pub events: FxHashMap<&'static str, usize>,
}

impl CycleReport {
    fn record(&mut self, notification: &Notification) {
        *self.events.entry(notification.kind()).or_default() += 1;
    }

    /// Number of notifications emitted.
    #[must_use]
    pub fn events_total(&self) -> usize {
        self.events.values().sum()
    }

    /// Number of notifications of `kind` emitted.
    #[must_use]
    pub fn count(&self, kind: &str) -> usize {
        self.events.get(kind).copied().unwrap_or(0)
    }
}

/// Runs poll cycles over the configured rules.
pub struct Checker<'a, F, S> {
    config: &'a Config,
    state: StateDir,
    fetcher: F,
    sink: S,
}

impl<'a, F, S> Checker<'a, F, S>
where
    F: Fetcher,
    S: NotificationSink,
{
    /// Creates a checker keeping its state under `config.storage_dir`.
    pub fn new(config: &'a Config, fetcher: F, sink: S) -> Self {
        Self {
            config,
            state: StateDir::new(config.storage_dir.clone()),
            fetcher,
            sink,
        }
    }

    /// The fetcher.
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// The notification sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Consumes the checker, returning the fetcher for shutdown.
    pub fn into_fetcher(self) -> F {
        self.fetcher
    }

    /// Runs one poll cycle now, counting outcomes under the local date.
    pub async fn run_cycle(&self) -> CycleReport {
        self.run_cycle_at(Utc::now(), Local::now().date_naive()).await
    }

    /// Runs one poll cycle as of `now`, counting outcomes under `today`.
    pub async fn run_cycle_at(&self, now: DateTime<Utc>, today: NaiveDate) -> CycleReport {
        let mut report = CycleReport::default();

        let mut store = match SnapshotStore::load(&self.state.previous_data()) {
            Ok(store) => store,
            Err(e) => {
                error!(error = %e, "Failed to load snapshot store");
                let message = e.to_string();
                for target in &self.config.rules {
                    report.checked += 1;
                    report.failed += 1;
                    self.fail_with(target, &message, true, today, &mut report).await;
                }
                return report;
            }
        };
        // Only webpage checks read the guard; it is loaded on first use.
        let mut guard = None;

        for target in &self.config.rules {
            report.checked += 1;
            match self.check_target(target, &mut store, &mut guard, now).await {
                Ok(events) => {
                    for event in &events {
                        self.sink.emit(event).await;
                        report.record(event);
                    }
                    if let Err(e) = self.count(&target.url, today, 1, 0) {
                        report.failed += 1;
                        self.fail(target, &CheckError::Persistence(e), today, &mut report).await;
                    }
                }
                Err(err) => {
                    report.failed += 1;
                    self.fail(target, &err, today, &mut report).await;
                }
            }
        }

        self.prune(&mut store, &mut guard);
        info!(
            checked = report.checked,
            failed = report.failed,
            events = report.events_total(),
            "Poll cycle finished"
        );
        report
    }

    /// Sends the summary of the day before `today` unless it already went
    /// out. Returns `true` if a summary was emitted.
    ///
    /// The sent flag is set even when the day has no data, so an empty day
    /// is only looked at once.
    pub async fn send_daily_summary(&self, today: NaiveDate) -> Result<bool, StoreError> {
        let Some(yesterday) = today.pred_opt() else {
            return Ok(false);
        };

        let mut status = SummaryStatus::load(&self.state.summary_status())?;
        if status.is_sent(yesterday) {
            debug!(day = %yesterday, "Daily summary already sent");
            return Ok(false);
        }

        let ledger = DailyLedger::load(&self.state.daily_log())?;
        let sent = match DailySummary::for_day(yesterday, &ledger) {
            Some(summary) => {
                self.sink.emit(&summary.into_notification()).await;
                info!(day = %yesterday, "Daily summary sent");
                true
            }
            None => {
                debug!(day = %yesterday, "No checks recorded, skipping daily summary");
                false
            }
        };

        status.mark_sent(yesterday)?;
        Ok(sent)
    }

    /// Returns the guard, loading it into `slot` on first use.
    fn guard<'g>(&self, slot: &'g mut Option<MissingGuard>) -> Result<&'g mut MissingGuard, StoreError> {
        let guard = match slot.take() {
            Some(guard) => guard,
            None => MissingGuard::load(&self.state.missing_elements())?,
        };
        Ok(slot.insert(guard))
    }

    async fn check_target(
        &self,
        target: &Target,
        store: &mut SnapshotStore,
        guard: &mut Option<MissingGuard>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Notification>, CheckError> {
        let url = target.url.as_str();
        match &target.rule.kind {
            RuleKind::Webpage {
                selectors,
                fetch_mode,
            } => {
                let guard = self.guard(guard)?;
                let html = self.fetcher.fetch_webpage(url, *fetch_mode).await?;
                let evaluation = evaluate_document(url, &html, selectors, store, guard, now)?;
                commit(url, evaluation, store, Some(guard))
            }
            RuleKind::Api { paths } => {
                let document = self.fetcher.fetch_json(url).await?;
                let evaluation = evaluate_json(url, &document, paths, store, now)?;
                commit(url, evaluation, store, None)
            }
        }
    }

    async fn fail(&self, target: &Target, err: &CheckError, today: NaiveDate, report: &mut CycleReport) {
        if !err.is_recoverable() {
            warn!(url = %target.url, "Check will keep failing until its rule or state file is fixed");
        }
        let notify = err.should_notify(target.rule.notify_on_error);
        self.fail_with(target, &err.to_string(), notify, today, report).await;
    }

    async fn fail_with(
        &self,
        target: &Target,
        message: &str,
        notify: bool,
        today: NaiveDate,
        report: &mut CycleReport,
    ) {
        error!(url = %target.url, error = message, "Check failed");

        if notify {
            let event = match target.rule.kind {
                RuleKind::Webpage { .. } => Notification::WebpageCheckFailed {
                    url: target.url.clone(),
                    error: message.to_owned(),
                },
                RuleKind::Api { .. } => Notification::ApiCheckFailed {
                    url: target.url.clone(),
                    error: message.to_owned(),
                },
            };
            self.sink.emit(&event).await;
            report.record(&event);
        } else {
            debug!(url = %target.url, "Failure notification suppressed by rule");
        }

        if let Err(e) = self.count(&target.url, today, 0, 1) {
            error!(url = %target.url, error = %e, "Failed to count failed check");
        }
    }

    fn count(&self, url: &str, today: NaiveDate, success: u64, fail: u64) -> Result<(), StoreError> {
        DailyLedger::increment(&self.state.daily_log(), url, today, success, fail)
    }

    /// Drops state of URLs that are no longer configured.
    fn prune(&self, store: &mut SnapshotStore, guard: &mut Option<MissingGuard>) {
        let removed_entries = store.retain_targets(self.config.rules.urls());
        if removed_entries > 0 {
            info!(removed = removed_entries, "Dropped snapshot entries of removed URLs");
            if let Err(e) = store.save() {
                error!(error = %e, "Failed to save snapshot store");
            }
        }

        let guard = match self.guard(guard) {
            Ok(guard) => guard,
            Err(e) => {
                warn!(error = %e, "Skipping guard cleanup");
                return;
            }
        };
        let removed_guards = guard.retain_targets(self.config.rules.urls());
        if removed_guards > 0 {
            info!(removed = removed_guards, "Dropped guard records of removed URLs");
            if let Err(e) = guard.save() {
                error!(error = %e, "Failed to save missing-element guard");
            }
        }
    }
}

/// Replaces the target's entries and persists the changed maps. `guard` is
/// `None` for targets that never keep guard records.
///
/// The in-memory maps are only updated once every file is written.
fn commit(
    url: &str,
    evaluation: Evaluation,
    store: &mut SnapshotStore,
    guard: Option<&mut MissingGuard>,
) -> Result<Vec<Notification>, CheckError> {
    let mut next_store = store.clone();
    next_store.replace_target(url, evaluation.snapshot);
    let next_guard = guard.as_deref().map(|current| {
        let mut next = current.clone();
        next.replace_target(url, evaluation.guard);
        next
    });

    if next_store != *store {
        next_store.save()?;
    }
    match &next_guard {
        Some(next) if guard.as_deref() != Some(next) => next.save()?,
        _ => {}
    }

    *store = next_store;
    if let (Some(current), Some(next)) = (guard, next_guard) {
        *current = next;
    }
    debug!(url, events = evaluation.events.len(), "Committed check");
    Ok(evaluation.events)
}
