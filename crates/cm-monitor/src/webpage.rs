//! The webpage monitor.
//!
//! A page is fetched once and every configured selector is evaluated
//! against the same document. For each selector the first matching element
//! goes through the presence model (missing, returned, present) and, when
//! present, through change classification of its outer HTML.

use chrono::{DateTime, Utc};
use cm_core::{
    MissingEntry, Notification, ObservationKey, Presence, SnapshotEntry, Transition, classify,
    presence,
};
use cm_store::{MissingGuard, SnapshotStore};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};

use crate::error::CheckError;
use crate::outcome::Evaluation;

/// Evaluates `html` fetched from `url` against `selectors`.
///
/// Pure: reads the current `store` and `guard`, returns what should be
/// committed. A selector that does not parse fails the whole check before
/// anything is evaluated.
pub fn evaluate_document(
    url: &str,
    html: &str,
    selectors: &[String],
    store: &SnapshotStore,
    guard: &MissingGuard,
    now: DateTime<Utc>,
) -> Result<Evaluation, CheckError> {
    let parsed = selectors
        .iter()
        .map(|raw| {
            Selector::parse(raw)
                .map(|selector| (raw.as_str(), selector))
                .map_err(|e| CheckError::selector(raw.as_str(), e))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let document = Html::parse_document(html);
    let mut evaluation = Evaluation::default();

    for (raw, selector) in &parsed {
        let key = ObservationKey::webpage(url, raw);
        let element = document.select(selector).next();
        let prior_guard = guard.get(key.as_str());
        let prior = store.get(key.as_str());

        match presence(element.is_some(), prior_guard) {
            Presence::StillMissing => {
                debug!(url, selector = raw, "Element still missing");
                if let Some(entry) = prior_guard {
                    evaluation.guard.push((key.clone(), entry.clone()));
                }
                carry_over(&mut evaluation, key, prior);
            }
            Presence::NewlyMissing => {
                warn!(url, selector = raw, "Element missing");
                let first_missing_at = prior_guard.map_or(now, |entry| entry.first_missing_at);
                evaluation.guard.push((
                    key.clone(),
                    MissingEntry {
                        url: url.to_owned(),
                        selector: (*raw).to_owned(),
                        first_missing_at,
                        alert_sent: true,
                    },
                ));
                evaluation.events.push(Notification::ElementMissing {
                    url: url.to_owned(),
                    selector: (*raw).to_owned(),
                });
                carry_over(&mut evaluation, key, prior);
            }
            found @ (Presence::Present | Presence::Returned) => {
                if found == Presence::Returned {
                    info!(url, selector = raw, "Element returned");
                    evaluation.events.push(Notification::ElementReturned {
                        url: url.to_owned(),
                        selector: (*raw).to_owned(),
                    });
                }
                if let Some(element) = element {
                    observe(&mut evaluation, url, raw, key, element, prior, now);
                }
            }
        }
    }

    Ok(evaluation)
}

/// Classifies a present element and records its new snapshot entry.
fn observe(
    evaluation: &mut Evaluation,
    url: &str,
    selector: &str,
    key: ObservationKey,
    element: ElementRef<'_>,
    prior: Option<&SnapshotEntry>,
    now: DateTime<Utc>,
) {
    let html = element.html();
    let text = element_text(element);

    let transition = classify(prior.and_then(SnapshotEntry::html), html.as_str());
    debug!(url, selector, transition = transition.label(), "Element classified");

    match transition {
        Transition::FirstSeen => {
            info!(url, selector, "First-time content detected");
            evaluation.events.push(Notification::FirstTimeWebpage {
                url: url.to_owned(),
                selector: selector.to_owned(),
                text: text.clone(),
            });
        }
        Transition::Changed => {
            info!(url, selector, "Content change detected");
            evaluation.events.push(Notification::ContentChange {
                url: url.to_owned(),
                selector: selector.to_owned(),
                old_text: prior.and_then(SnapshotEntry::text).unwrap_or_default().to_owned(),
                new_text: text.clone(),
                last_updated: prior.map(|entry| entry.captured_at),
            });
        }
        Transition::Unchanged => {}
    }

    let captured_at = match prior {
        Some(entry) if !transition.is_notable() => entry.captured_at,
        _ => now,
    };

    evaluation
        .snapshot
        .push((key, SnapshotEntry::webpage(url, html, text, captured_at)));
}

/// Keeps the stored value of an absent element so a later return can be
/// compared against it.
fn carry_over(evaluation: &mut Evaluation, key: ObservationKey, prior: Option<&SnapshotEntry>) {
    if let Some(entry) = prior {
        evaluation.snapshot.push((key, entry.clone()));
    }
}

/// Text nodes of the element, each trimmed, empty ones dropped, joined
/// without a separator.
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    const URL: &str = "https://e.com";

    fn t(offset_secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(offset_secs)
    }

    fn selectors(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_owned()).collect()
    }

    /// Evaluates and commits like the poll cycle does.
    fn poll(
        html: &str,
        list: &[&str],
        store: &mut SnapshotStore,
        guard: &mut MissingGuard,
        now: DateTime<Utc>,
    ) -> Evaluation {
        let evaluation = evaluate_document(URL, html, &selectors(list), store, guard, now).unwrap();
        store.replace_target(URL, evaluation.snapshot.clone());
        guard.replace_target(URL, evaluation.guard.clone());
        evaluation
    }

    #[test]
    fn test_first_seen_then_unchanged() {
        let mut store = SnapshotStore::in_memory();
        let mut guard = MissingGuard::in_memory();
        let page = "<html><body><h1> Hello <b>World</b> </h1></body></html>";

        let first = poll(page, &["h1"], &mut store, &mut guard, t(0));
        assert_eq!(first.event_kinds(), ["first_time_webpage"]);
        let entry = store.get("https://e.com:h1").unwrap();
        assert_eq!(entry.text(), Some("HelloWorld"));
        assert_eq!(entry.html(), Some("<h1> Hello <b>World</b> </h1>"));

        let second = poll(page, &["h1"], &mut store, &mut guard, t(300));
        assert!(second.events.is_empty());
        assert_eq!(store.get("https://e.com:h1").unwrap().captured_at, t(0));
    }

    #[test]
    fn test_content_change_scenario() {
        let mut store = SnapshotStore::in_memory();
        let mut guard = MissingGuard::in_memory();

        poll("<h1>Hello</h1>", &["h1"], &mut store, &mut guard, t(0));
        let changed = poll("<h1>World</h1>", &["h1"], &mut store, &mut guard, t(300));

        assert_eq!(
            changed.events,
            [Notification::ContentChange {
                url: URL.to_owned(),
                selector: "h1".to_owned(),
                old_text: "Hello".to_owned(),
                new_text: "World".to_owned(),
                last_updated: Some(t(0)),
            }]
        );
        assert_eq!(store.get("https://e.com:h1").unwrap().captured_at, t(300));
    }

    #[test]
    fn test_missing_then_returned_scenario() {
        let mut store = SnapshotStore::in_memory();
        let mut guard = MissingGuard::in_memory();

        poll("<div id='x'>A</div>", &["#x"], &mut store, &mut guard, t(0));

        let missing = poll("<p>nothing</p>", &["#x"], &mut store, &mut guard, t(300));
        assert_eq!(missing.event_kinds(), ["element_missing"]);
        let record = guard.get("https://e.com:#x").unwrap();
        assert!(record.alert_sent);
        assert_eq!(record.first_missing_at, t(300));
        assert_eq!(store.get("https://e.com:#x").and_then(SnapshotEntry::text), Some("A"));

        let silent = poll("<p>nothing</p>", &["#x"], &mut store, &mut guard, t(600));
        assert!(silent.events.is_empty());
        assert_eq!(guard.get("https://e.com:#x").unwrap().first_missing_at, t(300));

        let returned = poll("<div id='x'>A</div>", &["#x"], &mut store, &mut guard, t(900));
        assert_eq!(returned.event_kinds(), ["element_returned"]);
        assert!(guard.is_empty());
    }

    #[test]
    fn test_returned_with_changed_content_is_classified() {
        let mut store = SnapshotStore::in_memory();
        let mut guard = MissingGuard::in_memory();

        poll("<div id='x'>A</div>", &["#x"], &mut store, &mut guard, t(0));
        poll("<p></p>", &["#x"], &mut store, &mut guard, t(300));
        let returned = poll("<div id='x'>B</div>", &["#x"], &mut store, &mut guard, t(600));

        assert_eq!(returned.event_kinds(), ["element_returned", "content_change"]);
    }

    #[test]
    fn test_unalerted_guard_keeps_first_missing_at() {
        let store = SnapshotStore::in_memory();
        let mut guard = MissingGuard::in_memory();
        let key = ObservationKey::webpage(URL, "h1");
        guard.replace_target(
            URL,
            [(
                key.clone(),
                MissingEntry {
                    url: URL.to_owned(),
                    selector: "h1".to_owned(),
                    first_missing_at: t(0),
                    alert_sent: false,
                },
            )],
        );

        let evaluation =
            evaluate_document(URL, "<p></p>", &selectors(&["h1"]), &store, &guard, t(500)).unwrap();
        assert_eq!(evaluation.event_kinds(), ["element_missing"]);
        let record = evaluation.guard_entry(key.as_str()).unwrap();
        assert!(record.alert_sent);
        assert_eq!(record.first_missing_at, t(0));
    }

    #[test]
    fn test_selectors_share_one_document() {
        let mut store = SnapshotStore::in_memory();
        let mut guard = MissingGuard::in_memory();
        let page = "<h1>Title</h1><span class='price'>10</span><span class='price'>20</span>";

        let evaluation = poll(page, &["h1", ".price", "#gone"], &mut store, &mut guard, t(0));
        assert_eq!(
            evaluation.event_kinds(),
            ["first_time_webpage", "first_time_webpage", "element_missing"]
        );
        assert_eq!(store.get("https://e.com:.price").and_then(SnapshotEntry::text), Some("10"));
    }

    #[test]
    fn test_removed_selector_is_dropped() {
        let mut store = SnapshotStore::in_memory();
        let mut guard = MissingGuard::in_memory();

        poll("<h1>a</h1><h2>b</h2>", &["h1", "h2"], &mut store, &mut guard, t(0));
        poll("<h1>a</h1><h2>b</h2>", &["h1"], &mut store, &mut guard, t(300));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_invalid_selector_fails_whole_check() {
        let store = SnapshotStore::in_memory();
        let guard = MissingGuard::in_memory();
        let result =
            evaluate_document(URL, "<h1>a</h1>", &selectors(&["h1", "h1[["]), &store, &guard, t(0));

        let err = result.unwrap_err();
        assert!(matches!(err, CheckError::Selector { ref selector, .. } if selector == "h1[["));
        assert!(err.should_notify(false));
    }
}
