//! The API monitor.
//!
//! A JSON document is fetched once, every configured path is extracted, and
//! the results are stored together as a single entry keyed by the URL.
//! Each path is classified on its own against the value stored for it.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use cm_core::{Notification, ObservationKey, SnapshotEntry, Transition, classify, extract_all};
use cm_store::SnapshotStore;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::CheckError;
use crate::outcome::Evaluation;

/// Evaluates `document` fetched from `url` against `paths`.
///
/// Pure: reads the current `store`, returns what should be committed.
/// Extraction is all-or-nothing; one bad path fails the check. An empty
/// document (`null`, `false`, `0`, `""`, `[]`, `{}`) is a successful check
/// that keeps the stored entry as it is.
pub fn evaluate_json(
    url: &str,
    document: &Value,
    paths: &[String],
    store: &SnapshotStore,
    now: DateTime<Utc>,
) -> Result<Evaluation, CheckError> {
    let key = ObservationKey::api_document(url);
    let prior = store.get(key.as_str());

    if is_empty_document(document) {
        warn!(url, "No data found");
        return Ok(Evaluation {
            snapshot: prior.map(|entry| (key, entry.clone())).into_iter().collect(),
            ..Evaluation::default()
        });
    }

    let extracted: BTreeMap<String, Value> = extract_all(document, paths.iter().map(String::as_str))?;
    let mut evaluation = Evaluation::default();
    let mut touched = false;

    // Configured order, not map order.
    for path in paths {
        let Some(new) = extracted.get(path) else {
            continue;
        };
        let old = prior.and_then(|entry| entry.api_value(path));

        let transition = classify(old, new);
        debug!(url, path, transition = transition.label(), "API value classified");
        touched |= transition.is_notable();

        match transition {
            Transition::FirstSeen => {
                info!(url, path, "First-time API tracking");
                evaluation.events.push(Notification::FirstTimeApi {
                    url: url.to_owned(),
                    path: path.clone(),
                    value: new.clone(),
                });
            }
            Transition::Changed => {
                info!(url, path, "API data changed");
                evaluation.events.push(Notification::ApiContentChange {
                    url: url.to_owned(),
                    path: path.clone(),
                    old: old.cloned().unwrap_or(Value::Null),
                    new: new.clone(),
                    last_updated: prior.map(|entry| entry.captured_at),
                });
            }
            Transition::Unchanged => {}
        }
    }

    let captured_at = match prior {
        Some(entry) if !touched => entry.captured_at,
        _ => now,
    };
    evaluation
        .snapshot
        .push((key, SnapshotEntry::api(url, extracted, captured_at)));
    Ok(evaluation)
}

fn is_empty_document(document: &Value) -> bool {
    match document {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}
