//! JSON value extraction by dot-separated path.
//!
//! A path such as `days.<x>.day` is split on `.` and evaluated left to right:
//!
//! - [`WILDCARD`] requires a list and applies the rest of the path to every
//!   element, producing a list of the per-element results. Wildcards nest.
//! - A segment made only of ASCII digits indexes into a list.
//! - Anything else looks up a key in an object.
//!
//! Extraction is all-or-nothing: any failing element fails the whole path.
//!
//! # Examples
//!
//! ```
//! use cm_core::extract;
//! use serde_json::json;
//!
//! let doc = json!({"items": [{"price": 10}, {"price": 20}]});
//! assert_eq!(extract(&doc, "items.<x>.price").unwrap(), json!([10, 20]));
//! assert_eq!(extract(&doc, "items.1.price").unwrap(), json!(20));
//! assert!(extract(&doc, "items.price").is_err());
//! ```

use std::collections::BTreeMap;

use serde_json::Value;
use smallvec::SmallVec;

use crate::error::PathError;

/// Path segment that broadcasts the remainder of the path over a list.
pub const WILDCARD: &str = "<x>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Wildcard,
    Index(&'a str),
    Key(&'a str),
}

impl<'a> Segment<'a> {
    fn parse(raw: &'a str) -> Self {
        if raw == WILDCARD {
            Self::Wildcard
        } else if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            Self::Index(raw)
        } else {
            Self::Key(raw)
        }
    }
}

/// Extracts the value at `path` from `document`.
///
/// # Errors
///
/// Returns a [`PathError`] carrying the full `path` when a wildcard meets a
/// non-list, a key is absent, a key is applied to a non-object, or an index
/// is out of range or applied to a non-list.
pub fn extract(document: &Value, path: &str) -> Result<Value, PathError> {
    let segments: SmallVec<[Segment<'_>; 8]> = path.split('.').map(Segment::parse).collect();
    walk(document, &segments).map_err(|detail| PathError::new(path, detail))
}

/// Extracts every path in `paths`, keyed by path.
///
/// Paths are evaluated independently; the first failure aborts the batch.
pub fn extract_all<'p>(
    document: &Value,
    paths: impl IntoIterator<Item = &'p str>,
) -> Result<BTreeMap<String, Value>, PathError> {
    paths
        .into_iter()
        .map(|path| extract(document, path).map(|value| (path.to_owned(), value)))
        .collect()
}

fn walk(current: &Value, segments: &[Segment<'_>]) -> Result<Value, String> {
    let Some((head, rest)) = segments.split_first() else {
        return Ok(current.clone());
    };

    match *head {
        Segment::Wildcard => {
            let Value::Array(items) = current else {
                return Err(format!(
                    "expected list for '{WILDCARD}' placeholder, got {}",
                    type_name(current)
                ));
            };
            items
                .iter()
                .map(|item| walk(item, rest))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        Segment::Index(raw) => {
            let Value::Array(items) = current else {
                return Err(format!("cannot index {} with '{raw}'", type_name(current)));
            };
            let next = raw
                .parse::<usize>()
                .ok()
                .and_then(|index| items.get(index))
                .ok_or_else(|| format!("index {raw} out of range for list of length {}", items.len()))?;
            walk(next, rest)
        }
        Segment::Key(key) => {
            let Value::Object(map) = current else {
                return Err(format!("cannot look up key '{key}' in {}", type_name(current)));
            };
            let next = map.get(key).ok_or_else(|| format!("key '{key}' not found"))?;
            walk(next, rest)
        }
    }
}

const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn forecast() -> Value {
        json!({
            "city": "Oslo",
            "days": [
                {"day": "mon", "temps": [1, 2]},
                {"day": "tue", "temps": [3, 4, 5]}
            ]
        })
    }

    #[test]
    fn test_plain_key_and_index() {
        let doc = forecast();
        assert_eq!(extract(&doc, "city").unwrap(), json!("Oslo"));
        assert_eq!(extract(&doc, "days.0.day").unwrap(), json!("mon"));
        assert_eq!(extract(&doc, "days.1.temps.2").unwrap(), json!(5));
    }

    #[test]
    fn test_matches_direct_lookup() {
        let doc = forecast();
        assert_eq!(extract(&doc, "days.1.temps").unwrap(), doc["days"][1]["temps"]);
        assert_eq!(extract(&doc, "days.1.temps").unwrap(), extract(&doc, "days.1.temps").unwrap());
    }

    #[test]
    fn test_wildcard_broadcast() {
        let doc = forecast();
        let days = extract(&doc, "days.<x>.day").unwrap();
        assert_eq!(days, json!(["mon", "tue"]));
        assert_eq!(days.as_array().map(Vec::len), doc["days"].as_array().map(Vec::len));
    }

    #[test]
    fn test_nested_wildcards() {
        let doc = forecast();
        assert_eq!(extract(&doc, "days.<x>.temps.<x>").unwrap(), json!([[1, 2], [3, 4, 5]]));
    }

    #[test]
    fn test_wildcard_over_empty_list() {
        let doc = json!({"items": []});
        assert_eq!(extract(&doc, "items.<x>.price").unwrap(), json!([]));
    }

    #[test]
    fn test_wildcard_on_non_list() {
        let err = extract(&forecast(), "city.<x>").unwrap_err();
        assert_eq!(err.path, "city.<x>");
        assert!(err.detail.contains("got string"));
    }

    #[test]
    fn test_missing_key() {
        let err = extract(&forecast(), "days.0.night").unwrap_err();
        assert_eq!(err.path, "days.0.night");
        assert!(err.detail.contains("'night'"));
    }

    #[test]
    fn test_index_out_of_range() {
        let err = extract(&forecast(), "days.7.day").unwrap_err();
        assert!(err.detail.contains("out of range"));
    }

    #[test]
    fn test_numeric_segment_on_object() {
        let doc = json!({"0": "zero"});
        assert!(extract(&doc, "0").is_err());
    }

    #[test]
    fn test_wildcard_is_all_or_nothing() {
        let doc = json!({"items": [{"price": 10}, {"cost": 20}]});
        let err = extract(&doc, "items.<x>.price").unwrap_err();
        assert_eq!(err.path, "items.<x>.price");
    }

    #[test]
    fn test_extract_all() {
        let doc = forecast();
        let values = extract_all(&doc, ["city", "days.<x>.day"]).unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values["city"], json!("Oslo"));

        assert!(extract_all(&doc, ["city", "nope"]).is_err());
    }
}
