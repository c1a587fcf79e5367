//! Observation keys.
//!
//! This module provides [`ObservationKey`], the stable string that identifies
//! one tracked value across polls.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of one tracked value.
///
/// - Webpage selector: `url:selector`
/// - API document: `url`
/// - API value: `url:path`
///
/// # Examples
///
/// ```
/// use cm_core::ObservationKey;
///
/// let key = ObservationKey::webpage("https://e.com", "h1");
/// assert_eq!(key.as_str(), "https://e.com:h1");
///
/// let key = ObservationKey::api_document("https://api.e.com");
/// assert_eq!(key.as_str(), "https://api.e.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObservationKey(String);

impl ObservationKey {
    /// Key for a CSS selector on a webpage.
    #[must_use]
    pub fn webpage(url: &str, selector: &str) -> Self {
        Self(format!("{url}:{selector}"))
    }

    /// Key for a whole API document.
    #[must_use]
    pub fn api_document(url: &str) -> Self {
        Self(url.to_owned())
    }

    /// Key for one extraction path of an API document.
    #[must_use]
    pub fn api_value(url: &str, path: &str) -> Self {
        Self(format!("{url}:{path}"))
    }

    /// Returns the key as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObservationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ObservationKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<String> for ObservationKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_constructors() {
        assert_eq!(ObservationKey::webpage("https://e.com", "div.a > p").as_str(), "https://e.com:div.a > p");
        assert_eq!(ObservationKey::api_value("https://e.com/api", "a.<x>").as_str(), "https://e.com/api:a.<x>");
        assert_eq!(ObservationKey::api_document("https://e.com/api").to_string(), "https://e.com/api");
    }

    #[test]
    fn test_key_serializes_as_plain_string() {
        let key = ObservationKey::webpage("https://e.com", "h1");
        assert_eq!(serde_json::to_string(&key).unwrap(), r#""https://e.com:h1""#);
    }

    #[test]
    fn test_key_borrow_lookup() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(ObservationKey::webpage("https://e.com", "h1"), 1);
        assert_eq!(map.get("https://e.com:h1"), Some(&1));
    }
}
