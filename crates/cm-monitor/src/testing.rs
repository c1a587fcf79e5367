//! In-memory fetcher and sink for driving checks in tests.

use cm_core::{FetchMode, FxHashMap, Notification};
use parking_lot::Mutex;
use serde_json::Value;

use crate::error::{FetchError, FetchErrorKind};
use crate::fetch::Fetcher;
use crate::sink::NotificationSink;

/// Serves canned documents per URL. Unknown URLs fail with a connection
/// error.
#[derive(Debug, Default)]
pub(crate) struct StubFetcher {
    pages: Mutex<FxHashMap<String, Result<String, FetchError>>>,
    documents: Mutex<FxHashMap<String, Result<Value, FetchError>>>,
    calls: Mutex<Vec<(String, Option<FetchMode>)>>,
}

impl StubFetcher {
    pub(crate) fn set_page(&self, url: &str, html: &str) {
        self.pages.lock().insert(url.to_owned(), Ok(html.to_owned()));
    }

    pub(crate) fn set_json(&self, url: &str, document: Value) {
        self.documents.lock().insert(url.to_owned(), Ok(document));
    }

    pub(crate) fn fail_page(&self, url: &str, kind: FetchErrorKind, message: &str) {
        self.pages
            .lock()
            .insert(url.to_owned(), Err(FetchError::new(kind, message)));
    }

    pub(crate) fn fail_json(&self, url: &str, kind: FetchErrorKind, message: &str) {
        self.documents
            .lock()
            .insert(url.to_owned(), Err(FetchError::new(kind, message)));
    }

    /// URLs fetched so far with the webpage mode (`None` for JSON fetches).
    pub(crate) fn calls(&self) -> Vec<(String, Option<FetchMode>)> {
        self.calls.lock().clone()
    }

    fn unknown(url: &str) -> FetchError {
        FetchError::new(FetchErrorKind::Connection, format!("no stub for {url}"))
    }
}

impl Fetcher for StubFetcher {
    async fn fetch_webpage(&self, url: &str, mode: FetchMode) -> Result<String, FetchError> {
        self.calls.lock().push((url.to_owned(), Some(mode)));
        let page = self.pages.lock().get(url).cloned();
        page.unwrap_or_else(|| Err(Self::unknown(url)))
    }

    async fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
        self.calls.lock().push((url.to_owned(), None));
        let document = self.documents.lock().get(url).cloned();
        document.unwrap_or_else(|| Err(Self::unknown(url)))
    }
}

/// Records every emitted notification.
#[derive(Debug, Default)]
pub(crate) struct RecordingSink {
    events: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    /// Drains the recorded notifications.
    pub(crate) fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Drains the recorded notifications, keeping only their kinds.
    pub(crate) fn take_kinds(&self) -> Vec<&'static str> {
        self.take().iter().map(Notification::kind).collect()
    }
}

impl NotificationSink for RecordingSink {
    async fn emit(&self, notification: &Notification) {
        self.events.lock().push(notification.clone());
    }
}
