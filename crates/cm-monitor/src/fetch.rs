//! Fetching webpages and API documents.
//!
//! The monitors only see the [`Fetcher`] trait, so a check can be driven
//! against canned documents in tests. [`HttpFetcher`] is the production
//! implementation backed by `reqwest`, with an optional [`BrowserSession`]
//! for JavaScript-rendered pages.

use std::future::Future;

use cm_core::{Config, FetchMode, FetchSettings};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Client, Proxy};
use serde_json::Value;
use tracing::{debug, warn};

use crate::browser::BrowserSession;
use crate::error::FetchError;

/// Source of documents for the monitors.
pub trait Fetcher {
    /// Fetches the HTML of `url` with the given mode.
    fn fetch_webpage(
        &self,
        url: &str,
        mode: FetchMode,
    ) -> impl Future<Output = Result<String, FetchError>> + Send;

    /// Fetches and decodes the JSON document at `url`.
    fn fetch_json(&self, url: &str) -> impl Future<Output = Result<Value, FetchError>> + Send;
}

/// `reqwest`-backed fetcher with separate webpage and API clients.
///
/// The API client sends `Accept: application/json` and goes through the
/// configured SOCKS5 proxy, if any. Webpage requests never use the proxy.
#[derive(Debug)]
pub struct HttpFetcher {
    webpage: Client,
    api: Client,
    browser: Option<BrowserSession>,
}

impl HttpFetcher {
    /// Builds both clients from `config`.
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let webpage = client_builder(&config.webpage).build()?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let mut api = client_builder(&config.api).default_headers(headers);
        if let Some(proxy) = &config.proxy {
            api = api.proxy(Proxy::all(proxy)?);
        }

        Ok(Self {
            webpage,
            api: api.build()?,
            browser: None,
        })
    }

    /// Attaches a browser session for [`FetchMode::Browser`] rules.
    #[must_use]
    pub fn with_browser(mut self, session: BrowserSession) -> Self {
        self.browser = Some(session);
        self
    }

    /// Returns the attached browser session.
    #[must_use]
    pub fn browser(&self) -> Option<&BrowserSession> {
        self.browser.as_ref()
    }

    /// Closes the browser session, if one is attached.
    pub async fn shutdown(self) {
        let Some(session) = self.browser else {
            return;
        };
        if let Err(e) = session.close().await {
            warn!(error = %e, "Failed to close browser session");
        }
    }
}

fn client_builder(settings: &FetchSettings) -> reqwest::ClientBuilder {
    Client::builder()
        .user_agent(settings.user_agent.as_str())
        .timeout(settings.timeout())
}

impl Fetcher for HttpFetcher {
    async fn fetch_webpage(&self, url: &str, mode: FetchMode) -> Result<String, FetchError> {
        match mode {
            FetchMode::Http => {
                let response = self.webpage.get(url).send().await?.error_for_status()?;
                let body = response.text().await?;
                debug!(url, bytes = body.len(), "Fetched webpage");
                Ok(body)
            }
            FetchMode::Browser => match &self.browser {
                Some(session) => session.page_source(url).await,
                None => Err(FetchError::other(
                    "browser fetch requested but no browser session is open",
                )),
            },
        }
    }

    async fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
        let response = self.api.get(url).send().await?.error_for_status()?;
        let document = response.json::<Value>().await?;
        debug!(url, "Fetched API document");
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchErrorKind;

    #[test]
    fn test_new_with_defaults() {
        let fetcher = HttpFetcher::new(&Config::default()).unwrap();
        assert!(fetcher.browser().is_none());
    }

    #[test]
    fn test_new_with_socks_proxy() {
        let config = Config {
            proxy: Some("socks5://127.0.0.1:9050".to_owned()),
            ..Config::default()
        };
        assert!(HttpFetcher::new(&config).is_ok());
    }

    #[tokio::test]
    async fn test_browser_mode_without_session() {
        let fetcher = HttpFetcher::new(&Config::default()).unwrap();
        let err = fetcher
            .fetch_webpage("https://example.com", FetchMode::Browser)
            .await
            .unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::Other);
        assert!(!err.is_transport());
    }
}
