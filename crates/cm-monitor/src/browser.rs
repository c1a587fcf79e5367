//! A headless Chromium session driven over the DevTools protocol.
//!
//! Used for pages that only render their content with JavaScript. One
//! browser is launched per process and reused for every browser-mode rule;
//! each fetch opens a fresh tab and closes it again. The browser must be
//! shut down explicitly with [`BrowserSession::close`].

use std::fmt;
use std::time::Duration;

use camino::Utf8Path;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures_util::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{FetchError, FetchErrorKind};

/// Extra Chromium switches on top of headless mode and `--no-sandbox`.
const CHROME_ARGS: [&str; 2] = ["--disable-gpu", "--disable-dev-shm-usage"];

/// Upper bound on a single DevTools request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// A running headless browser.
pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    page_load_timeout: Duration,
}

impl fmt::Debug for BrowserSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserSession")
            .field("page_load_timeout", &self.page_load_timeout)
            .finish_non_exhaustive()
    }
}

impl BrowserSession {
    /// Launches headless Chromium.
    ///
    /// `executable` overrides the binary; `None` looks for an installed
    /// Chrome or Chromium. Page loads taking longer than
    /// `page_load_timeout` fail with a timeout.
    pub async fn launch(executable: Option<&Utf8Path>, page_load_timeout: Duration) -> Result<Self, FetchError> {
        let config = browser_config(executable)?;
        let (browser, mut events) = Browser::launch(config).await?;

        // The connection only makes progress while its event stream is polled.
        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "Browser connection event failed");
                }
            }
        });

        info!(executable = ?executable, "Browser session started");
        Ok(Self {
            browser,
            handler,
            page_load_timeout,
        })
    }

    /// Loads `url` in a new tab and returns the rendered HTML.
    pub async fn page_source(&self, url: &str) -> Result<String, FetchError> {
        let page = self.browser.new_page("about:blank").await?;

        let loaded = tokio::time::timeout(self.page_load_timeout, async {
            page.goto(url).await?;
            page.content().await
        })
        .await;

        if let Err(e) = page.close().await {
            warn!(url, error = %e, "Failed to close browser tab");
        }

        let source = loaded.map_err(|_| page_load_timeout(self.page_load_timeout))??;
        debug!(url, bytes = source.len(), "Fetched page through browser");
        Ok(source)
    }

    /// Shuts the browser down and waits for the process to exit.
    pub async fn close(mut self) -> Result<(), FetchError> {
        self.browser.close().await?;
        if let Err(e) = self.browser.wait().await {
            warn!(error = %e, "Browser process did not exit cleanly");
        }
        if let Err(e) = self.handler.await {
            warn!(error = %e, "Browser connection task failed");
        }
        info!("Browser session closed");
        Ok(())
    }
}

/// Headless Chromium configuration.
fn browser_config(executable: Option<&Utf8Path>) -> Result<BrowserConfig, FetchError> {
    let mut builder = BrowserConfig::builder()
        .no_sandbox()
        .request_timeout(REQUEST_TIMEOUT)
        .args(CHROME_ARGS);
    if let Some(path) = executable {
        builder = builder.chrome_executable(path.as_std_path());
    }
    builder
        .build()
        .map_err(|e| FetchError::other(format!("invalid browser configuration: {e}")))
}

fn page_load_timeout(limit: Duration) -> FetchError {
    FetchError::new(
        FetchErrorKind::Timeout,
        format!("page load timed out after {}s", limit.as_secs()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chromiumoxide::error::CdpError;

    #[test]
    fn test_browser_config_with_executable() {
        assert!(browser_config(Some(Utf8Path::new("/usr/bin/chromium"))).is_ok());
    }

    #[test]
    fn test_page_load_timeout_is_transport() {
        let err = page_load_timeout(Duration::from_secs(5));
        assert_eq!(err.kind, FetchErrorKind::Timeout);
        assert_eq!(err.message, "page load timed out after 5s");
        assert!(err.is_transport());
    }

    #[test]
    fn test_devtools_errors() {
        let timeout = FetchError::from(CdpError::Timeout);
        assert_eq!(timeout.kind, FetchErrorKind::Timeout);

        let other = FetchError::from(CdpError::NoResponse);
        assert_eq!(other.kind, FetchErrorKind::Other);
        assert!(!other.is_transport());
    }
}
