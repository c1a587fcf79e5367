//! CLI entry point for the content monitor.
//!
//! Polls the configured webpages and APIs at a fixed interval, reports
//! changes to a Discord webhook, and sends a daily summary shortly after
//! midnight.
//!
//! # Usage
//!
//! ```bash
//! content-monitor \
//!   --storage-dir /var/lib/content-monitor \
//!   --webhook https://discord.com/api/webhooks/... \
//!   --mention-users 1234,5678 \
//!   --rules '{"https://example.com": {"webpage_check": true, "selectors": ["h1"]}}'
//!
//! # Single poll cycle, debug logging
//! content-monitor --once --verbose --storage-dir ./state --webhook ... --rules ...
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

use std::time::Duration;

use camino::Utf8PathBuf;
use chrono::{Local, Timelike};
use clap::Parser;
use cm_core::config::DEFAULT_USER_AGENT;
use cm_core::{Config, FetchSettings, Rules};
use cm_monitor::{
    BrowserSession, Checker, DEFAULT_FOOTER, DiscordWebhook, Fetcher, HttpFetcher, NotificationSink,
};
use color_eyre::eyre::WrapErr;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Monitors webpages and JSON APIs for content changes.
///
/// Each poll cycle fetches every configured URL once, compares the extracted
/// values with the previous cycle and notifies a Discord webhook about
/// first-seen values, changes, missing elements and failures.
#[derive(Debug, Parser)]
#[command(name = "content-monitor", version, about, long_about = None)]
struct Cli {
    /// Directory holding the persisted state files.
    #[arg(long, env = "CONTENT_MONITOR_STORAGE_DIR")]
    storage_dir: Utf8PathBuf,

    /// Discord webhook URL.
    #[arg(long, env = "CONTENT_MONITOR_WEBHOOK")]
    webhook: String,

    /// Comma-separated Discord user IDs to ping on changes.
    #[arg(long, env = "CONTENT_MONITOR_MENTION_USERS", value_delimiter = ',')]
    mention_users: Vec<String>,

    /// Seconds between poll cycles.
    #[arg(long, env = "CONTENT_MONITOR_INTERVAL", default_value_t = 300)]
    interval: u64,

    /// JSON document mapping each URL to its rule.
    #[arg(long, env = "CONTENT_MONITOR_RULES")]
    rules: String,

    /// User agent for webpage checks.
    #[arg(long, env = "CONTENT_MONITOR_WEBPAGE_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    webpage_user_agent: String,

    /// User agent for API checks.
    #[arg(long, env = "CONTENT_MONITOR_API_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    api_user_agent: String,

    /// Timeout for webpage checks, in seconds.
    #[arg(long, env = "CONTENT_MONITOR_WEBPAGE_TIMEOUT", default_value_t = 5)]
    webpage_timeout: u64,

    /// Timeout for API checks, in seconds.
    #[arg(long, env = "CONTENT_MONITOR_API_TIMEOUT", default_value_t = 5)]
    api_timeout: u64,

    /// SOCKS5 proxy for API checks (`socks5://host:port`).
    #[arg(long, env = "CONTENT_MONITOR_SOCKS5_PROXY")]
    socks5_proxy: Option<String>,

    /// Chrome or Chromium binary for rules with `use_selenium`
    /// (default: auto-detected).
    #[arg(long, env = "CONTENT_MONITOR_CHROME_EXECUTABLE")]
    chrome_executable: Option<Utf8PathBuf>,

    /// Run a single poll cycle and exit.
    #[arg(long)]
    once: bool,

    /// Enable verbose logging (debug level).
    #[arg(short, long)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long)]
    no_color: bool,
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber for logging.
///
/// Respects the `RUST_LOG` environment variable if set. Otherwise, uses
/// `debug` level if `--verbose` is set, or `info` level by default.
/// Noisy HTTP and HTML parsing crates are filtered to `warn` level.
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(format!(
            "{level},hyper=warn,hyper_util=warn,reqwest=warn,html5ever=warn,selectors=warn"
        ))
    });

    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_ansi(use_ansi))
        .with(filter)
        .init();
}

/// Builds and validates a [`Config`] from CLI arguments.
fn build_config(cli: &Cli) -> color_eyre::Result<Config> {
    let rules = Rules::from_json(&cli.rules).wrap_err("Invalid --rules")?;

    let config = Config {
        storage_dir: cli.storage_dir.clone(),
        interval_secs: cli.interval,
        webpage: FetchSettings {
            timeout_secs: cli.webpage_timeout,
            user_agent: cli.webpage_user_agent.clone(),
        },
        api: FetchSettings {
            timeout_secs: cli.api_timeout,
            user_agent: cli.api_user_agent.clone(),
        },
        proxy: cli.socks5_proxy.clone(),
        browser_executable: cli.chrome_executable.clone(),
        rules,
    };
    config.validate()?;

    std::fs::create_dir_all(&config.storage_dir)
        .wrap_err_with(|| format!("Failed to create storage directory {}", config.storage_dir))?;

    Ok(config)
}

/// Creates the HTTP fetcher, opening a browser session if any rule needs one.
async fn create_fetcher(config: &Config) -> color_eyre::Result<HttpFetcher> {
    let fetcher = HttpFetcher::new(config).wrap_err("Failed to build HTTP clients")?;
    if !config.rules.uses_browser() {
        return Ok(fetcher);
    }

    let session = BrowserSession::launch(config.browser_executable.as_deref(), config.webpage.timeout())
        .await
        .wrap_err("Failed to launch headless browser")?;
    Ok(fetcher.with_browser(session))
}

// =============================================================================
// SHUTDOWN HANDLING
// =============================================================================

/// Ctrl-C and SIGTERM listeners, registered up front so a signal that
/// arrives mid-cycle is seen once the cycle ends.
#[cfg(unix)]
struct Shutdown {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl Shutdown {
    fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    async fn recv(&mut self) {
        tokio::select! {
            _ = self.interrupt.recv() => info!("Received SIGINT, shutting down"),
            _ = self.terminate.recv() => info!("Received SIGTERM, shutting down"),
        }
    }
}

#[cfg(not(unix))]
struct Shutdown;

#[cfg(not(unix))]
impl Shutdown {
    #[allow(clippy::unnecessary_wraps)] // Same signature as the unix variant
    fn install() -> std::io::Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl-C, shutting down");
        }
    }
}

// =============================================================================
// MONITOR LOOP
// =============================================================================

/// Runs poll cycles until `once` is set or a shutdown signal arrives.
///
/// The next cycle starts `interval` after the previous one finished. After
/// each cycle during the local midnight hour, yesterday's summary is sent if
/// it has not been sent yet.
async fn monitor_loop<F, S>(
    checker: &Checker<'_, F, S>,
    interval: Duration,
    once: bool,
    shutdown: &mut Shutdown,
) where
    F: Fetcher,
    S: NotificationSink,
{
    loop {
        checker.run_cycle().await;

        let now = Local::now();
        if now.hour() == 0 {
            if let Err(e) = checker.send_daily_summary(now.date_naive()).await {
                error!(error = %e, "Failed to send daily summary");
            }
        }

        if once {
            break;
        }

        tokio::select! {
            () = tokio::time::sleep(interval) => {}
            () = shutdown.recv() => break,
        }
    }
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
#[tokio::main(flavor = "current_thread")]
async fn main() -> color_eyre::Result<()> {
    // 1. Install color-eyre FIRST (before any potential panics)
    color_eyre::install()?;

    // 2. Parse CLI arguments
    let cli = Cli::parse();

    // 3. Initialize tracing (handles --no-color for log output)
    init_tracing(cli.verbose, cli.no_color);

    // 4. Build configuration and collaborators
    let config = build_config(&cli)?;
    let mut shutdown = Shutdown::install().wrap_err("Failed to install signal handlers")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        interval = config.interval_secs,
        targets = config.rules.len(),
        webpage_timeout = config.webpage.timeout_secs,
        api_timeout = config.api.timeout_secs,
        proxy = config.proxy.is_some(),
        "Starting content monitor"
    );
    if config.rules.is_empty() {
        warn!("No rules configured, poll cycles will do nothing");
    }

    let sink = DiscordWebhook::new(cli.webhook.as_str(), cli.mention_users.clone())
        .wrap_err("Failed to build webhook client")?
        .with_footer(format!("{DEFAULT_FOOTER} v{}", env!("CARGO_PKG_VERSION")));
    let fetcher = create_fetcher(&config).await?;
    let checker = Checker::new(&config, fetcher, sink);

    // 5. Poll until stopped, then release the browser session
    monitor_loop(&checker, config.interval(), cli.once, &mut shutdown).await;
    checker.into_fetcher().shutdown().await;

    info!("Content monitor stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    const RULES: &str = r#"{"https://e.com": {"webpage_check": true, "selectors": ["h1"]}}"#;

    fn parse(extra: &[&str]) -> Cli {
        let dir = std::env::temp_dir();
        let mut args = vec![
            "content-monitor",
            "--storage-dir",
            dir.to_str().unwrap(),
            "--webhook",
            "https://discord.com/api/webhooks/1/token",
            "--rules",
            RULES,
        ];
        args.extend_from_slice(extra);
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&[]);
        assert_eq!(cli.interval, 300);
        assert_eq!(cli.webpage_timeout, 5);
        assert_eq!(cli.api_user_agent, DEFAULT_USER_AGENT);
        assert!(cli.mention_users.is_empty());
        assert!(!cli.once);
    }

    #[test]
    fn test_mention_users_split_on_commas() {
        let cli = parse(&["--mention-users", "1,2,3"]);
        assert_eq!(cli.mention_users, ["1", "2", "3"]);
    }

    #[test]
    fn test_build_config() {
        let cli = parse(&["--interval", "60", "--socks5-proxy", "socks5://127.0.0.1:9050"]);
        let config = build_config(&cli).unwrap();
        assert_eq!(config.interval(), Duration::from_secs(60));
        assert_eq!(config.rules.len(), 1);
        assert_eq!(config.proxy.as_deref(), Some("socks5://127.0.0.1:9050"));
    }

    #[test]
    fn test_build_config_chrome_executable() {
        assert!(build_config(&parse(&[])).unwrap().browser_executable.is_none());

        let cli = parse(&["--chrome-executable", "/opt/chromium/chrome"]);
        let config = build_config(&cli).unwrap();
        assert_eq!(config.browser_executable.as_deref().map(camino::Utf8Path::as_str), Some("/opt/chromium/chrome"));
    }

    #[test]
    fn test_build_config_rejects_short_interval() {
        let cli = parse(&["--interval", "1"]);
        assert!(build_config(&cli).is_err());
    }

    #[test]
    fn test_build_config_rejects_http_proxy() {
        let cli = parse(&["--socks5-proxy", "http://proxy:8080"]);
        assert!(build_config(&cli).is_err());
    }

    #[test]
    fn test_build_config_rejects_invalid_rules() {
        let mut cli = parse(&[]);
        cli.rules = r#"{"https://e.com": {"webpage_check": true}}"#.to_owned();
        assert!(build_config(&cli).is_err());
    }
}
