//! Delivering notifications.
//!
//! The monitors hand every [`Notification`] to a [`NotificationSink`].
//! Delivery is fire-and-forget: a sink logs its own failures and never
//! reports them back, so a broken webhook cannot fail a check.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use cm_core::{Embed, Notification};
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, error};

use crate::error::FetchError;

/// Default footer text of every embed.
pub const DEFAULT_FOOTER: &str = "Content monitoring system";

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Receiver of monitor events.
pub trait NotificationSink {
    /// Delivers one notification. Failures are handled by the sink.
    fn emit(&self, notification: &Notification) -> impl Future<Output = ()> + Send;
}

/// Posts notifications to a Discord webhook as embeds.
///
/// # Examples
///
/// ```
/// use cm_monitor::DiscordWebhook;
///
/// let sink = DiscordWebhook::new(
///     "https://discord.com/api/webhooks/1/token",
///     vec!["1234".to_owned()],
/// )?;
/// # Ok::<(), cm_monitor::FetchError>(())
/// ```
#[derive(Debug, Clone)]
pub struct DiscordWebhook {
    client: Client,
    url: String,
    mention_users: Vec<String>,
    footer: String,
}

impl DiscordWebhook {
    /// Creates a sink for the webhook at `url`, pinging `mention_users` on
    /// events that ask for attention.
    pub fn new(url: impl Into<String>, mention_users: Vec<String>) -> Result<Self, FetchError> {
        Ok(Self {
            client: Client::builder().timeout(WEBHOOK_TIMEOUT).build()?,
            url: url.into(),
            mention_users,
            footer: DEFAULT_FOOTER.to_owned(),
        })
    }

    /// Replaces the footer text.
    #[must_use]
    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = footer.into();
        self
    }

    /// Builds the webhook request body for `embed`, stamped with `at`.
    #[must_use]
    pub fn payload(&self, embed: &Embed, at: DateTime<Utc>) -> Value {
        let fields: Vec<Value> = embed
            .fields
            .iter()
            .map(|field| json!({ "name": field.name, "value": field.value, "inline": false }))
            .collect();

        let mut body = json!({
            "embeds": [{
                "title": embed.title,
                "description": embed.description,
                "color": embed.color,
                "fields": fields,
                "footer": { "text": self.footer },
                "timestamp": at.to_rfc3339_opts(SecondsFormat::Secs, true),
            }]
        });
        if let Some(url) = &embed.url {
            body["embeds"][0]["url"] = Value::String(url.clone());
        }
        if embed.mention_users && !self.mention_users.is_empty() {
            body["content"] = Value::String(self.mentions());
        }
        body
    }

    fn mentions(&self) -> String {
        self.mention_users
            .iter()
            .map(|user| format!("<@{user}>"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl NotificationSink for DiscordWebhook {
    async fn emit(&self, notification: &Notification) {
        let body = self.payload(&notification.render(), Utc::now());
        let result = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status);

        match result {
            Ok(response) => {
                debug!(kind = notification.kind(), status = %response.status(), "Notification sent");
            }
            Err(e) => {
                error!(kind = notification.kind(), error = %e, "Failed to send notification");
            }
        }
    }
}
