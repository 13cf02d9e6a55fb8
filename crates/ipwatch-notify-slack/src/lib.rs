// # Slack Notifier
//
// Announces applied record changes through a Slack incoming webhook.
//
// One POST per changed domain, no retries. A failed delivery is returned to
// the reconciler, which logs it and carries on.
//
// The webhook URL embeds its own credential, so it is treated like an API
// token: never logged, redacted in `Debug`.

use async_trait::async_trait;
use ipwatch_core::config::NotifierConfig;
use ipwatch_core::diff::DiffResult;
use ipwatch_core::domain::Domain;
use ipwatch_core::registry::PluginRegistry;
use ipwatch_core::traits::{Notifier, NotifierFactory, change_summary};
use ipwatch_core::{Error, Result};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// HTTP timeout for webhook calls
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Incoming-webhook message body
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SlackMessage {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Slack incoming-webhook notifier
pub struct SlackNotifier {
    /// ⚠️ NEVER log this value
    webhook_url: String,
    channel: Option<String>,
    username: Option<String>,
    client: reqwest::Client,
}

impl std::fmt::Debug for SlackNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackNotifier")
            .field("webhook_url", &"<REDACTED>")
            .field("channel", &self.channel)
            .field("username", &self.username)
            .finish()
    }
}

impl SlackNotifier {
    /// Create a notifier posting to `webhook_url`
    ///
    /// `channel` and `username` override the webhook's defaults when set.
    pub fn new(
        webhook_url: impl Into<String>,
        channel: Option<String>,
        username: Option<String>,
    ) -> Result<Self> {
        let webhook_url = webhook_url.into();
        if webhook_url.is_empty() {
            return Err(Error::config("Slack webhook URL cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            webhook_url,
            channel: channel.filter(|c| !c.is_empty()),
            username: username.filter(|u| !u.is_empty()),
            client,
        })
    }

    /// Build the message announcing `diff` on `domain`
    pub fn message(&self, domain: &Domain, diff: &DiffResult) -> SlackMessage {
        SlackMessage {
            text: change_summary(domain, diff),
            channel: self.channel.clone(),
            username: self.username.clone(),
        }
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn notify(&self, domain: &Domain, diff: &DiffResult) -> Result<()> {
        let message = self.message(domain, diff);
        debug!("Posting Slack notification for {}", domain.fqdn);

        // reqwest errors can carry the URL; keep only the kind of failure
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&message)
            .send()
            .await
            .map_err(|e| {
                let cause = if e.is_timeout() {
                    "timed out"
                } else if e.is_connect() {
                    "connection failed"
                } else {
                    "request failed"
                };
                Error::notify(&domain.fqdn, format!("Slack webhook {}", cause))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(Error::notify(
                &domain.fqdn,
                format!("Slack webhook returned {} - {}", status, body),
            ));
        }

        Ok(())
    }

    fn notifier_name(&self) -> &'static str {
        "slack"
    }
}

/// Factory for creating Slack notifiers
pub struct SlackFactory;

impl NotifierFactory for SlackFactory {
    fn create(&self, config: &NotifierConfig) -> Result<Box<dyn Notifier>> {
        match config {
            NotifierConfig::Slack {
                webhook_url,
                channel,
                username,
            } => Ok(Box::new(SlackNotifier::new(
                webhook_url.clone(),
                channel.clone(),
                username.clone(),
            )?)),
            _ => Err(Error::config("Invalid config for Slack notifier")),
        }
    }
}

/// Register the Slack notifier with a registry
pub fn register(registry: &PluginRegistry) {
    registry.register_notifier("slack", Box::new(SlackFactory));
}
