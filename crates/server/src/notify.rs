//! Admin notification channels.

use std::sync::Arc;

use async_trait::async_trait;
use flightbook_core::config::NotificationConfig;
use flightbook_core::errors::ApplicationError;
use flightbook_core::gateway::NotificationChannel;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    subject: &'a str,
    message: &'a str,
}

/// Posts `{subject, message}` as JSON to a configured URL.
pub struct WebhookNotificationChannel {
    client: Client,
    url: String,
    auth_token: Option<SecretString>,
}

impl WebhookNotificationChannel {
    pub fn new(client: Client, url: impl Into<String>, auth_token: Option<SecretString>) -> Self {
        Self { client, url: url.into(), auth_token }
    }
}

#[async_trait]
impl NotificationChannel for WebhookNotificationChannel {
    async fn publish(&self, subject: &str, message: &str) -> Result<(), ApplicationError> {
        let mut request = self.client.post(&self.url).json(&WebhookPayload { subject, message });
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await.map_err(|error| {
            ApplicationError::Integration(format!("notification webhook request failed: {error}"))
        })?;

        if !response.status().is_success() {
            return Err(ApplicationError::Integration(format!(
                "notification webhook returned {}",
                response.status()
            )));
        }

        debug!(
            event_name = "notify.webhook.delivered",
            subject = %subject,
            "admin alert delivered"
        );
        Ok(())
    }
}

/// Writes alerts to the log. Used when no webhook is configured.
#[derive(Clone, Debug, Default)]
pub struct LogNotificationChannel;

#[async_trait]
impl NotificationChannel for LogNotificationChannel {
    async fn publish(&self, subject: &str, message: &str) -> Result<(), ApplicationError> {
        warn!(
            event_name = "notify.log.alert",
            subject = %subject,
            message = %message,
            "admin alert"
        );
        Ok(())
    }
}

pub fn channel_from_config(config: &NotificationConfig) -> Arc<dyn NotificationChannel> {
    match (&config.webhook_url, config.enabled) {
        (Some(url), true) => Arc::new(WebhookNotificationChannel::new(
            Client::new(),
            url.clone(),
            config.auth_token.clone(),
        )),
        _ => Arc::new(LogNotificationChannel),
    }
}
