//! Fire-and-forget alert delivery

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::TelegramSettings;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver an alert. Callers log and swallow failures.
    async fn broadcast(
        &self,
        title: &str,
        body: &str,
        metadata: &Value,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Writes alerts to the log only; used when no channel is configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn broadcast(
        &self,
        title: &str,
        body: &str,
        metadata: &Value,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        info!(title = %title, metadata = %metadata, "Notification: {} - {}", title, body);
        Ok(())
    }
}

/// Telegram bot `sendMessage` with HTML formatting.
pub struct TelegramNotifier {
    client: reqwest::Client,
    url: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(settings: TelegramSettings) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self::with_client(settings, client))
    }

    pub fn with_client(settings: TelegramSettings, client: reqwest::Client) -> Self {
        Self {
            client,
            url: format!(
                "{}/bot{}/sendMessage",
                settings.base_url.trim_end_matches('/'),
                settings.token
            ),
            chat_id: settings.chat_id,
        }
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn broadcast(
        &self,
        title: &str,
        body: &str,
        _metadata: &Value,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let payload = serde_json::json!({
            "chat_id": self.chat_id,
            "text": format!("<b>{}</b>\n{}", escape_html(title), escape_html(body)),
            "parse_mode": "HTML"
        });

        let resp = self.client.post(&self.url).json(&payload).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            warn!(status = %status, "Telegram rejected notification");
            return Err(format!("Telegram error status: {}", status).into());
        }

        let preview: String = title.chars().take(80).collect();
        info!("Telegram sent: {}", preview);
        Ok(())
    }
}
