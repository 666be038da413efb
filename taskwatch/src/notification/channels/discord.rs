//! Discord webhook notification channel.
//!
//! Rate limits are not hardcoded: a 429 response is retried after the delay
//! the server asks for (Retry-After, then X-RateLimit-Reset-After).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::NotificationChannel;
use crate::notification::render::Embed;
use crate::{Error, Result};

/// Maximum number of retries for rate-limited requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Wait used when a 429 carries no usable delay header.
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);

/// Longest wait honored for a single 429; larger requests are clamped.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Discord channel configuration.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Discord webhook URL.
    pub webhook_url: String,
    /// Optional username for the webhook.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Optional avatar URL for the webhook.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl DiscordConfig {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            ..Default::default()
        }
    }
}

// Webhook URLs embed their secret token.
impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("webhook_url", &"<redacted>")
            .field("username", &self.username)
            .field("avatar_url", &self.avatar_url)
            .finish()
    }
}

/// Body posted to the webhook.
#[derive(Debug, Clone, Serialize)]
struct WebhookPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    avatar_url: Option<&'a str>,
    embeds: [&'a Embed; 1],
}

/// Discord notification channel.
pub struct DiscordChannel {
    config: DiscordConfig,
    client: Client,
}

impl DiscordChannel {
    pub fn new(config: DiscordConfig, client: Client) -> Self {
        Self { config, client }
    }

    fn build_payload<'a>(&'a self, embed: &'a Embed) -> WebhookPayload<'a> {
        WebhookPayload {
            username: self.config.username.as_deref(),
            avatar_url: self.config.avatar_url.as_deref(),
            embeds: [embed],
        }
    }

    /// Send request with rate limit handling.
    async fn send_with_retry(&self, payload: &WebhookPayload<'_>) -> Result<()> {
        let mut attempts = 0;

        loop {
            attempts += 1;

            let response = self
                .client
                .post(&self.config.webhook_url)
                .json(payload)
                .send()
                .await
                .map_err(|e| Error::delivery(format!("Discord request failed: {e}")))?;

            let status = response.status();

            if status.is_success() {
                return Ok(());
            }

            if status.as_u16() == 429 {
                let retry_after = parse_retry_after(response.headers());

                if attempts > MAX_RATE_LIMIT_RETRIES {
                    warn!(
                        retries = MAX_RATE_LIMIT_RETRIES,
                        last_retry_after = ?retry_after,
                        "Discord rate limit: max retries exceeded"
                    );
                    return Err(Error::delivery(format!(
                        "Discord rate limit exceeded after {MAX_RATE_LIMIT_RETRIES} retries"
                    )));
                }

                let wait = retry_after.unwrap_or(DEFAULT_RETRY_AFTER);
                debug!(
                    "Discord rate limited (429), waiting {:?} before retry (attempt {}/{})",
                    wait, attempts, MAX_RATE_LIMIT_RETRIES
                );
                tokio::time::sleep(wait).await;
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            return Err(Error::delivery(format!(
                "Discord webhook failed: {status} - {body}"
            )));
        }
    }
}

/// Delay requested by a 429 response, in seconds (fractions allowed),
/// clamped to [`MAX_RETRY_AFTER`].
fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    ["Retry-After", "X-RateLimit-Reset-After"]
        .into_iter()
        .filter_map(|name| headers.get(name))
        .filter_map(|value| value.to_str().ok()?.trim().parse::<f64>().ok())
        .find(|secs| *secs >= 0.0)
        .map(|secs| {
            Duration::try_from_secs_f64(secs).map_or(MAX_RETRY_AFTER, |wait| wait.min(MAX_RETRY_AFTER))
        })
}

#[async_trait]
impl NotificationChannel for DiscordChannel {
    fn channel_type(&self) -> &'static str {
        "discord"
    }

    fn is_enabled(&self) -> bool {
        !self.config.webhook_url.is_empty()
    }

    async fn send(&self, embed: &Embed) -> Result<()> {
        if !self.is_enabled() {
            return Err(Error::delivery("Discord webhook URL is not configured"));
        }

        let payload = self.build_payload(embed);
        self.send_with_retry(&payload).await?;

        debug!(title = %embed.title, "Discord notification sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue};

    fn channel(config: DiscordConfig) -> DiscordChannel {
        crate::utils::http_client::install_rustls_provider();
        DiscordChannel::new(config, Client::new())
    }

    fn embed() -> Embed {
        Embed {
            title: "Write docs 🔗".to_string(),
            description: "A new page was created in Notion! 👀".to_string(),
            url: String::new(),
            color: 0x00ffcc,
            fields: Vec::new(),
            author: None,
        }
    }

    #[test]
    fn test_unconfigured_channel_is_disabled() {
        assert!(!channel(DiscordConfig::default()).is_enabled());
        assert!(channel(DiscordConfig::new("https://discord.test/api/webhooks/1/t")).is_enabled());
    }

    #[test]
    fn test_build_payload() {
        let channel = channel(DiscordConfig::new("https://discord.test/api/webhooks/1/t"));
        let embed = embed();

        let payload = serde_json::to_value(channel.build_payload(&embed)).unwrap();

        assert!(payload.get("username").is_none());
        assert!(payload.get("avatar_url").is_none());
        assert_eq!(payload["embeds"].as_array().map(Vec::len), Some(1));
        assert_eq!(payload["embeds"][0]["title"], "Write docs 🔗");
        assert_eq!(payload["embeds"][0]["color"], 0x00ffcc);
        assert!(payload["embeds"][0].get("url").is_none());
    }

    #[test]
    fn test_build_payload_with_custom_username() {
        let channel = channel(DiscordConfig {
            webhook_url: "https://discord.test/api/webhooks/1/t".to_string(),
            username: Some("Task Bot".to_string()),
            avatar_url: Some("https://example.com/avatar.png".to_string()),
        });
        let embed = embed();

        let payload = serde_json::to_value(channel.build_payload(&embed)).unwrap();

        assert_eq!(payload["username"], "Task Bot");
        assert_eq!(payload["avatar_url"], "https://example.com/avatar.png");
    }

    #[test]
    fn test_parse_retry_after() {
        let mut headers = HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);

        headers.insert("X-RateLimit-Reset-After", HeaderValue::from_static("0.25"));
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_millis(250)));

        headers.insert("Retry-After", HeaderValue::from_static("2"));
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(2)));

        headers.insert("Retry-After", HeaderValue::from_static("soon"));
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_parse_retry_after_out_of_range() {
        let mut headers = HeaderMap::new();
        headers.insert("Retry-After", HeaderValue::from_static("1e300"));
        assert_eq!(parse_retry_after(&headers), Some(MAX_RETRY_AFTER));

        headers.insert("Retry-After", HeaderValue::from_static("86400"));
        assert_eq!(parse_retry_after(&headers), Some(MAX_RETRY_AFTER));

        headers.insert("Retry-After", HeaderValue::from_static("-3"));
        headers.insert("X-RateLimit-Reset-After", HeaderValue::from_static("NaN"));
        assert_eq!(parse_retry_after(&headers), None);

        headers.insert("X-RateLimit-Reset-After", HeaderValue::from_static("1.5"));
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_millis(1500)));

        headers.insert("Retry-After", HeaderValue::from_static("inf"));
        assert_eq!(parse_retry_after(&headers), Some(MAX_RETRY_AFTER));
    }

    #[test]
    fn test_debug_redacts_webhook_url() {
        let config = DiscordConfig::new("https://discord.test/api/webhooks/1/secret-token");
        assert!(!format!("{config:?}").contains("secret-token"));
    }

    #[tokio::test]
    async fn test_send_without_url_fails() {
        let result = channel(DiscordConfig::default()).send(&embed()).await;
        assert!(matches!(result, Err(Error::Delivery(_))));
    }
}
