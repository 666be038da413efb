//! Process configuration.
//!
//! Everything comes from environment variables (a `.env` file is loaded by
//! the binary) and is validated once into an [`AppConfig`]. Lookups go
//! through a closure so tests never touch the real process environment.

use std::path::PathBuf;
use std::time::Duration;

use chrono_tz::Tz;
use url::Url;

use crate::notification::{Endpoint, RoutingTable};
use crate::{Error, Result};

pub const ENV_TOKEN: &str = "TOKEN";
pub const ENV_DATABASE_ID: &str = "DATABASE_ID";
pub const ENV_NOTION_API_BASE: &str = "NOTION_API_BASE";
pub const ENV_WEBHOOK_URL: &str = "WEBHOOK_URL";
pub const ENV_APPROVED_WEBHOOK_URL: &str = "APPROVED_WEBHOOK_URL";
pub const ENV_REVIEW_WEBHOOK_URL: &str = "REVIEW_WEBHOOK_URL";
pub const ENV_WEBHOOK_USERNAME: &str = "WEBHOOK_USERNAME";
pub const ENV_WEBHOOK_AVATAR_URL: &str = "WEBHOOK_AVATAR_URL";
pub const ENV_POLL_INTERVAL_SECS: &str = "POLL_INTERVAL_SECS";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "REQUEST_TIMEOUT_SECS";
pub const ENV_STATE_PATH: &str = "STATE_PATH";
pub const ENV_LOG_DIR: &str = "LOG_DIR";
pub const ENV_ANNOUNCE_NEXT_POLL: &str = "ANNOUNCE_NEXT_POLL";
pub const ENV_NOTICE_TIMEZONE: &str = "NOTICE_TIMEZONE";

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_STATE_PATH: &str = "state/snapshot.json";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_NOTICE_TIMEZONE: Tz = chrono_tz::Asia::Seoul;

/// Non-empty, trimmed value of `key`.
fn lookup_value<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup_value(lookup, key).ok_or_else(|| Error::config(format!("{key} is required")))
}

fn http_url(key: &str, value: String) -> Result<String> {
    let url = Url::parse(&value).map_err(|e| Error::config(format!("{key} is not a valid URL: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(value),
        other => Err(Error::config(format!(
            "{key} must be an http(s) URL, got scheme '{other}'"
        ))),
    }
}

fn seconds<F>(lookup: &F, key: &str, default: Duration) -> Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup_value(lookup, key) else {
        return Ok(default);
    };
    match raw.parse::<u64>() {
        Ok(0) | Err(_) => Err(Error::config(format!(
            "{key} must be a positive number of seconds, got '{raw}'"
        ))),
        Ok(secs) => Ok(Duration::from_secs(secs)),
    }
}

fn flag<F>(lookup: &F, key: &str) -> Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup_value(lookup, key) else {
        return Ok(false);
    };
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::config(format!("{key} must be a boolean, got '{raw}'"))),
    }
}

/// Access to the source database.
#[derive(Clone, PartialEq, Eq)]
pub struct NotionConfig {
    pub token: String,
    pub database_id: String,
    pub api_base: String,
}

impl NotionConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base = match lookup_value(&lookup, ENV_NOTION_API_BASE) {
            Some(base) => http_url(ENV_NOTION_API_BASE, base)?,
            None => notion_source::NOTION_API_BASE.to_string(),
        };

        Ok(Self {
            token: required(&lookup, ENV_TOKEN)?,
            database_id: required(&lookup, ENV_DATABASE_ID)?,
            api_base,
        })
    }
}

impl std::fmt::Debug for NotionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotionConfig")
            .field("token", &"<redacted>")
            .field("database_id", &self.database_id)
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Where notifications go.
#[derive(Clone, PartialEq, Eq)]
pub enum WebhookRouting {
    /// One webhook receives everything.
    Single { url: String },
    /// Approvals and everything else go to separate webhooks.
    Split {
        approved_url: String,
        review_url: String,
    },
}

impl WebhookRouting {
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let single = lookup_value(&lookup, ENV_WEBHOOK_URL);
        let approved = lookup_value(&lookup, ENV_APPROVED_WEBHOOK_URL);
        let review = lookup_value(&lookup, ENV_REVIEW_WEBHOOK_URL);

        match (single, approved, review) {
            (Some(url), None, None) => Ok(Self::Single {
                url: http_url(ENV_WEBHOOK_URL, url)?,
            }),
            (None, Some(approved), Some(review)) => Ok(Self::Split {
                approved_url: http_url(ENV_APPROVED_WEBHOOK_URL, approved)?,
                review_url: http_url(ENV_REVIEW_WEBHOOK_URL, review)?,
            }),
            (None, None, None) => Err(Error::config(format!(
                "set either {ENV_WEBHOOK_URL} or both {ENV_APPROVED_WEBHOOK_URL} and {ENV_REVIEW_WEBHOOK_URL}"
            ))),
            (Some(_), _, _) => Err(Error::config(format!(
                "{ENV_WEBHOOK_URL} cannot be combined with {ENV_APPROVED_WEBHOOK_URL}/{ENV_REVIEW_WEBHOOK_URL}"
            ))),
            (None, _, _) => Err(Error::config(format!(
                "{ENV_APPROVED_WEBHOOK_URL} and {ENV_REVIEW_WEBHOOK_URL} must be set together"
            ))),
        }
    }

    pub fn routing_table(&self) -> RoutingTable {
        match self {
            Self::Single { .. } => RoutingTable::single(),
            Self::Split { .. } => RoutingTable::split(),
        }
    }

    /// Configured endpoints and their webhook URLs.
    pub fn endpoints(&self) -> Vec<(Endpoint, &str)> {
        match self {
            Self::Single { url } => vec![(Endpoint::Primary, url.as_str())],
            Self::Split {
                approved_url,
                review_url,
            } => vec![
                (Endpoint::Approved, approved_url.as_str()),
                (Endpoint::Review, review_url.as_str()),
            ],
        }
    }

    pub fn notice_endpoint(&self) -> Endpoint {
        match self {
            Self::Single { .. } => Endpoint::Primary,
            Self::Split { .. } => Endpoint::Review,
        }
    }
}

impl std::fmt::Debug for WebhookRouting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single { .. } => f.write_str("Single { url: <redacted> }"),
            Self::Split { .. } => {
                f.write_str("Split { approved_url: <redacted>, review_url: <redacted> }")
            }
        }
    }
}

/// Fully validated process configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub notion: NotionConfig,
    pub webhooks: WebhookRouting,
    pub webhook_username: Option<String>,
    pub webhook_avatar_url: Option<String>,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub state_path: PathBuf,
    pub log_dir: PathBuf,
    pub announce_next_poll: bool,
    pub notice_timezone: Tz,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let notice_timezone = match lookup_value(&lookup, ENV_NOTICE_TIMEZONE) {
            Some(name) => name.parse::<Tz>().map_err(|e| {
                Error::config(format!("{ENV_NOTICE_TIMEZONE} is not a known timezone: {e}"))
            })?,
            None => DEFAULT_NOTICE_TIMEZONE,
        };

        let webhook_avatar_url = lookup_value(&lookup, ENV_WEBHOOK_AVATAR_URL)
            .map(|url| http_url(ENV_WEBHOOK_AVATAR_URL, url))
            .transpose()?;

        Ok(Self {
            notion: NotionConfig::from_lookup(&lookup)?,
            webhooks: WebhookRouting::from_lookup(&lookup)?,
            webhook_username: lookup_value(&lookup, ENV_WEBHOOK_USERNAME),
            webhook_avatar_url,
            poll_interval: seconds(&lookup, ENV_POLL_INTERVAL_SECS, DEFAULT_POLL_INTERVAL)?,
            request_timeout: seconds(&lookup, ENV_REQUEST_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT)?,
            state_path: lookup_value(&lookup, ENV_STATE_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_PATH)),
            log_dir: lookup_value(&lookup, ENV_LOG_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR)),
            announce_next_poll: flag(&lookup, ENV_ANNOUNCE_NEXT_POLL)?,
            notice_timezone,
        })
    }
}
