use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde_json::{Value, json};
use tracing::{debug, warn};
use url::Url;

use crate::error::SourceError;
use crate::model::{Page, QueryResponse};

pub const NOTION_API_BASE: &str = "https://api.notion.com";
pub const NOTION_VERSION: &str = "2022-06-28";
/// Largest page size the query endpoint accepts.
pub const MAX_PAGE_SIZE: u32 = 100;

static DEFAULT_API_BASE: LazyLock<Url> =
    LazyLock::new(|| Url::parse(&format!("{NOTION_API_BASE}/")).unwrap());

/// Client for the database query endpoint.
#[derive(Clone)]
pub struct NotionClient {
    client: Client,
    api_base: Url,
    token: String,
    page_size: u32,
}

impl fmt::Debug for NotionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotionClient")
            .field("api_base", &self.api_base.as_str())
            .field("token", &"<redacted>")
            .field("page_size", &self.page_size)
            .finish()
    }
}

impl NotionClient {
    pub fn new(client: Client, token: impl Into<String>) -> Self {
        Self {
            client,
            api_base: DEFAULT_API_BASE.clone(),
            token: token.into(),
            page_size: MAX_PAGE_SIZE,
        }
    }

    /// Point the client at a different API host (proxies, local fakes).
    pub fn with_api_base(mut self, api_base: &str) -> Result<Self, SourceError> {
        let mut normalized = api_base.trim().to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let url = Url::parse(&normalized).map_err(|_| SourceError::InvalidUrl(api_base.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SourceError::InvalidUrl(api_base.to_string()));
        }
        self.api_base = url;
        Ok(self)
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// Build the query endpoint url for a database.
    pub fn query_url(&self, database_id: &str) -> Result<Url, SourceError> {
        let id = database_id.trim();
        if id.is_empty() || id.contains(['/', '?', '#']) {
            return Err(SourceError::InvalidDatabaseId(database_id.to_string()));
        }

        self.api_base
            .join(&format!("v1/databases/{id}/query"))
            .map_err(|_| SourceError::InvalidDatabaseId(database_id.to_string()))
    }

    fn query_body(&self, cursor: Option<&str>) -> Value {
        let mut body = json!({ "page_size": self.page_size });
        if let Some(cursor) = cursor {
            body["start_cursor"] = json!(cursor);
        }
        body
    }

    /// Fetch every page of a database, following pagination cursors.
    pub async fn query_database(&self, database_id: &str) -> Result<Vec<Page>, SourceError> {
        let url = self.query_url(database_id)?;
        let mut pages = Vec::new();
        let mut cursor: Option<String> = None;
        let mut seen_cursors = HashSet::new();

        loop {
            let response = self.query_once(&url, cursor.as_deref()).await?;
            let has_more = response.has_more;
            let next_cursor = response.next_cursor.clone();
            pages.extend(response.into_pages());

            let Some(next) = next_cursor.filter(|_| has_more) else {
                break;
            };
            if !seen_cursors.insert(next.clone()) {
                warn!(cursor = %next, fetched = pages.len(), "Query cursor repeated, stopping pagination");
                break;
            }
            debug!(cursor = %next, fetched = pages.len(), "Fetching next query page");
            cursor = Some(next);
        }

        debug!(database_id, count = pages.len(), "Database query finished");
        Ok(pages)
    }

    async fn query_once(&self, url: &Url, cursor: Option<&str>) -> Result<QueryResponse, SourceError> {
        let response = self
            .client
            .post(url.clone())
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .json(&self.query_body(cursor))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}
