use async_trait::async_trait;
use notion_source::{NotionClient, Page};

use crate::Result;

/// Where raw records come from.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch the complete current record set.
    async fn fetch(&self) -> Result<Vec<Page>>;
}

/// All pages of one Notion database.
#[derive(Debug, Clone)]
pub struct NotionSource {
    client: NotionClient,
    database_id: String,
}

impl NotionSource {
    pub fn new(client: NotionClient, database_id: impl Into<String>) -> Self {
        Self {
            client,
            database_id: database_id.into(),
        }
    }
}

#[async_trait]
impl RecordSource for NotionSource {
    async fn fetch(&self) -> Result<Vec<Page>> {
        Ok(self.client.query_database(&self.database_id).await?)
    }
}
