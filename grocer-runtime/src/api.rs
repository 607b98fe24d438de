use anyhow::Result;
use async_trait::async_trait;
use common::types::{Block, ListResponse, Page, PageProperties};

/// The remote document-database operations the integration needs.
#[async_trait]
pub trait NotionApi: Send + Sync {
    /// Fails when the credential is missing, revoked or otherwise rejected.
    async fn verify_access(&self) -> Result<()>;

    async fn query_database(
        &self,
        database_id: &str,
        cursor: Option<String>,
    ) -> Result<ListResponse<Page>>;

    async fn list_block_children(
        &self,
        block_id: &str,
        cursor: Option<String>,
    ) -> Result<ListResponse<Block>>;

    /// Rewrites a to-do's label. `checked` is left untouched when `None`.
    async fn update_to_do(&self, block_id: &str, label: &str, checked: Option<bool>)
        -> Result<()>;

    async fn create_page(&self, database_id: &str, properties: PageProperties) -> Result<()>;
}
