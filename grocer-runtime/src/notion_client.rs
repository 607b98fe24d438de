use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use common::types::{Block, ListResponse, Page, PageProperties, TextInput};
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{api::NotionApi, config::Config};

pub const NOTION_VERSION: &str = "2022-06-28";
const PAGE_SIZE: u32 = 100;

pub struct NotionClient {
    base_url: Url,
    token: SecretString,
    client: Client,
}

#[derive(Serialize, Debug)]
struct QueryReq<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    start_cursor: Option<&'a str>,
    page_size: u32,
}

#[derive(Serialize, Debug)]
struct UpdateToDoReq<'a> {
    to_do: ToDoPatch<'a>,
}

#[derive(Serialize, Debug)]
struct ToDoPatch<'a> {
    rich_text: &'a [TextInput],
    #[serde(skip_serializing_if = "Option::is_none")]
    checked: Option<bool>,
}

#[derive(Serialize, Debug)]
struct CreatePageReq<'a> {
    parent: DatabaseParent<'a>,
    properties: &'a PageProperties,
}

#[derive(Serialize, Debug)]
struct DatabaseParent<'a> {
    database_id: &'a str,
}

#[derive(Deserialize, Debug)]
struct ErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

impl NotionClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: config.api_url.clone(),
            token: SecretString::from(config.notion_token.expose_secret().to_owned()),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("Invalid endpoint path '{}'", path))
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        req.bearer_auth(self.token.expose_secret())
            .header("Notion-Version", NOTION_VERSION)
    }
}

/// Turns a non-2xx response into an error carrying Notion's own message.
async fn check_status(res: Response, what: &str) -> Result<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let body = res.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&body) {
        Ok(err) if !err.message.is_empty() => Err(anyhow!(
            "{} failed with {} ({}): {}",
            what,
            status,
            err.code,
            err.message
        )),
        _ => Err(anyhow!("{} failed with {}", what, status)),
    }
}

#[async_trait]
impl NotionApi for NotionClient {
    async fn verify_access(&self) -> Result<()> {
        let res = self
            .authorized(self.client.get(self.endpoint("v1/users/me")?))
            .send()
            .await
            .context("Failed to send bot user request")?;

        check_status(res, "Credential check").await?;
        Ok(())
    }

    async fn query_database(
        &self,
        database_id: &str,
        cursor: Option<String>,
    ) -> Result<ListResponse<Page>> {
        let req = QueryReq {
            start_cursor: cursor.as_deref(),
            page_size: PAGE_SIZE,
        };

        let res = self
            .authorized(
                self.client
                    .post(self.endpoint(&format!("v1/databases/{}/query", database_id))?),
            )
            .json(&req)
            .send()
            .await
            .context("Failed to send database query")?;

        check_status(res, "Database query")
            .await?
            .json::<ListResponse<Page>>()
            .await
            .context("Failed to parse database query response")
    }

    async fn list_block_children(
        &self,
        block_id: &str,
        cursor: Option<String>,
    ) -> Result<ListResponse<Block>> {
        let mut query = vec![("page_size", PAGE_SIZE.to_string())];
        if let Some(cursor) = cursor {
            query.push(("start_cursor", cursor));
        }

        let res = self
            .authorized(
                self.client
                    .get(self.endpoint(&format!("v1/blocks/{}/children", block_id))?),
            )
            .query(&query)
            .send()
            .await
            .context("Failed to send block children request")?;

        check_status(res, "Listing block children")
            .await?
            .json::<ListResponse<Block>>()
            .await
            .context("Failed to parse block children response")
    }

    async fn update_to_do(
        &self,
        block_id: &str,
        label: &str,
        checked: Option<bool>,
    ) -> Result<()> {
        let rich_text = [TextInput::new(label)];
        let req = UpdateToDoReq {
            to_do: ToDoPatch {
                rich_text: &rich_text,
                checked,
            },
        };

        tracing::debug!(
            "Updating to-do {}:\n{}",
            block_id,
            serde_json::to_string_pretty(&req).unwrap_or_default()
        );

        let res = self
            .authorized(
                self.client
                    .patch(self.endpoint(&format!("v1/blocks/{}", block_id))?),
            )
            .json(&req)
            .send()
            .await
            .context("Failed to send block update")?;

        check_status(res, "Block update").await?;
        Ok(())
    }

    async fn create_page(&self, database_id: &str, properties: PageProperties) -> Result<()> {
        let req = CreatePageReq {
            parent: DatabaseParent { database_id },
            properties: &properties,
        };

        let res = self
            .authorized(self.client.post(self.endpoint("v1/pages")?))
            .json(&req)
            .send()
            .await
            .context("Failed to send page creation")?;

        check_status(res, "Page creation").await?;
        Ok(())
    }
}
