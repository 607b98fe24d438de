mod api;
mod config;
mod context;
mod fetch;
mod markers;
mod notion_client;
mod poll;
#[cfg(test)]
mod testing;
mod transcribe;

use std::sync::Arc;

use anyhow::Context as _;
use tracing_subscriber::EnvFilter;

use crate::{
    config::Config,
    context::Context,
    notion_client::NotionClient,
    poll::{check_access, poll_loop},
};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting grocer");

    let config = Config::from_env()?;

    tracing::info!("Setting up Notion API client");

    let client = NotionClient::new(&config)?;

    tracing::info!(
        "Notion API client initialized with URL: {} (recipes {}, groceries {})",
        config.api_url,
        config.recipes_database_id,
        config.groceries_database_id
    );

    let ctx = Context::new(Arc::new(client), config);

    check_access(&ctx).await?;

    tokio::select! {
        _ = poll_loop(&ctx) => {}
        res = tokio::signal::ctrl_c() => {
            res.context("Failed to listen for ctrl-c")?;
            tracing::info!("Received Ctrl-C, shutting down...");
        }
    }

    Ok(())
}
