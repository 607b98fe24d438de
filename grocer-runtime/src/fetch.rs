use std::future::Future;

use anyhow::{Context, Result};
use common::types::{Block, ListResponse, Page};

use crate::api::NotionApi;

/// Follows continuation cursors until the service reports none remaining,
/// appending every page to `out`. On failure `out` keeps what was gathered.
pub async fn drain_pages<T, F, Fut>(out: &mut Vec<T>, mut fetch_page: F) -> Result<()>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<ListResponse<T>>>,
{
    let mut cursor = None;
    loop {
        let page = fetch_page(cursor.take()).await?;
        out.extend(page.results);
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => return Ok(()),
        }
    }
}

/// All recipe rows. A failed read is logged and the rows gathered so far
/// are returned.
pub async fn fetch_recipes(api: &dyn NotionApi, database_id: &str) -> Vec<Page> {
    let mut recipes = Vec::new();
    let result = drain_pages(&mut recipes, move |cursor| {
        api.query_database(database_id, cursor)
    })
    .await;
    if let Err(e) = result {
        tracing::error!(
            "Failed to fetch recipes (continuing with {} fetched): {:#}",
            recipes.len(),
            e
        );
    }
    recipes
}

/// Direct child blocks of one recipe, partial on failure.
pub async fn collect_blocks(api: &dyn NotionApi, recipe_id: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let result = drain_pages(&mut blocks, move |cursor| {
        api.list_block_children(recipe_id, cursor)
    })
    .await;
    if let Err(e) = result {
        tracing::error!(
            "Failed to list blocks for recipe {} (continuing with {} fetched): {:#}",
            recipe_id,
            blocks.len(),
            e
        );
    }
    blocks
}

/// Every row of a database. Unlike the recipe and block reads, failures
/// propagate.
pub async fn fetch_rows(api: &dyn NotionApi, database_id: &str) -> Result<Vec<Page>> {
    let mut rows = Vec::new();
    drain_pages(&mut rows, move |cursor| api.query_database(database_id, cursor))
        .await
        .with_context(|| format!("Failed to query database {}", database_id))?;
    Ok(rows)
}
