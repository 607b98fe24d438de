use anyhow::{Context as _, Result};
use common::types::Page;
use tokio::time::sleep;

use crate::{
    context::Context,
    fetch::{collect_blocks, fetch_recipes},
    markers::{find_triggered, process_marker},
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassSummary {
    pub recipes: usize,
    pub markers: usize,
    pub groceries_added: usize,
    pub failed_recipes: usize,
}

#[derive(Debug, Default)]
struct RecipeOutcome {
    markers: usize,
    groceries_added: usize,
}

/// Startup gate: an invalid credential aborts the process instead of
/// polling an empty recipe list forever.
pub async fn check_access(ctx: &Context) -> Result<()> {
    ctx.api()
        .verify_access()
        .await
        .context("Notion rejected the configured NOTION_KEY")?;
    tracing::info!("Notion credential accepted");
    Ok(())
}

/// One full pass over every recipe. A recipe that fails is logged and the
/// pass moves on to the next one.
pub async fn poll_pass(ctx: &Context) -> PassSummary {
    let recipes = fetch_recipes(ctx.api(), &ctx.config.recipes_database_id).await;
    let mut summary = PassSummary {
        recipes: recipes.len(),
        ..Default::default()
    };

    for recipe in &recipes {
        match process_recipe(ctx, recipe).await {
            Ok(outcome) => {
                summary.markers += outcome.markers;
                summary.groceries_added += outcome.groceries_added;
            }
            Err(e) => {
                tracing::error!("[poll] Recipe {} failed: {:#}", recipe.id, e);
                summary.failed_recipes += 1;
            }
        }
    }

    summary
}

async fn process_recipe(ctx: &Context, recipe: &Page) -> Result<RecipeOutcome> {
    let blocks = collect_blocks(ctx.api(), &recipe.id).await;
    if blocks.is_empty() {
        tracing::debug!("No blocks found for recipe {}", recipe.id);
        return Ok(RecipeOutcome::default());
    }

    let mut outcome = RecipeOutcome::default();
    for marker in find_triggered(&blocks, &ctx.config.schema.marker_sentinel) {
        let report = process_marker(ctx, recipe, &blocks, &marker).await?;
        outcome.markers += 1;
        outcome.groceries_added += report.added;
    }

    Ok(outcome)
}

/// Polls forever, waiting the configured interval between passes.
pub async fn poll_loop(ctx: &Context) {
    tracing::info!(
        "Polling recipes every {} seconds",
        ctx.config.poll_interval.as_secs()
    );

    loop {
        tracing::debug!("[poll] Begin");
        let summary = poll_pass(ctx).await;
        tracing::debug!(
            "[poll] Done: {} recipes, {} markers, {} groceries added, {} failed",
            summary.recipes,
            summary.markers,
            summary.groceries_added,
            summary.failed_recipes
        );

        sleep(ctx.config.poll_interval).await;
    }
}
