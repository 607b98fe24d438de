use anyhow::{Context as _, Result};
use common::types::{concat_plain_text, Block, Page};

use crate::{
    context::Context,
    transcribe::{transcribe_ingredients, TranscriptionReport},
};

/// A checked to-do whose label carries the sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub block_id: String,
    pub label: String,
}

pub fn find_triggered(blocks: &[Block], sentinel: &str) -> Vec<Marker> {
    blocks
        .iter()
        .filter_map(|block| {
            let todo = block.as_to_do()?;
            let label = concat_plain_text(&todo.rich_text);
            (todo.checked && label.contains(sentinel)).then(|| Marker {
                block_id: block.id.clone(),
                label,
            })
        })
        .collect()
}

/// Strips any "(adding...)" annotations a previous, interrupted run left on
/// the label.
pub fn base_label<'a>(label: &'a str, annotation: &str) -> &'a str {
    let mut base = label;
    while !annotation.is_empty() {
        match base.strip_suffix(annotation) {
            Some(rest) => base = rest,
            None => break,
        }
    }
    base
}

/// Checked+Marked -> annotated (still checked) -> ingredients copied ->
/// original label, unchecked. A failure at any step leaves the block as the
/// last successful write left it.
pub async fn process_marker(
    ctx: &Context,
    recipe: &Page,
    blocks: &[Block],
    marker: &Marker,
) -> Result<TranscriptionReport> {
    let annotation = &ctx.config.schema.adding_annotation;
    let label = base_label(&marker.label, annotation);

    ctx.api()
        .update_to_do(&marker.block_id, &format!("{}{}", label, annotation), None)
        .await
        .with_context(|| format!("Failed to annotate marker {}", marker.block_id))?;

    let report = transcribe_ingredients(ctx, recipe, blocks).await?;

    ctx.api()
        .update_to_do(&marker.block_id, label, Some(false))
        .await
        .with_context(|| format!("Failed to uncheck marker {}", marker.block_id))?;

    Ok(report)
}
