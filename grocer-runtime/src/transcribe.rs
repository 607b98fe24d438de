use anyhow::{Context as _, Result};
use common::types::{concat_plain_text, Block, Page, PageProperties, PropertyInput, TextInput};

use crate::{config::Schema, context::Context, fetch::fetch_rows};

/// What a single ingredient row turns into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngredientEntry {
    Excluded,
    MalformedTitle { fragments: usize },
    Grocery { name: String, quantity_fragments: Option<usize> },
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TranscriptionReport {
    pub added: usize,
    pub excluded: usize,
    pub malformed_titles: usize,
    pub missing_quantities: usize,
}

/// Classifies a row. `quantity_fragments` is set only when the quantity
/// was dropped because it did not hold exactly one fragment.
pub fn grocery_entry(row: &Page, schema: &Schema) -> IngredientEntry {
    if row.checkbox(&schema.ingredient_exclude).unwrap_or(false) {
        return IngredientEntry::Excluded;
    }

    let title = match row.title(&schema.ingredient_name).unwrap_or_default() {
        [single] => single.plain_text.as_str(),
        other => {
            return IngredientEntry::MalformedTitle {
                fragments: other.len(),
            }
        }
    };

    match row.rich_text(&schema.ingredient_quantity).unwrap_or_default() {
        [quantity] => IngredientEntry::Grocery {
            name: format!("{} ({})", title, quantity.plain_text),
            quantity_fragments: None,
        },
        other => IngredientEntry::Grocery {
            name: title.to_string(),
            quantity_fragments: Some(other.len()),
        },
    }
}

pub fn grocery_properties(name: &str, schema: &Schema) -> PageProperties {
    let mut props = PageProperties::new();
    props.insert(
        schema.grocery_name.clone(),
        PropertyInput::Title {
            title: vec![TextInput::new(name)],
        },
    );
    props.insert(
        schema.grocery_checked.clone(),
        PropertyInput::Checkbox { checkbox: false },
    );
    props
}

pub fn recipe_title(recipe: &Page, schema: &Schema) -> String {
    recipe
        .title(&schema.recipe_title)
        .map(concat_plain_text)
        .unwrap_or_default()
}

/// Copies every non-excluded row of the recipe's "Ingredients" sub-database
/// into the groceries database. Reads and writes are not rolled back on
/// failure, so an error can leave a partial set of grocery rows behind.
pub async fn transcribe_ingredients(
    ctx: &Context,
    recipe: &Page,
    blocks: &[Block],
) -> Result<TranscriptionReport> {
    let schema = &ctx.config.schema;
    let title = recipe_title(recipe, schema);
    tracing::info!("Adding {} ingredients to grocery list...", title);

    let mut report = TranscriptionReport::default();
    let sources: Vec<&Block> = blocks
        .iter()
        .filter(|b| {
            b.as_child_database()
                .is_some_and(|db| db.title == schema.ingredients_title)
        })
        .collect();

    if sources.is_empty() {
        tracing::warn!(
            "Recipe {} has no '{}' database, nothing to add",
            recipe.id,
            schema.ingredients_title
        );
    }

    for source in sources {
        let rows = fetch_rows(ctx.api(), &source.id)
            .await
            .with_context(|| format!("Failed to read ingredients of {}", title))?;

        for row in &rows {
            let name = match grocery_entry(row, schema) {
                IngredientEntry::Excluded => {
                    report.excluded += 1;
                    continue;
                }
                IngredientEntry::MalformedTitle { fragments } => {
                    tracing::error!(
                        "Ingredient {} title has {} text fragments, expected 1; skipping",
                        row.id,
                        fragments
                    );
                    report.malformed_titles += 1;
                    continue;
                }
                IngredientEntry::Grocery {
                    name,
                    quantity_fragments,
                } => {
                    if let Some(fragments) = quantity_fragments {
                        tracing::warn!(
                            "Ingredient {} quantity has {} text fragments, expected 1; adding without quantity",
                            row.id,
                            fragments
                        );
                        report.missing_quantities += 1;
                    }
                    name
                }
            };

            ctx.api()
                .create_page(
                    &ctx.config.groceries_database_id,
                    grocery_properties(&name, schema),
                )
                .await
                .with_context(|| format!("Failed to add '{}' to groceries", name))?;
            report.added += 1;
        }
    }

    tracing::info!(
        "Finished adding {} ingredients to grocery list ({} added, {} excluded, {} malformed, {} without quantity).",
        title,
        report.added,
        report.excluded,
        report.malformed_titles,
        report.missing_quantities
    );
    Ok(report)
}
