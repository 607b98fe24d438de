use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use secrecy::SecretString;
use url::Url;

pub const DEFAULT_API_URL: &str = "https://api.notion.com";

/// Property and title names the integration relies on in the user's workspace.
#[derive(Debug, Clone)]
pub struct Schema {
    pub recipe_title: String,
    pub ingredients_title: String,
    pub ingredient_name: String,
    pub ingredient_quantity: String,
    pub ingredient_exclude: String,
    pub grocery_name: String,
    pub grocery_checked: String,
    pub marker_sentinel: String,
    pub adding_annotation: String,
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            recipe_title: "Name".into(),
            ingredients_title: "Ingredients".into(),
            ingredient_name: "Name".into(),
            ingredient_quantity: "Quantity".into(),
            ingredient_exclude: "Exclude?".into(),
            grocery_name: "Name".into(),
            grocery_checked: "Checked".into(),
            marker_sentinel: "✨".into(),
            adding_annotation: " (adding, will uncheck when finished...)".into(),
        }
    }
}

#[derive(Debug)]
pub struct Config {
    pub notion_token: SecretString,
    pub api_url: Url,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
    pub recipes_database_id: String,
    pub groceries_database_id: String,
    pub schema: Schema,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| anyhow!("{} must be set", key))
        };

        let notion_token = SecretString::from(required("NOTION_KEY")?);
        let recipes_database_id = required("RECIPES_DATABASE_ID")?;
        let groceries_database_id = required("GROCERIES_DATABASE_ID")?;

        let mut api_url = lookup("NOTION_API_URL").unwrap_or_else(|| DEFAULT_API_URL.into());
        if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
            return Err(anyhow!(
                "Invalid NOTION_API_URL: must start with http:// or https://"
            ));
        }
        // Endpoints are joined onto the base, which drops a last segment
        // without a trailing slash.
        if !api_url.ends_with('/') {
            api_url.push('/');
        }
        let api_url =
            Url::parse(&api_url).with_context(|| format!("Invalid NOTION_API_URL: '{}'", api_url))?;

        let poll_interval = seconds(&lookup, "POLL_INTERVAL", 5)?;
        let request_timeout = seconds(&lookup, "NOTION_TIMEOUT", 20)?;

        let mut schema = Schema::default();
        if let Some(sentinel) = lookup("MARKER_SENTINEL").filter(|v| !v.trim().is_empty()) {
            schema.marker_sentinel = sentinel.trim().to_string();
        }
        if let Some(title) = lookup("INGREDIENTS_DATABASE_TITLE").filter(|v| !v.is_empty()) {
            schema.ingredients_title = title;
        }

        Ok(Self {
            notion_token,
            api_url,
            request_timeout,
            poll_interval,
            recipes_database_id,
            groceries_database_id,
            schema,
        })
    }
}

fn seconds<F>(lookup: &F, key: &str, default: u64) -> Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .with_context(|| format!("{} must be a whole number of seconds, got '{}'", key, raw)),
        None => Ok(Duration::from_secs(default)),
    }
}
