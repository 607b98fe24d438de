//! In-memory stand-in for the Notion API used across the runtime's tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use common::types::{
    Block, ChildDatabase, ListResponse, Page, PageProperties, PropertyInput, PropertyValue,
    RichText, ToDo,
};

use tracing::{subscriber::DefaultGuard, Event, Level, Subscriber};
use tracing_subscriber::{layer::SubscriberExt, Layer, Registry};

use crate::api::NotionApi;
use crate::config::Config;

#[derive(Debug, Clone, PartialEq)]
pub struct ToDoUpdate {
    pub block_id: String,
    pub label: String,
    pub checked: Option<bool>,
}

#[derive(Default)]
pub struct FakeState {
    pub databases: HashMap<String, Vec<Page>>,
    pub children: HashMap<String, Vec<Block>>,
    pub created: Vec<(String, PageProperties)>,
    pub updates: Vec<ToDoUpdate>,
    /// Every read issued, as `"<op> <id> <cursor>"`.
    pub reads: Vec<String>,
    /// Reads of this id fail once this many pages have been served.
    pub fail_reads_after: HashMap<String, usize>,
    pub fail_updates: HashSet<String>,
    pub fail_creates_after: Option<usize>,
    pub reject_credential: bool,
}

pub struct FakeNotion {
    page_size: usize,
    state: Mutex<FakeState>,
}

impl FakeNotion {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            state: Mutex::new(FakeState::default()),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn add_row(&self, database_id: &str, row: Page) {
        self.state()
            .databases
            .entry(database_id.to_string())
            .or_default()
            .push(row);
    }

    pub fn add_block(&self, parent_id: &str, block: Block) {
        self.state()
            .children
            .entry(parent_id.to_string())
            .or_default()
            .push(block);
    }

    pub fn reads_of(&self, id: &str) -> usize {
        self.state()
            .reads
            .iter()
            .filter(|r| r.split(' ').nth(1) == Some(id))
            .count()
    }

    pub fn created_names(&self) -> Vec<String> {
        self.state()
            .created
            .iter()
            .filter_map(|(_, props)| match props.get("Name")? {
                PropertyInput::Title { title } => title.first().map(|t| t.text.content.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn to_do(&self, block_id: &str) -> Option<ToDo> {
        self.state()
            .children
            .values()
            .flatten()
            .find(|b| b.id == block_id)
            .and_then(|b| b.to_do.clone())
    }

    fn page_of<T: Clone>(
        &self,
        op: &str,
        id: &str,
        items: Option<&Vec<T>>,
        cursor: Option<String>,
        state: &mut FakeState,
    ) -> Result<ListResponse<T>> {
        let served = state
            .reads
            .iter()
            .filter(|r| r.split(' ').nth(1) == Some(id))
            .count();
        state
            .reads
            .push(format!("{} {} {}", op, id, cursor.clone().unwrap_or_default()));

        if let Some(limit) = state.fail_reads_after.get(id) {
            if served >= *limit {
                return Err(anyhow!("injected read failure for {}", id));
            }
        }

        let items = items.ok_or_else(|| anyhow!("object_not_found: {}", id))?;
        let start = match cursor {
            Some(c) => c.parse::<usize>()?,
            None => 0,
        };
        let end = (start + self.page_size).min(items.len());
        let next_cursor = (end < items.len()).then(|| end.to_string());

        Ok(ListResponse {
            results: items[start..end].to_vec(),
            has_more: next_cursor.is_some(),
            next_cursor,
        })
    }
}

#[async_trait]
impl NotionApi for FakeNotion {
    async fn verify_access(&self) -> Result<()> {
        if self.state().reject_credential {
            return Err(anyhow!("unauthorized: API token is invalid."));
        }
        Ok(())
    }

    async fn query_database(
        &self,
        database_id: &str,
        cursor: Option<String>,
    ) -> Result<ListResponse<Page>> {
        let mut state = self.state();
        let items = state.databases.get(database_id).cloned();
        self.page_of("query", database_id, items.as_ref(), cursor, &mut state)
    }

    async fn list_block_children(
        &self,
        block_id: &str,
        cursor: Option<String>,
    ) -> Result<ListResponse<Block>> {
        let mut state = self.state();
        let items = state.children.get(block_id).cloned().unwrap_or_default();
        self.page_of("children", block_id, Some(&items), cursor, &mut state)
    }

    async fn update_to_do(
        &self,
        block_id: &str,
        label: &str,
        checked: Option<bool>,
    ) -> Result<()> {
        let mut state = self.state();
        if state.fail_updates.contains(block_id) {
            return Err(anyhow!("injected update failure for {}", block_id));
        }

        state.updates.push(ToDoUpdate {
            block_id: block_id.to_string(),
            label: label.to_string(),
            checked,
        });

        if let Some(todo) = state
            .children
            .values_mut()
            .flatten()
            .find(|b| b.id == block_id)
            .and_then(|b| b.to_do.as_mut())
        {
            todo.rich_text = vec![RichText::plain(label)];
            if let Some(checked) = checked {
                todo.checked = checked;
            }
        }
        Ok(())
    }

    async fn create_page(&self, database_id: &str, properties: PageProperties) -> Result<()> {
        let mut state = self.state();
        if let Some(limit) = state.fail_creates_after {
            if state.created.len() >= limit {
                return Err(anyhow!("injected create failure"));
            }
        }
        state.created.push((database_id.to_string(), properties));
        Ok(())
    }
}

pub fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "NOTION_KEY" => Some("secret_test".into()),
        "RECIPES_DATABASE_ID" => Some("recipes".into()),
        "GROCERIES_DATABASE_ID" => Some("groceries".into()),
        "POLL_INTERVAL" => Some("0".into()),
        _ => None,
    })
    .unwrap()
}

pub fn recipe(id: &str, title: &str) -> Page {
    let mut row = Page {
        id: id.to_string(),
        properties: Default::default(),
    };
    row.properties.insert(
        "Name".into(),
        PropertyValue::Title {
            title: vec![RichText::plain(title)],
        },
    );
    row
}

pub fn ingredient(id: &str, titles: &[&str], quantities: &[&str], exclude: bool) -> Page {
    let mut row = Page {
        id: id.to_string(),
        properties: Default::default(),
    };
    row.properties.insert(
        "Name".into(),
        PropertyValue::Title {
            title: titles.iter().map(|t| RichText::plain(*t)).collect(),
        },
    );
    row.properties.insert(
        "Quantity".into(),
        PropertyValue::RichText {
            rich_text: quantities.iter().map(|q| RichText::plain(*q)).collect(),
        },
    );
    row.properties
        .insert("Exclude?".into(), PropertyValue::Checkbox { checkbox: exclude });
    row
}

pub fn to_do(id: &str, fragments: &[&str], checked: bool) -> Block {
    Block {
        id: id.to_string(),
        kind: "to_do".into(),
        to_do: Some(ToDo {
            rich_text: fragments.iter().map(|t| RichText::plain(*t)).collect(),
            checked,
        }),
        child_database: None,
    }
}

pub fn child_database(id: &str, title: &str) -> Block {
    Block {
        id: id.to_string(),
        kind: "child_database".into(),
        to_do: None,
        child_database: Some(ChildDatabase {
            title: title.to_string(),
        }),
    }
}

pub fn paragraph(id: &str) -> Block {
    Block {
        id: id.to_string(),
        kind: "paragraph".into(),
        to_do: None,
        child_database: None,
    }
}

/// Counts emitted events per level for the thread it is installed on.
#[derive(Clone, Default)]
pub struct LevelCounter {
    counts: Arc<Mutex<HashMap<Level, usize>>>,
}

impl LevelCounter {
    pub fn install(&self) -> DefaultGuard {
        tracing::subscriber::set_default(Registry::default().with(self.clone()))
    }

    pub fn count(&self, level: Level) -> usize {
        self.counts
            .lock()
            .unwrap()
            .get(&level)
            .copied()
            .unwrap_or(0)
    }
}

impl<S: Subscriber> Layer<S> for LevelCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        *self
            .counts
            .lock()
            .unwrap()
            .entry(*event.metadata().level())
            .or_default() += 1;
    }
}
