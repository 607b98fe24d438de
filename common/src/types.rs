use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One page of a paginated Notion list endpoint.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ListResponse<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RichText {
    #[serde(default)]
    pub plain_text: String,
}

impl RichText {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            plain_text: text.into(),
        }
    }
}

pub fn concat_plain_text(fragments: &[RichText]) -> String {
    fragments.iter().map(|t| t.plain_text.as_str()).collect()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyValue {
    Title { title: Vec<RichText> },
    RichText { rich_text: Vec<RichText> },
    Checkbox { checkbox: bool },
    #[serde(other)]
    Unsupported,
}

/// A database row.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
}

impl Page {
    pub fn title(&self, property: &str) -> Option<&[RichText]> {
        match self.properties.get(property)? {
            PropertyValue::Title { title } => Some(title),
            _ => None,
        }
    }

    pub fn rich_text(&self, property: &str) -> Option<&[RichText]> {
        match self.properties.get(property)? {
            PropertyValue::RichText { rich_text } => Some(rich_text),
            _ => None,
        }
    }

    pub fn checkbox(&self, property: &str) -> Option<bool> {
        match self.properties.get(property)? {
            PropertyValue::Checkbox { checkbox } => Some(*checkbox),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ToDo {
    #[serde(default)]
    pub rich_text: Vec<RichText>,
    #[serde(default)]
    pub checked: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChildDatabase {
    pub title: String,
}

/// A content block. Only the payloads this integration reads are kept;
/// every other block type deserializes with both left empty.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Block {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_do: Option<ToDo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_database: Option<ChildDatabase>,
}

impl Block {
    pub fn as_to_do(&self) -> Option<&ToDo> {
        if self.kind == "to_do" {
            self.to_do.as_ref()
        } else {
            None
        }
    }

    pub fn as_child_database(&self) -> Option<&ChildDatabase> {
        if self.kind == "child_database" {
            self.child_database.as_ref()
        } else {
            None
        }
    }
}

// Write-side shapes

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TextInput {
    pub text: TextContent,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TextContent {
    pub content: String,
}

impl TextInput {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            text: TextContent {
                content: content.into(),
            },
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum PropertyInput {
    Title { title: Vec<TextInput> },
    Checkbox { checkbox: bool },
}

pub type PageProperties = BTreeMap<String, PropertyInput>;
