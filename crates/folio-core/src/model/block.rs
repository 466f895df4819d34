use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Block type of the slot holders that group child blocks
pub const CONTAINER_BLOCK_TYPE: &str = "folio.page.block.container";

/// Block - a unit of content attached to a page, possibly nested
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    pub page_id: String,

    #[serde(default)]
    pub parent_id: Option<String>,

    #[serde(default)]
    pub name: String,

    /// Renderer key, e.g. `folio.block.text`
    pub block_type: String,

    #[serde(default)]
    pub settings: BTreeMap<String, serde_json::Value>,

    #[serde(default)]
    pub position: i64,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl Block {
    pub fn new(
        id: impl Into<String>,
        page_id: impl Into<String>,
        block_type: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            page_id: page_id.into(),
            parent_id: None,
            name: String::new(),
            block_type: block_type.into(),
            settings: BTreeMap::new(),
            position: 0,
            enabled: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Build a detached container for the slot `code`
    ///
    /// The block gets a fresh id but is not persisted.
    pub fn container(code: &str, page_id: &str, parent_id: Option<&str>) -> Self {
        let mut block = Block::new(uuid::Uuid::now_v7().to_string(), page_id, CONTAINER_BLOCK_TYPE);
        block.name = code.to_string();
        block.parent_id = parent_id.map(str::to_string);
        block.position = 1;
        block
            .settings
            .insert("code".to_string(), serde_json::Value::String(code.to_string()));
        block
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.settings.insert(key.into(), value);
        self
    }

    pub fn is_container(&self) -> bool {
        self.block_type == CONTAINER_BLOCK_TYPE
    }

    /// Slot code of a container block
    pub fn container_code(&self) -> Option<&str> {
        if !self.is_container() {
            return None;
        }
        self.settings.get("code").and_then(|v| v.as_str())
    }

    pub fn setting(&self, key: &str) -> Option<&serde_json::Value> {
        self.settings.get(key)
    }
}
