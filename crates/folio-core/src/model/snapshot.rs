use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::block::Block;
use super::page::{Page, PageType};

/// Serialized page and block tree stored inside a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageContent {
    pub page: Page,
    pub blocks: Vec<Block>,
}

/// Snapshot - immutable, time-windowed published copy of a page
///
/// The lookup columns duplicate page fields at compile time so published
/// reads never consult the live page tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: String,
    pub page_id: String,
    pub site_id: String,
    pub parent_id: Option<String>,
    pub url: String,
    pub route_name: String,
    pub page_alias: Option<String>,
    pub page_type: PageType,
    pub name: String,
    pub position: i64,
    pub decorate: bool,
    pub enabled: bool,
    pub content: PageContent,
    pub publication_date_start: Option<DateTime<Utc>>,
    pub publication_date_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Snapshot {
    /// Open window: started and not yet closed
    pub fn is_active(&self) -> bool {
        self.publication_date_start.is_some() && self.publication_date_end.is_none()
    }

    /// Half-open window check `[start, end)`
    pub fn is_published_at(&self, at: DateTime<Utc>) -> bool {
        match self.publication_date_start {
            None => false,
            Some(start) if start > at => false,
            Some(_) => match self.publication_date_end {
                None => true,
                Some(end) => at < end,
            },
        }
    }

    /// Was this snapshot ever activated
    pub fn was_published(&self) -> bool {
        self.publication_date_start.is_some()
    }
}
