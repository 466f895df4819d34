use chrono::{DateTime, Utc};

use crate::errors::Result;
use crate::model::{Block, Page, PageContent, Snapshot};

/// Compile a page and its block tree into a new, not yet activated snapshot
///
/// Blocks are stored ordered by position then id so two compilations of the
/// same draft serialize identically.
pub fn compile_page(page: &Page, blocks: &[Block], at: DateTime<Utc>) -> Snapshot {
    let mut blocks = blocks.to_vec();
    blocks.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id)));

    let mut content_page = page.clone();
    content_page.edited = false;

    Snapshot {
        id: uuid::Uuid::now_v7().to_string(),
        page_id: page.id.clone(),
        site_id: page.site_id.clone(),
        parent_id: page.parent_id.clone(),
        url: page.url.clone(),
        route_name: page.route_name.clone(),
        page_alias: page.page_alias.clone(),
        page_type: page.page_type,
        name: page.name.clone(),
        position: page.position,
        decorate: page.decorate,
        enabled: page.enabled,
        content: PageContent {
            page: content_page,
            blocks,
        },
        publication_date_start: None,
        publication_date_end: None,
        created_at: at,
    }
}

/// Rebuild the page and blocks a snapshot was compiled from
///
/// Lookup columns win over the embedded copy so a published read always
/// agrees with the row it was selected by.
pub fn load_page(snapshot: &Snapshot) -> (Page, Vec<Block>) {
    let mut page = snapshot.content.page.clone();
    page.id = snapshot.page_id.clone();
    page.site_id = snapshot.site_id.clone();
    page.parent_id = snapshot.parent_id.clone();
    page.url = snapshot.url.clone();
    page.route_name = snapshot.route_name.clone();
    page.page_alias = snapshot.page_alias.clone();
    page.page_type = snapshot.page_type;
    page.name = snapshot.name.clone();
    page.position = snapshot.position;
    page.decorate = snapshot.decorate;
    page.enabled = snapshot.enabled;
    page.edited = false;
    (page, snapshot.content.blocks.clone())
}

/// Encode snapshot content for storage
///
/// # Errors
///
/// Returns `Serialization` if the content cannot be encoded.
pub fn encode_content(content: &PageContent) -> Result<String> {
    Ok(serde_json::to_string(content)?)
}

/// # Errors
///
/// Returns `Serialization` if the stored content is not valid page content.
pub fn decode_content(raw: &str) -> Result<PageContent> {
    Ok(serde_json::from_str(raw)?)
}
