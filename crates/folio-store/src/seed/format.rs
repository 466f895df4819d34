//! Seed format v1 schema
//!
//! Pages nest under their site and under their parent page; a page's
//! `children` imply its `parent_id`. Blocks nest the same way.

use std::collections::BTreeMap;

use folio_core::model::{Block, Page, PageType, RequestMethods, Site};
use serde::{Deserialize, Serialize};

/// Top-level seed file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedV1 {
    /// Must be 1
    pub schema_version: u32,

    #[serde(default)]
    pub sites: Vec<SeedSite>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedSite {
    pub id: String,
    pub name: String,
    pub host: String,

    #[serde(default)]
    pub relative_path: Option<String>,

    #[serde(default)]
    pub locale: Option<String>,

    #[serde(default)]
    pub is_default: bool,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub meta_description: Option<String>,

    #[serde(default)]
    pub pages: Vec<SeedPage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedPage {
    pub id: String,
    pub name: String,
    pub route_name: String,

    #[serde(default)]
    pub slug: String,

    /// Pattern URL; only kept for dynamic pages
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub custom_url: Option<String>,

    #[serde(default)]
    pub page_alias: Option<String>,

    /// `static`, `dynamic`, `action`, `error` or `alias`
    #[serde(default)]
    pub page_type: Option<String>,

    /// `GET|POST` style mask; absent means any method
    #[serde(default)]
    pub request_method: Option<String>,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub target_id: Option<String>,

    #[serde(default)]
    pub template_code: Option<String>,

    #[serde(default)]
    pub position: i64,

    #[serde(default)]
    pub blocks: Vec<SeedBlock>,

    #[serde(default)]
    pub children: Vec<SeedPage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedBlock {
    pub id: String,

    #[serde(rename = "type")]
    pub block_type: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub settings: BTreeMap<String, serde_json::Value>,

    #[serde(default)]
    pub position: i64,

    #[serde(default)]
    pub children: Vec<SeedBlock>,
}

fn default_true() -> bool {
    true
}

impl SeedSite {
    pub fn to_site(&self) -> Site {
        let mut site = Site::new(&self.id, &self.name, &self.host).with_default(self.is_default);
        site.relative_path = self.relative_path.clone();
        site.locale = self.locale.clone();
        site.enabled = self.enabled;
        site.title = self.title.clone();
        site.meta_description = self.meta_description.clone();
        site
    }

    /// Flatten the page tree, parents before children
    pub fn flatten(&self) -> (Vec<Page>, Vec<Block>) {
        let mut pages = Vec::new();
        let mut blocks = Vec::new();
        for page in &self.pages {
            page.flatten_into(&self.id, None, &mut pages, &mut blocks);
        }
        (pages, blocks)
    }
}

impl SeedPage {
    /// Unknown `page_type` values are rejected by the parser before this runs
    pub fn to_page(&self, site_id: &str, parent_id: Option<&str>) -> Page {
        let page_type = self
            .page_type
            .as_deref()
            .and_then(PageType::parse)
            .unwrap_or_default();

        let mut page = Page::new(&self.id, site_id, &self.name, &self.route_name)
            .with_slug(&self.slug)
            .with_type(page_type);
        page.parent_id = parent_id.map(str::to_string);
        if let Some(url) = &self.url {
            page.url = url.clone();
        }
        page.custom_url = self.custom_url.clone();
        page.page_alias = self.page_alias.clone();
        page.request_method = self
            .request_method
            .as_deref()
            .map(RequestMethods::parse)
            .unwrap_or_else(RequestMethods::any);
        page.enabled = self.enabled;
        page.title = self.title.clone();
        page.target_id = self.target_id.clone();
        page.template_code = self.template_code.clone();
        page.position = self.position;
        page
    }

    fn flatten_into(
        &self,
        site_id: &str,
        parent_id: Option<&str>,
        pages: &mut Vec<Page>,
        blocks: &mut Vec<Block>,
    ) {
        pages.push(self.to_page(site_id, parent_id));
        for block in &self.blocks {
            block.flatten_into(&self.id, None, blocks);
        }
        for child in &self.children {
            child.flatten_into(site_id, Some(&self.id), pages, blocks);
        }
    }
}

impl SeedBlock {
    fn flatten_into(&self, page_id: &str, parent_id: Option<&str>, blocks: &mut Vec<Block>) {
        let mut block = Block::new(&self.id, page_id, &self.block_type);
        block.name = self.name.clone();
        block.parent_id = parent_id.map(str::to_string);
        block.settings = self.settings.clone();
        block.position = self.position;
        blocks.push(block);
        for child in &self.children {
            child.flatten_into(page_id, Some(&self.id), blocks);
        }
    }
}
