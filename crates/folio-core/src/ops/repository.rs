//! Read-side repository traits
//!
//! The resolver, router and content managers only see these traits. The
//! in-memory `Store` and the SQLite repository in `folio-store` both
//! implement them.

use chrono::{DateTime, Utc};

use crate::errors::Result;
use crate::model::{Block, Page, Site, Snapshot};

pub trait SiteRepository {
    /// Enabled sites whose host is one of `hosts`, default sites first
    fn sites_for_hosts(&self, hosts: &[&str]) -> Result<Vec<Site>>;

    fn site(&self, id: &str) -> Result<Option<Site>>;
}

pub trait PageRepository {
    fn page(&self, id: &str) -> Result<Option<Page>>;

    fn page_by_url(&self, site_id: &str, url: &str) -> Result<Option<Page>>;

    fn page_by_route_name(&self, site_id: &str, route_name: &str) -> Result<Option<Page>>;

    fn page_by_alias(&self, site_id: &str, alias: &str) -> Result<Option<Page>>;

    /// All pages of a site ordered by position then id
    fn pages_for_site(&self, site_id: &str) -> Result<Vec<Page>>;

    /// All blocks of a page ordered by position then id
    fn blocks_for_page(&self, page_id: &str) -> Result<Vec<Block>>;
}

/// Column a published page is looked up by
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotLookup {
    Url(String),
    RouteName(String),
    Alias(String),
    PageId(String),
}

impl SnapshotLookup {
    pub fn matches(&self, snapshot: &Snapshot) -> bool {
        match self {
            SnapshotLookup::Url(url) => &snapshot.url == url,
            SnapshotLookup::RouteName(name) => &snapshot.route_name == name,
            SnapshotLookup::Alias(alias) => snapshot.page_alias.as_deref() == Some(alias.as_str()),
            SnapshotLookup::PageId(id) => &snapshot.page_id == id,
        }
    }
}

impl std::fmt::Display for SnapshotLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotLookup::Url(url) => write!(f, "url={}", url),
            SnapshotLookup::RouteName(name) => write!(f, "route_name={}", name),
            SnapshotLookup::Alias(alias) => write!(f, "alias={}", alias),
            SnapshotLookup::PageId(id) => write!(f, "page_id={}", id),
        }
    }
}

pub trait SnapshotRepository {
    /// Enabled snapshot of `site_id` matching `lookup` whose window contains `at`
    fn published_snapshot(
        &self,
        site_id: &str,
        lookup: &SnapshotLookup,
        at: DateTime<Utc>,
    ) -> Result<Option<Snapshot>>;

    /// Every snapshot of a page, most recently activated first
    fn snapshots_for_page(&self, page_id: &str) -> Result<Vec<Snapshot>>;
}
