use chrono::{DateTime, Utc};

use crate::errors::{CmsError, Result};
use crate::model::{Block, Page, Site};
use crate::ops::{SnapshotLookup, SnapshotRepository};
use crate::snapshot::load_page;

use super::{find_existing_container, ContentManager, ManagerKind, DEFAULT_ERROR_CODES};

/// Reads enabled snapshots whose window contains the request instant
pub struct PublishedContentManager<'a, R: ?Sized> {
    repo: &'a R,
    at: DateTime<Utc>,
    error_codes: Vec<u16>,
}

impl<'a, R> PublishedContentManager<'a, R>
where
    R: SnapshotRepository + ?Sized,
{
    pub fn new(repo: &'a R, at: DateTime<Utc>) -> Self {
        Self {
            repo,
            at,
            error_codes: DEFAULT_ERROR_CODES.to_vec(),
        }
    }

    pub fn with_error_codes(mut self, codes: Vec<u16>) -> Self {
        self.error_codes = codes;
        self
    }

    fn lookup(&self, site_id: &str, lookup: SnapshotLookup) -> Result<Page> {
        match self.repo.published_snapshot(site_id, &lookup, self.at)? {
            Some(snapshot) => Ok(load_page(&snapshot).0),
            None => Err(CmsError::page_not_found(lookup.to_string())),
        }
    }
}

impl<R> ContentManager for PublishedContentManager<'_, R>
where
    R: SnapshotRepository + ?Sized,
{
    fn kind(&self) -> ManagerKind {
        ManagerKind::Published
    }

    fn get_page_by_url(&self, site: &Site, url: &str) -> Result<Page> {
        self.lookup(&site.id, SnapshotLookup::Url(url.to_string()))
    }

    fn get_page_by_route_name(&self, site: &Site, route_name: &str) -> Result<Page> {
        self.lookup(&site.id, SnapshotLookup::RouteName(route_name.to_string()))
    }

    fn get_page_by_id(&self, site: &Site, id: &str) -> Result<Page> {
        self.lookup(&site.id, SnapshotLookup::PageId(id.to_string()))
    }

    fn get_page_by_alias(&self, site: &Site, alias: &str) -> Result<Page> {
        self.lookup(&site.id, SnapshotLookup::Alias(alias.to_string()))
    }

    fn blocks(&self, page: &Page) -> Result<Vec<Block>> {
        let lookup = SnapshotLookup::PageId(page.id.clone());
        Ok(self
            .repo
            .published_snapshot(&page.site_id, &lookup, self.at)?
            .map(|snapshot| load_page(&snapshot).1)
            .unwrap_or_default())
    }

    /// Never fabricates content: a missing container stays missing
    fn find_container(
        &self,
        code: &str,
        page: &Page,
        parent: Option<&Block>,
    ) -> Result<Option<Block>> {
        let blocks = self.blocks(page)?;
        Ok(find_existing_container(&blocks, code, parent))
    }

    fn http_error_codes(&self) -> &[u16] {
        &self.error_codes
    }
}
