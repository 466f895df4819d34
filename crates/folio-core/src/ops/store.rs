use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::errors::{CmsError, Result};
use crate::model::{Block, Page, Site, Snapshot};
use crate::snapshot::{activate, select_for_deletion};

use super::repository::{PageRepository, SiteRepository, SnapshotLookup, SnapshotRepository};

/// In-memory store for sites, pages, blocks and snapshots
///
/// Single-threaded; used by tests and by callers that assemble a site tree
/// without a database. Implements the same repository traits as the SQLite
/// repository.
#[derive(Debug, Clone, Default)]
pub struct Store {
    sites: BTreeMap<String, Site>,
    pages: BTreeMap<String, Page>,
    blocks: BTreeMap<String, Block>,
    snapshots: BTreeMap<String, Snapshot>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_site(&mut self, site: Site) {
        self.sites.insert(site.id.clone(), site);
    }

    pub fn insert_page(&mut self, page: Page) {
        self.pages.insert(page.id.clone(), page);
    }

    pub fn insert_block(&mut self, block: Block) {
        self.blocks.insert(block.id.clone(), block);
    }

    pub fn insert_snapshot(&mut self, snapshot: Snapshot) {
        self.snapshots.insert(snapshot.id.clone(), snapshot);
    }

    pub fn remove_block(&mut self, block_id: &str) -> Option<Block> {
        self.blocks.remove(block_id)
    }

    pub fn get_page_mut(&mut self, id: &str) -> Result<&mut Page> {
        self.pages
            .get_mut(id)
            .ok_or_else(|| CmsError::page_not_found(format!("id={}", id)))
    }

    pub fn get_snapshot(&self, id: &str) -> Result<&Snapshot> {
        self.snapshots
            .get(id)
            .ok_or_else(|| CmsError::SnapshotNotFound {
                snapshot_id: id.to_string(),
            })
    }

    pub fn list_sites(&self) -> Vec<&Site> {
        self.sites.values().collect()
    }

    /// Activate snapshots in order, closing other open windows of each page
    ///
    /// All-or-nothing: on error no window changes.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotNotFound` or `WindowConflict`.
    pub fn enable_snapshots(&mut self, snapshot_ids: &[&str], at: DateTime<Utc>) -> Result<()> {
        let mut staged = self.snapshots.clone();
        for id in snapshot_ids {
            let page_id = staged
                .get(*id)
                .map(|s| s.page_id.clone())
                .ok_or_else(|| CmsError::SnapshotNotFound {
                    snapshot_id: id.to_string(),
                })?;
            let mut history: Vec<Snapshot> = staged
                .values()
                .filter(|s| s.page_id == page_id)
                .cloned()
                .collect();
            activate(&mut history, id, at)?;
            for snapshot in history {
                staged.insert(snapshot.id.clone(), snapshot);
            }
        }
        self.snapshots = staged;
        Ok(())
    }

    /// Delete old snapshots of a page, returning how many were removed
    pub fn cleanup_page(&mut self, page_id: &str, keep: usize) -> usize {
        let history: Vec<Snapshot> = self
            .snapshots
            .values()
            .filter(|s| s.page_id == page_id)
            .cloned()
            .collect();
        let doomed = select_for_deletion(&history, keep);
        for id in &doomed {
            self.snapshots.remove(id);
        }
        doomed.len()
    }

    fn sorted_pages(&self, site_id: &str) -> Vec<Page> {
        let mut pages: Vec<Page> = self
            .pages
            .values()
            .filter(|p| p.site_id == site_id)
            .cloned()
            .collect();
        pages.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id)));
        pages
    }

    fn find_page<F>(&self, site_id: &str, predicate: F) -> Option<Page>
    where
        F: Fn(&Page) -> bool,
    {
        self.sorted_pages(site_id).into_iter().find(|p| predicate(p))
    }
}

impl SiteRepository for Store {
    fn sites_for_hosts(&self, hosts: &[&str]) -> Result<Vec<Site>> {
        let mut sites: Vec<Site> = self
            .sites
            .values()
            .filter(|s| s.enabled && hosts.contains(&s.host.as_str()))
            .cloned()
            .collect();
        sites.sort_by(|a, b| b.is_default.cmp(&a.is_default).then_with(|| a.id.cmp(&b.id)));
        Ok(sites)
    }

    fn site(&self, id: &str) -> Result<Option<Site>> {
        Ok(self.sites.get(id).cloned())
    }
}

impl PageRepository for Store {
    fn page(&self, id: &str) -> Result<Option<Page>> {
        Ok(self.pages.get(id).cloned())
    }

    fn page_by_url(&self, site_id: &str, url: &str) -> Result<Option<Page>> {
        Ok(self.find_page(site_id, |p| p.url == url))
    }

    fn page_by_route_name(&self, site_id: &str, route_name: &str) -> Result<Option<Page>> {
        Ok(self.find_page(site_id, |p| p.route_name == route_name))
    }

    fn page_by_alias(&self, site_id: &str, alias: &str) -> Result<Option<Page>> {
        Ok(self.find_page(site_id, |p| p.page_alias.as_deref() == Some(alias)))
    }

    fn pages_for_site(&self, site_id: &str) -> Result<Vec<Page>> {
        Ok(self.sorted_pages(site_id))
    }

    fn blocks_for_page(&self, page_id: &str) -> Result<Vec<Block>> {
        let mut blocks: Vec<Block> = self
            .blocks
            .values()
            .filter(|b| b.page_id == page_id)
            .cloned()
            .collect();
        blocks.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id)));
        Ok(blocks)
    }
}

impl SnapshotRepository for Store {
    fn published_snapshot(
        &self,
        site_id: &str,
        lookup: &SnapshotLookup,
        at: DateTime<Utc>,
    ) -> Result<Option<Snapshot>> {
        Ok(self
            .snapshots
            .values()
            .filter(|s| s.site_id == site_id && s.enabled && s.is_published_at(at))
            .find(|s| lookup.matches(s))
            .cloned())
    }

    fn snapshots_for_page(&self, page_id: &str) -> Result<Vec<Snapshot>> {
        let mut snapshots: Vec<Snapshot> = self
            .snapshots
            .values()
            .filter(|s| s.page_id == page_id)
            .cloned()
            .collect();
        snapshots.sort_by(|a, b| {
            b.publication_date_start
                .cmp(&a.publication_date_start)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(snapshots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::compile_page;
    use chrono::TimeZone;

    #[test]
    fn test_sites_for_hosts_puts_default_first() {
        let mut store = Store::new();
        store.insert_site(Site::new("a", "A", "example.com"));
        store.insert_site(Site::new("b", "B", "example.com").with_default(true));
        store.insert_site(Site::new("c", "C", "other.com"));
        let mut disabled = Site::new("d", "D", "localhost");
        disabled.enabled = false;
        store.insert_site(disabled);

        let sites = store.sites_for_hosts(&["example.com", "localhost"]).unwrap();
        let ids: Vec<_> = sites.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_enable_snapshots_is_all_or_nothing() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut store = Store::new();
        let page = Page::new("p1", "s1", "Home", "homepage").with_url("/");
        let s1 = compile_page(&page, &[], t0);
        let s1_id = s1.id.clone();
        store.insert_snapshot(s1);

        let err = store.enable_snapshots(&[s1_id.as_str(), "missing"], t0);
        assert!(err.is_err());
        assert!(!store.get_snapshot(&s1_id).unwrap().is_active());

        store.enable_snapshots(&[s1_id.as_str()], t0).unwrap();
        let found = store
            .published_snapshot("s1", &SnapshotLookup::Url("/".to_string()), t0)
            .unwrap();
        assert_eq!(found.map(|s| s.id), Some(s1_id));
    }
}
