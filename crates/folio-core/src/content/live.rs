use crate::errors::{CmsError, Result};
use crate::model::{Block, Page, Site};
use crate::ops::PageRepository;

use super::{find_existing_container, ContentManager, ManagerKind, DEFAULT_ERROR_CODES};

/// Reads the editable draft tree
pub struct LiveContentManager<'a, R: ?Sized> {
    repo: &'a R,
    error_codes: Vec<u16>,
}

impl<'a, R> LiveContentManager<'a, R>
where
    R: PageRepository + ?Sized,
{
    pub fn new(repo: &'a R) -> Self {
        Self {
            repo,
            error_codes: DEFAULT_ERROR_CODES.to_vec(),
        }
    }

    pub fn with_error_codes(mut self, codes: Vec<u16>) -> Self {
        self.error_codes = codes;
        self
    }
}

fn found(page: Option<Page>, lookup: String) -> Result<Page> {
    page.ok_or_else(|| CmsError::page_not_found(lookup))
}

impl<R> ContentManager for LiveContentManager<'_, R>
where
    R: PageRepository + ?Sized,
{
    fn kind(&self) -> ManagerKind {
        ManagerKind::Live
    }

    fn get_page_by_url(&self, site: &Site, url: &str) -> Result<Page> {
        found(self.repo.page_by_url(&site.id, url)?, format!("url={}", url))
    }

    fn get_page_by_route_name(&self, site: &Site, route_name: &str) -> Result<Page> {
        found(
            self.repo.page_by_route_name(&site.id, route_name)?,
            format!("route_name={}", route_name),
        )
    }

    fn get_page_by_id(&self, site: &Site, id: &str) -> Result<Page> {
        found(
            self.repo.page(id)?.filter(|p| p.site_id == site.id),
            format!("id={}", id),
        )
    }

    fn get_page_by_alias(&self, site: &Site, alias: &str) -> Result<Page> {
        found(
            self.repo.page_by_alias(&site.id, alias)?,
            format!("alias={}", alias),
        )
    }

    fn blocks(&self, page: &Page) -> Result<Vec<Block>> {
        self.repo.blocks_for_page(&page.id)
    }

    /// Missing containers are created detached; the caller persists them
    fn find_container(
        &self,
        code: &str,
        page: &Page,
        parent: Option<&Block>,
    ) -> Result<Option<Block>> {
        let blocks = self.blocks(page)?;
        Ok(find_existing_container(&blocks, code, parent).or_else(|| {
            Some(Block::container(
                code,
                &page.id,
                parent.map(|p| p.id.as_str()),
            ))
        }))
    }

    fn http_error_codes(&self) -> &[u16] {
        &self.error_codes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::Store;

    fn store() -> (Store, Site) {
        let site = Site::new("s1", "Main", "example.com");
        let mut store = Store::new();
        store.insert_site(site.clone());
        store.insert_page(Page::new("home", "s1", "Home", "homepage").with_url("/"));
        store.insert_page(
            Page::new("e404", "s1", "Not found", "_page_internal_error_404")
                .with_parent("home")
                .with_url("/404"),
        );
        store.insert_block(Block::container("main", "home", None));
        (store, site)
    }

    #[test]
    fn test_lookup_by_url_and_route_name() {
        let (store, site) = store();
        let manager = LiveContentManager::new(&store);
        assert_eq!(manager.get_page_by_url(&site, "/").unwrap().id, "home");
        assert_eq!(manager.error_page(&site, 404).unwrap().id, "e404");
        assert!(matches!(
            manager.error_page(&site, 418),
            Err(CmsError::PageNotFound { .. })
        ));
        assert!(manager.get_page_by_url(&site, "/missing").is_err());
    }

    #[test]
    fn test_page_from_other_site_is_not_found() {
        let (store, _) = store();
        let other = Site::new("s2", "Other", "other.com");
        let manager = LiveContentManager::new(&store);
        assert!(manager.get_page_by_id(&other, "home").is_err());
    }

    #[test]
    fn test_find_container_creates_missing_slot() {
        let (store, site) = store();
        let manager = LiveContentManager::new(&store);
        let home = manager.get_page_by_url(&site, "/").unwrap();

        let existing = manager.find_container("main", &home, None).unwrap().unwrap();
        assert_eq!(existing.container_code(), Some("main"));

        let created = manager.find_container("sidebar", &home, None).unwrap().unwrap();
        assert_eq!(created.container_code(), Some("sidebar"));
        assert!(created.enabled);
        assert_eq!(created.position, 1);
        assert_eq!(store.blocks_for_page("home").unwrap().len(), 1);
    }
}
