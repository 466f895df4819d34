//! Live and published page access behind one interface
//!
//! Editors read the mutable draft tree through `LiveContentManager`; public
//! traffic reads immutable snapshots through `PublishedContentManager`. The
//! request pipeline picks one with `select_content_manager`.

mod live;
mod published;

pub use live::LiveContentManager;
pub use published::PublishedContentManager;

use crate::errors::{CmsError, Result};
use crate::model::{Block, Page, Site, PAGE_INTERNAL_ERROR_PREFIX, PAGE_INTERNAL_PREFIX};

/// Error statuses with a dedicated internal page unless configured otherwise
pub const DEFAULT_ERROR_CODES: [u16; 2] = [404, 500];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerKind {
    Live,
    Published,
}

impl ManagerKind {
    /// Token used in fragment requests
    pub fn as_str(&self) -> &'static str {
        match self {
            ManagerKind::Live => "page",
            ManagerKind::Published => "snapshot",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "page" => Some(ManagerKind::Live),
            "snapshot" => Some(ManagerKind::Published),
            _ => None,
        }
    }
}

/// How a page is looked up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageLookup {
    Url(String),
    RouteName(String),
    Id(String),
    Alias(String),
}

pub trait ContentManager {
    fn kind(&self) -> ManagerKind;

    /// # Errors
    ///
    /// Returns `PageNotFound` when no page has this URL.
    fn get_page_by_url(&self, site: &Site, url: &str) -> Result<Page>;

    /// # Errors
    ///
    /// Returns `PageNotFound` when no page has this route name.
    fn get_page_by_route_name(&self, site: &Site, route_name: &str) -> Result<Page>;

    /// # Errors
    ///
    /// Returns `PageNotFound` when the page is absent or belongs to another site.
    fn get_page_by_id(&self, site: &Site, id: &str) -> Result<Page>;

    /// # Errors
    ///
    /// Returns `PageNotFound` when no page carries this alias.
    fn get_page_by_alias(&self, site: &Site, alias: &str) -> Result<Page>;

    /// # Errors
    ///
    /// Returns `PageNotFound` when the lookup finds nothing.
    fn get_page(&self, site: &Site, lookup: &PageLookup) -> Result<Page> {
        match lookup {
            PageLookup::Url(url) => self.get_page_by_url(site, url),
            PageLookup::RouteName(name) => self.get_page_by_route_name(site, name),
            PageLookup::Id(id) => self.get_page_by_id(site, id),
            PageLookup::Alias(alias) => self.get_page_by_alias(site, alias),
        }
    }

    /// Internal page `_page_internal_{name}`, e.g. `global` or `error_404`
    ///
    /// # Errors
    ///
    /// Returns `PageNotFound` when the internal page does not exist.
    fn get_internal_route(&self, site: &Site, name: &str) -> Result<Page> {
        self.get_page_by_route_name(site, &format!("{}{}", PAGE_INTERNAL_PREFIX, name))
    }

    /// Blocks of a page ordered by position
    ///
    /// # Errors
    ///
    /// Returns any repository error.
    fn blocks(&self, page: &Page) -> Result<Vec<Block>>;

    /// Container block named `code` on `page`, below `parent` when given
    ///
    /// # Errors
    ///
    /// Returns any repository error.
    fn find_container(&self, code: &str, page: &Page, parent: Option<&Block>)
        -> Result<Option<Block>>;

    /// Statuses that have a dedicated error page
    fn http_error_codes(&self) -> &[u16];

    /// Error page for `status`
    ///
    /// # Errors
    ///
    /// Returns `PageNotFound` when the status has no configured error page
    /// or the page does not exist.
    fn error_page(&self, site: &Site, status: u16) -> Result<Page> {
        let route_name = format!("{}{}", PAGE_INTERNAL_ERROR_PREFIX, status);
        if !self.http_error_codes().contains(&status) {
            return Err(CmsError::page_not_found(format!(
                "no error page configured for status {}",
                status
            )));
        }
        self.get_page_by_route_name(site, &route_name)
    }
}

/// Pick the manager for a request: live for editors, published otherwise
pub fn select_content_manager<'a>(
    editor_mode: bool,
    live: &'a dyn ContentManager,
    published: &'a dyn ContentManager,
) -> &'a dyn ContentManager {
    if editor_mode {
        live
    } else {
        published
    }
}

/// Container search shared by both managers
pub(crate) fn find_existing_container(
    blocks: &[Block],
    code: &str,
    parent: Option<&Block>,
) -> Option<Block> {
    blocks
        .iter()
        .filter(|b| b.container_code() == Some(code))
        .find(|b| match parent {
            Some(parent) => b.parent_id.as_deref() == Some(parent.id.as_str()),
            None => true,
        })
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manager_kind_tokens() {
        assert_eq!(ManagerKind::Live.as_str(), "page");
        assert_eq!(ManagerKind::parse("snapshot"), Some(ManagerKind::Published));
        assert_eq!(ManagerKind::parse("other"), None);
    }
}
