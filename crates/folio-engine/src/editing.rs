//! Draft editing with cache invalidation
//!
//! Every mutation flushes contextual caches for the touched entity before
//! writing, then marks the owning page as edited so the next publication
//! picks it up.

#![allow(clippy::result_large_err)]

use std::sync::Arc;

use chrono::{DateTime, Utc};
use folio_core::cache::InvalidationService;
use folio_core::errors::{ExError, ExErrorKind};
use folio_core::model::{Block, Page};
use folio_core::ops::url::fix_url;
use folio_core::rules::validate_site_tree;
use folio_store::errors::{from_rusqlite, Result};
use folio_store::SqliteRepo;
use rusqlite::Connection;

pub struct EditingService {
    invalidation: Option<Arc<InvalidationService>>,
}

impl Default for EditingService {
    fn default() -> Self {
        Self::new()
    }
}

impl EditingService {
    pub fn new() -> Self {
        Self { invalidation: None }
    }

    pub fn with_invalidation(mut self, invalidation: Arc<InvalidationService>) -> Self {
        self.invalidation = Some(invalidation);
        self
    }

    /// Insert or update a draft page
    ///
    /// The site's URLs are recomputed with the change applied, so moving or
    /// renaming a page also rewrites its descendants' URLs. The stored page
    /// comes back with `edited` set. A page moved to another site must leave
    /// a valid tree behind, so a page that still has children cannot move.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown site, a tree violation
    /// (`ConstraintViolation`, `InvalidTree`, ...) when the change would
    /// break the site's page tree, or `CacheFlushFailure` under the raise
    /// policy, in which case nothing is written.
    pub fn save_page(
        &self,
        conn: &mut Connection,
        mut page: Page,
        at: DateTime<Utc>,
    ) -> Result<Page> {
        let repo = SqliteRepo::new(conn);
        if repo.get_site(&page.site_id)?.is_none() {
            return Err(ExError::new(ExErrorKind::NotFound)
                .with_op("save_page")
                .with_site_id(page.site_id.clone())
                .with_message("site not found"));
        }

        if let Some(stored) = repo.get_page(&page.id)? {
            if stored.site_id != page.site_id {
                let left_behind: Vec<Page> = repo
                    .list_pages(&stored.site_id)?
                    .into_iter()
                    .filter(|p| p.id != page.id)
                    .collect();
                validate_site_tree(&left_behind).map_err(|e| {
                    ExError::from(e)
                        .with_op("save_page")
                        .with_site_id(stored.site_id.clone())
                        .with_page_id(page.id.clone())
                })?;
            }
        }

        page.edited = true;
        page.updated_at = at;

        let before = repo.list_pages(&page.site_id)?;
        let mut pages: Vec<Page> = before.iter().filter(|p| p.id != page.id).cloned().collect();
        pages.push(page.clone());
        fix_url(&mut pages).map_err(|e| ExError::from(e).with_page_id(page.id.clone()))?;
        validate_site_tree(&pages).map_err(|e| ExError::from(e).with_page_id(page.id.clone()))?;

        self.pre_update(&page)?;

        let tx = conn.transaction().map_err(from_rusqlite)?;
        let mut saved = page.clone();
        {
            let repo = SqliteRepo::new(&tx);
            for fixed in &pages {
                if fixed.id == page.id {
                    saved.url = fixed.url.clone();
                    repo.persist_page(&saved)?;
                    continue;
                }
                let moved = before
                    .iter()
                    .find(|p| p.id == fixed.id)
                    .map(|p| p.url != fixed.url)
                    .unwrap_or(false);
                if moved {
                    self.pre_update(fixed)?;
                    repo.persist_page(fixed)?;
                }
            }
        }
        tx.commit().map_err(from_rusqlite)?;

        tracing::debug!(
            component = module_path!(),
            page_id = %saved.id,
            url = %saved.url,
            "page saved"
        );
        Ok(saved)
    }

    /// Insert or update a block and mark its page edited
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the page does not exist, or
    /// `CacheFlushFailure` under the raise policy.
    pub fn save_block(
        &self,
        conn: &mut Connection,
        mut block: Block,
        at: DateTime<Utc>,
    ) -> Result<Block> {
        if SqliteRepo::new(conn).get_page(&block.page_id)?.is_none() {
            return Err(ExError::new(ExErrorKind::NotFound)
                .with_op("save_block")
                .with_page_id(block.page_id.clone())
                .with_message("page not found"));
        }
        block.updated_at = at;

        self.pre_update(&block)?;

        let tx = conn.transaction().map_err(from_rusqlite)?;
        {
            let repo = SqliteRepo::new(&tx);
            repo.persist_block(&block)?;
            repo.set_edited(&block.page_id, true, at)?;
        }
        tx.commit().map_err(from_rusqlite)?;
        Ok(block)
    }

    /// Delete a block with its nested children and mark its page edited
    ///
    /// Returns the removed block.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown block, or `CacheFlushFailure`
    /// under the raise policy.
    pub fn remove_block(
        &self,
        conn: &mut Connection,
        block_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Block> {
        let block = SqliteRepo::new(conn).get_block(block_id)?.ok_or_else(|| {
            ExError::new(ExErrorKind::NotFound)
                .with_op("remove_block")
                .with_entity_id(block_id)
                .with_message("block not found")
        })?;

        if let Some(invalidation) = &self.invalidation {
            invalidation.on_pre_remove(&block)?;
        }

        let tx = conn.transaction().map_err(from_rusqlite)?;
        {
            let repo = SqliteRepo::new(&tx);
            repo.delete_block(block_id)?;
            repo.set_edited(&block.page_id, true, at)?;
        }
        tx.commit().map_err(from_rusqlite)?;
        Ok(block)
    }

    fn pre_update<T: std::any::Any>(&self, entity: &T) -> Result<()> {
        match &self.invalidation {
            Some(invalidation) => invalidation.on_pre_update(entity).map_err(ExError::from),
            None => Ok(()),
        }
    }
}
