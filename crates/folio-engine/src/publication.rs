//! Snapshot publication orchestration
//!
//! ## Pipeline for one page (one transaction):
//! 1. Load the draft page and its blocks
//! 2. Compile and insert a new snapshot
//! 3. Publication hook (may veto; everything rolls back)
//! 4. Activate the snapshot, closing the page's previous window
//! 5. Clear the page's `edited` bit
//!
//! Contextual caches are flushed only after commit.

#![allow(clippy::result_large_err)]

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use folio_core::cache::{CacheKeys, InvalidationService};
use folio_core::errors::{ExError, ExErrorKind};
use folio_core::model::Snapshot;
use folio_core::snapshot::compile_page;
use folio_store::errors::{from_rusqlite, Result};
use folio_store::snapshot;
use folio_store::SqliteRepo;
use rusqlite::Connection;

/// Observes a compiled snapshot between insert and activation
pub trait PublicationHook: Send + Sync {
    /// # Errors
    ///
    /// Any error vetoes the publication and rolls the transaction back.
    fn before_activation(&self, snapshot: &Snapshot) -> Result<()>;
}

/// Always allows
pub struct NoopPublicationHook;

impl PublicationHook for NoopPublicationHook {
    fn before_activation(&self, _: &Snapshot) -> Result<()> {
        Ok(())
    }
}

/// Transaction scope of a site-wide publication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BulkMode {
    /// All pages in one transaction; the first failure rolls everything back
    #[default]
    Atomic,
    /// One transaction per page; failures are reported and skipped
    BestEffort,
}

/// Outcome of `create_by_site`
#[derive(Debug, Clone, Default)]
pub struct SitePublicationReport {
    pub published: Vec<Snapshot>,
    /// `(page_id, error)` for pages that failed in best-effort mode
    pub failures: Vec<(String, ExError)>,
}

pub struct PublicationService {
    hook: Arc<dyn PublicationHook>,
    invalidation: Option<Arc<InvalidationService>>,
}

impl Default for PublicationService {
    fn default() -> Self {
        Self::new()
    }
}

impl PublicationService {
    pub fn new() -> Self {
        Self {
            hook: Arc::new(NoopPublicationHook),
            invalidation: None,
        }
    }

    pub fn with_hook(mut self, hook: Arc<dyn PublicationHook>) -> Self {
        self.hook = hook;
        self
    }

    pub fn with_invalidation(mut self, invalidation: Arc<InvalidationService>) -> Self {
        self.invalidation = Some(invalidation);
        self
    }

    /// Compile and activate a new snapshot of one page
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown page, the hook's error on veto,
    /// `WindowConflict` when `at` precedes the page's current window, and
    /// `CacheFlushFailure` after commit when the flush policy raises.
    pub fn create_by_page(
        &self,
        conn: &mut Connection,
        page_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Snapshot> {
        let start = Instant::now();
        folio_core::log_op_start!("create_by_page", page_id = page_id);

        let result = self.create_by_page_inner(conn, page_id, at);
        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(snap) => folio_core::log_op_end!(
                "create_by_page",
                duration_ms = duration_ms,
                page_id = page_id,
                snapshot_id = snap.id.as_str()
            ),
            Err(e) => folio_core::log_op_error!(
                "create_by_page",
                e.clone(),
                duration_ms = duration_ms,
                page_id = page_id
            ),
        }
        result
    }

    fn create_by_page_inner(
        &self,
        conn: &mut Connection,
        page_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Snapshot> {
        let tx = conn.transaction().map_err(from_rusqlite)?;
        let snap = self.publish_page(&tx, page_id, at)?;
        tx.commit().map_err(from_rusqlite)?;

        self.invalidate_pages(std::slice::from_ref(&snap))?;
        Ok(snap)
    }

    /// Steps 1-5 of the pipeline on an open transaction
    fn publish_page(
        &self,
        conn: &Connection,
        page_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Snapshot> {
        let repo = SqliteRepo::new(conn);
        let page = repo.get_page(page_id)?.ok_or_else(|| page_not_found(page_id))?;
        let blocks = repo.list_blocks(page_id)?;

        let compiled = compile_page(&page, &blocks, at);
        snapshot::insert_snapshot(conn, &compiled)?;

        self.hook
            .before_activation(&compiled)
            .map_err(|e| e.with_page_id(page_id))?;

        snapshot::enable_snapshots(conn, std::slice::from_ref(&compiled.id), at)
            .map_err(|e| e.with_page_id(page_id))?;
        repo.set_edited(page_id, false, at)?;

        Ok(snapshot::query::get_snapshot(conn, &compiled.id)?.unwrap_or(compiled))
    }

    /// Activate existing snapshots in order, in one transaction
    ///
    /// Concurrent activations of one page are ordered by their `at`, not by
    /// commit order. A caller whose `at` lies before a window another
    /// transaction already opened gets `WindowConflict` and changes nothing;
    /// it never overwrites the newer window. Retry with a fresh instant to
    /// take over.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `WindowConflict`; nothing is changed then.
    pub fn enable_snapshots(
        &self,
        conn: &mut Connection,
        snapshot_ids: &[String],
        at: DateTime<Utc>,
    ) -> Result<()> {
        let tx = conn.transaction().map_err(from_rusqlite)?;
        snapshot::enable_snapshots(&tx, snapshot_ids, at)?;
        tx.commit().map_err(from_rusqlite)?;
        Ok(())
    }

    /// Publish every page of a site
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown site. In `Atomic` mode the first
    /// page failure is returned and nothing is published.
    pub fn create_by_site(
        &self,
        conn: &mut Connection,
        site_id: &str,
        at: DateTime<Utc>,
        mode: BulkMode,
    ) -> Result<SitePublicationReport> {
        let start = Instant::now();
        folio_core::log_op_start!("create_by_site", site_id = site_id);

        let result = self.create_by_site_inner(conn, site_id, at, mode);
        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(report) => folio_core::log_op_end!(
                "create_by_site",
                duration_ms = duration_ms,
                site_id = site_id,
                published = report.published.len(),
                failed = report.failures.len()
            ),
            Err(e) => folio_core::log_op_error!(
                "create_by_site",
                e.clone(),
                duration_ms = duration_ms,
                site_id = site_id
            ),
        }
        result
    }

    fn create_by_site_inner(
        &self,
        conn: &mut Connection,
        site_id: &str,
        at: DateTime<Utc>,
        mode: BulkMode,
    ) -> Result<SitePublicationReport> {
        let page_ids = {
            let repo = SqliteRepo::new(conn);
            if repo.get_site(site_id)?.is_none() {
                return Err(ExError::new(ExErrorKind::NotFound)
                    .with_op("create_by_site")
                    .with_site_id(site_id)
                    .with_message("site not found"));
            }
            repo.list_pages(site_id)?
                .into_iter()
                .map(|p| p.id)
                .collect::<Vec<_>>()
        };

        let mut report = SitePublicationReport::default();
        match mode {
            BulkMode::Atomic => {
                let tx = conn.transaction().map_err(from_rusqlite)?;
                for page_id in &page_ids {
                    report.published.push(self.publish_page(&tx, page_id, at)?);
                }
                tx.commit().map_err(from_rusqlite)?;
            }
            BulkMode::BestEffort => {
                for page_id in &page_ids {
                    let tx = conn.transaction().map_err(from_rusqlite)?;
                    match self.publish_page(&tx, page_id, at) {
                        Ok(snap) => {
                            tx.commit().map_err(from_rusqlite)?;
                            report.published.push(snap);
                        }
                        Err(e) => {
                            tracing::warn!(
                                component = module_path!(),
                                page_id = %page_id,
                                error = %e,
                                "page publication failed; continuing"
                            );
                            report.failures.push((page_id.clone(), e));
                        }
                    }
                }
            }
        }

        self.invalidate_pages(&report.published)?;
        Ok(report)
    }

    /// Retention cleanup for one page; returns the number deleted
    ///
    /// # Errors
    ///
    /// Returns a persistence error; nothing is deleted then.
    pub fn cleanup_by_page(
        &self,
        conn: &mut Connection,
        page_id: &str,
        keep: usize,
    ) -> Result<usize> {
        let start = Instant::now();
        folio_core::log_op_start!("cleanup_by_page", page_id = page_id, keep = keep);

        let result = cleanup_in_tx(conn, |tx| snapshot::cleanup_page(tx, page_id, keep));

        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(deleted) => folio_core::log_op_end!(
                "cleanup_by_page",
                duration_ms = duration_ms,
                deleted = *deleted
            ),
            Err(e) => {
                folio_core::log_op_error!("cleanup_by_page", e.clone(), duration_ms = duration_ms)
            }
        }
        result
    }

    /// Retention cleanup for every page of a site
    ///
    /// # Errors
    ///
    /// Returns a persistence error; nothing is deleted then.
    pub fn cleanup_by_site(
        &self,
        conn: &mut Connection,
        site_id: &str,
        keep: usize,
    ) -> Result<usize> {
        let start = Instant::now();
        folio_core::log_op_start!("cleanup_by_site", site_id = site_id, keep = keep);

        let result = cleanup_in_tx(conn, |tx| snapshot::cleanup_site(tx, site_id, keep));

        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(deleted) => folio_core::log_op_end!(
                "cleanup_by_site",
                duration_ms = duration_ms,
                deleted = *deleted
            ),
            Err(e) => {
                folio_core::log_op_error!("cleanup_by_site", e.clone(), duration_ms = duration_ms)
            }
        }
        result
    }

    fn invalidate_pages(&self, published: &[Snapshot]) -> Result<()> {
        let Some(invalidation) = &self.invalidation else {
            return Ok(());
        };
        if published.is_empty() {
            return Ok(());
        }
        let mut keys = CacheKeys::new();
        for snap in published {
            keys.entry("page".to_string())
                .or_default()
                .insert(snap.page_id.clone());
        }
        invalidation.invalidate(&keys).map_err(ExError::from)
    }
}

fn cleanup_in_tx<F>(conn: &mut Connection, cleanup: F) -> Result<usize>
where
    F: FnOnce(&Connection) -> Result<usize>,
{
    let tx = conn.transaction().map_err(from_rusqlite)?;
    let deleted = cleanup(&*tx)?;
    tx.commit().map_err(from_rusqlite)?;
    Ok(deleted)
}

fn page_not_found(page_id: &str) -> ExError {
    ExError::new(ExErrorKind::NotFound)
        .with_op("create_by_page")
        .with_page_id(page_id)
        .with_message("page not found")
}
