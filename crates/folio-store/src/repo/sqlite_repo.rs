//! SQLite repository for sites, pages and blocks
//!
//! Works on any `&Connection`, including a `&Transaction` (which derefs to
//! one), so callers decide the transaction boundary.

#![allow(clippy::result_large_err)]

use chrono::{DateTime, Utc};
use folio_core::errors::CmsError;
use folio_core::model::{Block, Page, Site, Snapshot};
use folio_core::ops::{PageRepository, SiteRepository, SnapshotLookup, SnapshotRepository};
use rusqlite::{Connection, OptionalExtension};

use super::hydration::{
    block_from_row, page_from_row, site_from_row, to_millis, BLOCK_COLUMNS, PAGE_COLUMNS,
    SITE_COLUMNS,
};
use crate::errors::{from_rusqlite, serialization_error, Result};
use crate::snapshot::query;

pub struct SqliteRepo<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteRepo<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &'c Connection {
        self.conn
    }

    /// Insert or update a site
    pub fn persist_site(&self, site: &Site) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO sites (id, name, host, relative_path, locale, enabled, is_default,
                    enabled_from, enabled_to, title, meta_description, meta_keywords,
                    created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                 ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    host = excluded.host,
                    relative_path = excluded.relative_path,
                    locale = excluded.locale,
                    enabled = excluded.enabled,
                    is_default = excluded.is_default,
                    enabled_from = excluded.enabled_from,
                    enabled_to = excluded.enabled_to,
                    title = excluded.title,
                    meta_description = excluded.meta_description,
                    meta_keywords = excluded.meta_keywords,
                    updated_at = excluded.updated_at",
                rusqlite::params![
                    site.id,
                    site.name,
                    site.host,
                    site.relative_path,
                    site.locale,
                    site.enabled,
                    site.is_default,
                    site.enabled_from.map(to_millis),
                    site.enabled_to.map(to_millis),
                    site.title,
                    site.meta_description,
                    site.meta_keywords,
                    to_millis(site.created_at),
                    to_millis(site.updated_at),
                ],
            )
            .map_err(from_rusqlite)?;
        Ok(())
    }

    /// Insert or update a page
    pub fn persist_page(&self, page: &Page) -> Result<()> {
        let raw_headers = serde_json::to_string(&page.raw_headers)
            .map_err(|e| serialization_error("persist_page", e))?;
        let request_method: String = page.request_method.into();

        self.conn
            .execute(
                "INSERT INTO pages (id, site_id, parent_id, target_id, name, title, slug, url,
                    custom_url, route_name, page_alias, page_type, enabled, edited,
                    request_method, decorate, template_code, raw_headers, position,
                    meta_description, meta_keywords, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                    ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23)
                 ON CONFLICT(id) DO UPDATE SET
                    site_id = excluded.site_id,
                    parent_id = excluded.parent_id,
                    target_id = excluded.target_id,
                    name = excluded.name,
                    title = excluded.title,
                    slug = excluded.slug,
                    url = excluded.url,
                    custom_url = excluded.custom_url,
                    route_name = excluded.route_name,
                    page_alias = excluded.page_alias,
                    page_type = excluded.page_type,
                    enabled = excluded.enabled,
                    edited = excluded.edited,
                    request_method = excluded.request_method,
                    decorate = excluded.decorate,
                    template_code = excluded.template_code,
                    raw_headers = excluded.raw_headers,
                    position = excluded.position,
                    meta_description = excluded.meta_description,
                    meta_keywords = excluded.meta_keywords,
                    updated_at = excluded.updated_at",
                rusqlite::params![
                    page.id,
                    page.site_id,
                    page.parent_id,
                    page.target_id,
                    page.name,
                    page.title,
                    page.slug,
                    page.url,
                    page.custom_url,
                    page.route_name,
                    page.page_alias,
                    page.page_type.as_str(),
                    page.enabled,
                    page.edited,
                    request_method,
                    page.decorate,
                    page.template_code,
                    raw_headers,
                    page.position,
                    page.meta_description,
                    page.meta_keywords,
                    to_millis(page.created_at),
                    to_millis(page.updated_at),
                ],
            )
            .map_err(from_rusqlite)?;
        Ok(())
    }

    /// Insert or update a block
    pub fn persist_block(&self, block: &Block) -> Result<()> {
        let settings = serde_json::to_string(&block.settings)
            .map_err(|e| serialization_error("persist_block", e))?;

        self.conn
            .execute(
                "INSERT INTO blocks (id, page_id, parent_id, name, block_type, settings,
                    position, enabled, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(id) DO UPDATE SET
                    page_id = excluded.page_id,
                    parent_id = excluded.parent_id,
                    name = excluded.name,
                    block_type = excluded.block_type,
                    settings = excluded.settings,
                    position = excluded.position,
                    enabled = excluded.enabled,
                    updated_at = excluded.updated_at",
                rusqlite::params![
                    block.id,
                    block.page_id,
                    block.parent_id,
                    block.name,
                    block.block_type,
                    settings,
                    block.position,
                    block.enabled,
                    to_millis(block.created_at),
                    to_millis(block.updated_at),
                ],
            )
            .map_err(from_rusqlite)?;
        Ok(())
    }

    /// Delete a block and its nested children; returns whether it existed
    pub fn delete_block(&self, block_id: &str) -> Result<bool> {
        let deleted = self
            .conn
            .execute(
                "WITH RECURSIVE tree(id) AS (
                    SELECT id FROM blocks WHERE id = ?1
                    UNION ALL
                    SELECT b.id FROM blocks b JOIN tree t ON b.parent_id = t.id
                 )
                 DELETE FROM blocks WHERE id IN (SELECT id FROM tree)",
                [block_id],
            )
            .map_err(from_rusqlite)?;
        Ok(deleted > 0)
    }

    /// Set or clear the page's dirty bit
    pub fn set_edited(&self, page_id: &str, edited: bool, at: DateTime<Utc>) -> Result<()> {
        self.conn
            .execute(
                "UPDATE pages SET edited = ?1, updated_at = ?2 WHERE id = ?3",
                rusqlite::params![edited, to_millis(at), page_id],
            )
            .map_err(from_rusqlite)?;
        Ok(())
    }

    pub fn get_site(&self, id: &str) -> Result<Option<Site>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM sites WHERE id = ?1", SITE_COLUMNS),
                [id],
                site_from_row,
            )
            .optional()
            .map_err(from_rusqlite)
    }

    pub fn list_sites(&self) -> Result<Vec<Site>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM sites ORDER BY id", SITE_COLUMNS))
            .map_err(from_rusqlite)?;
        let sites = stmt
            .query_map([], site_from_row)
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        Ok(sites)
    }

    pub fn get_page(&self, id: &str) -> Result<Option<Page>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM pages WHERE id = ?1", PAGE_COLUMNS),
                [id],
                page_from_row,
            )
            .optional()
            .map_err(from_rusqlite)
    }

    pub fn get_block(&self, id: &str) -> Result<Option<Block>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM blocks WHERE id = ?1", BLOCK_COLUMNS),
                [id],
                block_from_row,
            )
            .optional()
            .map_err(from_rusqlite)
    }

    fn page_where(&self, clause: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Option<Page>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM pages WHERE {} ORDER BY position, id LIMIT 1",
                    PAGE_COLUMNS, clause
                ),
                params,
                page_from_row,
            )
            .optional()
            .map_err(from_rusqlite)
    }

    pub fn list_pages(&self, site_id: &str) -> Result<Vec<Page>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM pages WHERE site_id = ?1 ORDER BY position, id",
                PAGE_COLUMNS
            ))
            .map_err(from_rusqlite)?;
        let pages = stmt
            .query_map([site_id], page_from_row)
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        Ok(pages)
    }

    pub fn list_blocks(&self, page_id: &str) -> Result<Vec<Block>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM blocks WHERE page_id = ?1 ORDER BY position, id",
                BLOCK_COLUMNS
            ))
            .map_err(from_rusqlite)?;
        let blocks = stmt
            .query_map([page_id], block_from_row)
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        Ok(blocks)
    }
}

impl SiteRepository for SqliteRepo<'_> {
    fn sites_for_hosts(&self, hosts: &[&str]) -> folio_core::Result<Vec<Site>> {
        if hosts.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; hosts.len()].join(", ");
        let sql = format!(
            "SELECT {} FROM sites WHERE enabled = 1 AND host IN ({})
             ORDER BY is_default DESC, id",
            SITE_COLUMNS, placeholders
        );
        let mut stmt = self.conn.prepare(&sql).map_err(from_rusqlite)?;
        let sites = stmt
            .query_map(rusqlite::params_from_iter(hosts.iter()), site_from_row)
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        Ok(sites)
    }

    fn site(&self, id: &str) -> folio_core::Result<Option<Site>> {
        Ok(self.get_site(id)?)
    }
}

impl PageRepository for SqliteRepo<'_> {
    fn page(&self, id: &str) -> folio_core::Result<Option<Page>> {
        Ok(self.get_page(id)?)
    }

    fn page_by_url(&self, site_id: &str, url: &str) -> folio_core::Result<Option<Page>> {
        Ok(self.page_where("site_id = ?1 AND url = ?2", &[&site_id, &url])?)
    }

    fn page_by_route_name(
        &self,
        site_id: &str,
        route_name: &str,
    ) -> folio_core::Result<Option<Page>> {
        Ok(self.page_where("site_id = ?1 AND route_name = ?2", &[&site_id, &route_name])?)
    }

    fn page_by_alias(&self, site_id: &str, alias: &str) -> folio_core::Result<Option<Page>> {
        Ok(self.page_where("site_id = ?1 AND page_alias = ?2", &[&site_id, &alias])?)
    }

    fn pages_for_site(&self, site_id: &str) -> folio_core::Result<Vec<Page>> {
        Ok(self.list_pages(site_id)?)
    }

    fn blocks_for_page(&self, page_id: &str) -> folio_core::Result<Vec<Block>> {
        Ok(self.list_blocks(page_id)?)
    }
}

impl SnapshotRepository for SqliteRepo<'_> {
    fn published_snapshot(
        &self,
        site_id: &str,
        lookup: &SnapshotLookup,
        at: DateTime<Utc>,
    ) -> folio_core::Result<Option<Snapshot>> {
        query::published_snapshot(self.conn, site_id, lookup, at).map_err(CmsError::from)
    }

    fn snapshots_for_page(&self, page_id: &str) -> folio_core::Result<Vec<Snapshot>> {
        query::snapshots_for_page(self.conn, page_id).map_err(CmsError::from)
    }
}
