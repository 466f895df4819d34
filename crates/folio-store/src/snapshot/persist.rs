//! Snapshot ledger writes
//!
//! None of these functions open a transaction; the publication service
//! wraps them in one so insert, activation and the page's dirty-bit reset
//! commit together.

#![allow(clippy::result_large_err)]

use chrono::{DateTime, Utc};
use folio_core::errors::{ExError, ExErrorKind};
use folio_core::model::Snapshot;
use folio_core::snapshot::{check_activation, select_for_deletion};
use rusqlite::Connection;

use super::query;
use crate::errors::{from_rusqlite, serialization_error, Result};
use crate::repo::hydration::to_millis;

/// Insert a compiled snapshot
pub fn insert_snapshot(conn: &Connection, snapshot: &Snapshot) -> Result<()> {
    let content = folio_core::snapshot::compile::encode_content(&snapshot.content)
        .map_err(|e| serialization_error("insert_snapshot", e))?;

    conn.execute(
        "INSERT INTO snapshots (id, page_id, site_id, parent_id, url, route_name, page_alias,
            page_type, name, position, decorate, enabled, content,
            publication_date_start, publication_date_end, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        rusqlite::params![
            snapshot.id,
            snapshot.page_id,
            snapshot.site_id,
            snapshot.parent_id,
            snapshot.url,
            snapshot.route_name,
            snapshot.page_alias,
            snapshot.page_type.as_str(),
            snapshot.name,
            snapshot.position,
            snapshot.decorate,
            snapshot.enabled,
            content,
            snapshot.publication_date_start.map(to_millis),
            snapshot.publication_date_end.map(to_millis),
            to_millis(snapshot.created_at),
        ],
    )
    .map_err(from_rusqlite)?;

    tracing::debug!(
        snapshot_id = %snapshot.id,
        page_id = %snapshot.page_id,
        "inserted snapshot"
    );
    Ok(())
}

/// Activate snapshots in order at `at`
///
/// For each snapshot, every other open window of the same page is closed at
/// `at` and the snapshot's window opens at `at`. Activating an already open
/// snapshot changes nothing.
///
/// # Errors
///
/// Returns `NotFound` for an unknown snapshot id and `WindowConflict` when
/// `at` precedes the page's current window boundary. Earlier snapshots in
/// the list may already have been activated; callers roll back.
pub fn enable_snapshots(
    conn: &Connection,
    snapshot_ids: &[String],
    at: DateTime<Utc>,
) -> Result<()> {
    for id in snapshot_ids {
        let snapshot = query::get_snapshot(conn, id)?.ok_or_else(|| {
            ExError::new(ExErrorKind::NotFound)
                .with_op("enable_snapshots")
                .with_entity_id(id.clone())
                .with_message("snapshot not found")
        })?;
        if snapshot.is_active() {
            continue;
        }

        let history = query::snapshots_for_page(conn, &snapshot.page_id)?;
        check_activation(&snapshot.page_id, &history, at).map_err(ExError::from)?;

        let at_ms = to_millis(at);
        conn.execute(
            "UPDATE snapshots SET publication_date_end = ?1
             WHERE page_id = ?2
               AND id != ?3
               AND publication_date_start IS NOT NULL
               AND publication_date_end IS NULL",
            rusqlite::params![at_ms, snapshot.page_id, snapshot.id],
        )
        .map_err(from_rusqlite)?;
        conn.execute(
            "UPDATE snapshots SET publication_date_start = ?1, publication_date_end = NULL
             WHERE id = ?2",
            rusqlite::params![at_ms, snapshot.id],
        )
        .map_err(from_rusqlite)?;

        tracing::debug!(
            snapshot_id = %snapshot.id,
            page_id = %snapshot.page_id,
            "activated snapshot"
        );
    }
    Ok(())
}

/// Delete a page's snapshots beyond the `keep` most recently activated
///
/// The open snapshot is never deleted. Returns the number removed.
pub fn cleanup_page(conn: &Connection, page_id: &str, keep: usize) -> Result<usize> {
    let history = query::snapshots_for_page(conn, page_id)?;
    let doomed = select_for_deletion(&history, keep);
    for id in &doomed {
        conn.execute("DELETE FROM snapshots WHERE id = ?1", [id])
            .map_err(from_rusqlite)?;
    }
    Ok(doomed.len())
}

/// Run `cleanup_page` for every page of a site that has snapshots
pub fn cleanup_site(conn: &Connection, site_id: &str, keep: usize) -> Result<usize> {
    let mut deleted = 0;
    for page_id in query::page_ids_with_snapshots(conn, site_id)? {
        deleted += cleanup_page(conn, &page_id, keep)?;
    }
    Ok(deleted)
}
