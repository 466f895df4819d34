//! Snapshot queries

#![allow(clippy::result_large_err)]

use chrono::{DateTime, Utc};
use folio_core::model::Snapshot;
use folio_core::ops::SnapshotLookup;
use rusqlite::{Connection, OptionalExtension};

use crate::errors::{from_rusqlite, Result};
use crate::repo::hydration::{snapshot_from_row, to_millis, SNAPSHOT_COLUMNS};

pub fn get_snapshot(conn: &Connection, id: &str) -> Result<Option<Snapshot>> {
    conn.query_row(
        &format!("SELECT {} FROM snapshots WHERE id = ?1", SNAPSHOT_COLUMNS),
        [id],
        snapshot_from_row,
    )
    .optional()
    .map_err(from_rusqlite)
}

/// Every snapshot of a page, most recently activated first
///
/// Never-activated snapshots (NULL start) sort last.
pub fn snapshots_for_page(conn: &Connection, page_id: &str) -> Result<Vec<Snapshot>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {} FROM snapshots WHERE page_id = ?1
             ORDER BY publication_date_start DESC, id DESC",
            SNAPSHOT_COLUMNS
        ))
        .map_err(from_rusqlite)?;
    let snapshots = stmt
        .query_map([page_id], snapshot_from_row)
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;
    Ok(snapshots)
}

/// The open snapshot of a page, if any
pub fn active_snapshot(conn: &Connection, page_id: &str) -> Result<Option<Snapshot>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM snapshots
             WHERE page_id = ?1
               AND publication_date_start IS NOT NULL
               AND publication_date_end IS NULL
             ORDER BY publication_date_start DESC
             LIMIT 1",
            SNAPSHOT_COLUMNS
        ),
        [page_id],
        snapshot_from_row,
    )
    .optional()
    .map_err(from_rusqlite)
}

/// Enabled snapshot of a site matching `lookup` whose window contains `at`
pub fn published_snapshot(
    conn: &Connection,
    site_id: &str,
    lookup: &SnapshotLookup,
    at: DateTime<Utc>,
) -> Result<Option<Snapshot>> {
    let (column, value) = match lookup {
        SnapshotLookup::Url(v) => ("url", v),
        SnapshotLookup::RouteName(v) => ("route_name", v),
        SnapshotLookup::Alias(v) => ("page_alias", v),
        SnapshotLookup::PageId(v) => ("page_id", v),
    };
    conn.query_row(
        &format!(
            "SELECT {} FROM snapshots
             WHERE site_id = ?1
               AND {} = ?2
               AND enabled = 1
               AND publication_date_start <= ?3
               AND (publication_date_end IS NULL OR publication_date_end > ?3)
             ORDER BY publication_date_start DESC
             LIMIT 1",
            SNAPSHOT_COLUMNS, column
        ),
        rusqlite::params![site_id, value, to_millis(at)],
        snapshot_from_row,
    )
    .optional()
    .map_err(from_rusqlite)
}

/// Ids of pages of a site that have at least one snapshot
pub fn page_ids_with_snapshots(conn: &Connection, site_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT DISTINCT page_id FROM snapshots WHERE site_id = ?1 ORDER BY page_id")
        .map_err(from_rusqlite)?;
    let ids = stmt
        .query_map([site_id], |row| row.get(0))
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<String>, _>>()
        .map_err(from_rusqlite)?;
    Ok(ids)
}
