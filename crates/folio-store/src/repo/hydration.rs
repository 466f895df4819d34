//! Row to model conversion
//!
//! Column lists and row mappers are kept side by side so a `SELECT` built
//! from a `*_COLUMNS` constant always matches its mapper's indices.

use chrono::{DateTime, TimeZone, Utc};
use folio_core::model::{Block, Page, PageType, RequestMethods, Site, Snapshot};
use rusqlite::types::Type;
use rusqlite::Row;

pub const SITE_COLUMNS: &str = "id, name, host, relative_path, locale, enabled, is_default, \
     enabled_from, enabled_to, title, meta_description, meta_keywords, created_at, updated_at";

pub const PAGE_COLUMNS: &str = "id, site_id, parent_id, target_id, name, title, slug, url, \
     custom_url, route_name, page_alias, page_type, enabled, edited, request_method, decorate, \
     template_code, raw_headers, position, meta_description, meta_keywords, created_at, updated_at";

pub const BLOCK_COLUMNS: &str = "id, page_id, parent_id, name, block_type, settings, position, \
     enabled, created_at, updated_at";

pub const SNAPSHOT_COLUMNS: &str = "id, page_id, site_id, parent_id, url, route_name, \
     page_alias, page_type, name, position, decorate, enabled, content, \
     publication_date_start, publication_date_end, created_at";

pub fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

fn timestamp(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let ms: i64 = row.get(idx)?;
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, ms))
}

fn optional_timestamp(row: &Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let ms: Option<i64> = row.get(idx)?;
    ms.map(|ms| {
        Utc.timestamp_millis_opt(ms)
            .single()
            .ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, ms))
    })
    .transpose()
}

fn json<T: serde::de::DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn page_type(row: &Row, idx: usize) -> rusqlite::Result<PageType> {
    let raw: String = row.get(idx)?;
    PageType::parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unknown page type '{}'", raw).into(),
        )
    })
}

pub fn site_from_row(row: &Row) -> rusqlite::Result<Site> {
    Ok(Site {
        id: row.get(0)?,
        name: row.get(1)?,
        host: row.get(2)?,
        relative_path: row.get(3)?,
        locale: row.get(4)?,
        enabled: row.get(5)?,
        is_default: row.get(6)?,
        enabled_from: optional_timestamp(row, 7)?,
        enabled_to: optional_timestamp(row, 8)?,
        title: row.get(9)?,
        meta_description: row.get(10)?,
        meta_keywords: row.get(11)?,
        created_at: timestamp(row, 12)?,
        updated_at: timestamp(row, 13)?,
    })
}

pub fn page_from_row(row: &Row) -> rusqlite::Result<Page> {
    let request_method: String = row.get(14)?;
    Ok(Page {
        id: row.get(0)?,
        site_id: row.get(1)?,
        parent_id: row.get(2)?,
        target_id: row.get(3)?,
        name: row.get(4)?,
        title: row.get(5)?,
        slug: row.get(6)?,
        url: row.get(7)?,
        custom_url: row.get(8)?,
        route_name: row.get(9)?,
        page_alias: row.get(10)?,
        page_type: page_type(row, 11)?,
        enabled: row.get(12)?,
        edited: row.get(13)?,
        request_method: RequestMethods::parse(&request_method),
        decorate: row.get(15)?,
        template_code: row.get(16)?,
        raw_headers: json(row, 17)?,
        position: row.get(18)?,
        meta_description: row.get(19)?,
        meta_keywords: row.get(20)?,
        created_at: timestamp(row, 21)?,
        updated_at: timestamp(row, 22)?,
    })
}

pub fn block_from_row(row: &Row) -> rusqlite::Result<Block> {
    Ok(Block {
        id: row.get(0)?,
        page_id: row.get(1)?,
        parent_id: row.get(2)?,
        name: row.get(3)?,
        block_type: row.get(4)?,
        settings: json(row, 5)?,
        position: row.get(6)?,
        enabled: row.get(7)?,
        created_at: timestamp(row, 8)?,
        updated_at: timestamp(row, 9)?,
    })
}

pub fn snapshot_from_row(row: &Row) -> rusqlite::Result<Snapshot> {
    Ok(Snapshot {
        id: row.get(0)?,
        page_id: row.get(1)?,
        site_id: row.get(2)?,
        parent_id: row.get(3)?,
        url: row.get(4)?,
        route_name: row.get(5)?,
        page_alias: row.get(6)?,
        page_type: page_type(row, 7)?,
        name: row.get(8)?,
        position: row.get(9)?,
        decorate: row.get(10)?,
        enabled: row.get(11)?,
        content: json(row, 12)?,
        publication_date_start: optional_timestamp(row, 13)?,
        publication_date_end: optional_timestamp(row, 14)?,
        created_at: timestamp(row, 15)?,
    })
}
