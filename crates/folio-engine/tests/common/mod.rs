#![allow(dead_code)]

use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};
use folio_core::cache::{CacheAdapter, CacheKeys};
use folio_core::errors::CmsError;
use folio_store::migrations::apply_migrations;
use folio_store::seed::import_seed_str;
use rusqlite::Connection;

/// Two sites on one host: `/` and `/shop`
pub const SEED: &str = r#"
schema_version: 1
sites:
  - id: site-main
    name: Main
    host: example.com
    relative_path: /
    locale: en
    is_default: true
    title: Example
    meta_description: The main site
    pages:
      - id: page-home
        name: Home
        route_name: homepage
        title: Welcome
        blocks:
          - id: block-content
            type: folio.page.block.container
            settings: { code: content }
            children:
              - id: block-welcome
                type: folio.block.text
                settings: { content: "Welcome" }
        children:
          - id: page-about
            name: About
            route_name: about
            slug: about
          - id: page-old-about
            name: Old about
            route_name: old_about
            slug: about-us
            target_id: page-about
          - id: page-404
            name: Not found
            route_name: _page_internal_error_404
            slug: not-found
            page_type: error
  - id: site-shop
    name: Shop
    host: example.com
    relative_path: /shop
    locale: en
    pages:
      - id: shop-home
        name: Shop
        route_name: homepage
        children:
          - id: shop-cart
            name: Cart
            route_name: cart
            slug: cart
            request_method: GET|POST
"#;

pub fn t(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, day, 9, 0, 0).unwrap()
}

pub fn setup() -> Connection {
    let mut conn = folio_store::db::open_in_memory().unwrap();
    apply_migrations(&mut conn).unwrap();
    import_seed_str(SEED, &mut conn).unwrap();
    conn
}

pub fn count(conn: &Connection, sql: &str) -> i64 {
    conn.query_row(sql, [], |row| row.get(0)).unwrap()
}

/// Contextual cache that records every flush
#[derive(Default)]
pub struct RecordingCache {
    pub fail: bool,
    pub flushed: Mutex<Vec<CacheKeys>>,
}

impl CacheAdapter for RecordingCache {
    fn name(&self) -> &str {
        "recording"
    }

    fn is_contextual(&self) -> bool {
        true
    }

    fn flush(&self, keys: &CacheKeys) -> folio_core::Result<()> {
        self.flushed.lock().unwrap().push(keys.clone());
        if self.fail {
            return Err(CmsError::Internal {
                message: "backend down".to_string(),
            });
        }
        Ok(())
    }

    fn flush_all(&self) -> folio_core::Result<()> {
        Ok(())
    }
}
