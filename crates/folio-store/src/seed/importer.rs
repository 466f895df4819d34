//! Seed importer orchestration
//!
//! Each site's page tree gets its URLs fixed and is validated before
//! anything is written; the whole seed then persists in one transaction.

#![allow(clippy::result_large_err)]

use std::path::Path;

use folio_core::errors::ExError;
use folio_core::ops::url::fix_url;
use folio_core::rules::validation::validate_site_tree;
use rusqlite::Connection;

use crate::errors::{from_rusqlite, Result};
use crate::repo::SqliteRepo;
use crate::seed::format::SeedV1;
use crate::seed::parser::{parse_seed_file, parse_seed_str};

/// Counts of what a seed import wrote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub sites: usize,
    pub pages: usize,
    pub blocks: usize,
}

/// Import a seed file into the database
pub fn import_seed(path: &Path, conn: &mut Connection) -> Result<SeedReport> {
    let seed = parse_seed_file(path)?;
    import(&seed, conn)
}

/// Import a seed held in memory
pub fn import_seed_str(content: &str, conn: &mut Connection) -> Result<SeedReport> {
    let seed = parse_seed_str(content)?;
    import(&seed, conn)
}

fn import(seed: &SeedV1, conn: &mut Connection) -> Result<SeedReport> {
    let mut prepared = Vec::with_capacity(seed.sites.len());
    for seed_site in &seed.sites {
        let site = seed_site.to_site();
        let (mut pages, blocks) = seed_site.flatten();
        fix_url(&mut pages).map_err(|e| ExError::from(e).with_site_id(site.id.clone()))?;
        validate_site_tree(&pages).map_err(|e| ExError::from(e).with_site_id(site.id.clone()))?;
        prepared.push((site, pages, blocks));
    }

    let tx = conn.transaction().map_err(from_rusqlite)?;
    let mut report = SeedReport::default();
    {
        let repo = SqliteRepo::new(&tx);
        for (site, pages, blocks) in &prepared {
            repo.persist_site(site)?;
            for page in pages {
                repo.persist_page(page)?;
            }
            for block in blocks {
                repo.persist_block(block)?;
            }
            report.sites += 1;
            report.pages += pages.len();
            report.blocks += blocks.len();
        }
    }
    tx.commit().map_err(from_rusqlite)?;

    tracing::info!(
        sites = report.sites,
        pages = report.pages,
        blocks = report.blocks,
        "seed imported"
    );
    Ok(report)
}
