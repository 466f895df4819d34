//! Fragment endpoint
//!
//! Serves one block of a page for ESI/SSI/JS includes. The token is checked
//! before anything is read, so a forged request costs no storage access.

#![allow(clippy::result_large_err)]

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use folio_core::cache::{verify_token, FragmentKeys};
use folio_core::content::{ContentManager, ManagerKind};
use folio_core::errors::{CmsError, ExError};
use folio_core::model::{Block, Site};
use folio_core::ops::{PageRepository, SnapshotRepository};
use folio_core::{LiveContentManager, PublishedContentManager};
use folio_store::errors::Result;

use crate::config::CmsConfig;

#[derive(Debug, Clone)]
pub struct FragmentResponse {
    pub keys: FragmentKeys,
    pub block: Block,
}

/// Resolve a fragment request to its block
///
/// `manager` selects the live (`page`) or published (`snapshot`) read path.
///
/// # Errors
///
/// Returns `InvalidParameter` for missing parameters or an unknown manager,
/// `InvalidToken` on a token mismatch, `PageNotFound` or `BlockNotFound`
/// when the target is gone.
pub fn handle_fragment<R>(
    repo: &R,
    config: &CmsConfig,
    site: &Site,
    params: &BTreeMap<String, String>,
    at: DateTime<Utc>,
) -> Result<FragmentResponse>
where
    R: PageRepository + SnapshotRepository,
{
    let (keys, token) = FragmentKeys::from_params(params)?;
    verify_token(config.fragment_secret.expose(), &keys, &token).map_err(|e| {
        tracing::warn!(
            component = module_path!(),
            page_id = %keys.page_id,
            block_id = %keys.block_id,
            "fragment token mismatch"
        );
        ExError::from(e)
    })?;

    let kind = ManagerKind::parse(&keys.manager).ok_or_else(|| CmsError::InvalidParameter {
        name: "manager".to_string(),
        reason: format!("unknown manager '{}'", keys.manager),
    })?;

    let block = match kind {
        ManagerKind::Live => find_block(&LiveContentManager::new(repo), site, &keys)?,
        ManagerKind::Published => {
            find_block(&PublishedContentManager::new(repo, at), site, &keys)?
        }
    };

    Ok(FragmentResponse { keys, block })
}

fn find_block(cms: &dyn ContentManager, site: &Site, keys: &FragmentKeys) -> Result<Block> {
    let page = cms.get_page_by_id(site, &keys.page_id)?;
    cms.blocks(&page)?
        .into_iter()
        .find(|b| b.id == keys.block_id)
        .ok_or_else(|| {
            ExError::from(CmsError::BlockNotFound {
                block_id: keys.block_id.clone(),
            })
        })
}
