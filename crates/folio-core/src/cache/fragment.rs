//! Fragment caching and signed fragment requests
//!
//! A page rendered with cached fragments embeds an include tag per block.
//! The include URL carries the block's keys plus a token so the fragment
//! endpoint can refuse forged requests before touching storage.

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::errors::{CmsError, Result};
use crate::model::Block;

use super::invalidation::CacheAdapter;
use super::recorder::CacheKeys;

/// Query parameter carrying the fragment token
pub const TOKEN_PARAM: &str = "_token";

/// Keys identifying one block fragment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentKeys {
    /// `page` for live reads, `snapshot` for published reads
    pub manager: String,
    pub page_id: String,
    pub block_id: String,
    /// Unix seconds of the block's last update
    pub updated_at: i64,
}

impl FragmentKeys {
    pub fn for_block(manager: &str, block: &Block) -> Self {
        Self {
            manager: manager.to_string(),
            page_id: block.page_id.clone(),
            block_id: block.id.clone(),
            updated_at: block.updated_at.timestamp(),
        }
    }

    /// Read keys and token from fragment request parameters
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for a missing or malformed parameter.
    pub fn from_params(params: &BTreeMap<String, String>) -> Result<(Self, String)> {
        let get = |name: &str| {
            params
                .get(name)
                .cloned()
                .ok_or_else(|| CmsError::InvalidParameter {
                    name: name.to_string(),
                    reason: "missing".to_string(),
                })
        };
        let updated_at = get("updated_at")?
            .parse::<i64>()
            .map_err(|e| CmsError::InvalidParameter {
                name: "updated_at".to_string(),
                reason: e.to_string(),
            })?;
        let keys = Self {
            manager: get("manager")?,
            page_id: get("page_id")?,
            block_id: get("block_id")?,
            updated_at,
        };
        Ok((keys, get(TOKEN_PARAM)?))
    }

    fn canonical_json(&self) -> Result<String> {
        // serde_json maps are sorted by key
        let value = serde_json::to_value(self)?;
        Ok(serde_json::to_string(&value)?)
    }

    fn query(&self, token: &str) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("block_id", &self.block_id)
            .append_pair("manager", &self.manager)
            .append_pair("page_id", &self.page_id)
            .append_pair("updated_at", &self.updated_at.to_string())
            .append_pair(TOKEN_PARAM, token)
            .finish()
    }
}

/// Hex SHA-256 over the secret followed by the canonical JSON of the keys
///
/// # Errors
///
/// Returns `Serialization` if the keys cannot be encoded.
pub fn compute_token(secret: &str, keys: &FragmentKeys) -> Result<String> {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(keys.canonical_json()?.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Constant-time token check
///
/// # Errors
///
/// Returns `InvalidToken` when the token does not match the keys.
pub fn verify_token(secret: &str, keys: &FragmentKeys, token: &str) -> Result<()> {
    let expected = compute_token(secret, keys)?;
    if bool::from(expected.as_bytes().ct_eq(token.as_bytes())) {
        Ok(())
    } else {
        Err(CmsError::InvalidToken)
    }
}

/// How a cached fragment is pulled into the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentMode {
    Esi,
    Ssi,
    Js,
}

impl FragmentMode {
    /// Include markup pointing at `endpoint` for the given block keys
    ///
    /// # Errors
    ///
    /// Returns `Serialization` if the token cannot be computed.
    pub fn render(&self, endpoint: &str, secret: &str, keys: &FragmentKeys) -> Result<String> {
        let token = compute_token(secret, keys)?;
        let src = format!("{}?{}", endpoint, keys.query(&token));
        Ok(match self {
            FragmentMode::Esi => format!("<esi:include src=\"{}\" />", src),
            FragmentMode::Ssi => format!("<!--# include virtual=\"{}\" -->", src),
            FragmentMode::Js => format!(
                "<div id=\"folio-block-{}\" data-folio-src=\"{}\"></div>",
                keys.block_id,
                src.replace('&', "&amp;")
            ),
        })
    }
}

/// In-memory contextual cache of rendered fragments
#[derive(Debug, Default)]
pub struct FragmentCache {
    entries: Mutex<BTreeMap<String, (CacheKeys, String)>>,
}

impl FragmentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store rendered content together with the keys it depends on
    ///
    /// # Errors
    ///
    /// Returns `CacheFlushFailure` when the cache lock is poisoned.
    pub fn set(&self, key: &str, keys: CacheKeys, content: String) -> Result<()> {
        self.lock()?.insert(key.to_string(), (keys, content));
        Ok(())
    }

    /// Cached content for `key`
    ///
    /// # Errors
    ///
    /// Returns `CacheFlushFailure` when the cache lock is poisoned.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).map(|(_, content)| content.clone()))
    }

    /// Number of cached fragments
    ///
    /// # Errors
    ///
    /// Returns `CacheFlushFailure` when the cache lock is poisoned.
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    /// # Errors
    ///
    /// Returns `CacheFlushFailure` when the cache lock is poisoned.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, (CacheKeys, String)>>> {
        self.entries.lock().map_err(|_| CmsError::CacheFlushFailure {
            cache: "fragment".to_string(),
            reason: "cache lock poisoned".to_string(),
        })
    }
}

fn depends_on(entry: &CacheKeys, keys: &CacheKeys) -> bool {
    keys.iter().any(|(class, ids)| {
        entry
            .get(class)
            .map(|tracked| !tracked.is_disjoint(ids))
            .unwrap_or(false)
    })
}

impl CacheAdapter for FragmentCache {
    fn name(&self) -> &str {
        "fragment"
    }

    fn is_contextual(&self) -> bool {
        true
    }

    fn flush(&self, keys: &CacheKeys) -> Result<()> {
        self.lock()?.retain(|_, (entry, _)| !depends_on(entry, keys));
        Ok(())
    }

    fn flush_all(&self) -> Result<()> {
        self.lock()?.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> FragmentKeys {
        FragmentKeys {
            manager: "snapshot".to_string(),
            page_id: "p1".to_string(),
            block_id: "b1".to_string(),
            updated_at: 1_700_000_000,
        }
    }

    #[test]
    fn test_token_verifies_and_rejects_tampering() {
        let token = compute_token("secret", &keys()).unwrap();
        assert_eq!(token.len(), 64);
        assert!(verify_token("secret", &keys(), &token).is_ok());

        let mut tampered = keys();
        tampered.block_id = "b2".to_string();
        assert!(matches!(
            verify_token("secret", &tampered, &token),
            Err(CmsError::InvalidToken)
        ));
        assert!(verify_token("other", &keys(), &token).is_err());
        assert!(verify_token("secret", &keys(), "short").is_err());
    }

    #[test]
    fn test_params_roundtrip_through_include_url() {
        let markup = FragmentMode::Esi.render("/_fragment", "secret", &keys()).unwrap();
        assert!(markup.starts_with("<esi:include src=\"/_fragment?block_id=b1"));

        let query = markup
            .split('?')
            .nth(1)
            .and_then(|rest| rest.split('"').next())
            .unwrap();
        let params: BTreeMap<String, String> = url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
        let (parsed, token) = FragmentKeys::from_params(&params).unwrap();
        assert_eq!(parsed, keys());
        assert!(verify_token("secret", &parsed, &token).is_ok());
    }

    #[test]
    fn test_missing_param() {
        let params = BTreeMap::new();
        assert!(matches!(
            FragmentKeys::from_params(&params),
            Err(CmsError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_flush_drops_dependent_entries_only() {
        let cache = FragmentCache::new();
        let mut a = CacheKeys::new();
        a.entry("block".to_string()).or_default().insert("b1".to_string());
        let mut b = CacheKeys::new();
        b.entry("block".to_string()).or_default().insert("b2".to_string());
        cache.set("a", a.clone(), "<p>a</p>".to_string()).unwrap();
        cache.set("b", b, "<p>b</p>".to_string()).unwrap();

        cache.flush(&a).unwrap();
        assert!(cache.get("a").unwrap().is_none());
        assert_eq!(cache.get("b").unwrap().as_deref(), Some("<p>b</p>"));

        cache.flush_all().unwrap();
        assert!(cache.is_empty().unwrap());
    }

    #[test]
    fn test_poisoned_lock_fails_reads_writes_and_flushes() {
        let cache = FragmentCache::new();
        let poisoned = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = cache.entries.lock().unwrap();
            panic!("render crashed while holding the cache");
        }));
        assert!(poisoned.is_err());

        let err = cache
            .set("a", CacheKeys::new(), "<p>a</p>".to_string())
            .unwrap_err();
        assert!(matches!(err, CmsError::CacheFlushFailure { .. }));
        assert!(cache.get("a").is_err());
        assert!(cache.len().is_err());
        assert!(cache.flush_all().is_err());
    }
}
