//! Deployment configuration
//!
//! Loaded once at startup from YAML. Unknown keys are rejected so a typo in
//! a key never silently falls back to a default.

#![allow(clippy::result_large_err)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use folio_core::cache::FlushFailurePolicy;
use folio_core::errors::{ExError, ExErrorKind};
use folio_core::model::PAGE_INTERNAL_ERROR_PREFIX;
use folio_core::site::SiteSelection;
use folio_core_types::Sensitive;
use serde::Deserialize;

use folio_store::errors::{io_error, Result};

/// Number of closed snapshots retention cleanup keeps per page by default
pub const DEFAULT_KEEP_SNAPSHOTS: usize = 5;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CmsConfig {
    #[serde(default)]
    pub site_selection: SiteSelection,

    /// Signing key for fragment include URLs
    #[serde(default)]
    pub fragment_secret: Sensitive<String>,

    /// HTTP status to internal route name of its error page
    #[serde(default = "default_error_pages")]
    pub error_pages: BTreeMap<u16, String>,

    #[serde(default)]
    pub cache_flush_failures: FlushFailurePolicy,

    #[serde(default = "default_keep_snapshots")]
    pub keep_snapshots: usize,

    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            site_selection: SiteSelection::default(),
            fragment_secret: Sensitive::default(),
            error_pages: default_error_pages(),
            cache_flush_failures: FlushFailurePolicy::default(),
            keep_snapshots: DEFAULT_KEEP_SNAPSHOTS,
            database: DatabaseConfig::default(),
        }
    }
}

fn default_error_pages() -> BTreeMap<u16, String> {
    [404u16, 500]
        .into_iter()
        .map(|status| (status, format!("{}{}", PAGE_INTERNAL_ERROR_PREFIX, status)))
        .collect()
}

fn default_keep_snapshots() -> usize {
    DEFAULT_KEEP_SNAPSHOTS
}

fn default_database_path() -> PathBuf {
    PathBuf::from("folio.db")
}

impl CmsConfig {
    /// Statuses that have an error page
    pub fn error_codes(&self) -> Vec<u16> {
        self.error_pages.keys().copied().collect()
    }

    pub fn error_route(&self, status: u16) -> Option<&str> {
        self.error_pages.get(&status).map(String::as_str)
    }

    fn validate(&self) -> Result<()> {
        for (status, route) in &self.error_pages {
            if !(400..600).contains(status) {
                return Err(config_error(format!(
                    "error_pages: {} is not an HTTP error status",
                    status
                )));
            }
            if !route.starts_with(PAGE_INTERNAL_ERROR_PREFIX) {
                return Err(config_error(format!(
                    "error_pages: route '{}' for {} must start with '{}'",
                    route, status, PAGE_INTERNAL_ERROR_PREFIX
                )));
            }
        }
        Ok(())
    }
}

fn config_error(message: String) -> ExError {
    ExError::new(ExErrorKind::Configuration)
        .with_op("load_config")
        .with_message(message)
}

/// Parse configuration from YAML text
///
/// # Errors
///
/// Returns `Configuration` for malformed YAML, unknown keys or invalid
/// error page entries.
pub fn parse_config(content: &str) -> Result<CmsConfig> {
    let config: CmsConfig =
        serde_yaml::from_str(content).map_err(|e| config_error(e.to_string()))?;
    config.validate()?;
    if config.fragment_secret.is(&String::new()) {
        tracing::warn!(
            component = module_path!(),
            "fragment_secret is empty, fragment tokens can be forged"
        );
    }
    Ok(config)
}

/// Load configuration from a YAML file
///
/// # Errors
///
/// Returns `Io` if the file cannot be read, otherwise as `parse_config`.
pub fn load_config(path: &Path) -> Result<CmsConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| io_error("load_config", e))?;
    parse_config(&content)
}
