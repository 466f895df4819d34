//! Command implementations and the state they share

pub mod job;
pub mod request;
pub mod seed;
pub mod site;
pub mod snapshot;

use std::error::Error;
use std::path::{Path, PathBuf};

use folio_engine::config::{load_config, CmsConfig};
use rusqlite::Connection;

pub type CliResult<T = ()> = Result<T, Box<dyn Error>>;

/// Configuration and database location resolved from global flags
pub struct Runtime {
    pub config: CmsConfig,
    pub db_path: PathBuf,
}

impl Runtime {
    pub fn load(config_path: Option<&Path>, db: Option<PathBuf>) -> CliResult<Self> {
        let config = match config_path {
            Some(path) => load_config(path)?,
            None => CmsConfig::default(),
        };
        let db_path = db.unwrap_or_else(|| config.database.path.clone());
        Ok(Self { config, db_path })
    }

    /// Open the database with the schema brought up to date
    pub fn open(&self) -> CliResult<Connection> {
        if let Some(parent) = self.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut conn = folio_store::db::open(&self.db_path)?;
        folio_store::migrations::apply_migrations(&mut conn)?;
        Ok(conn)
    }
}

pub fn migrate(runtime: &Runtime) -> CliResult {
    runtime.open()?;
    println!("✓ Schema up to date ({})", runtime.db_path.display());
    Ok(())
}
