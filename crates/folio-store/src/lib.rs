//! Folio Store - SQLite persistence
//!
//! The draft side (sites, pages, blocks) and the published side (the
//! snapshot ledger) share one database so a publication is a single
//! transaction. `SqliteRepo` implements the read traits `folio-core`
//! resolves requests through.

pub mod db;
pub mod errors;
pub mod migrations;
pub mod repo;
pub mod seed;
pub mod snapshot;

pub use errors::Result;
pub use repo::SqliteRepo;
