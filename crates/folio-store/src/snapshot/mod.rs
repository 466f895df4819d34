//! Snapshot ledger
//!
//! - `persist`: insert, activate and retention cleanup
//! - `query`: window-aware reads

pub mod persist;
pub mod query;

pub use persist::{cleanup_page, cleanup_site, enable_snapshots, insert_snapshot};
