//! Schema migrations
//!
//! Embedded SQL files applied once each, in order, with checksum drift
//! detection on every start.

mod embedded;
mod runner;

pub use runner::{applied_migrations, apply_migrations};
