//! Seed import system
//!
//! Provides:
//! - Seed format v1 schema (sites with nested page trees and blocks)
//! - YAML parser with validation
//! - Importer that fixes URLs, validates each tree and persists in one transaction

pub mod format;
pub mod importer;
pub mod parser;

pub use format::SeedV1;
pub use importer::{import_seed, import_seed_str, SeedReport};
pub use parser::{parse_seed_file, parse_seed_str};
