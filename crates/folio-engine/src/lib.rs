//! Folio Engine - Orchestration layer
//!
//! Coordinates the content kernel in `folio-core` with SQLite persistence in
//! `folio-store`:
//! - `publication`: atomic compile-and-activate, bulk publication, retention
//! - `jobs`: the asynchronous publication message contract and its backends
//! - `request`: the per-request pipeline from host and path to a page
//! - `fragment`: the signed fragment endpoint
//! - `editing`: draft mutations with cache invalidation
//! - `config`: deployment configuration

pub mod config;
pub mod editing;
pub mod fragment;
pub mod jobs;
pub mod publication;
pub mod request;

pub use config::{load_config, CmsConfig};
pub use publication::{BulkMode, PublicationHook, PublicationService};
pub use request::{handle_request, PageResponse};
