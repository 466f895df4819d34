//! Folio Core - content resolution kernel
//!
//! This crate holds everything that decides *what* a request sees, without
//! touching a database:
//! - Site, Page, Block and Snapshot models
//! - Site resolution strategies (host / locale / path prefix)
//! - Bidirectional page routing (URL to page, page to URL)
//! - The live and published content managers behind one trait
//! - Snapshot compilation and publication-window rules
//! - Read tracking, cache invalidation and fragment tokens
//!
//! Persistence lives in `folio-store`; orchestration in `folio-engine`.

pub mod cache;
pub mod content;
pub mod context;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod ops;
pub mod routing;
pub mod rules;
pub mod seo;
pub mod site;
pub mod snapshot;

// Re-export commonly used types
pub use content::{
    select_content_manager, ContentManager, LiveContentManager, PublishedContentManager,
};
pub use context::RequestContext;
pub use errors::{CmsError, ExError, ExErrorKind, Result};
pub use model::{Block, Page, PageType, Site, Snapshot};
pub use ops::Store;
pub use routing::PageRouter;
pub use site::{Resolution, SiteRequest, SiteResolver, SiteSelection};

// Paths used by the logging macros so callers need no extra dependencies
#[doc(hidden)]
pub use folio_core_types as __types;
#[doc(hidden)]
pub use tracing as __tracing;
