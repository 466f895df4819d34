//! Domain models for sites, pages, blocks and snapshots

pub mod block;
pub mod page;
pub mod site;
pub mod snapshot;

pub use block::{Block, CONTAINER_BLOCK_TYPE};
pub use page::{
    Page, PageType, RequestMethods, PAGE_ALIAS_PREFIX, PAGE_INTERNAL_ERROR_PREFIX,
    PAGE_INTERNAL_PREFIX,
};
pub use site::Site;
pub use snapshot::{PageContent, Snapshot};
