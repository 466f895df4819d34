pub mod repository;
pub mod store;
pub mod tree;
pub mod url;

pub use repository::{PageRepository, SiteRepository, SnapshotLookup, SnapshotRepository};
pub use store::Store;
