//! Draft-side repository and row mapping

pub mod hydration;
pub mod sqlite_repo;

pub use sqlite_repo::SqliteRepo;
