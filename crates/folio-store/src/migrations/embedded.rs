//! SQL migrations compiled into the binary
//!
//! Order is significant: ids are applied top to bottom and their checksums
//! are pinned in `schema_version` once applied.

use sha2::{Digest, Sha256};

pub struct Migration {
    pub id: &'static str,
    pub sql: &'static str,
}

impl Migration {
    /// Hex SHA-256 of the SQL text, used to detect edits to applied files
    pub fn checksum(&self) -> String {
        hex::encode(Sha256::digest(self.sql.as_bytes()))
    }
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        id: "001_initial_schema",
        sql: include_str!("../../migrations/001_initial_schema.sql"),
    },
    Migration {
        id: "002_snapshots",
        sql: include_str!("../../migrations/002_snapshots.sql"),
    },
];
