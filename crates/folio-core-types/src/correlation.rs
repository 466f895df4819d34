//! Request correlation
//!
//! A `RequestId` is minted when a request enters the pipeline (or a job is
//! picked up) and is copied into every error raised while serving it.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Time-ordered (UUIDv7) so ids sort with the log lines they tag
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Adopt an id forwarded by a proxy; blank values are ignored
    pub fn from_header(value: &str) -> Option<Self> {
        let value = value.trim();
        (!value.is_empty()).then(|| Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<String> for RequestId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
