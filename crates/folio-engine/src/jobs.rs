//! Asynchronous publication message contract
//!
//! Messages are JSON objects tagged by `type`, delivered at least once.
//! Handling is idempotent-safe: republishing a page yields a new snapshot
//! and closes the previous window, and a message whose page or site has
//! since been deleted is acknowledged as skipped.

#![allow(clippy::result_large_err)]

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use folio_core::errors::{ExError, ExErrorKind};
use folio_store::errors::Result;
use folio_store::SqliteRepo;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::publication::{BulkMode, PublicationService};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PublicationMessage {
    CreateSnapshot {
        #[serde(rename = "pageId")]
        page_id: String,
    },
    CreateSnapshots {
        #[serde(rename = "siteId")]
        site_id: String,
    },
    /// Exactly one of `pageId` and `siteId`
    CleanupSnapshot {
        #[serde(rename = "pageId", default, skip_serializing_if = "Option::is_none")]
        page_id: Option<String>,
        #[serde(rename = "siteId", default, skip_serializing_if = "Option::is_none")]
        site_id: Option<String>,
        #[serde(rename = "keepSnapshots")]
        keep_snapshots: usize,
    },
}

impl PublicationMessage {
    /// Queue a message of this type is routed to
    pub fn queue_name(&self) -> &'static str {
        match self {
            PublicationMessage::CreateSnapshot { .. } => "folio.page.create_snapshot",
            PublicationMessage::CreateSnapshots { .. } => "folio.page.create_snapshots",
            PublicationMessage::CleanupSnapshot { .. } => "folio.page.cleanup_snapshot",
        }
    }

    /// # Errors
    ///
    /// Returns `InvalidInput` for malformed JSON or an unknown `type`.
    pub fn from_json(payload: &str) -> Result<Self> {
        serde_json::from_str(payload).map_err(|e| {
            ExError::new(ExErrorKind::InvalidInput)
                .with_op("decode_message")
                .with_message(e.to_string())
        })
    }

    /// # Errors
    ///
    /// Returns `Serialization` if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(ExError::from)
    }
}

/// What handling a message did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Published { snapshot_ids: Vec<String> },
    Cleaned { deleted: usize },
    /// The target no longer exists; the message is acknowledged
    Skipped { reason: String },
}

/// Execute one message
///
/// Site-wide publication from a job runs best-effort so one broken page
/// does not block the rest of the site.
///
/// # Errors
///
/// Returns `InvalidInput` for a cleanup message naming neither or both of
/// page and site, otherwise whatever the publication service returns.
pub fn handle_message(
    service: &PublicationService,
    conn: &mut Connection,
    message: &PublicationMessage,
    at: DateTime<Utc>,
) -> Result<JobOutcome> {
    tracing::debug!(
        component = module_path!(),
        queue = message.queue_name(),
        "handling publication message"
    );

    match message {
        PublicationMessage::CreateSnapshot { page_id } => {
            if SqliteRepo::new(conn).get_page(page_id)?.is_none() {
                return Ok(skipped(format!("page {} no longer exists", page_id)));
            }
            let snap = service.create_by_page(conn, page_id, at)?;
            Ok(JobOutcome::Published {
                snapshot_ids: vec![snap.id],
            })
        }
        PublicationMessage::CreateSnapshots { site_id } => {
            if SqliteRepo::new(conn).get_site(site_id)?.is_none() {
                return Ok(skipped(format!("site {} no longer exists", site_id)));
            }
            let report = service.create_by_site(conn, site_id, at, BulkMode::BestEffort)?;
            Ok(JobOutcome::Published {
                snapshot_ids: report.published.into_iter().map(|s| s.id).collect(),
            })
        }
        PublicationMessage::CleanupSnapshot {
            page_id,
            site_id,
            keep_snapshots,
        } => match (page_id, site_id) {
            (Some(page_id), None) => {
                if SqliteRepo::new(conn).get_page(page_id)?.is_none() {
                    return Ok(skipped(format!("page {} no longer exists", page_id)));
                }
                let deleted = service.cleanup_by_page(conn, page_id, *keep_snapshots)?;
                Ok(JobOutcome::Cleaned { deleted })
            }
            (None, Some(site_id)) => {
                if SqliteRepo::new(conn).get_site(site_id)?.is_none() {
                    return Ok(skipped(format!("site {} no longer exists", site_id)));
                }
                let deleted = service.cleanup_by_site(conn, site_id, *keep_snapshots)?;
                Ok(JobOutcome::Cleaned { deleted })
            }
            _ => Err(ExError::new(ExErrorKind::InvalidInput)
                .with_op("handle_message")
                .with_message("cleanup_snapshot needs exactly one of pageId and siteId")),
        },
    }
}

fn skipped(reason: String) -> JobOutcome {
    tracing::info!(component = module_path!(), reason = %reason, "publication message skipped");
    JobOutcome::Skipped { reason }
}

/// External transport for queued messages
pub trait JobQueue: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the transport rejects the message.
    fn enqueue(&self, queue: &str, payload: String) -> Result<()>;
}

/// What a backend did with a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Executed(JobOutcome),
    Queued,
}

/// Where publication requests go
pub trait PublicationBackend {
    /// # Errors
    ///
    /// Returns the execution or transport error.
    fn dispatch(&mut self, message: PublicationMessage, at: DateTime<Utc>) -> Result<Dispatch>;
}

/// Executes messages synchronously on the caller's connection
pub struct RuntimeBackend<'a> {
    service: &'a PublicationService,
    conn: &'a mut Connection,
}

impl<'a> RuntimeBackend<'a> {
    pub fn new(service: &'a PublicationService, conn: &'a mut Connection) -> Self {
        Self { service, conn }
    }
}

impl PublicationBackend for RuntimeBackend<'_> {
    fn dispatch(&mut self, message: PublicationMessage, at: DateTime<Utc>) -> Result<Dispatch> {
        handle_message(self.service, self.conn, &message, at).map(Dispatch::Executed)
    }
}

/// Serializes messages and hands them to a `JobQueue`
pub struct QueueBackend<Q> {
    queue: Q,
}

impl<Q: JobQueue> QueueBackend<Q> {
    pub fn new(queue: Q) -> Self {
        Self { queue }
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }
}

impl<Q: JobQueue> PublicationBackend for QueueBackend<Q> {
    fn dispatch(&mut self, message: PublicationMessage, _at: DateTime<Utc>) -> Result<Dispatch> {
        self.queue.enqueue(message.queue_name(), message.to_json()?)?;
        Ok(Dispatch::Queued)
    }
}

/// Process-local queue
#[derive(Debug, Default)]
pub struct InMemoryJobQueue {
    messages: Mutex<Vec<(String, String)>>,
}

impl InMemoryJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything queued so far, oldest first
    pub fn drain(&self) -> Vec<(String, String)> {
        match self.messages.lock() {
            Ok(mut messages) => std::mem::take(&mut *messages),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl JobQueue for InMemoryJobQueue {
    fn enqueue(&self, queue: &str, payload: String) -> Result<()> {
        let mut messages = self.messages.lock().map_err(|_| {
            ExError::new(ExErrorKind::Concurrency)
                .with_op("enqueue")
                .with_message("job queue lock poisoned")
        })?;
        messages.push((queue.to_string(), payload));
        Ok(())
    }
}
