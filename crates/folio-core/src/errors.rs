use folio_core_types::RequestId;
use thiserror::Error;

/// Result type alias using CmsError
pub type Result<T> = std::result::Result<T, CmsError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Every error that leaves a Folio crate carries one of these kinds. Each kind
/// maps to a stable code used by the CLI exit path, log lines and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Structural/Validation
    InvalidInput,
    NotFound,
    ConstraintViolation,
    InvalidTree,

    // Resolution/Routing
    SiteNotFound,
    PageNotFound,
    RouteNotFound,
    InvalidParameter,
    MethodNotAllowed,

    // Configuration (fatal, never per-request)
    Configuration,

    // Publication
    PublicationFailure,
    WindowConflict,

    // Cache
    CacheFlushFailure,
    InvalidToken,

    // Integration/IO
    Io,
    Serialization,
    Persistence,
    Concurrency,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::ConstraintViolation => "ERR_CONSTRAINT_VIOLATION",
            ExErrorKind::InvalidTree => "ERR_INVALID_TREE",
            ExErrorKind::SiteNotFound => "ERR_SITE_NOT_FOUND",
            ExErrorKind::PageNotFound => "ERR_PAGE_NOT_FOUND",
            ExErrorKind::RouteNotFound => "ERR_ROUTE_NOT_FOUND",
            ExErrorKind::InvalidParameter => "ERR_INVALID_PARAMETER",
            ExErrorKind::MethodNotAllowed => "ERR_METHOD_NOT_ALLOWED",
            ExErrorKind::Configuration => "ERR_CONFIGURATION",
            ExErrorKind::PublicationFailure => "ERR_PUBLICATION_FAILURE",
            ExErrorKind::WindowConflict => "ERR_WINDOW_CONFLICT",
            ExErrorKind::CacheFlushFailure => "ERR_CACHE_FLUSH_FAILURE",
            ExErrorKind::InvalidToken => "ERR_INVALID_TOKEN",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Concurrency => "ERR_CONCURRENCY",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Whether the routing layer may recover from this kind by falling
    /// through to standard not-found handling.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ExErrorKind::NotFound
                | ExErrorKind::SiteNotFound
                | ExErrorKind::PageNotFound
                | ExErrorKind::RouteNotFound
        )
    }
}

/// Canonical structured error type
///
/// Carries a classification kind plus optional context for debugging. Built
/// with the `with_*` methods:
///
/// ```
/// use folio_core::errors::{ExError, ExErrorKind};
///
/// let err = ExError::new(ExErrorKind::PageNotFound)
///     .with_op("get_page_by_url")
///     .with_site_id("site-1")
///     .with_message("no page at /missing");
/// assert_eq!(err.code(), "ERR_PAGE_NOT_FOUND");
/// ```
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    site_id: Option<String>,
    page_id: Option<String>,
    request_id: Option<RequestId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            site_id: None,
            page_id: None,
            request_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity ID context
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    pub fn with_site_id(mut self, id: impl Into<String>) -> Self {
        self.site_id = Some(id.into());
        self
    }

    pub fn with_page_id(mut self, id: impl Into<String>) -> Self {
        self.page_id = Some(id.into());
        self
    }

    /// Add request ID context
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn site_id(&self) -> Option<&str> {
        self.site_id.as_deref()
    }

    pub fn page_id(&self) -> Option<&str> {
        self.page_id.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        if let Some(site_id) = &self.site_id {
            write!(f, " (site_id: {})", site_id)?;
        }
        if let Some(page_id) = &self.page_id {
            write!(f, " (page_id: {})", page_id)?;
        }
        if let Some(source) = &self.source {
            write!(f, " <- {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain error taxonomy for resolution, routing and publication
#[derive(Error, Debug, Clone)]
pub enum CmsError {
    // ===== Lookup Errors =====
    /// Site does not exist
    #[error("Site not found: {site_id}")]
    SiteNotFound { site_id: String },

    /// No site is published in the request context
    #[error("No site resolved for this request")]
    SiteNotResolved,

    /// Page lookup (by url, route name, alias or id) found nothing
    #[error("Page not found: {lookup}")]
    PageNotFound { lookup: String },

    /// Block does not exist or does not belong to the page
    #[error("Block not found: {block_id}")]
    BlockNotFound { block_id: String },

    /// Snapshot does not exist
    #[error("Snapshot not found: {snapshot_id}")]
    SnapshotNotFound { snapshot_id: String },

    // ===== Routing Errors =====
    /// Route name cannot be resolved to a path
    #[error("Route not found: {name}")]
    RouteNotFound { name: String },

    /// URL generation received an unusable parameter set
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Page does not accept the request method
    #[error("Method {method} not allowed for page {page_id}")]
    MethodNotAllowed { method: String, page_id: String },

    // ===== Configuration Errors =====
    /// Strategy or collaborator misconfigured for the request type
    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    // ===== Tree Validation Errors =====
    /// Page alias does not carry the alias prefix
    #[error("Invalid page alias '{alias}': must start with _page_alias_")]
    InvalidAlias { alias: String },

    /// Route name used twice inside one site
    #[error("Duplicate route name '{route_name}' in site {site_id}")]
    DuplicateRouteName { site_id: String, route_name: String },

    /// Site has more than one page without a parent
    #[error("Site {site_id} has multiple root pages: {page_ids:?}")]
    MultipleRoots {
        site_id: String,
        page_ids: Vec<String>,
    },

    /// Page parent belongs to a different site
    #[error("Page {page_id} has parent {parent_id} from another site")]
    ParentSiteMismatch { page_id: String, parent_id: String },

    /// Page parent does not exist
    #[error("Page {page_id} references missing parent {parent_id}")]
    ParentNotFound { page_id: String, parent_id: String },

    /// Following parent links from a page returns to it
    #[error("Cycle detected in page tree at page {page_id}")]
    CycleDetected { page_id: String },

    // ===== Publication Errors =====
    /// Activation would open a window before the current active one
    #[error("Publication window conflict for page {page_id}: {reason}")]
    WindowConflict { page_id: String, reason: String },

    /// Publication aborted; nothing was applied
    #[error("Publication failed for page {page_id}: {reason}")]
    PublicationFailure { page_id: String, reason: String },

    // ===== Cache Errors =====
    /// A cache adapter failed to flush
    #[error("Unable to flush cache '{cache}': {reason}")]
    CacheFlushFailure { cache: String, reason: String },

    /// Fragment request token does not match its keys
    #[error("Invalid fragment token")]
    InvalidToken,

    // ===== Generic Errors =====
    /// Serialization error (JSON encoding/decoding)
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Error surfaced by a storage collaborator
    #[error("{0}")]
    Storage(ExError),

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CmsError {
    /// Kind this error maps to at crate boundaries
    pub fn kind(&self) -> ExErrorKind {
        match self {
            CmsError::SiteNotFound { .. } | CmsError::SiteNotResolved => ExErrorKind::SiteNotFound,
            CmsError::PageNotFound { .. } => ExErrorKind::PageNotFound,
            CmsError::BlockNotFound { .. } | CmsError::SnapshotNotFound { .. } => {
                ExErrorKind::NotFound
            }
            CmsError::RouteNotFound { .. } => ExErrorKind::RouteNotFound,
            CmsError::InvalidParameter { .. } => ExErrorKind::InvalidParameter,
            CmsError::MethodNotAllowed { .. } => ExErrorKind::MethodNotAllowed,
            CmsError::Configuration { .. } => ExErrorKind::Configuration,
            CmsError::InvalidAlias { .. } => ExErrorKind::InvalidInput,
            CmsError::DuplicateRouteName { .. } => ExErrorKind::ConstraintViolation,
            CmsError::MultipleRoots { .. }
            | CmsError::ParentSiteMismatch { .. }
            | CmsError::ParentNotFound { .. }
            | CmsError::CycleDetected { .. } => ExErrorKind::InvalidTree,
            CmsError::WindowConflict { .. } => ExErrorKind::WindowConflict,
            CmsError::PublicationFailure { .. } => ExErrorKind::PublicationFailure,
            CmsError::CacheFlushFailure { .. } => ExErrorKind::CacheFlushFailure,
            CmsError::InvalidToken => ExErrorKind::InvalidToken,
            CmsError::Serialization { .. } => ExErrorKind::Serialization,
            CmsError::Storage(e) => e.kind(),
            CmsError::Internal { .. } => ExErrorKind::Internal,
        }
    }

    pub fn page_not_found(lookup: impl Into<String>) -> Self {
        CmsError::PageNotFound {
            lookup: lookup.into(),
        }
    }
}

/// Conversion from CmsError to ExError
///
/// Keeps the structured context (site/page ids) that the domain variant
/// already carries so log lines stay filterable.
impl From<CmsError> for ExError {
    fn from(err: CmsError) -> Self {
        let kind = err.kind();
        let message = err.to_string();
        match err {
            CmsError::Storage(inner) => inner,
            CmsError::SiteNotFound { site_id } => ExError::new(kind)
                .with_site_id(site_id)
                .with_message(message),
            CmsError::BlockNotFound { block_id } => ExError::new(kind)
                .with_entity_id(block_id)
                .with_message(message),
            CmsError::SnapshotNotFound { snapshot_id } => ExError::new(kind)
                .with_entity_id(snapshot_id)
                .with_message(message),
            CmsError::MethodNotAllowed { page_id, .. }
            | CmsError::ParentSiteMismatch { page_id, .. }
            | CmsError::ParentNotFound { page_id, .. }
            | CmsError::CycleDetected { page_id }
            | CmsError::WindowConflict { page_id, .. }
            | CmsError::PublicationFailure { page_id, .. } => ExError::new(kind)
                .with_page_id(page_id)
                .with_message(message),
            CmsError::DuplicateRouteName { site_id, .. }
            | CmsError::MultipleRoots { site_id, .. } => {
                ExError::new(kind).with_site_id(site_id).with_message(message)
            }
            _ => ExError::new(kind).with_message(message),
        }
    }
}

impl From<ExError> for CmsError {
    fn from(err: ExError) -> Self {
        CmsError::Storage(err)
    }
}

impl From<serde_json::Error> for CmsError {
    fn from(err: serde_json::Error) -> Self {
        CmsError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ExError {
    fn from(err: serde_json::Error) -> Self {
        ExError::new(ExErrorKind::Serialization).with_message(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routing_kind_codes() {
        assert_eq!(ExErrorKind::PageNotFound.code(), "ERR_PAGE_NOT_FOUND");
        assert_eq!(ExErrorKind::RouteNotFound.code(), "ERR_ROUTE_NOT_FOUND");
        assert_eq!(ExErrorKind::InvalidParameter.code(), "ERR_INVALID_PARAMETER");
        assert_eq!(ExErrorKind::Configuration.code(), "ERR_CONFIGURATION");
    }

    #[test]
    fn test_not_found_kinds_are_recoverable() {
        assert!(ExErrorKind::PageNotFound.is_not_found());
        assert!(ExErrorKind::RouteNotFound.is_not_found());
        assert!(!ExErrorKind::Configuration.is_not_found());
        assert!(!ExErrorKind::PublicationFailure.is_not_found());
    }

    #[test]
    fn test_storage_variant_unwraps_to_inner_error() {
        let inner = ExError::new(ExErrorKind::Persistence).with_op("sqlite");
        let ex: ExError = CmsError::Storage(inner).into();
        assert_eq!(ex.kind(), ExErrorKind::Persistence);
        assert_eq!(ex.op(), Some("sqlite"));
    }

    #[test]
    fn test_window_conflict_keeps_page_id() {
        let err = CmsError::WindowConflict {
            page_id: "p1".to_string(),
            reason: "earlier than active start".to_string(),
        };
        let ex: ExError = err.into();
        assert_eq!(ex.kind(), ExErrorKind::WindowConflict);
        assert_eq!(ex.page_id(), Some("p1"));
    }

    #[test]
    fn test_display_chains_source() {
        let err = ExError::new(ExErrorKind::PublicationFailure)
            .with_op("create_by_page")
            .with_source(ExError::new(ExErrorKind::Persistence).with_message("disk full"));
        let text = err.to_string();
        assert!(text.starts_with("[ERR_PUBLICATION_FAILURE]"));
        assert!(text.contains("disk full"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
