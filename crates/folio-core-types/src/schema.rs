//! Canonical schema constants for structured logging and events
//!
//! Every log line emitted through the logging macros uses these keys so that
//! request traces can be filtered by site, page or snapshot.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_REQUEST_ID: &str = "request_id";

// Entity identifiers
pub const FIELD_SITE_ID: &str = "site_id";
pub const FIELD_PAGE_ID: &str = "page_id";
pub const FIELD_BLOCK_ID: &str = "block_id";
pub const FIELD_SNAPSHOT_ID: &str = "snapshot_id";

// Request attributes
pub const FIELD_HOST: &str = "host";
pub const FIELD_PATH: &str = "path";
pub const FIELD_EDITOR_MODE: &str = "editor_mode";

// Collection sizes
pub const FIELD_CANDIDATES: &str = "candidates";
pub const FIELD_DELETED: &str = "deleted";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_are_distinct() {
        assert_ne!(EVENT_START, EVENT_END);
        assert_ne!(EVENT_START, EVENT_END_ERROR);
        assert_ne!(EVENT_END, EVENT_END_ERROR);
    }

    #[test]
    fn test_entity_fields_are_distinct() {
        let fields = [FIELD_SITE_ID, FIELD_PAGE_ID, FIELD_BLOCK_ID, FIELD_SNAPSHOT_ID];
        for (i, a) in fields.iter().enumerate() {
            for b in &fields[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
