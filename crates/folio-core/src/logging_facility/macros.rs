//! Operation logging macros
//!
//! Every public operation logs a `start` event, then either `end` with its
//! duration or `end_error` with the error's kind and code. Extra fields are
//! passed through to `tracing` unchanged.

/// Log the start of an operation
///
/// ```
/// # use folio_core::log_op_start;
/// log_op_start!("create_by_page");
/// log_op_start!("create_by_page", page_id = "p1");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)*)?) => {
        $crate::__tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::__types::schema::EVENT_START,
            $($($field)*)?
        )
    };
}

/// Log the successful end of an operation
///
/// ```
/// # use folio_core::log_op_end;
/// log_op_end!("create_by_page", duration_ms = 42);
/// log_op_end!("cleanup_by_page", duration_ms = 7, deleted = 3usize);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {
        $crate::__tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::__types::schema::EVENT_END,
            duration_ms = $duration,
            $($($field)*)?
        )
    };
}

/// Log an operation error
///
/// Accepts anything convertible into `ExError`. Besides kind and code, the
/// site and page the error names are logged when it carries them.
///
/// ```
/// # use folio_core::{log_op_error, errors::CmsError};
/// let err = CmsError::RouteNotFound { name: "x".to_string() };
/// log_op_error!("generate", err, duration_ms = 3);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        $crate::__tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::__types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code(),
            err.site_id = ex_err.site_id(),
            err.page_id = ex_err.page_id(),
            $($($field)*)?
        );
    }};
}
