//! Structured logging
//!
//! `init(profile)` installs the process subscriber once. Operations log
//! through `log_op_start!` / `log_op_end!` / `log_op_error!` so every line
//! carries `component`, `op` and `event`. Tests install the capture layer
//! with `init_test_capture()` instead and assert on recorded events.
//!
//! ```rust
//! use folio_core::logging_facility::{init, Profile};
//!
//! init(Profile::Development);
//! ```

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
