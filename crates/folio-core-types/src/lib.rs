//! Core types shared across Folio crates
//!
//! This crate carries the small vocabulary every other crate agrees on:
//!
//! - **Correlation**: `RequestId` tying log lines and errors to one request
//! - **Sensitive data**: `Sensitive<T>` for secrets such as the fragment signing key
//! - **Schema constants**: canonical structured-logging field keys and event names

pub mod correlation;
pub mod schema;
pub mod sensitive;

pub use correlation::RequestId;
pub use sensitive::Sensitive;
