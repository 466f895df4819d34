//! Multi-site resolution
//!
//! A `SiteResolver` maps an inbound `SiteRequest` onto one `Site` using the
//! deployment's `SiteSelection` strategy. Path-based strategies rewrite the
//! request path and base URL; they may also answer with a redirect instead of
//! a site.

pub mod locale;
pub mod request;
pub mod resolver;

pub use request::{RequestKind, SiteRequest};
pub use resolver::{Redirect, RedirectStatus, Resolution, SiteResolver, SiteSelection};
