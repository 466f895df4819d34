//! Bidirectional page routing
//!
//! `PageRouter::match_path` turns a (rewritten) request path into a CMS
//! page; `PageRouter::generate` turns a page, an alias or a raw path back
//! into a URL.

mod generator;
mod matcher;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::content::ContentManager;
use crate::context::RequestContext;
use crate::errors::Result;
use crate::model::{Page, Site, PAGE_ALIAS_PREFIX};

/// Route name for raw path generation through the `path` parameter
pub const PAGE_SLUG_ROUTE: &str = "page_slug";

/// Controller token every matched page is dispatched to
pub const RENDER_CONTROLLER: &str = "folio.page.render";

/// Result of a successful URL match
#[derive(Debug, Clone, PartialEq)]
pub struct RouteMatch {
    pub controller: &'static str,
    pub route: &'static str,
    pub page: Page,
    pub path: String,
}

/// What to generate a URL for
#[derive(Debug, Clone, Copy)]
pub enum RouteRef<'a> {
    Page(&'a Page),
    /// `page_slug`, an alias token, or a name owned by another router
    Name(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    #[default]
    AbsolutePath,
    AbsoluteUrl,
    NetworkPath,
}

/// Where generated URLs are anchored
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoutingContext {
    pub base_url: String,
    pub scheme: String,
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl RoutingContext {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            base_url: String::new(),
            scheme: scheme.into(),
            host: Some(host.into()),
            port: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }
}

/// Stateless router over whichever content manager the request uses
#[derive(Debug, Clone, Copy, Default)]
pub struct PageRouter;

impl PageRouter {
    pub fn new() -> Self {
        Self
    }

    /// Whether `name` is a route this router can generate
    pub fn supports(&self, name: &str) -> bool {
        name == PAGE_SLUG_ROUTE || name.starts_with(PAGE_ALIAS_PREFIX)
    }

    /// Match a request path to a renderable page
    ///
    /// # Errors
    ///
    /// Returns `SiteNotResolved` without a site in the context,
    /// `PageNotFound` when no renderable page answers the path, and
    /// `MethodNotAllowed` when the page rejects the method.
    pub fn match_path(
        &self,
        ctx: &mut RequestContext,
        cms: &dyn ContentManager,
        path: &str,
        method: &str,
    ) -> Result<RouteMatch> {
        matcher::match_path(ctx, cms, path, method)
    }

    /// Generate a URL
    ///
    /// # Errors
    ///
    /// Returns `RouteNotFound` for dynamic pages and foreign route names,
    /// `InvalidParameter` for `page_slug` without `path`, and
    /// `PageNotFound` when an alias resolves to nothing.
    pub fn generate(
        &self,
        routing: &RoutingContext,
        site: &Site,
        cms: &dyn ContentManager,
        route: RouteRef<'_>,
        parameters: &BTreeMap<String, String>,
        reference: ReferenceType,
    ) -> Result<String> {
        generator::generate(routing, site, cms, route, parameters, reference)
    }
}
