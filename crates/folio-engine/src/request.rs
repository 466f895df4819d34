//! Request pipeline
//!
//! ## Steps:
//! 1. Fresh `RequestContext` (nothing survives between requests)
//! 2. Site resolution; a redirect short-circuits
//! 3. Publish the site into the context (seeds SEO)
//! 4. Pick the live or published content manager from editor mode
//! 5. Match the path; a page with a target redirects to it
//! 6. Unknown paths fall back to the configured 404 error page
//! 7. Every entity read is recorded for cache tagging

#![allow(clippy::result_large_err)]

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use folio_core::cache::CacheKeys;
use folio_core::content::{select_content_manager, ContentManager};
use folio_core::errors::{CmsError, ExError};
use folio_core::model::{Block, Page, Site};
use folio_core::ops::{PageRepository, SiteRepository, SnapshotRepository};
use folio_core::routing::{PageRouter, ReferenceType, RouteRef, RoutingContext};
use folio_core::seo::SeoPage;
use folio_core::site::{Resolution, SiteRequest, SiteResolver};
use folio_core::{LiveContentManager, PublishedContentManager, RequestContext};
use folio_core_types::RequestId;
use folio_store::errors::Result;

use crate::config::CmsConfig;

/// A page ready for the renderer
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub request_id: RequestId,
    pub site: Site,
    pub page: Page,
    pub blocks: Vec<Block>,
    /// 200, or the status of the error page served
    pub status: u16,
    pub seo: SeoPage,
    /// Entities read while resolving, for tagging the response in caches
    pub cache_keys: CacheKeys,
}

#[derive(Debug, Clone)]
pub enum PageResponse {
    Render(Box<RenderedPage>),
    Redirect { location: String, status: u16 },
    NotFound,
}

/// Serve one request
///
/// # Errors
///
/// Returns `Configuration` when the site selection cannot work with the
/// request, `MethodNotAllowed` when the page rejects the method, or any
/// repository error. Unknown paths are not errors: they yield the 404
/// error page or `PageResponse::NotFound`.
pub fn handle_request<R>(
    repo: &R,
    config: &CmsConfig,
    mut request: SiteRequest,
    editor_mode: bool,
    at: DateTime<Utc>,
) -> Result<PageResponse>
where
    R: SiteRepository + PageRepository + SnapshotRepository,
{
    let start = Instant::now();
    let mut ctx = RequestContext::new(editor_mode);
    folio_core::log_op_start!(
        "handle_request",
        request_id = ctx.request_id.as_str(),
        host = request.host.as_str(),
        path = request.path_info.as_str(),
        editor_mode = editor_mode
    );

    let result = serve(repo, config, &mut request, &mut ctx, at);
    let duration_ms = start.elapsed().as_millis() as u64;
    match &result {
        Ok(response) => folio_core::log_op_end!(
            "handle_request",
            duration_ms = duration_ms,
            request_id = ctx.request_id.as_str(),
            outcome = outcome_name(response)
        ),
        Err(e) => folio_core::log_op_error!(
            "handle_request",
            e.clone(),
            duration_ms = duration_ms,
            request_id = ctx.request_id.as_str()
        ),
    }
    result
}

fn outcome_name(response: &PageResponse) -> &'static str {
    match response {
        PageResponse::Render(_) => "render",
        PageResponse::Redirect { .. } => "redirect",
        PageResponse::NotFound => "not_found",
    }
}

fn serve<R>(
    repo: &R,
    config: &CmsConfig,
    request: &mut SiteRequest,
    ctx: &mut RequestContext,
    at: DateTime<Utc>,
) -> Result<PageResponse>
where
    R: SiteRepository + PageRepository + SnapshotRepository,
{
    let resolver = SiteResolver::new(config.site_selection);
    let site = match resolver.resolve(repo, request, at).map_err(|e| with_request(e, ctx))? {
        Resolution::Site(site) => site,
        Resolution::Redirect(redirect) => {
            return Ok(PageResponse::Redirect {
                location: redirect.location,
                status: redirect.status.code(),
            })
        }
        Resolution::Unresolved => return Ok(PageResponse::NotFound),
    };
    ctx.set_site(site.clone());

    let live = LiveContentManager::new(repo).with_error_codes(config.error_codes());
    let published = PublishedContentManager::new(repo, at).with_error_codes(config.error_codes());
    let cms = select_content_manager(ctx.editor_mode, &live, &published);

    let router = PageRouter::new();
    match router.match_path(ctx, cms, &request.path_info, &request.method) {
        Ok(matched) => {
            if let Some(target_id) = &matched.page.target_id {
                let target = cms
                    .get_page_by_id(&site, target_id)
                    .map_err(|e| with_request(e, ctx))?;
                let routing = RoutingContext::new(request.scheme.clone(), request.host.clone())
                    .with_base_url(request.base_url.clone());
                let location = router
                    .generate(
                        &routing,
                        &site,
                        cms,
                        RouteRef::Page(&target),
                        &BTreeMap::new(),
                        ReferenceType::AbsolutePath,
                    )
                    .map_err(|e| with_request(e, ctx))?;
                return Ok(PageResponse::Redirect {
                    location,
                    status: 302,
                });
            }
            render(ctx, cms, site, matched.page, 200)
        }
        Err(CmsError::PageNotFound { lookup }) => {
            tracing::debug!(
                component = module_path!(),
                request_id = ctx.request_id.as_str(),
                lookup = %lookup,
                "no page for path"
            );
            match error_page(config, cms, &site, 404) {
                Some(page) => {
                    ctx.set_current_page(page.clone());
                    render(ctx, cms, site, page, 404)
                }
                None => Ok(PageResponse::NotFound),
            }
        }
        Err(e) => Err(with_request(e, ctx)),
    }
}

fn error_page(
    config: &CmsConfig,
    cms: &dyn ContentManager,
    site: &Site,
    status: u16,
) -> Option<Page> {
    let route = config.error_route(status)?;
    cms.get_page_by_route_name(site, route).ok()
}

fn render(
    ctx: &mut RequestContext,
    cms: &dyn ContentManager,
    site: Site,
    page: Page,
    status: u16,
) -> Result<PageResponse> {
    let blocks = cms.blocks(&page).map_err(|e| with_request(e, ctx))?;
    for block in &blocks {
        ctx.recorder.add(block);
    }
    Ok(PageResponse::Render(Box::new(RenderedPage {
        request_id: ctx.request_id.clone(),
        site,
        page,
        blocks,
        status,
        seo: ctx.seo.clone(),
        cache_keys: ctx.recorder.get().clone(),
    })))
}

fn with_request(err: CmsError, ctx: &RequestContext) -> ExError {
    ExError::from(err).with_request_id(ctx.request_id.clone())
}
