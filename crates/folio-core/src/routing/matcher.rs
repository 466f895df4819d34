use crate::content::ContentManager;
use crate::context::RequestContext;
use crate::errors::{CmsError, Result};

use super::{RouteMatch, PAGE_SLUG_ROUTE, RENDER_CONTROLLER};

pub(super) fn match_path(
    ctx: &mut RequestContext,
    cms: &dyn ContentManager,
    path: &str,
    method: &str,
) -> Result<RouteMatch> {
    let site = ctx.site().cloned().ok_or(CmsError::SiteNotResolved)?;
    let path = if path.is_empty() { "/" } else { path };

    let page = cms.get_page_by_url(&site, path)?;

    if !page.is_cms() {
        return Err(CmsError::page_not_found(format!(
            "url={} is a {} page",
            path,
            page.page_type.as_str()
        )));
    }
    if !page.enabled && !ctx.editor_mode {
        return Err(CmsError::page_not_found(format!("url={} is disabled", path)));
    }
    if !page.allows_method(method) {
        return Err(CmsError::MethodNotAllowed {
            method: method.to_ascii_uppercase(),
            page_id: page.id.clone(),
        });
    }

    ctx.set_current_page(page.clone());

    Ok(RouteMatch {
        controller: RENDER_CONTROLLER,
        route: PAGE_SLUG_ROUTE,
        page,
        path: path.to_string(),
    })
}
