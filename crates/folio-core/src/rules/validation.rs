use crate::errors::{CmsError, Result};
use crate::model::Page;

use super::invariants;

/// Validate the page trees of one or more sites
///
/// Checks, in order: alias prefix, parent existence, parent in the same
/// site, parent cycles, a single root per site, unique route names per site.
///
/// # Errors
///
/// Returns the first violation found.
pub fn validate_site_tree(pages: &[Page]) -> Result<()> {
    if let Some((_, alias)) = invariants::find_invalid_aliases(pages).into_iter().next() {
        return Err(CmsError::InvalidAlias { alias });
    }

    if let Some((page_id, parent_id)) = invariants::find_missing_parents(pages).into_iter().next() {
        return Err(CmsError::ParentNotFound { page_id, parent_id });
    }

    if let Some((page_id, parent_id)) =
        invariants::find_cross_site_parents(pages).into_iter().next()
    {
        return Err(CmsError::ParentSiteMismatch { page_id, parent_id });
    }

    if let Some(page_id) = invariants::find_cycles(pages).into_iter().next() {
        return Err(CmsError::CycleDetected { page_id });
    }

    if let Some((site_id, page_ids)) = invariants::find_multiple_roots(pages).into_iter().next() {
        return Err(CmsError::MultipleRoots { site_id, page_ids });
    }

    if let Some((site_id, route_name)) =
        invariants::find_duplicate_route_names(pages).into_iter().next()
    {
        return Err(CmsError::DuplicateRouteName {
            site_id,
            route_name,
        });
    }

    Ok(())
}
