//! Page tree invariant checks
//!
//! Each function returns every violation it finds so callers can report
//! them all; `validation::validate_site_tree` stops at the first.

use std::collections::{BTreeMap, HashSet};

use crate::model::{Page, PAGE_ALIAS_PREFIX};

/// `(page_id, alias)` for aliases missing the mandatory prefix
pub fn find_invalid_aliases(pages: &[Page]) -> Vec<(String, String)> {
    pages
        .iter()
        .filter_map(|p| {
            p.page_alias
                .as_ref()
                .filter(|alias| !alias.starts_with(PAGE_ALIAS_PREFIX))
                .map(|alias| (p.id.clone(), alias.clone()))
        })
        .collect()
}

/// `(page_id, parent_id)` for parents that do not exist
pub fn find_missing_parents(pages: &[Page]) -> Vec<(String, String)> {
    let ids: HashSet<&str> = pages.iter().map(|p| p.id.as_str()).collect();
    pages
        .iter()
        .filter_map(|p| {
            p.parent_id
                .as_ref()
                .filter(|parent| !ids.contains(parent.as_str()))
                .map(|parent| (p.id.clone(), parent.clone()))
        })
        .collect()
}

/// `(page_id, parent_id)` for parents that belong to another site
pub fn find_cross_site_parents(pages: &[Page]) -> Vec<(String, String)> {
    let sites: BTreeMap<&str, &str> = pages
        .iter()
        .map(|p| (p.id.as_str(), p.site_id.as_str()))
        .collect();
    pages
        .iter()
        .filter_map(|p| {
            let parent = p.parent_id.as_deref()?;
            let parent_site = sites.get(parent)?;
            (*parent_site != p.site_id).then(|| (p.id.clone(), parent.to_string()))
        })
        .collect()
}

/// Sites with more than one root page, with the offending page ids
pub fn find_multiple_roots(pages: &[Page]) -> Vec<(String, Vec<String>)> {
    let mut roots: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for page in pages.iter().filter(|p| p.is_root()) {
        roots.entry(page.site_id.as_str()).or_default().push(page.id.clone());
    }
    roots
        .into_iter()
        .filter(|(_, ids)| ids.len() > 1)
        .map(|(site, ids)| (site.to_string(), ids))
        .collect()
}

/// `(site_id, route_name)` pairs used by more than one page
pub fn find_duplicate_route_names(pages: &[Page]) -> Vec<(String, String)> {
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let mut duplicates = Vec::new();
    for page in pages {
        let key = (page.site_id.as_str(), page.route_name.as_str());
        if !seen.insert(key) {
            duplicates.push((key.0.to_string(), key.1.to_string()));
        }
    }
    duplicates
}

/// Pages whose parent chain loops back on itself
pub fn find_cycles(pages: &[Page]) -> Vec<String> {
    let parents: BTreeMap<&str, Option<&str>> = pages
        .iter()
        .map(|p| (p.id.as_str(), p.parent_id.as_deref()))
        .collect();

    let mut cyclic = Vec::new();
    for page in pages {
        let mut seen = HashSet::new();
        let mut current = Some(page.id.as_str());
        while let Some(id) = current {
            if !seen.insert(id) {
                cyclic.push(page.id.clone());
                break;
            }
            current = parents.get(id).copied().flatten();
        }
    }
    cyclic
}
