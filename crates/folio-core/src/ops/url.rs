//! Canonical page URL derivation

use std::collections::{BTreeMap, HashSet};

use crate::errors::{CmsError, Result};
use crate::model::Page;

/// Collapse runs of `/` into one
pub fn collapse_slashes(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    let mut previous_slash = false;
    for c in url.chars() {
        if c == '/' {
            if !previous_slash {
                out.push(c);
            }
            previous_slash = true;
        } else {
            out.push(c);
            previous_slash = false;
        }
    }
    out
}

/// URL of a child page given its parent's URL
pub fn child_url(parent_url: &str, slug: &str) -> String {
    collapse_slashes(&format!("{}/{}", parent_url, slug))
}

/// Recompute `url` for every page of one site tree
///
/// Roots get `/`; children get `parent.url + "/" + slug`. A `custom_url`
/// replaces the derived URL and is inherited by the page's children.
/// Dynamic pages keep the pattern URL they were created with.
///
/// # Errors
///
/// Returns `CycleDetected` when the parent chain of some page loops, or
/// `ParentNotFound` when a parent is missing from `pages`.
pub fn fix_url(pages: &mut [Page]) -> Result<()> {
    let index: BTreeMap<String, usize> = pages
        .iter()
        .enumerate()
        .map(|(i, p)| (p.id.clone(), i))
        .collect();

    let mut resolved: BTreeMap<String, String> = BTreeMap::new();
    for i in 0..pages.len() {
        resolve(pages, &index, i, &mut resolved, &mut HashSet::new())?;
    }

    for page in pages.iter_mut() {
        if page.is_dynamic() {
            continue;
        }
        if let Some(url) = resolved.get(&page.id) {
            page.url = url.clone();
        }
    }
    Ok(())
}

fn resolve(
    pages: &[Page],
    index: &BTreeMap<String, usize>,
    i: usize,
    resolved: &mut BTreeMap<String, String>,
    visiting: &mut HashSet<String>,
) -> Result<String> {
    let page = &pages[i];
    if let Some(url) = resolved.get(&page.id) {
        return Ok(url.clone());
    }
    if !visiting.insert(page.id.clone()) {
        return Err(CmsError::CycleDetected {
            page_id: page.id.clone(),
        });
    }

    let url = match &page.parent_id {
        None => "/".to_string(),
        Some(parent_id) => {
            let parent_index = *index.get(parent_id).ok_or_else(|| CmsError::ParentNotFound {
                page_id: page.id.clone(),
                parent_id: parent_id.clone(),
            })?;
            let parent_url = resolve(pages, index, parent_index, resolved, visiting)?;
            child_url(&parent_url, &page.slug)
        }
    };

    let url = match page.custom_url.as_deref().map(str::trim) {
        _ if page.is_dynamic() => page.url.clone(),
        Some(custom) if !custom.is_empty() => collapse_slashes(&format!("/{}", custom)),
        _ => url,
    };
    resolved.insert(page.id.clone(), url.clone());
    Ok(url)
}
