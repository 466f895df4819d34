//! Page tree navigation

use crate::model::Page;

/// Direct children of `parent_id` ordered by position then id
pub fn children<'a>(pages: &'a [Page], parent_id: &str) -> Vec<&'a Page> {
    let mut children: Vec<&Page> = pages
        .iter()
        .filter(|p| p.parent_id.as_deref() == Some(parent_id))
        .collect();
    children.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id)));
    children
}

pub fn root(pages: &[Page]) -> Option<&Page> {
    pages.iter().find(|p| p.is_root())
}

/// One node of a navigation tree
#[derive(Debug, Clone, PartialEq)]
pub struct NavNode {
    pub page_id: String,
    pub name: String,
    pub url: String,
    pub children: Vec<NavNode>,
}

/// Navigation tree below `parent_id`
///
/// Dynamic and internal pages are left out, together with their subtrees.
pub fn navigation(pages: &[Page], parent_id: &str) -> Vec<NavNode> {
    children(pages, parent_id)
        .into_iter()
        .filter(|p| !p.is_dynamic() && !p.is_internal())
        .map(|p| NavNode {
            page_id: p.id.clone(),
            name: p.name.clone(),
            url: p.url.clone(),
            children: navigation(pages, &p.id),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PageType;

    #[test]
    fn test_navigation_skips_dynamic_and_internal() {
        let mut b = Page::new("b", "s1", "B", "b").with_parent("root").with_url("/b");
        b.position = 2;
        let mut a = Page::new("a", "s1", "A", "a").with_parent("root").with_url("/a");
        a.position = 1;
        let pages = vec![
            Page::new("root", "s1", "Home", "homepage").with_url("/"),
            b,
            a,
            Page::new("d", "s1", "D", "product")
                .with_parent("root")
                .with_type(PageType::Dynamic),
            Page::new("e", "s1", "404", "_page_internal_error_404").with_parent("root"),
            Page::new("a1", "s1", "A1", "a1").with_parent("a").with_url("/a/a1"),
        ];

        assert_eq!(root(&pages).map(|p| p.id.as_str()), Some("root"));
        let nav = navigation(&pages, "root");
        let ids: Vec<_> = nav.iter().map(|n| n.page_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(nav[0].children.len(), 1);
        assert_eq!(nav[0].children[0].url, "/a/a1");
    }
}
