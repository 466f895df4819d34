//! Page metadata collected while serving a request

use crate::model::{Page, Site};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeoPage {
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl SeoPage {
    /// Seed from the site; empty site fields leave the current values alone
    pub fn seed_from_site(&mut self, site: &Site) {
        if let Some(title) = non_empty(&site.title) {
            self.title = Some(title);
        }
        if let Some(description) = non_empty(&site.meta_description) {
            self.description = Some(description);
        }
        if let Some(keywords) = non_empty(&site.meta_keywords) {
            self.keywords = Some(keywords);
        }
    }

    /// Page values override site values when set
    pub fn apply_page(&mut self, page: &Page) {
        if let Some(title) = non_empty(&page.title) {
            self.title = Some(title);
        }
        if let Some(description) = non_empty(&page.meta_description) {
            self.description = Some(description);
        }
        if let Some(keywords) = non_empty(&page.meta_keywords) {
            self.keywords = Some(keywords);
        }
    }
}
