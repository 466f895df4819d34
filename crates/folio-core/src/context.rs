//! Request-scoped state
//!
//! One `RequestContext` is built per inbound request and dropped with it.
//! Long-lived services (resolver, router, content managers) stay stateless.

use folio_core_types::RequestId;

use crate::cache::Recorder;
use crate::model::{Page, Site};
use crate::seo::SeoPage;

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: RequestId,
    pub editor_mode: bool,
    site: Option<Site>,
    current_page: Option<Page>,
    pub seo: SeoPage,
    pub recorder: Recorder,
}

impl RequestContext {
    pub fn new(editor_mode: bool) -> Self {
        Self::with_recorder(editor_mode, Recorder::default())
    }

    pub fn with_recorder(editor_mode: bool, recorder: Recorder) -> Self {
        Self {
            request_id: RequestId::new(),
            editor_mode,
            site: None,
            current_page: None,
            seo: SeoPage::default(),
            recorder,
        }
    }

    pub fn site(&self) -> Option<&Site> {
        self.site.as_ref()
    }

    /// Publish the resolved site and seed SEO metadata from it
    pub fn set_site(&mut self, site: Site) {
        self.seo.seed_from_site(&site);
        self.recorder.add(&site);
        self.site = Some(site);
    }

    pub fn current_page(&self) -> Option<&Page> {
        self.current_page.as_ref()
    }

    pub fn set_current_page(&mut self, page: Page) {
        self.seo.apply_page(&page);
        self.recorder.add(&page);
        self.current_page = Some(page);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setting_site_and_page_records_reads() {
        let mut ctx = RequestContext::new(false);
        assert!(ctx.site().is_none());

        ctx.set_site(Site::new("s1", "Main", "example.com"));
        ctx.set_current_page(Page::new("p1", "s1", "Home", "homepage"));

        assert_eq!(ctx.current_page().map(|p| p.id.as_str()), Some("p1"));
        let keys = ctx.recorder.get();
        assert!(keys["site"].contains("s1"));
        assert!(keys["page"].contains("p1"));
    }

    #[test]
    fn test_contexts_do_not_share_state() {
        let mut a = RequestContext::new(true);
        let b = RequestContext::new(false);
        a.set_current_page(Page::new("p1", "s1", "Home", "homepage"));
        assert!(b.current_page().is_none());
        assert_ne!(a.request_id, b.request_id);
    }
}
