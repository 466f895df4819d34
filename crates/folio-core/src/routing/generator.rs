use std::collections::BTreeMap;

use crate::content::ContentManager;
use crate::errors::{CmsError, Result};
use crate::model::{Page, Site, PAGE_ALIAS_PREFIX};
use crate::site::request::is_default_port;

use super::{ReferenceType, RouteRef, RoutingContext, PAGE_SLUG_ROUTE};

pub(super) fn generate(
    routing: &RoutingContext,
    site: &Site,
    cms: &dyn ContentManager,
    route: RouteRef<'_>,
    parameters: &BTreeMap<String, String>,
    reference: ReferenceType,
) -> Result<String> {
    let mut parameters = parameters.clone();

    let url = match route {
        RouteRef::Page(page) => page_url(page)?,
        RouteRef::Name(name) if name.starts_with(PAGE_ALIAS_PREFIX) => {
            let page = cms.get_page_by_alias(site, name)?;
            page_url(&page)?
        }
        RouteRef::Name(PAGE_SLUG_ROUTE) => {
            parameters
                .remove("path")
                .ok_or_else(|| CmsError::InvalidParameter {
                    name: "path".to_string(),
                    reason: format!("required to generate {}", PAGE_SLUG_ROUTE),
                })?
        }
        RouteRef::Name(name) => {
            return Err(CmsError::RouteNotFound {
                name: name.to_string(),
            })
        }
    };

    let mut path = format!("{}{}", routing.base_url.trim_end_matches('/'), url);
    if path.is_empty() {
        path.push('/');
    }
    if !parameters.is_empty() {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(parameters.iter())
            .finish();
        path = format!("{}?{}", path, query);
    }

    Ok(match (reference, routing.host.as_deref()) {
        (ReferenceType::AbsoluteUrl, Some(host)) => {
            format!("{}://{}{}", routing.scheme, authority(routing, host), path)
        }
        (ReferenceType::NetworkPath, Some(host)) => {
            format!("//{}{}", authority(routing, host), path)
        }
        _ => path,
    })
}

fn page_url(page: &Page) -> Result<String> {
    if page.is_dynamic() {
        return Err(CmsError::RouteNotFound {
            name: page.route_name.clone(),
        });
    }
    Ok(if page.url.starts_with('/') {
        page.url.clone()
    } else {
        format!("/{}", page.url)
    })
}

fn authority(routing: &RoutingContext, host: &str) -> String {
    match routing.port {
        Some(port) if !is_default_port(&routing.scheme, port) => format!("{}:{}", host, port),
        _ => host.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{LiveContentManager, PublishedContentManager};
    use crate::context::RequestContext;
    use crate::model::PageType;
    use crate::ops::url::fix_url;
    use crate::ops::{PageRepository, Store};
    use crate::routing::PageRouter;
    use crate::snapshot::compile_page;
    use chrono::{TimeZone, Utc};

    fn setup() -> (Store, Site) {
        let site = Site::new("s1", "Main", "example.com");
        let mut about = Page::new("about", "s1", "About", "about")
            .with_parent("home")
            .with_slug("about")
            .with_alias("_page_alias_about");
        about.custom_url = Some("/about-us".to_string());
        let mut pages = vec![
            Page::new("home", "s1", "Home", "homepage"),
            about,
            Page::new("team", "s1", "Team", "team")
                .with_parent("about")
                .with_slug("team"),
        ];
        fix_url(&mut pages).unwrap();

        let mut store = Store::new();
        store.insert_site(site.clone());
        for page in pages {
            store.insert_page(page);
        }
        (store, site)
    }

    fn generate_path(store: &Store, site: &Site, cms: &dyn ContentManager, id: &str) -> String {
        let page = store.page(id).unwrap().unwrap();
        PageRouter::new()
            .generate(
                &RoutingContext::default(),
                site,
                cms,
                RouteRef::Page(&page),
                &BTreeMap::new(),
                ReferenceType::AbsolutePath,
            )
            .unwrap()
    }

    #[test]
    fn test_custom_url_and_query_string() {
        let (store, site) = setup();
        let cms = LiveContentManager::new(&store);
        let routing = RoutingContext::new("https", "example.com").with_base_url("/shop");
        let mut params = BTreeMap::new();
        params.insert("b".to_string(), "2 3".to_string());
        params.insert("a".to_string(), "1".to_string());

        let url = PageRouter::new()
            .generate(
                &routing,
                &site,
                &cms,
                RouteRef::Name("_page_alias_about"),
                &params,
                ReferenceType::AbsolutePath,
            )
            .unwrap();
        assert_eq!(url, "/shop/about-us?a=1&b=2+3");
    }

    #[test]
    fn test_generated_custom_urls_match_back_in_live_mode() {
        let (store, site) = setup();
        let cms = LiveContentManager::new(&store);
        let router = PageRouter::new();

        for (id, expected) in [("about", "/about-us"), ("team", "/about-us/team")] {
            let path = generate_path(&store, &site, &cms, id);
            assert_eq!(path, expected);

            let mut ctx = RequestContext::new(false);
            ctx.set_site(site.clone());
            let matched = router.match_path(&mut ctx, &cms, &path, "GET").unwrap();
            assert_eq!(matched.page.id, id);
        }
    }

    #[test]
    fn test_generated_custom_urls_match_back_in_published_mode() {
        let (mut store, site) = setup();
        let t1 = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap();
        let mut ids = Vec::new();
        for id in ["home", "about", "team"] {
            let page = store.page(id).unwrap().unwrap();
            let snapshot = compile_page(&page, &[], t1);
            ids.push(snapshot.id.clone());
            store.insert_snapshot(snapshot);
        }
        let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
        store.enable_snapshots(&ids, t1).unwrap();

        let cms = PublishedContentManager::new(&store, t2);
        let path = generate_path(&store, &site, &cms, "about");
        assert_eq!(path, "/about-us");

        let mut ctx = RequestContext::new(false);
        ctx.set_site(site.clone());
        let matched = PageRouter::new()
            .match_path(&mut ctx, &cms, &path, "GET")
            .unwrap();
        assert_eq!(matched.page.id, "about");
    }

    #[test]
    fn test_absolute_and_network_references() {
        let (store, site) = setup();
        let cms = LiveContentManager::new(&store);
        let home = store.page("home").unwrap().unwrap();
        let router = PageRouter::new();
        let none = BTreeMap::new();

        let routing = RoutingContext::new("http", "example.com").with_port(8080);
        let url = router
            .generate(
                &routing,
                &site,
                &cms,
                RouteRef::Page(&home),
                &none,
                ReferenceType::AbsoluteUrl,
            )
            .unwrap();
        assert_eq!(url, "http://example.com:8080/");

        let routing = RoutingContext::new("https", "example.com").with_port(443);
        let url = router
            .generate(
                &routing,
                &site,
                &cms,
                RouteRef::Page(&home),
                &none,
                ReferenceType::NetworkPath,
            )
            .unwrap();
        assert_eq!(url, "//example.com/");
    }

    #[test]
    fn test_dynamic_page_has_no_route() {
        let (store, site) = setup();
        let cms = LiveContentManager::new(&store);
        let dynamic = Page::new("d", "s1", "Product", "product")
            .with_type(PageType::Dynamic)
            .with_url("/product/{id}");
        let err = PageRouter::new()
            .generate(
                &RoutingContext::default(),
                &site,
                &cms,
                RouteRef::Page(&dynamic),
                &BTreeMap::new(),
                ReferenceType::AbsolutePath,
            )
            .unwrap_err();
        assert!(matches!(err, CmsError::RouteNotFound { .. }));
    }

    #[test]
    fn test_page_slug_requires_path() {
        let (store, site) = setup();
        let cms = LiveContentManager::new(&store);
        let router = PageRouter::new();
        let routing = RoutingContext::default();

        let err = router
            .generate(
                &routing,
                &site,
                &cms,
                RouteRef::Name("page_slug"),
                &BTreeMap::new(),
                ReferenceType::AbsolutePath,
            )
            .unwrap_err();
        assert!(matches!(err, CmsError::InvalidParameter { .. }));

        let mut params = BTreeMap::new();
        params.insert("path".to_string(), "/raw/path".to_string());
        let url = router
            .generate(
                &routing,
                &site,
                &cms,
                RouteRef::Name("page_slug"),
                &params,
                ReferenceType::AbsolutePath,
            )
            .unwrap();
        assert_eq!(url, "/raw/path");
    }

    #[test]
    fn test_foreign_names() {
        let (store, site) = setup();
        let cms = LiveContentManager::new(&store);
        let router = PageRouter::new();
        let routing = RoutingContext::default();
        let none = BTreeMap::new();
        assert!(!router.supports("homepage"));
        assert!(router.supports("page_slug"));

        let err = router
            .generate(
                &routing,
                &site,
                &cms,
                RouteRef::Name("homepage"),
                &none,
                ReferenceType::AbsolutePath,
            )
            .unwrap_err();
        assert!(matches!(err, CmsError::RouteNotFound { .. }));

        let err = router
            .generate(
                &routing,
                &site,
                &cms,
                RouteRef::Name("_page_alias_missing"),
                &none,
                ReferenceType::AbsolutePath,
            )
            .unwrap_err();
        assert!(matches!(err, CmsError::PageNotFound { .. }));
    }
}
