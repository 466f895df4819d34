use chrono::{DateTime, TimeZone, Utc};
use folio_core::{Page, Site, Store};

/// Midnight UTC on the given day of January 2024
#[allow(dead_code)]
pub fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
}

#[allow(dead_code)]
pub fn store_with_sites(sites: Vec<Site>) -> Store {
    let mut store = Store::new();
    for site in sites {
        store.insert_site(site);
    }
    store
}

/// Home page at `/` plus one child per `(id, slug)`
#[allow(dead_code)]
pub fn insert_tree(store: &mut Store, site_id: &str, children: &[(&str, &str)]) {
    let home = Page::new(format!("{}-home", site_id), site_id, "Home", "homepage").with_url("/");
    store.insert_page(home);
    for (id, slug) in children {
        store.insert_page(
            Page::new(*id, site_id, *id, *id)
                .with_parent(format!("{}-home", site_id))
                .with_slug(*slug)
                .with_url(format!("/{}", slug)),
        );
    }
}
