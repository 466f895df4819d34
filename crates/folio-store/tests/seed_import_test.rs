// Seed import from the fixture file into a fresh on-disk database

use std::path::PathBuf;

use folio_core::ops::PageRepository;
use folio_store::migrations::apply_migrations;
use folio_store::seed::import_seed;
use folio_store::SqliteRepo;
use tempfile::TempDir;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

#[test]
fn test_import_two_sites() {
    let dir = TempDir::new().unwrap();
    let mut conn = folio_store::db::open(dir.path().join("folio.db")).unwrap();
    apply_migrations(&mut conn).unwrap();

    let report = import_seed(&fixtures_dir().join("seed_two_sites.yaml"), &mut conn).unwrap();
    assert_eq!(report.sites, 2);
    assert_eq!(report.pages, 5);
    assert_eq!(report.blocks, 2);

    let repo = SqliteRepo::new(&conn);
    let cart = repo.page_by_url("site-shop", "/cart").unwrap().unwrap();
    assert_eq!(cart.id, "shop-cart");
    assert!(cart.allows_method("POST"));
    assert!(!cart.allows_method("DELETE"));

    let error_page = repo
        .page_by_route_name("site-main", "_page_internal_error_404")
        .unwrap()
        .unwrap();
    assert!(error_page.is_error());

    let blocks = repo.list_blocks("page-home").unwrap();
    let welcome = blocks.iter().find(|b| b.id == "block-welcome").unwrap();
    assert_eq!(welcome.parent_id.as_deref(), Some("block-content"));
}

#[test]
fn test_reimport_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let mut conn = folio_store::db::open(dir.path().join("folio.db")).unwrap();
    apply_migrations(&mut conn).unwrap();
    let path = fixtures_dir().join("seed_two_sites.yaml");

    import_seed(&path, &mut conn).unwrap();
    import_seed(&path, &mut conn).unwrap();

    let pages: i64 = conn
        .query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))
        .unwrap();
    assert_eq!(pages, 5);
}

#[test]
fn test_missing_file_is_rejected() {
    let mut conn = folio_store::db::open_in_memory().unwrap();
    apply_migrations(&mut conn).unwrap();

    let err = import_seed(&fixtures_dir().join("nope.yaml"), &mut conn).unwrap_err();
    assert!(err.to_string().contains("Failed to read seed file"));
}
