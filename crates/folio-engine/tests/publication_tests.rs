#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;

use common::{count, setup, t, RecordingCache};
use folio_core::cache::{FlushFailurePolicy, IdentityRegistry, InvalidationService};
use folio_core::errors::{ExError, ExErrorKind};
use folio_core::model::Snapshot;
use folio_engine::publication::{BulkMode, PublicationHook, PublicationService};
use folio_store::snapshot::query;
use folio_store::SqliteRepo;

struct VetoHook {
    page_id: &'static str,
}

impl PublicationHook for VetoHook {
    fn before_activation(&self, snapshot: &Snapshot) -> folio_store::Result<()> {
        if snapshot.page_id == self.page_id {
            return Err(
                ExError::new(ExErrorKind::PublicationFailure).with_message("injected failure")
            );
        }
        Ok(())
    }
}

#[test]
fn test_republish_closes_previous_window_and_cleanup_keeps_it() {
    // Given: P has S1 open since T0
    let mut conn = setup();
    let service = PublicationService::new();
    let s1 = service.create_by_page(&mut conn, "page-home", t(1)).unwrap();

    // When: P is published again at T1
    let s2 = service.create_by_page(&mut conn, "page-home", t(2)).unwrap();

    // Then: S2 is open from T1 and S1 closed at T1
    assert_eq!(s2.publication_date_start, Some(t(2)));
    assert!(s2.publication_date_end.is_none());
    let s1 = query::get_snapshot(&conn, &s1.id).unwrap().unwrap();
    assert_eq!(s1.publication_date_end, Some(t(2)));

    // And: cleanup keeping one closed snapshot deletes nothing
    let deleted = service.cleanup_by_page(&mut conn, "page-home", 1).unwrap();
    assert_eq!(deleted, 0);
    assert_eq!(query::snapshots_for_page(&conn, "page-home").unwrap().len(), 2);
}

#[test]
fn test_publication_clears_edited_bit() {
    let mut conn = setup();
    SqliteRepo::new(&conn).set_edited("page-about", true, t(1)).unwrap();

    PublicationService::new()
        .create_by_page(&mut conn, "page-about", t(2))
        .unwrap();

    assert!(!SqliteRepo::new(&conn).get_page("page-about").unwrap().unwrap().edited);
}

#[test]
fn test_snapshot_carries_compiled_blocks() {
    let mut conn = setup();
    let snap = PublicationService::new()
        .create_by_page(&mut conn, "page-home", t(1))
        .unwrap();

    let ids: Vec<&str> = snap.content.blocks.iter().map(|b| b.id.as_str()).collect();
    assert!(ids.contains(&"block-content"));
    assert!(ids.contains(&"block-welcome"));
    assert_eq!(snap.url, "/");
}

#[test]
fn test_failure_between_insert_and_activation_rolls_back() {
    // Given: a page with an open snapshot and a pending edit
    let mut conn = setup();
    PublicationService::new()
        .create_by_page(&mut conn, "page-home", t(1))
        .unwrap();
    SqliteRepo::new(&conn).set_edited("page-home", true, t(2)).unwrap();

    // When: the hook fails after the new snapshot was inserted
    let service = PublicationService::new().with_hook(Arc::new(VetoHook { page_id: "page-home" }));
    let err = service.create_by_page(&mut conn, "page-home", t(3)).unwrap_err();

    // Then: no new snapshot, the old window is still open, the page still dirty
    assert_eq!(err.kind(), ExErrorKind::PublicationFailure);
    assert_eq!(err.page_id(), Some("page-home"));
    let history = query::snapshots_for_page(&conn, "page-home").unwrap();
    assert_eq!(history.len(), 1);
    assert!(history[0].is_active());
    assert!(SqliteRepo::new(&conn).get_page("page-home").unwrap().unwrap().edited);
}

#[test]
fn test_unknown_page_is_not_found() {
    let mut conn = setup();
    let err = PublicationService::new()
        .create_by_page(&mut conn, "ghost", t(1))
        .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::NotFound);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM snapshots"), 0);
}

#[test]
fn test_publishing_into_the_past_is_rejected() {
    let mut conn = setup();
    let service = PublicationService::new();
    service.create_by_page(&mut conn, "page-home", t(5)).unwrap();

    let err = service.create_by_page(&mut conn, "page-home", t(4)).unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::WindowConflict);
    assert_eq!(query::snapshots_for_page(&conn, "page-home").unwrap().len(), 1);
}

#[test]
fn test_enable_snapshots_reactivates_older_snapshot() {
    let mut conn = setup();
    let service = PublicationService::new();
    let s1 = service.create_by_page(&mut conn, "page-home", t(1)).unwrap();
    let s2 = service.create_by_page(&mut conn, "page-home", t(2)).unwrap();

    service
        .enable_snapshots(&mut conn, &[s1.id.clone()], t(3))
        .unwrap();

    let active = query::active_snapshot(&conn, "page-home").unwrap().unwrap();
    assert_eq!(active.id, s1.id);
    let s2 = query::get_snapshot(&conn, &s2.id).unwrap().unwrap();
    assert_eq!(s2.publication_date_end, Some(t(3)));
}

#[test]
fn test_stale_activation_loses_to_newer_window() {
    let mut conn = setup();
    let service = PublicationService::new();
    let stale = service.create_by_page(&mut conn, "page-home", t(1)).unwrap();
    let newer = service.create_by_page(&mut conn, "page-home", t(5)).unwrap();

    let err = service
        .enable_snapshots(&mut conn, &[stale.id.clone()], t(4))
        .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::WindowConflict);
    let active = query::active_snapshot(&conn, "page-home").unwrap().unwrap();
    assert_eq!(active.id, newer.id);

    service
        .enable_snapshots(&mut conn, &[stale.id.clone()], t(6))
        .unwrap();
    let active = query::active_snapshot(&conn, "page-home").unwrap().unwrap();
    assert_eq!(active.id, stale.id);
}

#[test]
fn test_site_publication_atomic_rolls_back_everything() {
    let mut conn = setup();
    let service = PublicationService::new().with_hook(Arc::new(VetoHook { page_id: "page-about" }));

    let err = service
        .create_by_site(&mut conn, "site-main", t(1), BulkMode::Atomic)
        .unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::PublicationFailure);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM snapshots"), 0);
}

#[test]
fn test_site_publication_best_effort_reports_failures() {
    let mut conn = setup();
    let service = PublicationService::new().with_hook(Arc::new(VetoHook { page_id: "page-about" }));

    let report = service
        .create_by_site(&mut conn, "site-main", t(1), BulkMode::BestEffort)
        .unwrap();

    assert_eq!(report.published.len(), 3);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, "page-about");
    assert_eq!(
        count(&conn, "SELECT COUNT(*) FROM snapshots WHERE site_id = 'site-main'"),
        3
    );
}

#[test]
fn test_site_publication_unknown_site() {
    let mut conn = setup();
    let err = PublicationService::new()
        .create_by_site(&mut conn, "ghost", t(1), BulkMode::Atomic)
        .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::NotFound);
}

#[test]
fn test_cleanup_zero_keeps_active_snapshot() {
    let mut conn = setup();
    let service = PublicationService::new();
    for day in 1..=4 {
        service.create_by_page(&mut conn, "page-home", t(day)).unwrap();
    }

    let deleted = service.cleanup_by_site(&mut conn, "site-main", 0).unwrap();

    assert_eq!(deleted, 3);
    let remaining = query::snapshots_for_page(&conn, "page-home").unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].publication_date_start, Some(t(4)));
}

fn with_cache(policy: FlushFailurePolicy, cache: Arc<RecordingCache>) -> PublicationService {
    let invalidation =
        InvalidationService::new(Arc::new(IdentityRegistry::default()), policy).with_adapter(cache);
    PublicationService::new().with_invalidation(Arc::new(invalidation))
}

#[test]
fn test_cache_flushed_for_page_after_commit() {
    let mut conn = setup();
    let cache = Arc::new(RecordingCache::default());
    let service = with_cache(FlushFailurePolicy::Log, cache.clone());

    service.create_by_page(&mut conn, "page-about", t(1)).unwrap();

    let flushed = cache.flushed.lock().unwrap();
    assert_eq!(flushed.len(), 1);
    assert!(flushed[0]["page"].contains("page-about"));
}

#[test]
fn test_raised_flush_failure_leaves_publication_committed() {
    let mut conn = setup();
    let cache = Arc::new(RecordingCache {
        fail: true,
        ..RecordingCache::default()
    });
    let service = with_cache(FlushFailurePolicy::Raise, cache);

    let err = service.create_by_page(&mut conn, "page-about", t(1)).unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::CacheFlushFailure);
    let active = query::active_snapshot(&conn, "page-about").unwrap();
    assert!(active.is_some());
}

#[test]
fn test_logged_flush_failure_is_swallowed() {
    let mut conn = setup();
    let cache = Arc::new(RecordingCache {
        fail: true,
        ..RecordingCache::default()
    });
    let service = with_cache(FlushFailurePolicy::Log, cache);

    assert!(service.create_by_page(&mut conn, "page-about", t(1)).is_ok());
}

mod window_properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_publications_keep_one_open_window(
            gaps in proptest::collection::vec(0u32..3, 1..6)
        ) {
            let mut conn = setup();
            let service = PublicationService::new();
            let mut day = 1;
            for gap in gaps {
                day += gap;
                service.create_by_page(&mut conn, "page-home", t(day)).unwrap();
            }

            let history = query::snapshots_for_page(&conn, "page-home").unwrap();
            prop_assert_eq!(history.iter().filter(|s| s.is_active()).count(), 1);

            let mut windows: Vec<_> = history
                .iter()
                .map(|s| (s.publication_date_start.unwrap(), s.publication_date_end))
                .collect();
            // an instantly superseded window [t, t) sorts before the one that replaced it
            windows.sort_by_key(|w| (w.0, w.1.is_none(), w.1));
            for pair in windows.windows(2) {
                let end = pair[0].1.unwrap();
                prop_assert!(end <= pair[1].0);
            }
        }
    }
}
