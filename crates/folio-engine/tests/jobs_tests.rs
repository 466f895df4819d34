#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{count, setup, t};
use folio_core::errors::ExErrorKind;
use folio_engine::jobs::{
    handle_message, Dispatch, JobOutcome, PublicationBackend, PublicationMessage, RuntimeBackend,
};
use folio_engine::publication::PublicationService;

#[test]
fn test_create_snapshot_message_publishes_page() {
    let mut conn = setup();
    let service = PublicationService::new();
    let raw = r#"{"type":"create_snapshot","pageId":"page-about"}"#;
    let msg = PublicationMessage::from_json(raw).unwrap();

    let outcome = handle_message(&service, &mut conn, &msg, t(1)).unwrap();

    match outcome {
        JobOutcome::Published { snapshot_ids } => assert_eq!(snapshot_ids.len(), 1),
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[test]
fn test_redelivered_message_is_safe() {
    let mut conn = setup();
    let service = PublicationService::new();
    let msg = PublicationMessage::CreateSnapshot {
        page_id: "page-about".to_string(),
    };

    handle_message(&service, &mut conn, &msg, t(1)).unwrap();
    handle_message(&service, &mut conn, &msg, t(1)).unwrap();

    assert_eq!(
        count(
            &conn,
            "SELECT COUNT(*) FROM snapshots \
             WHERE page_id = 'page-about' AND publication_date_end IS NULL"
        ),
        1
    );
}

#[test]
fn test_message_for_deleted_page_is_skipped() {
    let mut conn = setup();
    let service = PublicationService::new();
    let msg = PublicationMessage::CreateSnapshot {
        page_id: "deleted-page".to_string(),
    };

    let outcome = handle_message(&service, &mut conn, &msg, t(1)).unwrap();

    assert!(matches!(outcome, JobOutcome::Skipped { .. }));
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM snapshots"), 0);
}

#[test]
fn test_create_snapshots_message_publishes_site() {
    let mut conn = setup();
    let service = PublicationService::new();
    let raw = r#"{"type":"create_snapshots","siteId":"site-shop"}"#;
    let msg = PublicationMessage::from_json(raw).unwrap();

    let outcome = handle_message(&service, &mut conn, &msg, t(1)).unwrap();

    match outcome {
        JobOutcome::Published { snapshot_ids } => assert_eq!(snapshot_ids.len(), 2),
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[test]
fn test_cleanup_message_by_page() {
    let mut conn = setup();
    let service = PublicationService::new();
    for day in 1..=3 {
        service.create_by_page(&mut conn, "page-home", t(day)).unwrap();
    }
    let msg = PublicationMessage::from_json(
        r#"{"type":"cleanup_snapshot","pageId":"page-home","keepSnapshots":1}"#,
    )
    .unwrap();

    let outcome = handle_message(&service, &mut conn, &msg, t(4)).unwrap();

    assert_eq!(outcome, JobOutcome::Cleaned { deleted: 1 });
}

#[test]
fn test_cleanup_message_needs_one_target() {
    let mut conn = setup();
    let service = PublicationService::new();
    let msg = PublicationMessage::CleanupSnapshot {
        page_id: Some("page-home".to_string()),
        site_id: Some("site-main".to_string()),
        keep_snapshots: 1,
    };

    let err = handle_message(&service, &mut conn, &msg, t(1)).unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::InvalidInput);
}

#[test]
fn test_runtime_backend_executes_inline() {
    let mut conn = setup();
    let service = PublicationService::new();
    {
        let mut backend = RuntimeBackend::new(&service, &mut conn);
        let dispatch = backend
            .dispatch(
                PublicationMessage::CreateSnapshot {
                    page_id: "shop-cart".to_string(),
                },
                t(1),
            )
            .unwrap();
        assert!(matches!(
            dispatch,
            Dispatch::Executed(JobOutcome::Published { .. })
        ));
    }
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM snapshots"), 1);
}
