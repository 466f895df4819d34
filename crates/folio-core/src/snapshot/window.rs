//! Publication window rules
//!
//! Per page at most one snapshot is open (`start` set, `end` null) and
//! windows `[start, end)` never overlap. Both hold as long as every
//! activation goes through `check_activation` and closes the other open
//! windows at the same instant.

use chrono::{DateTime, Utc};

use crate::errors::{CmsError, Result};
use crate::model::Snapshot;

/// Earliest instant a new window for this page may start at
///
/// The latest of the open window's start and every closed window's end.
pub fn activation_floor(page_snapshots: &[Snapshot]) -> Option<DateTime<Utc>> {
    page_snapshots
        .iter()
        .filter_map(|s| match (s.publication_date_start, s.publication_date_end) {
            (Some(start), None) => Some(start),
            (Some(_), Some(end)) => Some(end),
            _ => None,
        })
        .max()
}

/// Reject activations that would reopen history
///
/// # Errors
///
/// Returns `WindowConflict` when `at` lies before the activation floor.
pub fn check_activation(
    page_id: &str,
    page_snapshots: &[Snapshot],
    at: DateTime<Utc>,
) -> Result<()> {
    if let Some(floor) = activation_floor(page_snapshots) {
        if at < floor {
            return Err(CmsError::WindowConflict {
                page_id: page_id.to_string(),
                reason: format!(
                    "activation at {} precedes current window boundary {}",
                    at.to_rfc3339(),
                    floor.to_rfc3339()
                ),
            });
        }
    }
    Ok(())
}

/// Activate `snapshot_id` among the snapshots of one page
///
/// Closes every other open window at `at`, then opens the target window at
/// `at`. Activating the snapshot that is already open is a no-op.
///
/// # Errors
///
/// Returns `SnapshotNotFound` if the id is not among `page_snapshots`, or
/// `WindowConflict` from `check_activation`.
pub fn activate(
    page_snapshots: &mut [Snapshot],
    snapshot_id: &str,
    at: DateTime<Utc>,
) -> Result<()> {
    let target = page_snapshots
        .iter()
        .position(|s| s.id == snapshot_id)
        .ok_or_else(|| CmsError::SnapshotNotFound {
            snapshot_id: snapshot_id.to_string(),
        })?;

    if page_snapshots[target].is_active() {
        return Ok(());
    }

    let page_id = page_snapshots[target].page_id.clone();
    check_activation(&page_id, page_snapshots, at)?;

    for (i, snapshot) in page_snapshots.iter_mut().enumerate() {
        if i != target && snapshot.is_active() {
            snapshot.publication_date_end = Some(at);
        }
    }
    let snapshot = &mut page_snapshots[target];
    snapshot.publication_date_start = Some(at);
    snapshot.publication_date_end = None;
    Ok(())
}

/// Count snapshots whose windows overlap another's; 0 for a valid history
pub fn overlapping_pairs(page_snapshots: &[Snapshot]) -> usize {
    let windows: Vec<(DateTime<Utc>, Option<DateTime<Utc>>)> = page_snapshots
        .iter()
        .filter_map(|s| s.publication_date_start.map(|start| (start, s.publication_date_end)))
        .filter(|(start, end)| end.map(|e| e > *start).unwrap_or(true))
        .collect();

    let mut count = 0;
    for (i, (a_start, a_end)) in windows.iter().enumerate() {
        for (b_start, b_end) in &windows[i + 1..] {
            let a_before_b = a_end.map(|e| e <= *b_start).unwrap_or(false);
            let b_before_a = b_end.map(|e| e <= *a_start).unwrap_or(false);
            if !a_before_b && !b_before_a {
                count += 1;
            }
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Page;
    use crate::snapshot::compile_page;
    use chrono::TimeZone;

    fn t(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
    }

    fn snapshots(n: usize) -> Vec<Snapshot> {
        let page = Page::new("p1", "s1", "Home", "homepage").with_url("/");
        (0..n)
            .map(|i| {
                let mut s = compile_page(&page, &[], t(1));
                s.id = format!("s{}", i + 1);
                s
            })
            .collect()
    }

    #[test]
    fn test_activation_closes_previous_window() {
        let mut history = snapshots(2);
        activate(&mut history, "s1", t(1)).unwrap();
        activate(&mut history, "s2", t(2)).unwrap();

        assert_eq!(history[0].publication_date_start, Some(t(1)));
        assert_eq!(history[0].publication_date_end, Some(t(2)));
        assert!(history[1].is_active());
        assert_eq!(history[1].publication_date_start, Some(t(2)));
        assert_eq!(overlapping_pairs(&history), 0);
    }

    #[test]
    fn test_activation_before_current_start_is_rejected() {
        let mut history = snapshots(2);
        activate(&mut history, "s1", t(5)).unwrap();
        let err = activate(&mut history, "s2", t(3)).unwrap_err();
        assert!(matches!(err, CmsError::WindowConflict { .. }));
        assert!(history[0].is_active());
        assert!(!history[1].was_published());
    }

    #[test]
    fn test_reactivating_open_snapshot_is_noop() {
        let mut history = snapshots(1);
        activate(&mut history, "s1", t(1)).unwrap();
        activate(&mut history, "s1", t(4)).unwrap();
        assert_eq!(history[0].publication_date_start, Some(t(1)));
    }

    #[test]
    fn test_unknown_snapshot() {
        let mut history = snapshots(1);
        assert!(matches!(
            activate(&mut history, "missing", t(1)),
            Err(CmsError::SnapshotNotFound { .. })
        ));
    }
}
