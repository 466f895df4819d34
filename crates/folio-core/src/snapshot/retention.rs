use std::cmp::Ordering;

use crate::model::Snapshot;

/// Ids of the snapshots retention cleanup deletes for one page
///
/// The open snapshot is always kept. Of the rest, the `keep` most recently
/// activated survive (start descending, then id descending; never-activated
/// snapshots sort last).
pub fn select_for_deletion(page_snapshots: &[Snapshot], keep: usize) -> Vec<String> {
    let mut history: Vec<&Snapshot> = page_snapshots.iter().filter(|s| !s.is_active()).collect();
    history.sort_by(|a, b| recency(b, a));
    history
        .into_iter()
        .skip(keep)
        .map(|s| s.id.clone())
        .collect()
}

fn recency(a: &Snapshot, b: &Snapshot) -> Ordering {
    match (a.publication_date_start, b.publication_date_start) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Page;
    use crate::snapshot::{activate, compile_page};
    use chrono::{DateTime, TimeZone, Utc};

    fn t(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap()
    }

    fn published_history(n: usize) -> Vec<Snapshot> {
        let page = Page::new("p1", "s1", "Home", "homepage").with_url("/");
        let mut history: Vec<Snapshot> = (0..n)
            .map(|i| {
                let mut s = compile_page(&page, &[], t(1));
                s.id = format!("s{}", i + 1);
                s
            })
            .collect();
        for i in 0..n {
            let id = history[i].id.clone();
            activate(&mut history, &id, t(i as u32 + 1)).unwrap();
        }
        history
    }

    #[test]
    fn test_keep_zero_preserves_active() {
        let history = published_history(3);
        let deleted = select_for_deletion(&history, 0);
        assert_eq!(deleted.len(), 2);
        assert!(!deleted.contains(&"s3".to_string()));
    }

    #[test]
    fn test_keeps_most_recent_closed() {
        let history = published_history(4);
        let deleted = select_for_deletion(&history, 2);
        assert_eq!(deleted, vec!["s1".to_string()]);
    }

    #[test]
    fn test_nothing_deleted_when_history_is_short() {
        let history = published_history(2);
        assert!(select_for_deletion(&history, 1).is_empty());
    }
}
