#![allow(clippy::unwrap_used, clippy::expect_used)]

use folio_core::cache::Recorder;
use folio_core::{Block, Page, Site};
use proptest::prelude::*;

#[test]
fn test_nested_fragments_bubble_up_to_page() {
    let mut recorder = Recorder::default();
    recorder.add(&Site::new("s1", "Main", "example.com"));
    recorder.add(&Page::new("p1", "s1", "Home", "homepage"));

    recorder.push();
    recorder.add(&Block::new("b1", "p1", "folio.block.text"));
    recorder.push();
    recorder.add(&Block::new("b2", "p1", "folio.block.menu"));
    let innermost = recorder.pop();
    let fragment = recorder.pop();

    assert_eq!(innermost["block"].len(), 1);
    assert_eq!(fragment["block"].len(), 2);
    let page_keys = recorder.get();
    assert_eq!(page_keys["block"].len(), 2);
    assert!(page_keys["site"].contains("s1"));
}

proptest! {
    /// Identifiers are deduplicated per class whatever the insertion order
    #[test]
    fn prop_add_deduplicates(ids in prop::collection::vec("[a-c]{1}", 0..40)) {
        let mut recorder = Recorder::default();
        for id in &ids {
            recorder.add(&Page::new(id.clone(), "s1", "P", id.clone()));
            recorder.add(&Block::new(id.clone(), "p", "folio.block.text"));
        }
        let distinct: std::collections::BTreeSet<_> = ids.iter().cloned().collect();
        let keys = recorder.get();
        if distinct.is_empty() {
            prop_assert!(keys.is_empty());
        } else {
            prop_assert_eq!(&keys["page"], &distinct);
            prop_assert_eq!(&keys["block"], &distinct);
        }

        recorder.reset();
        prop_assert!(recorder.get().is_empty());
    }
}
