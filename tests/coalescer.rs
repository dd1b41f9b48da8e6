// tests/coalescer.rs

use proptest::prelude::*;

use tailwatch::types::{EventKind, WatchHandle};
use tailwatch::watch::Coalescer;

fn kind_strategy() -> impl Strategy<Value = EventKind> {
    prop_oneof![
        Just(EventKind::Modify),
        Just(EventKind::Create),
        Just(EventKind::Delete),
    ]
}

#[test]
fn delete_outranks_create_outranks_modify() {
    let mut c = Coalescer::new();
    let h = WatchHandle(1);

    assert_eq!(c.record(h, EventKind::Modify), EventKind::Modify);
    assert_eq!(c.record(h, EventKind::Create), EventKind::Create);
    assert_eq!(c.record(h, EventKind::Modify), EventKind::Create);
    assert_eq!(c.record(h, EventKind::Delete), EventKind::Delete);
    assert_eq!(c.record(h, EventKind::Create), EventKind::Delete);

    assert_eq!(c.consume(h), Some(EventKind::Delete));
    assert_eq!(c.consume(h), None);
    assert!(c.is_empty());
}

#[test]
fn handles_are_tracked_independently() {
    let mut c = Coalescer::new();
    c.record(WatchHandle(2), EventKind::Modify);
    c.record(WatchHandle(1), EventKind::Delete);

    assert_eq!(c.handles(), vec![WatchHandle(1), WatchHandle(2)]);
    assert_eq!(c.peek(WatchHandle(2)), Some(EventKind::Modify));

    c.clear();
    assert!(c.is_empty());
}

proptest! {
    #[test]
    fn remembered_kind_is_the_highest_priority_seen(
        kinds in proptest::collection::vec(kind_strategy(), 1..50),
    ) {
        let mut c = Coalescer::new();
        let h = WatchHandle(7);
        for kind in &kinds {
            c.record(h, *kind);
        }

        let expected = kinds.iter().copied().max();
        prop_assert_eq!(c.peek(h), expected);
        prop_assert_eq!(c.len(), 1);
        prop_assert_eq!(c.consume(h), expected);
        prop_assert!(c.is_empty());
    }

    #[test]
    fn never_more_than_one_entry_per_handle(
        events in proptest::collection::vec((0u64..5, kind_strategy()), 0..200),
    ) {
        let mut c = Coalescer::new();
        let mut seen = std::collections::BTreeSet::new();
        for (h, kind) in &events {
            c.record(WatchHandle(*h), *kind);
            seen.insert(*h);
        }
        prop_assert_eq!(c.len(), seen.len());
    }
}
