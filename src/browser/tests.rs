use super::*;
use crate::catalog::{CatalogStore, Record, RecordFields, RecordId, SqliteBackend};

fn store_with(titles: &[&str]) -> (CatalogStore, Vec<Record>) {
    let store = CatalogStore::open(Box::new(SqliteBackend::open_in_memory().unwrap())).unwrap();
    let records = titles
        .iter()
        .map(|t| {
            store
                .create(RecordFields {
                    title: (*t).into(),
                    artist: "Artist".into(),
                    ..RecordFields::default()
                })
                .unwrap()
        })
        .collect();
    (store, records)
}

fn browser(store: &CatalogStore) -> Browser {
    let mut b = Browser::new(3, 5);
    assert!(b.refresh(store));
    b
}

#[test]
fn empty_catalog_has_no_focus() {
    let (store, _) = store_with(&[]);
    let mut b = browser(&store);
    assert!(b.is_empty());
    assert_eq!(b.focus(), None);
    assert!(b.focused().is_none());
    b.next();
    b.prev();
    assert_eq!(b.focus(), None);
    assert!(!b.begin_open());
    assert_eq!(b.tick(), None);
}

#[test]
fn first_refresh_focuses_first_record() {
    let (store, records) = store_with(&["A", "B"]);
    let b = browser(&store);
    assert_eq!(b.focus(), Some(0));
    assert_eq!(b.focused().map(|r| r.id), Some(records[0].id));
}

#[test]
fn refresh_only_rereads_on_new_revision() {
    let (store, _) = store_with(&["A"]);
    let mut b = browser(&store);
    assert!(!b.refresh(&store));
    store
        .create(RecordFields {
            title: "B".into(),
            artist: "Artist".into(),
            ..RecordFields::default()
        })
        .unwrap();
    assert!(b.is_stale(&store));
    assert!(b.refresh(&store));
    assert_eq!(b.records().len(), 2);
}

#[test]
fn next_and_prev_are_clamped() {
    let (store, _) = store_with(&["A", "B", "C"]);
    let mut b = browser(&store);
    b.prev();
    assert_eq!(b.focus(), Some(0));
    b.next();
    b.next();
    b.next();
    assert_eq!(b.focus(), Some(2));
    b.prev();
    assert_eq!(b.focus(), Some(1));
}

#[test]
fn deleting_focused_record_keeps_the_index() {
    let (store, records) = store_with(&["A", "B", "C"]);
    let mut b = browser(&store);
    b.next();
    assert_eq!(b.focus(), Some(1));

    store.delete(records[1].id).unwrap();
    b.refresh(&store);
    assert_eq!(b.records().len(), 2);
    assert_eq!(b.focus(), Some(1));
    assert_eq!(b.focused().map(|r| r.id), Some(records[2].id));
}

#[test]
fn deleting_last_focused_record_moves_to_new_last() {
    let (store, records) = store_with(&["A", "B", "C"]);
    let mut b = browser(&store);
    b.next();
    b.next();

    store.delete(records[2].id).unwrap();
    b.refresh(&store);
    assert_eq!(b.focus(), Some(1));
    assert_eq!(b.focused().map(|r| r.id), Some(records[1].id));
}

#[test]
fn deleting_everything_clears_focus() {
    let (store, records) = store_with(&["A"]);
    let mut b = browser(&store);
    store.delete(records[0].id).unwrap();
    b.refresh(&store);
    assert_eq!(b.focus(), None);
}

#[test]
fn focus_follows_record_when_others_change() {
    let (store, records) = store_with(&["A", "B", "C"]);
    let mut b = browser(&store);
    b.next();
    b.next();

    store.delete(records[0].id).unwrap();
    b.refresh(&store);
    assert_eq!(b.focus(), Some(1));
    assert_eq!(b.focused().map(|r| r.id), Some(records[2].id));
}

#[test]
fn focus_record_jumps_to_known_ids_only() {
    let (store, records) = store_with(&["A", "B", "C"]);
    let mut b = browser(&store);
    assert!(b.focus_record(records[2].id));
    assert_eq!(b.focus(), Some(2));
    assert!(!b.focus_record(RecordId::new()));
    assert_eq!(b.focus(), Some(2));
}

#[test]
fn open_navigates_exactly_once_after_spin() {
    let (store, records) = store_with(&["A", "B"]);
    let mut b = browser(&store);
    b.next();

    assert!(b.begin_open_for(3));
    assert!(!b.begin_open_for(3));
    assert_eq!(b.tick(), None);
    assert_eq!(b.tick(), None);
    assert_eq!(b.spin().map(|s| s.frame), Some(2));
    assert_eq!(b.tick(), Some(Navigation::Detail(records[1].id)));
    assert_eq!(b.tick(), None);
    assert!(b.spin().is_none());
}

#[test]
fn focus_is_frozen_while_spinning() {
    let (store, _) = store_with(&["A", "B"]);
    let mut b = browser(&store);
    b.begin_open_for(2);
    b.next();
    assert_eq!(b.focus(), Some(0));
    b.cancel_open();
    b.next();
    assert_eq!(b.focus(), Some(1));
}

#[test]
fn random_spin_length_stays_in_bounds() {
    let (store, _) = store_with(&["A"]);
    let mut b = browser(&store);
    for _ in 0..20 {
        assert!(b.begin_open());
        let total = b.spin().map(|s| s.total).unwrap();
        assert!((3..=5).contains(&total));
        b.cancel_open();
    }
}

#[test]
fn spin_is_cancelled_when_its_record_is_deleted() {
    let (store, records) = store_with(&["A", "B"]);
    let mut b = browser(&store);
    b.begin_open_for(5);
    store.delete(records[0].id).unwrap();
    b.refresh(&store);
    assert!(b.spin().is_none());
    assert_eq!(b.tick(), None);
}
