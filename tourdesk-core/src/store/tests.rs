//! Unit tests for the in-memory store.

use super::*;
use crate::test_support::{at, sample_roster};
use crate::{ResourceKind, TourId, assign};
use rstest::{fixture, rstest};

#[fixture]
fn store() -> MemoryTourStore {
    MemoryTourStore::new(sample_roster())
}

#[rstest]
fn save_replaces_tour_and_appends_events(store: MemoryTourStore) {
    let mut roster = store.load_roster().expect("load roster");
    let tour = assign(
        &mut roster,
        TourId::new(7),
        ResourceKind::Guide,
        "g1".into(),
        at(),
    )
    .expect("tour 7 exists");
    store
        .save_tour(&tour, 0, roster.events())
        .expect("save fresh tour");

    let stored = store.snapshot().expect("snapshot");
    assert_eq!(stored.tour(TourId::new(7)), Some(&tour));
    assert_eq!(stored.events(), roster.events());
}

#[rstest]
fn stale_save_is_rejected(store: MemoryTourStore) {
    let mut tour = store
        .snapshot()
        .expect("snapshot")
        .tour(TourId::new(5))
        .cloned()
        .expect("tour 5");
    tour.version = 1;
    store.save_tour(&tour, 0, &[]).expect("first write");
    let err = store.save_tour(&tour, 0, &[]).expect_err("second write is stale");
    assert!(matches!(
        err,
        StoreError::VersionConflict {
            expected: 0,
            found: 1,
            ..
        }
    ));
}

#[rstest]
fn saving_unknown_tour_fails(store: MemoryTourStore) {
    let tour = crate::Tour::new(TourId::new(99), "Ghost", crate::test_support::day(2024, 6, 1));
    let err = store.save_tour(&tour, 0, &[]).expect_err("tour not on file");
    assert!(matches!(err, StoreError::TourNotFound { .. }));
}

#[cfg(feature = "serde")]
#[rstest]
fn json_snapshot_round_trips(store: MemoryTourStore) {
    let mut buffer = Vec::new();
    store.to_writer(&mut buffer).expect("write snapshot");
    let reloaded = MemoryTourStore::from_reader(buffer.as_slice()).expect("read snapshot");
    assert_eq!(
        reloaded.into_inner().expect("unpoisoned"),
        store.into_inner().expect("unpoisoned")
    );
}

#[cfg(feature = "serde")]
#[rstest]
fn snapshot_json_uses_flat_binding_fields() {
    let json = r#"{
        "tours": [{
            "id": 1, "name": "Walk", "date": "2024-06-01",
            "assigned_guide": "g1", "assigned_driver": null
        }],
        "guides": [{ "id": "g1", "name": "Ana" }]
    }"#;
    let store = MemoryTourStore::from_reader(json.as_bytes()).expect("parse snapshot");
    let roster = store.snapshot().expect("snapshot");
    let tour = roster.tour(TourId::new(1)).expect("tour 1");
    assert_eq!(tour.binding(ResourceKind::Guide).map(|id| id.as_str()), Some("g1"));
    assert!(roster.guide(&"g1".into()).is_some_and(|guide| guide.active));
}

#[cfg(feature = "serde")]
#[rstest]
fn malformed_snapshot_is_a_json_error() {
    let err = MemoryTourStore::from_reader("{ not json".as_bytes()).expect_err("bad JSON");
    assert!(matches!(err, StoreError::Json(_)));
}

#[cfg(feature = "serde")]
#[rstest]
fn duplicate_tour_ids_are_refused_on_load() {
    let json = r#"{
        "tours": [
            { "id": 1, "name": "A", "date": "2024-06-01", "assigned_guide": "g1" },
            { "id": 1, "name": "B", "date": "2024-06-01" }
        ],
        "guides": [{ "id": "g1", "name": "Ana" }]
    }"#;
    let err = MemoryTourStore::from_reader(json.as_bytes()).expect_err("tour 1 is listed twice");
    assert!(matches!(err, StoreError::Json(_)));
    assert!(
        err.to_string().contains("invalid tours row 1: duplicate id"),
        "unexpected message: {err}"
    );
}
