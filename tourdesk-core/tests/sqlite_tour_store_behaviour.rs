//! Behavioural tests for `SqliteTourStore` using rstest-bdd.
#![cfg(feature = "store-sqlite")]

use std::cell::RefCell;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;
use tourdesk_core::{
    AssignGuideOptions, AssignmentService, ResourceId, ResourceKind, Roster, SqliteTourStore,
    StoreError, TourId, TourStore,
    test_support::{at, sample_roster},
};

/// Shared state for SQLite store scenarios.
#[derive(Debug)]
struct StoreWorld {
    temp_dir: TempDir,
    service: RefCell<Option<AssignmentService<SqliteTourStore>>>,
    loaded: RefCell<Option<Roster>>,
    save_error: RefCell<Option<StoreError>>,
}

impl StoreWorld {
    fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("create temp dir"),
            service: RefCell::new(None),
            loaded: RefCell::new(None),
            save_error: RefCell::new(None),
        }
    }

    fn with_store<T>(&self, f: impl FnOnce(&SqliteTourStore) -> T) -> T {
        let borrowed = self.service.borrow();
        let service = borrowed
            .as_ref()
            .expect("store should be opened before use");
        f(service.store())
    }

    fn expect_loaded(&self) -> Roster {
        self.loaded
            .borrow()
            .clone()
            .expect("roster should be loaded")
    }
}

#[fixture]
fn world() -> StoreWorld {
    StoreWorld::new()
}

#[given("a SQLite store seeded with the sample roster")]
fn given_seeded_store(world: &StoreWorld) {
    let path = world.temp_dir.path().join("roster.db");
    let store = SqliteTourStore::open(&path).expect("open SQLite store");
    store
        .import_roster(&sample_roster())
        .expect("import sample roster");
    world
        .service
        .replace(Some(AssignmentService::new(store).with_clock(at)));
}

#[when("the roster is loaded from the SQLite store")]
fn load_roster(world: &StoreWorld) {
    let roster = world.with_store(|store| store.load_roster().expect("load roster"));
    world.loaded.replace(Some(roster));
}

#[when("guide g1 is assigned to tour 5 through the service")]
fn assign_through_service(world: &StoreWorld) {
    let borrowed = world.service.borrow();
    let service = borrowed.as_ref().expect("store should be opened before use");
    let reply = service.assign_guide_to_tour(
        TourId::new(5),
        &ResourceId::new("g1"),
        AssignGuideOptions::default(),
    );
    assert!(reply.success, "assignment failed: {:?}", reply.error);
}

#[when("tour 5 is saved twice from the same snapshot")]
fn save_twice(world: &StoreWorld) {
    world.with_store(|store| {
        let snapshot = store.load_roster().expect("load roster");
        let mut tour = snapshot
            .tour(TourId::new(5))
            .cloned()
            .expect("tour 5 on file");
        tour.version += 1;
        store.save_tour(&tour, 0, &[]).expect("first save");
        let second = store.save_tour(&tour, 0, &[]);
        world.save_error.replace(second.err());
    });
}

#[then("the loaded roster matches the sample roster")]
fn roster_matches(world: &StoreWorld) {
    assert_eq!(world.expect_loaded(), sample_roster());
}

#[then("tour 5 has guide g1 at version 1")]
fn tour_has_guide(world: &StoreWorld) {
    let roster = world.expect_loaded();
    let tour = roster.tour(TourId::new(5)).expect("tour 5 on file");
    assert_eq!(
        tour.binding(ResourceKind::Guide),
        Some(&ResourceId::new("g1"))
    );
    assert_eq!(tour.version, 1);
}

#[then("the stored log holds 1 entry")]
fn stored_log(world: &StoreWorld) {
    let roster = world.expect_loaded();
    let events = roster.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].at, at());
}

#[then("the second save fails with a version conflict")]
fn version_conflict(world: &StoreWorld) {
    let error = world.save_error.borrow();
    assert!(matches!(
        error.as_ref(),
        Some(StoreError::VersionConflict {
            expected: 0,
            found: 1,
            ..
        })
    ));
}

#[scenario(path = "tests/features/sqlite_tour_store.feature", index = 0)]
fn imported_roster_round_trips(world: StoreWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/sqlite_tour_store.feature", index = 1)]
fn service_writes_persist(world: StoreWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/sqlite_tour_store.feature", index = 2)]
fn stale_write_refused(world: StoreWorld) {
    let _ = world;
}
