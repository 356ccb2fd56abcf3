//! Behavioural tests for the availability filter using rstest-bdd.

use std::cell::RefCell;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tourdesk_core::{
    AssignmentError, Candidate, Guide, ResourceKind, Roster, Tour, TourId, Vehicle,
    available_candidates, available_for_tour,
    test_support::{day, sample_roster},
};

#[derive(Debug, Default)]
struct AvailabilityWorld {
    roster: RefCell<Roster>,
    offered: RefCell<Vec<Candidate>>,
    error: RefCell<Option<AssignmentError>>,
}

impl AvailabilityWorld {
    fn offered_ids(&self) -> Vec<String> {
        self.offered
            .borrow()
            .iter()
            .map(|candidate| candidate.id.to_string())
            .collect()
    }

    fn list_for_tour(&self, tour: u64, kind: ResourceKind) {
        match available_for_tour(&self.roster.borrow(), TourId::new(tour), kind) {
            Ok(offered) => {
                self.offered.replace(offered);
                self.error.replace(None);
            }
            Err(err) => {
                self.offered.replace(Vec::new());
                self.error.replace(Some(err));
            }
        }
    }
}

#[fixture]
fn world() -> AvailabilityWorld {
    AvailabilityWorld::default()
}

#[given("the sample roster")]
fn given_sample_roster(world: &AvailabilityWorld) {
    world.roster.replace(sample_roster());
}

#[given("vehicles with 10 and 20 seats")]
fn given_two_vehicles(world: &AvailabilityWorld) {
    world.roster.replace(
        Roster::new()
            .with_vehicle(Vehicle::new("1", "TEN-SEATS", 10))
            .with_vehicle(Vehicle::new("2", "TWENTY-SEATS", 20)),
    );
}

#[given("guide G booked on tour A on 2024-06-01")]
fn given_guide_booked(world: &AvailabilityWorld) {
    world.roster.replace(
        Roster::new()
            .with_guide(Guide::new("G", "Gia"))
            .with_tour(
                Tour::new(TourId::new(1), "A", day(2024, 6, 1))
                    .with_binding(ResourceKind::Guide, "G"),
            )
            .with_tour(Tour::new(TourId::new(2), "B", day(2024, 6, 1)))
            .with_tour(Tour::new(TourId::new(3), "C", day(2024, 6, 2))),
    );
}

#[when("vehicles for 15 passengers are listed on 2024-06-01")]
fn list_vehicles(world: &AvailabilityWorld) {
    let offered = available_candidates(
        &world.roster.borrow(),
        ResourceKind::Vehicle,
        day(2024, 6, 1),
        15,
        None,
    );
    world.offered.replace(offered);
}

#[when("guides are listed for tour B on 2024-06-01")]
fn list_for_b(world: &AvailabilityWorld) {
    world.list_for_tour(2, ResourceKind::Guide);
}

#[when("guides are listed for tour C on 2024-06-02")]
fn list_for_c(world: &AvailabilityWorld) {
    world.list_for_tour(3, ResourceKind::Guide);
}

#[when("drivers are listed on 2024-06-02")]
fn list_drivers(world: &AvailabilityWorld) {
    let offered = available_candidates(
        &world.roster.borrow(),
        ResourceKind::Driver,
        day(2024, 6, 2),
        0,
        None,
    );
    world.offered.replace(offered);
}

#[when("guides are listed for tour 99")]
fn list_for_unknown(world: &AvailabilityWorld) {
    world.list_for_tour(99, ResourceKind::Guide);
}

#[then("only the 20 seat vehicle is offered")]
fn only_large_vehicle(world: &AvailabilityWorld) {
    assert_eq!(world.offered_ids(), vec!["2"]);
    assert_eq!(world.offered.borrow()[0].capacity, Some(20));
}

#[then("guide G is not offered")]
fn guide_not_offered(world: &AvailabilityWorld) {
    assert!(world.error.borrow().is_none());
    assert!(world.offered_ids().is_empty());
}

#[then("guide G is offered")]
fn guide_offered(world: &AvailabilityWorld) {
    assert!(world.error.borrow().is_none());
    assert_eq!(world.offered_ids(), vec!["G"]);
}

#[then("drivers d1, d2 and d3 are offered")]
fn all_drivers_offered(world: &AvailabilityWorld) {
    assert_eq!(world.offered_ids(), vec!["d1", "d2", "d3"]);
}

#[then("the listing fails because tour 99 is not found")]
fn listing_fails(world: &AvailabilityWorld) {
    assert_eq!(
        *world.error.borrow(),
        Some(AssignmentError::TourNotFound {
            tour_id: TourId::new(99)
        })
    );
}

#[scenario(path = "tests/features/availability.feature", index = 0)]
fn undersized_vehicles(world: AvailabilityWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/availability.feature", index = 1)]
fn booked_guide(world: AvailabilityWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/availability.feature", index = 2)]
fn free_drivers(world: AvailabilityWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/availability.feature", index = 3)]
fn unknown_tour(world: AvailabilityWorld) {
    let _ = world;
}
