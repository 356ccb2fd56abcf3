//! Explicit application state for the assignment flow.
//!
//! A [`Roster`] holds every tour, every resource pool and the assignment log.
//! The availability filter, validator and reducers all take a roster by
//! reference, so the whole flow runs without a UI or a database.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt::Display;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    AssignmentEvent, BookingIndex, Driver, Guide, Resource, ResourceId, ResourceKind, StoreError,
    Tour, TourId, Vehicle,
};

/// Tours, resource pools and the assignment log.
///
/// Pools are kept ordered by identifier so listings are deterministic.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use tourdesk_core::{Guide, ResourceKind, Roster, Tour, TourId};
///
/// let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
/// let roster = Roster::new()
///     .with_guide(Guide::new("g1", "Ana"))
///     .with_tour(Tour::new(TourId::new(1), "Walk", day));
///
/// assert!(roster.resource_exists(ResourceKind::Guide, &"g1".into()));
/// assert_eq!(roster.tours().count(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "RosterSnapshot", into = "RosterSnapshot")
)]
pub struct Roster {
    tours: BTreeMap<TourId, Tour>,
    guides: BTreeMap<ResourceId, Guide>,
    drivers: BTreeMap<ResourceId, Driver>,
    vehicles: BTreeMap<ResourceId, Vehicle>,
    events: Vec<AssignmentEvent>,
}

impl Roster {
    /// Create an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tour, builder style.
    #[must_use]
    pub fn with_tour(mut self, tour: Tour) -> Self {
        self.insert_tour(tour);
        self
    }

    /// Add a guide, builder style.
    #[must_use]
    pub fn with_guide(mut self, guide: Guide) -> Self {
        self.insert_guide(guide);
        self
    }

    /// Add a driver, builder style.
    #[must_use]
    pub fn with_driver(mut self, driver: Driver) -> Self {
        self.insert_driver(driver);
        self
    }

    /// Add a vehicle, builder style.
    #[must_use]
    pub fn with_vehicle(mut self, vehicle: Vehicle) -> Self {
        self.insert_vehicle(vehicle);
        self
    }

    /// Insert or replace a tour, returning the previous record.
    pub fn insert_tour(&mut self, tour: Tour) -> Option<Tour> {
        self.tours.insert(tour.id, tour)
    }

    /// Insert or replace a guide, returning the previous record.
    pub fn insert_guide(&mut self, guide: Guide) -> Option<Guide> {
        self.guides.insert(guide.id.clone(), guide)
    }

    /// Insert or replace a driver, returning the previous record.
    pub fn insert_driver(&mut self, driver: Driver) -> Option<Driver> {
        self.drivers.insert(driver.id.clone(), driver)
    }

    /// Insert or replace a vehicle, returning the previous record.
    pub fn insert_vehicle(&mut self, vehicle: Vehicle) -> Option<Vehicle> {
        self.vehicles.insert(vehicle.id.clone(), vehicle)
    }

    /// Look up a tour.
    pub fn tour(&self, id: TourId) -> Option<&Tour> {
        self.tours.get(&id)
    }

    pub(crate) fn tour_mut(&mut self, id: TourId) -> Option<&mut Tour> {
        self.tours.get_mut(&id)
    }

    /// Tours ordered by id.
    pub fn tours(&self) -> impl Iterator<Item = &Tour> {
        self.tours.values()
    }

    /// Tours running on `date`, ordered by id.
    pub fn tours_on(&self, date: chrono::NaiveDate) -> impl Iterator<Item = &Tour> {
        self.tours.values().filter(move |tour| tour.date == date)
    }

    /// Look up a guide.
    pub fn guide(&self, id: &ResourceId) -> Option<&Guide> {
        self.guides.get(id)
    }

    /// Look up a driver.
    pub fn driver(&self, id: &ResourceId) -> Option<&Driver> {
        self.drivers.get(id)
    }

    /// Look up a vehicle.
    pub fn vehicle(&self, id: &ResourceId) -> Option<&Vehicle> {
        self.vehicles.get(id)
    }

    /// Guides ordered by id.
    pub fn guides(&self) -> impl Iterator<Item = &Guide> {
        self.guides.values()
    }

    /// Drivers ordered by id.
    pub fn drivers(&self) -> impl Iterator<Item = &Driver> {
        self.drivers.values()
    }

    /// Vehicles ordered by id.
    pub fn vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.values()
    }

    /// Whether a resource of `kind` exists on file.
    pub fn resource_exists(&self, kind: ResourceKind, id: &ResourceId) -> bool {
        self.is_active(kind, id).is_some()
    }

    /// `Some(active)` for a known resource, `None` when it is not on file.
    pub fn is_active(&self, kind: ResourceKind, id: &ResourceId) -> Option<bool> {
        match kind {
            ResourceKind::Guide => self.guide(id).map(Resource::is_active),
            ResourceKind::Driver => self.driver(id).map(Resource::is_active),
            ResourceKind::Vehicle => self.vehicle(id).map(Resource::is_active),
        }
    }

    /// The assignment log in recording order.
    pub fn events(&self) -> &[AssignmentEvent] {
        &self.events
    }

    pub(crate) fn push_event(&mut self, event: AssignmentEvent) {
        self.events.push(event);
    }

    /// Booking calendar built from the current bindings.
    pub fn bookings(&self) -> BookingIndex {
        BookingIndex::from_tours(self.tours.values())
    }
}

/// Flat, serialisable form of a [`Roster`].
///
/// Snapshots list records as arrays, which is how the JSON fixtures used for
/// local development are written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RosterSnapshot {
    /// Tours.
    #[cfg_attr(feature = "serde", serde(default))]
    pub tours: Vec<Tour>,
    /// Guide pool.
    #[cfg_attr(feature = "serde", serde(default))]
    pub guides: Vec<Guide>,
    /// Driver pool.
    #[cfg_attr(feature = "serde", serde(default))]
    pub drivers: Vec<Driver>,
    /// Vehicle pool.
    #[cfg_attr(feature = "serde", serde(default))]
    pub vehicles: Vec<Vehicle>,
    /// Assignment log.
    #[cfg_attr(feature = "serde", serde(default))]
    pub events: Vec<AssignmentEvent>,
}

/// Rejects snapshots that list the same id twice in one collection.
impl TryFrom<RosterSnapshot> for Roster {
    type Error = StoreError;

    fn try_from(snapshot: RosterSnapshot) -> Result<Self, Self::Error> {
        let RosterSnapshot {
            tours,
            guides,
            drivers,
            vehicles,
            events,
        } = snapshot;
        Ok(Self {
            tours: index_by("tours", tours, |tour| tour.id)?,
            guides: index_by("guides", guides, |g| g.id.clone())?,
            drivers: index_by("drivers", drivers, |d| d.id.clone())?,
            vehicles: index_by("vehicles", vehicles, |v| v.id.clone())?,
            events,
        })
    }
}

fn index_by<K, V>(
    table: &'static str,
    records: Vec<V>,
    key: impl Fn(&V) -> K,
) -> Result<BTreeMap<K, V>, StoreError>
where
    K: Ord + Display,
{
    let mut indexed = BTreeMap::new();
    for record in records {
        match indexed.entry(key(&record)) {
            Entry::Occupied(taken) => {
                return Err(StoreError::InvalidRecord {
                    table,
                    key: taken.key().to_string(),
                    detail: "duplicate id".to_owned(),
                });
            }
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
        }
    }
    Ok(indexed)
}

impl From<Roster> for RosterSnapshot {
    fn from(roster: Roster) -> Self {
        Self {
            tours: roster.tours.into_values().collect(),
            guides: roster.guides.into_values().collect(),
            drivers: roster.drivers.into_values().collect(),
            vehicles: roster.vehicles.into_values().collect(),
            events: roster.events,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;

    #[rstest]
    fn later_insert_replaces_record() {
        let mut roster = Roster::new().with_vehicle(Vehicle::new("v1", "OLD", 8));
        let previous = roster.insert_vehicle(Vehicle::new("v1", "NEW", 12));
        assert_eq!(previous.map(|v| v.plate), Some("OLD".to_owned()));
        assert_eq!(
            roster.vehicle(&"v1".into()).map(|v| v.capacity),
            Some(12)
        );
    }

    #[rstest]
    fn inactive_resources_still_exist() {
        let roster = Roster::new().with_driver(Driver::new("d1", "Luis").inactive());
        let id = ResourceId::new("d1");
        assert!(roster.resource_exists(ResourceKind::Driver, &id));
        assert_eq!(roster.is_active(ResourceKind::Driver, &id), Some(false));
        assert_eq!(roster.is_active(ResourceKind::Guide, &id), None);
    }

    #[rstest]
    fn duplicate_resource_ids_are_rejected() {
        let snapshot = RosterSnapshot {
            drivers: vec![Driver::new("d1", "Luis"), Driver::new("d1", "Marta")],
            ..RosterSnapshot::default()
        };
        match Roster::try_from(snapshot) {
            Err(StoreError::InvalidRecord { table, key, .. }) => {
                assert_eq!((table, key.as_str()), ("drivers", "d1"));
            }
            other => panic!("expected InvalidRecord, found {other:?}"),
        }
    }

    #[rstest]
    fn snapshot_conversion_preserves_records() {
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date");
        let roster = Roster::new()
            .with_tour(Tour::new(TourId::new(2), "B", day))
            .with_tour(Tour::new(TourId::new(1), "A", day))
            .with_guide(Guide::new("g1", "Ana"));
        let snapshot = RosterSnapshot::from(roster.clone());
        let ids: Vec<_> = snapshot.tours.iter().map(|tour| tour.id.get()).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(Roster::try_from(snapshot).expect("unique ids"), roster);
    }
}
