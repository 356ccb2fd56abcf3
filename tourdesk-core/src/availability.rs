//! Availability filter over guide, driver and vehicle pools.
//!
//! A resource is available on a day when it is active and no *other* tour on
//! that day binds it in the same role. Vehicles must also seat the group.
//! Conflicts are checked at whole-day granularity: two tours on the same
//! date always compete for the same resource, whatever their start times.
//! Results keep pool order; nothing is ranked.

use chrono::NaiveDate;
use log::debug;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    AssignmentError, BookingIndex, Driver, Guide, Resource, ResourceId, ResourceKind, Roster,
    TourId, Vehicle,
};

/// Filter `pool` down to resources free on `date`.
///
/// `exclude_tour` names the tour being staffed so its own bindings are not
/// counted as conflicts. An empty result is a normal outcome.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use tourdesk_core::{BookingIndex, Guide, ResourceKind, Tour, TourId, available_resources};
///
/// let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
/// let busy = Tour::new(TourId::new(1), "A", day).with_binding(ResourceKind::Guide, "g1");
/// let index = BookingIndex::from_tours([&busy]);
/// let pool = [Guide::new("g1", "Ana"), Guide::new("g2", "Ben")];
///
/// let free = available_resources(&pool, &index, day, None);
/// assert_eq!(free.len(), 1);
/// assert_eq!(free[0].id.as_str(), "g2");
/// ```
pub fn available_resources<'a, R, I>(
    pool: I,
    bookings: &BookingIndex,
    date: NaiveDate,
    exclude_tour: Option<TourId>,
) -> Vec<&'a R>
where
    R: Resource + 'a,
    I: IntoIterator<Item = &'a R>,
{
    pool.into_iter()
        .filter(|resource| resource.is_active())
        .filter(|resource| !bookings.is_booked(R::KIND, resource.id(), date, exclude_tour))
        .collect()
}

/// Guides free on `date`.
pub fn available_guides(
    roster: &Roster,
    date: NaiveDate,
    exclude_tour: Option<TourId>,
) -> Vec<&Guide> {
    let free = available_resources(roster.guides(), &roster.bookings(), date, exclude_tour);
    debug!("{} guide(s) available on {date}", free.len());
    free
}

/// Drivers free on `date`.
pub fn available_drivers(
    roster: &Roster,
    date: NaiveDate,
    exclude_tour: Option<TourId>,
) -> Vec<&Driver> {
    let free = available_resources(roster.drivers(), &roster.bookings(), date, exclude_tour);
    debug!("{} driver(s) available on {date}", free.len());
    free
}

/// Vehicles free on `date` with at least `required_capacity` seats.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use tourdesk_core::{Roster, Vehicle, available_vehicles};
///
/// let roster = Roster::new()
///     .with_vehicle(Vehicle::new("1", "SMALL", 10))
///     .with_vehicle(Vehicle::new("2", "LARGE", 20));
/// let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
///
/// let ids: Vec<_> = available_vehicles(&roster, day, 15, None)
///     .into_iter()
///     .map(|v| v.id.as_str())
///     .collect();
/// assert_eq!(ids, ["2"]);
/// ```
pub fn available_vehicles(
    roster: &Roster,
    date: NaiveDate,
    required_capacity: u32,
    exclude_tour: Option<TourId>,
) -> Vec<&Vehicle> {
    let seated = roster
        .vehicles()
        .filter(|vehicle| vehicle.seats(required_capacity));
    let free = available_resources(seated, &roster.bookings(), date, exclude_tour);
    debug!(
        "{} vehicle(s) for {required_capacity} passenger(s) available on {date}",
        free.len()
    );
    free
}

/// Tour id already holding `resource_id` on `date`, if any.
pub fn conflicting_tour(
    roster: &Roster,
    kind: ResourceKind,
    resource_id: &ResourceId,
    date: NaiveDate,
    exclude_tour: Option<TourId>,
) -> Option<TourId> {
    roster
        .bookings()
        .conflicting_tour(kind, resource_id, date, exclude_tour)
}

/// Summary row for a free resource, independent of its role.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Candidate {
    /// Role.
    pub kind: ResourceKind,
    /// Identifier.
    pub id: ResourceId,
    /// Name or plate.
    pub name: String,
    /// Seats, for vehicles.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub capacity: Option<u32>,
}

impl Candidate {
    fn of<R: Resource>(resource: &R, capacity: Option<u32>) -> Self {
        Self {
            kind: R::KIND,
            id: resource.id().clone(),
            name: resource.display_name().to_owned(),
            capacity,
        }
    }
}

impl From<&Guide> for Candidate {
    fn from(guide: &Guide) -> Self {
        Self::of(guide, None)
    }
}

impl From<&Driver> for Candidate {
    fn from(driver: &Driver) -> Self {
        Self::of(driver, None)
    }
}

impl From<&Vehicle> for Candidate {
    fn from(vehicle: &Vehicle) -> Self {
        Self::of(vehicle, Some(vehicle.capacity))
    }
}

/// Free resources of `kind` on `date`, as role-independent rows.
///
/// `required_capacity` only applies to vehicles.
pub fn available_candidates(
    roster: &Roster,
    kind: ResourceKind,
    date: NaiveDate,
    required_capacity: u32,
    exclude_tour: Option<TourId>,
) -> Vec<Candidate> {
    match kind {
        ResourceKind::Guide => available_guides(roster, date, exclude_tour)
            .into_iter()
            .map(Candidate::from)
            .collect(),
        ResourceKind::Driver => available_drivers(roster, date, exclude_tour)
            .into_iter()
            .map(Candidate::from)
            .collect(),
        ResourceKind::Vehicle => available_vehicles(roster, date, required_capacity, exclude_tour)
            .into_iter()
            .map(Candidate::from)
            .collect(),
    }
}

/// Free resources of `kind` for a specific tour.
///
/// The tour's own date and group size drive the filter, and its current
/// bindings never count against it.
pub fn available_for_tour(
    roster: &Roster,
    tour_id: TourId,
    kind: ResourceKind,
) -> Result<Vec<Candidate>, AssignmentError> {
    let tour = roster
        .tour(tour_id)
        .ok_or(AssignmentError::TourNotFound { tour_id })?;
    Ok(available_candidates(
        roster,
        kind,
        tour.date,
        tour.group_size,
        Some(tour_id),
    ))
}
