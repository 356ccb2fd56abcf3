//! Store-backed operations returning `{ success, data | error }` envelopes.
//!
//! Each write follows the same path: reject blank selections, load a
//! snapshot, check the tour and the requested date, check every selected
//! resource exists, is active and is free that day, apply the bindings to the
//! snapshot, validate the result, then save with the snapshot's tour version.
//! A concurrent write in between surfaces as a conflict, never as a silent
//! overwrite.

use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, warn};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    AssignmentError, Candidate, Driver, Envelope, ErrorClass, Guide, ResourceId, ResourceKind,
    Roster, StoreError, Tour, TourId, TourStore, ValidationOptions, ValidationOutcome, Vehicle,
    assign, available_candidates, available_drivers, available_guides, available_vehicles,
    conflicting_tour, require_selection, unassign, validate_candidate, validate_vehicle,
};

/// Options for [`AssignmentService::assign_guide_to_tour`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AssignGuideOptions {
    /// Check competences and language before binding.
    #[cfg_attr(feature = "serde", serde(default))]
    pub validate_competences: bool,
}

impl From<AssignGuideOptions> for ValidationOptions {
    fn from(options: AssignGuideOptions) -> Self {
        Self {
            validate_competences: options.validate_competences,
        }
    }
}

/// Payload for [`AssignmentService::assign_driver`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DriverAssignment {
    /// Tour to staff.
    pub tour_id: TourId,
    /// Day the caller believes the tour runs.
    pub date: NaiveDate,
    /// Vehicle to bind in the same write, if any.
    #[cfg_attr(feature = "serde", serde(default))]
    pub vehicle_id: Option<ResourceId>,
}

/// Payload for [`AssignmentService::assign_vehicle`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VehicleAssignment {
    /// Tour to staff.
    pub tour_id: TourId,
    /// Day the caller believes the tour runs.
    pub date: NaiveDate,
    /// Passengers to seat; the larger of this and the group size applies.
    #[cfg_attr(feature = "serde", serde(default))]
    pub passengers: u32,
    /// Driver to bind in the same write, if any.
    #[cfg_attr(feature = "serde", serde(default))]
    pub driver_id: Option<ResourceId>,
}

/// Failure of a service call.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request was refused by the assignment rules.
    #[error(transparent)]
    Assignment(#[from] AssignmentError),
    /// The store could not be read or written.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    /// Broad class of the failure.
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Assignment(err) => err.class(),
            Self::Store(StoreError::TourNotFound { .. }) => ErrorClass::NotFound,
            Self::Store(StoreError::VersionConflict { .. }) => ErrorClass::Conflict,
            Self::Store(_) => ErrorClass::Storage,
        }
    }
}

/// One resource to bind as part of a write.
#[derive(Debug, Clone)]
struct Selection {
    kind: ResourceKind,
    resource_id: ResourceId,
}

impl Selection {
    fn new(kind: ResourceKind, resource_id: &ResourceId) -> Self {
        Self {
            kind,
            resource_id: resource_id.clone(),
        }
    }
}

#[derive(Debug)]
struct WriteRequest {
    tour_id: TourId,
    date: Option<NaiveDate>,
    selections: Vec<Selection>,
    options: ValidationOptions,
    passengers: u32,
}

/// Assignment flow on top of a [`TourStore`].
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use tourdesk_core::{
///     AssignGuideOptions, AssignmentService, AssignmentStatus, Guide, MemoryTourStore, Roster,
///     Tour, TourId,
/// };
///
/// let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
/// let roster = Roster::new()
///     .with_guide(Guide::new("g1", "Ana"))
///     .with_tour(Tour::new(TourId::new(5), "Walk", day));
/// let service = AssignmentService::new(MemoryTourStore::new(roster));
///
/// let reply = service.assign_guide_to_tour(TourId::new(5), &"g1".into(), AssignGuideOptions::default());
/// assert!(reply.success);
/// assert_eq!(reply.data.map(|tour| tour.status()), Some(AssignmentStatus::Pending));
///
/// let again = service.assign_guide_to_tour(TourId::new(9), &"g1".into(), AssignGuideOptions::default());
/// assert_eq!(again.error.as_deref(), Some("tour 9 not found"));
/// ```
#[derive(Debug)]
pub struct AssignmentService<S> {
    store: S,
    clock: fn() -> DateTime<Utc>,
}

impl<S: TourStore> AssignmentService<S> {
    /// Wrap a store, stamping events with the system clock.
    pub fn new(store: S) -> Self {
        Self {
            store,
            clock: Utc::now,
        }
    }

    /// Replace the clock used to stamp events.
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Borrow the underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Give the underlying store back.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Every tour on file, ordered by id.
    pub fn load_tours(&self) -> Envelope<Vec<Tour>> {
        reply("load tours", self.try_load_tours())
    }

    /// Fallible form of [`Self::load_tours`].
    pub fn try_load_tours(&self) -> Result<Vec<Tour>, ServiceError> {
        let roster = self.store.load_roster()?;
        Ok(roster.tours().cloned().collect())
    }

    /// Bind a guide to a tour.
    pub fn assign_guide_to_tour(
        &self,
        tour_id: TourId,
        guide_id: &ResourceId,
        options: AssignGuideOptions,
    ) -> Envelope<Tour> {
        reply(
            "assign guide",
            self.try_assign(tour_id, ResourceKind::Guide, guide_id, options.into()),
        )
    }

    /// Clear one role of a tour.
    pub fn remove_assignment(&self, tour_id: TourId, kind: ResourceKind) -> Envelope<Tour> {
        reply("remove assignment", self.try_unassign(tour_id, kind))
    }

    /// Guides free for `tour_id`, which must run on `date`.
    pub fn available_guides_for_tour(
        &self,
        tour_id: TourId,
        date: NaiveDate,
    ) -> Envelope<Vec<Guide>> {
        reply(
            "list available guides",
            self.try_available_guides_for_tour(tour_id, date),
        )
    }

    /// Fallible form of [`Self::available_guides_for_tour`].
    pub fn try_available_guides_for_tour(
        &self,
        tour_id: TourId,
        date: NaiveDate,
    ) -> Result<Vec<Guide>, ServiceError> {
        let roster = self.store.load_roster()?;
        let tour = resolve_tour(&roster, tour_id, Some(date))?;
        Ok(available_guides(&roster, tour.date, Some(tour_id))
            .into_iter()
            .cloned()
            .collect())
    }

    /// Drivers free on `date`.
    pub fn available_drivers(&self, date: NaiveDate) -> Envelope<Vec<Driver>> {
        reply("list available drivers", self.try_available_drivers(date))
    }

    /// Fallible form of [`Self::available_drivers`].
    pub fn try_available_drivers(&self, date: NaiveDate) -> Result<Vec<Driver>, ServiceError> {
        let roster = self.store.load_roster()?;
        Ok(available_drivers(&roster, date, None)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Bind a driver, and optionally a vehicle, to a tour in one write.
    pub fn assign_driver(
        &self,
        driver_id: &ResourceId,
        assignment: &DriverAssignment,
    ) -> Envelope<Tour> {
        reply("assign driver", self.try_assign_driver(driver_id, assignment))
    }

    /// Fallible form of [`Self::assign_driver`].
    pub fn try_assign_driver(
        &self,
        driver_id: &ResourceId,
        assignment: &DriverAssignment,
    ) -> Result<Tour, ServiceError> {
        let mut selections = vec![Selection::new(ResourceKind::Driver, driver_id)];
        if let Some(vehicle_id) = &assignment.vehicle_id {
            selections.push(Selection::new(ResourceKind::Vehicle, vehicle_id));
        }
        self.write(WriteRequest {
            tour_id: assignment.tour_id,
            date: Some(assignment.date),
            selections,
            options: ValidationOptions::default(),
            passengers: 0,
        })
    }

    /// Vehicles free on `date` seating at least `required_capacity`.
    pub fn available_vehicles(
        &self,
        date: NaiveDate,
        required_capacity: u32,
    ) -> Envelope<Vec<Vehicle>> {
        reply(
            "list available vehicles",
            self.try_available_vehicles(date, required_capacity),
        )
    }

    /// Fallible form of [`Self::available_vehicles`].
    pub fn try_available_vehicles(
        &self,
        date: NaiveDate,
        required_capacity: u32,
    ) -> Result<Vec<Vehicle>, ServiceError> {
        let roster = self.store.load_roster()?;
        Ok(available_vehicles(&roster, date, required_capacity, None)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Bind a vehicle, and optionally a driver, to a tour in one write.
    pub fn assign_vehicle(
        &self,
        vehicle_id: &ResourceId,
        assignment: &VehicleAssignment,
    ) -> Envelope<Tour> {
        reply("assign vehicle", self.try_assign_vehicle(vehicle_id, assignment))
    }

    /// Fallible form of [`Self::assign_vehicle`].
    pub fn try_assign_vehicle(
        &self,
        vehicle_id: &ResourceId,
        assignment: &VehicleAssignment,
    ) -> Result<Tour, ServiceError> {
        let mut selections = vec![Selection::new(ResourceKind::Vehicle, vehicle_id)];
        if let Some(driver_id) = &assignment.driver_id {
            selections.push(Selection::new(ResourceKind::Driver, driver_id));
        }
        self.write(WriteRequest {
            tour_id: assignment.tour_id,
            date: Some(assignment.date),
            selections,
            options: ValidationOptions::default(),
            passengers: assignment.passengers,
        })
    }

    /// Free resources of any role on `date`.
    ///
    /// With `tour_id`, the tour's own bindings are ignored and the date must
    /// match the tour.
    pub fn try_available(
        &self,
        kind: ResourceKind,
        date: NaiveDate,
        required_capacity: u32,
        tour_id: Option<TourId>,
    ) -> Result<Vec<Candidate>, ServiceError> {
        let roster = self.store.load_roster()?;
        if let Some(tour_id) = tour_id {
            resolve_tour(&roster, tour_id, Some(date))?;
        }
        Ok(available_candidates(
            &roster,
            kind,
            date,
            required_capacity,
            tour_id,
        ))
    }

    /// Ask the validator about a candidate without binding it.
    pub fn try_validate(
        &self,
        tour_id: TourId,
        kind: ResourceKind,
        resource_id: &ResourceId,
        options: ValidationOptions,
    ) -> Result<ValidationOutcome, ServiceError> {
        require_selection(kind, resource_id)?;
        let roster = self.store.load_roster()?;
        Ok(validate_candidate(
            &roster,
            tour_id,
            kind,
            resource_id,
            options,
        )?)
    }

    /// Bind any role, with the same checks as the role-specific calls.
    pub fn try_assign(
        &self,
        tour_id: TourId,
        kind: ResourceKind,
        resource_id: &ResourceId,
        options: ValidationOptions,
    ) -> Result<Tour, ServiceError> {
        self.write(WriteRequest {
            tour_id,
            date: None,
            selections: vec![Selection::new(kind, resource_id)],
            options,
            passengers: 0,
        })
    }

    /// Clear one role, saving only when something was bound.
    pub fn try_unassign(&self, tour_id: TourId, kind: ResourceKind) -> Result<Tour, ServiceError> {
        let mut roster = self.store.load_roster()?;
        let expected_version = resolve_tour(&roster, tour_id, None)?.version;
        let logged = roster.events().len();
        let tour = unassign(&mut roster, tour_id, kind, (self.clock)())?;
        let events = roster.events().get(logged..).unwrap_or_default();
        if !events.is_empty() {
            self.store.save_tour(&tour, expected_version, events)?;
        }
        Ok(tour)
    }

    fn write(&self, request: WriteRequest) -> Result<Tour, ServiceError> {
        for selection in &request.selections {
            require_selection(selection.kind, &selection.resource_id)?;
        }
        let mut roster = self.store.load_roster()?;
        let current = resolve_tour(&roster, request.tour_id, request.date)?;
        let (date, expected_version) = (current.date, current.version);

        for selection in &request.selections {
            check_free(&roster, request.tour_id, date, selection)?;
        }

        let logged = roster.events().len();
        let at = (self.clock)();
        let mut staged = None;
        for selection in &request.selections {
            staged = Some(assign(
                &mut roster,
                request.tour_id,
                selection.kind,
                selection.resource_id.clone(),
                at,
            )?);
        }
        let Some(tour) = staged else {
            return Err(AssignmentError::TourNotFound {
                tour_id: request.tour_id,
            }
            .into());
        };

        for selection in &request.selections {
            check_suitable(&roster, &tour, selection, &request)?;
        }

        let events = roster.events().get(logged..).unwrap_or_default();
        self.store.save_tour(&tour, expected_version, events)?;
        debug!(
            "saved tour {} at version {} with {} event(s)",
            tour.id,
            tour.version,
            events.len()
        );
        Ok(tour)
    }
}

fn resolve_tour(
    roster: &Roster,
    tour_id: TourId,
    date: Option<NaiveDate>,
) -> Result<&Tour, AssignmentError> {
    let tour = roster
        .tour(tour_id)
        .ok_or(AssignmentError::TourNotFound { tour_id })?;
    match date {
        Some(requested) if requested != tour.date => Err(AssignmentError::DateMismatch {
            tour_id,
            expected: tour.date,
            requested,
        }),
        _ => Ok(tour),
    }
}

fn check_free(
    roster: &Roster,
    tour_id: TourId,
    date: NaiveDate,
    selection: &Selection,
) -> Result<(), AssignmentError> {
    let Selection { kind, resource_id } = selection;
    match roster.is_active(*kind, resource_id) {
        None => {
            return Err(AssignmentError::ResourceNotFound {
                kind: *kind,
                resource_id: resource_id.clone(),
            });
        }
        Some(false) => {
            return Err(AssignmentError::Inactive {
                kind: *kind,
                resource_id: resource_id.clone(),
            });
        }
        Some(true) => {}
    }
    match conflicting_tour(roster, *kind, resource_id, date, Some(tour_id)) {
        Some(other) => Err(AssignmentError::Unavailable {
            kind: *kind,
            resource_id: resource_id.clone(),
            date,
            conflicting_tour: other,
        }),
        None => Ok(()),
    }
}

// Runs against the staged roster so companion pairs are checked together.
fn check_suitable(
    roster: &Roster,
    tour: &Tour,
    selection: &Selection,
    request: &WriteRequest,
) -> Result<(), AssignmentError> {
    let Selection { kind, resource_id } = selection;
    let outcome = if *kind == ResourceKind::Vehicle {
        let vehicle = roster
            .vehicle(resource_id)
            .ok_or_else(|| AssignmentError::ResourceNotFound {
                kind: *kind,
                resource_id: resource_id.clone(),
            })?;
        let mut sized = tour.clone();
        sized.group_size = sized.group_size.max(request.passengers);
        let driver = tour
            .binding(ResourceKind::Driver)
            .and_then(|id| roster.driver(id));
        validate_vehicle(vehicle, &sized, driver)
    } else {
        validate_candidate(roster, tour.id, *kind, resource_id, request.options)?
    };
    outcome.into_result(*kind, resource_id)
}

fn reply<T>(operation: &str, result: Result<T, ServiceError>) -> Envelope<T> {
    if let Err(err) = &result {
        warn!("{operation} failed: {err}");
    }
    result.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{at, day, sample_roster};
    use crate::{AssignmentStatus, MemoryTourStore};
    use rstest::{fixture, rstest};

    type Service = AssignmentService<MemoryTourStore>;

    #[fixture]
    fn service() -> Service {
        AssignmentService::new(MemoryTourStore::new(sample_roster())).with_clock(at)
    }

    fn tour_on_file(service: &Service, id: u64) -> Tour {
        service
            .store()
            .snapshot()
            .expect("snapshot")
            .tour(TourId::new(id))
            .cloned()
            .expect("tour on file")
    }

    #[rstest]
    fn staffing_tour_five_completes_it(service: Service) {
        let tour_id = TourId::new(5);
        let reply =
            service.assign_guide_to_tour(tour_id, &"g1".into(), AssignGuideOptions::default());
        assert_eq!(
            reply.data.map(|tour| tour.status()),
            Some(AssignmentStatus::Pending)
        );

        let reply = service.assign_driver(
            &"d1".into(),
            &DriverAssignment {
                tour_id,
                date: day(2024, 6, 1),
                vehicle_id: Some("v2".into()),
            },
        );
        assert!(reply.success, "{:?}", reply.error);
        let saved = tour_on_file(&service, 5);
        assert_eq!(saved.status(), AssignmentStatus::Complete);
        assert_eq!(saved.version, 3);
        assert_eq!(service.store().snapshot().expect("snapshot").events().len(), 3);
    }

    #[rstest]
    fn date_mismatch_is_rejected_before_writing(service: Service) {
        let reply = service.assign_driver(
            &"d1".into(),
            &DriverAssignment {
                tour_id: TourId::new(5),
                date: day(2024, 6, 2),
                vehicle_id: None,
            },
        );
        assert!(!reply.success);
        assert_eq!(
            reply.error.as_deref(),
            Some("tour 5 runs on 2024-06-01, not 2024-06-02")
        );
        assert_eq!(tour_on_file(&service, 5).version, 0);
    }

    #[rstest]
    fn busy_driver_is_a_conflict(service: Service) {
        let err = service
            .try_assign_driver(
                &"d2".into(),
                &DriverAssignment {
                    tour_id: TourId::new(5),
                    date: day(2024, 6, 1),
                    vehicle_id: None,
                },
            )
            .expect_err("d2 drives tour 6");
        assert_eq!(err.class(), ErrorClass::Conflict);
        assert_eq!(
            err.to_string(),
            "driver d2 is not available on 2024-06-01: already assigned to tour 6"
        );
    }

    #[rstest]
    fn passengers_raise_the_capacity_requirement(service: Service) {
        let err = service
            .try_assign_vehicle(
                &"v1".into(),
                &VehicleAssignment {
                    tour_id: TourId::new(5),
                    date: day(2024, 6, 1),
                    passengers: 12,
                    driver_id: None,
                },
            )
            .expect_err("v1 seats 10");
        assert!(matches!(
            err,
            ServiceError::Assignment(AssignmentError::Rejected { .. })
        ));
        assert_eq!(tour_on_file(&service, 5).binding(ResourceKind::Vehicle), None);
    }

    #[rstest]
    fn companion_licence_is_checked_in_the_same_write(service: Service) {
        let err = service
            .try_assign_vehicle(
                &"v2".into(),
                &VehicleAssignment {
                    tour_id: TourId::new(5),
                    date: day(2024, 6, 1),
                    passengers: 0,
                    driver_id: Some("d3".into()),
                },
            )
            .expect_err("d3 lacks a D licence");
        assert_eq!(err.class(), ErrorClass::Validation);
        let saved = tour_on_file(&service, 5);
        assert_eq!(saved.binding(ResourceKind::Vehicle), None);
        assert_eq!(saved.binding(ResourceKind::Driver), None);
    }

    #[rstest]
    #[case("", ErrorClass::Validation)]
    #[case("ghost", ErrorClass::NotFound)]
    #[case("g9", ErrorClass::Validation)]
    fn guide_failures_are_classified(
        service: Service,
        #[case] guide: &str,
        #[case] expected: ErrorClass,
    ) {
        let err = service
            .try_assign(
                TourId::new(5),
                ResourceKind::Guide,
                &guide.into(),
                ValidationOptions::default(),
            )
            .expect_err("assignment refused");
        assert_eq!(err.class(), expected);
    }

    #[rstest]
    fn competence_check_names_the_gap(service: Service) {
        let reply = service.assign_guide_to_tour(
            TourId::new(7),
            &"g2".into(),
            AssignGuideOptions {
                validate_competences: true,
            },
        );
        assert_eq!(
            reply.error.as_deref(),
            Some("guide g2 does not meet the tour requirements: missing competence wine")
        );
    }

    #[rstest]
    fn removing_an_empty_role_saves_nothing(service: Service) {
        let reply = service.remove_assignment(TourId::new(5), ResourceKind::Guide);
        assert!(reply.success);
        assert!(service.store().snapshot().expect("snapshot").events().is_empty());
    }

    #[rstest]
    fn removing_a_role_reopens_the_tour(service: Service) {
        let reply = service.remove_assignment(TourId::new(6), ResourceKind::Driver);
        let tour = reply.data.expect("tour 6 exists");
        assert_eq!(tour.status(), AssignmentStatus::Pending);
        assert_eq!(tour_on_file(&service, 6).binding(ResourceKind::Driver), None);
    }

    #[rstest]
    fn listings_respect_bookings(service: Service) {
        let drivers = service.available_drivers(day(2024, 6, 1)).data.expect("drivers");
        let ids: Vec<_> = drivers.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["d1", "d3"]);

        let guides = service
            .available_guides_for_tour(TourId::new(5), day(2024, 6, 1))
            .data
            .expect("guides");
        assert!(guides.iter().all(|g| g.id.as_str() != "g2"));

        let vehicles = service
            .available_vehicles(day(2024, 6, 1), 15)
            .data
            .expect("vehicles");
        let ids: Vec<_> = vehicles.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["v2"]);
    }

    #[rstest]
    fn stale_snapshot_loses_the_race() {
        struct Racing {
            inner: MemoryTourStore,
        }

        impl TourStore for Racing {
            fn load_roster(&self) -> Result<Roster, StoreError> {
                let roster = self.inner.load_roster()?;
                // Another desk writes tour 5 right after our read.
                let mut tour = roster.tour(TourId::new(5)).cloned().ok_or(StoreError::Poisoned)?;
                let current = tour.version;
                tour.version += 1;
                self.inner.save_tour(&tour, current, &[])?;
                Ok(roster)
            }

            fn save_tour(
                &self,
                tour: &Tour,
                expected_version: u64,
                events: &[crate::AssignmentEvent],
            ) -> Result<(), StoreError> {
                self.inner.save_tour(tour, expected_version, events)
            }
        }

        let service = AssignmentService::new(Racing {
            inner: MemoryTourStore::new(sample_roster()),
        });
        let err = service
            .try_assign(
                TourId::new(5),
                ResourceKind::Guide,
                &"g1".into(),
                ValidationOptions::default(),
            )
            .expect_err("write raced");
        assert_eq!(err.class(), ErrorClass::Conflict);
    }
}
