//! Reducers that bind and release tour roles.
//!
//! Every change bumps the tour version and appends one [`AssignmentEvent`].
//! The reducers trust their caller: resource existence, availability and
//! suitability are checked beforehand by the service layer.

use chrono::{DateTime, Utc};
use log::info;

use crate::{
    AssignmentAction, AssignmentError, AssignmentEvent, ResourceId, ResourceKind, Roster, Tour,
    TourId,
};

/// Reject a blank selection before anything else runs.
///
/// # Examples
/// ```
/// use tourdesk_core::{AssignmentError, ResourceId, ResourceKind, require_selection};
///
/// assert!(require_selection(ResourceKind::Guide, &ResourceId::new("g1")).is_ok());
/// assert_eq!(
///     require_selection(ResourceKind::Driver, &ResourceId::new(" ")),
///     Err(AssignmentError::MissingSelection { kind: ResourceKind::Driver }),
/// );
/// ```
pub fn require_selection(kind: ResourceKind, resource_id: &ResourceId) -> Result<(), AssignmentError> {
    if resource_id.is_blank() {
        Err(AssignmentError::MissingSelection { kind })
    } else {
        Ok(())
    }
}

/// Bind `resource_id` to the `kind` role of a tour.
///
/// Replaces any previous binding; the event records what was replaced.
///
/// # Examples
/// ```
/// use chrono::{NaiveDate, Utc};
/// use tourdesk_core::{AssignmentStatus, ResourceKind, Roster, Tour, TourId, assign};
///
/// let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
/// let mut roster = Roster::new().with_tour(Tour::new(TourId::new(5), "Walk", day));
///
/// let tour = assign(&mut roster, TourId::new(5), ResourceKind::Guide, "g1".into(), Utc::now())?;
/// assert_eq!(tour.status(), AssignmentStatus::Pending);
/// assert_eq!(tour.version, 1);
/// assert_eq!(roster.events().len(), 1);
/// # Ok::<(), tourdesk_core::AssignmentError>(())
/// ```
pub fn assign(
    roster: &mut Roster,
    tour_id: TourId,
    kind: ResourceKind,
    resource_id: ResourceId,
    at: DateTime<Utc>,
) -> Result<Tour, AssignmentError> {
    require_selection(kind, &resource_id)?;
    let tour = roster
        .tour_mut(tour_id)
        .ok_or(AssignmentError::TourNotFound { tour_id })?;
    let version = next_version(tour)?;
    let replaced = tour.bindings.set(kind, Some(resource_id.clone()));
    let action = AssignmentAction::Assigned {
        resource_id,
        replaced,
    };
    let (snapshot, event) = stamp(tour, version, kind, action, at);
    roster.push_event(event);
    Ok(snapshot)
}

/// [`assign`], but only if the tour is still at `expected_version`.
pub fn assign_checked(
    roster: &mut Roster,
    expected_version: u64,
    tour_id: TourId,
    kind: ResourceKind,
    resource_id: ResourceId,
    at: DateTime<Utc>,
) -> Result<Tour, AssignmentError> {
    check_version(roster, tour_id, expected_version)?;
    assign(roster, tour_id, kind, resource_id, at)
}

/// Clear the `kind` role of a tour.
///
/// Clearing an empty role returns the tour untouched and records nothing.
pub fn unassign(
    roster: &mut Roster,
    tour_id: TourId,
    kind: ResourceKind,
    at: DateTime<Utc>,
) -> Result<Tour, AssignmentError> {
    let tour = roster
        .tour_mut(tour_id)
        .ok_or(AssignmentError::TourNotFound { tour_id })?;
    if tour.binding(kind).is_none() {
        return Ok(tour.clone());
    }
    let version = next_version(tour)?;
    let Some(resource_id) = tour.bindings.set(kind, None) else {
        return Ok(tour.clone());
    };
    let action = AssignmentAction::Unassigned { resource_id };
    let (snapshot, event) = stamp(tour, version, kind, action, at);
    roster.push_event(event);
    Ok(snapshot)
}

/// [`unassign`], but only if the tour is still at `expected_version`.
pub fn unassign_checked(
    roster: &mut Roster,
    expected_version: u64,
    tour_id: TourId,
    kind: ResourceKind,
    at: DateTime<Utc>,
) -> Result<Tour, AssignmentError> {
    check_version(roster, tour_id, expected_version)?;
    unassign(roster, tour_id, kind, at)
}

fn check_version(roster: &Roster, tour_id: TourId, expected: u64) -> Result<(), AssignmentError> {
    let found = roster
        .tour(tour_id)
        .ok_or(AssignmentError::TourNotFound { tour_id })?
        .version;
    if found == expected {
        Ok(())
    } else {
        Err(AssignmentError::StaleVersion {
            tour_id,
            expected,
            found,
        })
    }
}

fn next_version(tour: &Tour) -> Result<u64, AssignmentError> {
    tour.version
        .checked_add(1)
        .ok_or(AssignmentError::VersionExhausted {
            tour_id: tour.id,
            version: tour.version,
        })
}

// The binding change is already applied to `tour`.
fn stamp(
    tour: &mut Tour,
    version: u64,
    kind: ResourceKind,
    action: AssignmentAction,
    at: DateTime<Utc>,
) -> (Tour, AssignmentEvent) {
    tour.version = version;
    info!(
        "tour {}: {kind} {} {}, now {} (v{})",
        tour.id,
        action.resource_id(),
        action.label(),
        tour.status(),
        tour.version
    );
    let event = AssignmentEvent {
        tour_id: tour.id,
        kind,
        action,
        at,
        status: tour.status(),
        version: tour.version,
    };
    (tour.clone(), event)
}
