//! Resource assignment for a tour operator's back office.
//!
//! A [`Roster`] holds tours, the guide/driver/vehicle pools and an
//! assignment log. On top of it sit three steps:
//!
//! - the availability filter ([`available_guides`], [`available_drivers`],
//!   [`available_vehicles`]) lists resources that are active and free on a day;
//! - the validator ([`validate_candidate`]) explains why a resource does or
//!   does not suit a tour;
//! - the reducers ([`assign`], [`unassign`]) bind and release roles, keeping
//!   the tour status and version in step with the bindings.
//!
//! [`AssignmentService`] chains the steps over a [`TourStore`] and reports
//! every outcome as an [`Envelope`].

#![forbid(unsafe_code)]

mod assignment;
mod availability;
mod booking_index;
mod envelope;
mod error;
mod event;
mod resource;
mod roster;
mod service;
pub mod store;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
mod tour;
mod validation;

pub use assignment::{assign, assign_checked, require_selection, unassign, unassign_checked};
pub use availability::{
    Candidate, available_candidates, available_drivers, available_for_tour, available_guides,
    available_resources, available_vehicles, conflicting_tour,
};
pub use booking_index::BookingIndex;
pub use envelope::Envelope;
pub use error::{AssignmentError, ErrorClass};
pub use event::{AssignmentAction, AssignmentEvent};
pub use resource::{Driver, Guide, ParseResourceKindError, Resource, ResourceId, ResourceKind, Vehicle};
pub use roster::{Roster, RosterSnapshot};
pub use service::{
    AssignGuideOptions, AssignmentService, DriverAssignment, ServiceError, VehicleAssignment,
};
pub use store::{MemoryTourStore, StoreError, TourStore};
#[cfg(feature = "store-sqlite")]
pub use store::SqliteTourStore;
pub use tour::{AssignmentStatus, Bindings, Tour, TourId};
pub use validation::{
    ValidationOptions, ValidationOutcome, validate_candidate, validate_driver, validate_guide,
    validate_vehicle,
};
