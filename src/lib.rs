//! Facade crate for the Tourdesk resource assignment engine.
//!
//! This crate re-exports the core domain types and the assignment flow, and
//! exposes the SQLite store behind a feature flag.

#![forbid(unsafe_code)]

pub use tourdesk_core::{
    AssignGuideOptions, AssignmentAction, AssignmentError, AssignmentEvent, AssignmentService,
    AssignmentStatus, Bindings, BookingIndex, Candidate, Driver, DriverAssignment, Envelope,
    ErrorClass, Guide, MemoryTourStore, Resource, ResourceId, ResourceKind, Roster,
    RosterSnapshot, ServiceError, StoreError, Tour, TourId, TourStore, ValidationOptions,
    ValidationOutcome, Vehicle, VehicleAssignment, assign, assign_checked, available_drivers,
    available_for_tour, available_guides, available_vehicles, unassign, unassign_checked,
    validate_candidate,
};

#[cfg(feature = "store-sqlite")]
pub use tourdesk_core::SqliteTourStore;
