//! Errors raised by the assignment flow.
//!
//! Every variant maps onto one of three user-facing outcomes: something was
//! not found, a resource is already busy, or the request itself failed
//! validation. None of them is fatal and nothing is retried.

use chrono::NaiveDate;
use thiserror::Error;

use crate::{ResourceId, ResourceKind, TourId};

/// Broad class of an [`AssignmentError`], for callers that only branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// A tour or resource id does not exist.
    NotFound,
    /// The resource is committed elsewhere or the write raced another.
    Conflict,
    /// The request was incomplete or the candidate is unsuitable.
    Validation,
    /// Persistence failed for reasons unrelated to the request.
    Storage,
}

/// Errors returned by the availability, validation and assignment steps.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssignmentError {
    /// No tour with this id is on file.
    #[error("tour {tour_id} not found")]
    TourNotFound {
        /// Requested tour.
        tour_id: TourId,
    },
    /// No resource of this kind and id is on file.
    #[error("{kind} {resource_id} not found")]
    ResourceNotFound {
        /// Requested role.
        kind: ResourceKind,
        /// Requested resource.
        resource_id: ResourceId,
    },
    /// The resource is out of service.
    #[error("{kind} {resource_id} is inactive")]
    Inactive {
        /// Requested role.
        kind: ResourceKind,
        /// Requested resource.
        resource_id: ResourceId,
    },
    /// The resource is bound to another tour that day.
    #[error("{kind} {resource_id} is not available on {date}: already assigned to tour {conflicting_tour}")]
    Unavailable {
        /// Requested role.
        kind: ResourceKind,
        /// Requested resource.
        resource_id: ResourceId,
        /// Day of the requested tour.
        date: NaiveDate,
        /// Tour already holding the resource.
        conflicting_tour: TourId,
    },
    /// No resource was picked before submitting.
    #[error("select a {kind} before assigning")]
    MissingSelection {
        /// Role left empty.
        kind: ResourceKind,
    },
    /// The validator rejected the candidate.
    #[error("{kind} {resource_id} does not meet the tour requirements: {}", .reasons.join("; "))]
    Rejected {
        /// Requested role.
        kind: ResourceKind,
        /// Requested resource.
        resource_id: ResourceId,
        /// Human-readable reasons.
        reasons: Vec<String>,
    },
    /// The request named a different day than the tour runs on.
    #[error("tour {tour_id} runs on {expected}, not {requested}")]
    DateMismatch {
        /// Requested tour.
        tour_id: TourId,
        /// Day the tour runs.
        expected: NaiveDate,
        /// Day in the request.
        requested: NaiveDate,
    },
    /// The tour changed since the caller read it.
    #[error("tour {tour_id} changed concurrently: expected version {expected}, found {found}")]
    StaleVersion {
        /// Requested tour.
        tour_id: TourId,
        /// Version the caller read.
        expected: u64,
        /// Version on file.
        found: u64,
    },
    /// The tour's version counter cannot go any higher.
    #[error("tour {tour_id} cannot record further changes: version {version} is the maximum")]
    VersionExhausted {
        /// Requested tour.
        tour_id: TourId,
        /// Version on file.
        version: u64,
    },
}

impl AssignmentError {
    /// Broad class of the error.
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::TourNotFound { .. } | Self::ResourceNotFound { .. } => ErrorClass::NotFound,
            Self::Unavailable { .. } | Self::StaleVersion { .. } | Self::VersionExhausted { .. } => {
                ErrorClass::Conflict
            }
            Self::Inactive { .. }
            | Self::MissingSelection { .. }
            | Self::Rejected { .. }
            | Self::DateMismatch { .. } => ErrorClass::Validation,
        }
    }
}
