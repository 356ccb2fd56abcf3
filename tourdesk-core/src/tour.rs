//! Scheduled tours and their guide/driver/vehicle bindings.

use std::{collections::BTreeSet, fmt, num::ParseIntError, str::FromStr};

use chrono::{NaiveDate, NaiveTime};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{ResourceId, ResourceKind};

/// Identifier of a tour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct TourId(u64);

impl TourId {
    /// Wrap a raw identifier.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Return the raw identifier.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TourId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TourId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl FromStr for TourId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Staffing state of a tour.
///
/// `Pending --(assign last missing role)--> Complete` and
/// `Complete --(unassign any role)--> Pending`. Nothing else moves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum AssignmentStatus {
    /// At least one role is still open.
    Pending,
    /// Guide, driver and vehicle are all bound.
    Complete,
}

impl AssignmentStatus {
    /// Lower-case name used in storage and output.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three role slots of a tour.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bindings {
    /// Bound guide.
    #[cfg_attr(feature = "serde", serde(default))]
    pub assigned_guide: Option<ResourceId>,
    /// Bound driver.
    #[cfg_attr(feature = "serde", serde(default))]
    pub assigned_driver: Option<ResourceId>,
    /// Bound vehicle.
    #[cfg_attr(feature = "serde", serde(default))]
    pub assigned_vehicle: Option<ResourceId>,
}

impl Bindings {
    /// Resource bound to `kind`, if any.
    pub const fn get(&self, kind: ResourceKind) -> Option<&ResourceId> {
        match kind {
            ResourceKind::Guide => self.assigned_guide.as_ref(),
            ResourceKind::Driver => self.assigned_driver.as_ref(),
            ResourceKind::Vehicle => self.assigned_vehicle.as_ref(),
        }
    }

    /// Replace the slot for `kind`, returning what was there.
    pub fn set(&mut self, kind: ResourceKind, value: Option<ResourceId>) -> Option<ResourceId> {
        let slot = match kind {
            ResourceKind::Guide => &mut self.assigned_guide,
            ResourceKind::Driver => &mut self.assigned_driver,
            ResourceKind::Vehicle => &mut self.assigned_vehicle,
        };
        std::mem::replace(slot, value)
    }

    /// Whether every role is filled.
    pub const fn is_complete(&self) -> bool {
        self.assigned_guide.is_some()
            && self.assigned_driver.is_some()
            && self.assigned_vehicle.is_some()
    }

    /// Roles that are still open, in [`ResourceKind::ALL`] order.
    pub fn missing(&self) -> Vec<ResourceKind> {
        ResourceKind::ALL
            .into_iter()
            .filter(|kind| self.get(*kind).is_none())
            .collect()
    }
}

/// A scheduled excursion needing a guide, a driver and a vehicle.
///
/// The status is derived from the bindings on every call, so it cannot
/// drift from them.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use tourdesk_core::{AssignmentStatus, ResourceKind, Tour, TourId};
///
/// let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
/// let tour = Tour::new(TourId::new(5), "Old town walk", date)
///     .with_group_size(15)
///     .with_binding(ResourceKind::Guide, "g1");
///
/// assert_eq!(tour.status(), AssignmentStatus::Pending);
/// assert_eq!(tour.binding(ResourceKind::Guide).map(|id| id.as_str()), Some("g1"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Tour {
    /// Identifier.
    pub id: TourId,
    /// Display name.
    pub name: String,
    /// Booking code shown to agencies.
    #[cfg_attr(feature = "serde", serde(default))]
    pub code: String,
    /// Day the tour runs.
    pub date: NaiveDate,
    /// Departure time, when known.
    #[cfg_attr(feature = "serde", serde(default))]
    pub start_time: Option<NaiveTime>,
    /// Planned length in minutes.
    #[cfg_attr(feature = "serde", serde(default))]
    pub duration_minutes: u32,
    /// Passengers the vehicle must seat.
    #[cfg_attr(feature = "serde", serde(default))]
    pub group_size: u32,
    /// Tour category, e.g. `city` or `wine`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub category: String,
    /// Language the guide must speak, when the client asked for one.
    #[cfg_attr(feature = "serde", serde(default))]
    pub language: Option<String>,
    /// Competences the guide must hold.
    #[cfg_attr(feature = "serde", serde(default))]
    pub required_competences: BTreeSet<String>,
    /// Resource bindings.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub bindings: Bindings,
    /// Optimistic-lock counter, bumped on every binding change.
    #[cfg_attr(feature = "serde", serde(default))]
    pub version: u64,
}

impl Tour {
    /// Create an unstaffed tour.
    pub fn new(id: TourId, name: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            id,
            name: name.into(),
            code: String::new(),
            date,
            start_time: None,
            duration_minutes: 0,
            group_size: 0,
            category: String::new(),
            language: None,
            required_competences: BTreeSet::new(),
            bindings: Bindings::default(),
            version: 0,
        }
    }

    /// Set the booking code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    /// Set the departure time.
    #[must_use]
    pub const fn with_start_time(mut self, start: NaiveTime) -> Self {
        self.start_time = Some(start);
        self
    }

    /// Set the planned length.
    #[must_use]
    pub const fn with_duration_minutes(mut self, minutes: u32) -> Self {
        self.duration_minutes = minutes;
        self
    }

    /// Set the number of passengers.
    #[must_use]
    pub const fn with_group_size(mut self, passengers: u32) -> Self {
        self.group_size = passengers;
        self
    }

    /// Set the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Require the guide to speak `language`.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Require the guide to hold `competence`.
    #[must_use]
    pub fn with_required_competence(mut self, competence: impl Into<String>) -> Self {
        self.required_competences.insert(competence.into());
        self
    }

    /// Pre-bind a resource, e.g. when loading fixtures.
    #[must_use]
    pub fn with_binding(mut self, kind: ResourceKind, id: impl Into<ResourceId>) -> Self {
        self.bindings.set(kind, Some(id.into()));
        self
    }

    /// Resource bound to `kind`, if any.
    pub const fn binding(&self, kind: ResourceKind) -> Option<&ResourceId> {
        self.bindings.get(kind)
    }

    /// Whether guide, driver and vehicle are all bound.
    pub const fn is_complete(&self) -> bool {
        self.bindings.is_complete()
    }

    /// Current staffing state.
    pub const fn status(&self) -> AssignmentStatus {
        if self.is_complete() {
            AssignmentStatus::Complete
        } else {
            AssignmentStatus::Pending
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn tour() -> Tour {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date");
        Tour::new(TourId::new(1), "Harbour cruise", date)
    }

    #[rstest]
    fn new_tour_is_pending_with_every_role_missing(tour: Tour) {
        assert_eq!(tour.status(), AssignmentStatus::Pending);
        assert_eq!(tour.bindings.missing(), ResourceKind::ALL.to_vec());
    }

    #[rstest]
    fn tour_with_all_bindings_is_complete(tour: Tour) {
        let staffed = tour
            .with_binding(ResourceKind::Guide, "g1")
            .with_binding(ResourceKind::Driver, "d1")
            .with_binding(ResourceKind::Vehicle, "v1");
        assert_eq!(staffed.status(), AssignmentStatus::Complete);
        assert!(staffed.bindings.missing().is_empty());
    }

    #[rstest]
    #[case(ResourceKind::Guide)]
    #[case(ResourceKind::Driver)]
    #[case(ResourceKind::Vehicle)]
    fn set_returns_previous_binding(tour: Tour, #[case] kind: ResourceKind) {
        let mut bindings = tour.with_binding(kind, "old").bindings;
        let previous = bindings.set(kind, Some(ResourceId::new("new")));
        assert_eq!(previous, Some(ResourceId::new("old")));
        assert_eq!(bindings.get(kind), Some(&ResourceId::new("new")));
    }

    #[rstest]
    fn tour_id_parses_from_text() {
        assert_eq!(" 42 ".parse::<TourId>(), Ok(TourId::new(42)));
        assert!("forty".parse::<TourId>().is_err());
    }
}
