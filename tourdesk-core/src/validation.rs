//! Competence and capacity checks for a candidate resource.
//!
//! Validators never fail and never touch the roster: they answer whether a
//! resource suits a tour and, if not, why. Resolving ids is the caller's job,
//! except in [`validate_candidate`], which reports unknown ids as not-found
//! errors rather than as validation reasons.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{AssignmentError, Driver, Guide, ResourceId, ResourceKind, Roster, Tour, TourId, Vehicle};

/// Switches for the optional checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ValidationOptions {
    /// Check guide competences and language. Off by default.
    #[cfg_attr(feature = "serde", serde(default))]
    pub validate_competences: bool,
}

impl ValidationOptions {
    /// Options with the guide checks switched on.
    pub const fn with_competences() -> Self {
        Self {
            validate_competences: true,
        }
    }
}

/// Verdict of a validator.
///
/// `valid` is true exactly when `reasons` is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ValidationOutcome {
    /// Whether the candidate is acceptable.
    pub valid: bool,
    /// Human-readable reasons for a rejection.
    #[cfg_attr(feature = "serde", serde(default))]
    pub reasons: Vec<String>,
}

impl ValidationOutcome {
    /// An acceptable outcome.
    pub const fn passed() -> Self {
        Self {
            valid: true,
            reasons: Vec::new(),
        }
    }

    fn from_reasons(reasons: Vec<String>) -> Self {
        Self {
            valid: reasons.is_empty(),
            reasons,
        }
    }

    /// Turn a rejection into an [`AssignmentError::Rejected`].
    pub fn into_result(
        self,
        kind: ResourceKind,
        resource_id: &ResourceId,
    ) -> Result<(), AssignmentError> {
        if self.valid {
            Ok(())
        } else {
            Err(AssignmentError::Rejected {
                kind,
                resource_id: resource_id.clone(),
                reasons: self.reasons,
            })
        }
    }
}

/// Check a guide against the tour's category, competences and language.
///
/// A non-empty category counts as a required specialty. Without
/// `validate_competences` every guide passes.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use tourdesk_core::{Guide, Tour, TourId, ValidationOptions, validate_guide};
///
/// let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
/// let tour = Tour::new(TourId::new(1), "Cellar visit", day).with_required_competence("wine");
/// let guide = Guide::new("g1", "Ana");
///
/// assert!(validate_guide(&guide, &tour, ValidationOptions::default()).valid);
/// let strict = validate_guide(&guide, &tour, ValidationOptions::with_competences());
/// assert_eq!(strict.reasons, ["missing competence wine"]);
/// ```
pub fn validate_guide(guide: &Guide, tour: &Tour, options: ValidationOptions) -> ValidationOutcome {
    if !options.validate_competences {
        return ValidationOutcome::passed();
    }
    let category = Some(tour.category.as_str()).filter(|category| !category.trim().is_empty());
    let listed = tour
        .required_competences
        .iter()
        .map(String::as_str)
        .filter(|competence| category.is_none_or(|c| !c.eq_ignore_ascii_case(competence)));
    let mut reasons: Vec<String> = category
        .into_iter()
        .chain(listed)
        .filter(|competence| !guide.has_competence(competence))
        .map(|competence| format!("missing competence {competence}"))
        .collect();
    if let Some(language) = tour.language.as_deref()
        && !guide.speaks(language)
    {
        reasons.push(format!("does not speak {language}"));
    }
    ValidationOutcome::from_reasons(reasons)
}

/// Check a vehicle seats the group and suits the driver already bound.
pub fn validate_vehicle(
    vehicle: &Vehicle,
    tour: &Tour,
    bound_driver: Option<&Driver>,
) -> ValidationOutcome {
    let mut reasons = Vec::new();
    if !vehicle.seats(tour.group_size) {
        reasons.push(format!(
            "capacity {} is below group size {}",
            vehicle.capacity, tour.group_size
        ));
    }
    if let (Some(driver), Some(category)) = (bound_driver, vehicle.required_licence.as_deref())
        && !driver.holds_licence(category)
    {
        reasons.push(format!(
            "driver {} lacks licence category {category}",
            driver.id
        ));
    }
    ValidationOutcome::from_reasons(reasons)
}

/// Check a driver holds the licence the bound vehicle needs.
///
/// With no vehicle bound there is nothing to check.
pub fn validate_driver(driver: &Driver, bound_vehicle: Option<&Vehicle>) -> ValidationOutcome {
    let missing = bound_vehicle
        .and_then(|vehicle| vehicle.required_licence.as_deref())
        .filter(|category| !driver.holds_licence(category));
    match missing {
        Some(category) => {
            ValidationOutcome::from_reasons(vec![format!("lacks licence category {category}")])
        }
        None => ValidationOutcome::passed(),
    }
}

/// Resolve `resource_id` and run the matching validator for `tour_id`.
///
/// Companion checks use whatever the tour has bound right now. A bound id
/// that no longer resolves is treated as unbound.
pub fn validate_candidate(
    roster: &Roster,
    tour_id: TourId,
    kind: ResourceKind,
    resource_id: &ResourceId,
    options: ValidationOptions,
) -> Result<ValidationOutcome, AssignmentError> {
    let tour = roster
        .tour(tour_id)
        .ok_or(AssignmentError::TourNotFound { tour_id })?;
    let not_found = || AssignmentError::ResourceNotFound {
        kind,
        resource_id: resource_id.clone(),
    };
    let outcome = match kind {
        ResourceKind::Guide => {
            let guide = roster.guide(resource_id).ok_or_else(not_found)?;
            validate_guide(guide, tour, options)
        }
        ResourceKind::Driver => {
            let driver = roster.driver(resource_id).ok_or_else(not_found)?;
            let vehicle = tour
                .binding(ResourceKind::Vehicle)
                .and_then(|id| roster.vehicle(id));
            validate_driver(driver, vehicle)
        }
        ResourceKind::Vehicle => {
            let vehicle = roster.vehicle(resource_id).ok_or_else(not_found)?;
            let driver = tour
                .binding(ResourceKind::Driver)
                .and_then(|id| roster.driver(id));
            validate_vehicle(vehicle, tour, driver)
        }
    };
    Ok(outcome)
}
