//! Staff and fleet records that can be bound to a tour.
//!
//! Guides, drivers and vehicles share the [`Resource`] trait so the
//! availability filter can treat every pool the same way.

use std::{borrow::Borrow, collections::BTreeSet, fmt, str::FromStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a guide, driver or vehicle.
///
/// # Examples
/// ```
/// use tourdesk_core::ResourceId;
///
/// let id = ResourceId::new("g1");
/// assert_eq!(id.as_str(), "g1");
/// assert!(!id.is_blank());
/// assert!(ResourceId::new("  ").is_blank());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct ResourceId(String);

impl ResourceId {
    /// Wrap a raw identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is empty once whitespace is ignored.
    ///
    /// A blank identifier means the caller never picked a resource.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ResourceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ResourceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ResourceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Role a resource fills on a tour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum ResourceKind {
    /// Tour guide.
    Guide,
    /// Coach driver.
    Driver,
    /// Coach or minibus.
    Vehicle,
}

impl ResourceKind {
    /// Every role a complete tour needs, in display order.
    pub const ALL: [Self; 3] = [Self::Guide, Self::Driver, Self::Vehicle];

    /// Lower-case name used on the command line and in storage.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Guide => "guide",
            Self::Driver => "driver",
            Self::Vehicle => "vehicle",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown [`ResourceKind`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown resource kind {value:?}; expected guide, driver or vehicle")]
pub struct ParseResourceKindError {
    /// The rejected input.
    pub value: String,
}

impl FromStr for ResourceKind {
    type Err = ParseResourceKindError;

    /// Parse a kind, ignoring ASCII case.
    ///
    /// # Examples
    /// ```
    /// use tourdesk_core::ResourceKind;
    ///
    /// assert_eq!("Driver".parse(), Ok(ResourceKind::Driver));
    /// assert!("bus".parse::<ResourceKind>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseResourceKindError {
                value: s.to_owned(),
            })
    }
}

/// Common view over guides, drivers and vehicles.
pub trait Resource {
    /// Role this resource type fills.
    const KIND: ResourceKind;

    /// Stable identifier.
    fn id(&self) -> &ResourceId;

    /// Role of this record; always [`Self::KIND`].
    fn kind(&self) -> ResourceKind {
        Self::KIND
    }

    /// Human-readable label for listings.
    fn display_name(&self) -> &str;

    /// Inactive records stay on file but are never offered.
    fn is_active(&self) -> bool;
}

#[cfg(feature = "serde")]
const fn default_active() -> bool {
    true
}

/// A tour guide.
///
/// # Examples
/// ```
/// use tourdesk_core::{Guide, Resource};
///
/// let guide = Guide::new("g1", "Ana")
///     .with_language("es")
///     .with_competence("museum");
/// assert!(guide.speaks("es"));
/// assert!(guide.has_competence("museum"));
/// assert!(guide.is_active());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Guide {
    /// Identifier.
    pub id: ResourceId,
    /// Full name.
    pub name: String,
    /// Languages the guide can lead a tour in.
    #[cfg_attr(feature = "serde", serde(default))]
    pub languages: BTreeSet<String>,
    /// Specialties and certifications.
    #[cfg_attr(feature = "serde", serde(default))]
    pub competences: BTreeSet<String>,
    /// Whether the guide is currently working.
    #[cfg_attr(feature = "serde", serde(default = "default_active"))]
    pub active: bool,
}

impl Guide {
    /// Create an active guide with no languages or competences.
    pub fn new(id: impl Into<ResourceId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            languages: BTreeSet::new(),
            competences: BTreeSet::new(),
            active: true,
        }
    }

    /// Add a spoken language.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.languages.insert(language.into());
        self
    }

    /// Add a competence.
    #[must_use]
    pub fn with_competence(mut self, competence: impl Into<String>) -> Self {
        self.competences.insert(competence.into());
        self
    }

    /// Mark the guide inactive.
    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Whether the guide speaks `language`, ignoring ASCII case.
    pub fn speaks(&self, language: &str) -> bool {
        self.languages
            .iter()
            .any(|known| known.eq_ignore_ascii_case(language))
    }

    /// Whether the guide holds `competence`, ignoring ASCII case.
    pub fn has_competence(&self, competence: &str) -> bool {
        self.competences
            .iter()
            .any(|held| held.eq_ignore_ascii_case(competence))
    }
}

impl Resource for Guide {
    const KIND: ResourceKind = ResourceKind::Guide;

    fn id(&self) -> &ResourceId {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

/// A coach driver.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Driver {
    /// Identifier.
    pub id: ResourceId,
    /// Full name.
    pub name: String,
    /// Driving licence categories held, e.g. `D1` or `D`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub licence_categories: BTreeSet<String>,
    /// Whether the driver is currently working.
    #[cfg_attr(feature = "serde", serde(default = "default_active"))]
    pub active: bool,
}

impl Driver {
    /// Create an active driver without licence categories.
    pub fn new(id: impl Into<ResourceId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            licence_categories: BTreeSet::new(),
            active: true,
        }
    }

    /// Add a licence category.
    #[must_use]
    pub fn with_licence(mut self, category: impl Into<String>) -> Self {
        self.licence_categories.insert(category.into());
        self
    }

    /// Mark the driver inactive.
    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Whether the driver holds `category`, ignoring ASCII case.
    pub fn holds_licence(&self, category: &str) -> bool {
        self.licence_categories
            .iter()
            .any(|held| held.eq_ignore_ascii_case(category))
    }
}

impl Resource for Driver {
    const KIND: ResourceKind = ResourceKind::Driver;

    fn id(&self) -> &ResourceId {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

/// A coach or minibus.
///
/// # Examples
/// ```
/// use tourdesk_core::Vehicle;
///
/// let coach = Vehicle::new("v2", "AB-123-CD", 20).with_required_licence("D");
/// assert!(coach.seats(15));
/// assert!(!coach.seats(21));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vehicle {
    /// Identifier.
    pub id: ResourceId,
    /// Registration plate.
    pub plate: String,
    /// Make and model, free text.
    #[cfg_attr(feature = "serde", serde(default))]
    pub model: String,
    /// Passenger seats.
    pub capacity: u32,
    /// Licence category a driver needs for this vehicle, if any.
    #[cfg_attr(feature = "serde", serde(default))]
    pub required_licence: Option<String>,
    /// Whether the vehicle is in service.
    #[cfg_attr(feature = "serde", serde(default = "default_active"))]
    pub active: bool,
}

impl Vehicle {
    /// Create an in-service vehicle with the given seat count.
    pub fn new(id: impl Into<ResourceId>, plate: impl Into<String>, capacity: u32) -> Self {
        Self {
            id: id.into(),
            plate: plate.into(),
            model: String::new(),
            capacity,
            required_licence: None,
            active: true,
        }
    }

    /// Set the make and model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Require drivers to hold a licence category.
    #[must_use]
    pub fn with_required_licence(mut self, category: impl Into<String>) -> Self {
        self.required_licence = Some(category.into());
        self
    }

    /// Take the vehicle out of service.
    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Whether the vehicle has room for `passengers`.
    pub const fn seats(&self, passengers: u32) -> bool {
        self.capacity >= passengers
    }
}

impl Resource for Vehicle {
    const KIND: ResourceKind = ResourceKind::Vehicle;

    fn id(&self) -> &ResourceId {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.plate
    }

    fn is_active(&self) -> bool {
        self.active
    }
}
