//! Append-only audit entries for binding changes.

use chrono::{DateTime, Utc};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{AssignmentStatus, ResourceId, ResourceKind, TourId};

/// What happened to a role slot.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(tag = "action", rename_all = "lowercase")
)]
pub enum AssignmentAction {
    /// A resource was bound, possibly replacing another.
    Assigned {
        /// Newly bound resource.
        resource_id: ResourceId,
        /// Resource that held the slot before, if any.
        replaced: Option<ResourceId>,
    },
    /// The slot was cleared.
    Unassigned {
        /// Resource that held the slot.
        resource_id: ResourceId,
    },
}

impl AssignmentAction {
    /// Short label used in storage.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Assigned { .. } => "assigned",
            Self::Unassigned { .. } => "unassigned",
        }
    }

    /// Resource the action concerns.
    pub const fn resource_id(&self) -> &ResourceId {
        match self {
            Self::Assigned { resource_id, .. } | Self::Unassigned { resource_id } => resource_id,
        }
    }
}

/// One recorded change to a tour's bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AssignmentEvent {
    /// Tour whose binding changed.
    pub tour_id: TourId,
    /// Role that changed.
    pub kind: ResourceKind,
    /// The change itself.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub action: AssignmentAction,
    /// When the change was recorded.
    pub at: DateTime<Utc>,
    /// Tour status after the change.
    pub status: AssignmentStatus,
    /// Tour version after the change.
    pub version: u64,
}
