//! In-process store used for local development and tests.

use std::sync::{Mutex, MutexGuard};

use log::warn;

use super::{StoreError, TourStore};
use crate::{AssignmentEvent, Roster, Tour};

/// Roster held behind a mutex.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use tourdesk_core::{MemoryTourStore, Roster, Tour, TourId, TourStore};
///
/// let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
/// let store = MemoryTourStore::new(Roster::new().with_tour(Tour::new(TourId::new(1), "Walk", day)));
///
/// let mut tour = store.load_roster()?.tour(TourId::new(1)).cloned().unwrap();
/// tour.version += 1;
/// store.save_tour(&tour, 0, &[])?;
/// assert!(store.save_tour(&tour, 0, &[]).is_err());
/// # Ok::<(), tourdesk_core::StoreError>(())
/// ```
#[derive(Debug, Default)]
pub struct MemoryTourStore {
    roster: Mutex<Roster>,
}

impl MemoryTourStore {
    /// Wrap an existing roster.
    pub const fn new(roster: Roster) -> Self {
        Self {
            roster: Mutex::new(roster),
        }
    }

    /// Load a JSON roster snapshot.
    #[cfg(feature = "serde")]
    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self, StoreError> {
        let roster: Roster = serde_json::from_reader(reader)?;
        Ok(Self::new(roster))
    }

    /// Write the current roster as pretty-printed JSON.
    #[cfg(feature = "serde")]
    pub fn to_writer<W: std::io::Write>(&self, writer: W) -> Result<(), StoreError> {
        let roster = self.lock()?;
        serde_json::to_writer_pretty(writer, &*roster)?;
        Ok(())
    }

    /// Clone of the current roster.
    pub fn snapshot(&self) -> Result<Roster, StoreError> {
        self.lock().map(|roster| roster.clone())
    }

    /// Take the roster back out of the store.
    pub fn into_inner(self) -> Result<Roster, StoreError> {
        self.roster.into_inner().map_err(|_| StoreError::Poisoned)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Roster>, StoreError> {
        self.roster.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl TourStore for MemoryTourStore {
    fn load_roster(&self) -> Result<Roster, StoreError> {
        self.snapshot()
    }

    fn save_tour(
        &self,
        tour: &Tour,
        expected_version: u64,
        events: &[AssignmentEvent],
    ) -> Result<(), StoreError> {
        let mut roster = self.lock()?;
        let found = roster
            .tour(tour.id)
            .ok_or(StoreError::TourNotFound { tour_id: tour.id })?
            .version;
        if found != expected_version {
            warn!(
                "rejected write to tour {}: expected version {expected_version}, found {found}",
                tour.id
            );
            return Err(StoreError::VersionConflict {
                tour_id: tour.id,
                expected: expected_version,
                found,
            });
        }
        roster.insert_tour(tour.clone());
        for event in events {
            roster.push_event(event.clone());
        }
        Ok(())
    }
}
