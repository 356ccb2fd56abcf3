//! Persistence boundary for rosters and assignment writes.
//!
//! The service layer reads a whole [`Roster`] snapshot, decides, then writes
//! back one tour together with the events that changed it. Writes are
//! compare-and-set on the tour version so two desks working from the same
//! snapshot cannot silently overwrite each other.
//!
//! - [`memory`] keeps the roster in a mutex and loads/saves JSON snapshots.
//! - `sqlite` (feature `store-sqlite`) persists everything in one database.

use std::path::PathBuf;

use thiserror::Error;

use crate::{AssignmentEvent, Roster, Tour, TourId};

pub mod memory;
#[cfg(feature = "store-sqlite")]
mod schema;
#[cfg(feature = "store-sqlite")]
pub mod sqlite;

pub use memory::MemoryTourStore;
#[cfg(feature = "store-sqlite")]
pub use schema::{SCHEMA_VERSION, SchemaError, initialise_schema};
#[cfg(feature = "store-sqlite")]
pub use sqlite::SqliteTourStore;

/// Storage for tours, resource pools and the assignment log.
///
/// Implementations must be safe to share between threads; each call is
/// atomic on its own.
pub trait TourStore: Send + Sync {
    /// Read a consistent snapshot of everything on file.
    fn load_roster(&self) -> Result<Roster, StoreError>;

    /// Replace `tour`'s record and append `events`, if the stored tour is
    /// still at `expected_version`.
    ///
    /// Fails with [`StoreError::VersionConflict`] when another write got
    /// there first; nothing is written in that case.
    fn save_tour(
        &self,
        tour: &Tour,
        expected_version: u64,
        events: &[AssignmentEvent],
    ) -> Result<(), StoreError>;
}

/// Errors raised by [`TourStore`] implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing a snapshot file failed.
    #[error("failed to access {path}: {source}")]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A JSON snapshot could not be parsed or written.
    #[cfg(feature = "serde")]
    #[error("invalid roster snapshot: {0}")]
    Json(#[from] serde_json::Error),
    /// Opening the SQLite database failed.
    #[cfg(feature = "store-sqlite")]
    #[error("failed to open SQLite database at {path}: {source}")]
    OpenDatabase {
        /// Location of the database on disk.
        path: PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Creating or checking the schema failed.
    #[cfg(feature = "store-sqlite")]
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// A query failed.
    #[cfg(feature = "store-sqlite")]
    #[error("failed to {operation}: {source}")]
    Sqlite {
        /// What the store was doing.
        operation: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// A stored row could not be turned back into a record.
    #[error("invalid {table} row {key}: {detail}")]
    InvalidRecord {
        /// Table or collection holding the row.
        table: &'static str,
        /// Row key.
        key: String,
        /// What was wrong with it.
        detail: String,
    },
    /// The tour to save is not on file.
    #[error("tour {tour_id} not found in store")]
    TourNotFound {
        /// Requested tour.
        tour_id: TourId,
    },
    /// The stored tour moved on since the caller's snapshot.
    #[error("tour {tour_id} was modified concurrently: expected version {expected}, found {found}")]
    VersionConflict {
        /// Tour being saved.
        tour_id: TourId,
        /// Version the caller read.
        expected: u64,
        /// Version on file.
        found: u64,
    },
    /// A thread panicked while holding the store lock.
    #[error("store lock poisoned")]
    Poisoned,
}

#[cfg(test)]
mod tests;
