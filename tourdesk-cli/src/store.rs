//! Roster store selection shared by every subcommand.

use std::io::BufReader;

use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
#[cfg(feature = "store-sqlite")]
use tourdesk_core::SqliteTourStore;
use tourdesk_core::{AssignmentEvent, MemoryTourStore, Roster, StoreError, Tour, TourStore};
use tourdesk_fs::{open_utf8_file, replace_file};

use crate::{ARG_DATABASE, ARG_ROSTER, CliError};

/// Where a command reads and writes the roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StoreSource {
    /// JSON snapshot, rewritten after every change.
    Roster(Utf8PathBuf),
    /// SQLite database.
    Database(Utf8PathBuf),
}

impl StoreSource {
    /// Pick the single store named by `--roster` or `--database`.
    pub(crate) fn select(
        command: &'static str,
        roster: Option<Utf8PathBuf>,
        database: Option<Utf8PathBuf>,
    ) -> Result<Self, CliError> {
        match (roster, database) {
            (Some(_), Some(_)) => Err(CliError::ConflictingStore { command }),
            (Some(path), None) => Ok(Self::Roster(path)),
            (None, Some(path)) => Ok(Self::Database(path)),
            (None, None) => Err(CliError::MissingStore { command }),
        }
    }

    pub(crate) fn validate_source(&self) -> Result<(), CliError> {
        match self {
            Self::Roster(path) => require_existing(path, ARG_ROSTER),
            Self::Database(path) => require_existing(path, ARG_DATABASE),
        }
    }

    pub(crate) fn open(&self) -> Result<OpenStore, CliError> {
        match self {
            Self::Roster(path) => {
                let store = read_snapshot(path)?;
                Ok(OpenStore::Snapshot {
                    store,
                    path: path.clone(),
                })
            }
            Self::Database(path) => open_database(path),
        }
    }
}

pub(crate) fn read_snapshot(path: &Utf8Path) -> Result<MemoryTourStore, CliError> {
    let file = open_utf8_file(path).map_err(|source| CliError::OpenRoster {
        path: path.to_path_buf(),
        source,
    })?;
    MemoryTourStore::from_reader(BufReader::new(file)).map_err(|source| CliError::LoadStore {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(feature = "store-sqlite")]
fn open_database(path: &Utf8Path) -> Result<OpenStore, CliError> {
    SqliteTourStore::open(path.as_std_path())
        .map(OpenStore::Database)
        .map_err(|source| CliError::LoadStore {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(not(feature = "store-sqlite"))]
fn open_database(_path: &Utf8Path) -> Result<OpenStore, CliError> {
    Err(CliError::MissingFeature {
        feature: "store-sqlite",
        action: "opening a roster database",
    })
}

pub(crate) fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match tourdesk_fs::file_is_file(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// An opened roster store.
#[derive(Debug)]
pub(crate) enum OpenStore {
    /// Snapshot loaded into memory; see [`OpenStore::flush`].
    Snapshot {
        store: MemoryTourStore,
        path: Utf8PathBuf,
    },
    #[cfg(feature = "store-sqlite")]
    Database(SqliteTourStore),
}

impl OpenStore {
    /// Write a snapshot back to its file. Databases commit on every save.
    pub(crate) fn flush(&self) -> Result<(), CliError> {
        match self {
            Self::Snapshot { store, path } => {
                let mut buffer = Vec::new();
                store
                    .to_writer(&mut buffer)
                    .map_err(|source| CliError::EncodeRoster {
                        path: path.clone(),
                        source,
                    })?;
                buffer.push(b'\n');
                replace_file(path, &buffer).map_err(|source| CliError::WriteRoster {
                    path: path.clone(),
                    source,
                })?;
                debug!("wrote roster snapshot to {path}");
                Ok(())
            }
            #[cfg(feature = "store-sqlite")]
            Self::Database(_) => Ok(()),
        }
    }
}

impl TourStore for OpenStore {
    fn load_roster(&self) -> Result<Roster, StoreError> {
        match self {
            Self::Snapshot { store, .. } => store.load_roster(),
            #[cfg(feature = "store-sqlite")]
            Self::Database(store) => store.load_roster(),
        }
    }

    fn save_tour(
        &self,
        tour: &Tour,
        expected_version: u64,
        events: &[AssignmentEvent],
    ) -> Result<(), StoreError> {
        match self {
            Self::Snapshot { store, .. } => store.save_tour(tour, expected_version, events),
            #[cfg(feature = "store-sqlite")]
            Self::Database(store) => store.save_tour(tour, expected_version, events),
        }
    }
}
