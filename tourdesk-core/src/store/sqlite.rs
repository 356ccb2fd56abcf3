//! SQLite-backed roster store.
//!
//! Resource sets (languages, competences, licence categories) are stored as
//! JSON arrays in text columns. Saves run in one transaction guarded by the
//! tour's version column.

use std::{
    collections::BTreeSet,
    fmt,
    path::Path,
    sync::{Mutex, MutexGuard},
};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use log::{debug, warn};
use rusqlite::{Connection, OptionalExtension, Row, Transaction, params};

use super::{StoreError, TourStore, initialise_schema};
use crate::{
    AssignmentAction, AssignmentEvent, AssignmentStatus, Bindings, Driver, Guide, ResourceId,
    ResourceKind, Roster, RosterSnapshot, Tour, TourId, Vehicle,
};

/// Roster store persisted in a single SQLite database.
pub struct SqliteTourStore {
    connection: Mutex<Connection>,
}

impl fmt::Debug for SqliteTourStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteTourStore").finish_non_exhaustive()
    }
}

fn sqlite(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> StoreError {
    move |source| StoreError::Sqlite { operation, source }
}

impl SqliteTourStore {
    /// Open (or create) the database at `path` and ensure the schema exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let connection = Connection::open(path).map_err(|source| StoreError::OpenDatabase {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_connection(connection)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let connection = Connection::open_in_memory().map_err(sqlite("open in-memory database"))?;
        Self::from_connection(connection)
    }

    fn from_connection(mut connection: Connection) -> Result<Self, StoreError> {
        initialise_schema(&mut connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.connection.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Replace everything on file with `roster`.
    ///
    /// Every binding must name a resource in the roster's pools; a dangling
    /// binding fails with [`StoreError::InvalidRecord`] before anything is
    /// written.
    ///
    /// # Examples
    /// ```
    /// use chrono::NaiveDate;
    /// use tourdesk_core::{Guide, Roster, SqliteTourStore, Tour, TourId, TourStore};
    ///
    /// let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    /// let roster = Roster::new()
    ///     .with_guide(Guide::new("g1", "Ana").with_language("en"))
    ///     .with_tour(Tour::new(TourId::new(1), "Walk", day));
    ///
    /// let store = SqliteTourStore::open_in_memory()?;
    /// store.import_roster(&roster)?;
    /// assert_eq!(store.load_roster()?, roster);
    /// # Ok::<(), tourdesk_core::StoreError>(())
    /// ```
    pub fn import_roster(&self, roster: &Roster) -> Result<(), StoreError> {
        check_bindings(roster)?;
        let mut connection = self.lock()?;
        let transaction = connection
            .transaction()
            .map_err(sqlite("begin import transaction"))?;

        for table in ["assignment_events", "tours", "guides", "drivers", "vehicles"] {
            transaction
                .execute(&format!("DELETE FROM {table}"), [])
                .map_err(sqlite("clear table"))?;
        }
        for guide in roster.guides() {
            insert_guide(&transaction, guide)?;
        }
        for driver in roster.drivers() {
            insert_driver(&transaction, driver)?;
        }
        for vehicle in roster.vehicles() {
            insert_vehicle(&transaction, vehicle)?;
        }
        for tour in roster.tours() {
            insert_tour(&transaction, tour)?;
        }
        insert_events(&transaction, roster.events())?;

        transaction
            .commit()
            .map_err(sqlite("commit import transaction"))?;
        debug!(
            "imported {} tour(s) and {} event(s)",
            roster.tours().count(),
            roster.events().len()
        );
        Ok(())
    }
}

// The tour columns reference the resource tables.
fn check_bindings(roster: &Roster) -> Result<(), StoreError> {
    for tour in roster.tours() {
        for kind in ResourceKind::ALL {
            if let Some(id) = tour.binding(kind)
                && !roster.resource_exists(kind, id)
            {
                return Err(StoreError::InvalidRecord {
                    table: "tours",
                    key: tour.id.to_string(),
                    detail: format!("assigned {kind} {id} is not on file"),
                });
            }
        }
    }
    Ok(())
}

impl TourStore for SqliteTourStore {
    fn load_roster(&self) -> Result<Roster, StoreError> {
        let connection = self.lock()?;
        let snapshot = RosterSnapshot {
            tours: load_tours(&connection)?,
            guides: load_guides(&connection)?,
            drivers: load_drivers(&connection)?,
            vehicles: load_vehicles(&connection)?,
            events: load_events(&connection)?,
        };
        Roster::try_from(snapshot)
    }

    fn save_tour(
        &self,
        tour: &Tour,
        expected_version: u64,
        events: &[AssignmentEvent],
    ) -> Result<(), StoreError> {
        let mut connection = self.lock()?;
        let transaction = connection
            .transaction()
            .map_err(sqlite("begin save transaction"))?;

        let found: u64 = transaction
            .query_row(
                "SELECT version FROM tours WHERE id = ?1",
                [tour.id.get()],
                |row| row.get(0),
            )
            .optional()
            .map_err(sqlite("read tour version"))?
            .ok_or(StoreError::TourNotFound { tour_id: tour.id })?;
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

        transaction
            .execute(
                "UPDATE tours SET
                    name = ?2, code = ?3, date = ?4, start_time = ?5,
                    duration_minutes = ?6, group_size = ?7, category = ?8,
                    language = ?9, required_competences = ?10,
                    assigned_guide = ?11, assigned_driver = ?12, assigned_vehicle = ?13,
                    version = ?14
                 WHERE id = ?1 AND version = ?15",
                params![
                    tour.id.get(),
                    tour.name,
                    tour.code,
                    tour.date,
                    tour.start_time,
                    tour.duration_minutes,
                    tour.group_size,
                    tour.category,
                    tour.language,
                    encode_set("tours", tour.id, &tour.required_competences)?,
                    binding(tour, ResourceKind::Guide),
                    binding(tour, ResourceKind::Driver),
                    binding(tour, ResourceKind::Vehicle),
                    tour.version,
                    expected_version,
                ],
            )
            .map_err(sqlite("update tour"))?;
        insert_events(&transaction, events)?;

        transaction
            .commit()
            .map_err(sqlite("commit save transaction"))
    }
}

fn binding(tour: &Tour, kind: ResourceKind) -> Option<&str> {
    tour.binding(kind).map(ResourceId::as_str)
}

fn encode_set(
    table: &'static str,
    key: impl fmt::Display,
    set: &BTreeSet<String>,
) -> Result<String, StoreError> {
    serde_json::to_string(set).map_err(|err| StoreError::InvalidRecord {
        table,
        key: key.to_string(),
        detail: err.to_string(),
    })
}

fn decode_set(
    table: &'static str,
    key: impl fmt::Display,
    json: &str,
) -> Result<BTreeSet<String>, StoreError> {
    serde_json::from_str(json).map_err(|err| StoreError::InvalidRecord {
        table,
        key: key.to_string(),
        detail: err.to_string(),
    })
}

fn insert_guide(transaction: &Transaction<'_>, guide: &Guide) -> Result<(), StoreError> {
    transaction
        .execute(
            "INSERT INTO guides (id, name, languages, competences, active)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                guide.id.as_str(),
                guide.name,
                encode_set("guides", &guide.id, &guide.languages)?,
                encode_set("guides", &guide.id, &guide.competences)?,
                guide.active,
            ],
        )
        .map(|_| ())
        .map_err(sqlite("insert guide"))
}

fn insert_driver(transaction: &Transaction<'_>, driver: &Driver) -> Result<(), StoreError> {
    transaction
        .execute(
            "INSERT INTO drivers (id, name, licence_categories, active) VALUES (?1, ?2, ?3, ?4)",
            params![
                driver.id.as_str(),
                driver.name,
                encode_set("drivers", &driver.id, &driver.licence_categories)?,
                driver.active,
            ],
        )
        .map(|_| ())
        .map_err(sqlite("insert driver"))
}

fn insert_vehicle(transaction: &Transaction<'_>, vehicle: &Vehicle) -> Result<(), StoreError> {
    transaction
        .execute(
            "INSERT INTO vehicles (id, plate, model, capacity, required_licence, active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                vehicle.id.as_str(),
                vehicle.plate,
                vehicle.model,
                vehicle.capacity,
                vehicle.required_licence,
                vehicle.active,
            ],
        )
        .map(|_| ())
        .map_err(sqlite("insert vehicle"))
}

fn insert_tour(transaction: &Transaction<'_>, tour: &Tour) -> Result<(), StoreError> {
    transaction
        .execute(
            "INSERT INTO tours (
                id, name, code, date, start_time, duration_minutes, group_size,
                category, language, required_competences,
                assigned_guide, assigned_driver, assigned_vehicle, version
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                tour.id.get(),
                tour.name,
                tour.code,
                tour.date,
                tour.start_time,
                tour.duration_minutes,
                tour.group_size,
                tour.category,
                tour.language,
                encode_set("tours", tour.id, &tour.required_competences)?,
                binding(tour, ResourceKind::Guide),
                binding(tour, ResourceKind::Driver),
                binding(tour, ResourceKind::Vehicle),
                tour.version,
            ],
        )
        .map(|_| ())
        .map_err(sqlite("insert tour"))
}

fn insert_events(
    transaction: &Transaction<'_>,
    events: &[AssignmentEvent],
) -> Result<(), StoreError> {
    let mut statement = transaction
        .prepare_cached(
            "INSERT INTO assignment_events (
                tour_id, kind, action, resource_id, replaced, at, status, version
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .map_err(sqlite("prepare insert event"))?;
    for event in events {
        let replaced = match &event.action {
            AssignmentAction::Assigned { replaced, .. } => replaced.as_ref().map(ResourceId::as_str),
            AssignmentAction::Unassigned { .. } => None,
        };
        statement
            .execute(params![
                event.tour_id.get(),
                event.kind.as_str(),
                event.action.label(),
                event.action.resource_id().as_str(),
                replaced,
                event.at,
                event.status.as_str(),
                event.version,
            ])
            .map_err(sqlite("insert event"))?;
    }
    Ok(())
}

fn query_all<T, F>(
    connection: &Connection,
    sql: &str,
    operation: &'static str,
    map: F,
) -> Result<Vec<T>, StoreError>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut statement = connection.prepare(sql).map_err(sqlite(operation))?;
    let rows = statement.query_map([], map).map_err(sqlite(operation))?;
    rows.collect::<Result<Vec<_>, _>>().map_err(sqlite(operation))
}

fn load_guides(connection: &Connection) -> Result<Vec<Guide>, StoreError> {
    let rows = query_all(
        connection,
        "SELECT id, name, languages, competences, active FROM guides ORDER BY id",
        "read guides",
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, bool>(4)?,
            ))
        },
    )?;
    rows.into_iter()
        .map(|(id, name, languages, competences, active)| {
            Ok(Guide {
                languages: decode_set("guides", &id, &languages)?,
                competences: decode_set("guides", &id, &competences)?,
                id: ResourceId::new(id),
                name,
                active,
            })
        })
        .collect()
}

fn load_drivers(connection: &Connection) -> Result<Vec<Driver>, StoreError> {
    let rows = query_all(
        connection,
        "SELECT id, name, licence_categories, active FROM drivers ORDER BY id",
        "read drivers",
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, bool>(3)?,
            ))
        },
    )?;
    rows.into_iter()
        .map(|(id, name, licences, active)| {
            Ok(Driver {
                licence_categories: decode_set("drivers", &id, &licences)?,
                id: ResourceId::new(id),
                name,
                active,
            })
        })
        .collect()
}

fn load_vehicles(connection: &Connection) -> Result<Vec<Vehicle>, StoreError> {
    query_all(
        connection,
        "SELECT id, plate, model, capacity, required_licence, active FROM vehicles ORDER BY id",
        "read vehicles",
        |row| {
            Ok(Vehicle {
                id: ResourceId::new(row.get::<_, String>(0)?),
                plate: row.get(1)?,
                model: row.get(2)?,
                capacity: row.get(3)?,
                required_licence: row.get(4)?,
                active: row.get(5)?,
            })
        },
    )
}

struct TourRow {
    tour: Tour,
    required_competences: String,
}

fn load_tours(connection: &Connection) -> Result<Vec<Tour>, StoreError> {
    let rows = query_all(
        connection,
        "SELECT id, name, code, date, start_time, duration_minutes, group_size, category,
                language, required_competences, assigned_guide, assigned_driver,
                assigned_vehicle, version
         FROM tours ORDER BY id",
        "read tours",
        |row| {
            let optional_id =
                |idx: usize| -> rusqlite::Result<Option<ResourceId>> {
                    Ok(row.get::<_, Option<String>>(idx)?.map(ResourceId::new))
                };
            Ok(TourRow {
                tour: Tour {
                    id: TourId::new(row.get(0)?),
                    name: row.get(1)?,
                    code: row.get(2)?,
                    date: row.get::<_, NaiveDate>(3)?,
                    start_time: row.get::<_, Option<NaiveTime>>(4)?,
                    duration_minutes: row.get(5)?,
                    group_size: row.get(6)?,
                    category: row.get(7)?,
                    language: row.get(8)?,
                    required_competences: BTreeSet::new(),
                    bindings: Bindings {
                        assigned_guide: optional_id(10)?,
                        assigned_driver: optional_id(11)?,
                        assigned_vehicle: optional_id(12)?,
                    },
                    version: row.get(13)?,
                },
                required_competences: row.get(9)?,
            })
        },
    )?;
    rows.into_iter()
        .map(|row| {
            let mut tour = row.tour;
            tour.required_competences = decode_set("tours", tour.id, &row.required_competences)?;
            Ok(tour)
        })
        .collect()
}

struct EventRow {
    seq: i64,
    tour_id: u64,
    kind: String,
    action: String,
    resource_id: String,
    replaced: Option<String>,
    at: DateTime<Utc>,
    status: String,
    version: u64,
}

fn load_events(connection: &Connection) -> Result<Vec<AssignmentEvent>, StoreError> {
    let rows = query_all(
        connection,
        "SELECT seq, tour_id, kind, action, resource_id, replaced, at, status, version
         FROM assignment_events ORDER BY seq",
        "read assignment events",
        |row| {
            Ok(EventRow {
                seq: row.get(0)?,
                tour_id: row.get(1)?,
                kind: row.get(2)?,
                action: row.get(3)?,
                resource_id: row.get(4)?,
                replaced: row.get(5)?,
                at: row.get(6)?,
                status: row.get(7)?,
                version: row.get(8)?,
            })
        },
    )?;
    rows.into_iter().map(decode_event).collect()
}

fn decode_event(row: EventRow) -> Result<AssignmentEvent, StoreError> {
    let invalid = |detail: String| StoreError::InvalidRecord {
        table: "assignment_events",
        key: row.seq.to_string(),
        detail,
    };
    let kind: ResourceKind = row.kind.parse().map_err(|err| invalid(format!("{err}")))?;
    let resource_id = ResourceId::new(row.resource_id);
    let action = match row.action.as_str() {
        "assigned" => AssignmentAction::Assigned {
            resource_id,
            replaced: row.replaced.map(ResourceId::new),
        },
        "unassigned" => AssignmentAction::Unassigned { resource_id },
        other => return Err(invalid(format!("unknown action {other:?}"))),
    };
    let status = match row.status.as_str() {
        "pending" => AssignmentStatus::Pending,
        "complete" => AssignmentStatus::Complete,
        other => return Err(invalid(format!("unknown status {other:?}"))),
    };
    Ok(AssignmentEvent {
        tour_id: TourId::new(row.tour_id),
        kind,
        action,
        at: row.at,
        status,
        version: row.version,
    })
}
