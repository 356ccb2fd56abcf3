use rusqlite::{Connection, Error as SqliteError, OptionalExtension, Transaction};
use thiserror::Error;

/// Schema version written by this build.
pub const SCHEMA_VERSION: i64 = 1;

/// Create the roster tables inside an SQLite database.
///
/// Safe to call on every open: tables are created only when missing, and an
/// existing database must already be at [`SCHEMA_VERSION`].
///
/// # Examples
/// ```
/// use rusqlite::Connection;
/// use tourdesk_core::store::initialise_schema;
///
/// let mut conn = Connection::open_in_memory().expect("create in-memory database");
/// initialise_schema(&mut conn).expect("create roster schema");
///
/// let version: i64 = conn
///     .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
///     .expect("read schema version");
/// assert_eq!(version, 1);
/// ```
pub fn initialise_schema(connection: &mut Connection) -> Result<(), SchemaError> {
    connection
        .pragma_update(None, "foreign_keys", true)
        .map_err(|source| SchemaError::ForeignKeys { source })?;

    let transaction = connection
        .transaction()
        .map_err(|source| SchemaError::Migration {
            step: "begin schema transaction",
            source,
        })?;

    create_resource_tables(&transaction)?;
    create_tour_tables(&transaction)?;
    ensure_schema_version(&transaction)?;

    transaction
        .commit()
        .map_err(|source| SchemaError::Migration {
            step: "commit schema transaction",
            source,
        })
}

fn create_resource_tables(transaction: &Transaction<'_>) -> Result<(), SchemaError> {
    run_migration_step(
        transaction,
        "create guides",
        "CREATE TABLE IF NOT EXISTS guides (
            id TEXT PRIMARY KEY CHECK (length(trim(id)) > 0),
            name TEXT NOT NULL,
            languages TEXT NOT NULL DEFAULT '[]',
            competences TEXT NOT NULL DEFAULT '[]',
            active INTEGER NOT NULL DEFAULT 1
        ) WITHOUT ROWID",
    )?;
    run_migration_step(
        transaction,
        "create drivers",
        "CREATE TABLE IF NOT EXISTS drivers (
            id TEXT PRIMARY KEY CHECK (length(trim(id)) > 0),
            name TEXT NOT NULL,
            licence_categories TEXT NOT NULL DEFAULT '[]',
            active INTEGER NOT NULL DEFAULT 1
        ) WITHOUT ROWID",
    )?;
    run_migration_step(
        transaction,
        "create vehicles",
        "CREATE TABLE IF NOT EXISTS vehicles (
            id TEXT PRIMARY KEY CHECK (length(trim(id)) > 0),
            plate TEXT NOT NULL,
            model TEXT NOT NULL DEFAULT '',
            capacity INTEGER NOT NULL CHECK (capacity >= 0),
            required_licence TEXT,
            active INTEGER NOT NULL DEFAULT 1
        ) WITHOUT ROWID",
    )
}

fn create_tour_tables(transaction: &Transaction<'_>) -> Result<(), SchemaError> {
    run_migration_step(
        transaction,
        "create tours",
        "CREATE TABLE IF NOT EXISTS tours (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            code TEXT NOT NULL DEFAULT '',
            date TEXT NOT NULL,
            start_time TEXT,
            duration_minutes INTEGER NOT NULL DEFAULT 0,
            group_size INTEGER NOT NULL DEFAULT 0,
            category TEXT NOT NULL DEFAULT '',
            language TEXT,
            required_competences TEXT NOT NULL DEFAULT '[]',
            assigned_guide TEXT REFERENCES guides(id),
            assigned_driver TEXT REFERENCES drivers(id),
            assigned_vehicle TEXT REFERENCES vehicles(id),
            version INTEGER NOT NULL DEFAULT 0
        )",
    )?;
    run_migration_step(
        transaction,
        "index tours by date",
        "CREATE INDEX IF NOT EXISTS idx_tours_date ON tours(date, id)",
    )?;
    run_migration_step(
        transaction,
        "create assignment_events",
        "CREATE TABLE IF NOT EXISTS assignment_events (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            tour_id INTEGER NOT NULL REFERENCES tours(id) ON DELETE CASCADE,
            kind TEXT NOT NULL CHECK (kind IN ('guide', 'driver', 'vehicle')),
            action TEXT NOT NULL CHECK (action IN ('assigned', 'unassigned')),
            resource_id TEXT NOT NULL,
            replaced TEXT,
            at TEXT NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('pending', 'complete')),
            version INTEGER NOT NULL
        )",
    )
}

fn ensure_schema_version(transaction: &Transaction<'_>) -> Result<(), SchemaError> {
    run_migration_step(
        transaction,
        "create schema version table",
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY CHECK (version > 0),
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
        ) WITHOUT ROWID",
    )?;

    let existing_version: Option<i64> = transaction
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .optional()
        .map_err(|source| SchemaError::Migration {
            step: "read schema version",
            source,
        })?;

    match existing_version {
        Some(SCHEMA_VERSION) => Ok(()),
        Some(found) => Err(SchemaError::VersionMismatch {
            expected: SCHEMA_VERSION,
            found,
        }),
        None => transaction
            .execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                [SCHEMA_VERSION],
            )
            .map(|_| ())
            .map_err(|source| SchemaError::Migration {
                step: "record schema version",
                source,
            }),
    }
}

fn run_migration_step(
    transaction: &Transaction<'_>,
    step: &'static str,
    sql: &str,
) -> Result<(), SchemaError> {
    transaction
        .execute(sql, [])
        .map(|_| ())
        .map_err(|source| SchemaError::Migration { step, source })
}

/// Errors raised when initialising the roster schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// `PRAGMA foreign_keys` was refused.
    #[error("failed to enable SQLite foreign keys")]
    ForeignKeys {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// A DDL statement failed.
    #[error("failed to execute migration step '{step}'")]
    Migration {
        /// Step that failed.
        step: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// The database was written by a different schema version.
    #[error("expected roster schema version {expected} but found {found}; apply migrations before retrying")]
    VersionMismatch {
        /// Version this build understands.
        expected: i64,
        /// Version on file.
        found: i64,
    },
}
