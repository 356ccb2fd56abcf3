//! `import` command: copy a JSON roster snapshot into a SQLite database.

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use tourdesk_core::Roster;

use crate::{
    ARG_DATABASE, ARG_ROSTER, CliError, ENV_IMPORT_DATABASE, ENV_IMPORT_ROSTER,
    output::write_json,
    store::{read_snapshot, require_existing},
};

/// CLI arguments for the `import` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "import",
    long_about = "Replace the contents of a SQLite roster database with a \
                 JSON roster snapshot. The database and its parent \
                 directories are created when missing.",
    about = "Copy a JSON roster snapshot into a SQLite database"
)]
#[ortho_config(prefix = "TOURDESK")]
pub(crate) struct ImportArgs {
    /// Path to the JSON roster snapshot to read.
    #[arg(long = ARG_ROSTER, value_name = "path")]
    #[serde(default)]
    pub(crate) roster: Option<Utf8PathBuf>,
    /// Path to the SQLite database to fill.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

/// Resolved `import` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImportConfig {
    pub(crate) roster: Utf8PathBuf,
    pub(crate) database: Utf8PathBuf,
}

impl TryFrom<ImportArgs> for ImportConfig {
    type Error = CliError;

    fn try_from(args: ImportArgs) -> Result<Self, Self::Error> {
        let roster = args.roster.ok_or(CliError::MissingArgument {
            field: ARG_ROSTER,
            env: ENV_IMPORT_ROSTER,
        })?;
        let database = args.database.ok_or(CliError::MissingArgument {
            field: ARG_DATABASE,
            env: ENV_IMPORT_DATABASE,
        })?;
        Ok(Self { roster, database })
    }
}

/// Row counts copied by an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ImportSummary {
    pub(crate) tours: usize,
    pub(crate) guides: usize,
    pub(crate) drivers: usize,
    pub(crate) vehicles: usize,
    pub(crate) events: usize,
}

impl From<&Roster> for ImportSummary {
    fn from(roster: &Roster) -> Self {
        Self {
            tours: roster.tours().count(),
            guides: roster.guides().count(),
            drivers: roster.drivers().count(),
            vehicles: roster.vehicles().count(),
            events: roster.events().len(),
        }
    }
}

pub(crate) fn run_import_with(args: ImportArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let config = ImportConfig::try_from(merged)?;
    require_existing(&config.roster, ARG_ROSTER)?;
    let roster = read_snapshot(&config.roster)?
        .into_inner()
        .map_err(|source| CliError::LoadStore {
            path: config.roster.clone(),
            source,
        })?;
    import_into(&config.database, &roster)?;
    let summary = ImportSummary::from(&roster);
    info!(
        "imported {} tours from {} into {}",
        summary.tours, config.roster, config.database
    );
    write_json(writer, &tourdesk_core::Envelope::ok(summary))
}

#[cfg(feature = "store-sqlite")]
fn import_into(database: &Utf8Path, roster: &Roster) -> Result<(), CliError> {
    tourdesk_fs::ensure_parent_dir(database).map_err(|source| CliError::CreateParentDir {
        field: ARG_DATABASE,
        path: database.to_path_buf(),
        source,
    })?;
    let import_error = |source| CliError::ImportRoster {
        path: database.to_path_buf(),
        source,
    };
    let store = tourdesk_core::SqliteTourStore::open(database.as_std_path()).map_err(import_error)?;
    store.import_roster(roster).map_err(import_error)
}

#[cfg(not(feature = "store-sqlite"))]
fn import_into(_database: &Utf8Path, _roster: &Roster) -> Result<(), CliError> {
    Err(CliError::MissingFeature {
        feature: "store-sqlite",
        action: "importing a roster",
    })
}
