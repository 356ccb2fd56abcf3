//! `tours` command: list tours and their staffing status.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use tourdesk_core::AssignmentService;

use crate::{
    ARG_DATABASE, ARG_ROSTER, CliError,
    output::{TourRow, emit},
    store::StoreSource,
};

/// CLI arguments for the `tours` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(name = "tours", about = "List tours with their staffing status")]
#[ortho_config(prefix = "TOURDESK")]
pub(crate) struct ToursArgs {
    /// Path to a JSON roster snapshot.
    #[arg(long = ARG_ROSTER, value_name = "path")]
    #[serde(default)]
    pub(crate) roster: Option<Utf8PathBuf>,
    /// Path to a SQLite roster database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

impl ToursArgs {
    fn into_source(self) -> Result<StoreSource, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        StoreSource::select("tours", merged.roster, merged.database)
    }
}

pub(crate) fn run_tours_with(args: ToursArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let source = args.into_source()?;
    source.validate_source()?;
    let service = AssignmentService::new(source.open()?);
    let tours = service
        .try_load_tours()
        .map(|tours| tours.into_iter().map(TourRow::from).collect::<Vec<_>>());
    emit(writer, tours)
}
