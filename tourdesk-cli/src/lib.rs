//! Command-line interface for the Tourdesk back office.
//!
//! Every subcommand works on one roster store: a JSON snapshot named with
//! `--roster` (rewritten after each change) or a SQLite database named with
//! `--database`. Replies are printed as `{ success, data | error }` JSON.
#![forbid(unsafe_code)]

use std::io::Write;

use clap::{Parser, Subcommand};

mod available;
mod error;
mod import;
mod output;
mod staffing;
mod store;
mod tours;

pub use error::CliError;

use available::{AvailableArgs, run_available_with};
use import::{ImportArgs, run_import_with};
use staffing::{
    AssignArgs, UnassignArgs, ValidateArgs, run_assign_with, run_unassign_with, run_validate_with,
};
use tours::{ToursArgs, run_tours_with};

const ARG_ROSTER: &str = "roster";
const ARG_DATABASE: &str = "database";
const ARG_KIND: &str = "kind";
const ARG_RESOURCE_ID: &str = "resource-id";
const ARG_TOUR: &str = "tour";
const ARG_DATE: &str = "date";
const ARG_CAPACITY: &str = "capacity";
const ARG_COMPETENCES: &str = "competences";
const ENV_AVAILABLE_KIND: &str = "TOURDESK_CMDS_AVAILABLE_KIND";
const ENV_AVAILABLE_DATE: &str = "TOURDESK_CMDS_AVAILABLE_DATE";
const ENV_VALIDATE_KIND: &str = "TOURDESK_CMDS_VALIDATE_KIND";
const ENV_VALIDATE_RESOURCE_ID: &str = "TOURDESK_CMDS_VALIDATE_RESOURCE_ID";
const ENV_VALIDATE_TOUR: &str = "TOURDESK_CMDS_VALIDATE_TOUR";
const ENV_ASSIGN_KIND: &str = "TOURDESK_CMDS_ASSIGN_KIND";
const ENV_ASSIGN_RESOURCE_ID: &str = "TOURDESK_CMDS_ASSIGN_RESOURCE_ID";
const ENV_ASSIGN_TOUR: &str = "TOURDESK_CMDS_ASSIGN_TOUR";
const ENV_UNASSIGN_KIND: &str = "TOURDESK_CMDS_UNASSIGN_KIND";
const ENV_UNASSIGN_TOUR: &str = "TOURDESK_CMDS_UNASSIGN_TOUR";
const ENV_IMPORT_ROSTER: &str = "TOURDESK_CMDS_IMPORT_ROSTER";
const ENV_IMPORT_DATABASE: &str = "TOURDESK_CMDS_IMPORT_DATABASE";

/// Run the Tourdesk CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdout = std::io::stdout().lock();
    run_command(cli.command, &mut stdout)
}

fn run_command(command: Command, writer: &mut dyn Write) -> Result<(), CliError> {
    match command {
        Command::Tours(args) => run_tours_with(args, writer),
        Command::Available(args) => run_available_with(args, writer),
        Command::Validate(args) => run_validate_with(args, writer),
        Command::Assign(args) => run_assign_with(args, writer),
        Command::Unassign(args) => run_unassign_with(args, writer),
        Command::Import(args) => run_import_with(args, writer),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "tourdesk",
    about = "Staff tours with guides, drivers and vehicles",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List tours with their staffing status.
    Tours(ToursArgs),
    /// List resources free on a day.
    Available(AvailableArgs),
    /// Check whether a resource suits a tour without binding it.
    Validate(ValidateArgs),
    /// Bind a resource to a tour.
    Assign(AssignArgs),
    /// Release a role on a tour.
    Unassign(UnassignArgs),
    /// Copy a JSON roster snapshot into a SQLite database.
    Import(ImportArgs),
}

#[cfg(test)]
mod tests;
