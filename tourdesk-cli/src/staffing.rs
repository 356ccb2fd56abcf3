//! `validate`, `assign` and `unassign` commands.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use tourdesk_core::{AssignmentService, ResourceId, ResourceKind, TourId, ValidationOptions};

use crate::{
    ARG_COMPETENCES, ARG_DATABASE, ARG_KIND, ARG_RESOURCE_ID, ARG_ROSTER, ARG_TOUR, CliError,
    ENV_ASSIGN_KIND, ENV_ASSIGN_RESOURCE_ID, ENV_ASSIGN_TOUR, ENV_UNASSIGN_KIND, ENV_UNASSIGN_TOUR,
    ENV_VALIDATE_KIND, ENV_VALIDATE_RESOURCE_ID, ENV_VALIDATE_TOUR,
    output::{TourRow, emit},
    store::StoreSource,
};

/// CLI arguments for the `validate` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "validate",
    about = "Check whether a resource suits a tour without binding it"
)]
#[ortho_config(prefix = "TOURDESK")]
pub(crate) struct ValidateArgs {
    /// Role to check: guide, driver or vehicle.
    #[arg(value_name = ARG_KIND)]
    #[serde(default)]
    pub(crate) kind: Option<ResourceKind>,
    /// Identifier of the candidate resource.
    #[arg(value_name = ARG_RESOURCE_ID)]
    #[serde(default)]
    pub(crate) resource_id: Option<ResourceId>,
    /// Tour the candidate would staff.
    #[arg(long = ARG_TOUR, value_name = "id")]
    #[serde(default)]
    pub(crate) tour: Option<TourId>,
    /// Also check guide competences and language.
    #[arg(long = ARG_COMPETENCES)]
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) competences: bool,
    /// Path to a JSON roster snapshot.
    #[arg(long = ARG_ROSTER, value_name = "path")]
    #[serde(default)]
    pub(crate) roster: Option<Utf8PathBuf>,
    /// Path to a SQLite roster database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

/// CLI arguments for the `assign` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "assign",
    long_about = "Bind a resource to a tour. The resource must exist, be \
                 active and be free on the tour's day, and must pass the \
                 capacity and licence checks. Guide competences and language \
                 are checked only with --competences.",
    about = "Bind a resource to a tour"
)]
#[ortho_config(prefix = "TOURDESK")]
pub(crate) struct AssignArgs {
    /// Role to fill: guide, driver or vehicle.
    #[arg(value_name = ARG_KIND)]
    #[serde(default)]
    pub(crate) kind: Option<ResourceKind>,
    /// Identifier of the resource to bind.
    #[arg(value_name = ARG_RESOURCE_ID)]
    #[serde(default)]
    pub(crate) resource_id: Option<ResourceId>,
    /// Tour to staff.
    #[arg(long = ARG_TOUR, value_name = "id")]
    #[serde(default)]
    pub(crate) tour: Option<TourId>,
    /// Also check guide competences and language.
    #[arg(long = ARG_COMPETENCES)]
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) competences: bool,
    /// Path to a JSON roster snapshot.
    #[arg(long = ARG_ROSTER, value_name = "path")]
    #[serde(default)]
    pub(crate) roster: Option<Utf8PathBuf>,
    /// Path to a SQLite roster database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

/// CLI arguments for the `unassign` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(name = "unassign", about = "Release a role on a tour")]
#[ortho_config(prefix = "TOURDESK")]
pub(crate) struct UnassignArgs {
    /// Role to release: guide, driver or vehicle.
    #[arg(value_name = ARG_KIND)]
    #[serde(default)]
    pub(crate) kind: Option<ResourceKind>,
    /// Tour to update.
    #[arg(long = ARG_TOUR, value_name = "id")]
    #[serde(default)]
    pub(crate) tour: Option<TourId>,
    /// Path to a JSON roster snapshot.
    #[arg(long = ARG_ROSTER, value_name = "path")]
    #[serde(default)]
    pub(crate) roster: Option<Utf8PathBuf>,
    /// Path to a SQLite roster database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

/// Resolved configuration for `validate` and `assign`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SelectionConfig {
    pub(crate) kind: ResourceKind,
    pub(crate) resource_id: ResourceId,
    pub(crate) tour_id: TourId,
    pub(crate) options: ValidationOptions,
    pub(crate) source: StoreSource,
}

/// Environment variable names reported when a selection field is missing.
struct SelectionEnv {
    kind: &'static str,
    resource_id: &'static str,
    tour: &'static str,
}

struct SelectionFields {
    kind: Option<ResourceKind>,
    resource_id: Option<ResourceId>,
    tour: Option<TourId>,
    competences: bool,
    roster: Option<Utf8PathBuf>,
    database: Option<Utf8PathBuf>,
}

impl SelectionConfig {
    fn resolve(
        command: &'static str,
        fields: SelectionFields,
        env: &SelectionEnv,
    ) -> Result<Self, CliError> {
        let kind = fields.kind.ok_or(CliError::MissingArgument {
            field: ARG_KIND,
            env: env.kind,
        })?;
        let resource_id = fields.resource_id.ok_or(CliError::MissingArgument {
            field: ARG_RESOURCE_ID,
            env: env.resource_id,
        })?;
        let tour_id = fields.tour.ok_or(CliError::MissingArgument {
            field: ARG_TOUR,
            env: env.tour,
        })?;
        let source = StoreSource::select(command, fields.roster, fields.database)?;
        Ok(Self {
            kind,
            resource_id,
            tour_id,
            options: ValidationOptions {
                validate_competences: fields.competences,
            },
            source,
        })
    }
}

impl TryFrom<ValidateArgs> for SelectionConfig {
    type Error = CliError;

    fn try_from(args: ValidateArgs) -> Result<Self, Self::Error> {
        let fields = SelectionFields {
            kind: args.kind,
            resource_id: args.resource_id,
            tour: args.tour,
            competences: args.competences,
            roster: args.roster,
            database: args.database,
        };
        Self::resolve(
            "validate",
            fields,
            &SelectionEnv {
                kind: ENV_VALIDATE_KIND,
                resource_id: ENV_VALIDATE_RESOURCE_ID,
                tour: ENV_VALIDATE_TOUR,
            },
        )
    }
}

impl TryFrom<AssignArgs> for SelectionConfig {
    type Error = CliError;

    fn try_from(args: AssignArgs) -> Result<Self, Self::Error> {
        let fields = SelectionFields {
            kind: args.kind,
            resource_id: args.resource_id,
            tour: args.tour,
            competences: args.competences,
            roster: args.roster,
            database: args.database,
        };
        Self::resolve(
            "assign",
            fields,
            &SelectionEnv {
                kind: ENV_ASSIGN_KIND,
                resource_id: ENV_ASSIGN_RESOURCE_ID,
                tour: ENV_ASSIGN_TOUR,
            },
        )
    }
}

/// Resolved `unassign` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UnassignConfig {
    pub(crate) kind: ResourceKind,
    pub(crate) tour_id: TourId,
    pub(crate) source: StoreSource,
}

impl TryFrom<UnassignArgs> for UnassignConfig {
    type Error = CliError;

    fn try_from(args: UnassignArgs) -> Result<Self, Self::Error> {
        let kind = args.kind.ok_or(CliError::MissingArgument {
            field: ARG_KIND,
            env: ENV_UNASSIGN_KIND,
        })?;
        let tour_id = args.tour.ok_or(CliError::MissingArgument {
            field: ARG_TOUR,
            env: ENV_UNASSIGN_TOUR,
        })?;
        let source = StoreSource::select("unassign", args.roster, args.database)?;
        Ok(Self {
            kind,
            tour_id,
            source,
        })
    }
}

pub(crate) fn run_validate_with(args: ValidateArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let config = SelectionConfig::try_from(merged)?;
    config.source.validate_source()?;
    let service = AssignmentService::new(config.source.open()?);
    let outcome = service.try_validate(
        config.tour_id,
        config.kind,
        &config.resource_id,
        config.options,
    );
    emit(writer, outcome)
}

pub(crate) fn run_assign_with(args: AssignArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let config = SelectionConfig::try_from(merged)?;
    config.source.validate_source()?;
    let service = AssignmentService::new(config.source.open()?);
    let result = service.try_assign(
        config.tour_id,
        config.kind,
        &config.resource_id,
        config.options,
    );
    if let Ok(tour) = &result {
        service.store().flush()?;
        info!(
            "bound {} {} to tour {}, now {}",
            config.kind,
            config.resource_id,
            tour.id,
            tour.status()
        );
    }
    emit(writer, result.map(TourRow::from))
}

pub(crate) fn run_unassign_with(args: UnassignArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let config = UnassignConfig::try_from(merged)?;
    config.source.validate_source()?;
    let service = AssignmentService::new(config.source.open()?);
    let result = service.try_unassign(config.tour_id, config.kind);
    if result.is_ok() {
        service.store().flush()?;
    }
    emit(writer, result.map(TourRow::from))
}
