//! `available` command: list resources free on a day.

use std::io::Write;

use camino::Utf8PathBuf;
use chrono::NaiveDate;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use tourdesk_core::{
    AssignmentError, AssignmentService, Candidate, ResourceKind, ServiceError, TourId, TourStore,
};

use crate::{
    ARG_CAPACITY, ARG_DATABASE, ARG_DATE, ARG_KIND, ARG_ROSTER, ARG_TOUR, CliError,
    ENV_AVAILABLE_DATE, ENV_AVAILABLE_KIND, output::emit, store::StoreSource,
};

/// CLI arguments for the `available` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "available",
    long_about = "List active resources of one role that are not bound to \
                 another tour on the given day. With --tour, the tour's own \
                 bindings are ignored, the day defaults to the tour's date and \
                 the vehicle capacity defaults to its group size.",
    about = "List resources free on a day"
)]
#[ortho_config(prefix = "TOURDESK")]
pub(crate) struct AvailableArgs {
    /// Role to list: guide, driver or vehicle.
    #[arg(value_name = ARG_KIND)]
    #[serde(default)]
    pub(crate) kind: Option<ResourceKind>,
    /// Day to check, as YYYY-MM-DD.
    #[arg(long = ARG_DATE, value_name = "date")]
    #[serde(default)]
    pub(crate) date: Option<NaiveDate>,
    /// Minimum seats for vehicles.
    #[arg(long = ARG_CAPACITY, value_name = "seats")]
    #[serde(default)]
    pub(crate) capacity: Option<u32>,
    /// Tour being staffed.
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

impl AvailableArgs {
    pub(crate) fn into_config(self) -> Result<AvailableConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        AvailableConfig::try_from(merged)
    }
}

/// Which day to check, and whether a tour is being staffed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Window {
    Day(NaiveDate),
    Tour {
        tour_id: TourId,
        date: Option<NaiveDate>,
    },
}

/// Resolved `available` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AvailableConfig {
    pub(crate) kind: ResourceKind,
    pub(crate) window: Window,
    pub(crate) capacity: Option<u32>,
    pub(crate) source: StoreSource,
}

impl TryFrom<AvailableArgs> for AvailableConfig {
    type Error = CliError;

    fn try_from(args: AvailableArgs) -> Result<Self, Self::Error> {
        let kind = args.kind.ok_or(CliError::MissingArgument {
            field: ARG_KIND,
            env: ENV_AVAILABLE_KIND,
        })?;
        let window = match (args.tour, args.date) {
            (Some(tour_id), date) => Window::Tour { tour_id, date },
            (None, Some(date)) => Window::Day(date),
            (None, None) => {
                return Err(CliError::MissingArgument {
                    field: ARG_DATE,
                    env: ENV_AVAILABLE_DATE,
                });
            }
        };
        let source = StoreSource::select("available", args.roster, args.database)?;
        Ok(Self {
            kind,
            window,
            capacity: args.capacity,
            source,
        })
    }
}

pub(crate) fn run_available_with(
    args: AvailableArgs,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    config.source.validate_source()?;
    let service = AssignmentService::new(config.source.open()?);
    emit(writer, list_available(&service, &config))
}

pub(crate) fn list_available<S: TourStore>(
    service: &AssignmentService<S>,
    config: &AvailableConfig,
) -> Result<Vec<Candidate>, ServiceError> {
    match config.window {
        Window::Day(date) => {
            service.try_available(config.kind, date, config.capacity.unwrap_or(0), None)
        }
        Window::Tour { tour_id, date } => {
            let tour = service
                .try_load_tours()?
                .into_iter()
                .find(|tour| tour.id == tour_id)
                .ok_or(AssignmentError::TourNotFound { tour_id })?;
            let capacity = config.capacity.unwrap_or(tour.group_size);
            service.try_available(
                config.kind,
                date.unwrap_or(tour.date),
                capacity,
                Some(tour_id),
            )
        }
    }
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<AvailableConfig, CliError> {
    let merged = AvailableArgs::merge_from_layers(layers).map_err(CliError::from)?;
    AvailableConfig::try_from(merged)
}
