//! JSON envelope output shared by the subcommands.

use std::io::Write;

use serde::Serialize;
use tourdesk_core::{AssignmentStatus, Envelope, ServiceError, Tour};

use crate::CliError;

/// A tour as printed by the CLI: the stored fields plus the derived status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct TourRow {
    #[serde(flatten)]
    pub(crate) tour: Tour,
    pub(crate) status: AssignmentStatus,
}

impl From<Tour> for TourRow {
    fn from(tour: Tour) -> Self {
        let status = tour.status();
        Self { tour, status }
    }
}

/// Print `result` as an envelope, then hand a failure back to the caller so
/// the process exits non-zero.
pub(crate) fn emit<T: Serialize>(
    writer: &mut dyn Write,
    result: Result<T, ServiceError>,
) -> Result<(), CliError> {
    match result {
        Ok(data) => write_json(writer, &Envelope::ok(data)),
        Err(err) => {
            write_json(writer, &Envelope::<T>::err(err.to_string()))?;
            Err(CliError::Service(err))
        }
    }
}

pub(crate) fn write_json<T: Serialize>(writer: &mut dyn Write, value: &T) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerializeOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}
