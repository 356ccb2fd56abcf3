//! Error types emitted by the Tourdesk CLI.
//!
//! Keep this error type reasonably small, as every command helper returns
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;
use tourdesk_core::{ServiceError, StoreError};

/// Errors emitted by the Tourdesk CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// Neither a roster snapshot nor a database was named.
    #[error("{command} needs a roster store (set --roster or --database)")]
    MissingStore { command: &'static str },
    /// Both a roster snapshot and a database were named.
    #[error("{command} accepts --roster or --database, not both")]
    ConflictingStore { command: &'static str },
    /// The requested operation requires a missing compile-time feature.
    #[error("{action} requires the `{feature}` feature to be enabled")]
    MissingFeature {
        feature: &'static str,
        action: &'static str,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The directory that should hold the database could not be created.
    #[error("failed to create the parent directory of {field} path {path:?}: {source}")]
    CreateParentDir {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Opening the roster snapshot failed.
    #[error("failed to open roster at {path:?}: {source}")]
    OpenRoster {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The roster snapshot or database could not be loaded.
    #[error("failed to load roster store at {path:?}: {source}")]
    LoadStore {
        path: Utf8PathBuf,
        #[source]
        source: StoreError,
    },
    /// Encoding the updated roster snapshot failed.
    #[error("failed to encode roster for {path:?}: {source}")]
    EncodeRoster {
        path: Utf8PathBuf,
        #[source]
        source: StoreError,
    },
    /// Writing the updated roster snapshot back failed.
    #[error("failed to write roster to {path:?}: {source}")]
    WriteRoster {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Copying a roster snapshot into a database failed.
    #[error("failed to import roster into {path:?}: {source}")]
    ImportRoster {
        path: Utf8PathBuf,
        #[source]
        source: StoreError,
    },
    /// The assignment flow refused or failed the request.
    #[error(transparent)]
    Service(#[from] ServiceError),
    /// Serializing the command output failed.
    #[error("failed to serialize command output: {0}")]
    SerializeOutput(#[source] serde_json::Error),
    /// Writing the command output failed.
    #[error("failed to write command output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
