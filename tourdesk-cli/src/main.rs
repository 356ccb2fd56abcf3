//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use tourdesk_cli::CliError;
use tracing_subscriber::EnvFilter;

fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    match tourdesk_cli::run() {
        Err(CliError::ArgumentParsing(err)) => err.exit(),
        result => Ok(result?),
    }
}
