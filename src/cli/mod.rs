//! Command-line layer: argument parsing, logging setup, reporting.

use std::io;

use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod args;
mod commands;
mod exit_status;
mod report;

pub use args::{Arguments, Command, InitCommand, OutputFormat, WrapCommand};
pub use exit_status::ExitStatus;

/// Overrides the log filter, e.g. `TWRAP_LOG=twrap=trace`.
const LOG_ENV: &str = "TWRAP_LOG";

/// Install the stderr log subscriber. `-v` raises the default level.
fn setup_tracing(verbose: bool) {
    let default = if verbose { "twrap=debug" } else { "twrap=error" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .try_init();
}

pub fn run_cli(args: Arguments) -> Result<ExitStatus> {
    let Some(args) = args.with_command_or_help() else {
        return Ok(ExitStatus::Success);
    };
    setup_tracing(args.verbose());

    match args.command {
        Some(Command::Wrap(cmd)) => {
            let root = commands::wrap::resolve_root(cmd.root.as_ref())?;
            let summary = commands::wrap::wrap(&cmd, root.clone())?;
            report::print(&summary, cmd.format, &root)?;
            Ok(ExitStatus::from_summary(&summary))
        }
        Some(Command::Init(cmd)) => commands::init::init(&cmd),
        None => Ok(ExitStatus::Success),
    }
}
