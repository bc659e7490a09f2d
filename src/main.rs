mod audit;
mod cli;
mod collections;
mod config;
mod error;
mod logging;
mod picker;
mod search;
mod tui;
mod workflow;

use anyhow::Result;
use clap::Parser;
use logging::LogSink;

fn main() -> Result<()> {
    let cli_args = cli::Cli::parse();

    // The interactive picker draws on the terminal, so logs only reach stderr when no TUI runs.
    let sink = match (&cli_args.log_file, &cli_args.command) {
        (Some(path), _) => LogSink::File(path),
        (None, Some(_)) => LogSink::Stderr,
        (None, None) if cli_args.pick.headless => LogSink::Stderr,
        (None, None) => LogSink::Discard,
    };
    logging::init(sink, cli_args.verbose)?;

    // Delegate the main application logic to the workflow module
    workflow::run_qpick(cli_args)
}
