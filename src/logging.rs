use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing::Level;

/// Where log lines go. The interactive picker owns the terminal, so stderr is
/// only safe when no TUI is drawn.
pub enum LogSink<'a> {
    File(&'a Path),
    Stderr,
    Discard,
}

pub fn level_for(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Install the global subscriber. `Discard` installs none, so events are
/// filtered out before any formatting happens.
pub fn init(sink: LogSink<'_>, verbosity: u8) -> Result<()> {
    if matches!(sink, LogSink::Discard) {
        return Ok(());
    }
    let builder = tracing_subscriber::fmt()
        .with_max_level(level_for(verbosity))
        .with_target(false);
    match sink {
        LogSink::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        LogSink::Stderr => builder.with_writer(std::io::stderr).init(),
        LogSink::Discard => {}
    }
    Ok(())
}
