use crate::error::{CliError, Result};
use std::fs::File;
use std::path::Path;
use tracing_subscriber::{
    Layer,
    Registry,
    filter::{LevelFilter, Targets},
    fmt,
    prelude::*,
};

/// Target prefix shared by the library and the binary.
const APP_TARGET: &str = "isosurf";

fn level_filter(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Our own events follow `-v`; dependencies (rayon, tokio) never go below `WARN`.
fn terminal_filter(verbosity: u8, quiet: bool) -> Targets {
    let level = level_filter(verbosity, quiet);
    Targets::new()
        .with_default(level.min(LevelFilter::WARN))
        .with_target(APP_TARGET, level)
}

/// The log file keeps at least the debug-level grid and surface details, even when the
/// terminal is quiet.
fn file_filter(verbosity: u8) -> Targets {
    let level = level_filter(verbosity, false).max(LevelFilter::DEBUG);
    Targets::new()
        .with_default(LevelFilter::WARN)
        .with_target(APP_TARGET, level)
}

fn file_layer(file: File, verbosity: u8) -> Box<dyn Layer<Registry> + Send + Sync> {
    fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_thread_ids(true)
        .with_target(true)
        .with_filter(file_filter(verbosity))
        .boxed()
}

pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let file_output = match log_file {
        Some(path) => {
            let file = File::create(path).map_err(CliError::Io)?;
            Some(file_layer(file, verbosity))
        }
        None => None,
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false)
        .compact()
        .with_filter(terminal_filter(verbosity, quiet));

    tracing_subscriber::registry()
        .with(file_output)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| CliError::Other(anyhow::anyhow!("Failed to install logger: {}", e)))
}
