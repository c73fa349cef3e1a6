//! Tracing subscriber setup.
//!
//! Report commands log to stderr. The interactive board owns the terminal, so it
//! only logs when a log file is configured.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{AppError, AppResult};

/// Where log lines go.
pub enum LogTarget<'a> {
    Stderr,
    File(&'a Path),
    Off,
}

/// Install the global subscriber. `RUST_LOG` overrides the verbosity-derived default.
pub fn init_logging(verbose: bool, target: LogTarget<'_>) -> AppResult<()> {
    let default = if verbose { "debug" } else { "warn" };
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into());

    match target {
        LogTarget::Off => Ok(()),
        LogTarget::Stderr => tracing_subscriber::registry()
            .with(filter())
            .with(fmt::layer().without_time().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| AppError::Logging(e.to_string())),
        LogTarget::File(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::registry()
                .with(filter())
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .try_init()
                .map_err(|e| AppError::Logging(e.to_string()))
        }
    }
}
