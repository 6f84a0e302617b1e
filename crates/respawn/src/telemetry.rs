//! Process-wide `tracing` subscriber setup.
//!
//! Events are written to standard error. A detached daemon has its standard
//! error pointed at the configured sink, so the subscriber follows the
//! redirection without reinstallation.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use respawn_config::{LogFormat, TelemetryConfig};
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{Layer, fmt};

use crate::sentinel;

static INSTALLED: OnceCell<LogFormat> = OnceCell::new();

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The filter directive did not parse.
    #[error("invalid log filter '{filter}': {message}")]
    Filter {
        /// Directive as configured.
        filter: String,
        /// Parser diagnostic.
        message: String,
    },
    /// Another global subscriber was already installed.
    #[error("failed to install the log subscriber: {source}")]
    Install {
        /// Underlying registration error.
        #[source]
        source: TryInitError,
    },
}

/// Installs the global subscriber once; later calls are no-ops.
///
/// Returns the format actually in effect, which is the one chosen by the
/// first successful call.
pub fn initialise(config: &TelemetryConfig) -> Result<LogFormat, TelemetryError> {
    INSTALLED
        .get_or_try_init(|| install(config).map(|()| config.log_format()))
        .copied()
}

fn install(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = parse_filter(config.log_filter())?;
    let layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(true)
        .with_ansi(use_colour())
        .with_timer(UtcTime::rfc_3339());
    let formatted = match config.log_format() {
        LogFormat::Json => layer.json().flatten_event(true).boxed(),
        LogFormat::Compact => layer.compact().boxed(),
    };
    tracing_subscriber::registry()
        .with(formatted.with_filter(filter))
        .try_init()
        .map_err(|source| TelemetryError::Install { source })
}

fn parse_filter(directive: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(directive).map_err(|error| TelemetryError::Filter {
        filter: directive.to_owned(),
        message: error.to_string(),
    })
}

/// Colour only for a terminal that stays attached.
fn use_colour() -> bool {
    io::stderr().is_terminal() && !sentinel::is_relaunched_instance()
}
