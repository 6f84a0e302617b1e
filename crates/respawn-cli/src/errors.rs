//! Error surface of the CLI runtime.

use std::io;

use respawn::CommandError;
use respawn::telemetry::TelemetryError;
use thiserror::Error;

use crate::shutdown::ShutdownError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("failed to initialise logging: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("{0}")]
    Command(#[from] CommandError),
    #[error("daemon shutdown failed: {0}")]
    Shutdown(#[from] ShutdownError),
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}
