//! Blocks the daemon instance until it is asked to terminate.

use std::io;

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::info;

use crate::CLI_TARGET;

/// Signals that end the daemon's idle loop.
pub(crate) const TERMINATION_SIGNALS: [i32; 4] = [SIGTERM, SIGINT, SIGQUIT, SIGHUP];

/// Waits for the daemon to be told to stop.
pub(crate) trait ShutdownSignal {
    /// Blocks until shutdown should proceed and returns the signal number.
    fn wait(&mut self) -> Result<i32, ShutdownError>;
}

/// Errors reported while waiting for shutdown.
#[derive(Debug, Error)]
pub(crate) enum ShutdownError {
    #[error("failed to install signal handlers: {source}")]
    Install {
        #[source]
        source: io::Error,
    },
    #[error("signal iterator closed before a termination signal arrived")]
    Closed,
}

/// Waits on the process's real termination signals.
///
/// Handlers are registered by [`SystemShutdownSignal::install`], so a signal
/// arriving between installation and [`ShutdownSignal::wait`] is queued
/// rather than taking its default action.
pub(crate) struct SystemShutdownSignal {
    signals: Signals,
}

impl SystemShutdownSignal {
    pub(crate) fn install() -> Result<Self, ShutdownError> {
        let signals = Signals::new(TERMINATION_SIGNALS)
            .map_err(|source| ShutdownError::Install { source })?;
        Ok(Self { signals })
    }
}

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&mut self) -> Result<i32, ShutdownError> {
        let signal = self
            .signals
            .forever()
            .next()
            .ok_or(ShutdownError::Closed)?;
        info!(target: CLI_TARGET, signal, "termination signal received");
        Ok(signal)
    }
}
