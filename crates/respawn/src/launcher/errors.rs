//! Errors raised while relaunching or detaching.

use std::io;
use std::path::PathBuf;

use nix::errno::Errno;
use thiserror::Error;

use crate::argv::ArgvError;

/// Errors surfaced by the relaunch protocol.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The command line to relaunch could not be reconstructed.
    #[error("failed to reconstruct the command line: {source}")]
    Argv {
        /// Underlying reconstruction error.
        #[from]
        source: ArgvError,
    },
    /// The operating system refused to start the child process.
    #[error("failed to spawn '{}': {source}", program.display())]
    SpawnFailed {
        /// Program that was to be executed.
        program: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// A new session could not be created.
    #[error("failed to detach from the controlling terminal: {source}")]
    Detach {
        /// Underlying OS error.
        #[source]
        source: Errno,
    },
    /// A standard stream could not be pointed at its configured sink.
    #[error("failed to redirect output to '{path}': {source}")]
    Redirect {
        /// Configured sink path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Writing the pid file failed.
    #[error("failed to write pid file '{path}': {source}")]
    PidWrite {
        /// Pid file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}
