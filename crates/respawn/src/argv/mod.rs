//! Reconstruction of the command line that started the current process.
//!
//! The relaunched daemon must run with the same invocation as its parent. A
//! caller that still holds its original `argv` should pass it through
//! [`respawn_config::DaemonConfig::with_argv`]; otherwise the command line is
//! recovered from the operating system:
//! - [`proc_table`] reads the NUL-separated `/proc/<pid>/cmdline` on Linux.
//! - [`sysctl`] queries `KERN_PROCARGS2` on macOS.
//! - [`runtime`] rebuilds an approximation from what the hosting runtime
//!   reports about itself, for every other platform.

pub mod proc_table;
mod runtime;
pub mod sysctl;

use std::env;
use std::ffi::OsString;
use std::io;
use std::path::PathBuf;

use respawn_config::DaemonConfig;
use thiserror::Error;

pub use runtime::{
    ARCHIVE_SUFFIX, ESCAPED_SPACE, FLAG_PREFIX, RuntimeKind, RuntimeReport, rejoin_flags,
};

/// Errors raised while reconstructing a command line.
#[derive(Debug, Error)]
pub enum ArgvError {
    /// No inference strategy is available and no argv was supplied.
    #[error("cannot infer the command line on {os}; supply the original argv explicitly")]
    UnsupportedPlatform {
        /// Host operating system identifier.
        os: &'static str,
    },
    /// Reading the process table entry failed.
    #[error("failed to read process table entry '{path}': {source}")]
    ReadProcTable {
        /// Pseudo-file that could not be read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The kernel argument query reported a failure.
    #[error("kernel process argument query failed: {source}")]
    Sysctl {
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
    /// The kernel argument buffer did not follow the expected layout.
    #[error("malformed process argument buffer: {reason}")]
    MalformedProcArgs {
        /// What was wrong with the buffer.
        reason: &'static str,
    },
    /// The running executable could not be located.
    #[error("failed to locate the running executable: {source}")]
    CurrentExe {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The reconstructed command line had no program token.
    #[error("reconstructed command line is empty")]
    EmptyCommandLine,
}

/// Operating system families with distinct inference strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    /// Process table exposed through procfs.
    Linux,
    /// Process arguments exposed through `sysctl`.
    MacOs,
    /// Anything else; only the runtime heuristic applies.
    Other,
}

impl HostOs {
    /// Identifies the operating system this binary was built for.
    #[must_use]
    pub fn detect() -> Self {
        Self::from_os_name(env::consts::OS)
    }

    /// Maps a [`std::env::consts::OS`] identifier onto a host family.
    #[must_use]
    pub fn from_os_name(name: &str) -> Self {
        match name {
            "linux" => Self::Linux,
            "macos" => Self::MacOs,
            _ => Self::Other,
        }
    }
}

/// Source of the reconstructed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgvStrategy {
    /// Tokens supplied by the caller, returned verbatim.
    Explicit(Vec<OsString>),
    /// NUL-separated tokens read from a procfs `cmdline` file.
    ProcTable {
        /// Pseudo-file holding the command line.
        path: PathBuf,
    },
    /// Tokens returned by the `KERN_PROCARGS2` kernel query.
    SysctlQuery {
        /// Process whose arguments are queried.
        pid: u32,
    },
    /// Best-effort rebuild from the hosting runtime's self-description.
    RuntimeHeuristic(RuntimeReport),
}

impl ArgvStrategy {
    /// Chooses a strategy for process `pid`.
    ///
    /// An explicit argv always wins, then a caller-supplied runtime report,
    /// then the strategy native to `host`. On hosts without a native strategy
    /// the running executable is described with [`RuntimeReport::native`].
    pub fn select(
        explicit: Option<&[OsString]>,
        runtime: Option<RuntimeReport>,
        host: HostOs,
        pid: u32,
    ) -> Result<Self, ArgvError> {
        if let Some(argv) = explicit {
            return Ok(Self::Explicit(argv.to_vec()));
        }
        if let Some(report) = runtime {
            return Ok(Self::RuntimeHeuristic(report));
        }
        match host {
            HostOs::Linux => Ok(Self::ProcTable {
                path: proc_table::cmdline_path(pid),
            }),
            HostOs::MacOs => Ok(Self::SysctlQuery { pid }),
            HostOs::Other => RuntimeReport::native().map(Self::RuntimeHeuristic),
        }
    }

    /// Produces the command line tokens, program path first.
    pub fn reconstruct(&self) -> Result<Vec<OsString>, ArgvError> {
        match self {
            Self::Explicit(argv) => Ok(argv.clone()),
            Self::ProcTable { path } => proc_table::read(path),
            Self::SysctlQuery { pid } => sysctl::query(*pid),
            Self::RuntimeHeuristic(report) => Ok(report.reconstruct()),
        }
    }

    /// Short name used in log events.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Explicit(_) => "explicit",
            Self::ProcTable { .. } => "proc_table",
            Self::SysctlQuery { .. } => "sysctl",
            Self::RuntimeHeuristic(_) => "runtime_heuristic",
        }
    }
}

/// Reconstructs the command line and splices in the configured extras.
pub fn build_argv(
    config: &DaemonConfig,
    strategy: &ArgvStrategy,
) -> Result<Vec<OsString>, ArgvError> {
    let argv = strategy.reconstruct()?;
    if argv.is_empty() {
        return Err(ArgvError::EmptyCommandLine);
    }
    Ok(splice_extra_args(
        argv,
        config.extra_runtime_args(),
        config.extra_program_args(),
    ))
}

/// Inserts `runtime_args` after the program path and appends `program_args`.
#[must_use]
pub fn splice_extra_args(
    argv: Vec<OsString>,
    runtime_args: &[OsString],
    program_args: &[OsString],
) -> Vec<OsString> {
    let mut tokens = argv.into_iter();
    let mut spliced = Vec::with_capacity(tokens.len() + runtime_args.len() + program_args.len());
    spliced.extend(tokens.next());
    spliced.extend(runtime_args.iter().cloned());
    spliced.extend(tokens);
    spliced.extend(program_args.iter().cloned());
    spliced
}
