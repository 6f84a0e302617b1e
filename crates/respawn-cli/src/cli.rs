//! Command-line surface of the `respawn` binary.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use respawn::{DaemonCommand, DaemonConfig};
use respawn_config::{DEFAULT_LOG_FILTER, LogFormat, StopSignal, TelemetryConfig};

/// Runs itself as a detached daemon and manages it through its pid file.
#[derive(Parser, Debug)]
#[command(name = "respawn", version, disable_help_subcommand = true)]
pub(crate) struct Cli {
    /// File receiving the daemon's pid.
    #[arg(long, global = true, env = "RESPAWN_PID_FILE", value_name = "PATH")]
    pub(crate) pid_file: Option<PathBuf>,
    /// Sink for the daemon's standard output (appended to).
    #[arg(long, global = true, env = "RESPAWN_STDOUT", value_name = "PATH")]
    pub(crate) stdout: Option<PathBuf>,
    /// Sink for the daemon's standard error and logs (appended to).
    #[arg(long, global = true, env = "RESPAWN_STDERR", value_name = "PATH")]
    pub(crate) stderr: Option<PathBuf>,
    /// Signal sent by `stop`.
    #[arg(long, global = true, env = "RESPAWN_STOP_SIGNAL", default_value_t = StopSignal::Terminate)]
    pub(crate) stop_signal: StopSignal,
    /// `tracing` filter directive.
    #[arg(long, global = true, env = "RESPAWN_LOG_FILTER", default_value = DEFAULT_LOG_FILTER)]
    pub(crate) log_filter: String,
    /// Log output format.
    #[arg(long, global = true, env = "RESPAWN_LOG_FORMAT", default_value_t = LogFormat::Compact)]
    pub(crate) log_format: LogFormat,
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

/// Lifecycle subcommands.
#[derive(Subcommand, Debug, Clone)]
pub(crate) enum CliCommand {
    /// Relaunches detached and idles until a termination signal arrives.
    Start(StartArgs),
    /// Sends the stop signal to the recorded daemon.
    Stop,
    /// Reports whether the recorded daemon is alive.
    Status,
}

/// Options for `start`.
#[derive(clap::Args, Debug, Clone, Default)]
pub(crate) struct StartArgs {
    /// Recover the command line from the operating system instead of
    /// forwarding it explicitly.
    #[arg(long)]
    pub(crate) infer_argv: bool,
    /// Argument inserted directly after the program path of the daemon's
    /// command line.
    #[arg(long = "runtime-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub(crate) runtime_args: Vec<OsString>,
    /// Argument appended to the end of the daemon's command line.
    #[arg(long = "program-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub(crate) program_args: Vec<OsString>,
    /// Arguments handed to the daemon instance.
    #[arg(trailing_var_arg = true, num_args = 0.., value_name = "ARGS")]
    pub(crate) trailing: Vec<OsString>,
}

impl Cli {
    pub(crate) const fn daemon_command(&self) -> DaemonCommand {
        match self.command {
            CliCommand::Start(_) => DaemonCommand::Start,
            CliCommand::Stop => DaemonCommand::Stop,
            CliCommand::Status => DaemonCommand::Status,
        }
    }

    pub(crate) fn telemetry(&self) -> TelemetryConfig {
        TelemetryConfig::new(self.log_filter.clone(), self.log_format)
    }

    /// Builds the daemon configuration; `argv` is this invocation's full
    /// command line.
    pub(crate) fn daemon_config(&self, argv: &[OsString]) -> DaemonConfig {
        let mut config = DaemonConfig::new().with_stop_signal(self.stop_signal);
        if let Some(path) = &self.pid_file {
            config = config.with_pid_file(path);
        }
        if let Some(path) = &self.stdout {
            config = config.with_stdout(path);
        }
        if let Some(path) = &self.stderr {
            config = config.with_stderr(path);
        }
        if let CliCommand::Start(start) = &self.command {
            config = config
                .with_extra_runtime_args(start.runtime_args.iter().cloned())
                .with_extra_program_args(start.program_args.iter().cloned());
            if !start.infer_argv {
                config = config.with_argv(argv.iter().cloned());
            }
        }
        config
    }
}
