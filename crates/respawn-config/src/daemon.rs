//! Immutable daemonisation settings.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Sink used for the detached standard streams when none is configured.
pub const DEFAULT_STREAM_SINK: &str = "/dev/null";

/// Signal delivered to the daemon by a `stop` request.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum StopSignal {
    /// `SIGTERM`, the conventional graceful termination request.
    #[default]
    Terminate,
    /// `SIGINT`, matching an interactive Ctrl-C.
    Interrupt,
}

/// Describes how a process relaunches itself as a detached daemon.
///
/// Values are never altered once built. Each `with_*` method returns a new
/// configuration and leaves the receiver untouched, so partially applied
/// configurations can be shared freely:
///
/// ```ignore
/// let base = DaemonConfig::new().with_pid_file("/tmp/d.pid");
/// let chatty = base.with_stdout("/tmp/d.out");
/// assert_eq!(base.stdout(), Path::new("/dev/null"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonConfig {
    argv: Option<Vec<OsString>>,
    pid_file: Option<PathBuf>,
    stdout: PathBuf,
    stderr: PathBuf,
    extra_runtime_args: Vec<OsString>,
    extra_program_args: Vec<OsString>,
    stop_signal: StopSignal,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            argv: None,
            pid_file: None,
            stdout: PathBuf::from(DEFAULT_STREAM_SINK),
            stderr: PathBuf::from(DEFAULT_STREAM_SINK),
            extra_runtime_args: Vec::new(),
            extra_program_args: Vec::new(),
            stop_signal: StopSignal::default(),
        }
    }
}

impl DaemonConfig {
    /// Builds a configuration with no pid file and both streams discarded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Supplies the original command line, including the program path.
    ///
    /// Passing `std::env::args_os()` here is preferred over inference: the
    /// inferred strategies are heuristics on some platforms and can split
    /// arguments that contain whitespace.
    #[must_use]
    pub fn with_argv<I, S>(&self, argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            argv: Some(argv.into_iter().map(Into::into).collect()),
            ..self.clone()
        }
    }

    /// Records the daemon pid at `path` once it has detached.
    #[must_use]
    pub fn with_pid_file(&self, path: impl Into<PathBuf>) -> Self {
        Self {
            pid_file: Some(path.into()),
            ..self.clone()
        }
    }

    /// Redirects the daemon's standard output to `path` (append mode).
    #[must_use]
    pub fn with_stdout(&self, path: impl Into<PathBuf>) -> Self {
        Self {
            stdout: path.into(),
            ..self.clone()
        }
    }

    /// Redirects the daemon's standard error to `path` (append mode).
    #[must_use]
    pub fn with_stderr(&self, path: impl Into<PathBuf>) -> Self {
        Self {
            stderr: path.into(),
            ..self.clone()
        }
    }

    /// Inserts arguments directly after the program path of the relaunched
    /// command line, ahead of any original runtime flags.
    #[must_use]
    pub fn with_extra_runtime_args<I, S>(&self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            extra_runtime_args: args.into_iter().map(Into::into).collect(),
            ..self.clone()
        }
    }

    /// Appends arguments after every reconstructed program argument.
    #[must_use]
    pub fn with_extra_program_args<I, S>(&self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            extra_program_args: args.into_iter().map(Into::into).collect(),
            ..self.clone()
        }
    }

    /// Selects the signal sent by a `stop` request.
    #[must_use]
    pub fn with_stop_signal(&self, signal: StopSignal) -> Self {
        Self {
            stop_signal: signal,
            ..self.clone()
        }
    }

    /// Explicit command line, when one was supplied.
    #[must_use]
    pub fn argv(&self) -> Option<&[OsString]> {
        self.argv.as_deref()
    }

    /// Location of the pid file, when one was configured.
    #[must_use]
    pub fn pid_file(&self) -> Option<&Path> {
        self.pid_file.as_deref()
    }

    /// Target of the daemon's standard output.
    #[must_use]
    pub fn stdout(&self) -> &Path {
        self.stdout.as_path()
    }

    /// Target of the daemon's standard error.
    #[must_use]
    pub fn stderr(&self) -> &Path {
        self.stderr.as_path()
    }

    /// Arguments inserted after the program path.
    #[must_use]
    pub fn extra_runtime_args(&self) -> &[OsString] {
        &self.extra_runtime_args
    }

    /// Arguments appended after the program arguments.
    #[must_use]
    pub fn extra_program_args(&self) -> &[OsString] {
        &self.extra_program_args
    }

    /// Signal delivered by `stop`.
    #[must_use]
    pub const fn stop_signal(&self) -> StopSignal {
        self.stop_signal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use std::str::FromStr;

    #[fixture]
    fn base() -> DaemonConfig {
        DaemonConfig::new().with_pid_file("/tmp/d.pid")
    }

    #[test]
    fn defaults_discard_both_streams() {
        let config = DaemonConfig::new();
        assert_eq!(config.stdout(), Path::new("/dev/null"));
        assert_eq!(config.stderr(), Path::new("/dev/null"));
        assert!(config.pid_file().is_none());
        assert!(config.argv().is_none());
        assert_eq!(config.stop_signal(), StopSignal::Terminate);
    }

    #[rstest]
    fn with_stdout_leaves_receiver_untouched(base: DaemonConfig) {
        let snapshot = base.clone();
        let derived = base.with_stdout("/tmp/d.out");
        assert_eq!(base, snapshot);
        assert_eq!(derived.stdout(), Path::new("/tmp/d.out"));
        assert_eq!(derived.pid_file(), Some(Path::new("/tmp/d.pid")));
    }

    #[rstest]
    fn every_mutator_returns_a_distinct_value(base: DaemonConfig) {
        let snapshot = base.clone();
        let derived = [
            base.with_argv(["/bin/app", "run"]),
            base.with_pid_file("/tmp/other.pid"),
            base.with_stdout("/tmp/out"),
            base.with_stderr("/tmp/err"),
            base.with_extra_runtime_args(["--trace"]),
            base.with_extra_program_args(["--verbose"]),
            base.with_stop_signal(StopSignal::Interrupt),
        ];
        for value in &derived {
            assert_ne!(value, &snapshot);
        }
        assert_eq!(base, snapshot, "mutators must not alter the receiver");
    }

    #[rstest]
    fn mutators_compose(base: DaemonConfig) {
        let config = base
            .with_argv(["/bin/app"])
            .with_extra_runtime_args(["-X"])
            .with_extra_program_args(["tail"]);
        assert_eq!(config.argv(), Some(&[OsString::from("/bin/app")][..]));
        assert_eq!(config.extra_runtime_args(), &[OsString::from("-X")]);
        assert_eq!(config.extra_program_args(), &[OsString::from("tail")]);
    }

    #[rstest]
    #[case("terminate", StopSignal::Terminate)]
    #[case("INTERRUPT", StopSignal::Interrupt)]
    fn stop_signal_parses_case_insensitively(#[case] text: &str, #[case] expected: StopSignal) {
        assert_eq!(StopSignal::from_str(text).expect("parse"), expected);
    }
}
