//! Self-relaunching daemonisation for Unix processes.
//!
//! A process calls [`daemonize`] early in `main`. The first invocation (the
//! "original caller") reconstructs its own command line, spawns a copy of
//! itself with a sentinel environment entry, and exits. The copy recognises
//! the sentinel, detaches from the controlling terminal with `setsid`,
//! redirects its standard streams, records its pid, and returns control to
//! the caller's program logic, which now runs as the daemon.
//!
//! The [`probe`] module reads the recorded pid to answer `status` and `stop`
//! requests with LSB-style exit codes, and [`execute`] wires both halves into
//! a `start|stop|status` front end.
//!
//! Operating system primitives sit behind the [`ProcessOps`] trait so the
//! launcher state machine can be driven against fakes.

pub mod argv;
mod command;
pub mod launcher;
mod ops;
mod pidfile;
pub mod probe;
pub mod sentinel;
mod status;
pub mod telemetry;

#[cfg(test)]
mod test_support;

pub use argv::{ArgvError, ArgvStrategy, HostOs, RuntimeKind, RuntimeReport};
pub use command::{CommandError, CommandOutcome, DaemonCommand, execute};
pub use launcher::{LaunchError, LaunchState, Launcher, daemonize, relaunch};
pub use ops::{ProcessOps, SpawnRequest, StdStream, SystemProcessOps};
pub use pidfile::PidFileError;
pub use probe::{
    ProbeError, ProbeReport, check_status, check_status_with, status_report, status_report_with,
    stop, stop_report, stop_report_with, stop_with,
};
pub use respawn_config::{DaemonConfig, LogFormat, StopSignal, TelemetryConfig};
pub use status::{DaemonStatusCode, Relaunch};
