//! Result values shared by the launcher and the lifecycle probe.

use std::fmt;
use std::process::ExitCode;

use serde::Serialize;

/// Outcome of a relaunch attempt.
///
/// Exactly one side is ever reported: the caller that spawned the daemon
/// sees [`Relaunch::Parent`] with the child's pid, while the detached
/// instance sees [`Relaunch::Child`] with its own pid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "role", content = "pid", rename_all = "snake_case")]
pub enum Relaunch {
    /// This process is the detached daemon.
    Child(u32),
    /// This process spawned the daemon and should exit.
    Parent(u32),
}

impl Relaunch {
    /// Returns true in the detached daemon.
    #[must_use]
    pub const fn is_child(self) -> bool {
        matches!(self, Self::Child(_))
    }

    /// Returns true in the process that spawned the daemon.
    #[must_use]
    pub const fn is_parent(self) -> bool {
        matches!(self, Self::Parent(_))
    }

    /// The daemon's pid, from whichever side observed it.
    #[must_use]
    pub const fn pid(self) -> u32 {
        match self {
            Self::Child(pid) | Self::Parent(pid) => pid,
        }
    }
}

/// LSB init-script exit codes reported by `status` and `stop`.
///
/// The two families overlap numerically (`1` means "dead with pid file" for
/// `status` and "general error" for `stop`); callers interpret a code in the
/// context of the command that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DaemonStatusCode {
    /// `status`: the process named by the pid file is alive.
    Running,
    /// `status`: a pid file exists but its process is gone.
    Dead,
    /// `status`: no pid file exists.
    NotRunning,
    /// `status`: the pid file could not be read or parsed.
    Unknown,
    /// `stop`: the termination signal was delivered.
    StopSuccess,
    /// `stop`: the pid file was unusable or the signal was refused.
    StopGeneralError,
    /// `stop`: no pid file exists.
    StopNotRunning,
}

impl DaemonStatusCode {
    /// Numeric exit code for the init-script convention.
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        match self {
            Self::Running | Self::StopSuccess => 0,
            Self::Dead | Self::StopGeneralError => 1,
            Self::NotRunning => 3,
            Self::Unknown => 4,
            Self::StopNotRunning => 7,
        }
    }

    const fn describe(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Dead => "dead (pid file present)",
            Self::NotRunning => "not running",
            Self::Unknown => "unknown",
            Self::StopSuccess => "stopped",
            Self::StopGeneralError => "stop failed",
            Self::StopNotRunning => "not running",
        }
    }
}

impl fmt::Display for DaemonStatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

impl From<DaemonStatusCode> for ExitCode {
    fn from(code: DaemonStatusCode) -> Self {
        Self::from(code.exit_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(DaemonStatusCode::Running, 0)]
    #[case(DaemonStatusCode::Dead, 1)]
    #[case(DaemonStatusCode::NotRunning, 3)]
    #[case(DaemonStatusCode::Unknown, 4)]
    #[case(DaemonStatusCode::StopSuccess, 0)]
    #[case(DaemonStatusCode::StopGeneralError, 1)]
    #[case(DaemonStatusCode::StopNotRunning, 7)]
    fn exit_codes_follow_lsb_table(#[case] code: DaemonStatusCode, #[case] expected: u8) {
        assert_eq!(code.exit_code(), expected);
    }

    #[test]
    fn relaunch_equality_considers_tag_and_pid() {
        assert_eq!(Relaunch::Child(7), Relaunch::Child(7));
        assert_ne!(Relaunch::Child(7), Relaunch::Parent(7));
        assert_ne!(Relaunch::Parent(7), Relaunch::Parent(8));
    }

    #[test]
    fn relaunch_accessors_report_role() {
        let parent = Relaunch::Parent(42);
        assert!(parent.is_parent());
        assert!(!parent.is_child());
        assert_eq!(parent.pid(), 42);
    }
}
