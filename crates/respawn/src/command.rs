//! `start|stop|status` front end over the launcher and the probe.

use respawn_config::DaemonConfig;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

use crate::launcher::{LaunchError, daemonize};
use crate::probe::{ProbeError, ProbeReport, status_report, stop_report};

/// Lifecycle commands understood by [`execute`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DaemonCommand {
    /// Relaunch as a detached daemon.
    Start,
    /// Signal the recorded daemon to terminate.
    Stop,
    /// Report whether the recorded daemon is alive.
    Status,
}

/// Result of a lifecycle command.
#[derive(Debug)]
pub enum CommandOutcome {
    /// Running as the detached daemon with the given pid.
    Daemon(u32),
    /// The command finished; exit with the report's code.
    Exit(ProbeReport),
}

/// Errors raised by [`execute`].
#[derive(Debug, Error)]
pub enum CommandError {
    /// Relaunching failed.
    #[error(transparent)]
    Launch(#[from] LaunchError),
    /// Probing failed.
    #[error(transparent)]
    Probe(#[from] ProbeError),
}

/// Runs `command` against `config`.
///
/// `Start` does not return in the original caller, which exits once the
/// daemon is spawned; the detached instance receives
/// [`CommandOutcome::Daemon`] and carries on with the program's work.
pub fn execute(
    command: DaemonCommand,
    config: &DaemonConfig,
) -> Result<CommandOutcome, CommandError> {
    match command {
        DaemonCommand::Start => Ok(CommandOutcome::Daemon(daemonize(config)?)),
        DaemonCommand::Stop => Ok(CommandOutcome::Exit(stop_report(config)?)),
        DaemonCommand::Status => Ok(CommandOutcome::Exit(status_report(config)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::str::FromStr;

    use crate::status::DaemonStatusCode;

    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case("start", DaemonCommand::Start)]
    #[case("STOP", DaemonCommand::Stop)]
    #[case("Status", DaemonCommand::Status)]
    fn parses_command_names(#[case] text: &str, #[case] expected: DaemonCommand) {
        assert_eq!(DaemonCommand::from_str(text).expect("parse"), expected);
    }

    #[test]
    fn unknown_command_is_rejected() {
        assert!(DaemonCommand::from_str("restart").is_err());
    }

    #[rstest]
    #[case(DaemonCommand::Status, DaemonStatusCode::NotRunning)]
    #[case(DaemonCommand::Stop, DaemonStatusCode::StopNotRunning)]
    fn probe_commands_exit_with_lsb_code(
        #[case] command: DaemonCommand,
        #[case] expected: DaemonStatusCode,
    ) {
        let dir = TempDir::new().expect("temp dir");
        let config = DaemonConfig::new().with_pid_file(dir.path().join("absent.pid"));
        match execute(command, &config).expect("execute") {
            CommandOutcome::Exit(report) => {
                assert_eq!(report.code(), expected);
                assert!(report.diagnostic().is_none());
            }
            other @ CommandOutcome::Daemon(_) => panic!("expected an exit code, got {other:?}"),
        }
    }

    #[test]
    fn corrupt_pid_file_surfaces_its_diagnostic() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("d.pid");
        fs::write(&path, "not a pid").expect("seed pid file");
        let config = DaemonConfig::new().with_pid_file(&path);
        match execute(DaemonCommand::Status, &config).expect("execute") {
            CommandOutcome::Exit(report) => {
                assert_eq!(report.code(), DaemonStatusCode::Unknown);
                let message = report.diagnostic().expect("diagnostic").to_string();
                assert!(message.contains("not a pid"), "{message}");
            }
            other @ CommandOutcome::Daemon(_) => panic!("expected an exit code, got {other:?}"),
        }
    }

    #[test]
    fn probe_commands_require_a_pid_file() {
        let error = execute(DaemonCommand::Status, &DaemonConfig::new()).expect_err("no pid file");
        assert!(matches!(error, CommandError::Probe(_)));
    }
}
