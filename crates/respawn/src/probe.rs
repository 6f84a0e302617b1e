//! Lifecycle probe: answers `status` and `stop` from the recorded pid.
//!
//! The probe never fails for runtime conditions. An absent, unreadable, or
//! corrupt pid file maps onto an LSB code; only a configuration without a
//! pid file path is an error.

use nix::errno::Errno;
use nix::sys::signal::Signal;
use respawn_config::{DaemonConfig, StopSignal};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::ops::{ProcessOps, SystemProcessOps};
use crate::pidfile::{PidFileError, read_pid};
use crate::status::DaemonStatusCode;

const PROBE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::probe");

/// Errors raised by the lifecycle probe.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The configuration names no pid file to inspect.
    #[error("cannot {operation} the daemon: no pid file is configured")]
    MissingPidFile {
        /// Operation that needed the pid file.
        operation: &'static str,
    },
}

/// Code produced by a probe together with the pid-file failure behind it.
///
/// An unusable pid file still yields a code (`Unknown` or
/// `StopGeneralError`); the failure travels alongside so callers can print
/// it on their own diagnostic stream instead of relying on a subscriber.
#[derive(Debug)]
pub struct ProbeReport {
    code: DaemonStatusCode,
    diagnostic: Option<PidFileError>,
}

impl ProbeReport {
    const fn clean(code: DaemonStatusCode) -> Self {
        Self {
            code,
            diagnostic: None,
        }
    }

    const fn unusable(code: DaemonStatusCode, error: PidFileError) -> Self {
        Self {
            code,
            diagnostic: Some(error),
        }
    }

    /// LSB code for the probed command.
    #[must_use]
    pub const fn code(&self) -> DaemonStatusCode {
        self.code
    }

    /// Why the pid file could not be used, when that decided the code.
    #[must_use]
    pub const fn diagnostic(&self) -> Option<&PidFileError> {
        self.diagnostic.as_ref()
    }
}

/// Reports whether the daemon recorded in the pid file is alive.
///
/// A pid-file failure is only visible through the `warn` event here; use
/// [`status_report`] to receive it directly.
pub fn check_status(config: &DaemonConfig) -> Result<DaemonStatusCode, ProbeError> {
    check_status_with(config, &SystemProcessOps::new())
}

/// [`check_status`] against injected process primitives.
pub fn check_status_with<O: ProcessOps>(
    config: &DaemonConfig,
    ops: &O,
) -> Result<DaemonStatusCode, ProbeError> {
    status_report_with(config, ops).map(|report| report.code())
}

/// [`check_status`], keeping any pid-file failure in the report.
pub fn status_report(config: &DaemonConfig) -> Result<ProbeReport, ProbeError> {
    status_report_with(config, &SystemProcessOps::new())
}

/// [`status_report`] against injected process primitives.
pub fn status_report_with<O: ProcessOps>(
    config: &DaemonConfig,
    ops: &O,
) -> Result<ProbeReport, ProbeError> {
    let path = config
        .pid_file()
        .ok_or(ProbeError::MissingPidFile { operation: "check" })?;
    let pid = match read_pid(path) {
        Ok(Some(pid)) => pid,
        Ok(None) => {
            debug!(target: PROBE_TARGET, file = %path.display(), "no pid file");
            return Ok(ProbeReport::clean(DaemonStatusCode::NotRunning));
        }
        Err(error) => {
            warn!(target: PROBE_TARGET, error = %error, "pid file unusable");
            return Ok(ProbeReport::unusable(DaemonStatusCode::Unknown, error));
        }
    };
    let status = match ops.signal(pid, None) {
        Ok(()) | Err(Errno::EPERM) => DaemonStatusCode::Running,
        Err(errno) => {
            debug!(target: PROBE_TARGET, pid, %errno, "liveness probe failed");
            DaemonStatusCode::Dead
        }
    };
    debug!(target: PROBE_TARGET, pid, %status, "status checked");
    Ok(ProbeReport::clean(status))
}

/// Asks the daemon recorded in the pid file to terminate.
///
/// The pid file is left in place; removing it is up to the caller or the
/// daemon itself. Use [`stop_report`] to receive pid-file failures.
pub fn stop(config: &DaemonConfig) -> Result<DaemonStatusCode, ProbeError> {
    stop_with(config, &SystemProcessOps::new())
}

/// [`stop`] against injected process primitives.
pub fn stop_with<O: ProcessOps>(
    config: &DaemonConfig,
    ops: &O,
) -> Result<DaemonStatusCode, ProbeError> {
    stop_report_with(config, ops).map(|report| report.code())
}

/// [`stop`], keeping any pid-file failure in the report.
pub fn stop_report(config: &DaemonConfig) -> Result<ProbeReport, ProbeError> {
    stop_report_with(config, &SystemProcessOps::new())
}

/// [`stop_report`] against injected process primitives.
pub fn stop_report_with<O: ProcessOps>(
    config: &DaemonConfig,
    ops: &O,
) -> Result<ProbeReport, ProbeError> {
    let path = config
        .pid_file()
        .ok_or(ProbeError::MissingPidFile { operation: "stop" })?;
    let pid = match read_pid(path) {
        Ok(Some(pid)) => pid,
        Ok(None) => return Ok(ProbeReport::clean(DaemonStatusCode::StopNotRunning)),
        Err(error) => {
            warn!(target: PROBE_TARGET, error = %error, "pid file unusable");
            return Ok(ProbeReport::unusable(DaemonStatusCode::StopGeneralError, error));
        }
    };
    let signal = to_signal(config.stop_signal());
    match ops.signal(pid, Some(signal)) {
        Ok(()) => {
            info!(target: PROBE_TARGET, pid, %signal, "stop signal delivered");
            Ok(ProbeReport::clean(DaemonStatusCode::StopSuccess))
        }
        Err(errno) => {
            warn!(target: PROBE_TARGET, pid, %signal, %errno, "stop signal refused");
            Ok(ProbeReport::clean(DaemonStatusCode::StopGeneralError))
        }
    }
}

const fn to_signal(signal: StopSignal) -> Signal {
    match signal {
        StopSignal::Terminate => Signal::SIGTERM,
        StopSignal::Interrupt => Signal::SIGINT,
    }
}
