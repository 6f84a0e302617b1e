//! The relaunch protocol as an explicit state machine.
//!
//! ```text
//! Undetermined --(no sentinel)--> Spawning  --spawn-->  Terminal(Parent(child))
//!              \-(sentinel)-----> Detaching --detach--> Terminal(Child(own))
//! ```
//!
//! The sentinel is consulted exactly once, on leaving `Undetermined`. Each
//! call to [`Launcher::step`] performs one transition so the sequence can be
//! observed and driven against fake [`ProcessOps`].

mod errors;

use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use respawn_config::DaemonConfig;
use tracing::{debug, info};

use crate::argv::{ArgvStrategy, HostOs, RuntimeReport, build_argv};
use crate::ops::{ProcessOps, SpawnRequest, StdStream, SystemProcessOps};
use crate::pidfile::write_pid;
use crate::sentinel::{SENTINEL_KEY, is_marker, sentinel_entry};
use crate::status::Relaunch;

pub use errors::LaunchError;

pub(crate) const LAUNCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::launcher");

/// Position of a [`Launcher`] in the relaunch protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchState {
    /// The sentinel has not been consulted yet.
    Undetermined,
    /// This is the original caller; the next step spawns the daemon.
    Spawning,
    /// This is the relaunched instance; the next step detaches it.
    Detaching,
    /// The protocol finished with the given outcome.
    Terminal(Relaunch),
}

/// Drives one relaunch attempt.
#[derive(Debug)]
pub struct Launcher<'a, O> {
    config: &'a DaemonConfig,
    ops: O,
    host: HostOs,
    runtime: Option<RuntimeReport>,
    state: LaunchState,
}

impl<'a, O: ProcessOps> Launcher<'a, O> {
    /// Prepares a launcher for the host this binary was built for.
    #[must_use]
    pub fn new(config: &'a DaemonConfig, ops: O) -> Self {
        Self {
            config,
            ops,
            host: HostOs::detect(),
            runtime: None,
            state: LaunchState::Undetermined,
        }
    }

    /// Overrides host detection when choosing an argv strategy.
    #[must_use]
    pub fn with_host(self, host: HostOs) -> Self {
        Self { host, ..self }
    }

    /// Rebuilds the command line from `report` instead of the host strategy.
    ///
    /// An explicit argv in the configuration still takes precedence.
    #[must_use]
    pub fn with_runtime_report(self, report: RuntimeReport) -> Self {
        Self {
            runtime: Some(report),
            ..self
        }
    }

    /// Current protocol state.
    #[must_use]
    pub const fn state(&self) -> &LaunchState {
        &self.state
    }

    /// Performs a single transition and returns the state reached.
    ///
    /// Calling `step` in [`LaunchState::Terminal`] has no effect. A failed
    /// transition leaves the state unchanged.
    pub fn step(&mut self) -> Result<&LaunchState, LaunchError> {
        self.state = match self.state {
            LaunchState::Undetermined => self.determine_role(),
            LaunchState::Spawning => LaunchState::Terminal(Relaunch::Parent(self.spawn_child()?)),
            LaunchState::Detaching => LaunchState::Terminal(Relaunch::Child(self.detach()?)),
            terminal @ LaunchState::Terminal(_) => terminal,
        };
        Ok(&self.state)
    }

    /// Steps until the protocol terminates.
    pub fn run(mut self) -> Result<Relaunch, LaunchError> {
        loop {
            if let LaunchState::Terminal(outcome) = *self.step()? {
                return Ok(outcome);
            }
        }
    }

    fn determine_role(&self) -> LaunchState {
        if is_marker(self.ops.var_os(SENTINEL_KEY).as_deref()) {
            debug!(target: LAUNCH_TARGET, "sentinel present; detaching");
            LaunchState::Detaching
        } else {
            debug!(target: LAUNCH_TARGET, "sentinel absent; spawning daemon");
            LaunchState::Spawning
        }
    }

    fn spawn_child(&self) -> Result<u32, LaunchError> {
        let strategy = ArgvStrategy::select(
            self.config.argv(),
            self.runtime.clone(),
            self.host,
            self.ops.pid(),
        )?;
        let argv = build_argv(self.config, &strategy)?;
        let request = SpawnRequest {
            program: argv.first().cloned().unwrap_or_default(),
            env: self.child_environment(),
            argv,
        };
        debug!(
            target: LAUNCH_TARGET,
            strategy = strategy.name(),
            argv = ?request.argv,
            "spawning daemon"
        );
        let child = self
            .ops
            .spawn(&request)
            .map_err(|source| LaunchError::SpawnFailed {
                program: PathBuf::from(&request.program),
                source,
            })?;
        info!(target: LAUNCH_TARGET, child, "daemon spawned");
        Ok(child)
    }

    fn child_environment(&self) -> Vec<(OsString, OsString)> {
        let mut env: Vec<_> = self
            .ops
            .vars_os()
            .into_iter()
            .filter(|(key, _)| key != SENTINEL_KEY)
            .collect();
        env.push(sentinel_entry());
        env
    }

    fn detach(&self) -> Result<u32, LaunchError> {
        self.ops
            .create_session()
            .map_err(|source| LaunchError::Detach { source })?;
        self.redirect(StdStream::Stdout, self.config.stdout())?;
        self.redirect(StdStream::Stderr, self.config.stderr())?;

        let pid = self.ops.pid();
        if let Some(path) = self.config.pid_file() {
            write_pid(path, pid).map_err(|source| LaunchError::PidWrite {
                path: path.to_path_buf(),
                source,
            })?;
            debug!(target: LAUNCH_TARGET, pid, file = %path.display(), "pid file written");
        }
        info!(target: LAUNCH_TARGET, pid, "daemon detached");
        Ok(pid)
    }

    fn redirect(&self, stream: StdStream, path: &Path) -> Result<(), LaunchError> {
        let to_error = |source| LaunchError::Redirect {
            path: path.to_path_buf(),
            source,
        };
        let sink = open_append(path).map_err(to_error)?;
        self.ops.redirect(stream, &sink).map_err(to_error)
    }
}

fn open_append(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Runs the relaunch protocol against the real operating system.
pub fn relaunch(config: &DaemonConfig) -> Result<Relaunch, LaunchError> {
    Launcher::new(config, SystemProcessOps::new()).run()
}

/// Turns the calling process into a detached daemon.
///
/// In the original caller this spawns the daemon and exits with status 0; it
/// returns only in the detached instance, yielding the daemon's own pid.
pub fn daemonize(config: &DaemonConfig) -> Result<u32, LaunchError> {
    match relaunch(config)? {
        Relaunch::Child(pid) => Ok(pid),
        Relaunch::Parent(child) => {
            info!(target: LAUNCH_TARGET, child, "original caller exiting");
            std::process::exit(0)
        }
    }
}
