//! Operating system primitives used by the launcher and the probe.

use std::env;
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, Write};
use std::os::fd::AsRawFd;
use std::os::unix::process::CommandExt;
use std::process::Command;

use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::{Pid, dup2, setsid};

/// Command line and environment for a spawned daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnRequest {
    /// Program resolved through `PATH` when not absolute.
    pub program: OsString,
    /// Full argument vector, including `argv[0]`.
    pub argv: Vec<OsString>,
    /// Complete environment of the child; nothing else is inherited.
    pub env: Vec<(OsString, OsString)>,
}

/// Standard stream replaced while detaching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdStream {
    /// File descriptor 1.
    Stdout,
    /// File descriptor 2.
    Stderr,
}

/// Abstraction over the process-level primitives the launcher relies on.
pub trait ProcessOps {
    /// Pid of the current process.
    fn pid(&self) -> u32;

    /// Reads one environment entry of the current process.
    fn var_os(&self, key: &str) -> Option<OsString>;

    /// Snapshot of the current process environment.
    fn vars_os(&self) -> Vec<(OsString, OsString)>;

    /// Starts a new process and returns its pid without waiting for it.
    fn spawn(&self, request: &SpawnRequest) -> io::Result<u32>;

    /// Starts a new session, detaching from the controlling terminal.
    fn create_session(&self) -> Result<(), Errno>;

    /// Installs `file` in place of `stream`.
    ///
    /// The previous descriptor is released only by the replacement itself,
    /// so the stream always has a sink.
    fn redirect(&self, stream: StdStream, file: &File) -> io::Result<()>;

    /// Delivers `signal` to `pid`; `None` only probes for existence.
    fn signal(&self, pid: u32, signal: Option<Signal>) -> Result<(), Errno>;
}

impl<T: ProcessOps + ?Sized> ProcessOps for &T {
    fn pid(&self) -> u32 {
        (**self).pid()
    }

    fn var_os(&self, key: &str) -> Option<OsString> {
        (**self).var_os(key)
    }

    fn vars_os(&self) -> Vec<(OsString, OsString)> {
        (**self).vars_os()
    }

    fn spawn(&self, request: &SpawnRequest) -> io::Result<u32> {
        (**self).spawn(request)
    }

    fn create_session(&self) -> Result<(), Errno> {
        (**self).create_session()
    }

    fn redirect(&self, stream: StdStream, file: &File) -> io::Result<()> {
        (**self).redirect(stream, file)
    }

    fn signal(&self, pid: u32, signal: Option<Signal>) -> Result<(), Errno> {
        (**self).signal(pid, signal)
    }
}

/// [`ProcessOps`] backed by the real operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessOps;

impl SystemProcessOps {
    /// Builds the system-backed primitives.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ProcessOps for SystemProcessOps {
    fn pid(&self) -> u32 {
        std::process::id()
    }

    fn var_os(&self, key: &str) -> Option<OsString> {
        env::var_os(key)
    }

    fn vars_os(&self) -> Vec<(OsString, OsString)> {
        env::vars_os().collect()
    }

    fn spawn(&self, request: &SpawnRequest) -> io::Result<u32> {
        let mut command = Command::new(&request.program);
        if let Some((first, rest)) = request.argv.split_first() {
            command.arg0(first).args(rest);
        }
        command.env_clear().envs(request.env.iter().cloned());
        // The caller exits straight after a successful spawn; the detached
        // child is reparented and reaped by init.
        let child = command.spawn()?;
        Ok(child.id())
    }

    fn create_session(&self) -> Result<(), Errno> {
        setsid().map(|_| ())
    }

    fn redirect(&self, stream: StdStream, file: &File) -> io::Result<()> {
        let target = match stream {
            StdStream::Stdout => {
                io::stdout().flush()?;
                io::stdout().as_raw_fd()
            }
            StdStream::Stderr => {
                io::stderr().flush()?;
                io::stderr().as_raw_fd()
            }
        };
        dup2(file.as_raw_fd(), target)?;
        Ok(())
    }

    fn signal(&self, pid: u32, signal: Option<Signal>) -> Result<(), Errno> {
        let raw = i32::try_from(pid).map_err(|_| Errno::EINVAL)?;
        kill(Pid::from_raw(raw), signal)
    }
}
