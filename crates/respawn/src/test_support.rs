//! Recording [`ProcessOps`] fake shared by unit tests.

use std::cell::RefCell;
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, Write};

use nix::errno::Errno;
use nix::sys::signal::Signal;

use crate::ops::{ProcessOps, SpawnRequest, StdStream};
use crate::sentinel::{SENTINEL_KEY, SENTINEL_MARKER};

/// Marker written into every redirected sink.
pub(crate) const REDIRECT_MARKER: &str = "redirected\n";

/// Process primitive observed by [`RecordingOps`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Spawn(SpawnRequest),
    CreateSession,
    Redirect(StdStream),
    Signal(u32, Option<Signal>),
}

/// Fake primitives that record every call and answer from canned results.
#[derive(Debug)]
pub(crate) struct RecordingOps {
    pid: u32,
    env: Vec<(OsString, OsString)>,
    spawn_result: Result<u32, io::ErrorKind>,
    session_result: Result<(), Errno>,
    signal_result: Result<(), Errno>,
    calls: RefCell<Vec<Call>>,
}

impl RecordingOps {
    pub(crate) fn new(pid: u32) -> Self {
        Self {
            pid,
            env: Vec::new(),
            spawn_result: Ok(pid.wrapping_add(1)),
            session_result: Ok(()),
            signal_result: Ok(()),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub(crate) fn relaunched(self) -> Self {
        self.with_env(SENTINEL_KEY, SENTINEL_MARKER)
    }

    pub(crate) fn spawning(mut self, result: Result<u32, io::ErrorKind>) -> Self {
        self.spawn_result = result;
        self
    }

    pub(crate) fn session(mut self, result: Result<(), Errno>) -> Self {
        self.session_result = result;
        self
    }

    pub(crate) fn signalling(mut self, result: Result<(), Errno>) -> Self {
        self.signal_result = result;
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub(crate) fn spawned(&self) -> Vec<SpawnRequest> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::Spawn(request) => Some(request.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

impl ProcessOps for RecordingOps {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn var_os(&self, key: &str) -> Option<OsString> {
        self.env
            .iter()
            .rev()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.clone())
    }

    fn vars_os(&self) -> Vec<(OsString, OsString)> {
        self.env.clone()
    }

    fn spawn(&self, request: &SpawnRequest) -> io::Result<u32> {
        self.record(Call::Spawn(request.clone()));
        self.spawn_result.map_err(io::Error::from)
    }

    fn create_session(&self) -> Result<(), Errno> {
        self.record(Call::CreateSession);
        self.session_result
    }

    fn redirect(&self, stream: StdStream, file: &File) -> io::Result<()> {
        self.record(Call::Redirect(stream));
        let mut sink = file;
        sink.write_all(REDIRECT_MARKER.as_bytes())
    }

    fn signal(&self, pid: u32, signal: Option<Signal>) -> Result<(), Errno> {
        self.record(Call::Signal(pid, signal));
        self.signal_result
    }
}
