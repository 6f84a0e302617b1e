//! Shared configuration values for the respawn toolchain.
//!
//! [`DaemonConfig`] describes how a process relaunches itself into the
//! background: where the pid is recorded, where the detached instance writes
//! its standard streams, and which extra arguments are spliced into the
//! reconstructed command line. [`TelemetryConfig`] carries the logging
//! settings consumed by the tracing subscriber.

mod daemon;
mod logging;

pub use daemon::{DEFAULT_STREAM_SINK, DaemonConfig, StopSignal};
pub use logging::{DEFAULT_LOG_FILTER, LogFormat, LogFormatParseError, TelemetryConfig};
