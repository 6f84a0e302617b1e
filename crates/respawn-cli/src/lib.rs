//! Runtime of the `respawn` command-line tool.
//!
//! `respawn start` relaunches the binary as a detached daemon that records
//! its pid, reports its command line on its redirected standard output, and
//! idles until a termination signal arrives. `respawn status` and
//! `respawn stop` inspect or signal that daemon through the pid file and exit
//! with LSB init-script codes.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use respawn::{CommandOutcome, ProbeReport, execute, telemetry};
use tracing::info;

mod cli;
mod errors;
mod shutdown;

use cli::{Cli, CliCommand};
use errors::AppError;
use shutdown::{ShutdownError, ShutdownSignal, SystemShutdownSignal};

pub(crate) const CLI_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::cli");

/// Runs the CLI with `args` (program path first) and the given output streams.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let argv: Vec<OsString> = args.into_iter().collect();
    let cli = match Cli::try_parse_from(&argv) {
        Ok(cli) => cli,
        Err(error) => return report_usage(error, stdout, stderr),
    };
    match dispatch(&cli, &argv, stdout, stderr, SystemShutdownSignal::install) {
        Ok(code) => code,
        Err(error) => {
            // Nothing else can be done if stderr itself is unwritable.
            drop(writeln!(stderr, "respawn: {error}"));
            ExitCode::FAILURE
        }
    }
}

fn report_usage<W: Write, E: Write>(
    error: clap::Error,
    stdout: &mut W,
    stderr: &mut E,
) -> ExitCode {
    let rendered = error.render();
    if matches!(error.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
        drop(write!(stdout, "{rendered}"));
        ExitCode::SUCCESS
    } else {
        drop(write!(stderr, "{}", AppError::CliUsage(error)));
        ExitCode::from(2)
    }
}

fn dispatch<W, E, S, F>(
    cli: &Cli,
    argv: &[OsString],
    stdout: &mut W,
    stderr: &mut E,
    install_shutdown: F,
) -> Result<ExitCode, AppError>
where
    W: Write,
    E: Write,
    S: ShutdownSignal,
    F: FnOnce() -> Result<S, ShutdownError>,
{
    telemetry::initialise(&cli.telemetry())?;
    let config = cli.daemon_config(argv);
    match execute(cli.daemon_command(), &config)? {
        CommandOutcome::Daemon(pid) => {
            let mut shutdown = install_shutdown()?;
            serve(cli, pid, stdout, &mut shutdown)
        }
        CommandOutcome::Exit(report) => report_status(&report, stdout, stderr),
    }
}

/// Body of the detached daemon instance.
fn serve<W, S>(
    cli: &Cli,
    pid: u32,
    stdout: &mut W,
    shutdown: &mut S,
) -> Result<ExitCode, AppError>
where
    W: Write,
    S: ShutdownSignal,
{
    let trailing = match &cli.command {
        CliCommand::Start(start) => start.trailing.as_slice(),
        CliCommand::Stop | CliCommand::Status => &[][..],
    };
    writeln!(stdout, "daemon {pid} started with arguments {trailing:?}")?;
    stdout.flush()?;
    info!(target: CLI_TARGET, pid, "daemon ready");

    let signal = shutdown.wait()?;
    writeln!(stdout, "daemon {pid} stopping on signal {signal}")?;
    stdout.flush()?;
    Ok(ExitCode::SUCCESS)
}

fn report_status<W: Write, E: Write>(
    report: &ProbeReport,
    stdout: &mut W,
    stderr: &mut E,
) -> Result<ExitCode, AppError> {
    if let Some(error) = report.diagnostic() {
        writeln!(stderr, "respawn: {error}")?;
    }
    let code = report.code();
    writeln!(stdout, "{code}")?;
    Ok(code.into())
}

#[cfg(test)]
mod tests;
