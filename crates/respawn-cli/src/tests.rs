use super::*;

use std::fs;
use std::path::Path;

use respawn::DaemonStatusCode;
use respawn_config::{LogFormat, StopSignal};
use rstest::{fixture, rstest};
use tempfile::TempDir;

fn args(values: &[&str]) -> Vec<OsString> {
    values.iter().map(OsString::from).collect()
}

fn parse(values: &[&str]) -> Cli {
    Cli::try_parse_from(args(values)).expect("arguments parse")
}

struct ImmediateShutdown {
    signal: i32,
    waits: usize,
}

impl ShutdownSignal for ImmediateShutdown {
    fn wait(&mut self) -> Result<i32, ShutdownError> {
        self.waits += 1;
        Ok(self.signal)
    }
}

#[fixture]
fn dir() -> TempDir {
    TempDir::new().expect("temp dir")
}

#[test]
fn start_forwards_the_invocation_explicitly() {
    let argv = args(&["/usr/bin/respawn", "--pid-file", "/tmp/d.pid", "start", "--", "a b"]);
    let cli = Cli::try_parse_from(&argv).expect("parse");
    let config = cli.daemon_config(&argv);
    assert_eq!(config.argv(), Some(argv.as_slice()));
    assert_eq!(config.pid_file(), Some(Path::new("/tmp/d.pid")));
    assert_eq!(cli.daemon_command(), respawn::DaemonCommand::Start);
}

#[test]
fn infer_argv_leaves_reconstruction_to_the_platform() {
    let argv = args(&["respawn", "start", "--infer-argv"]);
    let config = parse(&["respawn", "start", "--infer-argv"]).daemon_config(&argv);
    assert_eq!(config.argv(), None);
}

#[test]
fn extra_arguments_reach_the_configuration() {
    let cli = parse(&[
        "respawn",
        "start",
        "--runtime-arg",
        "--log-format=json",
        "--program-arg",
        "extra",
    ]);
    let config = cli.daemon_config(&[]);
    assert_eq!(config.extra_runtime_args(), args(&["--log-format=json"]).as_slice());
    assert_eq!(config.extra_program_args(), args(&["extra"]).as_slice());
}

#[test]
fn trailing_arguments_are_captured_with_or_without_separator() {
    for argv in [
        &["respawn", "start", "--", "one", "--two"][..],
        &["respawn", "start", "one", "--two"][..],
    ] {
        match parse(argv).command {
            CliCommand::Start(start) => assert_eq!(start.trailing, args(&["one", "--two"])),
            other => panic!("expected start, got {other:?}"),
        }
    }
}

#[test]
fn probe_commands_ignore_start_only_settings() {
    let argv = args(&["respawn", "status", "--stdout", "/tmp/d.out"]);
    let cli = Cli::try_parse_from(&argv).expect("parse");
    let config = cli.daemon_config(&argv);
    assert_eq!(config.argv(), None);
    assert_eq!(config.stdout(), Path::new("/tmp/d.out"));
    assert_eq!(cli.daemon_command(), respawn::DaemonCommand::Status);
}

#[rstest]
#[case("interrupt", StopSignal::Interrupt)]
#[case("TERMINATE", StopSignal::Terminate)]
fn stop_signal_is_selectable(#[case] value: &str, #[case] expected: StopSignal) {
    let cli = parse(&["respawn", "stop", "--stop-signal", value]);
    assert_eq!(cli.daemon_config(&[]).stop_signal(), expected);
}

#[test]
fn logging_options_build_telemetry_settings() {
    let cli = parse(&["respawn", "--log-format", "json", "--log-filter", "debug", "status"]);
    let telemetry = cli.telemetry();
    assert_eq!(telemetry.log_format(), LogFormat::Json);
    assert_eq!(telemetry.log_filter(), "debug");
}

#[test]
fn serve_reports_arguments_and_waits_for_shutdown() {
    let cli = parse(&["respawn", "start", "--", "hello", "world"]);
    let mut shutdown = ImmediateShutdown {
        signal: 15,
        waits: 0,
    };
    let mut stdout = Vec::new();
    let code = serve(&cli, 4242, &mut stdout, &mut shutdown).expect("serve");

    assert_eq!(code, ExitCode::SUCCESS);
    assert_eq!(shutdown.waits, 1);
    let output = String::from_utf8(stdout).expect("utf8");
    assert_eq!(
        output,
        "daemon 4242 started with arguments [\"hello\", \"world\"]\ndaemon 4242 stopping on signal 15\n"
    );
}

#[rstest]
fn corrupt_pid_file_is_explained_on_stderr(dir: TempDir) {
    let pid_file = dir.path().join("d.pid");
    fs::write(&pid_file, "garbage").expect("seed");
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let exit = run(
        args(&["respawn", "status", "--pid-file", pid_file.to_str().expect("utf8 path")]),
        &mut stdout,
        &mut stderr,
    );
    assert_eq!(exit, ExitCode::from(DaemonStatusCode::Unknown.exit_code()));
    assert_eq!(String::from_utf8(stdout).expect("utf8"), "unknown\n");
    let message = String::from_utf8(stderr).expect("utf8");
    assert!(message.contains("holds 'garbage'"), "{message}");
}

#[rstest]
fn status_without_daemon_exits_three(dir: TempDir) {
    let pid_file = dir.path().join("absent.pid");
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let exit = run(
        args(&["respawn", "status", "--pid-file", pid_file.to_str().expect("utf8 path")]),
        &mut stdout,
        &mut stderr,
    );
    assert_eq!(exit, ExitCode::from(3));
    assert_eq!(String::from_utf8(stdout).expect("utf8"), "not running\n");
}

#[rstest]
fn stop_with_corrupt_pid_file_exits_one(dir: TempDir) {
    let pid_file = dir.path().join("d.pid");
    fs::write(&pid_file, "garbage").expect("seed");
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let exit = run(
        args(&["respawn", "stop", "--pid-file", pid_file.to_str().expect("utf8 path")]),
        &mut stdout,
        &mut stderr,
    );
    assert_eq!(exit, ExitCode::from(1));
}

#[test]
fn missing_pid_file_option_is_reported() {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let exit = run(args(&["respawn", "status"]), &mut stdout, &mut stderr);
    // RESPAWN_PID_FILE may be set in the environment running the tests.
    if std::env::var_os("RESPAWN_PID_FILE").is_none() {
        assert_eq!(exit, ExitCode::FAILURE);
        let message = String::from_utf8(stderr).expect("utf8");
        assert!(message.contains("no pid file is configured"), "{message}");
    }
}

#[test]
fn help_goes_to_stdout() {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let exit = run(args(&["respawn", "--help"]), &mut stdout, &mut stderr);
    assert_eq!(exit, ExitCode::SUCCESS);
    assert!(String::from_utf8(stdout).expect("utf8").contains("start"));
    assert!(stderr.is_empty());
}

#[test]
fn unknown_subcommand_is_a_usage_error() {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let exit = run(args(&["respawn", "restart"]), &mut stdout, &mut stderr);
    assert_eq!(exit, ExitCode::from(2));
    let message = String::from_utf8(stderr).expect("utf8");
    assert!(message.contains("restart"), "{message}");
    assert!(stdout.is_empty());
}
