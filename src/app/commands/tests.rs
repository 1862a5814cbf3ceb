use super::*;

use std::collections::VecDeque;
use std::sync::Mutex;

const DEVICE: &str = "test_device_123";
const PACKAGE: &str = "com.example.app";
const PACKAGE_LISTING: &str =
    "package:com.example.app\npackage:com.android.chrome\npackage:com.google.android.gms";
const PATH_LISTING: &str = "package:/data/app/com.example.app-1/base.apk=com.example.app\npackage:/data/app/com.android.chrome-2/base.apk=com.android.chrome";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    Run,
    Transfer,
}

/// Replays canned outputs in order (then `fallback`) and records every call.
struct FakeRunner {
    scripted: Mutex<VecDeque<CommandOutput>>,
    fallback: CommandOutput,
    calls: Mutex<Vec<(Channel, String)>>,
}

impl FakeRunner {
    fn with_stdout(stdout: &str) -> Self {
        Self {
            scripted: Mutex::new(VecDeque::new()),
            fallback: ok(stdout),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn scripted(outputs: Vec<CommandOutput>) -> Self {
        Self {
            scripted: Mutex::new(outputs.into()),
            fallback: ok(""),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<(Channel, String)> {
        self.calls.lock().expect("calls").clone()
    }

    fn commands(&self) -> Vec<String> {
        self.calls().into_iter().map(|(_, command)| command).collect()
    }

    fn record(&self, channel: Channel, args: &[String]) -> CommandOutput {
        self.calls
            .lock()
            .expect("calls")
            .push((channel, format!("adb {}", args.join(" "))));
        self.scripted
            .lock()
            .expect("scripted")
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, args: &[String], _trace_id: &str) -> Result<CommandOutput, AppError> {
        Ok(self.record(Channel::Run, args))
    }

    fn run_transfer(&self, args: &[String], _trace_id: &str) -> Result<CommandOutput, AppError> {
        Ok(self.record(Channel::Transfer, args))
    }
}

struct FailingRunner;

impl CommandRunner for FailingRunner {
    fn run(&self, _args: &[String], trace_id: &str) -> Result<CommandOutput, AppError> {
        Err(AppError::dependency("Failed to spawn adb: not found", trace_id))
    }
}

fn ok(stdout: &str) -> CommandOutput {
    CommandOutput {
        stdout: stdout.to_string(),
        stderr: String::new(),
        exit_code: Some(0),
    }
}

fn trace(value: &str) -> Option<String> {
    Some(value.to_string())
}

#[test]
fn resolve_trace_id_keeps_caller_value_or_generates_one() {
    assert_eq!(resolve_trace_id(trace("abc")), "abc");
    let generated = resolve_trace_id(trace("  "));
    assert!(Uuid::parse_str(&generated).is_ok());
    assert!(Uuid::parse_str(&resolve_trace_id(None)).is_ok());
}

#[test]
fn list_devices_filters_banner_and_daemon_messages() {
    let runner = FakeRunner::with_stdout(&format!(
        "List of devices attached\n{DEVICE} device\nemulator-5554 device\ndaemon not running\ndaemon started successfully"
    ));
    let response = list_devices(&runner, trace("trace-devices")).expect("list devices");

    let serials: Vec<&str> = response
        .data
        .iter()
        .map(|device| device.serial.as_str())
        .collect();
    assert_eq!(serials, vec![DEVICE, "emulator-5554"]);
    assert_eq!(response.trace_id, "trace-devices");
    assert_eq!(runner.commands(), vec!["adb devices -l"]);
}

#[test]
fn list_devices_parses_stdout_even_when_adb_exits_non_zero() {
    let runner = FakeRunner::scripted(vec![CommandOutput {
        stdout: "List of devices attached\nABC123 device\n".to_string(),
        stderr: "adb: warning".to_string(),
        exit_code: Some(1),
    }]);
    let response = list_devices(&runner, None).expect("list devices");
    assert_eq!(response.data.len(), 1);
    assert_eq!(response.data[0].serial, "ABC123");
}

#[test]
fn list_devices_propagates_runner_failures() {
    let err = list_devices(&FailingRunner, trace("trace-fail")).expect_err("expected error");
    assert_eq!(err.code, "ERR_DEPENDENCY");
    assert_eq!(err.trace_id, "trace-fail");
}

#[test]
fn list_packages_strips_marker_and_updates_inventory() {
    let state = AppState::new();
    let runner = FakeRunner::with_stdout(PACKAGE_LISTING);

    let response = list_packages(&runner, &state, DEVICE, None).expect("list packages");

    assert_eq!(
        response.data,
        vec!["com.example.app", "com.android.chrome", "com.google.android.gms"]
    );
    assert_eq!(*state.packages.snapshot(), response.data);
    assert_eq!(
        runner.commands(),
        vec![format!("adb -s {DEVICE} shell pm list packages")]
    );
}

#[test]
fn list_packages_requires_serial() {
    let state = AppState::new();
    let runner = FakeRunner::with_stdout(PACKAGE_LISTING);
    let err = list_packages(&runner, &state, " ", trace("trace-serial")).expect_err("expected err");
    assert_eq!(err.code, "ERR_VALIDATION");
    assert!(runner.calls().is_empty());
}

#[test]
fn search_uses_most_recent_listing() {
    let state = AppState::new();
    let runner = FakeRunner::with_stdout(PACKAGE_LISTING);
    list_packages(&runner, &state, DEVICE, None).expect("list packages");

    let results = search_packages(&state, "chrome", None).data;
    assert_eq!(results, vec!["com.android.chrome"]);

    let everything = search_packages(&state, "", None).data;
    assert_eq!(everything.len(), 3);

    let refreshed = FakeRunner::with_stdout("package:org.mozilla.firefox\n");
    list_packages(&refreshed, &state, DEVICE, None).expect("list packages");
    assert!(search_packages(&state, "chrome", None).data.is_empty());
}

#[test]
fn full_identifier_search_ranks_entry_first() {
    let state = AppState::new();
    let runner = FakeRunner::with_stdout(PACKAGE_LISTING);
    let packages = list_packages(&runner, &state, DEVICE, None)
        .expect("list packages")
        .data;
    for package in &packages {
        let results = search_packages(&state, package, None).data;
        assert_eq!(results.first(), Some(package));
    }
}

#[test]
fn get_apk_path_returns_exact_match() {
    let runner = FakeRunner::with_stdout(PATH_LISTING);
    let response = get_apk_path(&runner, DEVICE, PACKAGE, None).expect("apk path");
    assert_eq!(
        response.data.as_deref(),
        Some("/data/app/com.example.app-1/base.apk")
    );
    assert_eq!(
        runner.commands(),
        vec![format!("adb -s {DEVICE} shell pm list packages -f")]
    );
}

#[test]
fn get_apk_path_is_none_for_unknown_package() {
    let runner = FakeRunner::with_stdout(PATH_LISTING);
    let response = get_apk_path(&runner, DEVICE, "non.existent.package", None).expect("apk path");
    assert_eq!(response.data, None);
}

#[test]
fn download_apk_pulls_resolved_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out_dir = dir.path().join("apks");
    let runner = FakeRunner::scripted(vec![
        ok("package:/data/app/com.example.app-1/base.apk=com.example.app"),
        ok("/data/app/com.example.app-1/base.apk: 1 file pulled."),
    ]);

    let response =
        download_apk(&runner, DEVICE, PACKAGE, &out_dir, trace("trace-pull")).expect("download");

    let expected_local = out_dir.join("com.example.app.apk").to_string_lossy().to_string();
    assert_eq!(response.data.local_path, expected_local);
    assert_eq!(
        response.data.device_path,
        "/data/app/com.example.app-1/base.apk"
    );
    assert!(out_dir.is_dir());

    let calls = runner.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].0, Channel::Transfer);
    assert_eq!(
        calls[1].1,
        format!("adb -s {DEVICE} pull /data/app/com.example.app-1/base.apk {expected_local}")
    );
}

#[test]
fn download_apk_reports_missing_package() {
    let dir = tempfile::tempdir().expect("tempdir");
    let runner = FakeRunner::with_stdout(PATH_LISTING);
    let err = download_apk(&runner, DEVICE, "com.other.app", dir.path(), trace("trace-missing"))
        .expect_err("expected not found");
    assert_eq!(err.code, "ERR_NOT_FOUND");
    assert_eq!(err.trace_id, "trace-missing");
    assert_eq!(runner.calls().len(), 1);
}

#[test]
fn download_apk_fails_when_pull_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let runner = FakeRunner::scripted(vec![
        ok(PATH_LISTING),
        CommandOutput {
            stdout: String::new(),
            stderr: "adb: error: remote object does not exist".to_string(),
            exit_code: Some(1),
        },
    ]);
    let err = download_apk(&runner, DEVICE, PACKAGE, dir.path(), None).expect_err("pull fails");
    assert_eq!(err.code, "ERR_DEPENDENCY");
    assert!(err.error.contains("remote object does not exist"));
}

#[test]
fn launch_app_runs_monkey_with_launcher_category() {
    let runner = FakeRunner::with_stdout("Events injected: 1");
    let response = launch_app(&runner, DEVICE, PACKAGE, None).expect("launch");
    assert_eq!(
        runner.commands(),
        vec![format!(
            "adb -s {DEVICE} shell monkey -p {PACKAGE} -c android.intent.category.LAUNCHER 1"
        )]
    );
    assert_eq!(response.data.serial, DEVICE);
    assert_eq!(response.data.exit_code, Some(0));
}

#[test]
fn uninstall_clear_and_force_stop_issue_expected_commands() {
    let runner = FakeRunner::with_stdout("Success");
    uninstall_app(&runner, DEVICE, PACKAGE, None).expect("uninstall");
    clear_app_data(&runner, DEVICE, PACKAGE, None).expect("clear");
    force_stop_app(&runner, DEVICE, "com.example.app.with.dots", None).expect("force stop");
    assert_eq!(
        runner.commands(),
        vec![
            format!("adb -s {DEVICE} uninstall {PACKAGE}"),
            format!("adb -s {DEVICE} shell pm clear {PACKAGE}"),
            format!("adb -s {DEVICE} shell am force-stop com.example.app.with.dots"),
        ]
    );
}

#[test]
fn package_actions_reject_unsafe_package_names() {
    let runner = FakeRunner::with_stdout("");
    let err = clear_app_data(&runner, DEVICE, "com.example; reboot", trace("trace-unsafe"))
        .expect_err("expected validation error");
    assert_eq!(err.code, "ERR_VALIDATION");
    assert_eq!(err.trace_id, "trace-unsafe");

    let err = force_stop_app(&runner, DEVICE, "", None).expect_err("expected validation error");
    assert_eq!(err.code, "ERR_VALIDATION");
    assert!(runner.calls().is_empty());
}

#[test]
fn action_output_is_returned_even_on_failure_exit() {
    let runner = FakeRunner::scripted(vec![CommandOutput {
        stdout: "Failure [DELETE_FAILED_INTERNAL_ERROR]".to_string(),
        stderr: String::new(),
        exit_code: Some(1),
    }]);
    let response = uninstall_app(&runner, DEVICE, PACKAGE, None).expect("uninstall");
    assert_eq!(response.data.exit_code, Some(1));
    assert!(response.data.stdout.contains("DELETE_FAILED"));
}

#[test]
fn device_connected_when_packages_are_listed() {
    let state = AppState::new();
    let runner = FakeRunner::with_stdout("package:com.example.app\n");
    assert!(is_any_device_connected(&runner, &state, DEVICE, None).expect("connectivity check").data);
    assert_eq!(state.packages.snapshot().len(), 1);

    let empty = FakeRunner::with_stdout("");
    assert!(!is_any_device_connected(&empty, &state, DEVICE, None).expect("connectivity check").data);
    assert!(state.packages.snapshot().is_empty());
}

#[test]
fn chained_operations_issue_commands_in_order() {
    let state = AppState::new();
    let runner = FakeRunner::with_stdout("package:com.example.app\n");

    assert!(is_any_device_connected(&runner, &state, DEVICE, None).expect("connectivity check").data);
    clear_app_data(&runner, DEVICE, PACKAGE, None).expect("clear");
    launch_app(&runner, DEVICE, PACKAGE, None).expect("launch");
    force_stop_app(&runner, DEVICE, PACKAGE, None).expect("force stop");

    let commands = runner.commands();
    assert_eq!(commands.len(), 4);
    assert!(commands[0].ends_with("pm list packages"));
    assert!(commands[3].ends_with("am force-stop com.example.app"));
}
