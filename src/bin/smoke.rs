use std::path::PathBuf;
use std::time::Instant;

use apk_pilot::app::adb::runner::AdbRunner;
use apk_pilot::app::commands::{
    download_apk, force_stop_app, get_apk_path, launch_app, list_devices, list_packages,
    search_packages,
};
use apk_pilot::app::config::{config_path, load_config, save_config};
use apk_pilot::app::error::AppError;
use apk_pilot::app::logging::init_logging;
use apk_pilot::app::state::AppState;
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
struct Args {
    serial: Option<String>,
    query: Option<String>,
    package: Option<String>,
    out_dir: Option<PathBuf>,
    download: bool,
    launch: bool,
    init_config: bool,
    json: bool,
}

#[derive(Serialize)]
struct SmokeSummary {
    tool: &'static str,
    status: &'static str,
    trace_id: String,
    generated_at: String,
    serial: Option<String>,
    adb_program: Option<String>,
    checks: Vec<SmokeCheck>,
}

#[derive(Serialize)]
struct SmokeCheck {
    name: &'static str,
    status: &'static str, // pass|fail|skip
    duration_ms: u128,
    detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

const USAGE: &str = "Usage: smoke [--serial SERIAL] [--query TEXT] [--package PKG] [--download] [--out DIR] [--launch] [--init-config] [--json]";

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        serial: std::env::var("ANDROID_SERIAL")
            .ok()
            .filter(|s| !s.trim().is_empty()),
        ..Args::default()
    };

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--serial" => {
                args.serial = it
                    .next()
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty());
                if args.serial.is_none() {
                    return Err("--serial requires a value".to_string());
                }
            }
            "--query" => {
                let value = it
                    .next()
                    .ok_or_else(|| "--query requires a value".to_string())?;
                args.query = Some(value);
            }
            "--package" => {
                let value = it
                    .next()
                    .ok_or_else(|| "--package requires a value".to_string())?;
                args.package = Some(value);
            }
            "--out" => {
                let value = it
                    .next()
                    .ok_or_else(|| "--out requires a value".to_string())?;
                args.out_dir = Some(PathBuf::from(value));
            }
            "--download" => args.download = true,
            "--launch" => args.launch = true,
            "--init-config" => args.init_config = true,
            "--json" => args.json = true,
            "-h" | "--help" => return Err(USAGE.to_string()),
            other => return Err(format!("Unknown arg: {other}\n{USAGE}")),
        }
    }

    if (args.download || args.launch) && args.package.is_none() {
        return Err("--download and --launch require --package".to_string());
    }
    Ok(args)
}

fn run_check<T>(
    checks: &mut Vec<SmokeCheck>,
    name: &'static str,
    f: impl FnOnce() -> Result<T, AppError>,
    describe: impl FnOnce(&T) -> String,
) -> Option<T> {
    let started = Instant::now();
    match f() {
        Ok(value) => {
            checks.push(SmokeCheck {
                name,
                status: "pass",
                duration_ms: started.elapsed().as_millis(),
                detail: Some(describe(&value)),
                error_code: None,
                error: None,
            });
            Some(value)
        }
        Err(err) => {
            checks.push(SmokeCheck {
                name,
                status: "fail",
                duration_ms: started.elapsed().as_millis(),
                detail: None,
                error_code: Some(err.code.clone()),
                error: Some(err.error),
            });
            None
        }
    }
}

fn skip(checks: &mut Vec<SmokeCheck>, name: &'static str, reason: &str) {
    checks.push(SmokeCheck {
        name,
        status: "skip",
        duration_ms: 0,
        detail: Some(reason.to_string()),
        error_code: None,
        error: None,
    });
}

fn print_summary(summary: &SmokeSummary, json: bool) {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(summary).unwrap_or_default()
        );
        return;
    }
    println!(
        "{} [{}] trace={} serial={}",
        summary.tool,
        summary.status,
        summary.trace_id,
        summary.serial.as_deref().unwrap_or("-")
    );
    for check in &summary.checks {
        let note = check
            .error
            .as_deref()
            .or(check.detail.as_deref())
            .unwrap_or("");
        println!(
            "  {:<14} {:<4} {:>6}ms  {}",
            check.name, check.status, check.duration_ms, note
        );
    }
}

fn main() {
    let args = match parse_args() {
        Ok(v) => v,
        Err(msg) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
    };

    let trace_id = Uuid::new_v4().to_string();
    let mut checks: Vec<SmokeCheck> = Vec::new();
    let mut summary = SmokeSummary {
        tool: "apk_pilot_smoke",
        status: "pass",
        trace_id: trace_id.clone(),
        generated_at: Utc::now().to_rfc3339(),
        serial: None,
        adb_program: None,
        checks: Vec::new(),
    };

    let config = match load_config(&trace_id) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };
    init_logging(&config.logging);

    if args.init_config {
        let path = config_path();
        if path.exists() {
            skip(&mut checks, "init_config", "config file already exists");
        } else {
            run_check(
                &mut checks,
                "init_config",
                || save_config(&config, &trace_id),
                |_| path.display().to_string(),
            );
        }
    }

    let runner = match AdbRunner::from_settings(&config.adb, &trace_id) {
        Ok(runner) => runner,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };
    summary.adb_program = Some(runner.program.clone());
    let state = AppState::shared();

    let devices = run_check(
        &mut checks,
        "list_devices",
        || list_devices(&runner, Some(trace_id.clone())),
        |resp| format!("{} device(s)", resp.data.len()),
    );
    let serial = args.serial.clone().or_else(|| {
        devices
            .as_ref()
            .and_then(|resp| resp.data.first())
            .map(|device| device.serial.clone())
    });
    summary.serial = serial.clone();

    match serial.as_deref() {
        None => skip(&mut checks, "list_packages", "no device available"),
        Some(serial) => {
            run_check(
                &mut checks,
                "list_packages",
                || list_packages(&runner, state, serial, Some(trace_id.clone())),
                |resp| format!("{} package(s)", resp.data.len()),
            );

            if let Some(query) = args.query.as_deref() {
                let started = Instant::now();
                let matches = search_packages(state, query, Some(trace_id.clone())).data;
                checks.push(SmokeCheck {
                    name: "search",
                    status: "pass",
                    duration_ms: started.elapsed().as_millis(),
                    detail: Some(matches.iter().take(5).cloned().collect::<Vec<_>>().join(", ")),
                    error_code: None,
                    error: None,
                });
            }

            if let Some(package) = args.package.as_deref() {
                run_check(
                    &mut checks,
                    "apk_path",
                    || get_apk_path(&runner, serial, package, Some(trace_id.clone())),
                    |resp| resp.data.clone().unwrap_or_else(|| "not installed".to_string()),
                );

                if args.download {
                    let out_dir = args
                        .out_dir
                        .clone()
                        .unwrap_or_else(|| config.download.output_dir());
                    run_check(
                        &mut checks,
                        "download_apk",
                        || download_apk(&runner, serial, package, &out_dir, Some(trace_id.clone())),
                        |resp| resp.data.local_path.clone(),
                    );
                }

                if args.launch {
                    run_check(
                        &mut checks,
                        "launch_app",
                        || launch_app(&runner, serial, package, Some(trace_id.clone())),
                        |resp| format!("exit {:?}", resp.data.exit_code),
                    );
                    run_check(
                        &mut checks,
                        "force_stop",
                        || force_stop_app(&runner, serial, package, Some(trace_id.clone())),
                        |resp| format!("exit {:?}", resp.data.exit_code),
                    );
                }
            }
        }
    }

    if checks.iter().any(|check| check.status == "fail") {
        summary.status = "fail";
    }
    summary.checks = checks;
    print_summary(&summary, args.json);
    if summary.status == "fail" {
        std::process::exit(1);
    }
}
