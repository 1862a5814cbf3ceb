use std::fs;
use std::path::Path;

use tracing::{info, warn};
use uuid::Uuid;

use crate::app::adb::actions::{
    clear_data_args, devices_args, force_stop_args, is_valid_package_name, is_valid_serial,
    launch_args, list_package_paths_args, list_packages_args, pull_args, uninstall_args,
};
use crate::app::adb::apps::find_apk_path;
use crate::app::adb::parse::parse_adb_devices;
use crate::app::adb::runner::{CommandOutput, CommandRunner};
use crate::app::error::AppError;
use crate::app::models::{ApkDownload, CommandResponse, CommandResult, Device};
use crate::app::state::AppState;

pub fn resolve_trace_id(input: Option<String>) -> String {
    input
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

fn ensure_serial(serial: &str, trace_id: &str) -> Result<String, AppError> {
    let serial = serial.trim();
    if serial.is_empty() {
        return Err(AppError::validation("serial is required", trace_id));
    }
    if !is_valid_serial(serial) {
        return Err(AppError::validation(
            format!("serial must not contain whitespace: {serial:?}"),
            trace_id,
        ));
    }
    Ok(serial.to_string())
}

fn ensure_package(package_name: &str, trace_id: &str) -> Result<String, AppError> {
    let package_name = package_name.trim();
    if package_name.is_empty() {
        return Err(AppError::validation("package_name is required", trace_id));
    }
    if !is_valid_package_name(package_name) {
        return Err(AppError::validation(
            format!("Invalid package name: {package_name:?}"),
            trace_id,
        ));
    }
    Ok(package_name.to_string())
}

/// Inventory queries parse whatever adb printed; a failing exit status is
/// only reported.
fn query_stdout(
    runner: &dyn CommandRunner,
    args: &[String],
    step: &str,
    trace_id: &str,
) -> Result<String, AppError> {
    let output = runner.run(args, trace_id)?;
    if !output.succeeded() {
        warn!(
            trace_id = %trace_id,
            step = step,
            exit_code = ?output.exit_code,
            stderr = %output.stderr.trim(),
            "adb query exited abnormally; parsing stdout anyway"
        );
    }
    Ok(output.stdout)
}

pub fn list_devices(
    runner: &dyn CommandRunner,
    trace_id: Option<String>,
) -> Result<CommandResponse<Vec<Device>>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    let stdout = query_stdout(runner, &devices_args(), "devices", &trace_id)?;
    let devices = parse_adb_devices(&stdout);
    info!(trace_id = %trace_id, count = devices.len(), "list_devices");
    Ok(CommandResponse {
        trace_id,
        data: devices,
    })
}

/// Lists installed packages and makes them the inventory searched by
/// [`search_packages`].
pub fn list_packages(
    runner: &dyn CommandRunner,
    state: &AppState,
    serial: &str,
    trace_id: Option<String>,
) -> Result<CommandResponse<Vec<String>>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    let serial = ensure_serial(serial, &trace_id)?;
    let stdout = query_stdout(runner, &list_packages_args(&serial), "packages", &trace_id)?;
    let packages = state.packages.rebuild(&stdout);
    info!(
        trace_id = %trace_id,
        serial = %serial,
        count = packages.len(),
        "list_packages"
    );
    Ok(CommandResponse {
        trace_id,
        data: packages,
    })
}

/// Fuzzy-searches the packages from the most recent [`list_packages`] call.
pub fn search_packages(
    state: &AppState,
    query: &str,
    trace_id: Option<String>,
) -> CommandResponse<Vec<String>> {
    let trace_id = resolve_trace_id(trace_id);
    let matches = state.packages.search(query);
    info!(
        trace_id = %trace_id,
        query = %query,
        count = matches.len(),
        "search_packages"
    );
    CommandResponse {
        trace_id,
        data: matches,
    }
}

/// `None` when the package is not installed on the device.
pub fn get_apk_path(
    runner: &dyn CommandRunner,
    serial: &str,
    package_name: &str,
    trace_id: Option<String>,
) -> Result<CommandResponse<Option<String>>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    let serial = ensure_serial(serial, &trace_id)?;
    let package_name = ensure_package(package_name, &trace_id)?;
    let stdout = query_stdout(
        runner,
        &list_package_paths_args(&serial),
        "package_paths",
        &trace_id,
    )?;
    let apk_path = find_apk_path(&stdout, &package_name);
    if apk_path.is_none() {
        info!(
            trace_id = %trace_id,
            serial = %serial,
            package_name = %package_name,
            "package not found on device"
        );
    }
    Ok(CommandResponse {
        trace_id,
        data: apk_path,
    })
}

/// Pulls the package's APK into `output_dir` as `<package>.apk`.
pub fn download_apk(
    runner: &dyn CommandRunner,
    serial: &str,
    package_name: &str,
    output_dir: &Path,
    trace_id: Option<String>,
) -> Result<CommandResponse<ApkDownload>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    let serial = ensure_serial(serial, &trace_id)?;
    let package_name = ensure_package(package_name, &trace_id)?;

    let device_path = get_apk_path(runner, &serial, &package_name, Some(trace_id.clone()))?
        .data
        .ok_or_else(|| {
            AppError::not_found(
                format!("Package {package_name} is not installed on {serial}"),
                &trace_id,
            )
        })?;

    fs::create_dir_all(output_dir).map_err(|err| {
        AppError::system(
            format!("Failed to create {}: {err}", output_dir.display()),
            &trace_id,
        )
    })?;
    let local_path = output_dir
        .join(format!("{package_name}.apk"))
        .to_string_lossy()
        .to_string();

    let output = runner.run_transfer(&pull_args(&serial, &device_path, &local_path), &trace_id)?;
    if !output.succeeded() {
        return Err(AppError::dependency(
            format!("adb pull failed: {}", output.stderr.trim()),
            &trace_id,
        ));
    }
    info!(
        trace_id = %trace_id,
        serial = %serial,
        device_path = %device_path,
        local_path = %local_path,
        "download_apk"
    );

    Ok(CommandResponse {
        trace_id,
        data: ApkDownload {
            package_name,
            device_path,
            local_path,
        },
    })
}

fn run_package_action(
    runner: &dyn CommandRunner,
    action: &str,
    serial: &str,
    package_name: &str,
    build_args: fn(&str, &str) -> Vec<String>,
    trace_id: Option<String>,
) -> Result<CommandResponse<CommandResult>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    let serial = ensure_serial(serial, &trace_id)?;
    let package_name = ensure_package(package_name, &trace_id)?;

    let CommandOutput {
        stdout,
        stderr,
        exit_code,
    } = runner.run(&build_args(&serial, &package_name), &trace_id)?;
    info!(
        trace_id = %trace_id,
        serial = %serial,
        package_name = %package_name,
        exit_code = ?exit_code,
        stdout = %stdout.trim(),
        "{action}"
    );

    Ok(CommandResponse {
        trace_id,
        data: CommandResult {
            serial,
            stdout,
            stderr,
            exit_code,
        },
    })
}

pub fn launch_app(
    runner: &dyn CommandRunner,
    serial: &str,
    package_name: &str,
    trace_id: Option<String>,
) -> Result<CommandResponse<CommandResult>, AppError> {
    run_package_action(runner, "launch_app", serial, package_name, launch_args, trace_id)
}

pub fn uninstall_app(
    runner: &dyn CommandRunner,
    serial: &str,
    package_name: &str,
    trace_id: Option<String>,
) -> Result<CommandResponse<CommandResult>, AppError> {
    run_package_action(
        runner,
        "uninstall_app",
        serial,
        package_name,
        uninstall_args,
        trace_id,
    )
}

pub fn clear_app_data(
    runner: &dyn CommandRunner,
    serial: &str,
    package_name: &str,
    trace_id: Option<String>,
) -> Result<CommandResponse<CommandResult>, AppError> {
    run_package_action(
        runner,
        "clear_app_data",
        serial,
        package_name,
        clear_data_args,
        trace_id,
    )
}

pub fn force_stop_app(
    runner: &dyn CommandRunner,
    serial: &str,
    package_name: &str,
    trace_id: Option<String>,
) -> Result<CommandResponse<CommandResult>, AppError> {
    run_package_action(
        runner,
        "force_stop_app",
        serial,
        package_name,
        force_stop_args,
        trace_id,
    )
}

/// A device counts as connected when it reports at least one package. This
/// also refreshes the searchable inventory.
pub fn is_any_device_connected(
    runner: &dyn CommandRunner,
    state: &AppState,
    serial: &str,
    trace_id: Option<String>,
) -> Result<CommandResponse<bool>, AppError> {
    let response = list_packages(runner, state, serial, trace_id)?;
    Ok(CommandResponse {
        trace_id: response.trace_id,
        data: !response.data.is_empty(),
    })
}

#[cfg(test)]
mod tests;
