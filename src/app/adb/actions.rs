//! adb argument vectors for every device query and package action.

use std::sync::OnceLock;

use regex::Regex;

pub const LAUNCHER_CATEGORY: &str = "android.intent.category.LAUNCHER";

fn package_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_]+(\.[A-Za-z0-9_]+)*$").expect("package name regex is valid")
    })
}

/// Package names end up on the device shell command line, so anything outside
/// the dotted identifier alphabet is refused.
pub fn is_valid_package_name(value: &str) -> bool {
    package_name_regex().is_match(value)
}

pub fn is_valid_serial(value: &str) -> bool {
    !value.is_empty() && !value.chars().any(char::is_whitespace)
}

fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|part| part.to_string()).collect()
}

pub fn devices_args() -> Vec<String> {
    args(&["devices", "-l"])
}

pub fn list_packages_args(serial: &str) -> Vec<String> {
    args(&["-s", serial, "shell", "pm", "list", "packages"])
}

pub fn list_package_paths_args(serial: &str) -> Vec<String> {
    args(&["-s", serial, "shell", "pm", "list", "packages", "-f"])
}

pub fn pull_args(serial: &str, device_path: &str, local_path: &str) -> Vec<String> {
    args(&["-s", serial, "pull", device_path, local_path])
}

pub fn launch_args(serial: &str, package: &str) -> Vec<String> {
    args(&[
        "-s",
        serial,
        "shell",
        "monkey",
        "-p",
        package,
        "-c",
        LAUNCHER_CATEGORY,
        "1",
    ])
}

pub fn uninstall_args(serial: &str, package: &str) -> Vec<String> {
    args(&["-s", serial, "uninstall", package])
}

pub fn clear_data_args(serial: &str, package: &str) -> Vec<String> {
    args(&["-s", serial, "shell", "pm", "clear", package])
}

pub fn force_stop_args(serial: &str, package: &str) -> Vec<String> {
    args(&["-s", serial, "shell", "am", "force-stop", package])
}
