//! Finding the adb executable.
//!
//! Order: the configured `command_path`, then `platform-tools/adb` under an
//! Android SDK named by `ANDROID_HOME` / `ANDROID_SDK_ROOT`, then plain `adb`
//! resolved through `PATH` when the process is spawned.

use std::path::{Path, PathBuf};

use serde::Serialize;

pub const SEARCH_PATH_PROGRAM: &str = "adb";
pub const SDK_ROOT_VARS: [&str; 2] = ["ANDROID_HOME", "ANDROID_SDK_ROOT"];

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AdbSource {
    Configured,
    Sdk,
    SearchPath,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AdbLocation {
    pub program: String,
    pub source: AdbSource,
}

fn sdk_adb_name() -> &'static str {
    if cfg!(windows) {
        "adb.exe"
    } else {
        "adb"
    }
}

/// Trims the value and drops one pair of matching surrounding quotes, as left
/// behind by paths pasted from a shell.
pub fn normalize_command_path(value: &str) -> String {
    let trimmed = value.trim();
    let unquoted = match trimmed.chars().next() {
        Some(quote @ ('"' | '\'')) if trimmed.len() >= 2 && trimmed.ends_with(quote) => {
            &trimmed[1..trimmed.len() - 1]
        }
        _ => trimmed,
    };
    unquoted.trim().to_string()
}

pub fn locate_adb(config_command_path: &str) -> AdbLocation {
    let sdk_roots: Vec<PathBuf> = SDK_ROOT_VARS
        .iter()
        .filter_map(|name| std::env::var_os(name))
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .collect();
    locate_adb_in(config_command_path, &sdk_roots)
}

pub fn locate_adb_in(config_command_path: &str, sdk_roots: &[PathBuf]) -> AdbLocation {
    let configured = normalize_command_path(config_command_path);
    if !configured.is_empty() {
        return AdbLocation {
            program: configured,
            source: AdbSource::Configured,
        };
    }
    let from_sdk = sdk_roots
        .iter()
        .map(|root| root.join("platform-tools").join(sdk_adb_name()))
        .find(|candidate| candidate.is_file());
    match from_sdk {
        Some(path) => AdbLocation {
            program: path.to_string_lossy().to_string(),
            source: AdbSource::Sdk,
        },
        None => AdbLocation {
            program: SEARCH_PATH_PROGRAM.to_string(),
            source: AdbSource::SearchPath,
        },
    }
}

/// Explicit paths must name an existing file; bare names are left to `PATH`.
pub fn validate_adb_program(program: &str) -> Result<(), String> {
    if program.trim().is_empty() {
        return Err("adb program is empty".to_string());
    }
    if !program.contains(['/', '\\']) {
        return Ok(());
    }
    let path = Path::new(program);
    if path.is_dir() {
        return Err(format!("{program} is a directory, not the adb executable"));
    }
    if !path.exists() {
        return Err(format!("adb executable not found at {program}"));
    }
    Ok(())
}
