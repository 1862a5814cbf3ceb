use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app::error::AppError;

pub const CONFIG_PATH_ENV: &str = "APK_PILOT_CONFIG_PATH";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AdbSettings {
    /// Empty means `adb` from `PATH`.
    pub command_path: String,
    pub command_timeout_secs: u64,
    pub transfer_timeout_secs: u64,
}

impl Default for AdbSettings {
    fn default() -> Self {
        Self {
            command_path: String::new(),
            command_timeout_secs: 10,
            transfer_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingSettings {
    pub log_level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DownloadSettings {
    /// Where pulled APKs land. Empty means the current directory.
    pub output_dir: String,
}

impl DownloadSettings {
    pub fn output_dir(&self) -> PathBuf {
        let trimmed = self.output_dir.trim();
        if trimmed.is_empty() {
            PathBuf::from(".")
        } else {
            PathBuf::from(trimmed)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default)]
    pub adb: AdbSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub download: DownloadSettings,
    #[serde(default)]
    pub version: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            adb: AdbSettings::default(),
            logging: LoggingSettings::default(),
            download: DownloadSettings::default(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".apk_pilot_config.json")
}

fn backup_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "config".to_string());
    name.push_str(".backup.json");
    path.with_file_name(name)
}

pub fn load_config(trace_id: &str) -> Result<AppConfig, AppError> {
    load_config_from_path(&config_path(), trace_id)
}

pub fn save_config(config: &AppConfig, trace_id: &str) -> Result<(), AppError> {
    save_config_to_path(config, &config_path(), trace_id)
}

pub fn load_config_from_path(path: &Path, trace_id: &str) -> Result<AppConfig, AppError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let raw = fs::read_to_string(path)
        .map_err(|err| AppError::system(format!("Failed to read config: {err}"), trace_id))?;
    if raw.trim().is_empty() {
        return Ok(AppConfig::default());
    }
    let config: AppConfig = serde_json::from_str(&raw)
        .map_err(|err| AppError::config(format!("Failed to parse config: {err}"), trace_id))?;
    Ok(validate_config(config))
}

/// Writes `config` as pretty JSON, keeping the previous file as a backup.
pub fn save_config_to_path(
    config: &AppConfig,
    path: &Path,
    trace_id: &str,
) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    if path.exists() {
        let _ = fs::copy(path, backup_path_for(path));
    }
    let payload = serde_json::to_string_pretty(config).map_err(|err| {
        AppError::system(format!("Failed to serialize config: {err}"), trace_id)
    })?;
    fs::write(path, payload)
        .map_err(|err| AppError::system(format!("Failed to write config: {err}"), trace_id))?;
    Ok(())
}

fn validate_config(mut config: AppConfig) -> AppConfig {
    let defaults = AdbSettings::default();
    if !(1..=600).contains(&config.adb.command_timeout_secs) {
        config.adb.command_timeout_secs = defaults.command_timeout_secs;
    }
    if !(1..=3600).contains(&config.adb.transfer_timeout_secs) {
        config.adb.transfer_timeout_secs = defaults.transfer_timeout_secs;
    }
    if config.logging.log_level.trim().is_empty() {
        config.logging.log_level = LoggingSettings::default().log_level;
    }
    config
}
