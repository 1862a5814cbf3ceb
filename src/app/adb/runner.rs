use std::io::Read;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::app::adb::locator::{locate_adb, validate_adb_program};
use crate::app::config::AdbSettings;
use crate::app::error::AppError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs adb with the given arguments and captures its output.
///
/// Timeouts and cancellation belong to the implementation; callers only see
/// the captured text or an error.
pub trait CommandRunner {
    fn run(&self, args: &[String], trace_id: &str) -> Result<CommandOutput, AppError>;

    /// Long-running copies such as `adb pull`.
    fn run_transfer(&self, args: &[String], trace_id: &str) -> Result<CommandOutput, AppError> {
        self.run(args, trace_id)
    }
}

#[derive(Debug, Clone)]
pub struct AdbRunner {
    pub program: String,
    pub timeout: Duration,
    pub transfer_timeout: Duration,
}

impl AdbRunner {
    pub fn new(program: impl Into<String>) -> Self {
        let defaults = AdbSettings::default();
        Self {
            program: program.into(),
            timeout: Duration::from_secs(defaults.command_timeout_secs),
            transfer_timeout: Duration::from_secs(defaults.transfer_timeout_secs),
        }
    }

    pub fn from_settings(settings: &AdbSettings, trace_id: &str) -> Result<Self, AppError> {
        let location = locate_adb(&settings.command_path);
        validate_adb_program(&location.program)
            .map_err(|message| AppError::dependency(message, trace_id))?;
        info!(
            trace_id = %trace_id,
            program = %location.program,
            source = ?location.source,
            "resolved adb"
        );
        Ok(Self {
            program: location.program,
            timeout: Duration::from_secs(settings.command_timeout_secs),
            transfer_timeout: Duration::from_secs(settings.transfer_timeout_secs),
        })
    }
}

impl CommandRunner for AdbRunner {
    fn run(&self, args: &[String], trace_id: &str) -> Result<CommandOutput, AppError> {
        run_command_with_timeout(&self.program, args, self.timeout, trace_id)
    }

    fn run_transfer(&self, args: &[String], trace_id: &str) -> Result<CommandOutput, AppError> {
        run_command_with_timeout(&self.program, args, self.transfer_timeout, trace_id)
    }
}

fn drain<R: Read + Send + 'static>(reader: R) -> std::thread::JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut reader = reader;
        let mut buffer = Vec::<u8>::new();
        let mut temp = [0u8; 4096];
        loop {
            match reader.read(&mut temp) {
                Ok(0) => break,
                Ok(count) => buffer.extend_from_slice(&temp[..count]),
                Err(_) => break,
            }
        }
        buffer
    })
}

pub fn run_command_with_timeout(
    program: &str,
    args: &[String],
    timeout: Duration,
    trace_id: &str,
) -> Result<CommandOutput, AppError> {
    debug!(trace_id = %trace_id, program = %program, args = ?args, "spawning command");
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| {
            AppError::dependency(format!("Failed to spawn {program}: {err}"), trace_id)
        })?;

    // Drain both pipes while waiting; a chatty child blocks once a pipe buffer
    // fills and would otherwise run into the timeout.
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| AppError::system("Failed to capture stdout", trace_id))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| AppError::system("Failed to capture stderr", trace_id))?;
    let stdout_handle = drain(stdout);
    let stderr_handle = drain(stderr);

    let start = Instant::now();
    let exit_code = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status.code(),
            Ok(None) => {
                if start.elapsed() > timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    let _ = stdout_handle.join();
                    let _ = stderr_handle.join();
                    return Err(AppError::system(
                        format!("Command timed out after {timeout:?}"),
                        trace_id,
                    ));
                }
                std::thread::sleep(Duration::from_millis(20));
            }
            Err(err) => {
                let _ = stdout_handle.join();
                let _ = stderr_handle.join();
                return Err(AppError::system(
                    format!("Failed to poll command: {err}"),
                    trace_id,
                ));
            }
        }
    };

    let stdout_bytes = stdout_handle.join().unwrap_or_default();
    let stderr_bytes = stderr_handle.join().unwrap_or_default();

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&stdout_bytes).to_string(),
        stderr: String::from_utf8_lossy(&stderr_bytes).to_string(),
        exit_code,
    })
}
