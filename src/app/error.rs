use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AppError {
    pub error: String,
    pub code: String,
    pub trace_id: String,
}

impl AppError {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        trace_id: impl Into<String>,
    ) -> Self {
        Self {
            error: message.into(),
            code: code.into(),
            trace_id: trace_id.into(),
        }
    }

    pub fn validation(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self::new("ERR_VALIDATION", message, trace_id)
    }

    /// A lookup (for example an APK path) found nothing on the device.
    pub fn not_found(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self::new("ERR_NOT_FOUND", message, trace_id)
    }

    pub fn dependency(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self::new("ERR_DEPENDENCY", message, trace_id)
    }

    pub fn config(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self::new("ERR_CONFIG", message, trace_id)
    }

    pub fn system(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self::new("ERR_SYSTEM", message, trace_id)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.trace_id.is_empty() {
            write!(f, "{} ({})", self.error, self.code)
        } else {
            write!(f, "{} ({}, trace {})", self.error, self.code, self.trace_id)
        }
    }
}

impl std::error::Error for AppError {}
