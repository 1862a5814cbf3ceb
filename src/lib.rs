//! Inspect and control Android devices through the `adb` command-line tool.
//!
//! Device and package listings are parsed from adb's text output; the package
//! inventory from the latest listing can be fuzzy-searched.

pub mod app;

pub use app::adb::runner::{AdbRunner, CommandOutput, CommandRunner};
pub use app::error::AppError;
pub use app::models::{Device, PackageEntry};
pub use app::search::fuzzy_filter;
pub use app::state::AppState;
