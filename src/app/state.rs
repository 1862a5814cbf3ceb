use std::sync::OnceLock;

use crate::app::inventory::PackageInventory;

#[derive(Debug, Default)]
pub struct AppState {
    pub packages: PackageInventory,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            packages: PackageInventory::new(),
        }
    }

    /// Process-wide state shared by callers that do not manage their own.
    pub fn shared() -> &'static AppState {
        static STATE: OnceLock<AppState> = OnceLock::new();
        STATE.get_or_init(AppState::new)
    }
}
