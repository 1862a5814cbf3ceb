use std::sync::{Arc, PoisonError, RwLock};

use tracing::warn;

use crate::app::adb::apps::parse_package_list;
use crate::app::search::fuzzy_filter;

/// The most recently listed packages.
///
/// Rebuilding swaps in a whole new list; readers hold an `Arc` snapshot and
/// never see a half-written inventory.
#[derive(Debug, Default)]
pub struct PackageInventory {
    current: RwLock<Arc<Vec<String>>>,
}

impl PackageInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<Vec<String>> {
        // The guarded Arc is only ever replaced whole, so a poisoned lock still
        // holds a complete inventory.
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Parses `pm list packages` output and makes it the current inventory.
    pub fn rebuild(&self, output: &str) -> Vec<String> {
        let parsed = parse_package_list(output);
        if !parsed.is_clean() {
            warn!(
                skipped = parsed.skipped.len(),
                "ignored malformed package records"
            );
        }
        let packages = Arc::new(parsed.items);
        {
            let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
            *guard = Arc::clone(&packages);
        }
        packages.as_ref().clone()
    }

    pub fn search(&self, query: &str) -> Vec<String> {
        fuzzy_filter(&self.snapshot(), query)
    }
}
