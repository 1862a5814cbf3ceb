//! Line-oriented record splitting shared by the device and package parsers.
//!
//! adb prints loosely structured tables: one record per line, mixed with
//! banners ("List of devices attached") and daemon status notices. The helpers
//! here strip that noise and hand each surviving, trimmed line to a
//! record-shape parser.

use serde::Serialize;

/// Why a record was dropped by a record-shape parser.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingSeparator,
    EmptyPackageName,
    EmptyPath,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SkippedRecord {
    pub line: String,
    pub reason: SkipReason,
}

/// Records accepted by a shape parser, plus the lines it rejected.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ParsedRecords<T> {
    pub items: Vec<T>,
    pub skipped: Vec<SkippedRecord>,
}

impl<T> ParsedRecords<T> {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

impl<T> Default for ParsedRecords<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

/// Splits `output` into raw records.
///
/// Empty lines and lines containing any of `exclusions` are dropped, the rest
/// are trimmed. Order and duplicates are kept as printed.
pub fn split_records<'a>(output: &'a str, exclusions: &[&str]) -> Vec<&'a str> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter(|line| !exclusions.iter().any(|needle| line.contains(needle)))
        .map(str::trim)
        .collect()
}

pub fn parse_records<T, F>(output: &str, exclusions: &[&str], parser: F) -> ParsedRecords<T>
where
    F: Fn(&str) -> Result<T, SkipReason>,
{
    let mut parsed = ParsedRecords::default();
    for record in split_records(output, exclusions) {
        match parser(record) {
            Ok(item) => parsed.items.push(item),
            Err(reason) => {
                tracing::debug!(line = %record, reason = ?reason, "skipping malformed adb record");
                parsed.skipped.push(SkippedRecord {
                    line: record.to_string(),
                    reason,
                });
            }
        }
    }
    parsed
}
