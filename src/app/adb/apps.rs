use crate::app::adb::table::{parse_records, ParsedRecords, SkipReason};
use crate::app::models::PackageEntry;

pub const PACKAGE_MARKER: &str = "package:";

fn strip_marker(record: &str) -> &str {
    record.strip_prefix(PACKAGE_MARKER).unwrap_or(record).trim()
}

/// Parses `pm list packages` output (`package:<id>` per line).
pub fn parse_package_list(output: &str) -> ParsedRecords<String> {
    parse_records(output, &[], |record| {
        let package = strip_marker(record);
        if package.is_empty() {
            return Err(SkipReason::EmptyPackageName);
        }
        Ok(package.to_string())
    })
}

/// Parses `pm list packages -f` output (`package:<path>=<id>` per line).
///
/// Install directories on recent Android releases contain base64 padding, so
/// the id is taken after the last `=`.
pub fn parse_package_paths(output: &str) -> ParsedRecords<PackageEntry> {
    parse_records(output, &[], |record| {
        let payload = strip_marker(record);
        let (apk_path, package) = payload
            .rsplit_once('=')
            .ok_or(SkipReason::MissingSeparator)?;
        let apk_path = apk_path.trim();
        let package = package.trim();
        if package.is_empty() {
            return Err(SkipReason::EmptyPackageName);
        }
        if apk_path.is_empty() {
            return Err(SkipReason::EmptyPath);
        }
        Ok(PackageEntry {
            package_name: package.to_string(),
            apk_path: apk_path.to_string(),
        })
    })
}

/// Returns the on-device APK path for `package`, or `None` when the listing
/// has no entry with exactly that id. The first match wins.
pub fn find_apk_path(output: &str, package: &str) -> Option<String> {
    let wanted = package.trim();
    parse_package_paths(output)
        .items
        .into_iter()
        .find(|entry| entry.package_name == wanted)
        .map(|entry| entry.apk_path)
}
