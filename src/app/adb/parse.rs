use crate::app::adb::table::split_records;
use crate::app::models::Device;

/// Lines of `adb devices` output that never describe a device.
pub const DEVICE_LIST_EXCLUSIONS: [&str; 3] = [
    "List of devices attached",
    "daemon not running",
    "daemon started",
];

/// Parses `adb devices [-l]` output into device identifiers.
///
/// The serial is the first whitespace-separated column; the state column and
/// any `-l` detail fields are ignored.
pub fn parse_adb_devices(output: &str) -> Vec<Device> {
    split_records(output, &DEVICE_LIST_EXCLUSIONS)
        .into_iter()
        .filter_map(|record| record.split_whitespace().next())
        .map(|serial| Device {
            serial: serial.to_string(),
        })
        .collect()
}
