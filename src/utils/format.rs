const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
const MIB: u64 = 1024 * 1024;

/// Formats a byte count with 1024-step units and two decimals, e.g. `15.78GB`.
pub fn human_bytes(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value > 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2}{}", value, UNITS[unit])
}

pub fn mebibytes(bytes: u64) -> u64 {
    bytes / MIB
}
