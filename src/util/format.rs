//! Human readable durations and sizes.

const BYTE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Format a duration: `850ms`, `1.5s`, `2m 05s`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_millis(millis: u64) -> String {
    if millis < 1_000 {
        return format!("{millis}ms");
    }
    if millis < 60_000 {
        return trim_decimals(millis as f64 / 1_000.0, 1) + "s";
    }
    let secs = millis / 1_000;
    format!("{}m {:02}s", secs / 60, secs % 60)
}

/// Format a byte count with binary multiples: `512 B`, `1.5 KB`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < BYTE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{} {}", trim_decimals(value, 2), BYTE_UNITS[unit])
}

fn trim_decimals(value: f64, decimals: usize) -> String {
    let fixed = format!("{value:.decimals$}");
    if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.').to_owned()
    } else {
        fixed
    }
}
