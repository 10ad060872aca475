// Display helpers shared by the JSON API and log output

use serde::Serialize;

const BYTE_UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

/// CPU load above this is flagged as hot.
pub const CPU_HOT_PERCENT: f64 = 80.0;

pub const TIMEOUT_LABEL: &str = "No public pRPC (timeout)";

/// "1.5 GB" style, base 1024, at most two decimals.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".into();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < BYTE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, BYTE_UNITS[unit])
}

/// "3d 4h", "4h 12m" or "12m 5s".
pub fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3600;
    let minutes = (seconds % 3600) / 60;
    if days > 0 {
        format!("{}d {}h", days, hours)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m {}s", minutes, seconds % 60)
    }
}

/// User-facing error text; timeouts get a friendlier label.
pub fn error_label(error: &str) -> String {
    if error.contains("Request timed out") {
        TIMEOUT_LABEL.into()
    } else {
        error.into()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LatencyClass {
    Fast,
    Moderate,
    Slow,
}

impl LatencyClass {
    pub fn from_ms(latency_ms: u64) -> Self {
        if latency_ms < 400 {
            LatencyClass::Fast
        } else if latency_ms < 1000 {
            LatencyClass::Moderate
        } else {
            LatencyClass::Slow
        }
    }
}
