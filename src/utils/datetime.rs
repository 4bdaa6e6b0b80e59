//! Date and time utility functions
//!
//! Timestamps are stored as epoch milliseconds throughout the local schema;
//! this module converts between those and human-readable strings.

use chrono::{DateTime, Local, TimeZone, Utc};

/// Date format used by the exporters
pub const EXPORT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Datetime format used by the exporters
pub const EXPORT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Current time as epoch milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert epoch milliseconds to a local `DateTime`, clamping out-of-range
/// values to the epoch rather than failing.
pub fn from_millis(millis: i64) -> DateTime<Local> {
    Local
        .timestamp_millis_opt(millis)
        .single()
        .unwrap_or_else(|| Local.timestamp_millis_opt(0).unwrap())
}

/// Format epoch milliseconds with the given chrono format string
pub fn format_millis(millis: i64, format: &str) -> String {
    from_millis(millis).format(format).to_string()
}

/// Format an optional timestamp, empty string when absent
pub fn format_opt_millis(millis: Option<i64>, format: &str) -> String {
    millis.map(|m| format_millis(m, format)).unwrap_or_default()
}
