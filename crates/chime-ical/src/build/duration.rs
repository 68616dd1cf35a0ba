//! ISO-8601 duration strings (RFC 5545 §3.3.6, time components only).

use std::fmt::Write as _;

/// Formats whole seconds as an ISO-8601 duration.
///
/// Zero components are omitted; an exactly-zero duration renders `PT0S`.
#[must_use]
pub fn format_duration_seconds(total: u32) -> String {
    if total == 0 {
        return "PT0S".to_string();
    }

    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    let mut out = String::from("PT");
    if hours > 0 {
        let _ = write!(out, "{hours}H");
    }
    if minutes > 0 {
        let _ = write!(out, "{minutes}M");
    }
    if seconds > 0 {
        let _ = write!(out, "{seconds}S");
    }

    out
}
