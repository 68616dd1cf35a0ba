//! iCalendar text serialization helpers (RFC 5545).
//!
//! This module provides the text-level pieces a renderer needs:
//! - Escape: TEXT value escaping
//! - Fold: content line folding at 75 octets
//! - Duration: ISO-8601 duration strings from whole seconds

mod duration;
mod escape;
mod fold;

pub use duration::format_duration_seconds;
pub use escape::escape_text;
pub use fold::fold_line;

use chrono::{DateTime, NaiveDateTime, Utc};

/// Formats a UTC instant as a zero-offset date-time literal (`20250904T180000Z`).
#[must_use]
pub fn format_utc_stamp(instant: DateTime<Utc>) -> String {
    instant.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Formats a wall-clock timestamp as a zone-less date-time literal (`20250904T150000`).
#[must_use]
pub fn format_local_stamp(local: NaiveDateTime) -> String {
    local.format("%Y%m%dT%H%M%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    #[test]
    fn utc_stamp_has_zulu_suffix() {
        let instant = Utc.with_ymd_and_hms(2025, 9, 4, 18, 0, 0).unwrap();
        assert_eq!(format_utc_stamp(instant), "20250904T180000Z");
    }

    #[test]
    fn local_stamp_has_no_zone_tag() {
        let local = NaiveDate::from_ymd_opt(2025, 9, 4)
            .unwrap()
            .and_hms_opt(15, 0, 0)
            .unwrap();
        assert_eq!(format_local_stamp(local), "20250904T150000");
    }
}
