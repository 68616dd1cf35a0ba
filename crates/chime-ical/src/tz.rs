//! Timezone resolution and wall-clock/instant conversion.
//!
//! Uses ICU4X for Windows timezone ID to IANA mapping and timezone
//! canonicalization. Conversion policy for daylight-saving boundaries:
//! ambiguous local times (fall-back fold) resolve to the earliest instant;
//! nonexistent local times (spring-forward gap) are an error the caller
//! decides how to handle.

use chrono::{DateTime, Local, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use icu::time::zone::WindowsParser;
use icu::time::zone::iana::IanaParserExtended;
use std::str::FromStr;

/// Error during timezone conversion.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    /// Unknown or invalid timezone identifier.
    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),

    /// Non-existent time during DST gap.
    #[error("Non-existent time (DST gap): {0}")]
    NonExistentTime(String),

    /// Invalid datetime format.
    #[error("Invalid datetime: {0}")]
    InvalidDateTime(String),
}

/// ## Summary
/// Resolves a timezone identifier to a `chrono_tz::Tz`.
///
/// The identifier is normalized first: known client prefixes are stripped,
/// Windows zone names are mapped to IANA, and IANA aliases are
/// canonicalized.
///
/// ## Errors
/// Returns `ConversionError::UnknownTimezone` if the identifier cannot be
/// resolved.
pub fn resolve_tzid(tzid: &str) -> Result<Tz, ConversionError> {
    let normalized = normalize_tzid(tzid);

    Tz::from_str(&normalized).map_err(|_e| ConversionError::UnknownTimezone(tzid.to_string()))
}

/// Normalizes common calendar-client timezone identifiers to IANA names.
///
/// Uses ICU4X for Windows timezone ID mapping and IANA canonicalization.
fn normalize_tzid(tzid: &str) -> String {
    // Strip common prefixes
    let stripped = tzid
        .strip_prefix("/mozilla.org/")
        .or_else(|| tzid.strip_prefix("/softwarestudio.org/"))
        .unwrap_or(tzid);

    // Try Windows timezone mapping first using ICU
    let windows_parser = WindowsParser::new();
    if let Some(tz) = windows_parser.parse(stripped, None) {
        // Get the canonical IANA name from the BCP-47 timezone ID
        let iana_parser = IanaParserExtended::new();
        for entry in iana_parser.iter() {
            if entry.time_zone == tz {
                return entry.canonical.to_string();
            }
        }
    }

    // Try IANA parser for canonicalization (handles aliases like Europe/Kiev -> Europe/Kyiv)
    let iana_parser = IanaParserExtended::new();
    let parsed = iana_parser.parse(stripped);
    if parsed.time_zone != icu::time::TimeZone::UNKNOWN {
        return parsed.canonical.to_string();
    }

    // Return as-is if not recognized
    tracing::trace!(tzid, "TZID not recognized by ICU, using as-is");
    stripped.to_string()
}

/// ## Summary
/// Converts a wall-clock timestamp in `tz` to the corresponding UTC instant.
///
/// An ambiguous wall-clock time (the zone's clocks fell back across it)
/// resolves to the earliest of the candidate instants. A nonexistent
/// wall-clock time (the zone's clocks jumped over it) is an error.
///
/// ## Errors
/// Returns `ConversionError::NonExistentTime` for wall-clock times inside a
/// DST gap.
pub fn to_instant(tz: Tz, local: NaiveDateTime) -> Result<DateTime<Utc>, ConversionError> {
    match tz.from_local_datetime(&local) {
        LocalResult::None => Err(ConversionError::NonExistentTime(format!(
            "{local} in timezone {tz}"
        ))),
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _latest) => Ok(earliest.with_timezone(&Utc)),
    }
}

/// Converts a UTC instant to the wall-clock timestamp it shows in `tz`.
#[must_use]
pub fn to_local(tz: Tz, instant: DateTime<Utc>) -> NaiveDateTime {
    instant.with_timezone(&tz).naive_local()
}

/// ## Summary
/// Parses a window-bound string into a UTC instant.
///
/// Accepted forms:
/// - offset-qualified timestamp, e.g. `2025-09-04T00:00:00-03:00`
/// - `Z`-suffixed UTC timestamp, e.g. `2025-09-04T00:00:00Z`
/// - naive timestamp, interpreted in `assume` (else the process-local zone)
/// - bare date, interpreted as midnight in `assume` (else process-local)
///
/// Naive interpretations follow the same DST policy as [`to_instant`].
///
/// ## Errors
/// Returns `ConversionError::InvalidDateTime` for blank or unparseable
/// input, and `ConversionError::NonExistentTime` for a naive bound inside a
/// DST gap.
pub fn parse_instant(value: &str, assume: Option<Tz>) -> Result<DateTime<Utc>, ConversionError> {
    let v = value.trim();
    if v.is_empty() {
        return Err(ConversionError::InvalidDateTime(
            "parameter is required and cannot be blank".to_string(),
        ));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(v) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(v, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(v, "%Y-%m-%dT%H:%M:%S%.f"))
    {
        return naive_to_instant(naive, assume);
    }

    if let Ok(date) = NaiveDate::parse_from_str(v, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(|| {
            ConversionError::InvalidDateTime(format!("no midnight on {date}"))
        })?;
        return naive_to_instant(midnight, assume);
    }

    Err(ConversionError::InvalidDateTime(format!(
        "invalid date-time format: '{v}'; use ISO-8601, e.g. 2025-09-04T00:00:00Z or 2025-09-04T00:00:00-03:00"
    )))
}

fn naive_to_instant(
    naive: NaiveDateTime,
    assume: Option<Tz>,
) -> Result<DateTime<Utc>, ConversionError> {
    if let Some(tz) = assume {
        return to_instant(tz, naive);
    }

    match Local.from_local_datetime(&naive) {
        LocalResult::None => Err(ConversionError::NonExistentTime(format!(
            "{naive} in the process-local zone"
        ))),
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _latest) => Ok(earliest.with_timezone(&Utc)),
    }
}
