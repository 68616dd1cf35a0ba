//! Window query orchestration across schedules.

use chime_core::config::Settings;
use chime_core::types::Window;
use chime_ical::tz::{parse_instant, resolve_tzid};
use chrono_tz::Tz;

use crate::error::EngineResult;
use crate::merge::{Occurrence, merge_schedule};
use crate::store::ScheduleStore;

/// ## Summary
/// Parses the two window-bound strings into a validated window.
///
/// Each bound accepts an offset-qualified timestamp, a `Z`-suffixed UTC
/// timestamp, a naive timestamp, or a bare date; naive forms are
/// interpreted in `assume`, else the process-local zone.
///
/// ## Errors
/// Returns a validation error for blank or malformed bounds, or when
/// `from` exceeds `to`.
pub fn parse_window(from: &str, to: &str, assume: Option<Tz>) -> EngineResult<Window> {
    let from = parse_instant(from, assume)?;
    let to = parse_instant(to, assume)?;
    Ok(Window::new(from, to)?)
}

/// ## Summary
/// Materializes all occurrences between `from` and `to` across the store's
/// candidate schedules, globally sorted.
///
/// ## Errors
/// Returns a validation error when the window bounds do not parse.
pub fn occurrences_between(
    store: &dyn ScheduleStore,
    from: &str,
    to: &str,
    assume: Option<Tz>,
) -> EngineResult<Vec<Occurrence>> {
    let window = parse_window(from, to, assume)?;
    Ok(occurrences_in_window(store, window))
}

/// ## Summary
/// Materializes all occurrences inside an already-validated window.
///
/// Each candidate schedule is merged independently (a failing schedule
/// degrades to zero records without affecting the others); the combined
/// result is sorted ascending by start instant, with the schedule id as a
/// stable tie-break.
#[must_use]
pub fn occurrences_in_window(store: &dyn ScheduleStore, window: Window) -> Vec<Occurrence> {
    let mut result = Vec::new();
    for schedule in store.candidates_between(window) {
        result.extend(merge_schedule(schedule, window));
    }

    result.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then_with(|| a.schedule_id.cmp(&b.schedule_id))
    });

    result
}

/// ## Summary
/// Resolves the configured zone assumed for naive window bounds.
///
/// ## Errors
/// Returns an error when the configured identifier is not a resolvable
/// zone.
pub fn assumed_zone(settings: &Settings) -> EngineResult<Option<Tz>> {
    settings
        .query
        .assume_zone
        .as_deref()
        .map(resolve_tzid)
        .transpose()
        .map_err(Into::into)
}
