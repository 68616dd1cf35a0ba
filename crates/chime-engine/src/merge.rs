//! Occurrence merger: folds a schedule's raw base instants, rdates, and
//! overrides into one deduplicated occurrence set for a window.

use std::collections::BTreeMap;

use chime_core::types::{OccurrenceSource, Window};
use chime_ical::tz::{resolve_tzid, to_instant, to_local};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::expand::{Expansion, expand_rule};
use crate::model::Schedule;

/// One materialized occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    pub schedule_id: Uuid,
    pub source: OccurrenceSource,
    pub start: DateTime<Utc>,
    pub duration_seconds: u32,
    /// Derived: `start + duration`.
    pub end: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Occurrence {
    #[must_use]
    pub fn new(
        schedule_id: Uuid,
        source: OccurrenceSource,
        start: DateTime<Utc>,
        duration_seconds: u32,
        summary: Option<String>,
        notes: Option<String>,
    ) -> Self {
        Self {
            schedule_id,
            source,
            start,
            duration_seconds,
            end: start + TimeDelta::seconds(i64::from(duration_seconds)),
            summary,
            notes,
        }
    }
}

/// ## Summary
/// Materializes one schedule's occurrences inside `window`.
///
/// Base instants whose local time matches an override's recurrence id or an
/// exdate are suppressed; rdates are suppressed by exdates too; overrides
/// are windowed by their new start and win any collision on the exact UTC
/// start instant. Everything else inserts first-write-wins, keyed by UTC
/// start, so merging is idempotent.
///
/// A schedule whose zone does not resolve or whose rule fails to evaluate
/// degrades to fewer (or zero) records; it never aborts the caller.
#[must_use]
pub fn merge_schedule(schedule: &Schedule, window: Window) -> Vec<Occurrence> {
    let tz = match resolve_tzid(&schedule.tzid) {
        Ok(tz) => tz,
        Err(err) => {
            tracing::warn!(
                schedule_id = %schedule.id,
                tzid = %schedule.tzid,
                error = %err,
                "unresolvable zone, schedule contributes no occurrences"
            );
            return Vec::new();
        }
    };

    let mut by_start: BTreeMap<DateTime<Utc>, Occurrence> = BTreeMap::new();

    // 1) Base occurrences from the rule, bounded by the series end when set.
    let base_window = match schedule.series_until_utc {
        Some(until) => window.clamp_end(until),
        None => Some(window),
    };
    if let Some(base_window) = base_window {
        match expand_rule(&schedule.rrule, schedule.series_start_utc, base_window) {
            Expansion::Instants(instants) => {
                for start in instants {
                    let local = to_local(tz, start);
                    if schedule.overrides.contains_key(&local) {
                        // Replaced; the override supplies its own occurrence.
                        continue;
                    }
                    if schedule.exdates.contains(&local) {
                        continue;
                    }
                    by_start.entry(start).or_insert_with(|| {
                        Occurrence::new(
                            schedule.id,
                            OccurrenceSource::Schedule,
                            start,
                            schedule.duration_seconds,
                            schedule.summary.clone(),
                            schedule.notes.clone(),
                        )
                    });
                }
            }
            Expansion::NoRule => {
                tracing::trace!(schedule_id = %schedule.id, "no recurrence rule");
            }
            Expansion::Failed(reason) => {
                tracing::warn!(
                    schedule_id = %schedule.id,
                    reason,
                    "rule evaluation failed, skipping base occurrences"
                );
            }
        }
    }

    // 2) Additional dates; exdates suppress these too.
    for (local, rdate) in &schedule.rdates {
        let start = match to_instant(tz, *local) {
            Ok(start) => start,
            Err(err) => {
                tracing::debug!(schedule_id = %schedule.id, error = %err, "skipping rdate");
                continue;
            }
        };
        if !window.contains(start) {
            continue;
        }
        if schedule.exdates.contains(local) {
            continue;
        }
        by_start.entry(start).or_insert_with(|| {
            Occurrence::new(
                schedule.id,
                OccurrenceSource::Rdate,
                start,
                rdate.duration_seconds.unwrap_or(schedule.duration_seconds),
                schedule.summary.clone(),
                schedule.notes.clone(),
            )
        });
    }

    // 3) Overrides, windowed by their *new* start; an override whose new
    //    start falls outside the window is dropped entirely. Exdates never
    //    remove overrides.
    for replacement in schedule.overrides.values() {
        let start = match to_instant(tz, replacement.new_start_local) {
            Ok(start) => start,
            Err(err) => {
                tracing::debug!(schedule_id = %schedule.id, error = %err, "skipping override");
                continue;
            }
        };
        if !window.contains(start) {
            continue;
        }
        let occurrence = Occurrence::new(
            schedule.id,
            OccurrenceSource::Override,
            start,
            replacement
                .duration_seconds
                .unwrap_or(schedule.duration_seconds),
            replacement
                .summary
                .clone()
                .or_else(|| schedule.summary.clone()),
            replacement.notes.clone().or_else(|| schedule.notes.clone()),
        );
        // On an exact same-instant collision with a base/rdate record, the
        // override wins.
        by_start.insert(start, occurrence);
    }

    by_start.into_values().collect()
}
