//! iCalendar export: one primary event for the series, one secondary event
//! per override.

use chime_core::constants::{ICAL_PROD_ID, ICAL_UID_SUFFIX};
use chime_ical::build::{
    escape_text, fold_line, format_duration_seconds, format_local_stamp, format_utc_stamp,
};
use chrono::{DateTime, Utc};

use crate::model::Schedule;

/// ## Summary
/// Renders a schedule as an iCalendar document stamped with `generated_at`.
///
/// The primary `VEVENT` carries the rule, the exdate and rdate lines
/// (ascending, comma-joined, zone-tagged); each override renders as its own
/// `VEVENT` with the same UID and a `RECURRENCE-ID` naming the original
/// local timestamp. Output is UTF-8 with CRLF terminators, folded at 75
/// octets.
#[must_use]
pub fn render_ics(schedule: &Schedule, generated_at: DateTime<Utc>) -> String {
    let uid = format!("{}{}", schedule.id, ICAL_UID_SUFFIX);
    let stamp = format_utc_stamp(generated_at);
    let mut out = String::new();

    push_line(&mut out, "BEGIN:VCALENDAR");
    push_line(&mut out, "VERSION:2.0");
    push_line(&mut out, &format!("PRODID:{ICAL_PROD_ID}"));
    push_line(&mut out, "CALSCALE:GREGORIAN");

    push_line(&mut out, "BEGIN:VEVENT");
    push_line(&mut out, &format!("UID:{uid}"));
    push_line(&mut out, &format!("DTSTAMP:{stamp}"));
    if let Some(summary) = &schedule.summary {
        push_line(&mut out, &format!("SUMMARY:{}", escape_text(summary)));
    }
    if let Some(notes) = &schedule.notes {
        push_line(&mut out, &format!("DESCRIPTION:{}", escape_text(notes)));
    }
    push_line(
        &mut out,
        &format!(
            "DTSTART;TZID={}:{}",
            schedule.tzid,
            format_local_stamp(schedule.series_start_local)
        ),
    );
    push_line(
        &mut out,
        &format!(
            "DURATION:{}",
            format_duration_seconds(schedule.duration_seconds)
        ),
    );
    if let Some(rule) = schedule.rrule.to_rule_string() {
        push_line(&mut out, &format!("RRULE:{rule}"));
    }
    if schedule.has_exdates {
        let stamps: Vec<String> = schedule
            .exdates
            .iter()
            .copied()
            .map(format_local_stamp)
            .collect();
        push_line(
            &mut out,
            &format!("EXDATE;TZID={}:{}", schedule.tzid, stamps.join(",")),
        );
    }
    if schedule.has_rdates {
        let stamps: Vec<String> = schedule
            .rdates
            .keys()
            .copied()
            .map(format_local_stamp)
            .collect();
        push_line(
            &mut out,
            &format!("RDATE;TZID={}:{}", schedule.tzid, stamps.join(",")),
        );
    }
    push_line(&mut out, "END:VEVENT");

    for (recurrence_id, replacement) in &schedule.overrides {
        push_line(&mut out, "BEGIN:VEVENT");
        push_line(&mut out, &format!("UID:{uid}"));
        push_line(&mut out, &format!("DTSTAMP:{stamp}"));
        push_line(
            &mut out,
            &format!(
                "RECURRENCE-ID;TZID={}:{}",
                schedule.tzid,
                format_local_stamp(*recurrence_id)
            ),
        );
        if let Some(summary) = replacement.summary.as_deref().or(schedule.summary.as_deref()) {
            push_line(&mut out, &format!("SUMMARY:{}", escape_text(summary)));
        }
        if let Some(notes) = replacement.notes.as_deref().or(schedule.notes.as_deref()) {
            push_line(&mut out, &format!("DESCRIPTION:{}", escape_text(notes)));
        }
        push_line(
            &mut out,
            &format!(
                "DTSTART;TZID={}:{}",
                schedule.tzid,
                format_local_stamp(replacement.new_start_local)
            ),
        );
        push_line(
            &mut out,
            &format!(
                "DURATION:{}",
                format_duration_seconds(
                    replacement
                        .duration_seconds
                        .unwrap_or(schedule.duration_seconds)
                )
            ),
        );
        push_line(&mut out, "END:VEVENT");
    }

    push_line(&mut out, "END:VCALENDAR");
    out
}

/// Renders a schedule stamped with the current time.
#[must_use]
pub fn render_ics_now(schedule: &Schedule) -> String {
    render_ics(schedule, Utc::now())
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(&fold_line(line));
    out.push_str("\r\n");
}
