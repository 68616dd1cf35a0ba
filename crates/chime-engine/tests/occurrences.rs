//! End-to-end window query behavior through the in-memory store.

use chime_core::types::OccurrenceSource;
use chime_engine::model::{OccurrenceOverride, Schedule, ScheduleDraft};
use chime_engine::query::occurrences_between;
use chime_engine::store::MemoryStore;
use chime_ical::spec::RecurrenceSpec;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use uuid::Uuid;

fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_opt(h, mi, 0)
        .unwrap()
}

fn utc(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap()
}

fn weekly_draft(id: Option<Uuid>) -> ScheduleDraft {
    ScheduleDraft {
        id,
        rrule: RecurrenceSpec {
            freq: Some("WEEKLY".to_string()),
            interval: Some(1),
            byday: vec!["TH".to_string()],
            ..RecurrenceSpec::default()
        },
        tzid: "America/Sao_Paulo".to_string(),
        series_start_local: local(2025, 9, 4, 15, 0),
        series_start_utc: utc(2025, 9, 4, 18),
        series_until_utc: None,
        duration_seconds: 3600,
        summary: Some("Weekly sync".to_string()),
        notes: Some("Room 2".to_string()),
        exdates: Vec::new(),
        rdates: Vec::new(),
    }
}

fn store_with(schedules: Vec<Schedule>) -> MemoryStore {
    let mut store = MemoryStore::new();
    for schedule in schedules {
        store.insert(schedule);
    }
    store
}

#[test_log::test]
fn weekly_series_with_exdate_yields_two_occurrences() {
    let mut schedule = Schedule::new(weekly_draft(None)).expect("valid draft");
    schedule.upsert_exdate(local(2025, 9, 11, 15, 0));
    let store = store_with(vec![schedule]);

    let occurrences = occurrences_between(
        &store,
        "2025-09-04T00:00:00Z",
        "2025-09-19T00:00:00Z",
        None,
    )
    .expect("valid window");

    let starts: Vec<_> = occurrences.iter().map(|o| o.start).collect();
    assert_eq!(starts, vec![utc(2025, 9, 4, 18), utc(2025, 9, 18, 18)]);
    for occurrence in &occurrences {
        assert_eq!(occurrence.source, OccurrenceSource::Schedule);
        assert_eq!(occurrence.duration_seconds, 3600);
        assert_eq!(occurrence.end, occurrence.start + chrono::TimeDelta::hours(1));
    }
}

#[test_log::test]
fn override_supplants_base_occurrence() {
    let mut schedule = Schedule::new(weekly_draft(None)).expect("valid draft");
    schedule.upsert_exdate(local(2025, 9, 11, 15, 0));
    schedule.upsert_override(
        local(2025, 9, 18, 15, 0),
        OccurrenceOverride {
            new_start_local: local(2025, 9, 18, 16, 0),
            duration_seconds: Some(1800),
            summary: None,
            notes: None,
        },
    );
    let store = store_with(vec![schedule]);

    let occurrences = occurrences_between(
        &store,
        "2025-09-04T00:00:00Z",
        "2025-09-19T00:00:00Z",
        None,
    )
    .expect("valid window");

    assert_eq!(occurrences.len(), 2);
    assert_eq!(occurrences[0].source, OccurrenceSource::Schedule);
    assert_eq!(occurrences[0].start, utc(2025, 9, 4, 18));

    let replaced = &occurrences[1];
    assert_eq!(replaced.source, OccurrenceSource::Override);
    assert_eq!(replaced.start, utc(2025, 9, 18, 19));
    assert_eq!(replaced.duration_seconds, 1800);
}

#[test_log::test]
fn rdate_appears_with_default_duration() {
    let mut schedule = Schedule::new(weekly_draft(None)).expect("valid draft");
    schedule.upsert_rdate(local(2025, 10, 2, 10, 0), None);
    let store = store_with(vec![schedule]);

    let occurrences = occurrences_between(
        &store,
        "2025-10-01T00:00:00Z",
        "2025-10-03T00:00:00Z",
        None,
    )
    .expect("valid window");

    let rdate = occurrences
        .iter()
        .find(|o| o.source == OccurrenceSource::Rdate)
        .expect("rdate present");
    assert_eq!(rdate.start, utc(2025, 10, 2, 13));
    assert_eq!(rdate.duration_seconds, 3600);
}

#[test_log::test]
fn results_sort_by_start_then_schedule_id() {
    let first_id = Uuid::from_u128(1);
    let second_id = Uuid::from_u128(2);
    // Insert in reverse id order; both series occur at the same instants.
    let store = store_with(vec![
        Schedule::new(weekly_draft(Some(second_id))).expect("valid draft"),
        Schedule::new(weekly_draft(Some(first_id))).expect("valid draft"),
    ]);

    let occurrences = occurrences_between(
        &store,
        "2025-09-04T00:00:00Z",
        "2025-09-12T00:00:00Z",
        None,
    )
    .expect("valid window");

    let keys: Vec<_> = occurrences
        .iter()
        .map(|o| (o.start, o.schedule_id))
        .collect();
    assert_eq!(
        keys,
        vec![
            (utc(2025, 9, 4, 18), first_id),
            (utc(2025, 9, 4, 18), second_id),
            (utc(2025, 9, 11, 18), first_id),
            (utc(2025, 9, 11, 18), second_id),
        ]
    );

    // No two records share both schedule id and start.
    let mut seen = std::collections::BTreeSet::new();
    for key in keys {
        assert!(seen.insert(key));
    }
}

#[test_log::test]
fn rdate_colliding_with_base_instant_does_not_duplicate() {
    let mut schedule = Schedule::new(weekly_draft(None)).expect("valid draft");
    // Same wall-clock moment as the Sep-11 base occurrence.
    schedule.upsert_rdate(local(2025, 9, 11, 15, 0), Some(900));
    let store = store_with(vec![schedule]);

    let occurrences = occurrences_between(
        &store,
        "2025-09-04T00:00:00Z",
        "2025-09-19T00:00:00Z",
        None,
    )
    .expect("valid window");

    let sep_11: Vec<_> = occurrences
        .iter()
        .filter(|o| o.start == utc(2025, 9, 11, 18))
        .collect();
    assert_eq!(sep_11.len(), 1);
    // First write wins: the base record keeps its duration.
    assert_eq!(sep_11[0].source, OccurrenceSource::Schedule);
    assert_eq!(sep_11[0].duration_seconds, 3600);
}

#[test_log::test]
fn broken_rule_does_not_abort_other_schedules() {
    let healthy_id = Uuid::from_u128(7);
    let mut broken = Schedule::new(weekly_draft(None)).expect("valid draft");
    broken.rrule.freq = Some("BOGUS".to_string());
    broken.upsert_rdate(local(2025, 9, 10, 9, 0), None);

    let store = store_with(vec![
        broken,
        Schedule::new(weekly_draft(Some(healthy_id))).expect("valid draft"),
    ]);

    let occurrences = occurrences_between(
        &store,
        "2025-09-04T00:00:00Z",
        "2025-09-19T00:00:00Z",
        None,
    )
    .expect("valid window");

    // The healthy series expands fully; the broken one still contributes
    // its rdate.
    let healthy: Vec<_> = occurrences
        .iter()
        .filter(|o| o.schedule_id == healthy_id)
        .collect();
    assert_eq!(healthy.len(), 3);
    assert!(
        occurrences
            .iter()
            .any(|o| o.source == OccurrenceSource::Rdate && o.start == utc(2025, 9, 10, 12))
    );
}

#[test_log::test]
fn schedule_without_freq_contributes_rdates_only() {
    let mut draft = weekly_draft(None);
    draft.rrule = RecurrenceSpec::default();
    let mut schedule = Schedule::new(draft).expect("valid draft");
    schedule.upsert_rdate(local(2025, 9, 10, 9, 0), None);
    let store = store_with(vec![schedule]);

    let occurrences = occurrences_between(
        &store,
        "2025-09-04T00:00:00Z",
        "2025-09-19T00:00:00Z",
        None,
    )
    .expect("valid window");

    assert_eq!(occurrences.len(), 1);
    assert_eq!(occurrences[0].source, OccurrenceSource::Rdate);
}

#[test_log::test]
fn naive_bounds_use_the_assumed_zone() {
    let schedule = Schedule::new(weekly_draft(None)).expect("valid draft");
    let store = store_with(vec![schedule]);

    // Midnight-to-midnight in Sao Paulo wall-clock time.
    let occurrences = occurrences_between(
        &store,
        "2025-09-04T00:00:00",
        "2025-09-05T00:00:00",
        Some(Tz::America__Sao_Paulo),
    )
    .expect("valid window");

    assert_eq!(occurrences.len(), 1);
    assert_eq!(occurrences[0].start, utc(2025, 9, 4, 18));
}

#[test_log::test]
fn bare_date_bounds_are_local_midnights() {
    let schedule = Schedule::new(weekly_draft(None)).expect("valid draft");
    let store = store_with(vec![schedule]);

    let occurrences = occurrences_between(
        &store,
        "2025-09-04",
        "2025-09-05",
        Some(Tz::America__Sao_Paulo),
    )
    .expect("valid window");

    assert_eq!(occurrences.len(), 1);
}

#[test_log::test]
fn malformed_and_inverted_windows_are_hard_errors() {
    let store = store_with(vec![
        Schedule::new(weekly_draft(None)).expect("valid draft"),
    ]);

    assert!(occurrences_between(&store, "not-a-date", "2025-09-19T00:00:00Z", None).is_err());
    assert!(occurrences_between(&store, "", "2025-09-19T00:00:00Z", None).is_err());
    assert!(
        occurrences_between(
            &store,
            "2025-09-19T00:00:00Z",
            "2025-09-04T00:00:00Z",
            None
        )
        .is_err()
    );
}

#[test_log::test]
fn force_end_through_the_store_clamps_base_occurrences() {
    let mut store = store_with(vec![
        Schedule::new(weekly_draft(None)).expect("valid draft"),
    ]);
    let id = store.schedules().next().expect("one schedule").id;

    store
        .schedule_mut(id)
        .expect("known id")
        .force_end(utc(2025, 9, 12, 0))
        .expect("valid end");

    let occurrences = occurrences_between(
        &store,
        "2025-09-04T00:00:00Z",
        "2025-09-19T00:00:00Z",
        None,
    )
    .expect("valid window");
    let starts: Vec<_> = occurrences.iter().map(|o| o.start).collect();
    assert_eq!(starts, vec![utc(2025, 9, 4, 18), utc(2025, 9, 11, 18)]);
}

#[test_log::test]
fn querying_twice_returns_identical_results() {
    let mut schedule = Schedule::new(weekly_draft(None)).expect("valid draft");
    schedule.upsert_exdate(local(2025, 9, 11, 15, 0));
    schedule.upsert_rdate(local(2025, 9, 10, 9, 0), Some(900));
    let store = store_with(vec![schedule]);

    let first = occurrences_between(
        &store,
        "2025-09-04T00:00:00Z",
        "2025-09-19T00:00:00Z",
        None,
    )
    .expect("valid window");
    let second = occurrences_between(
        &store,
        "2025-09-04T00:00:00Z",
        "2025-09-19T00:00:00Z",
        None,
    )
    .expect("valid window");

    assert_eq!(first, second);
}

#[test_log::test]
fn occurrence_records_serialize_with_reference_vocabulary() {
    let schedule = Schedule::new(weekly_draft(None)).expect("valid draft");
    let store = store_with(vec![schedule]);

    let occurrences = occurrences_between(
        &store,
        "2025-09-04T00:00:00Z",
        "2025-09-05T00:00:00Z",
        None,
    )
    .expect("valid window");

    let value = serde_json::to_value(&occurrences[0]).expect("serializable");
    assert_eq!(value["source"], "SCHEDULE");
    assert_eq!(value["durationSeconds"], 3600);
    assert!(value["scheduleId"].is_string());
    assert!(value["start"].is_string());
    assert!(value["end"].is_string());
}
