//! Schedule aggregate: a recurring series and its owned exdate, rdate, and
//! override records, addressed by their natural keys.

use std::collections::{BTreeMap, BTreeSet};

use chime_ical::spec::RecurrenceSpec;
use chime_ical::tz::{resolve_tzid, to_local};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

/// An extra occurrence not produced by the recurrence rule.
///
/// Keyed by its local timestamp in the owning schedule's collection; unique
/// per (schedule, local timestamp).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rdate {
    /// Duration override; the schedule default applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,
}

/// Replacement for one original occurrence.
///
/// Keyed by the original occurrence's local timestamp (its recurrence id);
/// unique per (schedule, recurrence id). The recurrence id need not match a
/// currently-generated base occurrence - rule edits can orphan it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccurrenceOverride {
    pub new_start_local: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A recurring series definition.
///
/// The series start is stored both as the wall-clock timestamp in `tzid` and
/// as the equivalent UTC instant; creation checks that the pair denotes one
/// moment, and it is never re-derived afterwards. The `has_*` flags mirror
/// the child collections and are maintained by the mutation methods, never
/// recomputed lazily.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: Uuid,
    pub rrule: RecurrenceSpec,
    pub tzid: String,
    pub series_start_local: NaiveDateTime,
    pub series_start_utc: DateTime<Utc>,
    /// Inclusive end of the series; bounds base occurrences only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_until_utc: Option<DateTime<Utc>>,
    pub duration_seconds: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub has_exdates: bool,
    pub has_rdates: bool,
    pub has_overrides: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub exdates: BTreeSet<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub rdates: BTreeMap<NaiveDateTime, Rdate>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: BTreeMap<NaiveDateTime, OccurrenceOverride>,
}

/// Creation input for a schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDraft {
    /// Generated when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub rrule: RecurrenceSpec,
    pub tzid: String,
    pub series_start_local: NaiveDateTime,
    pub series_start_utc: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_until_utc: Option<DateTime<Utc>>,
    pub duration_seconds: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exdates: Vec<ExdateDraft>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rdates: Vec<RdateDraft>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExdateDraft {
    pub exdate_local: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RdateDraft {
    pub rdate_local: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,
}

impl Schedule {
    /// ## Summary
    /// Builds a schedule from a draft, validating its invariants and seeding
    /// the inline exdate/rdate records.
    ///
    /// ## Errors
    /// Returns `EngineError::ValidationError` if the zone does not resolve,
    /// the series start pair denotes two different moments in that zone, or
    /// the series end precedes the series start.
    pub fn new(draft: ScheduleDraft) -> EngineResult<Self> {
        let tz = resolve_tzid(&draft.tzid)?;

        let derived_local = to_local(tz, draft.series_start_utc);
        if derived_local != draft.series_start_local {
            return Err(EngineError::ValidationError(format!(
                "seriesStartLocal {} and seriesStartUtc {} denote different wall-clock moments in {} (expected {})",
                draft.series_start_local, draft.series_start_utc, draft.tzid, derived_local
            )));
        }

        if let Some(until) = draft.series_until_utc
            && until < draft.series_start_utc
        {
            return Err(EngineError::ValidationError(format!(
                "seriesUntilUtc {until} precedes seriesStartUtc {}",
                draft.series_start_utc
            )));
        }

        let exdates: BTreeSet<NaiveDateTime> =
            draft.exdates.iter().map(|e| e.exdate_local).collect();
        let rdates: BTreeMap<NaiveDateTime, Rdate> = draft
            .rdates
            .iter()
            .map(|r| {
                (
                    r.rdate_local,
                    Rdate {
                        duration_seconds: r.duration_seconds,
                    },
                )
            })
            .collect();

        let now = Utc::now();
        Ok(Self {
            id: draft.id.unwrap_or_else(Uuid::new_v4),
            rrule: draft.rrule,
            tzid: draft.tzid,
            series_start_local: draft.series_start_local,
            series_start_utc: draft.series_start_utc,
            series_until_utc: draft.series_until_utc,
            duration_seconds: draft.duration_seconds,
            summary: draft.summary,
            notes: draft.notes,
            has_exdates: !exdates.is_empty(),
            has_rdates: !rdates.is_empty(),
            has_overrides: false,
            created_at: now,
            updated_at: now,
            exdates,
            rdates,
            overrides: BTreeMap::new(),
        })
    }

    /// Records an exdate for the given local timestamp. Idempotent.
    pub fn upsert_exdate(&mut self, local: NaiveDateTime) {
        self.exdates.insert(local);
        self.has_exdates = true;
        self.touch();
    }

    /// Removes the exdate at the given local timestamp.
    ///
    /// Returns whether a record existed.
    pub fn remove_exdate(&mut self, local: NaiveDateTime) -> bool {
        let removed = self.exdates.remove(&local);
        self.has_exdates = !self.exdates.is_empty();
        if removed {
            self.touch();
        }
        removed
    }

    /// Records or replaces the rdate at the given local timestamp.
    pub fn upsert_rdate(&mut self, local: NaiveDateTime, duration_seconds: Option<u32>) {
        self.rdates.insert(local, Rdate { duration_seconds });
        self.has_rdates = true;
        self.touch();
    }

    /// Removes the rdate at the given local timestamp.
    ///
    /// Returns whether a record existed.
    pub fn remove_rdate(&mut self, local: NaiveDateTime) -> bool {
        let removed = self.rdates.remove(&local).is_some();
        self.has_rdates = !self.rdates.is_empty();
        if removed {
            self.touch();
        }
        removed
    }

    /// Records or replaces the override for the given recurrence id.
    pub fn upsert_override(
        &mut self,
        recurrence_id: NaiveDateTime,
        replacement: OccurrenceOverride,
    ) {
        self.overrides.insert(recurrence_id, replacement);
        self.has_overrides = true;
        self.touch();
    }

    /// Removes the override for the given recurrence id.
    ///
    /// Returns whether a record existed.
    pub fn remove_override(&mut self, recurrence_id: NaiveDateTime) -> bool {
        let removed = self.overrides.remove(&recurrence_id).is_some();
        self.has_overrides = !self.overrides.is_empty();
        if removed {
            self.touch();
        }
        removed
    }

    /// ## Summary
    /// Closes the series at `until` (inclusive).
    ///
    /// ## Errors
    /// Returns `EngineError::ValidationError`, leaving the schedule
    /// unmodified, if `until` precedes the series start instant.
    pub fn force_end(&mut self, until: DateTime<Utc>) -> EngineResult<()> {
        if until < self.series_start_utc {
            return Err(EngineError::ValidationError(format!(
                "seriesUntilUtc {until} precedes seriesStartUtc {}",
                self.series_start_utc
            )));
        }
        self.series_until_utc = Some(until);
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
