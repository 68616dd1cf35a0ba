//! Storage seam: the candidate pre-filter contract and an in-memory store.

use std::collections::BTreeMap;

use chime_core::types::Window;
use chime_ical::tz::{resolve_tzid, to_instant};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::model::Schedule;

/// Storage interface the query path depends on.
///
/// `candidates_between` may over-approximate - the merge re-validates every
/// candidate - but must never drop a schedule that could produce an
/// in-window occurrence.
pub trait ScheduleStore {
    fn get(&self, id: Uuid) -> Option<&Schedule>;

    /// Schedules whose stored window could overlap `window`.
    fn candidates_between(&self, window: Window) -> Vec<&Schedule>;
}

/// In-memory schedule store.
///
/// Suits tests and embedders without a database. Mutations are
/// last-writer-wins per schedule; callers needing stricter guarantees must
/// serialize writes per id externally.
#[derive(Debug, Default)]
pub struct MemoryStore {
    schedules: BTreeMap<Uuid, Schedule>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a schedule, keyed by its id.
    pub fn insert(&mut self, schedule: Schedule) {
        self.schedules.insert(schedule.id, schedule);
    }

    /// Removes a schedule, returning it when it existed.
    pub fn remove(&mut self, id: Uuid) -> Option<Schedule> {
        self.schedules.remove(&id)
    }

    /// Removes every schedule.
    pub fn clear(&mut self) {
        self.schedules.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.schedules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schedules.is_empty()
    }

    pub fn schedules(&self) -> impl Iterator<Item = &Schedule> {
        self.schedules.values()
    }

    /// ## Summary
    /// Mutable access to one schedule for the mutation operations.
    ///
    /// ## Errors
    /// Returns `EngineError::NotFound` for an unknown id.
    pub fn schedule_mut(&mut self, id: Uuid) -> EngineResult<&mut Schedule> {
        self.schedules
            .get_mut(&id)
            .ok_or_else(|| EngineError::NotFound(format!("schedule {id}")))
    }
}

impl ScheduleStore for MemoryStore {
    fn get(&self, id: Uuid) -> Option<&Schedule> {
        self.schedules.get(&id)
    }

    fn candidates_between(&self, window: Window) -> Vec<&Schedule> {
        self.schedules
            .values()
            .filter(|schedule| could_overlap(schedule, window))
            .collect()
    }
}

/// Pre-filter predicate: series window overlap, or any rdate in range, or
/// any override new start in range.
fn could_overlap(schedule: &Schedule, window: Window) -> bool {
    if schedule.series_start_utc <= window.to()
        && schedule
            .series_until_utc
            .is_none_or(|until| until >= window.from())
    {
        return true;
    }

    let Ok(tz) = resolve_tzid(&schedule.tzid) else {
        // Leave the decision to the merge path, which logs and drops.
        return true;
    };

    if schedule.has_rdates
        && schedule
            .rdates
            .keys()
            .any(|local| to_instant(tz, *local).is_ok_and(|start| window.contains(start)))
    {
        return true;
    }

    schedule.has_overrides
        && schedule
            .overrides
            .values()
            .any(|o| to_instant(tz, o.new_start_local).is_ok_and(|start| window.contains(start)))
}
