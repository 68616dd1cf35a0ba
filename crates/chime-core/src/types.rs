use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Schedule identity shared across crates.
pub type ScheduleId = uuid::Uuid;

/// Origin of a materialized occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OccurrenceSource {
    /// Generated by expanding the schedule's recurrence rule.
    Schedule,
    /// An explicit additional date (RDATE).
    Rdate,
    /// A replacement for one original occurrence (RECURRENCE-ID override).
    Override,
}

impl OccurrenceSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Schedule => "SCHEDULE",
            Self::Rdate => "RDATE",
            Self::Override => "OVERRIDE",
        }
    }
}

impl std::fmt::Display for OccurrenceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive `[from, to]` UTC range over which occurrences are requested.
///
/// Construction enforces `from <= to`; both bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    from: DateTime<Utc>,
    to: DateTime<Utc>,
}

impl Window {
    /// ## Summary
    /// Creates a window, validating that `from` does not exceed `to`.
    ///
    /// ## Errors
    /// Returns `CoreError::ValidationError` if `from > to`.
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> crate::error::CoreResult<Self> {
        if from > to {
            return Err(crate::error::CoreError::ValidationError(format!(
                "window start {from} is after window end {to}"
            )));
        }
        Ok(Self { from, to })
    }

    #[must_use]
    pub const fn from(&self) -> DateTime<Utc> {
        self.from
    }

    #[must_use]
    pub const fn to(&self) -> DateTime<Utc> {
        self.to
    }

    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.from <= instant && instant <= self.to
    }

    /// Restricts the window's upper bound to `until` (inclusive).
    ///
    /// Returns `None` when `until` precedes the window entirely.
    #[must_use]
    pub fn clamp_end(&self, until: DateTime<Utc>) -> Option<Self> {
        if until < self.from {
            return None;
        }
        Some(Self {
            from: self.from,
            to: self.to.min(until),
        })
    }
}
