//! Recurrence-rule document (the stored `rrule` field of a schedule).
//!
//! The document recognizes exactly five fields; anything else is preserved
//! opaquely for round-trip fidelity and never interpreted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::build::format_utc_stamp;

/// Structured recurrence-rule document.
///
/// Only `freq`, `interval`, `byday`, `count`, and `until` participate in
/// rule-string construction. `count` and `until` are mutually exclusive;
/// when both are present, `count` takes precedence and `until` is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecurrenceSpec {
    /// Frequency name, case-insensitive (canonicalized upper-case on render).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freq: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,

    /// Day codes, emitted comma-joined in source order. Not validated.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub byday: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,

    /// Inclusive rule end, rendered as a zero-offset instant literal.
    #[serde(default, alias = "until_utc", skip_serializing_if = "Option::is_none")]
    pub until: Option<DateTime<Utc>>,

    /// Unrecognized fields, carried through untouched.
    #[serde(flatten, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RecurrenceSpec {
    /// ## Summary
    /// Builds the rule string from the recognized fields, in fixed order:
    /// `FREQ`, `INTERVAL` (when present), `BYDAY` (when non-empty), then
    /// exactly one of `COUNT` or `UNTIL`.
    ///
    /// Returns `None` when the document has no `freq` field; such a spec
    /// contributes no base occurrences.
    #[must_use]
    pub fn to_rule_string(&self) -> Option<String> {
        let freq = self.freq.as_deref()?;
        let mut rule = format!("FREQ={}", freq.to_ascii_uppercase());

        if let Some(interval) = self.interval {
            rule.push_str(&format!(";INTERVAL={interval}"));
        }
        if !self.byday.is_empty() {
            rule.push_str(&format!(";BYDAY={}", self.byday.join(",")));
        }
        if let Some(count) = self.count {
            rule.push_str(&format!(";COUNT={count}"));
        } else if let Some(until) = self.until {
            rule.push_str(&format!(";UNTIL={}", format_utc_stamp(until)));
        }

        Some(rule)
    }
}
