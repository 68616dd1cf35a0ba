//! Frequency expander: turns a schedule's rule document into raw UTC
//! instants for a window, delegating rule evaluation to the `rrule` crate.

use chime_core::types::Window;
use chime_ical::spec::RecurrenceSpec;
use chrono::{DateTime, TimeDelta, Utc};
use rrule::{RRule, Tz, Unvalidated};

/// Cap on instants materialized per schedule per query. The window bound
/// keeps real queries far below this; pathological rules get truncated and
/// logged instead of looping.
const EXPANSION_LIMIT: u16 = 4096;

/// Outcome of expanding a rule document over a window.
///
/// Both non-occurrence cases are distinct from "the rule produced nothing
/// in this window" so that callers can treat them as policy rather than as
/// an incidental catch-all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expansion {
    /// The document has no `freq` field; there is no rule to evaluate.
    NoRule,
    /// Rule construction or evaluation failed.
    Failed(String),
    /// Raw in-window instants, sorted ascending.
    Instants(Vec<DateTime<Utc>>),
}

/// ## Summary
/// Expands `spec` seeded at `seed` into the raw instants falling inside
/// `window` (inclusive on both ends).
///
/// Never panics and never propagates an error: a missing `freq` yields
/// [`Expansion::NoRule`], any parse/build/evaluation failure yields
/// [`Expansion::Failed`].
#[must_use]
pub fn expand_rule(spec: &RecurrenceSpec, seed: DateTime<Utc>, window: Window) -> Expansion {
    let Some(rule_text) = spec.to_rule_string() else {
        return Expansion::NoRule;
    };

    let rrule = match rule_text.parse::<RRule<Unvalidated>>() {
        Ok(rrule) => rrule,
        Err(err) => return Expansion::Failed(err.to_string()),
    };
    let rrule_set = match rrule.build(seed.with_timezone(&Tz::UTC)) {
        Ok(set) => set,
        Err(err) => return Expansion::Failed(err.to_string()),
    };

    // The bounds are widened by a second; the exact inclusive window filter
    // below decides membership.
    let result = rrule_set
        .after((window.from() - TimeDelta::seconds(1)).with_timezone(&Tz::UTC))
        .before((window.to() + TimeDelta::seconds(1)).with_timezone(&Tz::UTC))
        .all(EXPANSION_LIMIT);

    if result.limited {
        tracing::warn!(
            rule = %rule_text,
            limit = EXPANSION_LIMIT,
            "rule expansion truncated at the instant cap"
        );
    }

    let instants = result
        .dates
        .iter()
        .map(|dt| dt.with_timezone(&Utc))
        .filter(|dt| window.contains(*dt))
        .collect();

    Expansion::Instants(instants)
}
