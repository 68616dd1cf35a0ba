//! iCalendar-adjacent building blocks for the chime recurrence engine:
//! the recurrence-rule document type, timezone conversion, and the
//! text-level serialization helpers (escaping, folding, formatting).

pub mod build;
pub mod spec;
pub mod tz;
