//! Recurrence occurrence materialization engine.
//!
//! Expands a schedule's frequency rule into raw instants, folds in exdates,
//! rdates, and per-occurrence overrides, answers window queries across
//! schedules, and exports a schedule as iCalendar text.

pub mod error;
pub mod expand;
pub mod ics;
pub mod merge;
pub mod model;
pub mod query;
pub mod store;
