//! Service layer: business logic orchestration.
//!
//! [`CalendarService`] coordinates the record store and the recurrence
//! expander, and owns the cross-record rules (safe deletion, rule
//! immutability once occurrences are pinned).

pub mod calendar_service;

pub use calendar_service::{CalendarService, EventDraft, RuleDraft};
