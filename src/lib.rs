//! # school-calendar
//!
//! Recurring-event calendar service for school administration.
//!
//! Administrators define recurrence rules ("weekly on Mondays and
//! Wednesdays", "monthly on the 31st") and attach them to events. The
//! recurrence engine expands an event into its concrete occurrences inside
//! any query window, and individual instances can be pinned as persisted
//! occurrences so other records can refer to them.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── CalendarService (service/)
//!     │
//!     ├── RecurrenceExpander, Event, Window (domain/)
//!     │
//!     └── RecordStore: in-memory or PostgreSQL (persistence/)
//! ```
//!
//! ## Recurrence semantics
//!
//! - Every occurrence is computed from the event start (the anchor), never
//!   from the previous occurrence.
//! - Monthly and yearly steps clamp to the last day of shorter months, so a
//!   rule anchored on January 31 lands on February 29 (or 28), March 31, ...
//! - `count` counts occurrences from the anchor; `until` is inclusive.
//! - Query windows are inclusive at both ends.

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
