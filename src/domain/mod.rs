//! Domain layer: recurrence rules, expansion, events and occurrences.
//!
//! Everything here is synchronous and free of I/O. The expander and the
//! event materialization methods are pure functions of their inputs.

pub mod event;
pub mod expander;
pub mod frequency;
pub mod ids;
pub mod occurrence;
pub mod recurrence_rule;
pub mod rule_params;
pub mod window;

pub use event::{Event, EventOccurrence};
pub use expander::{Occurrences, RecurrenceExpander};
pub use frequency::Frequency;
pub use ids::{EventId, OccurrenceId, RuleId, UserId};
pub use occurrence::Occurrence;
pub use recurrence_rule::RecurrenceRule;
pub use rule_params::RuleParams;
pub use window::Window;
