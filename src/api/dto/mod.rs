//! Data Transfer Objects for REST request/response serialization.
//!
//! Timestamps are RFC 3339 strings in UTC; identifiers are UUID strings.

pub mod common_dto;
pub mod event_dto;
pub mod occurrence_dto;
pub mod rule_dto;

pub use common_dto::*;
pub use event_dto::*;
pub use occurrence_dto::*;
pub use rule_dto::*;
