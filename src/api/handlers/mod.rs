//! REST endpoint handlers organized by resource.

pub mod calendar;
pub mod events;
pub mod occurrences;
pub mod rules;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(rules::routes())
        .merge(events::routes())
        .merge(calendar::routes())
        .merge(occurrences::routes())
}
