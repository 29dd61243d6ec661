//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::persistence::Store;
use crate::service::CalendarService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Calendar service for all business logic.
    pub calendar_service: Arc<CalendarService<Store>>,
}

impl AppState {
    /// Wraps a service into handler state.
    #[must_use]
    pub fn new(calendar_service: CalendarService<Store>) -> Self {
        Self {
            calendar_service: Arc::new(calendar_service),
        }
    }
}
