//! OpenAPI document for the REST surface.

use utoipa::OpenApi;

use super::dto::{
    DeleteEventResponse, EventListResponse, EventOccurrenceDto, EventOccurrencesResponse,
    EventRequest, EventResponse, OccurrenceListResponse, OccurrenceResponse,
    OccurrenceTimesResponse, PaginationMeta, PinOccurrenceRequest, RuleEventsResponse,
    RuleListResponse, RuleParamsDto, RuleRequest, RuleResponse, WindowDto,
};
use super::handlers::{calendar, events, occurrences, rules, system};
use crate::domain::Frequency;
use crate::error::{ErrorBody, ErrorResponse};

/// Generated OpenAPI specification, served by Swagger UI when the
/// `swagger-ui` feature is enabled.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "school-calendar",
        description = "Recurrence rules, events and pinned occurrences for school administration."
    ),
    paths(
        system::health_handler,
        system::frequencies_handler,
        rules::create_rule,
        rules::list_rules,
        rules::get_rule,
        rules::update_rule,
        rules::delete_rule,
        rules::rule_events,
        events::create_event,
        events::list_events,
        events::get_event,
        events::update_event,
        events::delete_event,
        calendar::event_occurrences,
        calendar::occurrence_times,
        calendar::month_occurrences,
        calendar::week_occurrences,
        occurrences::pin_occurrence,
        occurrences::list_pinned,
        occurrences::get_occurrence,
        occurrences::delete_occurrence,
    ),
    components(schemas(
        Frequency,
        RuleParamsDto,
        RuleRequest,
        RuleResponse,
        RuleListResponse,
        RuleEventsResponse,
        EventRequest,
        EventResponse,
        EventListResponse,
        DeleteEventResponse,
        WindowDto,
        EventOccurrenceDto,
        EventOccurrencesResponse,
        OccurrenceTimesResponse,
        PinOccurrenceRequest,
        OccurrenceResponse,
        OccurrenceListResponse,
        PaginationMeta,
        ErrorResponse,
        ErrorBody,
        system::HealthResponse,
        system::FrequencyInfo,
    )),
    tags(
        (name = "System", description = "Health and catalog endpoints"),
        (name = "Rules", description = "Recurrence rule administration"),
        (name = "Events", description = "Event administration"),
        (name = "Calendar", description = "Occurrence expansion queries"),
        (name = "Occurrences", description = "Pinned occurrence identifiers"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_calendar_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/v1/rules"));
        assert!(
            doc.paths
                .paths
                .contains_key("/api/v1/events/{id}/calendar/week/{year}/{week}")
        );
        assert!(doc.paths.paths.contains_key("/health"));
    }
}
