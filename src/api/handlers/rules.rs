//! Recurrence rule CRUD handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    PaginationParams, RuleEventsResponse, RuleListResponse, RuleRequest, RuleResponse,
};
use crate::app_state::AppState;
use crate::domain::RuleId;
use crate::error::{CalendarError, ErrorResponse};

/// `POST /rules`: Create a recurrence rule.
///
/// # Errors
///
/// Returns [`CalendarError`] on an invalid name, frequency or parameters.
#[utoipa::path(
    post,
    path = "/api/v1/rules",
    tag = "Rules",
    summary = "Create a recurrence rule",
    description = "Creates a named rule with a frequency and optional parameters (interval, count, until, by_weekday).",
    request_body = RuleRequest,
    responses(
        (status = 201, description = "Rule created", body = RuleResponse),
        (status = 400, description = "Invalid rule", body = ErrorResponse),
    )
)]
pub async fn create_rule(
    State(state): State<AppState>,
    Json(req): Json<RuleRequest>,
) -> Result<impl IntoResponse, CalendarError> {
    let rule = state.calendar_service.create_rule(req.into_draft()?).await?;
    Ok((StatusCode::CREATED, Json(RuleResponse::from(&rule))))
}

/// `GET /rules`: List rules.
///
/// # Errors
///
/// Returns [`CalendarError`] on store failures.
#[utoipa::path(
    get,
    path = "/api/v1/rules",
    tag = "Rules",
    summary = "List recurrence rules",
    description = "Returns a paginated list of rules ordered by name.",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated rule list", body = RuleListResponse),
    )
)]
pub async fn list_rules(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, CalendarError> {
    let rules = state.calendar_service.list_rules().await?;
    let (page, pagination) = params.paginate(rules);
    Ok(Json(RuleListResponse {
        data: page.iter().map(RuleResponse::from).collect(),
        pagination,
    }))
}

/// `GET /rules/{id}`: Get a rule.
///
/// # Errors
///
/// Returns [`CalendarError::RuleNotFound`] if the rule does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/rules/{id}",
    tag = "Rules",
    summary = "Get a recurrence rule",
    params(
        ("id" = uuid::Uuid, Path, description = "Rule UUID"),
    ),
    responses(
        (status = 200, description = "Rule details", body = RuleResponse),
        (status = 404, description = "Rule not found", body = ErrorResponse),
    )
)]
pub async fn get_rule(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, CalendarError> {
    let rule = state
        .calendar_service
        .get_rule(RuleId::from_uuid(id))
        .await?;
    Ok(Json(RuleResponse::from(&rule)))
}

/// `PUT /rules/{id}`: Replace a rule.
///
/// # Errors
///
/// Returns [`CalendarError::RuleInUse`] once occurrences of its events
/// have been persisted.
#[utoipa::path(
    put,
    path = "/api/v1/rules/{id}",
    tag = "Rules",
    summary = "Update a recurrence rule",
    description = "Replaces name, frequency and parameters. Rejected once any persisted occurrence depends on the rule's schedule.",
    params(
        ("id" = uuid::Uuid, Path, description = "Rule UUID"),
    ),
    request_body = RuleRequest,
    responses(
        (status = 200, description = "Rule updated", body = RuleResponse),
        (status = 400, description = "Invalid rule", body = ErrorResponse),
        (status = 404, description = "Rule not found", body = ErrorResponse),
        (status = 409, description = "Rule in use", body = ErrorResponse),
    )
)]
pub async fn update_rule(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<RuleRequest>,
) -> Result<impl IntoResponse, CalendarError> {
    let rule = state
        .calendar_service
        .update_rule(RuleId::from_uuid(id), req.into_draft()?)
        .await?;
    Ok(Json(RuleResponse::from(&rule)))
}

/// `DELETE /rules/{id}`: Delete an unreferenced rule.
///
/// # Errors
///
/// Returns [`CalendarError::RuleInUse`] while events reference the rule.
#[utoipa::path(
    delete,
    path = "/api/v1/rules/{id}",
    tag = "Rules",
    summary = "Delete a recurrence rule",
    params(
        ("id" = uuid::Uuid, Path, description = "Rule UUID"),
    ),
    responses(
        (status = 204, description = "Rule deleted"),
        (status = 404, description = "Rule not found", body = ErrorResponse),
        (status = 409, description = "Rule in use", body = ErrorResponse),
    )
)]
pub async fn delete_rule(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, CalendarError> {
    state
        .calendar_service
        .delete_rule(RuleId::from_uuid(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /rules/{id}/events`: Events that reference a rule.
///
/// # Errors
///
/// Returns [`CalendarError::RuleNotFound`] if the rule does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/rules/{id}/events",
    tag = "Rules",
    summary = "List events using a rule",
    params(
        ("id" = uuid::Uuid, Path, description = "Rule UUID"),
    ),
    responses(
        (status = 200, description = "Referencing events", body = RuleEventsResponse),
        (status = 404, description = "Rule not found", body = ErrorResponse),
    )
)]
pub async fn rule_events(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, CalendarError> {
    let rule_id = RuleId::from_uuid(id);
    let event_ids = state.calendar_service.events_for_rule(rule_id).await?;
    Ok(Json(RuleEventsResponse { rule_id, event_ids }))
}

/// Rule management routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/rules", post(create_rule).get(list_rules))
        .route(
            "/rules/{id}",
            get(get_rule).put(update_rule).delete(delete_rule),
        )
        .route("/rules/{id}/events", get(rule_events))
}
