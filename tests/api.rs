//! End-to-end tests of the REST surface against the in-memory store.

#![allow(clippy::panic)]

use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{Value, json};

use school_calendar::api;
use school_calendar::app_state::AppState;
use school_calendar::domain::RecurrenceExpander;
use school_calendar::persistence::{MemoryStore, Store};
use school_calendar::service::CalendarService;

async fn spawn_app() -> String {
    let service = CalendarService::new(
        Arc::new(Store::Memory(MemoryStore::new())),
        RecurrenceExpander::default(),
    );
    let app = api::build_router().with_state(AppState::new(service));
    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

async fn send(request: reqwest::RequestBuilder) -> (StatusCode, Value) {
    let Ok(response) = request.send().await else {
        panic!("request failed");
    };
    let status = response.status();
    let body = response.json::<Value>().await.unwrap_or(Value::Null);
    (status, body)
}

async fn create_rule(client: &reqwest::Client, base: &str, body: Value) -> String {
    let (status, rule) = send(client.post(format!("{base}/api/v1/rules")).json(&body)).await;
    assert_eq!(status, StatusCode::CREATED, "{rule}");
    let Some(id) = rule["id"].as_str() else {
        panic!("rule id missing: {rule}");
    };
    id.to_string()
}

async fn create_event(
    client: &reqwest::Client,
    base: &str,
    rule_id: Option<&str>,
    start: &str,
    end: &str,
) -> String {
    let body = json!({
        "name": "Chemistry",
        "creator": "8c5f2a4e-6a36-4a53-9d0b-3f3d3b1a2c10",
        "rule_id": rule_id,
        "startdatetime": start,
        "enddatetime": end,
    });
    let (status, event) = send(client.post(format!("{base}/api/v1/events")).json(&body)).await;
    assert_eq!(status, StatusCode::CREATED, "{event}");
    let Some(id) = event["id"].as_str() else {
        panic!("event id missing: {event}");
    };
    id.to_string()
}

fn starts(body: &Value, key: &str, field: Option<&str>) -> Vec<String> {
    let Some(items) = body[key].as_array() else {
        panic!("{key} missing: {body}");
    };
    items
        .iter()
        .filter_map(|item| match field {
            Some(field) => item[field].as_str(),
            None => item.as_str(),
        })
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn health_and_frequency_catalog() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    let (status, health) = send(client.get(format!("{base}/health"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");

    let (status, catalog) = send(client.get(format!("{base}/config/frequencies"))).await;
    assert_eq!(status, StatusCode::OK);
    let Some(entries) = catalog.as_array() else {
        panic!("catalog should be a list");
    };
    let names: Vec<&str> = entries
        .iter()
        .filter_map(|e| e["frequency"].as_str())
        .collect();
    assert_eq!(names, vec!["YEARLY", "MONTHLY", "WEEKLY", "DAILY"]);
}

#[tokio::test]
async fn weekly_event_expands_inside_window() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    let rule_id = create_rule(&client, &base, json!({"name": "Weekly", "frequency": "WEEKLY"})).await;
    let event_id = create_event(
        &client,
        &base,
        Some(&rule_id),
        "2024-01-01T09:00:00Z",
        "2024-01-01T10:00:00Z",
    )
    .await;

    let (status, body) = send(client.get(format!(
        "{base}/api/v1/events/{event_id}/occurrences?start=2024-01-01T00:00:00Z&end=2024-01-22T23:59:59Z"
    )))
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(
        starts(&body, "data", Some("startdatetime")),
        vec![
            "2024-01-01T09:00:00Z",
            "2024-01-08T09:00:00Z",
            "2024-01-15T09:00:00Z",
            "2024-01-22T09:00:00Z",
        ]
    );
    assert_eq!(body["data"][0]["enddatetime"], "2024-01-01T10:00:00Z");
}

#[tokio::test]
async fn monthly_rule_clamps_to_month_end() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    let rule_id = create_rule(
        &client,
        &base,
        json!({"name": "Bimonthly", "frequency": "monthly", "params": {"interval": 2}}),
    )
    .await;
    let event_id = create_event(
        &client,
        &base,
        Some(&rule_id),
        "2024-01-31T00:00:00Z",
        "2024-01-31T01:00:00Z",
    )
    .await;

    let (status, body) = send(client.get(format!(
        "{base}/api/v1/events/{event_id}/occurrence-times?start=2024-01-01T00:00:00Z&end=2024-12-31T23:59:59Z"
    )))
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(
        starts(&body, "occurrences", None),
        vec![
            "2024-01-31T00:00:00Z",
            "2024-03-31T00:00:00Z",
            "2024-05-31T00:00:00Z",
            "2024-07-31T00:00:00Z",
            "2024-09-30T00:00:00Z",
            "2024-11-30T00:00:00Z",
        ]
    );
}

#[tokio::test]
async fn count_limits_occurrences() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    let rule_id = create_rule(
        &client,
        &base,
        json!({"name": "Three days", "frequency": "DAILY", "params": {"count": 3}}),
    )
    .await;
    let event_id = create_event(
        &client,
        &base,
        Some(&rule_id),
        "2024-03-01T08:00:00Z",
        "2024-03-01T09:00:00Z",
    )
    .await;

    let (status, body) = send(client.get(format!(
        "{base}/api/v1/events/{event_id}/calendar/month/2024/3"
    )))
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(
        starts(&body, "occurrences", None),
        vec![
            "2024-03-01T08:00:00Z",
            "2024-03-02T08:00:00Z",
            "2024-03-03T08:00:00Z",
        ]
    );
}

#[tokio::test]
async fn invalid_month_and_week_are_rejected() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    let rule_id = create_rule(&client, &base, json!({"name": "Weekly", "frequency": "WEEKLY"})).await;
    let event_id = create_event(
        &client,
        &base,
        Some(&rule_id),
        "2024-01-01T09:00:00Z",
        "2024-01-01T10:00:00Z",
    )
    .await;

    let (status, body) = send(client.get(format!(
        "{base}/api/v1/events/{event_id}/calendar/month/2024/13"
    )))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], 1003);

    let (status, _) = send(client.get(format!(
        "{base}/api/v1/events/{event_id}/calendar/week/2024/54"
    )))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(client.get(format!(
        "{base}/api/v1/events/{event_id}/calendar/week/2024/2"
    )))
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["window"]["start"], "2024-01-14T00:00:00Z");
    assert_eq!(
        starts(&body, "occurrences", None),
        vec!["2024-01-15T09:00:00Z"]
    );
}

#[tokio::test]
async fn one_time_event_before_window_yields_nothing() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    let event_id = create_event(
        &client,
        &base,
        None,
        "2023-12-31T09:00:00Z",
        "2023-12-31T10:00:00Z",
    )
    .await;

    let (status, body) = send(client.get(format!(
        "{base}/api/v1/events/{event_id}/occurrences?start=2024-01-01T00:00:00Z&end=2024-01-31T00:00:00Z"
    )))
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(starts(&body, "data", Some("startdatetime")).is_empty());

    let (status, body) = send(client.get(format!(
        "{base}/api/v1/events/{event_id}/occurrence-times?start=2024-01-01T00:00:00Z&end=2024-01-31T00:00:00Z"
    )))
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], 4001);
}

#[tokio::test]
async fn pinned_occurrences_are_stable() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    let rule_id = create_rule(&client, &base, json!({"name": "Weekly", "frequency": "WEEKLY"})).await;
    let event_id = create_event(
        &client,
        &base,
        Some(&rule_id),
        "2024-01-01T09:00:00Z",
        "2024-01-01T10:00:00Z",
    )
    .await;
    let pin_url = format!("{base}/api/v1/events/{event_id}/pinned-occurrences");

    let (status, first) = send(
        client
            .post(&pin_url)
            .json(&json!({"start": "2024-01-08T09:00:00Z"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{first}");

    let (status, again) = send(
        client
            .post(&pin_url)
            .json(&json!({"start": "2024-01-08T09:00:00Z"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["id"], again["id"]);

    let (status, body) = send(
        client
            .post(&pin_url)
            .json(&json!({"start": "2024-01-09T09:00:00Z"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], 4003);

    let (_, listing) = send(client.get(format!(
        "{base}/api/v1/events/{event_id}/occurrences?start=2024-01-01T00:00:00Z&end=2024-01-10T00:00:00Z"
    )))
    .await;
    assert_eq!(listing["data"][0]["occurrence_id"], Value::Null);
    assert_eq!(listing["data"][1]["occurrence_id"], first["id"]);

    let Some(occurrence_id) = first["id"].as_str() else {
        panic!("occurrence id missing");
    };
    let (status, _) = send(client.delete(format!("{base}/api/v1/occurrences/{occurrence_id}"))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(client.get(format!("{base}/api/v1/occurrences/{occurrence_id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rules_in_use_are_protected() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    let rule_id = create_rule(&client, &base, json!({"name": "Weekly", "frequency": "WEEKLY"})).await;
    let event_id = create_event(
        &client,
        &base,
        Some(&rule_id),
        "2024-01-01T09:00:00Z",
        "2024-01-01T10:00:00Z",
    )
    .await;

    let (status, body) = send(client.delete(format!("{base}/api/v1/rules/{rule_id}"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], 2004);

    let (_, usage) = send(client.get(format!("{base}/api/v1/rules/{rule_id}/events"))).await;
    assert_eq!(usage["event_ids"][0], event_id.as_str());

    let _ = send(
        client
            .post(format!("{base}/api/v1/events/{event_id}/pinned-occurrences"))
            .json(&json!({"start": "2024-01-15T09:00:00Z"})),
    )
    .await;
    let (status, _) = send(
        client
            .put(format!("{base}/api/v1/rules/{rule_id}"))
            .json(&json!({"name": "Daily now", "frequency": "DAILY"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, deleted) = send(client.delete(format!("{base}/api/v1/events/{event_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["occurrences_removed"], 1);

    let (status, _) = send(client.delete(format!("{base}/api/v1/rules/{rule_id}"))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn invalid_rule_requests_are_rejected() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    let (status, body) = send(
        client
            .post(format!("{base}/api/v1/rules"))
            .json(&json!({"name": "Hourly", "frequency": "HOURLY"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], 1002);

    let (status, body) = send(
        client
            .post(format!("{base}/api/v1/rules"))
            .json(&json!({"name": "Never", "frequency": "DAILY", "params": {"interval": 0}})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], 1004);
}

#[tokio::test]
async fn lists_are_paginated() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    for name in ["A", "B", "C"] {
        create_rule(&client, &base, json!({"name": name, "frequency": "DAILY"})).await;
    }
    let (status, body) = send(client.get(format!("{base}/api/v1/rules?page=2&per_page=2"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 3);
    assert_eq!(body["pagination"]["total_pages"], 2);
    assert_eq!(body["data"][0]["name"], "C");
}
