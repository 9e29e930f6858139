// Integration tests for the table query API against a mocked Mailchimp

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use mailchimp_plugin::api::{create_router, ApiState};
use mailchimp_plugin::config::MailchimpConnectionConfig;
use mailchimp_plugin::{build_registry, MailchimpConnection};
use mockito::{Matcher, Server};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn create_test_app(base_url: &str) -> Router {
    let connection = MailchimpConnection::new(MailchimpConnectionConfig {
        api_key: Some("0123456789abcdef-us6".to_string()),
        base_url: Some(base_url.to_string()),
        ..Default::default()
    });
    let registry = build_registry(Arc::new(connection));
    create_router(ApiState {
        registry: Arc::new(registry),
    })
}

async fn query(app: &Router, table: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/tables/{}/query", table))
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_account_fetched_once_across_queries() {
    let mut server = Server::new_async().await;
    let root = server
        .mock("GET", "/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"account_id": "acc-9", "account_name": "Freddie's Jokes", "pro_enabled": true}"#)
        .expect(1)
        .create_async()
        .await;
    let _folders = server
        .mock("GET", "/campaign-folders")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"folders": [{"id": "f1", "name": "Promos", "count": 2}], "total_items": 1}"#)
        .create_async()
        .await;

    let app = create_test_app(&server.url());

    let (status, body) = query(&app, "mailchimp_root", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["rows"][0]["title"], "Freddie's Jokes");
    assert_eq!(body["rows"][0]["pro_enabled"], true);

    let (status, body) = query(
        &app,
        "mailchimp_campaign_folder",
        json!({"columns": ["account_id", "name"]}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rows"][0], json!({"account_id": "acc-9", "name": "Promos"}));

    root.assert_async().await;
}

#[tokio::test]
async fn test_limit_spans_pages() {
    let mut server = Server::new_async().await;
    let first = server
        .mock("GET", "/lists")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("count".into(), "2".into()),
            Matcher::UrlEncoded("offset".into(), "0".into()),
            Matcher::UrlEncoded("since_date_created".into(), "2024-01-01 00:00:00".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"lists": [
                {"id": "l1", "name": "A", "date_created": "2024-02-01T00:00:00+00:00"},
                {"id": "l2", "name": "B", "date_created": "2024-03-01T00:00:00+00:00"}
            ], "total_items": 10}"#,
        )
        .expect(1)
        .create_async()
        .await;
    let other_pages = server
        .mock("GET", "/lists")
        .match_query(Matcher::UrlEncoded("offset".into(), "2".into()))
        .expect(0)
        .create_async()
        .await;

    let app = create_test_app(&server.url());
    let (status, body) = query(
        &app,
        "mailchimp_list",
        json!({
            "quals": [{"column": "date_created", "operator": ">=", "value": "2024-01-01T00:00:00Z"}],
            "limit": 2,
            "columns": ["id"]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["rows"], json!([{"id": "l1"}, {"id": "l2"}]));
    first.assert_async().await;
    other_pages.assert_async().await;
}

#[tokio::test]
async fn test_campaign_get_with_content() {
    let mut server = Server::new_async().await;
    let _campaign = server
        .mock("GET", "/campaigns/c1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"id": "c1", "status": "sent", "send_time": "2024-03-01T10:00:00+00:00",
                "settings": {"title": "March"}}"#,
        )
        .create_async()
        .await;
    let _content = server
        .mock("GET", "/campaigns/c1/content")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"plain_text": "Hello"}"#)
        .create_async()
        .await;

    let app = create_test_app(&server.url());
    let (status, body) = query(
        &app,
        "mailchimp_campaign",
        json!({
            "quals": [{"column": "id", "value": "c1"}],
            "columns": ["id", "title", "send_time", "campaign_content"]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let row = &body["rows"][0];
    assert_eq!(row["title"], "March");
    assert_eq!(row["send_time"], "2024-03-01T10:00:00+00:00");
    assert_eq!(row["campaign_content"]["plain_text"], "Hello");
}

#[tokio::test]
async fn test_missing_api_key_is_reported() {
    let connection = MailchimpConnection::new(MailchimpConnectionConfig {
        api_key: Some(String::new()),
        ..Default::default()
    });
    let app = create_router(ApiState {
        registry: Arc::new(build_registry(Arc::new(connection))),
    });

    let (status, body) = query(&app, "mailchimp_batch_operation", json!({})).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("api_key must be configured"));
}
