//! Shared integration-test server bootstrap helpers.

use axum::http::{HeaderName, HeaderValue};
use axum_test::TestServer;
use rostrum_server::{create_app, AppState, Config, Database};
use serde_json::json;
use tempfile::TempDir;

pub(crate) fn setup_test_server() -> (TestServer, TempDir) {
    let temp_dir = TempDir::new().expect("temp dir");
    let config = Config {
        port: 0,
        db_path: temp_dir.path().to_str().expect("db path").to_string(),
    };
    let db = Database::new(&config.db_path).expect("open db");
    let state = AppState::new(config, db);
    let app = create_app(state, false);
    let server = TestServer::new(app).expect("server");
    (server, temp_dir)
}

pub(crate) fn user_header(user_id: u64) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-user-id"),
        HeaderValue::from_str(&user_id.to_string()).expect("header value"),
    )
}

pub(crate) async fn register_user(server: &TestServer, nickname: &str) -> u64 {
    let response = server
        .post("/api/users")
        .json(&json!({ "nickname": nickname }))
        .await;
    assert_eq!(response.status_code(), 201);
    let user: serde_json::Value = response.json();
    user["id"].as_u64().expect("user id")
}

pub(crate) async fn create_discussion(server: &TestServer, author_id: u64, title: &str) -> u64 {
    create_discussion_with(server, author_id, title, "common").await
}

pub(crate) async fn create_discussion_with(
    server: &TestServer,
    author_id: u64,
    title: &str,
    category: &str,
) -> u64 {
    let (name, value) = user_header(author_id);
    let response = server
        .post("/api/discussions")
        .add_header(name, value)
        .json(&json!({
            "title": title,
            "content": format!("agenda for {title}"),
            "place": "online",
            "category": category,
            "startAt": "2030-01-01T10:00:00Z",
            "endAt": "2030-01-01T12:00:00Z",
            "maxParticipantCount": 5,
        }))
        .await;
    assert_eq!(response.status_code(), 201, "{}", response.text());
    let detail: serde_json::Value = response.json();
    detail["id"].as_u64().expect("discussion id")
}
