use std::net::SocketAddr;
use std::sync::Arc;

use drawconnect::{
    User, UserStore,
    http::{HealthResponse, InsertResponse, PING_FAILED, PING_OK, router},
};
use reqwest::StatusCode;
use serde_json::json;

use super::helpers::*;

/// Serves `users` on an ephemeral port and returns its base URL.
async fn spawn_server(users: UserStore) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(users)).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_ping_routes() {
    let base = spawn_server(in_memory_users()).await;
    let client = reqwest::Client::new();

    let response = client.get(format!("{base}/")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), PING_OK);

    let response = client.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let health: HealthResponse = response.json().await.unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.backend, "inmemory");
}

#[tokio::test]
async fn test_ping_unreachable_store() {
    let users = UserStore::with_deadlines(Arc::new(StalledStore), short_deadlines());
    let base = spawn_server(users).await;
    let client = reqwest::Client::new();

    let response = client.get(format!("{base}/")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.text().await.unwrap(), PING_FAILED);

    let response = client.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let health: HealthResponse = response.json().await.unwrap();
    assert_eq!(health.status, "unhealthy");
    assert_eq!(health.backend, "stalled");
}

#[tokio::test]
async fn test_create_and_fetch_user() {
    let base = spawn_server(in_memory_users()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/user"))
        .json(&json!({
            "email": "a@example.com",
            "signatures": [{"abs": [1, 2], "ord": [3, 4], "time": [0, 10]}],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let created: InsertResponse = response.json().await.unwrap();
    let id = created.id.to_string();
    assert_eq!(id.len(), 24);

    let response = client
        .get(format!("{base}/user/id/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let found: Vec<User> = response.json().await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].email, "a@example.com");
    assert_eq!(found[0].signatures, Some(sample_signatures()));

    let response = client
        .get(format!("{base}/user/email/a@example.com"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let found: Vec<User> = response.json().await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, created.id);

    let response = client.get(format!("{base}/users")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let all: Vec<User> = response.json().await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn test_lookup_misses_return_empty_arrays() {
    let base = spawn_server(in_memory_users()).await;
    let client = reqwest::Client::new();

    for path in [
        "/users",
        "/user/id/5c3476f7869f6e013359b2fa",
        "/user/email/nobody@example.com",
    ] {
        let response = client.get(format!("{base}{path}")).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{path}");
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body, json!([]), "{path}");
    }
}

#[tokio::test]
async fn test_invalid_id_is_bad_request() {
    let base = spawn_server(in_memory_users()).await;
    let response = reqwest::get(format!("{base}/user/id/not-a-valid-id"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.text().await.unwrap().contains("identifier"));
}

#[tokio::test]
async fn test_duplicate_email_lookup_is_server_error() {
    let users = in_memory_users();
    users
        .insert(drawconnect::NewUser::new("a@example.com"))
        .await
        .unwrap();
    users
        .insert(drawconnect::NewUser::new("a@example.com"))
        .await
        .unwrap();
    let base = spawn_server(users).await;

    let response = reqwest::get(format!("{base}/user/email/a@example.com"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let base = spawn_server(in_memory_users()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/user"))
        .header("content-type", "application/json")
        .body("{\"email\": ")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .post(format!("{base}/user"))
        .json(&json!({"signatures": "nope"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_without_email_stores_empty_email() {
    let base = spawn_server(in_memory_users()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/user"))
        .json(&json!({"token": "t0k"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let created: InsertResponse = response.json().await.unwrap();

    let users: Vec<User> = reqwest::get(format!("{base}/user/id/{}", created.id))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].email, "");
    assert_eq!(users[0].token.as_deref(), Some("t0k"));
}

#[tokio::test]
async fn test_store_timeout_is_gateway_timeout() {
    let users = UserStore::with_deadlines(Arc::new(StalledStore), short_deadlines());
    let base = spawn_server(users).await;

    let response = reqwest::get(format!("{base}/users")).await.unwrap();
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
}
