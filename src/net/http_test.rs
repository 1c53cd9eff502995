use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::http::{HeaderMap as AxumHeaders, StatusCode};
use axum::routing::{get, post};
use serde_json::{Value, json};

use super::*;
use crate::session::Role;
use crate::session::store::MemoryStore;

fn alice() -> Session {
    Session {
        token: "T1".to_owned(),
        username: "Alice".to_owned(),
        role: Role::Student,
        email: "a@x.com".to_owned(),
    }
}

fn client_for(base_url: &str) -> HttpClient {
    let session = SessionState::hydrate(Arc::new(MemoryStore::new()));
    let config = ApiConfig::new(base_url).unwrap();
    HttpClient::new(&config, session).unwrap()
}

async fn spawn_backend(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api")
}

async fn echo_headers(headers: AxumHeaders) -> Json<Value> {
    let read = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_owned);
    Json(json!({
        "authorization": read("authorization"),
        "email": read("x-user-email"),
    }))
}

fn backend() -> axum::Router {
    axum::Router::new()
        .route("/api/whoami", get(echo_headers))
        .route("/api/echo", post(|Json(body): Json<Value>| async move { Json(body) }))
        .route(
            "/api/forbidden",
            get(|| async { (StatusCode::FORBIDDEN, "权限不足") }),
        )
        .route("/api/not-json", get(|| async { "plain text" }))
        .route(
            "/api/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                "late"
            }),
        )
}

// =============================================================================
// URLS
// =============================================================================

#[test]
fn url_joins_base_and_path() {
    let client = client_for("http://h/api");
    assert_eq!(client.url("/login"), "http://h/api/login");
    assert_eq!(client.url("courses/1"), "http://h/api/courses/1");
}

#[test]
fn url_keeps_foreign_origins_under_base() {
    let client = client_for("http://h/api");
    assert_eq!(client.url("//evil.test/x"), "http://h/api/evil.test/x");
}

// =============================================================================
// CREDENTIAL ATTACHMENT
// =============================================================================

#[test]
fn prepare_anonymous_adds_no_headers() {
    let client = client_for("http://h/api");
    let request = client.prepare(client.get("/courses")).unwrap();
    assert!(request.headers().get(AUTHORIZATION).is_none());
    assert!(request.headers().get(USER_EMAIL_HEADER).is_none());
}

#[test]
fn prepare_authenticated_adds_bearer_and_email() {
    let client = client_for("http://h/api");
    client.session().establish(alice());

    let request = client.prepare(client.get("/courses")).unwrap();
    assert_eq!(request.headers()[AUTHORIZATION], "Bearer T1");
    assert_eq!(request.headers()["X-User-Email"], "a@x.com");
    assert!(request.headers()[AUTHORIZATION].is_sensitive());
}

#[test]
fn prepare_reads_session_at_dispatch_time() {
    let client = client_for("http://h/api");
    let pending = client.get("/courses");
    client.session().establish(alice());
    let request = client.prepare(pending).unwrap();
    assert_eq!(request.headers()[AUTHORIZATION], "Bearer T1");

    client.session().clear();
    let request = client.prepare(client.get("/courses")).unwrap();
    assert!(request.headers().get(AUTHORIZATION).is_none());
}

#[test]
fn prepare_overrides_caller_supplied_authorization() {
    let client = client_for("http://h/api");
    client.session().establish(alice());
    let request = client
        .prepare(client.get("/courses").header(AUTHORIZATION, "Bearer stale"))
        .unwrap();
    assert_eq!(request.headers()[AUTHORIZATION], "Bearer T1");
}

#[test]
fn attach_rejects_unencodable_email() {
    let mut session = alice();
    session.email = "a\n@x.com".to_owned();
    let mut headers = HeaderMap::new();
    let err = attach_credentials(&mut headers, Some(&session)).unwrap_err();
    assert!(matches!(err, ApiError::InvalidRequest(_)));
    assert!(headers.is_empty());
}

#[test]
fn attach_skips_empty_values() {
    let session = Session { token: String::new(), email: String::new(), ..alice() };
    let mut headers = HeaderMap::new();
    attach_credentials(&mut headers, Some(&session)).unwrap();
    assert!(headers.is_empty());
}

#[test]
fn prepared_requests_carry_the_request_timeout() {
    let session = SessionState::hydrate(Arc::new(MemoryStore::new()));
    let config = ApiConfig::new("http://h/api")
        .unwrap()
        .with_request_timeout(Duration::from_millis(750));
    let client = HttpClient::new(&config, session).unwrap();
    let request = client.prepare(client.post("/login")).unwrap();
    assert_eq!(request.timeout(), Some(&Duration::from_millis(750)));
}

// =============================================================================
// DISPATCH
// =============================================================================

#[tokio::test]
async fn send_carries_headers_to_server() {
    let client = client_for(&spawn_backend(backend()).await);
    client.session().establish(alice());

    let seen: Value = client.get_json("/whoami").await.unwrap();
    assert_eq!(seen, json!({"authorization": "Bearer T1", "email": "a@x.com"}));
}

#[tokio::test]
async fn send_anonymous_reaches_server_without_headers() {
    let client = client_for(&spawn_backend(backend()).await);
    let seen: Value = client.get_json("/whoami").await.unwrap();
    assert_eq!(seen, json!({"authorization": null, "email": null}));
}

#[tokio::test]
async fn post_json_round_trips_body() {
    let client = client_for(&spawn_backend(backend()).await);
    let echoed: Value = client.post_json("/echo", &json!({"course": 1})).await.unwrap();
    assert_eq!(echoed, json!({"course": 1}));
}

#[tokio::test]
async fn send_surfaces_non_success_status_unchanged() {
    let client = client_for(&spawn_backend(backend()).await);
    let response = client.send(client.get("/forbidden")).await.unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let err = client.get_json::<Value>("/forbidden").await.unwrap_err();
    match err {
        ApiError::Status { status, body } => {
            assert_eq!(status, 403);
            assert_eq!(body, "权限不足");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn get_json_reports_decode_errors() {
    let client = client_for(&spawn_backend(backend()).await);
    let err = client.get_json::<Value>("/not-json").await.unwrap_err();
    assert_eq!(err.error_code(), "E_DECODE");
}

#[tokio::test]
async fn timeout_is_a_network_error() {
    let base = spawn_backend(backend()).await;
    let session = SessionState::hydrate(Arc::new(MemoryStore::new()));
    let config = ApiConfig::new(&base).unwrap().with_request_timeout(Duration::from_millis(100));
    let client = HttpClient::new(&config, session).unwrap();

    let err = client.get_json::<Value>("/slow").await.unwrap_err();
    assert!(matches!(err, ApiError::Network(ref msg) if msg.contains("timed out")), "{err:?}");
}

#[tokio::test]
async fn refused_connection_is_a_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(&format!("http://{addr}/api"));
    let err = client.get_json::<Value>("/whoami").await.unwrap_err();
    assert_eq!(err.error_code(), "E_NETWORK");
}
