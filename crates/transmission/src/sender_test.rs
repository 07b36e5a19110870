//! Tests for the HTTP batch sender
//!
//! A local axum server stands in for the ingest service, recording the
//! requests it receives and answering with per-event status arrays.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::post;
use parking_lot::Mutex;
use serde_json::{Value, json};

use nectar_config::Options;

use super::{BatchResult, BatchSender, HttpSender, UserAgentHeader};
use crate::event::Destination;

/// One request as the fixture saw it
#[derive(Debug, Clone)]
struct RecordedRequest {
    dataset: String,
    headers: HeaderMap,
    body: Value,
}

#[derive(Clone, Default)]
struct Fixture {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl Fixture {
    fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }
}

/// Batch endpoint with per-dataset behaviors:
/// - `slow` answers after 500ms
/// - `reject` answers 500 with a plain body
/// - `partial` marks the second event as failed
/// - `short` answers with one entry too few
/// - anything else accepts every event with 202
async fn handle_batch(
    State(fixture): State<Fixture>,
    Path(dataset): Path<String>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let parsed: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    let count = parsed.as_array().map_or(0, Vec::len);

    fixture.requests.lock().push(RecordedRequest {
        dataset: dataset.clone(),
        headers,
        body: parsed,
    });

    match dataset.as_str() {
        "slow" => {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Json(accept_all(count)).into_response()
        }
        "reject" => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        "partial" => {
            let mut entries = accept_all(count);
            if entries.len() > 1 {
                entries[1] = json!({"status": 400, "err": "unknown column"});
            }
            Json(entries).into_response()
        }
        "short" => Json(accept_all(count.saturating_sub(1))).into_response(),
        _ => Json(accept_all(count)).into_response(),
    }
}

fn accept_all(count: usize) -> Vec<Value> {
    (0..count).map(|_| json!({"status": 202, "err": null})).collect()
}

async fn serve_fixture() -> (SocketAddr, Fixture) {
    let fixture = Fixture::default();
    let app = Router::new()
        .route("/1/batch/{dataset}", post(handle_batch))
        .with_state(fixture.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, fixture)
}

fn destination(addr: SocketAddr, dataset: &str) -> Destination {
    Destination {
        api_host: format!("http://{addr}"),
        write_key: "test-key".into(),
        dataset: dataset.into(),
    }
}

fn sender(timeout: Duration) -> HttpSender {
    let options = Options::new("test-key").with_timeout(timeout).validate().unwrap();
    HttpSender::new(&options).unwrap()
}

fn two_event_body() -> String {
    json!([
        {"time": "2026-08-02T10:15:00Z", "data": {"n": 1}},
        {"time": "2026-08-02T10:15:01Z", "data": {"n": 2}},
    ])
    .to_string()
}

// ============================================================================
// URL construction
// ============================================================================

#[test]
fn test_batch_url_without_trailing_slash() {
    let url = HttpSender::batch_url("http://h:9999", "d").unwrap();
    assert_eq!(url.as_str(), "http://h:9999/1/batch/d");
}

#[test]
fn test_batch_url_with_trailing_slash() {
    let url = HttpSender::batch_url("http://h:9999/", "d").unwrap();
    assert_eq!(url.as_str(), "http://h:9999/1/batch/d");
}

#[test]
fn test_batch_url_rejects_relative_host() {
    assert!(HttpSender::batch_url("api.honeycomb.io", "d").is_err());
}

// ============================================================================
// Request shape
// ============================================================================

#[tokio::test]
async fn test_request_carries_team_and_content_type_headers() {
    let (addr, fixture) = serve_fixture().await;
    let sender = sender(Duration::from_secs(5));

    let result = sender
        .send_batch(&destination(addr, "d"), two_event_body(), 2)
        .await;
    assert!(matches!(result, BatchResult::Accepted(_)));

    let requests = fixture.requests();
    assert_eq!(requests.len(), 1);
    let headers = &requests[0].headers;
    assert_eq!(headers.get("x-honeycomb-team").unwrap(), "test-key");
    assert_eq!(headers.get("content-type").unwrap(), "application/json");
}

#[tokio::test]
async fn test_standard_user_agent_header() {
    let (addr, fixture) = serve_fixture().await;
    let options = Options::new("test-key")
        .with_user_agent_addition("my-app/2")
        .validate()
        .unwrap();
    let sender = HttpSender::new(&options).unwrap();

    sender
        .send_batch(&destination(addr, "d"), two_event_body(), 2)
        .await;

    let requests = fixture.requests();
    let ua = requests[0].headers.get("user-agent").unwrap().to_str().unwrap();
    assert!(ua.starts_with("nectar-rs/"), "user agent was {ua}");
    assert!(ua.ends_with(" my-app/2"), "user agent was {ua}");
}

#[tokio::test]
async fn test_compat_user_agent_header_replaces_standard() {
    let (addr, fixture) = serve_fixture().await;
    let sender = sender(Duration::from_secs(5)).with_user_agent_header(UserAgentHeader::Compat);

    sender
        .send_batch(&destination(addr, "d"), two_event_body(), 2)
        .await;

    let requests = fixture.requests();
    let headers = &requests[0].headers;
    let compat = headers.get("x-honeycomb-useragent").unwrap().to_str().unwrap();
    assert!(compat.starts_with("nectar-rs/"));
    assert!(headers.get("user-agent").is_none());
}

#[tokio::test]
async fn test_trailing_slash_host_hits_same_path() {
    let (addr, fixture) = serve_fixture().await;
    let sender = sender(Duration::from_secs(5));

    let destination = Destination {
        api_host: format!("http://{addr}/"),
        write_key: "test-key".into(),
        dataset: "d".into(),
    };
    let result = sender.send_batch(&destination, two_event_body(), 2).await;

    assert!(matches!(result, BatchResult::Accepted(_)));
    assert_eq!(fixture.requests()[0].dataset, "d");
}

// ============================================================================
// Response classification
// ============================================================================

#[tokio::test]
async fn test_accepted_batch_parses_per_event_statuses() {
    let (addr, _fixture) = serve_fixture().await;
    let sender = sender(Duration::from_secs(5));

    let result = sender
        .send_batch(&destination(addr, "partial"), two_event_body(), 2)
        .await;

    let BatchResult::Accepted(statuses) = result else {
        panic!("expected accepted batch, got {result:?}");
    };
    assert_eq!(statuses.len(), 2);
    assert_eq!(statuses[0].status, 202);
    assert!(statuses[0].err.is_none());
    assert_eq!(statuses[1].status, 400);
    assert_eq!(statuses[1].err.as_deref(), Some("unknown column"));
}

#[tokio::test]
async fn test_non_2xx_is_rejected_with_status() {
    let (addr, _fixture) = serve_fixture().await;
    let sender = sender(Duration::from_secs(5));

    let result = sender
        .send_batch(&destination(addr, "reject"), two_event_body(), 2)
        .await;

    assert!(matches!(result, BatchResult::Rejected { status: 500 }));
}

#[tokio::test]
async fn test_deadline_expiry_is_a_timeout_failure() {
    let (addr, _fixture) = serve_fixture().await;
    let sender = sender(Duration::from_millis(100));

    let result = sender
        .send_batch(&destination(addr, "slow"), two_event_body(), 2)
        .await;

    let BatchResult::Failed { timeout, .. } = result else {
        panic!("expected failure, got {result:?}");
    };
    assert!(timeout);
}

#[tokio::test]
async fn test_connection_refused_is_a_non_timeout_failure() {
    // Bind then drop a listener so the port is very likely unoccupied
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let sender = sender(Duration::from_secs(2));
    let result = sender
        .send_batch(&destination(addr, "d"), two_event_body(), 2)
        .await;

    let BatchResult::Failed { timeout, .. } = result else {
        panic!("expected failure, got {result:?}");
    };
    assert!(!timeout);
}

#[tokio::test]
async fn test_response_length_mismatch_fails_the_partition() {
    let (addr, _fixture) = serve_fixture().await;
    let sender = sender(Duration::from_secs(5));

    let result = sender
        .send_batch(&destination(addr, "short"), two_event_body(), 2)
        .await;

    let BatchResult::Failed { message, timeout } = result else {
        panic!("expected failure, got {result:?}");
    };
    assert!(!timeout);
    assert!(message.contains("expected 2"));
}
