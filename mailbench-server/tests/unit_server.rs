use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use mailbench_common::{encode_field, Ack, ErrorResponse, MAX_BODY_SIZE};
use mailbench_server::{handle_count, handle_send, AppState, Server, ServerConfig};
use std::sync::atomic::Ordering;

// --- Test helpers ---

fn mail_headers(to: &str, from: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("x-mail-to", encode_field(to).parse().unwrap());
    headers.insert("x-mail-from", encode_field(from).parse().unwrap());
    headers
}

/// Consume a response body into bytes.
async fn response_body(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
}

async fn response_error(response: Response) -> String {
    let body = response_body(response).await;
    serde_json::from_slice::<ErrorResponse>(&body).unwrap().error
}

// --- Server construction ---

#[test]
fn test_server_address() {
    let server = Server::new(ServerConfig { address: "127.0.0.1:65111".parse().unwrap() });
    assert_eq!(server.address().port(), 65111);
}

// --- POST /mail ---

#[tokio::test]
async fn test_send_returns_ack() {
    let state = AppState::new();
    let response = handle_send(State(state.clone()), mail_headers("alice", "bob"), Bytes::from_static(b"hello")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let ack: Ack = serde_json::from_slice(&response_body(response).await).unwrap();
    assert_eq!(ack.to, "alice");
    assert_eq!(ack.from, "bob");
    assert_eq!(ack.bytes, 5);
    assert_eq!(ack.message, "Sending message to alice from bob");
}

#[tokio::test]
async fn test_send_decodes_non_ascii_names() {
    let state = AppState::new();
    let response =
        handle_send(State(state.clone()), mail_headers("josé@example.com", "李雷"), Bytes::from_static(b"hi")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let ack: Ack = serde_json::from_slice(&response_body(response).await).unwrap();
    assert_eq!(ack.to, "josé@example.com");
    assert_eq!(ack.from, "李雷");
    assert_eq!(ack.message, "Sending message to josé@example.com from 李雷");
    assert_eq!(state.delivered.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn test_send_rejects_raw_non_ascii_header_as_invalid_encoding() {
    let state = AppState::new();
    let mut headers = HeaderMap::new();
    headers.insert("x-mail-to", HeaderValue::from_bytes("josé".as_bytes()).unwrap());
    headers.insert("x-mail-from", "bob".parse().unwrap());

    let response = handle_send(State(state.clone()), headers, Bytes::from_static(b"x")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_error(response).await, "X-Mail-To header has invalid encoding");
    assert_eq!(state.delivered.load(Ordering::Relaxed), 0);
}

#[tokio::test]
async fn test_send_rejects_percent_encoded_invalid_utf8() {
    let state = AppState::new();
    let mut headers = HeaderMap::new();
    headers.insert("x-mail-to", "alice".parse().unwrap());
    headers.insert("x-mail-from", "%FF%FE".parse().unwrap());

    let response = handle_send(State(state), headers, Bytes::from_static(b"x")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_error(response).await, "X-Mail-From header has invalid encoding");
}

#[tokio::test]
async fn test_send_counts_deliveries() {
    let state = AppState::new();
    for _ in 0..3 {
        let response = handle_send(State(state.clone()), mail_headers("a", "b"), Bytes::from(vec![0u8; 16])).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(state.delivered.load(Ordering::Relaxed), 3);
}

#[tokio::test]
async fn test_send_accepts_empty_body() {
    let state = AppState::new();
    let response = handle_send(State(state), mail_headers("a", "b"), Bytes::new()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let ack: Ack = serde_json::from_slice(&response_body(response).await).unwrap();
    assert_eq!(ack.bytes, 0);
}

#[tokio::test]
async fn test_send_requires_to_header() {
    let state = AppState::new();
    let mut headers = HeaderMap::new();
    headers.insert("x-mail-from", "bob".parse().unwrap());

    let response = handle_send(State(state.clone()), headers, Bytes::from_static(b"x")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_error(response).await, "X-Mail-To header is required");
    assert_eq!(state.delivered.load(Ordering::Relaxed), 0);
}

#[tokio::test]
async fn test_send_requires_from_header() {
    let state = AppState::new();
    let mut headers = HeaderMap::new();
    headers.insert("x-mail-to", "alice".parse().unwrap());

    let response = handle_send(State(state), headers, Bytes::from_static(b"x")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_error(response).await, "X-Mail-From header is required");
}

#[tokio::test]
async fn test_send_rejects_oversized_body() {
    let state = AppState::new();
    let body = Bytes::from(vec![0u8; MAX_BODY_SIZE + 1]);

    let response = handle_send(State(state.clone()), mail_headers("a", "b"), body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response_error(response).await,
        format!("Body exceeds maximum size of {} bytes", MAX_BODY_SIZE)
    );
    assert_eq!(state.delivered.load(Ordering::Relaxed), 0);
}

#[tokio::test]
async fn test_send_accepts_body_at_limit() {
    let state = AppState::new();
    let body = Bytes::from(vec![0u8; MAX_BODY_SIZE]);

    let response = handle_send(State(state), mail_headers("a", "b"), body).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// --- GET /mail/count ---

#[tokio::test]
async fn test_count_starts_at_zero() {
    let state = AppState::new();
    let count = handle_count(State(state)).await;
    assert_eq!(count.0.delivered, 0);
}

#[tokio::test]
async fn test_count_reflects_sends() {
    let state = AppState::new();
    handle_send(State(state.clone()), mail_headers("a", "b"), Bytes::new()).await;
    handle_send(State(state.clone()), mail_headers("a", "b"), Bytes::new()).await;

    let count = handle_count(State(state)).await;
    assert_eq!(count.0.delivered, 2);
}
