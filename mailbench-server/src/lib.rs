use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use mailbench_common::{
    decode_field, Ack, DeliveryCount, ErrorResponse, HEADER_FROM, HEADER_TO, MAX_BODY_SIZE,
};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

pub mod config;

#[derive(Clone, Default)]
pub struct AppState {
    /// Messages accepted since the server started.
    pub delivered: Arc<AtomicU64>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub address: SocketAddr,
}

/// MailBench mail service
pub struct Server {
    config: ServerConfig,
}

impl Server {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Get the server's configured address
    pub fn address(&self) -> SocketAddr {
        self.config.address
    }

    /// Create the application router with the given state
    pub fn create_router(state: AppState) -> Router {
        Router::new()
            .route("/mail", post(handle_send))
            .route("/mail/count", get(handle_count))
            // Allow bodies up to MAX_BODY_SIZE + 1 so our handler can validate and return 400;
            // axum's default 2MB limit would otherwise return 413 for large payloads.
            .layer(DefaultBodyLimit::max(MAX_BODY_SIZE + 1))
            .with_state(state)
    }

    /// Run the server, signalling `ready_tx` with the bound address once accepting connections
    pub async fn run(self, ready_tx: tokio::sync::oneshot::Sender<SocketAddr>) -> Result<(), Box<dyn std::error::Error>> {
        let app = Self::create_router(AppState::new());
        let listener = tokio::net::TcpListener::bind(self.config.address).await?;
        let local_addr = listener.local_addr()?;
        info!(%local_addr, "mail service bound");
        ready_tx.send(local_addr).ok();
        axum::serve(listener, app).await?;
        Ok(())
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse { error: message.into() })).into_response()
}

/// Read and percent-decode a mail header. Missing and undecodable values get distinct errors.
fn mail_header(headers: &HeaderMap, name: &str, label: &str) -> Result<String, Response> {
    let raw = headers
        .get(name)
        .ok_or_else(|| error_response(StatusCode::BAD_REQUEST, format!("{label} header is required")))?;

    raw.to_str()
        .ok()
        .and_then(decode_field)
        .ok_or_else(|| error_response(StatusCode::BAD_REQUEST, format!("{label} header has invalid encoding")))
}

/// Handler for POST /mail — accepts one message and acknowledges it.
/// Recipient and sender come percent-encoded in the `X-Mail-To` / `X-Mail-From` headers; the body is the payload.
pub async fn handle_send(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let to = match mail_header(&headers, HEADER_TO, "X-Mail-To") {
        Ok(v) => v,
        Err(r) => return r,
    };
    let from = match mail_header(&headers, HEADER_FROM, "X-Mail-From") {
        Ok(v) => v,
        Err(r) => return r,
    };

    if body.len() > MAX_BODY_SIZE {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("Body exceeds maximum size of {} bytes", MAX_BODY_SIZE),
        );
    }

    let delivered = state.delivered.fetch_add(1, Ordering::Relaxed) + 1;
    debug!(%to, %from, bytes = body.len(), delivered, "message accepted");

    let message = format!("Sending message to {to} from {from}");
    Json(Ack { to, from, bytes: body.len(), message }).into_response()
}

/// Handler for GET /mail/count — number of messages accepted so far.
pub async fn handle_count(State(state): State<AppState>) -> Json<DeliveryCount> {
    Json(DeliveryCount { delivered: state.delivered.load(Ordering::Relaxed) })
}
